//! Order book client initialisation
//!
//! The order book coordinates cross-chain swap intents. This crate only
//! needs an authenticated client handle; initialisation:
//! 1. Reuses a cached auth token for the signer's account on this order book,
//!    unless its JWT `exp` has passed (expired tokens are evicted)
//! 2. Otherwise fetches a nonce, signs an EIP-4361 message and exchanges it
//!    for a token, caching the result in the key-value store

pub mod auth;

pub use auth::SiweMessage;

use crate::chain::EvmSigner;
use crate::error::{SessionError, SessionResult};
use crate::storage::KeyValueStore;

use async_trait::async_trait;
use chrono::Utc;
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything needed to bring up an order book client
#[derive(Clone)]
pub struct OrderbookInit {
    pub url: String,
    pub signer: EvmSigner,
    pub store: Arc<dyn KeyValueStore>,
    /// Domain tag the auth session is scoped to
    pub domain: String,
    /// Page origin, signed as the message URI
    pub origin: String,
    pub chain_id: u64,
}

impl fmt::Debug for OrderbookInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderbookInit")
            .field("url", &self.url)
            .field("signer", &self.signer)
            .field("domain", &self.domain)
            .field("origin", &self.origin)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

/// Authenticated order book client
#[derive(Clone)]
pub struct Orderbook {
    url: String,
    address: Address,
    auth_token: String,
}

impl Orderbook {
    pub fn new(url: &str, address: Address, auth_token: String) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            address,
            auth_token,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Account the client is signed in as
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }
}

impl fmt::Debug for Orderbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orderbook")
            .field("url", &self.url)
            .field("address", &self.address)
            .finish()
    }
}

/// Seam for bringing up an order book client
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderbookConnector: Send + Sync {
    async fn init(&self, request: OrderbookInit) -> SessionResult<Orderbook>;
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    message: &'a str,
    signature: String,
}

#[derive(Deserialize)]
struct VerifyResponse {
    token: String,
}

/// Order book connector over HTTP with SIWE authentication
#[derive(Clone, Default)]
pub struct HttpOrderbookConnector {
    http: reqwest::Client,
}

impl HttpOrderbookConnector {
    pub fn new() -> Self {
        Self::default()
    }

    async fn fetch_nonce(&self, url: &str) -> SessionResult<String> {
        self.http
            .get(format!("{}/nonce", url))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SessionError::orderbook("nonce request failed", e))?
            .text()
            .await
            .map_err(|e| SessionError::orderbook("nonce body unreadable", e))
    }

    async fn verify(&self, url: &str, message: &str, signature: String) -> SessionResult<String> {
        let response: VerifyResponse = self
            .http
            .post(format!("{}/verify", url))
            .json(&VerifyRequest { message, signature })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SessionError::orderbook("verify request failed", e))?
            .json()
            .await
            .map_err(|e| SessionError::orderbook("verify response invalid", e))?;

        Ok(response.token)
    }
}

#[async_trait]
impl OrderbookConnector for HttpOrderbookConnector {
    async fn init(&self, request: OrderbookInit) -> SessionResult<Orderbook> {
        let url = request.url.trim_end_matches('/');
        let address = request.signer.address();
        let key = auth::token_key(url, &address);

        if let Some(token) = request.store.get(&key) {
            if !auth::token_expired(&token, Utc::now().timestamp()) {
                debug!("Reusing cached order book token for {:?}", address);
                return Ok(Orderbook::new(url, address, token));
            }
            info!("Cached order book token for {:?} has expired, signing in again", address);
            request.store.remove(&key)?;
        }

        let nonce = self.fetch_nonce(url).await?;
        let message = SiweMessage::new(
            &request.domain,
            &request.origin,
            address,
            request.chain_id,
            &nonce,
        )
        .to_string();
        let signature = request.signer.sign_message(&message).await?;

        let token = self
            .verify(url, &message, format!("0x{}", signature))
            .await?;
        request.store.set(&key, &token)?;

        info!("Authenticated with order book {} as {:?}", url, address);
        Ok(Orderbook::new(url, address, token))
    }
}

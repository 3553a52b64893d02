//! Injected wallet request seam

use crate::error::{SessionError, SessionResult};

use async_trait::async_trait;
use ethers::providers::{Http, Provider, ProviderError, RpcError};
use serde_json::Value;
use tracing::debug;

/// Minimal EIP-1193 surface: a single request entry point
#[async_trait]
pub trait Eip1193: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> SessionResult<Value>;
}

/// Wallet backed by a JSON-RPC node with unlocked accounts
pub struct RpcWallet {
    provider: Provider<Http>,
}

impl RpcWallet {
    pub fn new(url: &str) -> SessionResult<Self> {
        let provider = Provider::<Http>::try_from(url)
            .map_err(|e| SessionError::Config(format!("Invalid wallet RPC URL {}: {}", url, e)))?;
        Ok(Self { provider })
    }
}

#[async_trait]
impl Eip1193 for RpcWallet {
    async fn request(&self, method: &str, params: Value) -> SessionResult<Value> {
        // Nodes have no approval prompt; account access is implicit.
        let method = match method {
            "eth_requestAccounts" => "eth_accounts",
            other => other,
        };
        debug!("Wallet RPC request: {}", method);

        self.provider
            .request::<Value, Value>(method, params)
            .await
            .map_err(wallet_error)
    }
}

fn wallet_error(err: ProviderError) -> SessionError {
    match err.as_error_response() {
        Some(rpc) => SessionError::Wallet {
            code: Some(rpc.code),
            message: rpc.message.clone(),
        },
        None => SessionError::Wallet {
            code: None,
            message: err.to_string(),
        },
    }
}

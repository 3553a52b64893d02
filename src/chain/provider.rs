//! Primary-chain provider and signer handles over an injected wallet

use super::injected::Eip1193;
use crate::config::parse_hex_quantity;
use crate::error::{SessionError, SessionResult};

use ethers::types::{Address, Signature};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Provider handle. Each connect mints a new one, so consumers can tell a
/// reconnect apart from the previous connection by `id`.
#[derive(Clone)]
pub struct EvmProvider {
    id: Uuid,
    wallet: Arc<dyn Eip1193>,
}

impl EvmProvider {
    pub fn new(wallet: Arc<dyn Eip1193>) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current chain id reported by the wallet
    pub async fn chain_id(&self) -> SessionResult<u64> {
        let value = self.wallet.request("eth_chainId", json!([])).await?;
        let raw = value
            .as_str()
            .ok_or_else(|| SessionError::invalid_response("eth_chainId", value.to_string()))?;

        parse_hex_quantity(raw)
            .ok_or_else(|| SessionError::invalid_response("eth_chainId", raw.to_string()))
    }

    /// Request account access and return a signer for the first account.
    ///
    /// Waits on the wallet's approval prompt for as long as the user leaves it open.
    pub async fn get_signer(&self) -> SessionResult<EvmSigner> {
        let value = self.wallet.request("eth_requestAccounts", json!([])).await?;
        let first = value
            .as_array()
            .and_then(|accounts| accounts.first())
            .ok_or(SessionError::NoAccounts)?;
        let raw = first
            .as_str()
            .ok_or_else(|| SessionError::invalid_response("eth_requestAccounts", first.to_string()))?;
        let address = Address::from_str(raw)
            .map_err(|e| SessionError::invalid_response("eth_requestAccounts", e.to_string()))?;

        debug!("Provider {} granted account {:?}", self.id, address);

        Ok(EvmSigner {
            address,
            wallet: self.wallet.clone(),
        })
    }
}

impl PartialEq for EvmProvider {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for EvmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmProvider").field("id", &self.id).finish()
    }
}

/// Account-bound signer; signing requests go through the wallet
#[derive(Clone)]
pub struct EvmSigner {
    address: Address,
    wallet: Arc<dyn Eip1193>,
}

impl EvmSigner {
    pub fn address(&self) -> Address {
        self.address
    }

    /// EIP-191 personal message signature
    pub async fn sign_message(&self, message: &str) -> SessionResult<Signature> {
        let payload = format!("0x{}", hex::encode(message.as_bytes()));
        let params = json!([payload, format!("{:?}", self.address)]);

        let value: Value = self.wallet.request("personal_sign", params).await?;
        let raw = value
            .as_str()
            .ok_or_else(|| SessionError::invalid_response("personal_sign", value.to_string()))?;

        Signature::from_str(raw)
            .map_err(|e| SessionError::invalid_response("personal_sign", e.to_string()))
    }
}

impl fmt::Debug for EvmSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmSigner")
            .field("address", &self.address)
            .finish()
    }
}

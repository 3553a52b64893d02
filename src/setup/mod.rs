//! Swap session setup
//!
//! The setup reaction:
//! 1. Watches the wallet store for provider changes
//! 2. Acquires a signer and brings up the order book client
//! 3. Builds the bitcoin OTA and EVM wallets and the swap client
//! 4. Publishes the session, or reports a typed failure

mod reaction;

pub use reaction::SessionSetup;

use crate::config::{BitcoinConfig, Settings};
use crate::error::SessionResult;

use uuid::Uuid;

/// Endpoints and identity the setup needs, resolved from settings
#[derive(Debug, Clone)]
pub struct SetupConfig {
    pub orderbook_url: String,
    pub bitcoin: BitcoinConfig,
    /// Domain tag derived from the page origin
    pub domain: String,
    pub origin: String,
    pub chain_id: u64,
}

impl SetupConfig {
    pub fn from_settings(settings: &Settings) -> SessionResult<Self> {
        Ok(Self {
            orderbook_url: settings.orderbook.url.clone(),
            bitcoin: settings.bitcoin.clone(),
            domain: settings.app.domain()?,
            origin: settings.app.origin.clone(),
            chain_id: settings.network.chain_id_number()?,
        })
    }
}

/// Progress of the most recent setup, keyed by the provider it runs for
#[derive(Debug, Clone, PartialEq)]
pub enum SetupStatus {
    Idle,
    InProgress { provider: Uuid },
    Ready { provider: Uuid },
    Failed { provider: Uuid, reason: String },
}

impl SetupStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SetupStatus::Ready { .. } | SetupStatus::Failed { .. })
    }
}

//! Primary-chain wallet store

use super::store::Store;
use crate::chain::{Eip1193, EvmProvider};
use crate::config::NetworkConfig;
use crate::error::{SessionError, SessionResult};

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Connection status of the injected wallet. Connected exactly when a
/// provider is present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletConnection {
    provider: Option<EvmProvider>,
}

impl WalletConnection {
    pub fn connected(provider: EvmProvider) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.provider.is_some()
    }

    pub fn provider(&self) -> Option<&EvmProvider> {
        self.provider.as_ref()
    }
}

/// Store tracking the primary-chain wallet connection
#[derive(Clone)]
pub struct WalletStore {
    state: Store<WalletConnection>,
    injected: Option<Arc<dyn Eip1193>>,
    network: NetworkConfig,
}

impl WalletStore {
    /// `injected` is the wallet the host environment exposes, if any
    pub fn new(injected: Option<Arc<dyn Eip1193>>, network: NetworkConfig) -> Self {
        Self {
            state: Store::default(),
            injected,
            network,
        }
    }

    pub fn current(&self) -> WalletConnection {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletConnection> {
        self.state.subscribe()
    }

    /// Connect the injected wallet on the target chain.
    ///
    /// Asks the wallet to add the target chain when it reports a different
    /// one. Every successful call publishes a fresh provider.
    pub async fn connect(&self) -> SessionResult<EvmProvider> {
        let result = self.try_connect().await;
        crate::metrics::record_connect(&result);

        let provider = result?;
        self.state.set(WalletConnection::connected(provider.clone()));
        info!("Wallet connected with provider {}", provider.id());
        Ok(provider)
    }

    async fn try_connect(&self) -> SessionResult<EvmProvider> {
        let wallet = self.injected.clone().ok_or(SessionError::WalletNotFound)?;
        let target = self.network.chain_id_number()?;

        let provider = EvmProvider::new(wallet.clone());
        let current = provider.chain_id().await?;
        if current == target {
            return Ok(provider);
        }

        warn!(
            "Wallet is on chain {}, requesting {} ({})",
            current, self.network.chain_name, target
        );
        let params = serde_json::to_value(self.network.add_chain_params())?;
        wallet
            .request("wallet_addEthereumChain", Value::Array(vec![params]))
            .await?;
        crate::metrics::record_chain_switch();

        Ok(EvmProvider::new(wallet))
    }
}

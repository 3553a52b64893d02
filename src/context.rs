//! Application context owning the stores and the setup reaction

use crate::chain::Eip1193;
use crate::config::Settings;
use crate::error::SessionResult;
use crate::orderbook::OrderbookConnector;
use crate::setup::{SessionSetup, SetupConfig};
use crate::state::{SessionStore, SignatureStore, WalletStore};
use crate::storage::KeyValueStore;

use std::sync::Arc;
use tokio::task::JoinHandle;

/// Explicitly constructed state shared with the rest of the application
#[derive(Clone)]
pub struct AppContext {
    wallet: WalletStore,
    sessions: SessionStore,
    signature: SignatureStore,
    setup: Arc<SessionSetup>,
}

impl AppContext {
    pub fn new(
        settings: &Settings,
        injected: Option<Arc<dyn Eip1193>>,
        storage: Arc<dyn KeyValueStore>,
        connector: Arc<dyn OrderbookConnector>,
    ) -> SessionResult<Self> {
        let wallet = WalletStore::new(injected, settings.network.clone());
        let sessions = SessionStore::new();
        let setup = Arc::new(SessionSetup::new(
            wallet.clone(),
            sessions.clone(),
            connector,
            storage,
            SetupConfig::from_settings(settings)?,
        ));

        Ok(Self {
            wallet,
            sessions,
            signature: SignatureStore::new(),
            setup,
        })
    }

    pub fn wallet(&self) -> &WalletStore {
        &self.wallet
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn signature(&self) -> &SignatureStore {
        &self.signature
    }

    pub fn setup(&self) -> &Arc<SessionSetup> {
        &self.setup
    }

    /// Start the session setup reaction
    pub fn spawn_setup(&self) -> JoinHandle<()> {
        self.setup.spawn()
    }
}

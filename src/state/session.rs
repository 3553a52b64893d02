//! Cross-chain session store

use super::store::Store;
use crate::chain::BitcoinOta;
use crate::swap::SwapClient;

use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Swap client paired with the bitcoin wallet it was built with
#[derive(Debug, Clone)]
pub struct Session {
    client: Arc<SwapClient>,
    bitcoin: Arc<BitcoinOta>,
}

impl Session {
    pub fn new(client: Arc<SwapClient>, bitcoin: Arc<BitcoinOta>) -> Self {
        Self { client, bitcoin }
    }

    pub fn client(&self) -> &Arc<SwapClient> {
        &self.client
    }

    pub fn bitcoin(&self) -> &Arc<BitcoinOta> {
        &self.bitcoin
    }
}

/// Store holding the current swap session, if one has been set up
#[derive(Clone, Default)]
pub struct SessionStore {
    state: Store<Option<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a session, replacing any previous one
    pub fn set_session(&self, client: Arc<SwapClient>, bitcoin: Arc<BitcoinOta>) {
        debug!("Publishing swap session for {:?}", bitcoin.owner());
        self.state.set(Some(Session::new(client, bitcoin)));
        crate::metrics::record_session_available(true);
    }

    pub fn current(&self) -> Option<Session> {
        self.state.get()
    }

    pub fn is_available(&self) -> bool {
        self.state.read(|s| s.is_some())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }
}

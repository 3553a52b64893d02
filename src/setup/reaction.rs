//! Provider-driven swap session setup

use super::{SetupConfig, SetupStatus};
use crate::chain::{BitcoinOta, BitcoinProvider, Chain, EvmProvider};
use crate::error::{SessionError, SessionResult};
use crate::orderbook::{OrderbookConnector, OrderbookInit};
use crate::state::{Session, SessionStore, Store, WalletConnection, WalletStore};
use crate::storage::KeyValueStore;
use crate::swap::{EvmWallet, SwapClient, WalletAdapter};

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Reaction that builds a swap session whenever the wallet store publishes
/// a new provider.
///
/// Only the setup started for the latest provider may publish: a newer
/// provider aborts the in-flight run, and a generation check under lock
/// rejects any result that still slips through.
pub struct SessionSetup {
    /// Source of provider changes
    wallet: WalletStore,
    /// Destination for built sessions
    sessions: SessionStore,
    connector: Arc<dyn OrderbookConnector>,
    storage: Arc<dyn KeyValueStore>,
    config: SetupConfig,
    status: Store<SetupStatus>,
    /// Bumped on every wallet change
    generation: Mutex<u64>,
    shutdown: watch::Sender<bool>,
}

impl SessionSetup {
    pub fn new(
        wallet: WalletStore,
        sessions: SessionStore,
        connector: Arc<dyn OrderbookConnector>,
        storage: Arc<dyn KeyValueStore>,
        config: SetupConfig,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            wallet,
            sessions,
            connector,
            storage,
            config,
            status: Store::new(SetupStatus::Idle),
            generation: Mutex::new(0),
            shutdown,
        }
    }

    pub fn status(&self) -> SetupStatus {
        self.status.get()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SetupStatus> {
        self.status.subscribe()
    }

    /// Start the reaction on the current runtime
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run().await })
    }

    /// Main reaction loop. Handles the wallet state present at start, then
    /// every change until `stop` is called.
    pub async fn run(self: Arc<Self>) {
        let mut wallet_rx = self.wallet.subscribe();
        let mut shutdown_rx = self.shutdown.subscribe();
        let mut in_flight: Option<JoinHandle<()>> = None;

        info!("Session setup reaction started");

        let initial = wallet_rx.borrow_and_update().clone();
        self.on_wallet_changed(initial, &mut in_flight).await;

        loop {
            if *shutdown_rx.borrow_and_update() {
                break;
            }

            tokio::select! {
                changed = wallet_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let connection = wallet_rx.borrow_and_update().clone();
                    self.on_wallet_changed(connection, &mut in_flight).await;
                }

                _ = shutdown_rx.changed() => {}
            }
        }

        if let Some(handle) = in_flight.take() {
            handle.abort();
        }
        info!("Session setup reaction stopped");
    }

    async fn on_wallet_changed(
        self: &Arc<Self>,
        connection: WalletConnection,
        in_flight: &mut Option<JoinHandle<()>>,
    ) {
        let generation = {
            let mut current = self.generation.lock().await;
            *current += 1;
            *current
        };

        if let Some(handle) = in_flight.take() {
            if !handle.is_finished() {
                handle.abort();
                info!("Cancelled stale session setup");
                crate::metrics::record_setup("cancelled");
            }
        }

        let Some(provider) = connection.provider().cloned() else {
            debug!("No provider available, skipping session setup");
            self.status.set(SetupStatus::Idle);
            return;
        };

        info!("Setting up swap session for provider {}", provider.id());
        self.status.set(SetupStatus::InProgress {
            provider: provider.id(),
        });

        let this = Arc::clone(self);
        *in_flight = Some(tokio::spawn(async move {
            let outcome = this.establish(&provider).await;
            this.finish(generation, provider.id(), outcome).await;
        }));
    }

    /// Build a session for `provider` without publishing it
    pub async fn establish(&self, provider: &EvmProvider) -> SessionResult<Session> {
        let signer = provider.get_signer().await?;

        let bitcoin_provider = BitcoinProvider::new(self.config.bitcoin.network, &self.config.bitcoin.url);

        let orderbook = self
            .connector
            .init(OrderbookInit {
                url: self.config.orderbook_url.clone(),
                signer: signer.clone(),
                store: self.storage.clone(),
                domain: self.config.domain.clone(),
                origin: self.config.origin.clone(),
                chain_id: self.config.chain_id,
            })
            .await?;

        let bitcoin = Arc::new(BitcoinOta::new(bitcoin_provider, signer.clone()));
        let mut wallets = HashMap::new();
        wallets.insert(
            Chain::for_bitcoin(self.config.bitcoin.network),
            WalletAdapter::Bitcoin(bitcoin.clone()),
        );
        wallets.insert(
            Chain::for_evm(self.config.chain_id),
            WalletAdapter::Evm(EvmWallet::new(signer)),
        );

        let client = Arc::new(SwapClient::new(orderbook, wallets));
        Ok(Session::new(client, bitcoin))
    }

    async fn finish(&self, generation: u64, provider: Uuid, outcome: SessionResult<Session>) {
        let current = self.generation.lock().await;
        if *current != generation {
            debug!("Discarding session setup result for superseded provider {}", provider);
            crate::metrics::record_setup("stale");
            return;
        }

        match outcome {
            Ok(session) => {
                self.sessions
                    .set_session(session.client().clone(), session.bitcoin().clone());
                self.status.set(SetupStatus::Ready { provider });
                crate::metrics::record_setup("ready");
                info!("Swap session ready for provider {}", provider);
            }
            Err(e) => {
                log_failure(&e);
                self.status.set(SetupStatus::Failed {
                    provider,
                    reason: e.to_string(),
                });
                crate::metrics::record_setup("failed");
            }
        }
    }

    /// Stop the reaction loop and abort any in-flight setup
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
        info!("Session setup shutdown initiated");
    }
}

fn log_failure(err: &SessionError) {
    error!("Failed to initialize swap session: {}", err);
    if let SessionError::Orderbook { status, url, .. } = err {
        if let Some(status) = status {
            error!("Order book response status: {}", status);
        }
        if let Some(url) = url {
            error!("Order book request: {}", url);
        }
    }
}

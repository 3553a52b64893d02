//! Swap Session - headless wallet connection and swap session bootstrap
//!
//! Connects the configured wallet, brings up the swap session against the
//! local order book and bitcoin node, and keeps it alive until shutdown.

use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use swap_session::chain::{Eip1193, RpcWallet};
use swap_session::config::Settings;
use swap_session::metrics::MetricsServer;
use swap_session::orderbook::HttpOrderbookConnector;
use swap_session::setup::SetupStatus;
use swap_session::storage::{FileStore, KeyValueStore, MemoryStore};
use swap_session::AppContext;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting Swap Session v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    info!(
        "Target chain {} ({})",
        settings.network.chain_name, settings.network.chain_id
    );

    let storage: Arc<dyn KeyValueStore> = match &settings.storage.path {
        Some(path) => Arc::new(FileStore::open(path)?),
        None => Arc::new(MemoryStore::new()),
    };

    let injected: Option<Arc<dyn Eip1193>> = match &settings.wallet.rpc_url {
        Some(url) => Some(Arc::new(RpcWallet::new(url)?)),
        None => None,
    };

    let ctx = AppContext::new(
        &settings,
        injected,
        storage,
        Arc::new(HttpOrderbookConnector::new()),
    )?;

    // Start metrics server
    let metrics_handle = if settings.metrics.enabled {
        let server = MetricsServer::new(settings.metrics.port);
        Some(tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("Metrics server error: {}", e);
            }
        }))
    } else {
        None
    };

    let setup_handle = ctx.spawn_setup();

    if let Err(e) = ctx.wallet().connect().await {
        if e.is_user_facing() {
            error!("Cannot connect wallet: {}", e);
        } else {
            error!("Wallet connection failed: {}", e);
        }
        ctx.setup().stop();
        let _ = setup_handle.await;
        return Err(e.into());
    }

    // Report the setup outcome, then wait for shutdown
    let mut status_rx = ctx.setup().subscribe_status();
    tokio::select! {
        status = status_rx.wait_for(|s| s.is_terminal()) => {
            match status.map(|s| SetupStatus::clone(&s)) {
                Ok(SetupStatus::Ready { provider }) => {
                    if let Some(session) = ctx.sessions().current() {
                        info!(
                            "Swap session ready (provider {}): order book {} as {:?}, bitcoin {:?}",
                            provider,
                            session.client().orderbook().url(),
                            session.client().orderbook().address(),
                            session.bitcoin().network()
                        );
                        match session.bitcoin().provider().tip_height().await {
                            Ok(height) => info!(
                                "Bitcoin node {} at height {}",
                                session.bitcoin().provider().url(),
                                height
                            ),
                            Err(e) => warn!("Bitcoin node unreachable: {}", e),
                        }
                    }
                }
                Ok(SetupStatus::Failed { reason, .. }) => {
                    warn!("Swap session unavailable: {}", reason);
                }
                _ => {}
            }
            shutdown_signal().await;
        }
        _ = shutdown_signal() => {}
    }

    info!("Shutdown signal received, stopping...");

    ctx.setup().stop();
    if let Err(e) = setup_handle.await {
        warn!("Setup reaction ended abnormally: {}", e);
    }
    if let Some(h) = metrics_handle {
        h.abort();
    }

    info!("Swap Session stopped");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,swap_session=debug,hyper=warn,reqwest=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

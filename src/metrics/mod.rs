//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Wallet connect attempts and chain switch requests
//! - Session setup runs by outcome
//! - Session availability

use crate::error::{SessionError, SessionResult};

use axum::{http::StatusCode, routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, Encoder, IntCounter,
    IntCounterVec, IntGauge, TextEncoder,
};
use std::net::SocketAddr;
use tracing::info;

lazy_static! {
    // Wallet metrics
    pub static ref CONNECT_ATTEMPTS: IntCounterVec = register_int_counter_vec!(
        "swap_session_connect_attempts_total",
        "Wallet connect attempts by outcome",
        &["outcome"]
    ).unwrap();

    pub static ref CHAIN_SWITCH_REQUESTS: IntCounter = register_int_counter!(
        "swap_session_chain_switch_requests_total",
        "Requests asking the wallet to add or switch to the target chain"
    ).unwrap();

    // Setup metrics
    pub static ref SETUP_RUNS: IntCounterVec = register_int_counter_vec!(
        "swap_session_setup_runs_total",
        "Session setup runs by outcome",
        &["outcome"]
    ).unwrap();

    pub static ref SESSION_AVAILABLE: IntGauge = register_int_gauge!(
        "swap_session_available",
        "Swap session availability (1=available, 0=absent)"
    ).unwrap();
}

/// Prometheus metrics server
pub struct MetricsServer {
    port: u16,
}

impl MetricsServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub async fn run(&self) -> SessionResult<()> {
        let app = Router::new().route("/metrics", get(metrics_handler));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Starting metrics server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn metrics_handler() -> Result<String, StatusCode> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    String::from_utf8(buffer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

// Helper functions to record metrics

pub fn record_connect<T>(result: &SessionResult<T>) {
    let outcome = match result {
        Ok(_) => "connected",
        Err(SessionError::WalletNotFound) => "wallet_not_found",
        Err(e) if e.is_user_facing() => "rejected",
        Err(_) => "error",
    };
    CONNECT_ATTEMPTS.with_label_values(&[outcome]).inc();
}

pub fn record_chain_switch() {
    CHAIN_SWITCH_REQUESTS.inc();
}

pub fn record_setup(outcome: &str) {
    SETUP_RUNS.with_label_values(&[outcome]).inc();
}

pub fn record_session_available(available: bool) {
    SESSION_AVAILABLE.set(if available { 1 } else { 0 });
}

//! Swap Session - wallet connection and cross-chain swap session state
//!
//! Tracks the injected primary-chain wallet, builds an order-book-backed swap
//! session with a bitcoin one-time-address wallet whenever the wallet's
//! provider changes, and holds the signature popup UI flags.

pub mod chain;
pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod orderbook;
pub mod setup;
pub mod state;
pub mod storage;
pub mod swap;

#[cfg(test)]
pub(crate) mod testing;

pub use context::AppContext;
pub use error::{SessionError, SessionResult};

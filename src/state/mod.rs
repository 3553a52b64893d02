//! Reactive state stores
//!
//! Each store owns its state exclusively; consumers read or subscribe and
//! never mutate directly:
//! - `WalletStore`: primary-chain wallet connection
//! - `SessionStore`: cross-chain swap session
//! - `SignatureStore`: signature popup UI flags

mod session;
mod signature;
mod store;
mod wallet;

pub use session::{Session, SessionStore};
pub use signature::{SignatureState, SignatureStore};
pub use store::Store;
pub use wallet::{WalletConnection, WalletStore};

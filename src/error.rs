//! Error types for wallet connection and swap session setup

use thiserror::Error;

/// EIP-1193 code for a request the user rejected in the wallet UI
pub const USER_REJECTED_REQUEST: i64 = 4001;

/// Code returned by browser wallets while an identical prompt is still open
pub const REQUEST_ALREADY_PENDING: i64 = -32002;

/// Main error type for the session layer
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Injected wallet not found")]
    WalletNotFound,

    #[error("Wallet request failed{}: {message}", code_suffix(.code))]
    Wallet { code: Option<i64>, message: String },

    #[error("Wallet returned no accounts")]
    NoAccounts,

    #[error("Invalid response from {source_name}: {message}")]
    InvalidResponse { source_name: String, message: String },

    #[error("Order book error: {message}")]
    Orderbook {
        message: String,
        status: Option<u16>,
        url: Option<String>,
    },

    #[error("Bitcoin node error: {0}")]
    Bitcoin(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Build an order book error from a transport failure, keeping the
    /// response status and request URL when reqwest knows them
    pub fn orderbook(context: &str, err: reqwest::Error) -> Self {
        SessionError::Orderbook {
            message: format!("{}: {}", context, err),
            status: err.status().map(|s| s.as_u16()),
            url: err.url().map(|u| u.to_string()),
        }
    }

    pub fn invalid_response(source_name: &str, message: impl Into<String>) -> Self {
        SessionError::InvalidResponse {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    /// Errors the UI layer is expected to show to the user
    pub fn is_user_facing(&self) -> bool {
        match self {
            SessionError::WalletNotFound | SessionError::NoAccounts => true,
            SessionError::Wallet { code, .. } => *code == Some(USER_REJECTED_REQUEST),
            _ => false,
        }
    }

    /// Check if a caller could reasonably try again
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::Orderbook { status, .. } => match status {
                Some(code) => *code >= 500 || *code == 429,
                None => true,
            },
            SessionError::Wallet { code, .. } => *code == Some(REQUEST_ALREADY_PENDING),
            SessionError::Bitcoin(_) => true,
            _ => false,
        }
    }
}

fn code_suffix(code: &Option<i64>) -> String {
    code.map(|c| format!(" (code {})", c)).unwrap_or_default()
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

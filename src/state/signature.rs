//! Signature popup UI flags

use super::store::Store;

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignatureState {
    /// Wallet signature popup is showing
    pub popup_open: bool,
    /// User has signed the pending request
    pub signed: bool,
}

#[derive(Clone, Default)]
pub struct SignatureStore {
    state: Store<SignatureState>,
}

impl SignatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> SignatureState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<SignatureState> {
        self.state.subscribe()
    }

    pub fn set_popup_open(&self, popup_open: bool) {
        self.state.update(|s| s.popup_open = popup_open);
    }

    pub fn set_signed(&self, signed: bool) {
        self.state.update(|s| s.signed = signed);
    }
}

//! Cross-chain swap client: an order book plus one wallet per chain

use crate::chain::{BitcoinOta, Chain, EvmSigner};
use crate::orderbook::Orderbook;

use ethers::types::Address;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Primary-chain wallet adapter
#[derive(Debug, Clone)]
pub struct EvmWallet {
    signer: EvmSigner,
}

impl EvmWallet {
    pub fn new(signer: EvmSigner) -> Self {
        Self { signer }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn signer(&self) -> &EvmSigner {
        &self.signer
    }
}

/// Wallet held by the swap client for a single chain
#[derive(Debug, Clone)]
pub enum WalletAdapter {
    Evm(EvmWallet),
    Bitcoin(Arc<BitcoinOta>),
}

impl WalletAdapter {
    pub fn as_bitcoin(&self) -> Option<&Arc<BitcoinOta>> {
        match self {
            WalletAdapter::Bitcoin(ota) => Some(ota),
            WalletAdapter::Evm(_) => None,
        }
    }

    pub fn as_evm(&self) -> Option<&EvmWallet> {
        match self {
            WalletAdapter::Evm(wallet) => Some(wallet),
            WalletAdapter::Bitcoin(_) => None,
        }
    }
}

/// Swap client bound to an authenticated order book
pub struct SwapClient {
    orderbook: Orderbook,
    wallets: HashMap<Chain, WalletAdapter>,
}

impl SwapClient {
    pub fn new(orderbook: Orderbook, wallets: HashMap<Chain, WalletAdapter>) -> Self {
        Self { orderbook, wallets }
    }

    pub fn orderbook(&self) -> &Orderbook {
        &self.orderbook
    }

    pub fn wallet(&self, chain: Chain) -> Option<&WalletAdapter> {
        self.wallets.get(&chain)
    }

    /// Chains this client can sign for, in stable order
    pub fn chains(&self) -> Vec<Chain> {
        let mut chains: Vec<Chain> = self.wallets.keys().copied().collect();
        chains.sort_by_key(|c| c.to_string());
        chains
    }
}

impl fmt::Debug for SwapClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapClient")
            .field("orderbook", &self.orderbook)
            .field("chains", &self.chains())
            .finish()
    }
}

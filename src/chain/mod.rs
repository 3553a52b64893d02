//! Chain module - wallet and node handles for both sides of a swap
//!
//! This module provides:
//! - The EIP-1193 request seam for injected wallets, with a JSON-RPC backend
//! - Primary-chain provider and signer handles
//! - Secondary-chain (bitcoin) provider and one-time-address wallet

pub mod bitcoin;
pub mod injected;
pub mod provider;

pub use bitcoin::{BitcoinNetwork, BitcoinOta, BitcoinProvider};
pub use injected::{Eip1193, RpcWallet};
pub use provider::{EvmProvider, EvmSigner};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chains a swap client holds wallets for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chain {
    BitcoinRegtest,
    BitcoinTestnet,
    Bitcoin,
    EthereumLocalnet,
    EthereumSepolia,
    Ethereum,
    /// Any other EVM chain, by chain id
    Evm(u64),
}

impl Chain {
    /// Bitcoin chain matching a node network
    pub fn for_bitcoin(network: BitcoinNetwork) -> Self {
        match network {
            BitcoinNetwork::Regtest => Chain::BitcoinRegtest,
            BitcoinNetwork::Testnet => Chain::BitcoinTestnet,
            BitcoinNetwork::Mainnet => Chain::Bitcoin,
        }
    }

    /// EVM chain matching a chain id
    pub fn for_evm(chain_id: u64) -> Self {
        match chain_id {
            1 => Chain::Ethereum,
            11155111 => Chain::EthereumSepolia,
            31337 => Chain::EthereumLocalnet,
            other => Chain::Evm(other),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chain::BitcoinRegtest => f.write_str("bitcoin_regtest"),
            Chain::BitcoinTestnet => f.write_str("bitcoin_testnet"),
            Chain::Bitcoin => f.write_str("bitcoin"),
            Chain::EthereumLocalnet => f.write_str("ethereum_localnet"),
            Chain::EthereumSepolia => f.write_str("ethereum_sepolia"),
            Chain::Ethereum => f.write_str("ethereum"),
            Chain::Evm(chain_id) => write!(f, "evm_{}", chain_id),
        }
    }
}

//! Secondary-chain (bitcoin) provider and one-time-address wallet

use super::provider::EvmSigner;
use crate::error::{SessionError, SessionResult};

use ethers::core::k256::ecdsa::SigningKey;
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Message the EVM signer signs to derive the bitcoin key. Changing it
/// changes every derived address.
pub const OTA_DERIVATION_MESSAGE: &str =
    "Sign this message to derive your one-time bitcoin swap address.\n\nThis does not cost any gas.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitcoinNetwork {
    Regtest,
    Testnet,
    Mainnet,
}

/// Esplora-style REST handle for a bitcoin node
#[derive(Clone)]
pub struct BitcoinProvider {
    network: BitcoinNetwork,
    url: String,
    http: reqwest::Client,
}

impl BitcoinProvider {
    pub fn new(network: BitcoinNetwork, url: &str) -> Self {
        Self {
            network,
            url: url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn network(&self) -> BitcoinNetwork {
        self.network
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Height of the current chain tip
    pub async fn tip_height(&self) -> SessionResult<u64> {
        let url = format!("{}/blocks/tip/height", self.url);
        let body = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SessionError::Bitcoin(format!("GET {} failed: {}", url, e)))?
            .text()
            .await
            .map_err(|e| SessionError::Bitcoin(e.to_string()))?;

        body.trim()
            .parse()
            .map_err(|_| SessionError::invalid_response("bitcoin node", body))
    }
}

impl fmt::Debug for BitcoinProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitcoinProvider")
            .field("network", &self.network)
            .field("url", &self.url)
            .finish()
    }
}

/// One-time-address bitcoin wallet whose key is derived from an EVM signature
pub struct BitcoinOta {
    provider: BitcoinProvider,
    signer: EvmSigner,
    key_seed: OnceCell<[u8; 32]>,
}

impl BitcoinOta {
    pub fn new(provider: BitcoinProvider, signer: EvmSigner) -> Self {
        Self {
            provider,
            signer,
            key_seed: OnceCell::new(),
        }
    }

    pub fn provider(&self) -> &BitcoinProvider {
        &self.provider
    }

    pub fn network(&self) -> BitcoinNetwork {
        self.provider.network()
    }

    /// EVM account that owns this wallet
    pub fn owner(&self) -> Address {
        self.signer.address()
    }

    /// Private key seed, derived on first use. Prompts the wallet once.
    pub async fn key_seed(&self) -> SessionResult<[u8; 32]> {
        let seed = self
            .key_seed
            .get_or_try_init(|| async {
                debug!("Deriving bitcoin key for {:?}", self.signer.address());
                let signature = self.signer.sign_message(OTA_DERIVATION_MESSAGE).await?;
                let digest = Keccak256::digest(signature.to_vec());

                let mut seed = [0u8; 32];
                seed.copy_from_slice(&digest);
                info!("Derived one-time bitcoin key for {:?}", self.signer.address());
                Ok::<_, SessionError>(seed)
            })
            .await?;

        Ok(*seed)
    }

    /// Compressed secp256k1 public key, hex encoded
    pub async fn public_key(&self) -> SessionResult<String> {
        let seed = self.key_seed().await?;
        let key = SigningKey::from_slice(&seed)
            .map_err(|e| SessionError::Internal(format!("Derived key is invalid: {}", e)))?;

        Ok(hex::encode(
            key.verifying_key().to_encoded_point(true).as_bytes(),
        ))
    }
}

impl fmt::Debug for BitcoinOta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitcoinOta")
            .field("provider", &self.provider)
            .field("owner", &self.signer.address())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::EvmProvider;
    use crate::testing::{FakeWallet, StubServer};
    use std::sync::Arc;

    async fn ota(wallet: Arc<FakeWallet>) -> BitcoinOta {
        let signer = EvmProvider::new(wallet).get_signer().await.unwrap();
        BitcoinOta::new(
            BitcoinProvider::new(BitcoinNetwork::Regtest, "http://localhost:30000/"),
            signer,
        )
    }

    #[tokio::test]
    async fn test_key_seed_is_derived_once() {
        let wallet = Arc::new(FakeWallet::on_chain(31337));
        let ota = ota(wallet.clone()).await;

        let first = ota.key_seed().await.unwrap();
        let second = ota.key_seed().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(wallet.calls_for("personal_sign").len(), 1);

        let expected = Keccak256::digest(FakeWallet::signature().to_vec());
        assert_eq!(&first[..], &expected[..]);
    }

    #[tokio::test]
    async fn test_public_key_is_compressed() {
        let wallet = Arc::new(FakeWallet::on_chain(31337));
        let ota = ota(wallet).await;

        let public_key = ota.public_key().await.unwrap();
        assert_eq!(public_key.len(), 66);
        assert!(public_key.starts_with("02") || public_key.starts_with("03"));
    }

    #[tokio::test]
    async fn test_provider_trims_trailing_slash() {
        let wallet = Arc::new(FakeWallet::on_chain(31337));
        let ota = ota(wallet.clone()).await;

        assert_eq!(ota.provider().url(), "http://localhost:30000");
        assert_eq!(ota.network(), BitcoinNetwork::Regtest);
        assert_eq!(ota.owner(), wallet.account());
    }

    #[tokio::test]
    async fn test_rejected_signature_is_not_cached() {
        let wallet = Arc::new(FakeWallet::on_chain(31337).failing("personal_sign", 4001));
        let ota = ota(wallet.clone()).await;

        assert!(ota.key_seed().await.is_err());
        assert!(ota.key_seed().await.is_err());
        assert_eq!(wallet.calls_for("personal_sign").len(), 2);
    }

    #[tokio::test]
    async fn test_tip_height_reads_node() {
        let server = StubServer::start(vec![("/blocks/tip/height", 200, "128\n".to_string())]).await;
        let provider = BitcoinProvider::new(BitcoinNetwork::Regtest, &format!("{}/", server.url()));

        assert_eq!(provider.tip_height().await.unwrap(), 128);
        assert_eq!(server.paths(), vec!["/blocks/tip/height"]);
    }

    #[tokio::test]
    async fn test_tip_height_rejects_bad_body_and_status() {
        let server = StubServer::start(vec![("/blocks/tip/height", 200, "not-a-height".to_string())]).await;
        let provider = BitcoinProvider::new(BitcoinNetwork::Regtest, server.url());
        let err = provider.tip_height().await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidResponse { .. }));

        let missing = StubServer::start(vec![]).await;
        let provider = BitcoinProvider::new(BitcoinNetwork::Regtest, missing.url());
        let err = provider.tip_height().await.unwrap_err();
        match err {
            SessionError::Bitcoin(message) => assert!(message.contains("/blocks/tip/height")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

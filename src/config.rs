//! Configuration management for the swap session layer
//!
//! Loads configuration from TOML files with environment variable substitution.
//! Every section has a default matching the local development stack, so a
//! partial file only needs to override what differs.

use crate::chain::BitcoinNetwork;
use crate::error::{SessionError, SessionResult};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Environment variable pointing at the configuration file
pub const CONFIG_ENV: &str = "SWAP_SESSION_CONFIG";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub network: NetworkConfig,
    pub wallet: WalletConfig,
    pub orderbook: OrderbookConfig,
    pub bitcoin: BitcoinConfig,
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub metrics: MetricsConfig,
}

/// Target primary chain, used verbatim when asking the wallet to add it
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Hex chain identifier, e.g. "0x7A69"
    pub chain_id: String,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub native_currency: NativeCurrency,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Parameter object for `wallet_addEthereumChain`
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub native_currency: NativeCurrency,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
    /// JSON-RPC endpoint backing the injected wallet. Absent means no wallet.
    pub rpc_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderbookConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BitcoinConfig {
    pub network: BitcoinNetwork,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Page origin the order book session is scoped to
    pub origin: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// JSON file for the persistent key-value store. Absent keeps it in memory.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: "0x7A69".to_string(),
            chain_name: "Ethereum Localnet".to_string(),
            rpc_urls: vec!["http://localhost:8545".to_string()],
            native_currency: NativeCurrency {
                name: "Ethereum".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            },
        }
    }
}

impl Default for OrderbookConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
        }
    }
}

impl Default for BitcoinConfig {
    fn default() -> Self {
        Self {
            network: BitcoinNetwork::Regtest,
            url: "http://localhost:30000".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:5173".to_string(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9090,
        }
    }
}

impl NetworkConfig {
    /// Numeric form of the configured hex chain id
    pub fn chain_id_number(&self) -> SessionResult<u64> {
        parse_hex_quantity(&self.chain_id)
            .ok_or_else(|| SessionError::Config(format!("Invalid chain id: {}", self.chain_id)))
    }

    pub fn add_chain_params(&self) -> AddChainParams {
        AddChainParams {
            chain_id: self.chain_id.clone(),
            chain_name: self.chain_name.clone(),
            rpc_urls: self.rpc_urls.clone(),
            native_currency: self.native_currency.clone(),
        }
    }
}

impl AppConfig {
    /// Domain tag for the order book session: host plus explicit port
    pub fn domain(&self) -> SessionResult<String> {
        let url = reqwest::Url::parse(&self.origin)
            .map_err(|e| SessionError::Config(format!("Invalid origin {}: {}", self.origin, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| SessionError::Config(format!("Origin {} has no host", self.origin)))?;

        Ok(match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }
}

impl Settings {
    /// Load settings from the configuration file
    pub fn load() -> Result<Self> {
        let config_path = env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::from_toml(&config_str)
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml(input: &str) -> Result<Self> {
        let config_str = substitute_env_vars(input);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.network.rpc_urls.is_empty() {
            anyhow::bail!("Network {} has no RPC URLs configured", self.network.chain_name);
        }
        self.network.chain_id_number()?;
        self.app.domain()?;

        if self.orderbook.url.is_empty() {
            anyhow::bail!("Order book URL must be set");
        }
        if self.wallet.rpc_url.is_none() {
            tracing::warn!("No wallet RPC configured - connect will report a missing wallet");
        }

        Ok(())
    }
}

/// Parse a 0x-prefixed hex quantity as returned by JSON-RPC
pub fn parse_hex_quantity(input: &str) -> Option<u64> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))?;
    u64::from_str_radix(digits, 16).ok()
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("static regex is valid");

    re.replace_all(input, |caps: &regex::Captures| {
        env::var(&caps[1]).unwrap_or_default()
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_substitution() {
        env::set_var("SWAP_SESSION_TEST_HOST", "orderbook.internal");
        let input = "url = \"http://${SWAP_SESSION_TEST_HOST}:8080\"";
        let result = substitute_env_vars(input);
        assert_eq!(result, "url = \"http://orderbook.internal:8080\"");
    }

    #[test]
    fn test_defaults_match_localnet() {
        let settings = Settings::default();
        assert_eq!(settings.network.chain_id_number().unwrap(), 31337);
        assert_eq!(settings.orderbook.url, "http://localhost:8080");
        assert_eq!(settings.bitcoin.network, BitcoinNetwork::Regtest);
        assert_eq!(settings.bitcoin.url, "http://localhost:30000");
    }

    #[test]
    fn test_add_chain_params_shape() {
        let params = NetworkConfig::default().add_chain_params();
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "chainId": "0x7A69",
                "chainName": "Ethereum Localnet",
                "rpcUrls": ["http://localhost:8545"],
                "nativeCurrency": {
                    "name": "Ethereum",
                    "symbol": "ETH",
                    "decimals": 18
                }
            })
        );
    }

    #[test]
    fn test_domain_keeps_explicit_port() {
        let app = AppConfig {
            origin: "http://localhost:5173".to_string(),
        };
        assert_eq!(app.domain().unwrap(), "localhost:5173");

        let app = AppConfig {
            origin: "https://swap.example.org".to_string(),
        };
        assert_eq!(app.domain().unwrap(), "swap.example.org");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings = Settings::from_toml(
            r#"
            [orderbook]
            url = "http://127.0.0.1:9000"

            [bitcoin]
            network = "testnet"
            url = "http://127.0.0.1:30001"
            "#,
        )
        .unwrap();

        assert_eq!(settings.orderbook.url, "http://127.0.0.1:9000");
        assert_eq!(settings.bitcoin.network, BitcoinNetwork::Testnet);
        assert_eq!(settings.network, NetworkConfig::default());
        assert!(settings.storage.path.is_none());
    }

    #[test]
    fn test_rejects_bad_chain_id() {
        let result = Settings::from_toml(
            r#"
            [network]
            chain_id = "31337"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_hex_quantity() {
        assert_eq!(parse_hex_quantity("0x7a69"), Some(31337));
        assert_eq!(parse_hex_quantity("0x1"), Some(1));
        assert_eq!(parse_hex_quantity("7a69"), None);
        assert_eq!(parse_hex_quantity("0xzz"), None);
    }
}

//! Sign-in-with-Ethereum (EIP-4361) message construction and token caching

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use ethers::types::Address;
use ethers::utils::to_checksum;
use serde::Deserialize;
use std::fmt;

const STATEMENT: &str = "Sign in to the cross-chain swap order book.";

/// Storage key for the cached auth token of an account on one order book
pub fn token_key(url: &str, address: &Address) -> String {
    format!("orderbook:token:{}:{:?}", url.trim_end_matches('/'), address)
}

#[derive(Deserialize)]
struct TokenClaims {
    exp: Option<i64>,
}

/// Whether a JWT's `exp` claim is at or before `now` (unix seconds).
///
/// Tokens that are not JWTs, or carry no `exp`, are treated as live.
pub fn token_expired(token: &str, now: i64) -> bool {
    let Some(payload) = token.split('.').nth(1) else {
        return false;
    };
    let claims = general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()
        .and_then(|bytes| serde_json::from_slice::<TokenClaims>(&bytes).ok());

    matches!(claims, Some(TokenClaims { exp: Some(exp) }) if exp <= now)
}

/// EIP-4361 login message
#[derive(Debug, Clone)]
pub struct SiweMessage {
    pub domain: String,
    /// Origin the signature is requested from
    pub uri: String,
    pub address: Address,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
}

impl SiweMessage {
    pub fn new(domain: &str, origin: &str, address: Address, chain_id: u64, nonce: &str) -> Self {
        Self {
            domain: domain.to_string(),
            uri: origin.trim_end_matches('/').to_string(),
            address,
            chain_id,
            nonce: nonce.trim().to_string(),
            issued_at: Utc::now(),
        }
    }
}

impl fmt::Display for SiweMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} wants you to sign in with your Ethereum account:",
            self.domain
        )?;
        writeln!(f, "{}", to_checksum(&self.address, None))?;
        writeln!(f)?;
        writeln!(f, "{}", STATEMENT)?;
        writeln!(f)?;
        writeln!(f, "URI: {}", self.uri)?;
        writeln!(f, "Version: 1")?;
        writeln!(f, "Chain ID: {}", self.chain_id)?;
        writeln!(f, "Nonce: {}", self.nonce)?;
        write!(
            f,
            "Issued At: {}",
            self.issued_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn jwt_with_exp(exp: i64) -> String {
        let payload = general_purpose::URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{}}}"#, exp));
        format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", payload)
    }

    #[test]
    fn test_message_layout() {
        let address = Address::from_str("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        let mut message = SiweMessage::new(
            "localhost:5173",
            "http://localhost:5173/",
            address,
            31337,
            "  n0nce\n",
        );
        message.issued_at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let expected = "localhost:5173 wants you to sign in with your Ethereum account:\n\
            0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed\n\
            \n\
            Sign in to the cross-chain swap order book.\n\
            \n\
            URI: http://localhost:5173\n\
            Version: 1\n\
            Chain ID: 31337\n\
            Nonce: n0nce\n\
            Issued At: 2024-01-02T03:04:05.000Z";
        assert_eq!(message.to_string(), expected);
    }

    #[test]
    fn test_token_key_is_scoped_to_order_book() {
        let address = Address::from_low_u64_be(0xA11CE);
        assert_eq!(
            token_key("http://localhost:8080/", &address),
            "orderbook:token:http://localhost:8080:0x00000000000000000000000000000000000a11ce"
        );
        assert_ne!(
            token_key("http://localhost:8080", &address),
            token_key("http://other-orderbook.invalid:1", &address)
        );
    }

    #[test]
    fn test_token_expiry() {
        let now = 1_700_000_000;

        assert!(token_expired("eyJhbGciOiJIUzI1NiJ9.eyJleHAiOjF9.sig", now));
        assert!(token_expired(&jwt_with_exp(now), now));
        assert!(!token_expired(&jwt_with_exp(now + 3600), now));

        // Opaque or claim-less tokens stay usable
        assert!(!token_expired("opaque-token", now));
        assert!(!token_expired("a.not-base64!.c", now));
        assert!(!token_expired(
            &format!("h.{}.s", general_purpose::URL_SAFE_NO_PAD.encode(r#"{"sub":"x"}"#)),
            now
        ));
    }
}

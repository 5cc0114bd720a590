// SPDX-License-Identifier: AGPL-3.0-or-later

//! # API Data Models
//!
//! Request and response data structures shared across the REST API. All
//! types derive `Serialize`, `Deserialize`, and `ToSchema` for automatic
//! JSON handling and OpenAPI documentation.
//!
//! ## Wallet Address Type
//!
//! The [`WalletAddress`] newtype wraps chain account addresses (0x-prefixed,
//! 64 hex characters / 32 bytes). Parsing is strict: a malformed address is
//! rejected before any session or identity record is touched.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;

// =============================================================================
// Wallet Address Type
// =============================================================================

/// Chain account address wrapper.
///
/// Format: `0x` followed by 64 hexadecimal characters (32 bytes).
///
/// # Example
///
/// ```rust,ignore
/// let addr = WalletAddress::parse("0xaaaa...aaaa")?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parse and validate a wallet address string.
    ///
    /// Returns a validation error for anything other than `0x` + 64 hex
    /// characters.
    pub fn parse(value: &str) -> Result<Self, ApiError> {
        if Self::is_valid(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(ApiError::validation("Invalid wallet address format"))
        }
    }

    /// Check the `0x` + 64-hex-chars format without constructing.
    pub fn is_valid(value: &str) -> bool {
        let Some(hex_part) = value.strip_prefix("0x") else {
            return false;
        };
        hex_part.len() == 64 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

// =============================================================================
// Shared response envelope fields
// =============================================================================

/// KYC status projection returned by the status resolver.
///
/// Merged from the on-chain identity view (authoritative when present) and
/// the local identity mirror (supplies `last_tx_hash`, or everything when
/// the chain has no record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KycStatus {
    pub verified: bool,
    pub kyc_level: u8,
    pub credential_hash: Option<String>,
    pub last_tx_hash: Option<String>,
    /// On-chain record version; 0 when the chain view was unavailable.
    pub version: u64,
}

impl KycStatus {
    /// The "never verified" default shape.
    pub fn unverified() -> Self {
        Self {
            verified: false,
            kyc_level: 0,
            credential_hash: None,
            last_tx_hash: None,
            version: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str =
        "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    #[test]
    fn parse_accepts_64_hex_chars() {
        let addr = WalletAddress::parse(VALID).unwrap();
        assert_eq!(addr.as_str(), VALID);
    }

    #[test]
    fn parse_accepts_mixed_case() {
        let mixed =
            "0xAbCdEf0123456789aBcDeF0123456789abcdef0123456789ABCDEF0123456789";
        assert!(WalletAddress::parse(mixed).is_ok());
    }

    #[test]
    fn parse_rejects_short_address() {
        let err = WalletAddress::parse("0x123").unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn parse_rejects_missing_prefix() {
        let no_prefix = VALID.trim_start_matches("0x");
        assert!(WalletAddress::parse(no_prefix).is_err());
    }

    #[test]
    fn parse_rejects_non_hex() {
        let bad =
            "0xzzzzaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        assert!(WalletAddress::parse(bad).is_err());
    }

    #[test]
    fn parse_rejects_overlong_address() {
        let long = format!("{VALID}ff");
        assert!(WalletAddress::parse(&long).is_err());
    }

    #[test]
    fn unverified_status_is_all_defaults() {
        let status = KycStatus::unverified();
        assert!(!status.verified);
        assert_eq!(status.kyc_level, 0);
        assert_eq!(status.credential_hash, None);
        assert_eq!(status.last_tx_hash, None);
        assert_eq!(status.version, 0);
    }
}

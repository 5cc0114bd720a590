// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Chain Gateway
//!
//! Boundary to the identity registry on chain. The rest of the system only
//! ever sees five operations (submit, revoke, view, is-verified, mint) plus
//! an event feed for the audit watcher; everything chain-specific stays
//! behind this module.
//!
//! Two implementations:
//!
//! - [`RpcGateway`]: talks to a fullnode REST endpoint for view functions
//!   and to the issuer's signing relayer for entry-function submission. The
//!   gateway itself holds no private keys.
//! - [`MockChain`]: in-process registry used in development
//!   (`ENABLE_MOCK_CHAIN=true`) and by tests, with failure injection.

pub mod mock;
pub mod rpc;
pub mod types;

pub use mock::MockChain;
pub use rpc::RpcGateway;
pub use types::{ChainEvent, IdentityView};

use crate::config::Config;
use crate::error::ApiError;
use crate::models::WalletAddress;

/// Errors from chain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// Endpoint unreachable or timed out. Retryable.
    #[error("Chain endpoint unavailable: {0}")]
    Unavailable(String),

    /// The chain accepted the request but rejected the transaction.
    #[error("Chain transaction rejected: {0}")]
    Rejected(String),

    /// Identity NFT already minted for this wallet.
    #[error("NFT already minted for this address")]
    AlreadyMinted,

    #[error("Invalid chain response: {0}")]
    InvalidResponse(String),
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Unavailable(_) => ApiError::network(err.to_string()),
            ChainError::AlreadyMinted => ApiError::conflict(err.to_string()),
            ChainError::InvalidResponse(_) => ApiError::network(err.to_string()),
            ChainError::Rejected(_) => ApiError::internal(err.to_string()),
        }
    }
}

/// Gateway to the on-chain identity registry.
#[derive(Clone)]
pub enum ChainGateway {
    Rpc(RpcGateway),
    Mock(MockChain),
}

impl ChainGateway {
    pub fn from_config(config: &Config) -> Self {
        if config.enable_mock_chain {
            Self::Mock(MockChain::new())
        } else {
            Self::Rpc(RpcGateway::new(config))
        }
    }

    /// Human-readable gateway mode for health reporting.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Rpc(_) => "rpc",
            Self::Mock(_) => "mock",
        }
    }

    /// Submit an identity update `(wallet, level, credential hash)`.
    /// Returns the transaction hash.
    pub async fn submit_identity_update(
        &self,
        wallet: &WalletAddress,
        kyc_level: u8,
        credential_hash: &str,
    ) -> Result<String, ChainError> {
        match self {
            Self::Rpc(rpc) => {
                rpc.submit_identity_update(wallet, kyc_level, credential_hash)
                    .await
            }
            Self::Mock(mock) => mock.submit_identity_update(wallet, kyc_level, credential_hash),
        }
    }

    /// Revoke the identity record for a wallet. Returns the transaction hash.
    pub async fn revoke_identity(&self, wallet: &WalletAddress) -> Result<String, ChainError> {
        match self {
            Self::Rpc(rpc) => rpc.revoke_identity(wallet).await,
            Self::Mock(mock) => mock.revoke_identity(wallet),
        }
    }

    /// Read the on-chain identity record, if one exists.
    pub async fn view_identity(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Option<IdentityView>, ChainError> {
        match self {
            Self::Rpc(rpc) => rpc.view_identity(wallet).await,
            Self::Mock(mock) => Ok(mock.view_identity(wallet)),
        }
    }

    /// Whether the registry currently reports the wallet as verified.
    /// Chain errors are treated as "not verified".
    pub async fn is_verified(&self, wallet: &WalletAddress) -> bool {
        match self {
            Self::Rpc(rpc) => rpc.is_verified(wallet).await,
            Self::Mock(mock) => mock.is_verified(wallet),
        }
    }

    /// Mint the identity NFT for a verified wallet. Returns the transaction
    /// hash, or [`ChainError::AlreadyMinted`] for a second mint.
    pub async fn mint_identity_nft(&self, wallet: &WalletAddress) -> Result<String, ChainError> {
        match self {
            Self::Rpc(rpc) => rpc.mint_identity_nft(wallet).await,
            Self::Mock(mock) => mock.mint_identity_nft(wallet),
        }
    }

    /// Fetch recent registry events for the audit watcher. Best effort:
    /// failures surface as an empty batch at the caller's discretion.
    pub async fn recent_events(&self) -> Result<Vec<ChainEvent>, ChainError> {
        match self {
            Self::Rpc(rpc) => rpc.recent_events().await,
            Self::Mock(mock) => Ok(mock.drain_events()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn chain_errors_map_to_taxonomy() {
        let api: ApiError = ChainError::Unavailable("timeout".into()).into();
        assert_eq!(api.status, StatusCode::BAD_GATEWAY);

        let api: ApiError = ChainError::AlreadyMinted.into();
        assert_eq!(api.status, StatusCode::CONFLICT);

        let api: ApiError = ChainError::Rejected("abort".into()).into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later

//! Wallet status resolution.
//!
//! Precedence: the on-chain view is authoritative when present; the mirror
//! only contributes `lastTxHash` in that case. When the chain has no record
//! (or the view call fails), the mirror record is served with `version: 0`
//! to signal the chain view was unavailable. With neither source, the
//! default unverified shape is returned. A chain error never fails the
//! status query.

use tracing::warn;

use crate::chain::ChainGateway;
use crate::models::{KycStatus, WalletAddress};
use crate::storage::IdentityMirror;

#[derive(Clone)]
pub struct StatusResolver {
    chain: ChainGateway,
    mirror: IdentityMirror,
}

impl StatusResolver {
    pub fn new(chain: ChainGateway, mirror: IdentityMirror) -> Self {
        Self { chain, mirror }
    }

    pub async fn get_status(&self, wallet: &WalletAddress) -> KycStatus {
        let record = self.mirror.get(wallet);

        let view = match self.chain.view_identity(wallet).await {
            Ok(view) => view,
            Err(e) => {
                warn!(wallet = %wallet, error = %e, "chain view failed; falling back to mirror");
                None
            }
        };

        if let Some(view) = view {
            return KycStatus {
                verified: view.verified,
                kyc_level: view.kyc_level,
                credential_hash: Some(view.credential_hash),
                last_tx_hash: record.and_then(|r| r.last_tx_hash),
                version: view.version,
            };
        }

        if let Some(record) = record {
            return KycStatus {
                verified: record.verified,
                kyc_level: record.kyc_level,
                credential_hash: Some(record.credential_hash),
                last_tx_hash: record.last_tx_hash,
                version: 0,
            };
        }

        KycStatus::unverified()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{IdentityView, MockChain};

    fn wallet() -> WalletAddress {
        WalletAddress::parse(&format!("0x{}", "ee".repeat(32))).unwrap()
    }

    #[tokio::test]
    async fn chain_view_wins_with_mirror_tx_hash() {
        let mock = MockChain::new();
        let mirror = IdentityMirror::new();
        let addr = wallet();

        mirror.upsert(&addr, 2, "mirror-hash", "0xmirror-tx");
        mock.set_identity(IdentityView {
            wallet: addr.as_str().to_string(),
            kyc_level: 3,
            credential_hash: "chain-hash".to_string(),
            verified: true,
            version: 4,
        });

        let resolver = StatusResolver::new(ChainGateway::Mock(mock), mirror);
        let status = resolver.get_status(&addr).await;

        assert!(status.verified);
        assert_eq!(status.kyc_level, 3);
        assert_eq!(status.credential_hash.as_deref(), Some("chain-hash"));
        assert_eq!(status.last_tx_hash.as_deref(), Some("0xmirror-tx"));
        assert_eq!(status.version, 4);
    }

    #[tokio::test]
    async fn mirror_only_reports_version_zero() {
        let mock = MockChain::new();
        let mirror = IdentityMirror::new();
        let addr = wallet();

        mirror.upsert(&addr, 3, "mirror-hash", "0xmirror-tx");

        let resolver = StatusResolver::new(ChainGateway::Mock(mock), mirror);
        let status = resolver.get_status(&addr).await;

        assert!(status.verified);
        assert_eq!(status.kyc_level, 3);
        assert_eq!(status.credential_hash.as_deref(), Some("mirror-hash"));
        assert_eq!(status.last_tx_hash.as_deref(), Some("0xmirror-tx"));
        assert_eq!(status.version, 0);
    }

    #[tokio::test]
    async fn unknown_wallet_is_unverified() {
        let resolver = StatusResolver::new(
            ChainGateway::Mock(MockChain::new()),
            IdentityMirror::new(),
        );
        assert_eq!(resolver.get_status(&wallet()).await, KycStatus::unverified());
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later

//! Identity mirror: local cache of the last observed on-chain identity
//! state, one record per wallet address.
//!
//! Records are upserted only by the orchestrator after a successful chain
//! submission, so a mirror entry always reflects a completion (or a later
//! revocation) this process actually observed. It may be stale relative to
//! the chain; the status resolver treats the chain as authoritative.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::WalletAddress;

/// Last locally observed identity state for one wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    pub wallet_address: WalletAddress,
    /// 0–3, the verification checkpoints satisfied at completion.
    pub kyc_level: u8,
    /// Hex digest binding email, phone and document hash.
    pub credential_hash: String,
    pub verified: bool,
    /// Most recent chain transaction hash for this wallet's identity state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_tx_hash: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Shared, clonable handle to the identity mirror.
#[derive(Clone, Default)]
pub struct IdentityMirror {
    inner: Arc<RwLock<HashMap<String, IdentityRecord>>>,
}

impl IdentityMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create-or-replace the record for a wallet.
    pub fn upsert(
        &self,
        wallet_address: &WalletAddress,
        kyc_level: u8,
        credential_hash: &str,
        tx_hash: &str,
    ) -> IdentityRecord {
        let record = IdentityRecord {
            wallet_address: wallet_address.clone(),
            kyc_level,
            credential_hash: credential_hash.to_string(),
            verified: true,
            last_tx_hash: Some(tx_hash.to_string()),
            updated_at: Utc::now(),
        };
        let mut records = self.inner.write().expect("identity mirror lock poisoned");
        records.insert(wallet_address.as_str().to_string(), record.clone());
        record
    }

    pub fn get(&self, wallet_address: &WalletAddress) -> Option<IdentityRecord> {
        let records = self.inner.read().expect("identity mirror lock poisoned");
        records.get(wallet_address.as_str()).cloned()
    }

    /// Downgrade a wallet after an on-chain revocation. Level and credential
    /// hash are preserved; only `verified` and the tx hash change. No-op for
    /// wallets with no mirror record.
    pub fn mark_revoked(&self, wallet_address: &WalletAddress, tx_hash: &str) {
        let mut records = self.inner.write().expect("identity mirror lock poisoned");
        if let Some(record) = records.get_mut(wallet_address.as_str()) {
            record.verified = false;
            record.last_tx_hash = Some(tx_hash.to_string());
            record.updated_at = Utc::now();
        }
    }

    /// Number of mirrored identities (admin stats).
    pub fn count(&self) -> usize {
        let records = self.inner.read().expect("identity mirror lock poisoned");
        records.len()
    }
}

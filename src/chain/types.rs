// SPDX-License-Identifier: AGPL-3.0-or-later

//! Read-only chain data shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// On-chain identity record, owned by the registry module. Read via the
/// gateway's view call; never mutated by this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityView {
    pub wallet: String,
    pub kyc_level: u8,
    /// Hex-encoded credential hash bytes.
    pub credential_hash: String,
    pub verified: bool,
    /// Monotonic counter incremented by the chain on each update.
    pub version: u64,
}

/// Registry event observed by the audit watcher.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChainEvent {
    /// Event kind, e.g. `IdentityUpdated`, `IdentityRevoked`, `NftMinted`.
    pub kind: String,
    pub wallet: String,
    /// On-chain version the event was emitted at.
    pub version: u64,
    pub observed_at: DateTime<Utc>,
}

// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Chain Event Watcher
//!
//! Background task that periodically pulls recent identity-registry events
//! from the chain gateway into a bounded in-memory audit log.
//!
//! ## Strategy
//!
//! Every `poll_interval` (default 5 s) the watcher fetches the most recent
//! registry events, drops those already recorded, and appends the rest to
//! the [`AuditLog`]. The log is observational only: the watcher never
//! touches sessions or the identity mirror.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::chain::{ChainEvent, ChainGateway};

/// Default interval between event sweeps.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Maximum number of events retained in the audit log.
const AUDIT_LOG_CAPACITY: usize = 1000;

/// Bounded, shared audit trail of observed chain events.
///
/// Duplicate events (same kind, wallet and on-chain version) are dropped,
/// since the gateway re-serves the most recent events on every sweep.
#[derive(Clone, Default)]
pub struct AuditLog {
    inner: Arc<Mutex<AuditLogState>>,
}

#[derive(Default)]
struct AuditLogState {
    events: VecDeque<ChainEvent>,
    seen: HashSet<(String, String, u64)>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append events not seen before. Returns how many were new.
    pub fn append(&self, events: Vec<ChainEvent>) -> usize {
        let mut state = self.inner.lock().expect("audit log lock poisoned");
        let mut added = 0;

        for event in events {
            let key = (event.kind.clone(), event.wallet.clone(), event.version);
            if !state.seen.insert(key) {
                continue;
            }
            if state.events.len() == AUDIT_LOG_CAPACITY {
                state.events.pop_front();
            }
            state.events.push_back(event);
            added += 1;
        }

        added
    }

    /// The most recent events, oldest first, at most `limit`.
    pub fn recent(&self, limit: usize) -> Vec<ChainEvent> {
        let state = self.inner.lock().expect("audit log lock poisoned");
        let skip = state.events.len().saturating_sub(limit);
        state.events.iter().skip(skip).cloned().collect()
    }

    /// Number of retained events (admin stats).
    pub fn len(&self) -> usize {
        let state = self.inner.lock().expect("audit log lock poisoned");
        state.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Background watcher feeding the audit log from the chain gateway.
pub struct EventWatcher {
    chain: ChainGateway,
    audit: AuditLog,
    poll_interval: Duration,
}

impl EventWatcher {
    pub fn new(chain: ChainGateway, audit: AuditLog) -> Self {
        Self {
            chain,
            audit,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Run the watcher loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(watcher.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            "Chain event watcher starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Chain event watcher shutting down");
                return;
            }

            self.sweep().await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Chain event watcher shutting down");
                    return;
                }
            }
        }
    }

    /// Execute one sweep: fetch recent events and record the new ones.
    async fn sweep(&self) {
        match self.chain.recent_events().await {
            Ok(events) => {
                if events.is_empty() {
                    return;
                }
                let added = self.audit.append(events);
                if added > 0 {
                    info!(count = added, "Chain event watcher: recorded new events");
                }
            }
            Err(e) => {
                warn!(error = %e, "Chain event watcher: fetch failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockChain;
    use crate::models::WalletAddress;

    fn wallet() -> WalletAddress {
        WalletAddress::parse(&format!("0x{}", "cc".repeat(32))).unwrap()
    }

    fn event(kind: &str, version: u64) -> ChainEvent {
        ChainEvent {
            kind: kind.to_string(),
            wallet: wallet().as_str().to_string(),
            version,
            observed_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn append_drops_duplicates() {
        let audit = AuditLog::new();

        assert_eq!(audit.append(vec![event("IdentityUpdated", 1)]), 1);
        assert_eq!(audit.append(vec![event("IdentityUpdated", 1)]), 0);
        assert_eq!(audit.append(vec![event("IdentityUpdated", 2)]), 1);
        assert_eq!(audit.len(), 2);
    }

    #[test]
    fn log_is_bounded() {
        let audit = AuditLog::new();
        for version in 0..(AUDIT_LOG_CAPACITY as u64 + 50) {
            audit.append(vec![event("IdentityUpdated", version)]);
        }

        assert_eq!(audit.len(), AUDIT_LOG_CAPACITY);
        // Oldest entries were evicted.
        assert_eq!(audit.recent(1)[0].version, AUDIT_LOG_CAPACITY as u64 + 49);
    }

    #[test]
    fn recent_returns_newest_in_order() {
        let audit = AuditLog::new();
        for version in 1..=5 {
            audit.append(vec![event("IdentityUpdated", version)]);
        }

        let recent = audit.recent(3);
        let versions: Vec<u64> = recent.iter().map(|e| e.version).collect();
        assert_eq!(versions, vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn sweep_records_mock_chain_events() {
        let mock = MockChain::new();
        mock.submit_identity_update(&wallet(), 3, "hash").unwrap();

        let audit = AuditLog::new();
        let watcher = EventWatcher::new(ChainGateway::Mock(mock), audit.clone());

        watcher.sweep().await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit.recent(10)[0].kind, "IdentityUpdated");

        // Nothing new on the next sweep.
        watcher.sweep().await;
        assert_eq!(audit.len(), 1);
    }
}

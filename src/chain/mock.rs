// SPDX-License-Identifier: AGPL-3.0-or-later

//! In-process chain gateway for development and tests.
//!
//! Keeps a registry in shared memory: identity views with monotonically
//! increasing versions, a minted set enforcing at most one NFT per wallet,
//! and an event feed. Transaction hashes are deterministic digests of a
//! per-instance submission counter, so tests can assert on distinct hashes
//! without caring about their values.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use sha2::{Digest, Sha256};

use super::types::{ChainEvent, IdentityView};
use super::ChainError;
use crate::models::WalletAddress;

#[derive(Default)]
struct MockChainState {
    identities: HashMap<String, IdentityView>,
    minted: HashSet<String>,
    events: Vec<ChainEvent>,
    tx_counter: u64,
    submissions: u64,
    fail_submissions: bool,
}

impl MockChainState {
    fn next_tx_hash(&mut self) -> String {
        self.tx_counter += 1;
        let digest = Sha256::digest(format!("mock-tx-{}", self.tx_counter).as_bytes());
        format!("0x{}", hex::encode(digest))
    }

    fn push_event(&mut self, kind: &str, wallet: &str, version: u64) {
        self.events.push(ChainEvent {
            kind: kind.to_string(),
            wallet: wallet.to_string(),
            version,
            observed_at: Utc::now(),
        });
    }
}

/// Shared-state mock of the identity registry.
#[derive(Clone, Default)]
pub struct MockChain {
    state: Arc<Mutex<MockChainState>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit_identity_update(
        &self,
        wallet: &WalletAddress,
        kyc_level: u8,
        credential_hash: &str,
    ) -> Result<String, ChainError> {
        let mut state = self.state.lock().expect("mock chain lock poisoned");

        if state.fail_submissions {
            return Err(ChainError::Unavailable("injected failure".to_string()));
        }

        let version = state
            .identities
            .get(wallet.as_str())
            .map(|v| v.version + 1)
            .unwrap_or(1);

        state.identities.insert(
            wallet.as_str().to_string(),
            IdentityView {
                wallet: wallet.as_str().to_string(),
                kyc_level,
                credential_hash: credential_hash.to_string(),
                verified: true,
                version,
            },
        );
        state.submissions += 1;
        state.push_event("IdentityUpdated", wallet.as_str(), version);
        Ok(state.next_tx_hash())
    }

    pub fn revoke_identity(&self, wallet: &WalletAddress) -> Result<String, ChainError> {
        let mut state = self.state.lock().expect("mock chain lock poisoned");

        if state.fail_submissions {
            return Err(ChainError::Unavailable("injected failure".to_string()));
        }

        let Some(view) = state.identities.get_mut(wallet.as_str()) else {
            return Err(ChainError::Rejected("no identity to revoke".to_string()));
        };
        view.verified = false;
        view.version += 1;
        let version = view.version;
        state.push_event("IdentityRevoked", wallet.as_str(), version);
        Ok(state.next_tx_hash())
    }

    pub fn view_identity(&self, wallet: &WalletAddress) -> Option<IdentityView> {
        let state = self.state.lock().expect("mock chain lock poisoned");
        state.identities.get(wallet.as_str()).cloned()
    }

    pub fn is_verified(&self, wallet: &WalletAddress) -> bool {
        let state = self.state.lock().expect("mock chain lock poisoned");
        state
            .identities
            .get(wallet.as_str())
            .map(|v| v.verified)
            .unwrap_or(false)
    }

    pub fn mint_identity_nft(&self, wallet: &WalletAddress) -> Result<String, ChainError> {
        let mut state = self.state.lock().expect("mock chain lock poisoned");

        if state.fail_submissions {
            return Err(ChainError::Unavailable("injected failure".to_string()));
        }

        let verified = state
            .identities
            .get(wallet.as_str())
            .map(|v| v.verified)
            .unwrap_or(false);
        if !verified {
            return Err(ChainError::Rejected(
                "wallet is not verified in the registry".to_string(),
            ));
        }

        if !state.minted.insert(wallet.as_str().to_string()) {
            return Err(ChainError::AlreadyMinted);
        }

        let version = state
            .identities
            .get(wallet.as_str())
            .map(|v| v.version)
            .unwrap_or(0);
        state.push_event("NftMinted", wallet.as_str(), version);
        Ok(state.next_tx_hash())
    }

    /// Take all events accumulated since the previous drain.
    pub fn drain_events(&self) -> Vec<ChainEvent> {
        let mut state = self.state.lock().expect("mock chain lock poisoned");
        std::mem::take(&mut state.events)
    }

    // --- test/diagnostic hooks -------------------------------------------

    /// Seed an identity view directly, bypassing submission.
    pub fn set_identity(&self, view: IdentityView) {
        let mut state = self.state.lock().expect("mock chain lock poisoned");
        state.identities.insert(view.wallet.clone(), view);
    }

    /// Make subsequent submissions fail with a network error.
    pub fn set_fail_submissions(&self, fail: bool) {
        let mut state = self.state.lock().expect("mock chain lock poisoned");
        state.fail_submissions = fail;
    }

    /// Number of successful identity-update submissions.
    pub fn submission_count(&self) -> u64 {
        let state = self.state.lock().expect("mock chain lock poisoned");
        state.submissions
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later

//! KYC orchestrator: completion protocol, NFT minting, revocation.
//!
//! ## Completion protocol
//!
//! Preconditions are checked in order, first failure wins: session exists,
//! session not already completed, all three verification flags true, all
//! verification data present. Then the KYC level and credential hash are
//! derived, the update is submitted to the chain gateway, and only after a
//! successful submission is the session marked `COMPLETED` and the identity
//! mirror upserted. A failed submission leaves the session `PENDING` and
//! the mirror untouched, so retrying `complete_kyc` is always safe.
//!
//! Completions are serialized per session by an async lock held across the
//! chain call: of two concurrent calls, the second waits, re-reads the
//! session, observes `COMPLETED` and fails with a conflict. At most one
//! call ever submits to the chain.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};
use tracing::{error, info};

use crate::chain::{ChainError, ChainGateway};
use crate::error::ApiError;
use crate::models::WalletAddress;
use crate::storage::{IdentityMirror, Session, SessionStatus, SessionStore, StoreError};

/// Result of a successful completion.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub tx_hash: String,
    pub kyc_level: u8,
}

#[derive(Debug, thiserror::Error)]
pub enum KycError {
    #[error("Session not found")]
    SessionNotFound,

    #[error("KYC already completed for this session")]
    AlreadyCompleted,

    #[error("Not all verification steps completed")]
    StepsIncomplete,

    #[error("Missing verification data")]
    MissingData,

    #[error("User must complete KYC verification before minting NFT")]
    NotVerified,

    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl From<StoreError> for KycError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::SessionNotFound,
            StoreError::AlreadyCompleted => Self::AlreadyCompleted,
        }
    }
}

impl From<KycError> for ApiError {
    fn from(err: KycError) -> Self {
        match err {
            KycError::SessionNotFound => ApiError::not_found(err.to_string()),
            KycError::AlreadyCompleted => ApiError::conflict(err.to_string()),
            KycError::StepsIncomplete | KycError::MissingData => {
                ApiError::validation(err.to_string())
            }
            KycError::NotVerified => ApiError::forbidden(err.to_string()),
            KycError::Chain(chain) => chain.into(),
        }
    }
}

/// Derive the KYC level from a session's verification flags.
///
/// Strictly increasing checkpoints: email, then phone, then document.
/// Recomputed fresh from the flags every time, never accumulated.
pub fn kyc_level(session: &Session) -> u8 {
    let mut level = 0;
    if session.email_verified {
        level = 1;
    }
    if session.email_verified && session.phone_verified {
        level = 2;
    }
    if session.email_verified && session.phone_verified && session.id_verified {
        level = 3;
    }
    level
}

/// Deterministic credential hash binding the verified contact data and
/// document digest: `sha256("{email}:{phone}:{id_hash}")`, hex-encoded.
pub fn credential_hash(email: &str, phone: &str, id_hash: &str) -> String {
    hex::encode(Sha256::digest(format!("{email}:{phone}:{id_hash}").as_bytes()))
}

pub struct KycOrchestrator {
    sessions: SessionStore,
    identities: IdentityMirror,
    chain: ChainGateway,
    /// Per-session completion locks (never reclaimed; sessions are not
    /// deleted in scope).
    completion_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KycOrchestrator {
    pub fn new(sessions: SessionStore, identities: IdentityMirror, chain: ChainGateway) -> Self {
        Self {
            sessions,
            identities,
            chain,
            completion_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Complete the KYC process for a session: validate, hash, submit to
    /// chain, reconcile the mirror.
    pub async fn complete_kyc(&self, session_id: &str) -> Result<CompletionOutcome, KycError> {
        let lock = self.completion_lock(session_id);
        let _guard = lock.lock().await;

        let session = self
            .sessions
            .get(session_id)
            .map_err(|_| KycError::SessionNotFound)?;

        if session.status == SessionStatus::Completed {
            return Err(KycError::AlreadyCompleted);
        }

        if !session.email_verified || !session.phone_verified || !session.id_verified {
            return Err(KycError::StepsIncomplete);
        }

        // Defensive re-check: implied by the flags, validated independently.
        let (Some(email), Some(phone), Some(id_hash)) = (
            session.email.as_deref().filter(|s| !s.is_empty()),
            session.phone.as_deref().filter(|s| !s.is_empty()),
            session.id_hash.as_deref().filter(|s| !s.is_empty()),
        ) else {
            return Err(KycError::MissingData);
        };

        let level = kyc_level(&session);
        let hash = credential_hash(email, phone, id_hash);

        info!(
            session_id,
            wallet = %session.wallet_address,
            kyc_level = level,
            "completing KYC"
        );

        let tx_hash = self
            .chain
            .submit_identity_update(&session.wallet_address, level, &hash)
            .await
            .map_err(|e| {
                error!(session_id, error = %e, "chain submission failed; session stays pending");
                e
            })?;

        // Chain submission succeeded: the completion stands even if the
        // client has gone away.
        self.sessions.mark_completed(session_id)?;
        self.identities
            .upsert(&session.wallet_address, level, &hash, &tx_hash);

        info!(session_id, %tx_hash, "KYC completed");

        Ok(CompletionOutcome {
            tx_hash,
            kyc_level: level,
        })
    }

    /// Mint the identity NFT for a wallet that completed KYC on chain.
    pub async fn mint_nft(&self, wallet: &WalletAddress) -> Result<String, KycError> {
        if !self.chain.is_verified(wallet).await {
            return Err(KycError::NotVerified);
        }

        info!(wallet = %wallet, "minting identity NFT");
        let tx_hash = self.chain.mint_identity_nft(wallet).await?;
        Ok(tx_hash)
    }

    /// Revoke a wallet's on-chain identity and downgrade the mirror.
    pub async fn revoke_kyc(&self, wallet: &WalletAddress) -> Result<String, KycError> {
        let tx_hash = self.chain.revoke_identity(wallet).await?;
        self.identities.mark_revoked(wallet, &tx_hash);
        info!(wallet = %wallet, %tx_hash, "KYC revoked");
        Ok(tx_hash)
    }

    fn completion_lock(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .completion_locks
            .lock()
            .expect("completion lock map poisoned");
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockChain;

    fn wallet() -> WalletAddress {
        WalletAddress::parse(&format!("0x{}", "aa".repeat(32))).unwrap()
    }

    struct Fixture {
        sessions: SessionStore,
        identities: IdentityMirror,
        mock: MockChain,
        orchestrator: Arc<KycOrchestrator>,
    }

    fn fixture() -> Fixture {
        let sessions = SessionStore::new();
        let identities = IdentityMirror::new();
        let mock = MockChain::new();
        let orchestrator = Arc::new(KycOrchestrator::new(
            sessions.clone(),
            identities.clone(),
            ChainGateway::Mock(mock.clone()),
        ));
        Fixture {
            sessions,
            identities,
            mock,
            orchestrator,
        }
    }

    fn fully_verified_session(fx: &Fixture) -> String {
        let session = fx.sessions.create(wallet());
        let id = session.session_id;
        fx.sessions.record_email_verification(&id, "a@b.com").unwrap();
        fx.sessions
            .record_phone_verification(&id, "+15551234567")
            .unwrap();
        fx.sessions
            .record_id_verification(&id, &"cd".repeat(32))
            .unwrap();
        id
    }

    #[test]
    fn credential_hash_is_deterministic() {
        let a = credential_hash("a@b.com", "+15551234567", "deadbeef");
        let b = credential_hash("a@b.com", "+15551234567", "deadbeef");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        // Known vector, stable across processes.
        assert_eq!(
            credential_hash("a@b.com", "+15551234567", "deadbeef"),
            hex::encode(Sha256::digest(b"a@b.com:+15551234567:deadbeef"))
        );

        assert_ne!(a, credential_hash("a@b.com", "+15551234567", "deadbeee"));
    }

    #[test]
    fn level_follows_checkpoints() {
        let store = SessionStore::new();
        let session = store.create(wallet());
        assert_eq!(kyc_level(&session), 0);

        let s = store
            .record_email_verification(&session.session_id, "a@b.com")
            .unwrap();
        assert_eq!(kyc_level(&s), 1);

        let s = store
            .record_phone_verification(&session.session_id, "+15551234567")
            .unwrap();
        assert_eq!(kyc_level(&s), 2);

        let s = store
            .record_id_verification(&session.session_id, "hash")
            .unwrap();
        assert_eq!(kyc_level(&s), 3);
    }

    #[test]
    fn level_without_email_stays_zero() {
        // Phone and document alone never reach a checkpoint.
        let store = SessionStore::new();
        let session = store.create(wallet());
        store
            .record_phone_verification(&session.session_id, "+15551234567")
            .unwrap();
        let s = store
            .record_id_verification(&session.session_id, "hash")
            .unwrap();
        assert_eq!(kyc_level(&s), 0);
    }

    #[tokio::test]
    async fn happy_path_completes_at_level_three() {
        let fx = fixture();
        let session_id = fully_verified_session(&fx);

        let outcome = fx.orchestrator.complete_kyc(&session_id).await.unwrap();
        assert_eq!(outcome.kyc_level, 3);
        assert!(!outcome.tx_hash.is_empty());

        let session = fx.sessions.get(&session_id).unwrap();
        assert_eq!(session.status, SessionStatus::Completed);

        let record = fx.identities.get(&wallet()).unwrap();
        assert!(record.verified);
        assert_eq!(record.kyc_level, 3);
        assert_eq!(record.last_tx_hash.as_deref(), Some(outcome.tx_hash.as_str()));
    }

    #[tokio::test]
    async fn second_completion_conflicts_and_submits_once() {
        let fx = fixture();
        let session_id = fully_verified_session(&fx);

        fx.orchestrator.complete_kyc(&session_id).await.unwrap();
        let err = fx.orchestrator.complete_kyc(&session_id).await.unwrap_err();

        assert!(matches!(err, KycError::AlreadyCompleted));
        assert_eq!(fx.mock.submission_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_completions_submit_exactly_once() {
        let fx = fixture();
        let session_id = fully_verified_session(&fx);

        let a = {
            let orch = fx.orchestrator.clone();
            let id = session_id.clone();
            tokio::spawn(async move { orch.complete_kyc(&id).await })
        };
        let b = {
            let orch = fx.orchestrator.clone();
            let id = session_id.clone();
            tokio::spawn(async move { orch.complete_kyc(&id).await })
        };

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(matches!(
            [a, b].into_iter().find(|r| r.is_err()).unwrap().unwrap_err(),
            KycError::AlreadyCompleted
        ));
        assert_eq!(fx.mock.submission_count(), 1);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let fx = fixture();
        let err = fx.orchestrator.complete_kyc("missing").await.unwrap_err();
        assert!(matches!(err, KycError::SessionNotFound));
    }

    #[tokio::test]
    async fn premature_completion_fails_without_mutation() {
        let fx = fixture();
        let session = fx.sessions.create(wallet());
        fx.sessions
            .record_email_verification(&session.session_id, "a@b.com")
            .unwrap();

        let err = fx
            .orchestrator
            .complete_kyc(&session.session_id)
            .await
            .unwrap_err();

        assert!(matches!(err, KycError::StepsIncomplete));
        assert_eq!(
            fx.sessions.get(&session.session_id).unwrap().status,
            SessionStatus::Pending
        );
        assert!(fx.identities.get(&wallet()).is_none());
        assert_eq!(fx.mock.submission_count(), 0);
    }

    #[tokio::test]
    async fn empty_verification_data_is_rejected() {
        let fx = fixture();
        let session = fx.sessions.create(wallet());
        let id = session.session_id;
        fx.sessions.record_email_verification(&id, "").unwrap();
        fx.sessions.record_phone_verification(&id, "+15551234567").unwrap();
        fx.sessions.record_id_verification(&id, "hash").unwrap();

        let err = fx.orchestrator.complete_kyc(&id).await.unwrap_err();
        assert!(matches!(err, KycError::MissingData));
    }

    #[tokio::test]
    async fn chain_failure_keeps_session_pending_and_retry_succeeds() {
        let fx = fixture();
        let session_id = fully_verified_session(&fx);
        fx.mock.set_fail_submissions(true);

        let err = fx.orchestrator.complete_kyc(&session_id).await.unwrap_err();
        assert!(matches!(err, KycError::Chain(ChainError::Unavailable(_))));

        // No partial state: session pending, mirror untouched.
        assert_eq!(
            fx.sessions.get(&session_id).unwrap().status,
            SessionStatus::Pending
        );
        assert!(fx.identities.get(&wallet()).is_none());

        // The caller may safely retry.
        fx.mock.set_fail_submissions(false);
        let outcome = fx.orchestrator.complete_kyc(&session_id).await.unwrap();
        assert_eq!(outcome.kyc_level, 3);
        assert_eq!(fx.mock.submission_count(), 1);
    }

    #[tokio::test]
    async fn mint_requires_verified_wallet() {
        let fx = fixture();
        let err = fx.orchestrator.mint_nft(&wallet()).await.unwrap_err();
        assert!(matches!(err, KycError::NotVerified));
    }

    #[tokio::test]
    async fn double_mint_is_a_conflict() {
        let fx = fixture();
        let session_id = fully_verified_session(&fx);
        fx.orchestrator.complete_kyc(&session_id).await.unwrap();

        fx.orchestrator.mint_nft(&wallet()).await.unwrap();
        let err = fx.orchestrator.mint_nft(&wallet()).await.unwrap_err();
        assert!(matches!(err, KycError::Chain(ChainError::AlreadyMinted)));
    }

    #[tokio::test]
    async fn revoke_downgrades_the_mirror() {
        let fx = fixture();
        let session_id = fully_verified_session(&fx);
        fx.orchestrator.complete_kyc(&session_id).await.unwrap();

        let tx_hash = fx.orchestrator.revoke_kyc(&wallet()).await.unwrap();

        let record = fx.identities.get(&wallet()).unwrap();
        assert!(!record.verified);
        assert_eq!(record.last_tx_hash.as_deref(), Some(tx_hash.as_str()));
        assert!(!fx.mock.is_verified(&wallet()));
    }
}

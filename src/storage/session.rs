// SPDX-License-Identifier: AGPL-3.0-or-later

//! Session store: one record per in-progress KYC attempt.
//!
//! ## Invariants
//!
//! - Verification flags are monotonic: once true they never revert.
//! - `status` moves from `PENDING` to `COMPLETED` exactly once
//!   ([`SessionStore::mark_completed`] is a compare-and-swap).
//! - Every mutating operation re-checks `status == PENDING` under the write
//!   lock, so a completed session can never be mutated again.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::WalletAddress;

/// Session lifecycle status.
///
/// `FAILED` is reserved: no transition in scope produces it, but the wire
/// format carries it for forward compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionStatus {
    Pending,
    Completed,
    Failed,
}

/// One KYC verification attempt by a single wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Generated session identifier (UUID v4). Immutable.
    pub session_id: String,
    /// The subject's chain address. Immutable.
    pub wallet_address: WalletAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub id_verified: bool,
    /// Hex digest of the verified identity document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_hash: Option<String>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    fn new(wallet_address: WalletAddress) -> Self {
        let now = Utc::now();
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            wallet_address,
            email: None,
            phone: None,
            email_verified: false,
            phone_verified: false,
            id_verified: false,
            id_hash: None,
            status: SessionStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Errors from session/identity store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Session not found")]
    NotFound,

    #[error("Session already completed")]
    AlreadyCompleted,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::not_found(err.to_string()),
            StoreError::AlreadyCompleted => ApiError::conflict(err.to_string()),
        }
    }
}

/// Shared, clonable handle to the session document store.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new `PENDING` session for a wallet address.
    pub fn create(&self, wallet_address: WalletAddress) -> Session {
        let session = Session::new(wallet_address);
        let mut sessions = self.inner.write().expect("session store lock poisoned");
        sessions.insert(session.session_id.clone(), session.clone());
        session
    }

    /// Fetch a session by id. No side effects.
    pub fn get(&self, session_id: &str) -> Result<Session, StoreError> {
        let sessions = self.inner.read().expect("session store lock poisoned");
        sessions.get(session_id).cloned().ok_or(StoreError::NotFound)
    }

    /// Record a verified email on a pending session.
    pub fn record_email_verification(
        &self,
        session_id: &str,
        email: &str,
    ) -> Result<Session, StoreError> {
        self.mutate_pending(session_id, |session| {
            session.email = Some(email.to_string());
            session.email_verified = true;
        })
    }

    /// Record a verified phone number on a pending session.
    pub fn record_phone_verification(
        &self,
        session_id: &str,
        phone: &str,
    ) -> Result<Session, StoreError> {
        self.mutate_pending(session_id, |session| {
            session.phone = Some(phone.to_string());
            session.phone_verified = true;
        })
    }

    /// Record a verified identity document hash on a pending session.
    pub fn record_id_verification(
        &self,
        session_id: &str,
        id_hash: &str,
    ) -> Result<Session, StoreError> {
        self.mutate_pending(session_id, |session| {
            session.id_hash = Some(id_hash.to_string());
            session.id_verified = true;
        })
    }

    /// Transition a session to `COMPLETED`.
    ///
    /// Compare-and-swap on `status`: fails with `AlreadyCompleted` if a
    /// competing completion won, leaving the record untouched.
    pub fn mark_completed(&self, session_id: &str) -> Result<Session, StoreError> {
        self.mutate_pending(session_id, |session| {
            session.status = SessionStatus::Completed;
        })
    }

    /// Number of sessions still pending (admin stats).
    pub fn pending_count(&self) -> usize {
        let sessions = self.inner.read().expect("session store lock poisoned");
        sessions
            .values()
            .filter(|s| s.status != SessionStatus::Completed)
            .count()
    }

    fn mutate_pending(
        &self,
        session_id: &str,
        apply: impl FnOnce(&mut Session),
    ) -> Result<Session, StoreError> {
        let mut sessions = self.inner.write().expect("session store lock poisoned");
        let session = sessions.get_mut(session_id).ok_or(StoreError::NotFound)?;

        if session.status == SessionStatus::Completed {
            return Err(StoreError::AlreadyCompleted);
        }

        apply(session);
        session.updated_at = Utc::now();
        Ok(session.clone())
    }
}

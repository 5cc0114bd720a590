// SPDX-License-Identifier: AGPL-3.0-or-later

//! Email verification channel.
//!
//! Delivery is simulated: the code is logged instead of handed to a mail
//! provider. A real deployment plugs an SMTP/SES sender into `send_code`
//! without touching the verification contract.

use sha2::{Digest, Sha256};
use tracing::info;

use super::code::{CodePolicy, CodeStore};

#[derive(Clone)]
pub struct EmailVerifier {
    codes: CodeStore,
    policy: CodePolicy,
}

impl EmailVerifier {
    pub fn new(codes: CodeStore, policy: CodePolicy) -> Self {
        Self { codes, policy }
    }

    pub fn policy(&self) -> CodePolicy {
        self.policy
    }

    /// Basic address shape check: one `@` with non-empty local and domain
    /// parts, and a dot somewhere in the domain.
    pub fn is_valid_address(email: &str) -> bool {
        let mut parts = email.splitn(2, '@');
        let local = parts.next().unwrap_or_default();
        let Some(domain) = parts.next() else {
            return false;
        };
        !local.is_empty()
            && !domain.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !email.contains(char::is_whitespace)
    }

    /// Dispatch a one-time code to the address (simulated).
    pub fn send_code(&self, session_id: &str, email: &str) {
        let code = self.codes.issue(session_id);
        info!(session_id, email, %code, "email verification code dispatched");
    }

    /// Check a submitted code for this session.
    pub fn verify_code(&self, session_id: &str, code: &str) -> bool {
        self.codes.check(session_id, code, self.policy)
    }

    /// Privacy hash of a normalized (lowercased) address.
    pub fn hash_email(email: &str) -> String {
        hex::encode(Sha256::digest(email.to_lowercase().as_bytes()))
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later

//! Transient one-time-code storage and verification policy.
//!
//! Codes are session-scoped secrets: issuing a new code for a session
//! overwrites the previous one, and a successful match consumes the code.
//! The store is injected into the channel verifiers rather than held as
//! module-global state, so tests and a future external cache (Redis with
//! TTL) can swap it out without touching the session state machine.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::Rng;

/// How a channel treats verification requests that carry no code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodePolicy {
    /// Demo-grade behavior: sending a code and marking the step verified
    /// happen together, and an absent stored code passes a code check.
    AutoVerify,
    /// Production gating: a step is verified only by a matching code.
    Strict,
}

/// In-process store of the most recently issued code per session.
#[derive(Clone, Default)]
pub struct CodeStore {
    codes: Arc<Mutex<HashMap<String, String>>>,
}

impl CodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate and store a fresh 6-digit code for a session, replacing any
    /// previously issued code.
    pub fn issue(&self, session_id: &str) -> String {
        let code = rand::thread_rng().gen_range(100_000..=999_999).to_string();
        let mut codes = self.codes.lock().expect("code store lock poisoned");
        codes.insert(session_id.to_string(), code.clone());
        code
    }

    /// Check a submitted code against the stored one.
    ///
    /// A match consumes the code (single use). With no stored code the
    /// outcome depends on policy: `AutoVerify` passes, `Strict` fails.
    pub fn check(&self, session_id: &str, code: &str, policy: CodePolicy) -> bool {
        let mut codes = self.codes.lock().expect("code store lock poisoned");
        match codes.get(session_id) {
            None => policy == CodePolicy::AutoVerify,
            Some(stored) => {
                if stored == code {
                    codes.remove(session_id);
                    true
                } else {
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_produces_six_ascii_digits() {
        let store = CodeStore::new();
        for _ in 0..32 {
            let code = store.issue("s1");
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert!(!code.starts_with('0'));
        }
    }

    #[test]
    fn matching_code_passes_and_is_single_use() {
        let store = CodeStore::new();
        let code = store.issue("s1");

        assert!(store.check("s1", &code, CodePolicy::Strict));
        // Consumed: under strict policy the same code no longer matches.
        assert!(!store.check("s1", &code, CodePolicy::Strict));
    }

    #[test]
    fn mismatch_fails_and_keeps_code() {
        let store = CodeStore::new();
        let code = store.issue("s1");

        assert!(!store.check("s1", "000000", CodePolicy::AutoVerify));
        // The stored code survives a failed attempt.
        assert!(store.check("s1", &code, CodePolicy::Strict));
    }

    #[test]
    fn no_stored_code_follows_policy() {
        let store = CodeStore::new();
        assert!(store.check("unknown", "123456", CodePolicy::AutoVerify));
        assert!(!store.check("unknown", "123456", CodePolicy::Strict));
    }

    #[test]
    fn resend_overwrites_previous_code() {
        let store = CodeStore::new();
        let first = store.issue("s1");
        let second = store.issue("s1");

        if first != second {
            assert!(!store.check("s1", &first, CodePolicy::Strict));
        }
        assert!(store.check("s1", &second, CodePolicy::Strict));
    }
}

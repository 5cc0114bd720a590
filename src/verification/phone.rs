// SPDX-License-Identifier: AGPL-3.0-or-later

//! Phone (SMS) verification channel. Mirrors the email channel; SMS
//! delivery is simulated by logging the code.

use sha2::{Digest, Sha256};
use tracing::info;

use super::code::{CodePolicy, CodeStore};

#[derive(Clone)]
pub struct PhoneVerifier {
    codes: CodeStore,
    policy: CodePolicy,
}

impl PhoneVerifier {
    pub fn new(codes: CodeStore, policy: CodePolicy) -> Self {
        Self { codes, policy }
    }

    pub fn policy(&self) -> CodePolicy {
        self.policy
    }

    /// E.164-ish format check: optional `+`, leading digit 1–9, 10–15
    /// digits total.
    pub fn is_valid_number(phone: &str) -> bool {
        let digits = phone.strip_prefix('+').unwrap_or(phone);
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        (10..=15).contains(&digits.len()) && !digits.starts_with('0')
    }

    /// Dispatch a one-time code via SMS (simulated).
    pub fn send_code(&self, session_id: &str, phone: &str) {
        let code = self.codes.issue(session_id);
        info!(session_id, phone, %code, "sms verification code dispatched");
    }

    /// Check a submitted code for this session.
    pub fn verify_code(&self, session_id: &str, code: &str) -> bool {
        self.codes.check(session_id, code, self.policy)
    }

    /// Privacy hash over the digits only.
    pub fn hash_phone(phone: &str) -> String {
        let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
        hex::encode(Sha256::digest(digits.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_validation() {
        assert!(PhoneVerifier::is_valid_number("+15551234567"));
        assert!(PhoneVerifier::is_valid_number("15551234567"));
        assert!(PhoneVerifier::is_valid_number("+442071234567"));
        assert!(!PhoneVerifier::is_valid_number("+0123456789"));
        assert!(!PhoneVerifier::is_valid_number("123456789")); // 9 digits
        assert!(!PhoneVerifier::is_valid_number("+1234567890123456")); // 16 digits
        assert!(!PhoneVerifier::is_valid_number("+1555-123-4567"));
    }

    #[test]
    fn hash_phone_ignores_formatting() {
        assert_eq!(
            PhoneVerifier::hash_phone("+1 (555) 123-4567"),
            PhoneVerifier::hash_phone("15551234567")
        );
    }

    #[test]
    fn code_round_trip() {
        let v = PhoneVerifier::new(CodeStore::new(), CodePolicy::Strict);
        v.send_code("s1", "+15551234567");
        assert!(!v.verify_code("s1", "000000"));
    }
}

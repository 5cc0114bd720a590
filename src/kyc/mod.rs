// SPDX-License-Identifier: AGPL-3.0-or-later

//! # KYC Core
//!
//! The session completion protocol and the status resolver.
//!
//! [`KycOrchestrator`] owns the rules for finishing a verification attempt:
//! ordered precondition checks, credential-hash and level derivation, chain
//! submission, and mirror reconciliation, with at-most-one completion per
//! session. [`StatusResolver`] merges the authoritative on-chain view with
//! the local mirror for wallet status queries.

pub mod orchestrator;
pub mod resolver;

pub use orchestrator::{CompletionOutcome, KycError, KycOrchestrator};
pub use resolver::StatusResolver;

// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Verification Sub-services
//!
//! One stateless strategy per verification channel, each independently
//! validating a single proof of identity:
//!
//! - [`EmailVerifier`] / [`PhoneVerifier`]: one-time-code channels built on
//!   the shared [`CodeStore`], with the demo-grade auto-verify policy made
//!   explicit via [`CodePolicy`].
//! - [`document`]: upload validation and content-addressed hashing of
//!   identity documents.
//! - [`FaceMatcher`]: document-photo vs. selfie comparison, remote service
//!   or in-process stub.

pub mod code;
pub mod document;
pub mod email;
pub mod face;
pub mod phone;

pub use code::{CodePolicy, CodeStore};
pub use email::EmailVerifier;
pub use face::{FaceMatch, FaceMatchError, FaceMatcher};
pub use phone::PhoneVerifier;

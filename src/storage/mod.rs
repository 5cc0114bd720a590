// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Document Stores
//!
//! In-memory, key-addressed stores for the two core records:
//!
//! - [`SessionStore`]: one [`Session`] per verification attempt, keyed by
//!   generated session id.
//! - [`IdentityMirror`]: one [`IdentityRecord`] per wallet address, the
//!   local cache of the last observed on-chain identity state.
//!
//! Both stores are cheaply cloneable handles over shared state and are safe
//! to use from concurrent request handlers. Persistence is out of scope;
//! a deployment can swap these for a real document database behind the same
//! operations.

pub mod identity;
pub mod session;

pub use identity::{IdentityMirror, IdentityRecord};
pub use session::{Session, SessionStatus, SessionStore, StoreError};

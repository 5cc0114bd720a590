// SPDX-License-Identifier: AGPL-3.0-or-later

//! KYC Orchestrator - Identity Verification Backend
//!
//! This crate provides a KYC orchestration service: wallet-scoped
//! verification sessions (email, phone, identity document, face match),
//! an on-chain identity registry gateway, and a status resolver merging
//! chain state with a local mirror.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `kyc` - completion orchestrator and status resolver
//! - `verification` - email/phone codes, document hashing, face matching
//! - `chain` - chain gateway (RPC client + in-process mock)
//! - `storage` - session store and identity mirror
//! - `watcher` - background chain-event audit log

pub mod api;
pub mod chain;
pub mod config;
pub mod error;
pub mod kyc;
pub mod models;
pub mod state;
pub mod storage;
pub mod verification;
pub mod watcher;

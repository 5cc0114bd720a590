// SPDX-License-Identifier: AGPL-3.0-or-later

//! Identity-document processing: upload constraints and content-addressed
//! hashing.
//!
//! The hash is computed over the raw uploaded bytes, so identical documents
//! always produce identical hashes regardless of filename or upload path.

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::ApiError;

/// Accepted upload MIME types.
const ALLOWED_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Maximum upload size: 10 MiB.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Validate an uploaded image before any processing.
pub fn validate_image_upload(content_type: &str, size: usize) -> Result<(), ApiError> {
    if !ALLOWED_TYPES.contains(&content_type) {
        return Err(ApiError::validation(
            "Invalid file type. Allowed: JPEG, PNG, WebP",
        ));
    }

    if size > MAX_UPLOAD_BYTES {
        return Err(ApiError::validation("File too large. Maximum size: 10MB"));
    }

    Ok(())
}

/// SHA-256 hex digest of the raw document bytes.
pub fn process_document(bytes: &[u8]) -> String {
    let hash = hex::encode(Sha256::digest(bytes));
    debug!(prefix = &hash[..16], "identity document hashed");
    hash
}

/// Truncated digest for API responses: never return the full document hash
/// to the uploader.
pub fn truncate_hash(hash: &str) -> String {
    format!("{}...", &hash[..hash.len().min(16)])
}

// SPDX-License-Identifier: AGPL-3.0-or-later

//! Optional static API-key gate applied to all versioned routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{error::ApiError, state::AppState};

const API_KEY_HEADER: &str = "x-api-key";

/// Reject requests without the expected `x-api-key` header when the gate is
/// enabled. Missing key is 401, wrong key is 403.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.config.api_key_enabled {
        return Ok(next.run(request).await);
    }

    let Some(expected) = state.config.api_key.as_deref() else {
        // Gate enabled but no key configured: refuse everything rather than
        // silently allowing.
        tracing::error!("API_KEY_ENABLED is set but API_KEY is empty");
        return Err(ApiError::unauthorized("API key required"));
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        None => Err(ApiError::unauthorized("API key required")),
        Some(key) if key == expected => Ok(next.run(request).await),
        Some(_) => Err(ApiError::forbidden("Invalid API key")),
    }
}

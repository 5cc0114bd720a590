// SPDX-License-Identifier: AGPL-3.0-or-later

//! Issuer administration: revocation and service counters.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::ApiError, models::WalletAddress, state::AppState};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevokeRequest {
    pub wallet_address: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KycRevoked {
    pub tx_hash: String,
    pub explorer_url: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    pub identities: usize,
    pub pending_sessions: usize,
    pub audit_events: usize,
    pub chain_mode: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RevokeResponse {
    pub success: bool,
    pub data: KycRevoked,
}

#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    pub success: bool,
    pub data: ServiceStats,
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/revoke",
    request_body = RevokeRequest,
    tag = "Admin",
    responses(
        (status = 200, body = RevokeResponse),
        (status = 400, description = "Invalid wallet address format"),
        (status = 502, description = "Chain endpoint unavailable")
    )
)]
pub async fn revoke_kyc(
    State(state): State<AppState>,
    Json(request): Json<RevokeRequest>,
) -> Result<Json<RevokeResponse>, ApiError> {
    let wallet = WalletAddress::parse(&request.wallet_address)
        .map_err(|e| e.with_details(serde_json::json!({ "field": "walletAddress" })))?;

    let tx_hash = state.orchestrator.revoke_kyc(&wallet).await?;

    Ok(Json(RevokeResponse {
        success: true,
        data: KycRevoked {
            explorer_url: state.config.explorer_url(&tx_hash),
            tx_hash,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    tag = "Admin",
    responses((status = 200, body = StatsResponse))
)]
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        success: true,
        data: ServiceStats {
            identities: state.identities.count(),
            pending_sessions: state.sessions.pending_count(),
            audit_events: state.audit.len(),
            chain_mode: state.chain.mode().to_string(),
        },
    })
}

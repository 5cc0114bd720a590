// SPDX-License-Identifier: AGPL-3.0-or-later

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    models::WalletAddress,
    state::AppState,
    storage::{Session, SessionStatus},
};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub wallet_address: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: String,
    pub wallet_address: WalletAddress,
    pub status: SessionStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StartSessionResponse {
    pub success: bool,
    pub data: SessionCreated,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub success: bool,
    pub data: Session,
}

#[utoipa::path(
    post,
    path = "/api/v1/session/start",
    request_body = StartSessionRequest,
    tag = "Session",
    responses(
        (status = 201, body = StartSessionResponse),
        (status = 400, description = "Invalid wallet address format")
    )
)]
pub async fn start_session(
    State(state): State<AppState>,
    Json(request): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<StartSessionResponse>), ApiError> {
    let wallet = WalletAddress::parse(&request.wallet_address)
        .map_err(|e| e.with_details(serde_json::json!({ "field": "walletAddress" })))?;

    let session = state.sessions.create(wallet);
    tracing::info!(
        session_id = %session.session_id,
        wallet = %session.wallet_address,
        "KYC session created"
    );

    Ok((
        StatusCode::CREATED,
        Json(StartSessionResponse {
            success: true,
            data: SessionCreated {
                session_id: session.session_id,
                wallet_address: session.wallet_address,
                status: session.status,
                created_at: session.created_at,
            },
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/session/{session_id}",
    params(("session_id" = String, Path, description = "Session identifier")),
    tag = "Session",
    responses(
        (status = 200, body = SessionResponse),
        (status = 404, description = "Session not found")
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.sessions.get(&session_id)?;
    Ok(Json(SessionResponse {
        success: true,
        data: session,
    }))
}

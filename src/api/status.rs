// SPDX-License-Identifier: AGPL-3.0-or-later

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::ApiError, models::WalletAddress, state::AppState};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletKycStatus {
    pub wallet_address: WalletAddress,
    pub verified: bool,
    pub kyc_level: u8,
    pub credential_hash: Option<String>,
    pub last_tx_hash: Option<String>,
    pub version: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub success: bool,
    pub data: WalletKycStatus,
}

#[utoipa::path(
    get,
    path = "/api/v1/status/{wallet_address}",
    params(("wallet_address" = String, Path, description = "Chain account address")),
    tag = "Status",
    responses(
        (status = 200, body = StatusResponse),
        (status = 400, description = "Invalid wallet address format")
    )
)]
pub async fn get_status(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let wallet = WalletAddress::parse(&wallet_address)?;
    let status = state.resolver.get_status(&wallet).await;

    Ok(Json(StatusResponse {
        success: true,
        data: WalletKycStatus {
            wallet_address: wallet,
            verified: status.verified,
            kyc_level: status.kyc_level,
            credential_hash: status.credential_hash,
            last_tx_hash: status.last_tx_hash,
            version: status.version,
        },
    }))
}

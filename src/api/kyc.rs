// SPDX-License-Identifier: AGPL-3.0-or-later

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::ApiError, models::WalletAddress, state::AppState};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteKycRequest {
    pub session_id: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MintNftRequest {
    pub wallet_address: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KycCompleted {
    pub tx_hash: String,
    pub kyc_level: u8,
    pub explorer_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NftMinted {
    pub tx_hash: String,
    pub explorer_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompleteKycResponse {
    pub success: bool,
    pub data: KycCompleted,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MintNftResponse {
    pub success: bool,
    pub data: NftMinted,
}

#[utoipa::path(
    post,
    path = "/api/v1/kyc/complete",
    request_body = CompleteKycRequest,
    tag = "KYC",
    responses(
        (status = 200, body = CompleteKycResponse),
        (status = 400, description = "Verification steps incomplete"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "KYC already completed"),
        (status = 502, description = "Chain endpoint unavailable")
    )
)]
pub async fn complete_kyc(
    State(state): State<AppState>,
    Json(request): Json<CompleteKycRequest>,
) -> Result<Json<CompleteKycResponse>, ApiError> {
    let outcome = state.orchestrator.complete_kyc(&request.session_id).await?;

    Ok(Json(CompleteKycResponse {
        success: true,
        data: KycCompleted {
            explorer_url: state.config.explorer_url(&outcome.tx_hash),
            tx_hash: outcome.tx_hash,
            kyc_level: outcome.kyc_level,
        },
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/kyc/mint-nft",
    request_body = MintNftRequest,
    tag = "KYC",
    responses(
        (status = 200, body = MintNftResponse),
        (status = 403, description = "Wallet has not completed KYC"),
        (status = 409, description = "NFT already minted"),
        (status = 502, description = "Chain endpoint unavailable")
    )
)]
pub async fn mint_nft(
    State(state): State<AppState>,
    Json(request): Json<MintNftRequest>,
) -> Result<Json<MintNftResponse>, ApiError> {
    let wallet = WalletAddress::parse(&request.wallet_address)
        .map_err(|e| e.with_details(serde_json::json!({ "field": "walletAddress" })))?;

    let tx_hash = state.orchestrator.mint_nft(&wallet).await?;

    Ok(Json(MintNftResponse {
        success: true,
        data: NftMinted {
            explorer_url: state.config.explorer_url(&tx_hash),
            tx_hash,
        },
    }))
}

// SPDX-License-Identifier: AGPL-3.0-or-later

//! # HTTP API
//!
//! All routes are versioned under `/api/v1` except `/health` and `/docs`.
//! Handlers carry `#[utoipa::path]` annotations aggregated into [`ApiDoc`]
//! and served through Swagger UI.

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    chain::{ChainEvent, IdentityView},
    error::ApiError,
    models::{KycStatus, WalletAddress},
    state::AppState,
    storage::{IdentityRecord, Session, SessionStatus},
};

pub mod admin;
pub mod auth;
pub mod health;
pub mod kyc;
pub mod session;
pub mod status;
pub mod verify;

/// Multipart body ceiling: two document images plus form overhead.
const UPLOAD_BODY_LIMIT: usize = 25 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/session/start", post(session::start_session))
        .route("/session/{session_id}", get(session::get_session))
        .route("/verify/email", post(verify::verify_email))
        .route("/verify/phone", post(verify::verify_phone))
        .route("/verify/id", post(verify::verify_id))
        .route("/verify/face", post(verify::verify_face))
        .route("/kyc/complete", post(kyc::complete_kyc))
        .route("/kyc/mint-nft", post(kyc::mint_nft))
        .route("/status/{wallet_address}", get(status::get_status))
        .route("/admin/revoke", post(admin::revoke_kyc))
        .route("/admin/stats", get(admin::stats))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .with_state(state.clone());

    let cors = cors_layer(&state.config.cors_origin);

    Router::new()
        .route("/health", get(health::health))
        .with_state(state)
        .nest("/api/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(endpoint_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn endpoint_not_found() -> ApiError {
    ApiError::not_found("Endpoint not found")
}

fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            tracing::warn!(origin, "invalid CORS_ORIGIN, falling back to permissive");
            CorsLayer::permissive()
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        session::start_session,
        session::get_session,
        verify::verify_email,
        verify::verify_phone,
        verify::verify_id,
        verify::verify_face,
        kyc::complete_kyc,
        kyc::mint_nft,
        status::get_status,
        admin::revoke_kyc,
        admin::stats
    ),
    components(
        schemas(
            WalletAddress,
            Session,
            SessionStatus,
            KycStatus,
            IdentityRecord,
            IdentityView,
            ChainEvent,
            health::HealthResponse,
            session::StartSessionRequest,
            session::SessionCreated,
            session::StartSessionResponse,
            session::SessionResponse,
            verify::VerifyEmailRequest,
            verify::VerifyPhoneRequest,
            verify::EmailVerified,
            verify::PhoneVerified,
            verify::IdVerified,
            verify::FaceVerified,
            verify::VerifyEmailResponse,
            verify::VerifyPhoneResponse,
            verify::VerifyIdResponse,
            verify::VerifyFaceResponse,
            kyc::CompleteKycRequest,
            kyc::MintNftRequest,
            kyc::KycCompleted,
            kyc::NftMinted,
            kyc::CompleteKycResponse,
            kyc::MintNftResponse,
            status::WalletKycStatus,
            status::StatusResponse,
            admin::RevokeRequest,
            admin::KycRevoked,
            admin::ServiceStats,
            admin::RevokeResponse,
            admin::StatsResponse
        )
    ),
    tags(
        (name = "Health", description = "Service liveness"),
        (name = "Session", description = "KYC session lifecycle"),
        (name = "Verification", description = "Per-step verification"),
        (name = "KYC", description = "Completion and NFT minting"),
        (name = "Status", description = "Wallet verification status"),
        (name = "Admin", description = "Issuer administration")
    )
)]
struct ApiDoc;

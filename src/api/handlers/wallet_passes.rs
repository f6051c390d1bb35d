//! Wallet-pass proxy handlers.

use axum::{Json, Router, extract::State, routing::get};
use uuid::Uuid;

use crate::api::doc::WALLET_TAG;
use crate::api::dto::{ErrorResponse, LinkWalletPassRequest, WalletPassResponse};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::{PathParams, ValidatedJson};

/// Routes:
/// - GET /{userId}/{businessId}  - Current pass status
/// - POST /{userId}/{businessId} - Link or refresh the pass
pub fn wallet_pass_routes() -> Router<AppState> {
    Router::new().route(
        "/{user_id}/{business_id}",
        get(get_wallet_pass).post(link_wallet_pass),
    )
}

/// An unknown pass upstream is reported as `linked: false`, not as 404.
#[utoipa::path(
    get,
    path = "/api/v1/wallet-passes/{userId}/{businessId}",
    params(
        ("userId" = String, Path, description = "User-service user id"),
        ("businessId" = Uuid, Path, description = "Business id")
    ),
    responses(
        (status = 200, description = "Pass status", body = WalletPassResponse),
        (status = 502, description = "User-service unavailable", body = ErrorResponse)
    ),
    security(("bearerAuth" = [])),
    tag = WALLET_TAG
)]
pub async fn get_wallet_pass(
    State(state): State<AppState>,
    PathParams((user_id, business_id)): PathParams<(String, Uuid)>,
) -> Result<Json<WalletPassResponse>, AppError> {
    let status = state
        .services
        .wallet_passes
        .get_wallet_pass(&user_id, business_id)
        .await?;
    Ok(Json(status.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/wallet-passes/{userId}/{businessId}",
    params(
        ("userId" = String, Path, description = "User-service user id"),
        ("businessId" = Uuid, Path, description = "Business id")
    ),
    request_body = LinkWalletPassRequest,
    responses(
        (status = 200, description = "Pass linked", body = WalletPassResponse),
        (status = 502, description = "User-service unavailable", body = ErrorResponse)
    ),
    security(("bearerAuth" = [])),
    tag = WALLET_TAG
)]
pub async fn link_wallet_pass(
    State(state): State<AppState>,
    PathParams((user_id, business_id)): PathParams<(String, Uuid)>,
    ValidatedJson(payload): ValidatedJson<LinkWalletPassRequest>,
) -> Result<Json<WalletPassResponse>, AppError> {
    let status = state
        .services
        .wallet_passes
        .link_wallet_pass(&user_id, business_id, payload.object_id)
        .await?;
    Ok(Json(status.into()))
}

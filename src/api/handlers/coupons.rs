//! Coupon handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch},
};
use chrono::Utc;
use uuid::Uuid;

use crate::api::doc::COUPON_TAG;
use crate::api::dto::{
    CouponEnvelope, CouponListEnvelope, CouponResponse, CreateCouponRequest, ErrorResponse,
    MemberActivityQuery,
};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::{PathParams, ValidatedJson, ValidatedQuery};

/// Routes:
/// - POST /                   - Issue a coupon for a prize
/// - GET /?userId&businessId  - A member's coupons with prize details
/// - PATCH /{id}/redeem       - Mark a coupon redeemed
pub fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_coupons).post(create_coupon))
        .route("/{id}/redeem", patch(redeem_coupon))
}

#[utoipa::path(
    post,
    path = "/api/v1/coupons",
    request_body = CreateCouponRequest,
    responses(
        (status = 201, description = "Coupon issued", body = CouponEnvelope),
        (status = 400, description = "Invalid body or prize", body = ErrorResponse),
        (status = 409, description = "Code already used", body = ErrorResponse)
    ),
    security(("bearerAuth" = [])),
    tag = COUPON_TAG
)]
pub async fn create_coupon(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateCouponRequest>,
) -> Result<(StatusCode, Json<CouponEnvelope>), AppError> {
    let coupon = state
        .services
        .coupons
        .issue_coupon(payload.into_issue_coupon())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CouponEnvelope {
            coupon: CouponResponse::new(coupon, None, Utc::now()),
        }),
    ))
}

/// Redeeming is not idempotent: a second call stamps a new `redeemedAt`.
#[utoipa::path(
    patch,
    path = "/api/v1/coupons/{id}/redeem",
    params(("id" = Uuid, Path, description = "Coupon id")),
    responses(
        (status = 200, description = "Coupon redeemed", body = CouponEnvelope),
        (status = 404, description = "Unknown coupon", body = ErrorResponse)
    ),
    security(("bearerAuth" = [])),
    tag = COUPON_TAG
)]
pub async fn redeem_coupon(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
) -> Result<Json<CouponEnvelope>, AppError> {
    let coupon = state.services.coupons.redeem_coupon(id).await?;
    Ok(Json(CouponEnvelope {
        coupon: CouponResponse::new(coupon, None, Utc::now()),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/coupons",
    params(MemberActivityQuery),
    responses(
        (status = 200, description = "Coupons, newest first", body = CouponListEnvelope),
        (status = 400, description = "Missing userId or businessId", body = ErrorResponse)
    ),
    security(("bearerAuth" = [])),
    tag = COUPON_TAG
)]
pub async fn list_coupons(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<MemberActivityQuery>,
) -> Result<Json<CouponListEnvelope>, AppError> {
    let now = Utc::now();
    let coupons = state
        .services
        .coupons
        .list_coupons(&query.user_id, query.business_id)
        .await?;
    Ok(Json(CouponListEnvelope {
        coupons: coupons
            .into_iter()
            .map(|listing| CouponResponse::from_listing(listing, now))
            .collect(),
    }))
}

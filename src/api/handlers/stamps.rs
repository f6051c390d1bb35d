//! Stamp issuance handlers.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use crate::api::doc::STAMP_TAG;
use crate::api::dto::{
    ApiResponse, ErrorResponse, IssueStampRequest, MemberActivityQuery, StampResponse,
};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::{ValidatedJson, ValidatedQuery};

/// Routes:
/// - POST /                   - Issue one stamp
/// - GET /?userId&businessId  - A member's stamps, newest first
pub fn stamp_routes() -> Router<AppState> {
    Router::new().route("/", get(list_stamps).post(issue_stamp))
}

/// Issues a stamp and queues a counter push to the user-service.
#[utoipa::path(
    post,
    path = "/api/v1/stamps",
    request_body = IssueStampRequest,
    responses(
        (status = 201, description = "Stamp issued", body = ApiResponse<StampResponse>),
        (status = 400, description = "Invalid body or unknown business", body = ErrorResponse)
    ),
    security(("bearerAuth" = [])),
    tag = STAMP_TAG
)]
pub async fn issue_stamp(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<IssueStampRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StampResponse>>), AppError> {
    let stamp = state
        .services
        .stamps
        .issue_stamp(payload.user_id, payload.business_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("created", stamp.into())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/stamps",
    params(MemberActivityQuery),
    responses(
        (status = 200, description = "Stamps, newest first", body = ApiResponse<Vec<StampResponse>>),
        (status = 400, description = "Missing userId or businessId", body = ErrorResponse)
    ),
    security(("bearerAuth" = [])),
    tag = STAMP_TAG
)]
pub async fn list_stamps(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<MemberActivityQuery>,
) -> Result<Json<ApiResponse<Vec<StampResponse>>>, AppError> {
    let stamps = state
        .services
        .stamps
        .list_stamps(&query.user_id, query.business_id)
        .await?;
    Ok(Json(ApiResponse::ok(
        stamps.into_iter().map(StampResponse::from).collect(),
    )))
}

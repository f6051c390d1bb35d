//! Prize catalog handlers.

use axum::{Json, Router, extract::State, http::StatusCode, routing::{get, put}};
use uuid::Uuid;

use crate::api::doc::PRIZE_TAG;
use crate::api::dto::{
    ApiResponse, CreatePrizeRequest, ErrorResponse, PrizeListQuery, PrizeResponse,
    UpdatePrizeRequest,
};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::{PathParams, ValidatedJson, ValidatedQuery};

/// Routes:
/// - GET /?businessId - The business's catalog, cheapest first
/// - POST /           - Add a prize
/// - PUT /{id}        - Rename or re-price a prize
/// - DELETE /{id}     - Remove a prize
pub fn prize_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_prizes).post(create_prize))
        .route("/{id}", put(update_prize).delete(delete_prize))
}

#[utoipa::path(
    get,
    path = "/api/v1/prizes",
    params(PrizeListQuery),
    responses(
        (status = 200, description = "Prize catalog", body = ApiResponse<Vec<PrizeResponse>>),
        (status = 400, description = "Missing businessId", body = ErrorResponse)
    ),
    security(("bearerAuth" = [])),
    tag = PRIZE_TAG
)]
pub async fn list_prizes(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<PrizeListQuery>,
) -> Result<Json<ApiResponse<Vec<PrizeResponse>>>, AppError> {
    let prizes = state.services.prizes.list_prizes(query.business_id).await?;
    Ok(Json(ApiResponse::ok(
        prizes.into_iter().map(PrizeResponse::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/prizes",
    request_body = CreatePrizeRequest,
    responses(
        (status = 201, description = "Prize created", body = ApiResponse<PrizeResponse>),
        (status = 400, description = "Invalid body or unknown business", body = ErrorResponse)
    ),
    security(("bearerAuth" = [])),
    tag = PRIZE_TAG
)]
pub async fn create_prize(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreatePrizeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PrizeResponse>>), AppError> {
    let prize = state
        .services
        .prizes
        .create_prize(payload.into_new_prize())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("created", prize.into())),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/prizes/{id}",
    params(("id" = Uuid, Path, description = "Prize id")),
    request_body = UpdatePrizeRequest,
    responses(
        (status = 200, description = "Prize updated", body = ApiResponse<PrizeResponse>),
        (status = 404, description = "Unknown prize", body = ErrorResponse)
    ),
    security(("bearerAuth" = [])),
    tag = PRIZE_TAG
)]
pub async fn update_prize(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdatePrizeRequest>,
) -> Result<Json<ApiResponse<PrizeResponse>>, AppError> {
    let prize = state
        .services
        .prizes
        .update_prize(id, payload.into_update_prize())
        .await?;
    Ok(Json(ApiResponse::ok(prize.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/prizes/{id}",
    params(("id" = Uuid, Path, description = "Prize id")),
    responses(
        (status = 204, description = "Prize deleted"),
        (status = 404, description = "Unknown prize", body = ErrorResponse)
    ),
    security(("bearerAuth" = [])),
    tag = PRIZE_TAG
)]
pub async fn delete_prize(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
) -> Result<StatusCode, AppError> {
    state.services.prizes.delete_prize(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

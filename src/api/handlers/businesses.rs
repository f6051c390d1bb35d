//! Business CRUD handlers.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use uuid::Uuid;

use crate::api::doc::BUSINESS_TAG;
use crate::api::dto::{
    ApiResponse, BusinessResponse, CreateBusinessRequest, ErrorResponse, PagedResponse,
    PaginationParams, UpdateBusinessRequest,
};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::{PathParams, ValidatedJson, ValidatedQuery};

/// Routes:
/// - GET /        - List businesses (paginated)
/// - POST /       - Create a business
/// - GET /{id}    - Get a business
/// - PUT /{id}    - Update a business
/// - DELETE /{id} - Delete a business and everything it owns
pub fn business_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_businesses).post(create_business))
        .route(
            "/{id}",
            get(get_business).put(update_business).delete(delete_business),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/businesses",
    params(PaginationParams),
    responses(
        (status = 200, description = "A page of businesses", body = PagedResponse<BusinessResponse>),
        (status = 400, description = "Invalid pagination", body = ErrorResponse)
    ),
    security(("bearerAuth" = [])),
    tag = BUSINESS_TAG
)]
pub async fn list_businesses(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<PaginationParams>,
) -> Result<Json<PagedResponse<BusinessResponse>>, AppError> {
    let (businesses, total) = state
        .services
        .businesses
        .list_businesses(params.offset(), i64::from(params.limit))
        .await?;

    Ok(Json(PagedResponse::new(
        "ok",
        businesses.into_iter().map(BusinessResponse::from).collect(),
        params.page,
        params.limit,
        u64::try_from(total).unwrap_or_default(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/businesses",
    request_body = CreateBusinessRequest,
    responses(
        (status = 201, description = "Business created", body = ApiResponse<BusinessResponse>),
        (status = 400, description = "Invalid body", body = ErrorResponse)
    ),
    security(("bearerAuth" = [])),
    tag = BUSINESS_TAG
)]
pub async fn create_business(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateBusinessRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BusinessResponse>>), AppError> {
    let business = state
        .services
        .businesses
        .create_business(payload.into_new_business())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("created", business.into())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/businesses/{id}",
    params(("id" = Uuid, Path, description = "Business id")),
    responses(
        (status = 200, description = "The business", body = ApiResponse<BusinessResponse>),
        (status = 404, description = "Unknown business", body = ErrorResponse)
    ),
    security(("bearerAuth" = [])),
    tag = BUSINESS_TAG
)]
pub async fn get_business(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
) -> Result<Json<ApiResponse<BusinessResponse>>, AppError> {
    let business = state.services.businesses.get_business(id).await?;
    Ok(Json(ApiResponse::ok(business.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/businesses/{id}",
    params(("id" = Uuid, Path, description = "Business id")),
    request_body = UpdateBusinessRequest,
    responses(
        (status = 200, description = "Business updated", body = ApiResponse<BusinessResponse>),
        (status = 404, description = "Unknown business", body = ErrorResponse)
    ),
    security(("bearerAuth" = [])),
    tag = BUSINESS_TAG
)]
pub async fn update_business(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateBusinessRequest>,
) -> Result<Json<ApiResponse<BusinessResponse>>, AppError> {
    let business = state
        .services
        .businesses
        .update_business(id, payload.into_update_business())
        .await?;
    Ok(Json(ApiResponse::ok(business.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/businesses/{id}",
    params(("id" = Uuid, Path, description = "Business id")),
    responses(
        (status = 204, description = "Business deleted"),
        (status = 404, description = "Unknown business", body = ErrorResponse)
    ),
    security(("bearerAuth" = [])),
    tag = BUSINESS_TAG
)]
pub async fn delete_business(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
) -> Result<StatusCode, AppError> {
    state.services.businesses.delete_business(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

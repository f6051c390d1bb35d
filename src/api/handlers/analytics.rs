//! Dashboard analytics handlers.

use axum::{Json, Router, extract::State, http::HeaderMap, routing::get};
use chrono::Utc;
use uuid::Uuid;

use super::{business_id_header, first_business_id};
use crate::api::doc::ANALYTICS_TAG;
use crate::api::dto::{ApiResponse, BusinessScopeQuery, DailySeriesQuery, ErrorResponse};
use crate::error::{AppError, AppResult};
use crate::services::{AnalyticsSummary, DailySeries};
use crate::state::AppState;
use crate::utils::ValidatedQuery;

/// Routes:
/// - GET /                    - Summary figures
/// - GET /daily-transactions  - Per-day visitors and stamps
pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(summary))
        .route("/daily-transactions", get(daily_transactions))
}

/// Query string, then `x-business-id`, then the configured default.
fn resolve_business(
    state: &AppState,
    from_query: Option<Uuid>,
    headers: &HeaderMap,
) -> AppResult<Uuid> {
    first_business_id(&[
        from_query,
        business_id_header(headers)?,
        state.default_business_id,
    ])
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics",
    params(BusinessScopeQuery),
    responses(
        (status = 200, description = "Summary figures", body = ApiResponse<AnalyticsSummary>),
        (status = 400, description = "No business could be resolved", body = ErrorResponse)
    ),
    security(("bearerAuth" = [])),
    tag = ANALYTICS_TAG
)]
pub async fn summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedQuery(query): ValidatedQuery<BusinessScopeQuery>,
) -> Result<Json<ApiResponse<AnalyticsSummary>>, AppError> {
    let business_id = resolve_business(&state, query.business_id, &headers)?;
    let summary = state
        .services
        .analytics
        .summary(business_id, Utc::now())
        .await?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// One point per UTC day for the last `days` days, today included; days
/// without activity report 0.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/daily-transactions",
    params(DailySeriesQuery),
    responses(
        (status = 200, description = "Daily series", body = ApiResponse<DailySeries>),
        (status = 400, description = "No business could be resolved", body = ErrorResponse)
    ),
    security(("bearerAuth" = [])),
    tag = ANALYTICS_TAG
)]
pub async fn daily_transactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedQuery(query): ValidatedQuery<DailySeriesQuery>,
) -> Result<Json<ApiResponse<DailySeries>>, AppError> {
    let business_id = resolve_business(&state, query.business_id, &headers)?;
    let series = state
        .services
        .analytics
        .daily_series(business_id, query.days, Utc::now())
        .await?;
    Ok(Json(ApiResponse::ok(series)))
}

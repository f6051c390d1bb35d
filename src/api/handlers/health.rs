//! Health check endpoint handlers.
//!
//! Both checks are mounted outside `/api/v1` and need no token.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use crate::api::doc::HEALTH_TAG;
use crate::api::dto::{HealthResponse, ReadinessResponse};
use crate::db;
use crate::state::AppState;

/// - `GET /health` - Liveness
/// - `GET /health/ready` - Readiness, including a database round-trip
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    ),
    tag = HEALTH_TAG
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Runs `SELECT 1` through the pool.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready", body = ReadinessResponse),
        (status = 503, description = "Database is unreachable", body = ReadinessResponse)
    ),
    tag = HEALTH_TAG
)]
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    match db::ping(&state.db_pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ok".to_string(),
                database: "ok".to_string(),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "unavailable".to_string(),
                    database: "unreachable".to_string(),
                }),
            )
        }
    }
}

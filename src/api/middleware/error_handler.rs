//! Conversion of `AppError` into HTTP responses.
//!
//! Server-side failures are logged with their full source chain and
//! answered with a generic message; client errors carry their own message
//! and, for validation failures, per-field details.

use std::fmt::Write as _;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::dto::ErrorResponse;
use crate::error::AppError;

/// Error body kept on the response so the request id can be added once the
/// id middleware sees it.
#[derive(Clone)]
struct ErrorBody(ErrorResponse);

pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Duplicate { .. } => StatusCode::CONFLICT,
        AppError::Validation { .. }
        | AppError::ValidationErrors { .. }
        | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
        AppError::ExternalService { .. } => StatusCode::BAD_GATEWAY,
        AppError::Database { .. } | AppError::Configuration { .. } | AppError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        AppError::ConnectionPool { .. } => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn error_body(error: &AppError) -> ErrorResponse {
    match error {
        AppError::NotFound { entity, .. } => {
            ErrorResponse::new("NOT_FOUND", format!("{} not found", entity))
        }
        AppError::Duplicate { entity, field, .. } => ErrorResponse::new(
            "DUPLICATE",
            format!("{} with this {} already exists", entity, field),
        )
        .with_details(json!({ "field": field })),
        AppError::Validation { field, reason } => {
            ErrorResponse::new("VALIDATION_ERROR", format!("Invalid {}", field))
                .with_details(json!([{ "field": field, "message": reason }]))
        }
        AppError::ValidationErrors { errors } => {
            ErrorResponse::new("VALIDATION_ERROR", "Request validation failed")
                .with_details(json!(errors))
        }
        AppError::BadRequest { message } => ErrorResponse::new("BAD_REQUEST", message.clone()),
        AppError::Unauthorized { message } => ErrorResponse::new("UNAUTHORIZED", message.clone()),
        AppError::Forbidden { message } => ErrorResponse::new("FORBIDDEN", message.clone()),
        AppError::ExternalService { service, .. } => ErrorResponse::new(
            "UPSTREAM_ERROR",
            format!("Upstream service {} is unavailable", service),
        ),
        AppError::Database { .. } => {
            ErrorResponse::new("DATABASE_ERROR", "A database error occurred")
        }
        AppError::Configuration { .. } => {
            ErrorResponse::new("CONFIGURATION_ERROR", "The service is misconfigured")
        }
        AppError::ConnectionPool { .. } => {
            ErrorResponse::new("SERVICE_UNAVAILABLE", "Database connection unavailable")
        }
        AppError::Internal { .. } => {
            ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred")
        }
    }
}

/// `error: cause: cause...`
fn source_chain(error: &AppError) -> String {
    let mut chain = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let _ = write!(chain, ": {}", cause);
        source = cause.source();
    }
    chain
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);

        if self.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %source_chain(&self), "Request failed");
        }

        let body = error_body(&self);
        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(ErrorBody(body));
        response
    }
}

/// Re-renders an `AppError` response with `request_id` in its body.
/// Other responses pass through unchanged.
pub(super) fn attach_request_id(mut response: Response, request_id: &str) -> Response {
    let Some(ErrorBody(body)) = response.extensions_mut().remove::<ErrorBody>() else {
        return response;
    };

    let status = response.status();
    let (mut parts, _) = response.into_parts();
    let rendered = Json(body.with_request_id(request_id)).into_response();
    let (rendered_parts, rendered_body) = rendered.into_parts();

    parts.status = status;
    parts.headers.extend(rendered_parts.headers);
    Response::from_parts(parts, rendered_body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationFieldError;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::not_found("Prize", "id", 1), StatusCode::NOT_FOUND),
            (AppError::bad_request("nope"), StatusCode::BAD_REQUEST),
            (
                AppError::Forbidden {
                    message: "no".to_string(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                AppError::user_service("down", None),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AppError::missing_config("user_service.oauth.client_id"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::ConnectionPool {
                    source: anyhow::anyhow!("timed out"),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error_to_status_code(&error), expected, "{:?}", error);
        }
    }

    #[tokio::test]
    async fn test_validation_errors_carry_field_details() {
        let response = AppError::ValidationErrors {
            errors: vec![ValidationFieldError {
                field: "limit".to_string(),
                message: "limit must be between 1 and 200".to_string(),
            }],
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_of(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"][0]["field"], "limit");
    }

    #[tokio::test]
    async fn test_server_errors_hide_internals() {
        let response = AppError::Database {
            operation: "insert stamp".to_string(),
            source: anyhow::anyhow!("relation \"stamps\" does not exist"),
        }
        .into_response();

        let body = body_of(response).await;
        assert_eq!(body["message"], "A database error occurred");
        assert!(!body.to_string().contains("relation"));
    }

    #[test]
    fn test_source_chain_includes_causes() {
        let error = AppError::user_service(
            "query failed",
            Some(anyhow::anyhow!("connection refused")),
        );
        assert_eq!(
            source_chain(&error),
            "External service user-service failed: query failed: connection refused"
        );
    }

    #[tokio::test]
    async fn test_attach_request_id_keeps_status() {
        let response = attach_request_id(
            AppError::Unauthorized {
                message: "Token has expired".to_string(),
            }
            .into_response(),
            "req-1",
        );

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_of(response).await;
        assert_eq!(body["request_id"], "req-1");
        assert_eq!(body["message"], "Token has expired");
    }
}

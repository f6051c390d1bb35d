//! Request ID middleware for request tracing.
//!
//! Every request gets an identifier, taken from an incoming `x-request-id`
//! header or generated as a UUID v4. It is stored in request extensions,
//! echoed on the response, and copied into JSON error bodies.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use super::error_handler::attach_request_id;

/// Header name for request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest client-supplied id accepted as-is
const MAX_INCOMING_ID_LEN: usize = 128;

/// Request ID stored in request extensions for downstream access.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= MAX_INCOMING_ID_LEN)
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let response = next.run(request).await;
    let mut response = attach_request_id(response, &request_id);

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use axum::{Router, body::Body, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    fn router() -> Router {
        Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route(
                "/missing",
                get(|| async { Err::<(), _>(AppError::not_found("Coupon", "id", "42")) }),
            )
            .layer(middleware::from_fn(request_id_middleware))
    }

    #[tokio::test]
    async fn test_incoming_id_is_echoed() {
        let response = router()
            .oneshot(
                Request::get("/ok")
                    .header(REQUEST_ID_HEADER, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[REQUEST_ID_HEADER], "abc-123");
    }

    #[tokio::test]
    async fn test_generated_id_lands_in_error_body() {
        let response = router()
            .oneshot(Request::get("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let header_id = response.headers()[REQUEST_ID_HEADER]
            .to_str()
            .unwrap()
            .to_string();
        assert!(Uuid::parse_str(&header_id).is_ok());

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["request_id"], header_id);
    }
}

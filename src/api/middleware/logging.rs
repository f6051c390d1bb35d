//! Logging middleware for request/response tracing.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::{Instrument, Level, info, span, warn};

use super::RequestId;

/// Logs each request and its response inside an `http_request` span
/// carrying method, path and request id.
///
/// Client errors are logged at `info`, server errors at `warn`; the error
/// handler has already logged the source chain for the latter.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let span = span!(
        Level::INFO,
        "http_request",
        method = %method,
        path = %path,
        request_id = %request_id
    );

    async move {
        info!("Request received");

        let start = Instant::now();
        let response = next.run(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;
        let status = response.status().as_u16();

        if response.status().is_server_error() {
            warn!(status, duration_ms, "Response sent");
        } else {
            info!(status, duration_ms, "Response sent");
        }

        response
    }
    .instrument(span)
    .await
}

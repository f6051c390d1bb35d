//! Error response DTOs.

use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response format.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "code": "FORBIDDEN",
    "message": "Requires staff or higher role",
    "request_id": "0b8e6f0e-5d6c-4a43-8f7e-2a1c2b3d4e5f"
}))]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    /// Creates a new error response with code and message.
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
            request_id: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Adds request ID to the error response for correlation.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

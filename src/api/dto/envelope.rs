//! Response envelopes and pagination parameters shared by all endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// `{message, data}` wrapper used by every JSON endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    #[schema(example = "ok")]
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self::with_message("ok", data)
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// Query parameters for pagination.
#[derive(Debug, Deserialize, IntoParams, Validate)]
pub struct PaginationParams {
    /// Page number (1-based)
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    #[param(minimum = 1, example = 1)]
    pub page: u32,

    /// Items per page (max 100)
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    #[param(minimum = 1, maximum = 100, example = 20)]
    pub limit: u32,
}

impl PaginationParams {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PageMeta {
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub limit: u32,
    /// Items across all pages
    #[schema(example = 57)]
    pub total: u64,
}

/// A page of items with its pagination metadata
#[derive(Debug, Serialize, ToSchema)]
pub struct PagedResponse<T> {
    pub message: String,
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> PagedResponse<T> {
    pub fn new(message: impl Into<String>, data: Vec<T>, page: u32, limit: u32, total: u64) -> Self {
        Self {
            message: message.into(),
            data,
            pagination: PageMeta { page, limit, total },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        let params = PaginationParams { page: 3, limit: 20 };
        assert_eq!(params.offset(), 40);
        let params = PaginationParams { page: 0, limit: 20 };
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_paged_response_shape() {
        let page = PagedResponse::new("ok", vec![1, 2], 2, 2, 5);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pagination"]["total"], 5);
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
    }
}

//! HTTP request handlers for API endpoints.
//!
//! This module contains all request handlers organized by resource type.

pub mod analytics;
pub mod businesses;
pub mod coupons;
pub mod health;
pub mod members;
pub mod prizes;
pub mod stamps;
pub mod wallet_passes;

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Header naming the business when neither body nor query does
pub const BUSINESS_ID_HEADER: &str = "x-business-id";

/// First business id found among the given candidates, in order.
fn first_business_id(candidates: &[Option<Uuid>]) -> AppResult<Uuid> {
    candidates
        .iter()
        .flatten()
        .copied()
        .next()
        .ok_or_else(|| AppError::bad_request("businessId is required"))
}

fn business_id_header(headers: &HeaderMap) -> AppResult<Option<Uuid>> {
    let Some(value) = headers.get(BUSINESS_ID_HEADER) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .map(Some)
        .ok_or_else(|| AppError::bad_request("x-business-id must be a UUID"))
}

//! Stamp DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::Stamp;

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueStampRequest {
    #[validate(length(min = 1, max = 255, message = "userId is required"))]
    pub user_id: String,
    pub business_id: Uuid,
}

/// Selects one member's stamps or coupons at one business
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase", parameter_in = Query)]
pub struct MemberActivityQuery {
    #[validate(length(min = 1, message = "userId is required"))]
    pub user_id: String,
    pub business_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StampResponse {
    pub id: Uuid,
    pub business_id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<Stamp> for StampResponse {
    fn from(stamp: Stamp) -> Self {
        Self {
            id: stamp.id,
            business_id: stamp.business_id,
            user_id: stamp.user_id,
            created_at: stamp.created_at,
        }
    }
}

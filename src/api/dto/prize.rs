//! Prize catalog DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::{NewPrize, Prize, UpdatePrize};

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase", parameter_in = Query)]
pub struct PrizeListQuery {
    pub business_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrizeRequest {
    pub business_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    #[schema(example = "Free coffee")]
    pub name: String,
    #[validate(range(min = 1, message = "pointsRequired must be at least 1"))]
    #[schema(minimum = 1, example = 10)]
    pub points_required: i32,
}

impl CreatePrizeRequest {
    pub fn into_new_prize(self) -> NewPrize {
        NewPrize {
            business_id: self.business_id,
            name: self.name.trim().to_string(),
            points_required: self.points_required,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePrizeRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: Option<String>,
    #[validate(range(min = 1, message = "pointsRequired must be at least 1"))]
    pub points_required: Option<i32>,
}

impl UpdatePrizeRequest {
    pub fn into_update_prize(self) -> UpdatePrize {
        UpdatePrize {
            name: self.name.map(|n| n.trim().to_string()),
            points_required: self.points_required,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrizeResponse {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub points_required: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Prize> for PrizeResponse {
    fn from(prize: Prize) -> Self {
        Self {
            id: prize.id,
            business_id: prize.business_id,
            name: prize.name,
            points_required: prize.points_required,
            created_at: prize.created_at,
        }
    }
}

//! Business DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Business, NewBusiness, UpdateBusiness};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateBusinessRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    #[schema(min_length = 1, max_length = 200, example = "Corner Coffee")]
    pub name: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

impl CreateBusinessRequest {
    pub fn into_new_business(self) -> NewBusiness {
        NewBusiness {
            name: self.name.trim().to_string(),
            description: self.description,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateBusinessRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

impl UpdateBusinessRequest {
    pub fn into_update_business(self) -> UpdateBusiness {
        UpdateBusiness {
            name: self.name.map(|n| n.trim().to_string()),
            description: self.description,
            updated_at: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusinessResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Business> for BusinessResponse {
    fn from(business: Business) -> Self {
        Self {
            id: business.id,
            name: business.name,
            description: business.description,
            created_at: business.created_at,
            updated_at: business.updated_at,
        }
    }
}

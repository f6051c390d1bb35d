use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Business, NewBusiness, UpdateBusiness};
use crate::repositories::BusinessRepository;

/// Tenant management
#[derive(Clone)]
pub struct BusinessService {
    repo: BusinessRepository,
}

impl BusinessService {
    pub fn new(repo: BusinessRepository) -> Self {
        Self { repo }
    }

    pub async fn create_business(&self, new_business: NewBusiness) -> AppResult<Business> {
        let business = self.repo.create(new_business).await?;
        tracing::info!(business_id = %business.id, "Business created");
        Ok(business)
    }

    /// Gets a business by id, or `NotFound`
    pub async fn get_business(&self, id: Uuid) -> AppResult<Business> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("business", "id", id))
    }

    /// Lists businesses with pagination.
    ///
    /// # Returns
    /// A tuple of (businesses, total_count)
    pub async fn list_businesses(&self, offset: i64, limit: i64) -> AppResult<(Vec<Business>, i64)> {
        self.repo.list_paginated(offset, limit).await
    }

    pub async fn update_business(&self, id: Uuid, mut changes: UpdateBusiness) -> AppResult<Business> {
        changes.updated_at = Some(Utc::now());
        self.repo
            .update(id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("business", "id", id))
    }

    /// Deletes a business together with its prizes, stamps and coupons.
    pub async fn delete_business(&self, id: Uuid) -> AppResult<()> {
        if self.repo.delete(id).await? == 0 {
            return Err(AppError::not_found("business", "id", id));
        }
        tracing::info!(business_id = %id, "Business deleted");
        Ok(())
    }
}

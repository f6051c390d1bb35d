use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NewPrize, Prize, UpdatePrize};
use crate::repositories::PrizeRepository;

/// Prize catalog maintenance
#[derive(Clone)]
pub struct PrizeService {
    repo: PrizeRepository,
}

impl PrizeService {
    pub fn new(repo: PrizeRepository) -> Self {
        Self { repo }
    }

    /// Catalog of a business, cheapest prize first
    pub async fn list_prizes(&self, business_id: Uuid) -> AppResult<Vec<Prize>> {
        self.repo.list_by_business(business_id).await
    }

    /// An unknown business surfaces as a foreign key violation (400).
    pub async fn create_prize(&self, new_prize: NewPrize) -> AppResult<Prize> {
        let prize = self.repo.create(new_prize).await?;
        tracing::info!(
            business_id = %prize.business_id,
            prize_id = %prize.id,
            points_required = prize.points_required,
            "Prize created"
        );
        Ok(prize)
    }

    pub async fn get_prize(&self, id: Uuid) -> AppResult<Prize> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("prize", "id", id))
    }

    pub async fn update_prize(&self, id: Uuid, changes: UpdatePrize) -> AppResult<Prize> {
        // an empty changeset is rejected by diesel
        if changes.name.is_none() && changes.points_required.is_none() {
            return self.get_prize(id).await;
        }
        self.repo
            .update(id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("prize", "id", id))
    }

    pub async fn delete_prize(&self, id: Uuid) -> AppResult<()> {
        match self.repo.delete(id).await? {
            0 => Err(AppError::not_found("prize", "id", id)),
            _ => Ok(()),
        }
    }
}

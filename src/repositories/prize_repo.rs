//! Prize catalog repository.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::AppError;
use crate::models::{NewPrize, Prize, UpdatePrize};

#[derive(Clone)]
pub struct PrizeRepository {
    pool: AsyncDbPool,
}

impl PrizeRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_prize: NewPrize) -> Result<Prize, AppError> {
        use crate::schema::prizes::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(prizes)
            .values(&new_prize)
            .returning(Prize::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn find_by_id(&self, prize_id: Uuid) -> Result<Option<Prize>, AppError> {
        use crate::schema::prizes::dsl::*;
        let mut conn = self.pool.get().await?;

        prizes
            .filter(id.eq(prize_id))
            .select(Prize::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Lists a business's catalog, cheapest prize first.
    pub async fn list_by_business(&self, business: Uuid) -> Result<Vec<Prize>, AppError> {
        use crate::schema::prizes::dsl::*;
        let mut conn = self.pool.get().await?;

        prizes
            .filter(business_id.eq(business))
            .order((points_required.asc(), created_at.asc()))
            .select(Prize::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn update(
        &self,
        prize_id: Uuid,
        update_data: UpdatePrize,
    ) -> Result<Option<Prize>, AppError> {
        use crate::schema::prizes::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::update(prizes.filter(id.eq(prize_id)))
            .set(&update_data)
            .returning(Prize::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    pub async fn delete(&self, prize_id: Uuid) -> Result<usize, AppError> {
        use crate::schema::prizes::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::delete(prizes.filter(id.eq(prize_id)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }
}

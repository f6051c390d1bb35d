//! Business repository for async database operations.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::AppError;
use crate::models::{Business, NewBusiness, UpdateBusiness};

#[derive(Clone)]
pub struct BusinessRepository {
    pool: AsyncDbPool,
}

impl BusinessRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_business: NewBusiness) -> Result<Business, AppError> {
        use crate::schema::businesses::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(businesses)
            .values(&new_business)
            .returning(Business::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Finds a business by id, `None` when it does not exist.
    pub async fn find_by_id(&self, business_id: Uuid) -> Result<Option<Business>, AppError> {
        use crate::schema::businesses::dsl::*;
        let mut conn = self.pool.get().await?;

        businesses
            .filter(id.eq(business_id))
            .select(Business::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Lists a page of businesses ordered by name, plus the total count.
    pub async fn list_paginated(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Business>, i64), AppError> {
        use crate::schema::businesses::dsl::*;
        let mut conn = self.pool.get().await?;

        let total: i64 = businesses
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)?;

        let items = businesses
            .order((name.asc(), id.asc()))
            .offset(offset)
            .limit(limit)
            .select(Business::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok((items, total))
    }

    pub async fn update(
        &self,
        business_id: Uuid,
        update_data: UpdateBusiness,
    ) -> Result<Option<Business>, AppError> {
        use crate::schema::businesses::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::update(businesses.filter(id.eq(business_id)))
            .set(&update_data)
            .returning(Business::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Deletes a business and, through cascading keys, its catalog, stamps and coupons.
    ///
    /// # Returns
    /// The number of affected rows (0 or 1)
    pub async fn delete(&self, business_id: Uuid) -> Result<usize, AppError> {
        use crate::schema::businesses::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::delete(businesses.filter(id.eq(business_id)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }
}

//! Stamp repository: issuance events and per-user aggregates.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::AppError;
use crate::models::{NewStamp, Stamp};

#[derive(Clone)]
pub struct StampRepository {
    pool: AsyncDbPool,
}

impl StampRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_stamp: NewStamp) -> Result<Stamp, AppError> {
        use crate::schema::stamps::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(stamps)
            .values(&new_stamp)
            .returning(Stamp::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Lists a user's stamps at a business, newest first.
    pub async fn list_for_user(&self, user: &str, business: Uuid) -> Result<Vec<Stamp>, AppError> {
        use crate::schema::stamps::dsl::*;
        let mut conn = self.pool.get().await?;

        stamps
            .filter(business_id.eq(business))
            .filter(user_id.eq(user))
            .order(created_at.desc())
            .select(Stamp::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn count_for_user(&self, user: &str, business: Uuid) -> Result<i64, AppError> {
        use crate::schema::stamps::dsl::*;
        let mut conn = self.pool.get().await?;

        stamps
            .filter(business_id.eq(business))
            .filter(user_id.eq(user))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }
}

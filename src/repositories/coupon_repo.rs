//! Coupon repository.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::AppError;
use crate::models::{Coupon, NewCoupon};
use crate::schema::{coupons, prizes};

/// A coupon together with the name and threshold of the prize it was issued for.
pub type CouponWithPrize = (Coupon, Option<(String, i32)>);

#[derive(Clone)]
pub struct CouponRepository {
    pool: AsyncDbPool,
}

impl CouponRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_coupon: NewCoupon) -> Result<Coupon, AppError> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(coupons::table)
            .values(&new_coupon)
            .returning(Coupon::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Marks a coupon redeemed. Re-redeeming overwrites `redeemed_at`.
    ///
    /// # Returns
    /// The updated coupon, or `None` when no coupon has this id
    pub async fn redeem(
        &self,
        coupon_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Coupon>, AppError> {
        let mut conn = self.pool.get().await?;

        diesel::update(coupons::table.filter(coupons::id.eq(coupon_id)))
            .set((
                coupons::is_redeemed.eq(true),
                coupons::redeemed_at.eq(Some(at)),
            ))
            .returning(Coupon::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Lists a user's coupons at a business, newest first.
    pub async fn list_for_user(
        &self,
        user: &str,
        business: Uuid,
    ) -> Result<Vec<CouponWithPrize>, AppError> {
        let mut conn = self.pool.get().await?;

        coupons::table
            .left_join(prizes::table)
            .filter(coupons::business_id.eq(business))
            .filter(coupons::user_id.eq(user))
            .order(coupons::created_at.desc())
            .select((
                Coupon::as_select(),
                (prizes::name, prizes::points_required).nullable(),
            ))
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Counts coupons that are unredeemed and unexpired at `now`.
    pub async fn count_valid_for_user(
        &self,
        user: &str,
        business: Uuid,
        now: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let mut conn = self.pool.get().await?;

        coupons::table
            .filter(coupons::business_id.eq(business))
            .filter(coupons::user_id.eq(user))
            .filter(coupons::is_redeemed.eq(false))
            .filter(
                coupons::expired_at
                    .is_null()
                    .or(coupons::expired_at.gt(now)),
            )
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }
}

//! Repository layer for data access operations.
//!
//! Provides async CRUD and aggregate queries for businesses, prizes, stamps
//! and coupons.

mod analytics_repo;
mod business_repo;
mod coupon_repo;
mod prize_repo;
mod stamp_repo;

pub use analytics_repo::{AnalyticsRepository, DailyActivity};
pub use business_repo::BusinessRepository;
pub use coupon_repo::{CouponRepository, CouponWithPrize};
pub use prize_repo::PrizeRepository;
pub use stamp_repo::StampRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::AppResult;
use crate::models::{Coupon, NewCoupon, Prize};

/// Locally owned aggregates for one user at one business
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    /// Stamps collected at the business
    pub valid_stamps: i64,
    /// Coupons still redeemable (unredeemed and unexpired)
    pub coupons_count: i64,
    /// Every coupon ever issued to the user at the business
    pub total_coupons: i64,
    /// Time of the most recent stamp
    pub last_visit: Option<DateTime<Utc>>,
}

/// Read access to the local loyalty data used by the CRM listing and the
/// counter sync worker.
#[async_trait]
pub trait LoyaltyStore: Send + Sync {
    /// The business's prize catalog
    async fn prize_catalog(&self, business_id: Uuid) -> AppResult<Vec<Prize>>;

    /// Coupon validity is judged at `now`.
    async fn user_stats(
        &self,
        user_id: &str,
        business_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<UserStats>;

    async fn count_valid_stamps(&self, user_id: &str, business_id: Uuid) -> AppResult<i64>;

    async fn count_valid_coupons(
        &self,
        user_id: &str,
        business_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<i64>;
}

/// Persistence used by coupon issuance and redemption.
#[async_trait]
pub trait CouponStore: Send + Sync {
    async fn find_prize(&self, prize_id: Uuid) -> AppResult<Option<Prize>>;

    async fn create_coupon(&self, new_coupon: NewCoupon) -> AppResult<Coupon>;

    /// `None` when no coupon has this id
    async fn redeem_coupon(
        &self,
        coupon_id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Coupon>>;

    async fn list_coupons(
        &self,
        user_id: &str,
        business_id: Uuid,
    ) -> AppResult<Vec<CouponWithPrize>>;
}

/// Aggregates all repositories for convenient access.
///
/// Since `AsyncDbPool` uses `Arc` internally, cloning is cheap.
#[derive(Clone)]
pub struct Repositories {
    pub businesses: BusinessRepository,
    pub prizes: PrizeRepository,
    pub stamps: StampRepository,
    pub coupons: CouponRepository,
    pub analytics: AnalyticsRepository,
}

impl Repositories {
    /// Creates a new Repositories instance with all repositories initialized.
    ///
    /// # Arguments
    /// * `pool` - The async database connection pool
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            businesses: BusinessRepository::new(pool.clone()),
            prizes: PrizeRepository::new(pool.clone()),
            stamps: StampRepository::new(pool.clone()),
            coupons: CouponRepository::new(pool.clone()),
            analytics: AnalyticsRepository::new(pool),
        }
    }
}

#[async_trait]
impl LoyaltyStore for Repositories {
    async fn prize_catalog(&self, business_id: Uuid) -> AppResult<Vec<Prize>> {
        self.prizes.list_by_business(business_id).await
    }

    async fn user_stats(
        &self,
        user_id: &str,
        business_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<UserStats> {
        self.analytics.user_stats(user_id, business_id, now).await
    }

    async fn count_valid_stamps(&self, user_id: &str, business_id: Uuid) -> AppResult<i64> {
        self.stamps.count_for_user(user_id, business_id).await
    }

    async fn count_valid_coupons(
        &self,
        user_id: &str,
        business_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<i64> {
        self.coupons
            .count_valid_for_user(user_id, business_id, now)
            .await
    }
}

#[async_trait]
impl CouponStore for Repositories {
    async fn find_prize(&self, prize_id: Uuid) -> AppResult<Option<Prize>> {
        self.prizes.find_by_id(prize_id).await
    }

    async fn create_coupon(&self, new_coupon: NewCoupon) -> AppResult<Coupon> {
        self.coupons.create(new_coupon).await
    }

    async fn redeem_coupon(
        &self,
        coupon_id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Coupon>> {
        self.coupons.redeem(coupon_id, at).await
    }

    async fn list_coupons(
        &self,
        user_id: &str,
        business_id: Uuid,
    ) -> AppResult<Vec<CouponWithPrize>> {
        self.coupons.list_for_user(user_id, business_id).await
    }
}

//! Aggregate queries backing the analytics endpoints.
//!
//! Simple counts use the query builder; the grouped ones are plain SQL with
//! bound parameters.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Date, Nullable, Text, Timestamptz, Uuid as SqlUuid};
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::AppError;
use crate::repositories::UserStats;
use crate::schema::{coupons, stamps};

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

#[derive(QueryableByName)]
struct VisitRow {
    #[diesel(sql_type = BigInt)]
    stamps: i64,
    #[diesel(sql_type = BigInt)]
    visitors: i64,
}

#[derive(QueryableByName)]
struct DailyRow {
    #[diesel(sql_type = Date)]
    day: NaiveDate,
    #[diesel(sql_type = BigInt)]
    stamps: i64,
    #[diesel(sql_type = BigInt)]
    visitors: i64,
}

#[derive(QueryableByName)]
struct UserStatsRow {
    #[diesel(sql_type = BigInt)]
    valid_stamps: i64,
    #[diesel(sql_type = BigInt)]
    coupons_count: i64,
    #[diesel(sql_type = BigInt)]
    total_coupons: i64,
    #[diesel(sql_type = Nullable<Timestamptz>)]
    last_visit: Option<DateTime<Utc>>,
}

/// Stamps and distinct visitors on one UTC day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyActivity {
    pub day: NaiveDate,
    pub stamps: i64,
    pub visitors: i64,
}

#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: AsyncDbPool,
}

impl AnalyticsRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Per-user aggregates in a single round-trip.
    pub async fn user_stats(
        &self,
        user: &str,
        business: Uuid,
        now: DateTime<Utc>,
    ) -> Result<UserStats, AppError> {
        let mut conn = self.pool.get().await?;

        let row = diesel::sql_query(
            "SELECT \
                (SELECT COUNT(*) FROM stamps s WHERE s.business_id = $1 AND s.user_id = $2) AS valid_stamps, \
                (SELECT MAX(s.created_at) FROM stamps s WHERE s.business_id = $1 AND s.user_id = $2) AS last_visit, \
                (SELECT COUNT(*) FROM coupons c WHERE c.business_id = $1 AND c.user_id = $2 \
                    AND NOT c.is_redeemed AND (c.expired_at IS NULL OR c.expired_at > $3)) AS coupons_count, \
                (SELECT COUNT(*) FROM coupons c WHERE c.business_id = $1 AND c.user_id = $2) AS total_coupons",
        )
        .bind::<SqlUuid, _>(business)
        .bind::<Text, _>(user)
        .bind::<Timestamptz, _>(now)
        .get_result::<UserStatsRow>(&mut conn)
        .await
        .map_err(AppError::from)?;

        Ok(UserStats {
            valid_stamps: row.valid_stamps,
            coupons_count: row.coupons_count,
            total_coupons: row.total_coupons,
            last_visit: row.last_visit,
        })
    }

    /// Stamps issued in `[from, to)`.
    pub async fn count_stamps_in_range(
        &self,
        business: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let mut conn = self.pool.get().await?;

        stamps::table
            .filter(stamps::business_id.eq(business))
            .filter(stamps::created_at.ge(from))
            .filter(stamps::created_at.lt(to))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Coupons redeemed in `[from, to)`.
    pub async fn count_redeemed_coupons_in_range(
        &self,
        business: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let mut conn = self.pool.get().await?;

        coupons::table
            .filter(coupons::business_id.eq(business))
            .filter(coupons::is_redeemed.eq(true))
            .filter(coupons::redeemed_at.ge(from))
            .filter(coupons::redeemed_at.lt(to))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn count_redeemed_coupons_total(&self, business: Uuid) -> Result<i64, AppError> {
        let mut conn = self.pool.get().await?;

        coupons::table
            .filter(coupons::business_id.eq(business))
            .filter(coupons::is_redeemed.eq(true))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Users whose first stamp at the business falls on or after `since`.
    pub async fn count_new_users_since(
        &self,
        business: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let mut conn = self.pool.get().await?;

        diesel::sql_query(
            "SELECT COUNT(*) AS count FROM ( \
                SELECT user_id FROM stamps WHERE business_id = $1 \
                GROUP BY user_id HAVING MIN(created_at) >= $2 \
             ) first_visits",
        )
        .bind::<SqlUuid, _>(business)
        .bind::<Timestamptz, _>(since)
        .get_result::<CountRow>(&mut conn)
        .await
        .map(|row| row.count)
        .map_err(AppError::from)
    }

    /// Stamps and distinct visitors since `since`, for the visit-frequency figure.
    pub async fn visit_totals_since(
        &self,
        business: Uuid,
        since: DateTime<Utc>,
    ) -> Result<(i64, i64), AppError> {
        let mut conn = self.pool.get().await?;

        diesel::sql_query(
            "SELECT COUNT(*) AS stamps, COUNT(DISTINCT user_id) AS visitors \
             FROM stamps WHERE business_id = $1 AND created_at >= $2",
        )
        .bind::<SqlUuid, _>(business)
        .bind::<Timestamptz, _>(since)
        .get_result::<VisitRow>(&mut conn)
        .await
        .map(|row| (row.stamps, row.visitors))
        .map_err(AppError::from)
    }

    /// Users with stamps on at least two distinct UTC days since `since`.
    pub async fn count_returning_users_since(
        &self,
        business: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let mut conn = self.pool.get().await?;

        diesel::sql_query(
            "SELECT COUNT(*) AS count FROM ( \
                SELECT user_id FROM stamps WHERE business_id = $1 AND created_at >= $2 \
                GROUP BY user_id \
                HAVING COUNT(DISTINCT (created_at AT TIME ZONE 'UTC')::date) >= 2 \
             ) returning_users",
        )
        .bind::<SqlUuid, _>(business)
        .bind::<Timestamptz, _>(since)
        .get_result::<CountRow>(&mut conn)
        .await
        .map(|row| row.count)
        .map_err(AppError::from)
    }

    /// Distinct users holding at least one stamp at the business.
    pub async fn count_distinct_customers(&self, business: Uuid) -> Result<i64, AppError> {
        let mut conn = self.pool.get().await?;

        distinct_customers_query(business)
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Per-day activity since `since`; days without stamps are absent.
    pub async fn daily_activity_since(
        &self,
        business: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyActivity>, AppError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::sql_query(
            "SELECT (created_at AT TIME ZONE 'UTC')::date AS day, \
                    COUNT(*) AS stamps, COUNT(DISTINCT user_id) AS visitors \
             FROM stamps WHERE business_id = $1 AND created_at >= $2 \
             GROUP BY day ORDER BY day",
        )
        .bind::<SqlUuid, _>(business)
        .bind::<Timestamptz, _>(since)
        .load::<DailyRow>(&mut conn)
        .await
        .map_err(AppError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| DailyActivity {
                day: row.day,
                stamps: row.stamps,
                visitors: row.visitors,
            })
            .collect())
    }
}

fn distinct_customers_query(business: Uuid) -> stamps::BoxedQuery<'static, Pg, BigInt> {
    stamps::table
        .filter(stamps::business_id.eq(business))
        .select(diesel::dsl::count(stamps::user_id).aggregate_distinct())
        .into_boxed()
}

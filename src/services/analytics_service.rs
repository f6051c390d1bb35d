//! Business dashboard figures and the daily activity series.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{AnalyticsConfig, CustomerCountSource};
use crate::error::AppResult;
use crate::external::{MemberDirectory, UserQuery};
use crate::repositories::{AnalyticsRepository, DailyActivity};

pub const DEFAULT_SERIES_DAYS: i64 = 30;
pub const MAX_SERIES_DAYS: i64 = 90;

/// Dashboard figures for one business
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_users: i64,
    /// Members with stamps on two or more distinct days in the last 30 days
    pub returnacy_rate: i64,
    pub total_coupons_redeemed: i64,
    pub week_total_coupons_redeemed: i64,
    pub week_total_stamps: i64,
    pub week_new_users: i64,
    pub month_total_stamps: i64,
    pub month_total_coupons_redeemed: i64,
    /// Stamps per distinct visitor over the last 30 days
    pub average_user_frequency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailySeries {
    /// Distinct visiting members per day
    pub daily_transactions: Vec<DailyPoint>,
    pub daily_stamps: Vec<DailyPoint>,
}

/// `None` means the default window; anything else is clamped into `[1, 90]`.
pub fn clamp_days(days: Option<i64>) -> i64 {
    days.unwrap_or(DEFAULT_SERIES_DAYS).clamp(1, MAX_SERIES_DAYS)
}

/// Rounded to two decimals; zero when nobody visited.
pub fn average_frequency(stamps: i64, visitors: i64) -> f64 {
    if visitors <= 0 {
        return 0.0;
    }
    (stamps as f64 / visitors as f64 * 100.0).round() / 100.0
}

/// One point per UTC day from `today - (days - 1)` through `today`, zero-filled.
pub fn fill_daily_series(activity: &[DailyActivity], today: NaiveDate, days: i64) -> DailySeries {
    let by_day: HashMap<NaiveDate, &DailyActivity> = activity.iter().map(|a| (a.day, a)).collect();
    let start = today - Duration::days(days - 1);

    let (daily_transactions, daily_stamps) = start
        .iter_days()
        .take(days as usize)
        .map(|date| {
            let (visitors, stamps) = by_day
                .get(&date)
                .map_or((0, 0), |a| (a.visitors, a.stamps));
            (
                DailyPoint {
                    date,
                    count: visitors,
                },
                DailyPoint {
                    date,
                    count: stamps,
                },
            )
        })
        .unzip();

    DailySeries {
        daily_transactions,
        daily_stamps,
    }
}

#[derive(Clone)]
pub struct AnalyticsService {
    repo: AnalyticsRepository,
    directory: Arc<dyn MemberDirectory>,
    config: AnalyticsConfig,
}

impl AnalyticsService {
    pub fn new(
        repo: AnalyticsRepository,
        directory: Arc<dyn MemberDirectory>,
        config: AnalyticsConfig,
    ) -> Self {
        Self {
            repo,
            directory,
            config,
        }
    }

    /// Total customers from whichever source is configured. The two sources
    /// disagree by construction; neither is treated as authoritative.
    async fn total_customers(&self, business_id: Uuid) -> AppResult<i64> {
        match self.config.customer_count_source {
            CustomerCountSource::Remote => {
                let users = self
                    .directory
                    .query_users(&UserQuery {
                        search: None,
                        limit: Some(self.config.remote_customer_limit),
                        business_id: Some(business_id),
                    })
                    .await?;
                Ok(users.len() as i64)
            }
            CustomerCountSource::Local => self.repo.count_distinct_customers(business_id).await,
        }
    }

    pub async fn summary(&self, business_id: Uuid, now: DateTime<Utc>) -> AppResult<AnalyticsSummary> {
        let week_start = now - Duration::days(7);
        let month_start = now - Duration::days(30);

        let (
            total_users,
            week_total_stamps,
            month_total_stamps,
            month_total_coupons_redeemed,
            week_new_users,
            total_coupons_redeemed,
            week_total_coupons_redeemed,
            (month_stamps, month_visitors),
            returnacy_rate,
        ) = tokio::try_join!(
            self.total_customers(business_id),
            self.repo.count_stamps_in_range(business_id, week_start, now),
            self.repo.count_stamps_in_range(business_id, month_start, now),
            self.repo
                .count_redeemed_coupons_in_range(business_id, month_start, now),
            self.repo.count_new_users_since(business_id, week_start),
            self.repo.count_redeemed_coupons_total(business_id),
            self.repo
                .count_redeemed_coupons_in_range(business_id, week_start, now),
            self.repo.visit_totals_since(business_id, month_start),
            self.repo.count_returning_users_since(business_id, month_start),
        )?;

        Ok(AnalyticsSummary {
            total_users,
            returnacy_rate,
            total_coupons_redeemed,
            week_total_coupons_redeemed,
            week_total_stamps,
            week_new_users,
            month_total_stamps,
            month_total_coupons_redeemed,
            average_user_frequency: average_frequency(month_stamps, month_visitors),
        })
    }

    pub async fn daily_series(
        &self,
        business_id: Uuid,
        days: Option<i64>,
        now: DateTime<Utc>,
    ) -> AppResult<DailySeries> {
        let days = clamp_days(days);
        let today = now.date_naive();
        let start = (today - Duration::days(days - 1)).and_time(chrono::NaiveTime::MIN).and_utc();

        let activity = self.repo.daily_activity_since(business_id, start).await?;
        tracing::debug!(business_id = %business_id, days, active_days = activity.len(), "Daily series loaded");
        Ok(fill_daily_series(&activity, today, days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_days_defaults_and_clamps() {
        assert_eq!(clamp_days(None), 30);
        assert_eq!(clamp_days(Some(0)), 1);
        assert_eq!(clamp_days(Some(-5)), 1);
        assert_eq!(clamp_days(Some(7)), 7);
        assert_eq!(clamp_days(Some(365)), 90);
    }

    #[test]
    fn test_average_frequency() {
        assert_eq!(average_frequency(0, 0), 0.0);
        assert_eq!(average_frequency(10, 4), 2.5);
        assert_eq!(average_frequency(10, 3), 3.33);
    }

    #[test]
    fn test_series_is_zero_filled_and_ordered() {
        let activity = vec![
            DailyActivity {
                day: day("2025-03-08"),
                stamps: 5,
                visitors: 3,
            },
            DailyActivity {
                day: day("2025-03-10"),
                stamps: 2,
                visitors: 2,
            },
        ];

        let series = fill_daily_series(&activity, day("2025-03-10"), 4);

        let dates: Vec<NaiveDate> = series.daily_stamps.iter().map(|p| p.date).collect();
        assert_eq!(
            dates,
            vec![day("2025-03-07"), day("2025-03-08"), day("2025-03-09"), day("2025-03-10")]
        );
        let stamps: Vec<i64> = series.daily_stamps.iter().map(|p| p.count).collect();
        assert_eq!(stamps, vec![0, 5, 0, 2]);
        let visitors: Vec<i64> = series.daily_transactions.iter().map(|p| p.count).collect();
        assert_eq!(visitors, vec![0, 3, 0, 2]);
    }

    #[test]
    fn test_series_serializes_camel_case() {
        let series = fill_daily_series(&[], day("2025-01-01"), 1);
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["dailyTransactions"][0]["date"], "2025-01-01");
        assert_eq!(json["dailyStamps"][0]["count"], 0);
    }

    proptest! {
        #[test]
        fn prop_series_covers_exactly_the_window(days in proptest::option::of(-10i64..200)) {
            let today = day("2025-06-30");
            let n = clamp_days(days);
            let series = fill_daily_series(&[], today, n);
            prop_assert!((1..=90).contains(&n));
            prop_assert_eq!(series.daily_stamps.len() as i64, n);
            prop_assert_eq!(series.daily_transactions.len() as i64, n);
            prop_assert_eq!(series.daily_stamps.last().map(|p| p.date), Some(today));
        }
    }
}

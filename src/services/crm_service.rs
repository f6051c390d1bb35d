//! CRM member listing.
//!
//! Base users come from the user-service; each one is enriched with the
//! stamp and coupon aggregates owned locally, placed on the prize ladder,
//! then filtered, sorted and paginated in memory.
//!
//! Filters and pagination only see the `limit` users fetched remotely, so a
//! page can come back short even when more matching members exist.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use futures::future::try_join_all;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppResult;
use crate::external::{BasicUser, MemberDirectory, UserQuery};
use crate::repositories::{LoyaltyStore, UserStats};
use crate::services::progression::{PrizeLadder, Progression};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    Name,
    Stamp,
    Coupon,
    LastVisit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberFilter {
    /// Only members holding at least one valid coupon
    pub has_coupon: Option<bool>,
    /// Only members whose last visit is within this many days
    pub has_visited: Option<i64>,
    /// Only members with at least this many stamps (0 disables)
    pub min_stamp: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct MemberQuery {
    pub business_id: Uuid,
    /// 1-based
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub filter: MemberFilter,
}

/// One CRM row: identity, local aggregates and prize progression
#[derive(Debug, Clone, PartialEq)]
pub struct MemberRow {
    pub user: BasicUser,
    pub stats: UserStats,
    pub progression: Progression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberPage {
    pub rows: Vec<MemberRow>,
    /// Size of the filtered set before pagination
    pub total: usize,
}

#[derive(Clone)]
pub struct CrmService {
    store: Arc<dyn LoyaltyStore>,
    directory: Arc<dyn MemberDirectory>,
}

impl CrmService {
    pub fn new(store: Arc<dyn LoyaltyStore>, directory: Arc<dyn MemberDirectory>) -> Self {
        Self { store, directory }
    }

    pub async fn list_members(&self, query: &MemberQuery, now: DateTime<Utc>) -> AppResult<MemberPage> {
        let users = self
            .directory
            .query_users(&UserQuery {
                search: query.search.clone(),
                limit: Some(query.limit),
                business_id: Some(query.business_id),
            })
            .await?;

        let catalog = self.store.prize_catalog(query.business_id).await?;
        let ladder = PrizeLadder::from_catalog(&catalog);

        // one stats query per member
        let rows = try_join_all(users.into_iter().map(|user| {
            let ladder = &ladder;
            async move {
                let stats = self
                    .store
                    .user_stats(&user.id, query.business_id, now)
                    .await?;
                let progression = ladder.progress(stats.valid_stamps);
                AppResult::Ok(MemberRow {
                    user,
                    stats,
                    progression,
                })
            }
        }))
        .await?;

        let fetched = rows.len();
        let mut rows = apply_filter(rows, &query.filter, now);
        sort_rows(&mut rows, query.sort_by, query.sort_order);
        let total = rows.len();
        let rows = paginate(rows, query.page, query.limit);

        tracing::debug!(
            business_id = %query.business_id,
            fetched,
            matched = total,
            returned = rows.len(),
            "CRM members listed"
        );

        Ok(MemberPage { rows, total })
    }
}

fn apply_filter(rows: Vec<MemberRow>, filter: &MemberFilter, now: DateTime<Utc>) -> Vec<MemberRow> {
    let min_stamp = filter.min_stamp.filter(|n| *n > 0);
    let visited_since = filter
        .has_visited
        .filter(|days| *days > 0)
        // windows reaching past the representable range start at the earliest instant
        .map(|days| {
            TimeDelta::try_days(days)
                .and_then(|d| now.checked_sub_signed(d))
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        });
    let needs_coupon = filter.has_coupon == Some(true);

    rows.into_iter()
        .filter(|row| min_stamp.is_none_or(|n| row.stats.valid_stamps >= n))
        .filter(|row| !needs_coupon || row.stats.coupons_count > 0)
        .filter(|row| {
            visited_since.is_none_or(|cutoff| row.stats.last_visit.is_some_and(|t| t >= cutoff))
        })
        .collect()
}

fn name_key(user: &BasicUser) -> String {
    format!(
        "{} {}",
        user.name.as_deref().unwrap_or(""),
        user.surname.as_deref().unwrap_or("")
    )
    .trim()
    .to_lowercase()
}

fn compare(a: &MemberRow, b: &MemberRow, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::Name => name_key(&a.user).cmp(&name_key(&b.user)),
        SortBy::Stamp => a.stats.valid_stamps.cmp(&b.stats.valid_stamps),
        SortBy::Coupon => a.stats.coupons_count.cmp(&b.stats.coupons_count),
        SortBy::LastVisit => {
            let ts = |row: &MemberRow| row.stats.last_visit.map_or(0, |t| t.timestamp_millis());
            ts(a).cmp(&ts(b))
        }
    }
}

/// Stable: rows with equal keys keep their input order in both directions.
fn sort_rows(rows: &mut [MemberRow], sort_by: SortBy, order: SortOrder) {
    rows.sort_by(|a, b| match order {
        SortOrder::Asc => compare(a, b, sort_by),
        SortOrder::Desc => compare(b, a, sort_by),
    });
}

fn paginate(rows: Vec<MemberRow>, page: u32, limit: u32) -> Vec<MemberRow> {
    let offset = (page.max(1) as usize - 1).saturating_mul(limit as usize);
    rows.into_iter().skip(offset).take(limit as usize).collect()
}

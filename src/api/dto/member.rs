//! CRM member listing DTOs.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::services::{MemberFilter, MemberQuery, MemberRow, SortBy, SortOrder};

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MemberFilterRequest {
    /// Only members holding a valid coupon
    pub has_coupon: Option<bool>,
    /// Last visit within this many days
    #[validate(range(min = 1, max = 36500, message = "hasVisited must be between 1 and 36500 days"))]
    #[schema(minimum = 1, maximum = 36500, example = 30)]
    pub has_visited: Option<i64>,
    #[validate(range(min = 0, message = "minStamp must not be negative"))]
    #[schema(minimum = 0)]
    pub min_stamp: Option<i64>,
}

impl From<MemberFilterRequest> for MemberFilter {
    fn from(filter: MemberFilterRequest) -> Self {
        Self {
            has_coupon: filter.has_coupon,
            has_visited: filter.has_visited,
            min_stamp: filter.min_stamp,
        }
    }
}

/// Body of `POST /api/v1/users`
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MemberListRequest {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page must be at least 1"))]
    #[schema(minimum = 1, example = 1)]
    pub page: u32,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 200, message = "limit must be between 1 and 200"))]
    #[schema(minimum = 1, maximum = 200, example = 20)]
    pub limit: u32,

    #[validate(length(max = 200, message = "search must be at most 200 characters"))]
    pub search: Option<String>,

    #[serde(default)]
    pub sort_by: SortBy,

    #[serde(default)]
    pub sort_order: SortOrder,

    #[serde(default)]
    #[validate(nested)]
    pub filter: MemberFilterRequest,

    /// Falls back to the `businessId` query parameter
    pub business_id: Option<Uuid>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

impl MemberListRequest {
    pub fn into_member_query(self, business_id: Uuid) -> MemberQuery {
        MemberQuery {
            business_id,
            page: self.page,
            limit: self.limit,
            search: self.search.filter(|s| !s.trim().is_empty()),
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            filter: self.filter.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase", parameter_in = Query)]
pub struct BusinessScopeQuery {
    pub business_id: Option<Uuid>,
}

/// One CRM row
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub birthday: Option<String>,
    pub valid_stamps: i64,
    pub coupons_count: i64,
    pub total_coupons: i64,
    /// RFC 3339, null when the member never collected a stamp
    pub last_visit: Option<String>,
    pub stamps_last_prize: i64,
    pub stamps_next_prize: i64,
    pub next_prize_name: Option<String>,
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl From<MemberRow> for MemberResponse {
    fn from(row: MemberRow) -> Self {
        let MemberRow {
            user,
            stats,
            progression,
        } = row;
        Self {
            id: user.id,
            email: user.email,
            phone: user.phone,
            name: user.name,
            surname: user.surname,
            birthday: user.birthday,
            valid_stamps: stats.valid_stamps,
            coupons_count: stats.coupons_count,
            total_coupons: stats.total_coupons,
            last_visit: stats.last_visit.map(rfc3339),
            stamps_last_prize: progression.stamps_last_prize,
            stamps_next_prize: progression.stamps_next_prize,
            next_prize_name: progression.next_prize_name,
        }
    }
}

//! Coupon DTOs.
//!
//! Coupon endpoints answer `{coupon}` / `{coupons}` rather than the
//! `{message, data}` envelope, which is what the dashboard reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::Coupon;
use crate::repositories::CouponWithPrize;
use crate::services::IssueCoupon;

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponRequest {
    #[validate(length(min = 1, max = 255, message = "userId is required"))]
    pub user_id: String,
    pub business_id: Uuid,
    pub prize_id: Uuid,
    #[validate(length(min = 1, max = 64, message = "code must be between 1 and 64 characters"))]
    #[schema(example = "FREECOFFEE-7Q2")]
    pub code: String,
}

impl CreateCouponRequest {
    pub fn into_issue_coupon(self) -> IssueCoupon {
        IssueCoupon {
            user_id: self.user_id,
            business_id: self.business_id,
            prize_id: self.prize_id,
            code: self.code,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrizeSummary {
    pub name: String,
    pub points_required: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CouponResponse {
    pub id: Uuid,
    pub business_id: Uuid,
    pub user_id: String,
    pub prize_id: Option<Uuid>,
    pub code: String,
    pub is_redeemed: bool,
    /// Unredeemed and not past `expiredAt` at response time
    pub is_valid: bool,
    pub created_at: DateTime<Utc>,
    pub expired_at: Option<DateTime<Utc>>,
    pub redeemed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize: Option<PrizeSummary>,
}

impl CouponResponse {
    pub fn new(coupon: Coupon, prize: Option<PrizeSummary>, now: DateTime<Utc>) -> Self {
        Self {
            is_valid: coupon.is_valid_at(now),
            id: coupon.id,
            business_id: coupon.business_id,
            user_id: coupon.user_id,
            prize_id: coupon.prize_id,
            code: coupon.code,
            is_redeemed: coupon.is_redeemed,
            created_at: coupon.created_at,
            expired_at: coupon.expired_at,
            redeemed_at: coupon.redeemed_at,
            prize,
        }
    }

    pub fn from_listing((coupon, prize): CouponWithPrize, now: DateTime<Utc>) -> Self {
        let prize = prize.map(|(name, points_required)| PrizeSummary {
            name,
            points_required,
        });
        Self::new(coupon, prize, now)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponEnvelope {
    pub coupon: CouponResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponListEnvelope {
    pub coupons: Vec<CouponResponse>,
}

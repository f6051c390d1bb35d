use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// A redeemable reward issued to a user
#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::schema::coupons)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Coupon {
    pub id: Uuid,
    pub business_id: Uuid,
    pub user_id: String,
    pub prize_id: Option<Uuid>,
    pub code: String,
    pub is_redeemed: bool,
    pub created_at: DateTime<Utc>,
    pub expired_at: Option<DateTime<Utc>>,
    pub redeemed_at: Option<DateTime<Utc>>,
}

impl Coupon {
    /// Expiry and redemption are independent: a coupon is valid only while
    /// it is unredeemed and not past its expiry.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_redeemed && self.expired_at.is_none_or(|expiry| expiry > now)
    }
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::coupons)]
pub struct NewCoupon {
    pub business_id: Uuid,
    pub user_id: String,
    pub prize_id: Option<Uuid>,
    pub code: String,
    pub expired_at: Option<DateTime<Utc>>,
}

//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain. Field names on the wire are camelCase;
//! `envelope` holds the `{message, data}` wrappers shared by most endpoints.

mod analytics;
mod business;
mod coupon;
mod envelope;
mod error;
mod health;
mod member;
mod prize;
mod stamp;
mod wallet;

pub use analytics::DailySeriesQuery;
pub use business::{BusinessResponse, CreateBusinessRequest, UpdateBusinessRequest};
pub use coupon::{
    CouponEnvelope, CouponListEnvelope, CouponResponse, CreateCouponRequest, PrizeSummary,
};
pub use envelope::{ApiResponse, PageMeta, PagedResponse, PaginationParams};
pub use error::ErrorResponse;
pub use health::{HealthResponse, ReadinessResponse};
pub use member::{BusinessScopeQuery, MemberFilterRequest, MemberListRequest, MemberResponse};
pub use prize::{CreatePrizeRequest, PrizeListQuery, PrizeResponse, UpdatePrizeRequest};
pub use stamp::{IssueStampRequest, MemberActivityQuery, StampResponse};
pub use wallet::{LinkWalletPassRequest, WalletPassResponse};

//! Service layer for business logic operations.
//!
//! Services encapsulate business rules and coordinate between the
//! repositories and the user-service client.

mod analytics_service;
mod business_service;
mod coupon_service;
pub mod counter_sync;
mod crm_service;
mod prize_service;
pub mod progression;
mod stamp_service;
mod wallet_service;

pub use analytics_service::{
    AnalyticsService, AnalyticsSummary, DailyPoint, DailySeries, clamp_days,
};
pub use business_service::BusinessService;
pub use counter_sync::{CounterSyncHandle, CounterSyncJob, CounterSyncWorker, counter_sync_channel};
pub use coupon_service::{CouponService, IssueCoupon};
pub use crm_service::{
    CrmService, MemberFilter, MemberPage, MemberQuery, MemberRow, SortBy, SortOrder,
};
pub use prize_service::PrizeService;
pub use progression::{PrizeLadder, Progression};
pub use stamp_service::StampService;
pub use wallet_service::WalletPassService;

use std::sync::Arc;

use crate::config::Settings;
use crate::external::MemberDirectory;
use crate::repositories::Repositories;

/// Aggregates all services for convenient access.
///
/// This struct is designed to be used as Axum application state.
/// Cloning is cheap since pools and clients are shared through `Arc`.
#[derive(Clone)]
pub struct Services {
    pub businesses: BusinessService,
    pub prizes: PrizeService,
    pub stamps: StampService,
    pub coupons: CouponService,
    pub crm: CrmService,
    pub analytics: AnalyticsService,
    pub wallet_passes: WalletPassService,
}

impl Services {
    pub fn new(
        repos: Repositories,
        directory: Arc<dyn MemberDirectory>,
        counter_sync: CounterSyncHandle,
        settings: &Settings,
    ) -> Self {
        Self {
            businesses: BusinessService::new(repos.businesses.clone()),
            prizes: PrizeService::new(repos.prizes.clone()),
            stamps: StampService::new(repos.stamps.clone(), counter_sync.clone()),
            coupons: CouponService::new(
                Arc::new(repos.clone()),
                counter_sync,
                settings.loyalty.coupon_validity_days,
            ),
            analytics: AnalyticsService::new(
                repos.analytics.clone(),
                directory.clone(),
                settings.analytics.clone(),
            ),
            wallet_passes: WalletPassService::new(directory.clone()),
            crm: CrmService::new(Arc::new(repos), directory),
        }
    }
}

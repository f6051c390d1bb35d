use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Coupon, NewCoupon};
use crate::repositories::{CouponStore, CouponWithPrize};
use crate::services::counter_sync::{CounterSyncHandle, CounterSyncJob};

/// Input for issuing a coupon
#[derive(Debug, Clone)]
pub struct IssueCoupon {
    pub user_id: String,
    pub business_id: Uuid,
    pub prize_id: Uuid,
    pub code: String,
}

/// Coupon issuance and redemption
#[derive(Clone)]
pub struct CouponService {
    store: Arc<dyn CouponStore>,
    counter_sync: CounterSyncHandle,
    validity_days: i64,
}

impl CouponService {
    pub fn new(
        store: Arc<dyn CouponStore>,
        counter_sync: CounterSyncHandle,
        validity_days: i64,
    ) -> Self {
        Self {
            store,
            counter_sync,
            validity_days,
        }
    }

    fn expiry_from(&self, now: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
        TimeDelta::try_days(self.validity_days)
            .and_then(|validity| now.checked_add_signed(validity))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "coupon validity of {} days is out of range",
                    self.validity_days
                )
                .into()
            })
    }

    /// Issues a coupon for a prize of the same business, expiring after the
    /// configured validity period.
    pub async fn issue_coupon(&self, request: IssueCoupon) -> AppResult<Coupon> {
        let prize = self
            .store
            .find_prize(request.prize_id)
            .await?
            .ok_or_else(|| AppError::Validation {
                field: "prizeId".to_string(),
                reason: format!("Prize '{}' does not exist", request.prize_id),
            })?;

        if prize.business_id != request.business_id {
            return Err(AppError::Validation {
                field: "prizeId".to_string(),
                reason: "Prize belongs to a different business".to_string(),
            });
        }

        let coupon = self
            .store
            .create_coupon(NewCoupon {
                business_id: request.business_id,
                user_id: request.user_id.clone(),
                prize_id: Some(prize.id),
                code: request.code,
                expired_at: Some(self.expiry_from(Utc::now())?),
            })
            .await?;

        tracing::info!(
            business_id = %coupon.business_id,
            user_id = %coupon.user_id,
            coupon_id = %coupon.id,
            "Coupon issued"
        );
        self.counter_sync.enqueue(CounterSyncJob::CouponCreated {
            user_id: request.user_id,
            business_id: request.business_id,
        });
        Ok(coupon)
    }

    /// Marks a coupon redeemed. Redeeming twice is accepted and moves
    /// `redeemed_at` forward; expiry is not checked here.
    pub async fn redeem_coupon(&self, id: Uuid) -> AppResult<Coupon> {
        let coupon = self
            .store
            .redeem_coupon(id, Utc::now())
            .await?
            .ok_or_else(|| AppError::not_found("coupon", "id", id))?;

        tracing::info!(
            business_id = %coupon.business_id,
            user_id = %coupon.user_id,
            coupon_id = %coupon.id,
            "Coupon redeemed"
        );
        self.counter_sync.enqueue(CounterSyncJob::CouponRedeemed {
            user_id: coupon.user_id.clone(),
            business_id: coupon.business_id,
        });
        Ok(coupon)
    }

    pub async fn list_coupons(
        &self,
        user_id: &str,
        business_id: Uuid,
    ) -> AppResult<Vec<CouponWithPrize>> {
        self.store.list_coupons(user_id, business_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Prize;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// Keeps coupons in memory; knows one prize per business
    struct MemoryCouponStore {
        prizes: Vec<Prize>,
        coupons: Mutex<Vec<Coupon>>,
    }

    #[async_trait]
    impl CouponStore for MemoryCouponStore {
        async fn find_prize(&self, prize_id: Uuid) -> AppResult<Option<Prize>> {
            Ok(self.prizes.iter().find(|p| p.id == prize_id).cloned())
        }

        async fn create_coupon(&self, new_coupon: NewCoupon) -> AppResult<Coupon> {
            let coupon = Coupon {
                id: Uuid::new_v4(),
                business_id: new_coupon.business_id,
                user_id: new_coupon.user_id,
                prize_id: new_coupon.prize_id,
                code: new_coupon.code,
                is_redeemed: false,
                created_at: Utc::now(),
                expired_at: new_coupon.expired_at,
                redeemed_at: None,
            };
            self.coupons.lock().unwrap().push(coupon.clone());
            Ok(coupon)
        }

        async fn redeem_coupon(
            &self,
            coupon_id: Uuid,
            at: DateTime<Utc>,
        ) -> AppResult<Option<Coupon>> {
            let mut coupons = self.coupons.lock().unwrap();
            Ok(coupons.iter_mut().find(|c| c.id == coupon_id).map(|c| {
                c.is_redeemed = true;
                c.redeemed_at = Some(at);
                c.clone()
            }))
        }

        async fn list_coupons(
            &self,
            user_id: &str,
            business_id: Uuid,
        ) -> AppResult<Vec<CouponWithPrize>> {
            Ok(self
                .coupons
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.user_id == user_id && c.business_id == business_id)
                .map(|c| (c.clone(), None))
                .collect())
        }
    }

    fn prize(business_id: Uuid) -> Prize {
        Prize {
            id: Uuid::new_v4(),
            business_id,
            name: "Free coffee".to_string(),
            points_required: 10,
            created_at: Utc::now(),
        }
    }

    fn service(prizes: Vec<Prize>) -> (CouponService, mpsc::Receiver<CounterSyncJob>) {
        let store = Arc::new(MemoryCouponStore {
            prizes,
            coupons: Mutex::new(Vec::new()),
        });
        let (handle, jobs) = CounterSyncHandle::capturing(8);
        (CouponService::new(store, handle, 30), jobs)
    }

    fn request(business_id: Uuid, prize_id: Uuid) -> IssueCoupon {
        IssueCoupon {
            user_id: "42".to_string(),
            business_id,
            prize_id,
            code: "FREECOFFEE".to_string(),
        }
    }

    #[tokio::test]
    async fn test_issued_coupon_expires_after_validity_period() {
        let business = Uuid::new_v4();
        let prize = prize(business);
        let (service, mut jobs) = service(vec![prize.clone()]);

        let before = Utc::now();
        let coupon = service
            .issue_coupon(request(business, prize.id))
            .await
            .unwrap();
        let after = Utc::now();

        let expiry = coupon.expired_at.unwrap();
        assert!(expiry >= before + TimeDelta::days(30));
        assert!(expiry <= after + TimeDelta::days(30));
        assert_eq!(coupon.prize_id, Some(prize.id));
        assert!(!coupon.is_redeemed);
        assert_eq!(
            jobs.try_recv().unwrap(),
            CounterSyncJob::CouponCreated {
                user_id: "42".to_string(),
                business_id: business,
            }
        );
    }

    #[tokio::test]
    async fn test_prize_of_another_business_is_a_bad_request() {
        let prize = prize(Uuid::new_v4());
        let (service, mut jobs) = service(vec![prize.clone()]);

        let err = service
            .issue_coupon(request(Uuid::new_v4(), prize.id))
            .await
            .unwrap_err();
        match &err {
            AppError::Validation { field, reason } => {
                assert_eq!(field, "prizeId");
                assert!(reason.contains("different business"));
            }
            other => panic!("expected Validation, got {:?}", other),
        }
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        assert!(jobs.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unknown_prize_is_a_bad_request() {
        let (service, _jobs) = service(Vec::new());
        let err = service
            .issue_coupon(request(Uuid::new_v4(), Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_redeeming_unknown_coupon_is_not_found() {
        let (service, mut jobs) = service(Vec::new());
        let err = service.redeem_coupon(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
        assert!(jobs.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_redeem_marks_coupon_and_queues_counter_push() {
        let business = Uuid::new_v4();
        let prize = prize(business);
        let (service, mut jobs) = service(vec![prize.clone()]);
        let coupon = service
            .issue_coupon(request(business, prize.id))
            .await
            .unwrap();
        jobs.try_recv().unwrap();

        let redeemed = service.redeem_coupon(coupon.id).await.unwrap();
        assert!(redeemed.is_redeemed);
        assert!(redeemed.redeemed_at.is_some());
        assert_eq!(
            jobs.try_recv().unwrap(),
            CounterSyncJob::CouponRedeemed {
                user_id: "42".to_string(),
                business_id: business,
            }
        );

        let listed = service.list_coupons("42", business).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].0.is_redeemed);
    }

    #[tokio::test]
    async fn test_out_of_range_validity_is_an_error_not_a_panic() {
        let business = Uuid::new_v4();
        let prize = prize(business);
        let (handle, _jobs) = CounterSyncHandle::capturing(1);
        let store = Arc::new(MemoryCouponStore {
            prizes: vec![prize.clone()],
            coupons: Mutex::new(Vec::new()),
        });
        let service = CouponService::new(store, handle, i64::MAX);

        let err = service
            .issue_coupon(request(business, prize.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal { .. }));
    }
}

//! Background push of membership counters to the user-service.
//!
//! Handlers enqueue a [`CounterSyncJob`] and return. The worker recomputes
//! the counters from the local store when it picks the job up, then pushes
//! them with exponential backoff. A push that still fails after the last
//! retry is logged and dropped.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::CounterSyncConfig;
use crate::error::AppResult;
use crate::external::{MemberDirectory, MembershipCounters};
use crate::repositories::LoyaltyStore;

/// A local change whose effect on the membership counters must be pushed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterSyncJob {
    StampIssued { user_id: String, business_id: Uuid },
    CouponCreated { user_id: String, business_id: Uuid },
    CouponRedeemed { user_id: String, business_id: Uuid },
}

impl CounterSyncJob {
    pub fn user_id(&self) -> &str {
        match self {
            CounterSyncJob::StampIssued { user_id, .. }
            | CounterSyncJob::CouponCreated { user_id, .. }
            | CounterSyncJob::CouponRedeemed { user_id, .. } => user_id,
        }
    }

    pub fn business_id(&self) -> Uuid {
        match self {
            CounterSyncJob::StampIssued { business_id, .. }
            | CounterSyncJob::CouponCreated { business_id, .. }
            | CounterSyncJob::CouponRedeemed { business_id, .. } => *business_id,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            CounterSyncJob::StampIssued { .. } => "stamp_issued",
            CounterSyncJob::CouponCreated { .. } => "coupon_created",
            CounterSyncJob::CouponRedeemed { .. } => "coupon_redeemed",
        }
    }
}

/// Sending side of the queue, cloned into every service that changes counters
#[derive(Clone)]
pub struct CounterSyncHandle {
    sender: Option<mpsc::Sender<CounterSyncJob>>,
}

impl CounterSyncHandle {
    /// A handle that discards every job
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// A handle whose jobs land in the returned receiver
    #[cfg(test)]
    pub(crate) fn capturing(capacity: usize) -> (Self, mpsc::Receiver<CounterSyncJob>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// Queues a job without waiting. A full or closed queue drops it.
    pub fn enqueue(&self, job: CounterSyncJob) {
        let Some(sender) = &self.sender else {
            return;
        };

        match sender.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => tracing::warn!(
                kind = job.kind(),
                user_id = %job.user_id(),
                business_id = %job.business_id(),
                "Counter sync queue is full, dropping job"
            ),
            Err(TrySendError::Closed(job)) => tracing::warn!(
                kind = job.kind(),
                user_id = %job.user_id(),
                "Counter sync worker has stopped, dropping job"
            ),
        }
    }
}

/// Retry schedule: the n-th retry waits `base_delay * backoff^n`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub backoff: f64,
}

impl RetryPolicy {
    /// Saturates instead of overflowing.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff.powi(attempt.min(i32::MAX as u32) as i32);
        Duration::try_from_secs_f64(self.base_delay.as_secs_f64() * factor)
            .unwrap_or(Duration::MAX)
    }
}

impl From<&CounterSyncConfig> for RetryPolicy {
    fn from(config: &CounterSyncConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_delay_ms),
            backoff: config.retry_backoff,
        }
    }
}

pub struct CounterSyncWorker {
    receiver: mpsc::Receiver<CounterSyncJob>,
    store: Arc<dyn LoyaltyStore>,
    directory: Arc<dyn MemberDirectory>,
    policy: RetryPolicy,
}

/// Builds the queue. A disabled configuration yields a no-op handle and no worker.
pub fn counter_sync_channel(
    config: &CounterSyncConfig,
    store: Arc<dyn LoyaltyStore>,
    directory: Arc<dyn MemberDirectory>,
) -> (CounterSyncHandle, Option<CounterSyncWorker>) {
    if !config.enabled {
        return (CounterSyncHandle::disabled(), None);
    }

    let (sender, receiver) = mpsc::channel(config.queue_capacity);
    let worker = CounterSyncWorker {
        receiver,
        store,
        directory,
        policy: RetryPolicy::from(config),
    };
    (
        CounterSyncHandle {
            sender: Some(sender),
        },
        Some(worker),
    )
}

impl CounterSyncWorker {
    /// Processes jobs one at a time until shutdown or until every handle is dropped.
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!("Counter sync worker started");

        loop {
            let job = tokio::select! {
                _ = shutdown.cancelled() => break,
                job = self.receiver.recv() => job,
            };
            match job {
                Some(job) => self.process(job, &shutdown).await,
                None => break,
            }
        }

        self.receiver.close();
        let mut dropped = 0usize;
        while self.receiver.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            tracing::warn!(dropped, "Counter sync jobs discarded at shutdown");
        }
        tracing::info!("Counter sync worker stopped");
    }

    async fn counters_for(&self, job: &CounterSyncJob) -> AppResult<MembershipCounters> {
        let user_id = job.user_id();
        let business_id = job.business_id();
        let mut counters = MembershipCounters {
            business_id,
            ..Default::default()
        };

        match job {
            CounterSyncJob::StampIssued { .. } => {
                counters.valid_stamps = Some(self.store.count_valid_stamps(user_id, business_id).await?);
                counters.total_stamps_delta = Some(1);
            }
            CounterSyncJob::CouponCreated { .. } => {
                counters.valid_coupons = Some(
                    self.store
                        .count_valid_coupons(user_id, business_id, Utc::now())
                        .await?,
                );
                counters.total_coupons_delta = Some(1);
            }
            CounterSyncJob::CouponRedeemed { .. } => {
                counters.valid_coupons = Some(
                    self.store
                        .count_valid_coupons(user_id, business_id, Utc::now())
                        .await?,
                );
            }
        }

        Ok(counters)
    }

    async fn process(&self, job: CounterSyncJob, shutdown: &CancellationToken) {
        let counters = match self.counters_for(&job).await {
            Ok(counters) => counters,
            Err(e) => {
                tracing::warn!(
                    kind = job.kind(),
                    user_id = %job.user_id(),
                    error = %e,
                    "Could not compute membership counters, dropping job"
                );
                return;
            }
        };

        for attempt in 0..=self.policy.max_retries {
            match self
                .directory
                .update_membership_counters(job.user_id(), &counters)
                .await
            {
                Ok(()) => {
                    tracing::debug!(
                        kind = job.kind(),
                        user_id = %job.user_id(),
                        business_id = %job.business_id(),
                        attempt,
                        "Membership counters pushed"
                    );
                    return;
                }
                Err(e) if attempt < self.policy.max_retries => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::debug!(
                        kind = job.kind(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Membership counter push failed, retrying"
                    );
                    tokio::select! {
                        _ = shutdown.cancelled() => return,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        kind = job.kind(),
                        user_id = %job.user_id(),
                        business_id = %job.business_id(),
                        attempts = attempt + 1,
                        error = %e,
                        "Giving up on membership counter push"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::external::{BasicUser, UserQuery, WalletPassStatus};
    use crate::models::Prize;
    use crate::repositories::UserStats;
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FixedStore;

    #[async_trait]
    impl LoyaltyStore for FixedStore {
        async fn prize_catalog(&self, _: Uuid) -> AppResult<Vec<Prize>> {
            Ok(Vec::new())
        }

        async fn user_stats(&self, _: &str, _: Uuid, _: DateTime<Utc>) -> AppResult<UserStats> {
            Ok(UserStats::default())
        }

        async fn count_valid_stamps(&self, _: &str, _: Uuid) -> AppResult<i64> {
            Ok(16)
        }

        async fn count_valid_coupons(&self, _: &str, _: Uuid, _: DateTime<Utc>) -> AppResult<i64> {
            Ok(2)
        }
    }

    /// Fails the first `failures` pushes, records the rest
    struct FlakyDirectory {
        failures: u32,
        attempts: AtomicU32,
        pushed: Mutex<Vec<(String, MembershipCounters)>>,
    }

    impl FlakyDirectory {
        fn new(failures: u32) -> Arc<Self> {
            Arc::new(Self {
                failures,
                attempts: AtomicU32::new(0),
                pushed: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl MemberDirectory for FlakyDirectory {
        async fn query_users(&self, _: &UserQuery) -> AppResult<Vec<BasicUser>> {
            Ok(Vec::new())
        }

        async fn update_membership_counters(
            &self,
            user_id: &str,
            counters: &MembershipCounters,
        ) -> AppResult<()> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                return Err(AppError::user_service("unavailable", None));
            }
            self.pushed
                .lock()
                .unwrap()
                .push((user_id.to_string(), counters.clone()));
            Ok(())
        }

        async fn get_wallet_pass(&self, _: &str, _: Uuid) -> AppResult<WalletPassStatus> {
            Ok(WalletPassStatus::unlinked())
        }

        async fn upsert_wallet_pass(
            &self,
            _: &str,
            _: Uuid,
            _: Option<String>,
        ) -> AppResult<WalletPassStatus> {
            Ok(WalletPassStatus::unlinked())
        }
    }

    fn fast_config() -> CounterSyncConfig {
        CounterSyncConfig {
            retry_delay_ms: 1,
            ..Default::default()
        }
    }

    async fn run_jobs(directory: Arc<FlakyDirectory>, jobs: Vec<CounterSyncJob>) {
        let (handle, worker) =
            counter_sync_channel(&fast_config(), Arc::new(FixedStore), directory);
        let worker = worker.unwrap();
        for job in jobs {
            handle.enqueue(job);
        }
        drop(handle);
        // every sender is gone, so the worker exits after draining the queue
        worker.run(CancellationToken::new()).await;
    }

    #[test]
    fn test_retry_delay_grows_exponentially() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            backoff: 2.0,
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
    }

    #[test]
    fn test_retry_delay_saturates() {
        let policy = RetryPolicy {
            max_retries: u32::MAX,
            base_delay: Duration::from_millis(u64::MAX),
            backoff: 10.0,
        };
        assert_eq!(policy.delay_for(u32::MAX), Duration::MAX);
    }

    #[tokio::test]
    async fn test_jobs_push_recomputed_counters() {
        let business_id = Uuid::new_v4();
        let directory = FlakyDirectory::new(0);
        run_jobs(
            directory.clone(),
            vec![
                CounterSyncJob::StampIssued {
                    user_id: "u-1".to_string(),
                    business_id,
                },
                CounterSyncJob::CouponRedeemed {
                    user_id: "u-2".to_string(),
                    business_id,
                },
            ],
        )
        .await;

        let pushed = directory.pushed.lock().unwrap();
        assert_eq!(pushed.len(), 2);
        assert_eq!(pushed[0].0, "u-1");
        assert_eq!(pushed[0].1.valid_stamps, Some(16));
        assert_eq!(pushed[0].1.total_stamps_delta, Some(1));
        assert_eq!(pushed[0].1.valid_coupons, None);
        assert_eq!(pushed[1].0, "u-2");
        assert_eq!(pushed[1].1.valid_coupons, Some(2));
        assert_eq!(pushed[1].1.total_coupons_delta, None);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let directory = FlakyDirectory::new(2);
        run_jobs(
            directory.clone(),
            vec![CounterSyncJob::CouponCreated {
                user_id: "u-1".to_string(),
                business_id: Uuid::new_v4(),
            }],
        )
        .await;

        assert_eq!(directory.attempts.load(Ordering::SeqCst), 3);
        let pushed = directory.pushed.lock().unwrap();
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0].1.total_coupons_delta, Some(1));
    }

    #[tokio::test]
    async fn test_job_is_dropped_after_last_retry() {
        let directory = FlakyDirectory::new(u32::MAX);
        run_jobs(
            directory.clone(),
            vec![CounterSyncJob::StampIssued {
                user_id: "u-1".to_string(),
                business_id: Uuid::new_v4(),
            }],
        )
        .await;

        // first attempt plus max_retries (3)
        assert_eq!(directory.attempts.load(Ordering::SeqCst), 4);
        assert!(directory.pushed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let config = CounterSyncConfig {
            queue_capacity: 1,
            ..fast_config()
        };
        let directory = FlakyDirectory::new(0);
        let (handle, worker) = counter_sync_channel(&config, Arc::new(FixedStore), directory.clone());

        for user in ["a", "b", "c"] {
            handle.enqueue(CounterSyncJob::StampIssued {
                user_id: user.to_string(),
                business_id: Uuid::new_v4(),
            });
        }
        drop(handle);
        worker.unwrap().run(CancellationToken::new()).await;

        let pushed = directory.pushed.lock().unwrap();
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0].0, "a");
    }

    #[tokio::test]
    async fn test_disabled_sync_has_no_worker() {
        let config = CounterSyncConfig {
            enabled: false,
            ..Default::default()
        };
        let (handle, worker) =
            counter_sync_channel(&config, Arc::new(FixedStore), FlakyDirectory::new(0));
        assert!(worker.is_none());
        handle.enqueue(CounterSyncJob::StampIssued {
            user_id: "u-1".to_string(),
            business_id: Uuid::new_v4(),
        });
    }
}

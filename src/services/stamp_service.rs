use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{NewStamp, Stamp};
use crate::repositories::StampRepository;
use crate::services::counter_sync::{CounterSyncHandle, CounterSyncJob};

/// Issues loyalty stamps and keeps the user-service counters in step.
#[derive(Clone)]
pub struct StampService {
    repo: StampRepository,
    counter_sync: CounterSyncHandle,
}

impl StampService {
    pub fn new(repo: StampRepository, counter_sync: CounterSyncHandle) -> Self {
        Self { repo, counter_sync }
    }

    /// Records one stamp and queues a counter push. The push never affects
    /// the outcome of this call.
    pub async fn issue_stamp(&self, user_id: String, business_id: Uuid) -> AppResult<Stamp> {
        let stamp = self
            .repo
            .create(NewStamp {
                business_id,
                user_id: user_id.clone(),
            })
            .await?;

        tracing::info!(business_id = %business_id, user_id = %user_id, "Stamp issued");
        self.counter_sync.enqueue(CounterSyncJob::StampIssued {
            user_id,
            business_id,
        });
        Ok(stamp)
    }

    /// Newest first
    pub async fn list_stamps(&self, user_id: &str, business_id: Uuid) -> AppResult<Vec<Stamp>> {
        self.repo.list_for_user(user_id, business_id).await
    }
}

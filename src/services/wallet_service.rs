use std::sync::Arc;

use uuid::Uuid;

use crate::error::AppResult;
use crate::external::{MemberDirectory, WalletPassStatus};

/// Pass-through to the user-service's wallet-pass endpoints
#[derive(Clone)]
pub struct WalletPassService {
    directory: Arc<dyn MemberDirectory>,
}

impl WalletPassService {
    pub fn new(directory: Arc<dyn MemberDirectory>) -> Self {
        Self { directory }
    }

    pub async fn get_wallet_pass(&self, user_id: &str, business_id: Uuid) -> AppResult<WalletPassStatus> {
        self.directory.get_wallet_pass(user_id, business_id).await
    }

    pub async fn link_wallet_pass(
        &self,
        user_id: &str,
        business_id: Uuid,
        object_id: Option<String>,
    ) -> AppResult<WalletPassStatus> {
        let status = self
            .directory
            .upsert_wallet_pass(user_id, business_id, object_id)
            .await?;
        tracing::info!(
            business_id = %business_id,
            user_id = %user_id,
            linked = status.linked,
            "Wallet pass updated"
        );
        Ok(status)
    }
}

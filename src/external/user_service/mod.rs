//! Typed access to the user-service, which owns identities and membership
//! counters.

mod client;

pub use client::UserServiceClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;

/// Default page size of a user query when the caller names none
pub const DEFAULT_QUERY_LIMIT: u32 = 50;

/// Identity record as exposed by the user-service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicUser {
    pub id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub birthday: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    /// Substring matched against the user's email
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub business_id: Option<Uuid>,
}

/// Counter update for one membership. Absolute values replace the stored
/// counters; deltas are added to the lifetime totals. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipCounters {
    pub business_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_stamps: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_coupons: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_stamps_delta: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_coupons_delta: Option<i64>,
}

/// Link state between a membership and a wallet pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletPassStatus {
    #[serde(default)]
    pub linked: bool,
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_pass: Option<serde_json::Value>,
}

impl WalletPassStatus {
    pub fn unlinked() -> Self {
        Self {
            linked: false,
            object_id: None,
            wallet_pass: None,
        }
    }
}

/// The user-service operations this service depends on
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn query_users(&self, query: &UserQuery) -> AppResult<Vec<BasicUser>>;

    async fn update_membership_counters(
        &self,
        user_id: &str,
        counters: &MembershipCounters,
    ) -> AppResult<()>;

    /// Current wallet pass link; an unknown membership reads as unlinked.
    async fn get_wallet_pass(&self, user_id: &str, business_id: Uuid)
    -> AppResult<WalletPassStatus>;

    async fn upsert_wallet_pass(
        &self,
        user_id: &str,
        business_id: Uuid,
        object_id: Option<String>,
    ) -> AppResult<WalletPassStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_counters_omit_unset_fields() {
        let business_id = Uuid::nil();
        let counters = MembershipCounters {
            business_id,
            valid_coupons: Some(2),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&counters).unwrap(),
            json!({ "businessId": business_id, "validCoupons": 2 })
        );
    }

    #[test]
    fn test_wallet_pass_status_tolerates_sparse_bodies() {
        let status: WalletPassStatus = serde_json::from_value(json!({ "linked": true })).unwrap();
        assert!(status.linked);
        assert!(status.object_id.is_none());
        assert!(status.wallet_pass.is_none());
    }
}

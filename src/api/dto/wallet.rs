//! Wallet-pass proxy DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::external::WalletPassStatus;

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LinkWalletPassRequest {
    #[validate(length(min = 1, max = 255, message = "objectId must be between 1 and 255 characters"))]
    pub object_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletPassResponse {
    pub linked: bool,
    pub object_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub wallet_pass: Option<serde_json::Value>,
}

impl From<WalletPassStatus> for WalletPassResponse {
    fn from(status: WalletPassStatus) -> Self {
        Self {
            linked: status.linked,
            object_id: status.object_id,
            wallet_pass: status.wallet_pass,
        }
    }
}

//! Analytics query parameters.

use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase", parameter_in = Query)]
pub struct DailySeriesQuery {
    pub business_id: Option<Uuid>,
    /// Window length in days, clamped to 1..=90 (default 30)
    #[param(example = 30)]
    pub days: Option<i64>,
}

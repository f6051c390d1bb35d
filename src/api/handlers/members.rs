//! CRM member listing handler.

use axum::{Json, Router, extract::State, routing::post};
use chrono::Utc;

use super::first_business_id;
use crate::api::doc::CRM_TAG;
use crate::api::dto::{
    BusinessScopeQuery, ErrorResponse, MemberListRequest, MemberResponse, PagedResponse,
};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::{ValidatedJson, ValidatedQuery};

/// Routes:
/// - POST / - Search, filter, sort and page the business's members
pub fn member_routes() -> Router<AppState> {
    Router::new().route("/", post(list_members))
}

/// Lists members of a business enriched with stamps, coupons and prize
/// progression.
///
/// `businessId` is taken from the body, then from the query string.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    params(BusinessScopeQuery),
    request_body = MemberListRequest,
    responses(
        (status = 200, description = "A page of members", body = PagedResponse<MemberResponse>),
        (status = 400, description = "Invalid body or missing businessId", body = ErrorResponse),
        (status = 502, description = "User-service unavailable", body = ErrorResponse)
    ),
    security(("bearerAuth" = [])),
    tag = CRM_TAG
)]
pub async fn list_members(
    State(state): State<AppState>,
    ValidatedQuery(scope): ValidatedQuery<BusinessScopeQuery>,
    ValidatedJson(payload): ValidatedJson<MemberListRequest>,
) -> Result<Json<PagedResponse<MemberResponse>>, AppError> {
    let business_id = first_business_id(&[payload.business_id, scope.business_id])?;
    let query = payload.into_member_query(business_id);

    let page = state.services.crm.list_members(&query, Utc::now()).await?;

    Ok(Json(PagedResponse::new(
        "ok",
        page.rows.into_iter().map(MemberResponse::from).collect(),
        query.page,
        query.limit,
        page.total as u64,
    )))
}

//! OpenAPI document served at `/api-docs/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers;

pub const HEALTH_TAG: &str = "Health";
pub const BUSINESS_TAG: &str = "Businesses";
pub const PRIZE_TAG: &str = "Prizes";
pub const STAMP_TAG: &str = "Stamps";
pub const COUPON_TAG: &str = "Coupons";
pub const CRM_TAG: &str = "CRM";
pub const ANALYTICS_TAG: &str = "Analytics";
pub const WALLET_TAG: &str = "Wallet passes";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Loyalty",
        description = "Stamp cards, prizes, coupons and CRM for loyalty businesses",
    ),
    modifiers(&SecurityAddon),
    paths(
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::businesses::list_businesses,
        handlers::businesses::create_business,
        handlers::businesses::get_business,
        handlers::businesses::update_business,
        handlers::businesses::delete_business,
        handlers::prizes::list_prizes,
        handlers::prizes::create_prize,
        handlers::prizes::update_prize,
        handlers::prizes::delete_prize,
        handlers::stamps::issue_stamp,
        handlers::stamps::list_stamps,
        handlers::coupons::create_coupon,
        handlers::coupons::redeem_coupon,
        handlers::coupons::list_coupons,
        handlers::members::list_members,
        handlers::analytics::summary,
        handlers::analytics::daily_transactions,
        handlers::wallet_passes::get_wallet_pass,
        handlers::wallet_passes::link_wallet_pass,
    ),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
            crate::api::dto::MemberFilterRequest,
            crate::api::dto::PageMeta,
            crate::api::dto::PrizeSummary,
            crate::services::SortBy,
            crate::services::SortOrder,
            crate::services::DailyPoint,
        )
    ),
    tags(
        (name = HEALTH_TAG, description = "Liveness and readiness checks"),
        (name = BUSINESS_TAG, description = "Business management"),
        (name = PRIZE_TAG, description = "Prize catalog"),
        (name = STAMP_TAG, description = "Stamp issuance"),
        (name = COUPON_TAG, description = "Coupon issuance and redemption"),
        (name = CRM_TAG, description = "Member listing with loyalty statistics"),
        (name = ANALYTICS_TAG, description = "Dashboard figures"),
        (name = WALLET_TAG, description = "Digital wallet pass proxy"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Identity-provider access token"))
                        .build(),
                ),
            )
        }
    }
}

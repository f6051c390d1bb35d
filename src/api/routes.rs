//! Router configuration for the API.
//!
//! This module provides centralized route registration and middleware
//! configuration for the application.

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers::{self, BUSINESS_ID_HEADER};
use crate::api::middleware::{
    REQUEST_ID_HEADER, auth_middleware, logging_middleware, request_id_middleware,
};
use crate::state::AppState;

/// CORS policy: the configured origins, or any origin when none are listed.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(BUSINESS_ID_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)]);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Last added runs first:
/// 1. CORS answers preflight requests before anything else
/// 2. Request ID generates or propagates `x-request-id`
/// 3. Logging records the request inside a span carrying that id
/// 4. Compression
/// 5. Bearer authentication, on `/api/v1` only
///
/// # Routes
/// - `/health`, `/health/ready` - health checks, no token required
/// - `/api/v1/{businesses,prizes,stamps,coupons,users,analytics,wallet-passes}`
/// - `/swagger-ui`, `/api-docs/openapi.json` - API description, no token
///   required; it carries no data and declares the bearer scheme itself
pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    let api_routes = Router::new()
        .nest("/businesses", handlers::businesses::business_routes())
        .nest("/prizes", handlers::prizes::prize_routes())
        .nest("/stamps", handlers::stamps::stamp_routes())
        .nest("/coupons", handlers::coupons::coupon_routes())
        .nest("/users", handlers::members::member_routes())
        .nest("/analytics", handlers::analytics::analytics_routes())
        .nest("/wallet-passes", handlers::wallet_passes::wallet_pass_routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(handlers::health::health_routes())
        .nest("/api/v1", api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use diesel_async::AsyncPgConnection;
    use diesel_async::pooled_connection::AsyncDieselConnectionManager;
    use diesel_async::pooled_connection::bb8::Pool;
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::config::Settings;
    use crate::error::AppResult;
    use crate::external::{BasicUser, MemberDirectory, MembershipCounters, UserQuery, WalletPassStatus};
    use crate::repositories::Repositories;
    use crate::services::{CounterSyncHandle, Services};
    use crate::utils::TokenVerifier;
    use crate::utils::jwt::tests::{shared_secret_config, token_with_roles};

    /// Answers wallet-pass lookups; nothing here touches the database.
    struct LinkedDirectory;

    #[async_trait]
    impl MemberDirectory for LinkedDirectory {
        async fn query_users(&self, _query: &UserQuery) -> AppResult<Vec<BasicUser>> {
            Ok(vec![])
        }

        async fn update_membership_counters(
            &self,
            _user_id: &str,
            _counters: &MembershipCounters,
        ) -> AppResult<()> {
            Ok(())
        }

        async fn get_wallet_pass(&self, _user_id: &str, _business_id: Uuid) -> AppResult<WalletPassStatus> {
            Ok(WalletPassStatus {
                linked: true,
                object_id: Some("issuer.pass-1".to_string()),
                wallet_pass: None,
            })
        }

        async fn upsert_wallet_pass(
            &self,
            _user_id: &str,
            _business_id: Uuid,
            object_id: Option<String>,
        ) -> AppResult<WalletPassStatus> {
            Ok(WalletPassStatus {
                linked: true,
                object_id,
                wallet_pass: None,
            })
        }
    }

    /// A router whose pool never connects: only routes that stay off the
    /// database are exercised.
    fn router() -> Router {
        let manager =
            AsyncDieselConnectionManager::<AsyncPgConnection>::new("postgres://localhost:1/unused");
        let pool = Pool::builder().build_unchecked(manager);
        let settings = Settings::default();
        let services = Services::new(
            Repositories::new(pool.clone()),
            Arc::new(LinkedDirectory),
            CounterSyncHandle::disabled(),
            &settings,
        );
        let verifier =
            TokenVerifier::from_config(&shared_secret_config(), reqwest::Client::new()).unwrap();
        let state = AppState::new(services, pool, Arc::new(verifier), None);
        create_router(state, &[])
    }

    fn wallet_request(token: Option<&str>) -> Request<Body> {
        let mut builder = Request::get(format!("/api/v1/wallet-passes/42/{}", Uuid::new_v4()));
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_needs_no_token() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = router().oneshot(wallet_request(None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["code"], "UNAUTHORIZED");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_token_without_staff_role_is_forbidden() {
        let token = token_with_roles(&["offline_access"], &["viewer"]);
        let response = router().oneshot(wallet_request(Some(&token))).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = json_body(response).await;
        assert_eq!(body["code"], "FORBIDDEN");
        assert_eq!(body["message"], "Requires staff or higher role");
    }

    #[tokio::test]
    async fn test_client_role_grants_access() {
        let token = token_with_roles(&[], &["Staff"]);
        let response = router().oneshot(wallet_request(Some(&token))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["linked"], true);
        assert_eq!(body["objectId"], "issuer.pass-1");
    }

    #[tokio::test]
    async fn test_preflight_skips_authentication() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/v1/users")
                    .header(header::ORIGIN, "https://dashboard.example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_success());
        assert!(
            response
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
    }

    #[tokio::test]
    async fn test_analytics_without_business_is_bad_request() {
        let token = token_with_roles(&["owner"], &[]);
        let response = router()
            .oneshot(
                Request::get("/api/v1/analytics")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["message"], "businessId is required");
    }

    #[tokio::test]
    async fn test_openapi_document_is_public_but_api_is_not() {
        let response = router()
            .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let doc = json_body(response).await;
        assert!(doc["paths"]["/api/v1/users"].is_object());
        assert!(doc["components"]["securitySchemes"]["bearerAuth"].is_object());

        let response = router()
            .oneshot(Request::get("/api/v1/coupons").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

//! OAuth client-credentials token acquisition with an in-memory cache.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::settings::OAuthClientConfig;
use crate::error::{AppError, AppResult};

/// Lifetime assumed when the token endpoint omits `expires_in`
const DEFAULT_EXPIRES_IN_SECS: u64 = 60;

/// Supplies bearer tokens for service-to-service calls.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> AppResult<String>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, skew: Duration, now: Instant) -> bool {
        now + skew < self.expires_at
    }
}

/// Client-credentials grant against the identity provider's token endpoint.
///
/// The token is cached until it is within `refresh_skew_seconds` of expiry.
/// Concurrent callers that find the cache stale serialize on the write lock,
/// so only one of them hits the token endpoint.
pub struct TokenService {
    http: reqwest::Client,
    config: OAuthClientConfig,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenService {
    pub fn new(http: reqwest::Client, config: OAuthClientConfig) -> Self {
        Self {
            http,
            config,
            cache: RwLock::new(None),
        }
    }

    fn skew(&self) -> Duration {
        Duration::from_secs(self.config.refresh_skew_seconds)
    }

    /// Credentials are only required once a token is actually needed.
    fn credentials(&self) -> AppResult<(&str, &str, &str)> {
        fn required<'a>(value: &'a Option<String>, key: &str) -> AppResult<&'a str> {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::missing_config(key))
        }

        Ok((
            required(&self.config.token_url, "user_service.oauth.token_url")?,
            required(&self.config.client_id, "user_service.oauth.client_id")?,
            required(&self.config.client_secret, "user_service.oauth.client_secret")?,
        ))
    }

    async fn fetch_token(&self) -> AppResult<CachedToken> {
        let (token_url, client_id, client_secret) = self.credentials()?;
        let requested_at = Instant::now();

        let response = self
            .http
            .post(token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .await
            .map_err(|e| token_error(format!("token request failed: {}", e), Some(e.into())))?
            .error_for_status()
            .map_err(|e| token_error(format!("token endpoint rejected: {}", e), Some(e.into())))?;

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| token_error(format!("invalid token response: {}", e), Some(e.into())))?;

        let lifetime = body.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        tracing::debug!(expires_in = lifetime, "Fetched service access token");

        Ok(CachedToken {
            value: body.access_token,
            expires_at: requested_at + Duration::from_secs(lifetime),
        })
    }
}

fn token_error(message: String, source: Option<anyhow::Error>) -> AppError {
    AppError::ExternalService {
        service: "identity-provider".to_string(),
        message,
        source,
    }
}

#[async_trait]
impl AccessTokenProvider for TokenService {
    async fn access_token(&self) -> AppResult<String> {
        let skew = self.skew();

        if let Some(token) = self.cache.read().await.as_ref()
            && token.is_fresh(skew, Instant::now())
        {
            return Ok(token.value.clone());
        }

        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(token) = cache.as_ref()
            && token.is_fresh(skew, Instant::now())
        {
            return Ok(token.value.clone());
        }

        let token = self.fetch_token().await?;
        let value = token.value.clone();
        *cache = Some(token);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_stub;
    use axum::{Form, Json, Router, extract::State, routing::post};
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn token_endpoint(expires_in: u64) -> (String, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/token",
                post(
                    |State((calls, expires_in)): State<(Arc<AtomicUsize>, u64)>,
                     Form(form): Form<HashMap<String, String>>| async move {
                        assert_eq!(form["grant_type"], "client_credentials");
                        assert_eq!(form["client_id"], "business-service");
                        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                        Json::<Value>(json!({
                            "access_token": format!("token-{}", n),
                            "expires_in": expires_in,
                            "token_type": "Bearer"
                        }))
                    },
                ),
            )
            .with_state((calls.clone(), expires_in));
        (spawn_stub(router).await, calls)
    }

    fn config(token_url: String) -> OAuthClientConfig {
        OAuthClientConfig {
            token_url: Some(format!("{}/token", token_url)),
            client_id: Some("business-service".to_string()),
            client_secret: Some("s3cret".to_string()),
            refresh_skew_seconds: 30,
        }
    }

    #[tokio::test]
    async fn test_fresh_token_is_reused() {
        let (base, calls) = token_endpoint(300).await;
        let service = TokenService::new(reqwest::Client::new(), config(base));

        assert_eq!(service.access_token().await.unwrap(), "token-1");
        assert_eq!(service.access_token().await.unwrap(), "token-1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_token_inside_refresh_window_is_replaced() {
        // expires_in below the 30s skew makes every cached token stale
        let (base, calls) = token_endpoint(10).await;
        let service = TokenService::new(reqwest::Client::new(), config(base));

        assert_eq!(service.access_token().await.unwrap(), "token-1");
        assert_eq!(service.access_token().await.unwrap(), "token-2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_credentials_is_configuration_error() {
        let service = TokenService::new(
            reqwest::Client::new(),
            OAuthClientConfig {
                token_url: Some("http://127.0.0.1:1/token".to_string()),
                client_id: Some("business-service".to_string()),
                client_secret: None,
                refresh_skew_seconds: 30,
            },
        );

        match service.access_token().await {
            Err(AppError::Configuration { key, .. }) => {
                assert_eq!(key, "user_service.oauth.client_secret")
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
    }
}

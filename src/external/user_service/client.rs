use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use super::{
    BasicUser, DEFAULT_QUERY_LIMIT, MembershipCounters, MemberDirectory, UserQuery,
    WalletPassStatus,
};
use crate::error::{AppError, AppResult};
use crate::external::token::AccessTokenProvider;

#[derive(Debug, Deserialize)]
struct QueryUsersResponse {
    #[serde(default)]
    users: Vec<RemoteUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteUser {
    id: Value,
    email: Option<String>,
    phone: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    #[serde(default)]
    attributes: Option<RemoteAttributes>,
}

#[derive(Debug, Default, Deserialize)]
struct RemoteAttributes {
    birthday: Option<String>,
}

impl From<RemoteUser> for BasicUser {
    fn from(user: RemoteUser) -> Self {
        let id = match user.id {
            Value::String(s) => s,
            other => other.to_string(),
        };
        BasicUser {
            id,
            email: user.email,
            phone: user.phone,
            name: user.first_name,
            surname: user.last_name,
            birthday: user.attributes.and_then(|a| a.birthday),
        }
    }
}

/// HTTP client for the user-service's internal API.
///
/// Every call carries a service bearer token from the token provider.
pub struct UserServiceClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl UserServiceClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> AppResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| AppError::Configuration {
            key: "user_service.base_url".to_string(),
            source: e.into(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::missing_config("user_service.base_url"));
        }
        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    /// Joins percent-encoded path segments onto the base URL.
    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::missing_config("user_service.base_url"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn wallet_pass_url(&self, user_id: &str, business_id: Uuid) -> AppResult<Url> {
        let business_id = business_id.to_string();
        self.endpoint(&[
            "internal",
            "v1",
            "users",
            user_id,
            "memberships",
            &business_id,
            "wallet-pass",
        ])
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> AppResult<reqwest::Response> {
        let token = self.tokens.access_token().await?;
        request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::user_service(format!("request failed: {}", e), Some(e.into())))
    }
}

fn unexpected_status(response: &reqwest::Response) -> AppError {
    AppError::user_service(
        format!("{} returned {}", response.url().path(), response.status()),
        None,
    )
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> AppResult<Option<T>> {
    let body = response
        .bytes()
        .await
        .map_err(|e| AppError::user_service(format!("reading body: {}", e), Some(e.into())))?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice::<Option<T>>(&body)
        .map_err(|e| AppError::user_service(format!("invalid response body: {}", e), Some(e.into())))
}

#[async_trait]
impl MemberDirectory for UserServiceClient {
    async fn query_users(&self, query: &UserQuery) -> AppResult<Vec<BasicUser>> {
        let targeting_rules = match query.search.as_deref().map(str::trim) {
            Some(search) if !search.is_empty() => vec![json!({
                "database": "USER",
                "field": "email",
                "operator": "CONTAINS",
                "value": search,
            })],
            _ => Vec::new(),
        };
        let body = json!({
            "targetingRules": targeting_rules,
            "limit": query.limit.unwrap_or(DEFAULT_QUERY_LIMIT),
            "businessId": query.business_id,
        });

        let url = self.endpoint(&["internal", "v1", "users", "query"])?;
        let response = self.send(self.http.post(url).json(&body)).await?;
        if !response.status().is_success() {
            return Err(unexpected_status(&response));
        }

        let users = read_json::<QueryUsersResponse>(response)
            .await?
            .map(|r| r.users)
            .unwrap_or_default();
        tracing::debug!(count = users.len(), "Queried user-service users");
        Ok(users.into_iter().map(BasicUser::from).collect())
    }

    async fn update_membership_counters(
        &self,
        user_id: &str,
        counters: &MembershipCounters,
    ) -> AppResult<()> {
        let url = self.endpoint(&["internal", "v1", "users", user_id, "memberships", "counters"])?;
        let response = self.send(self.http.post(url).json(counters)).await?;
        if !response.status().is_success() {
            return Err(unexpected_status(&response));
        }
        Ok(())
    }

    async fn get_wallet_pass(
        &self,
        user_id: &str,
        business_id: Uuid,
    ) -> AppResult<WalletPassStatus> {
        let url = self.wallet_pass_url(user_id, business_id)?;
        let response = self.send(self.http.get(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(WalletPassStatus::unlinked());
        }
        if !response.status().is_success() {
            return Err(unexpected_status(&response));
        }
        Ok(read_json(response)
            .await?
            .unwrap_or_else(WalletPassStatus::unlinked))
    }

    async fn upsert_wallet_pass(
        &self,
        user_id: &str,
        business_id: Uuid,
        object_id: Option<String>,
    ) -> AppResult<WalletPassStatus> {
        let url = self.wallet_pass_url(user_id, business_id)?;
        let body = json!({ "objectId": object_id });
        let response = self.send(self.http.post(url).json(&body)).await?;
        if !response.status().is_success() {
            return Err(unexpected_status(&response));
        }
        Ok(read_json(response).await?.unwrap_or(WalletPassStatus {
            linked: true,
            object_id,
            wallet_pass: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_stub;
    use axum::{
        Json, Router,
        extract::Path,
        http::{HeaderMap, StatusCode as HttpStatus},
        routing::{get, post},
    };

    struct StaticToken;

    #[async_trait]
    impl AccessTokenProvider for StaticToken {
        async fn access_token(&self) -> AppResult<String> {
            Ok("service-token".to_string())
        }
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "Bearer service-token")
    }

    async fn client_for(router: Router) -> UserServiceClient {
        let base = spawn_stub(router).await;
        UserServiceClient::new(reqwest::Client::new(), &base, Arc::new(StaticToken)).unwrap()
    }

    #[tokio::test]
    async fn test_query_users_maps_remote_fields() {
        let router = Router::new().route(
            "/internal/v1/users/query",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert!(authorized(&headers));
                assert_eq!(body["limit"], 20);
                assert_eq!(body["targetingRules"][0]["operator"], "CONTAINS");
                assert_eq!(body["targetingRules"][0]["value"], "ann");
                Json(json!({
                    "users": [
                        { "id": 42, "email": "ann@example.com", "firstName": "Ann",
                          "lastName": "Lee", "attributes": { "birthday": "1990-04-01" } },
                        { "id": "u-2", "email": null }
                    ]
                }))
            }),
        );
        let client = client_for(router).await;

        let users = client
            .query_users(&UserQuery {
                search: Some("ann".to_string()),
                limit: Some(20),
                business_id: None,
            })
            .await
            .unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, "42");
        assert_eq!(users[0].name.as_deref(), Some("Ann"));
        assert_eq!(users[0].surname.as_deref(), Some("Lee"));
        assert_eq!(users[0].birthday.as_deref(), Some("1990-04-01"));
        assert_eq!(users[1].id, "u-2");
        assert!(users[1].name.is_none());
    }

    #[tokio::test]
    async fn test_wallet_pass_not_found_reads_as_unlinked() {
        let router = Router::new().route(
            "/internal/v1/users/{user}/memberships/{business}/wallet-pass",
            get(|| async { HttpStatus::NOT_FOUND }),
        );
        let client = client_for(router).await;

        let status = client.get_wallet_pass("u-1", Uuid::new_v4()).await.unwrap();
        assert_eq!(status, WalletPassStatus::unlinked());
    }

    #[tokio::test]
    async fn test_user_id_is_path_encoded() {
        let router = Router::new().route(
            "/internal/v1/users/{user}/memberships/counters",
            post(|Path(user): Path<String>, Json(body): Json<Value>| async move {
                assert_eq!(user, "a/b c");
                assert_eq!(body["validStamps"], 7);
                assert!(body.get("validCoupons").is_none());
                HttpStatus::NO_CONTENT
            }),
        );
        let client = client_for(router).await;

        client
            .update_membership_counters(
                "a/b c",
                &MembershipCounters {
                    business_id: Uuid::new_v4(),
                    valid_stamps: Some(7),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upsert_with_empty_body_assumes_linked() {
        let router = Router::new().route(
            "/internal/v1/users/{user}/memberships/{business}/wallet-pass",
            post(|| async { HttpStatus::OK }),
        );
        let client = client_for(router).await;

        let status = client
            .upsert_wallet_pass("u-1", Uuid::new_v4(), Some("obj-9".to_string()))
            .await
            .unwrap();
        assert!(status.linked);
        assert_eq!(status.object_id.as_deref(), Some("obj-9"));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_external_service_error() {
        let router = Router::new().route(
            "/internal/v1/users/query",
            post(|| async { HttpStatus::INTERNAL_SERVER_ERROR }),
        );
        let client = client_for(router).await;

        let err = client.query_users(&UserQuery::default()).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalService { ref service, .. } if service == "user-service"));
    }
}

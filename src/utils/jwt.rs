use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};
use crate::external::JwksCache;

/// Roles container as issued by Keycloak
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleSet {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Claims of an identity-provider access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (timestamp)
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    /// Realm-level roles
    #[serde(default)]
    pub realm_access: Option<RoleSet>,
    /// Client-level roles keyed by client id
    #[serde(default)]
    pub resource_access: HashMap<String, RoleSet>,
}

impl Claims {
    /// Realm and client roles, lower-cased and deduplicated.
    pub fn roles(&self) -> Vec<String> {
        let mut roles: Vec<String> = self
            .realm_access
            .iter()
            .chain(self.resource_access.values())
            .flat_map(|set| set.roles.iter())
            .map(|role| role.trim().to_lowercase())
            .filter(|role| !role.is_empty())
            .collect();
        roles.sort();
        roles.dedup();
        roles
    }
}

enum KeySource {
    Jwks(Arc<JwksCache>),
    Shared(DecodingKey),
}

/// Verifies bearer tokens and applies the role allow-list.
pub struct TokenVerifier {
    keys: KeySource,
    issuer: Option<String>,
    audience: Option<String>,
    allowed_roles: Vec<String>,
}

impl TokenVerifier {
    /// Prefers the JWKS endpoint when both modes are configured.
    pub fn from_config(config: &AuthConfig, http: reqwest::Client) -> AppResult<Self> {
        let keys = match (&config.jwks_url, &config.hs256_secret) {
            (Some(url), _) => KeySource::Jwks(Arc::new(JwksCache::new(
                http,
                url.clone(),
                Duration::from_secs(config.jwks_cache_seconds),
            ))),
            (None, Some(secret)) => KeySource::Shared(DecodingKey::from_secret(secret.as_bytes())),
            (None, None) => return Err(AppError::missing_config("auth.jwks_url")),
        };

        Ok(Self {
            keys,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            allowed_roles: config
                .allowed_roles
                .iter()
                .map(|r| r.trim().to_lowercase())
                .filter(|r| !r.is_empty())
                .collect(),
        })
    }

    fn validation(&self, algorithms: &[Algorithm]) -> Validation {
        let mut validation = Validation::default();
        validation.algorithms = algorithms.to_vec();
        match &self.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = &self.issuer {
            validation.set_issuer(&[iss]);
        }
        validation
    }

    /// Validates signature, expiry and the configured issuer/audience.
    pub async fn verify(&self, token: &str) -> AppResult<Claims> {
        let header = decode_header(token).map_err(map_jwt_error)?;

        let (key, algorithms) = match &self.keys {
            KeySource::Shared(key) => (key.clone(), vec![Algorithm::HS256]),
            KeySource::Jwks(jwks) => {
                let kid = header.kid.as_deref().ok_or_else(|| AppError::Unauthorized {
                    message: "Token has no key id".to_string(),
                })?;
                let signing = jwks.signing_key(kid).await?;
                (signing.key, signing.algorithms)
            }
        };

        // the header's alg only selects among what the key allows
        if !algorithms.contains(&header.alg) {
            return Err(AppError::Unauthorized {
                message: "Token algorithm not allowed for this key".to_string(),
            });
        }

        decode::<Claims>(token, &key, &self.validation(&algorithms))
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }

    /// Whether any of the token's roles is on the allow-list.
    pub fn is_allowed(&self, claims: &Claims) -> bool {
        claims
            .roles()
            .iter()
            .any(|role| self.allowed_roles.contains(role))
    }
}

fn map_jwt_error(e: jsonwebtoken::errors::Error) -> AppError {
    use jsonwebtoken::errors::ErrorKind;

    let message = match e.kind() {
        ErrorKind::ExpiredSignature => "Token has expired".to_string(),
        ErrorKind::InvalidToken => "Invalid token".to_string(),
        ErrorKind::InvalidSignature => "Invalid token signature".to_string(),
        ErrorKind::InvalidIssuer => "Invalid token issuer".to_string(),
        ErrorKind::InvalidAudience => "Invalid token audience".to_string(),
        _ => format!("Token validation failed: {}", e),
    };
    AppError::Unauthorized { message }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::external::jwks::tests::{OCT_SECRET, jwks_endpoint};
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::{Value, json};

    pub const TEST_SECRET: &str = "test_secret_key_at_least_32_characters_long";

    pub fn sign(claims: Value, secret: &str, kid: Option<&str>) -> String {
        sign_with(Algorithm::HS256, claims, secret, kid)
    }

    fn sign_with(algorithm: Algorithm, claims: Value, secret: &str, kid: Option<&str>) -> String {
        let mut header = Header::new(algorithm);
        header.kid = kid.map(str::to_string);
        encode(&header, &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    pub fn token_with_roles(realm: &[&str], client: &[&str]) -> String {
        sign(
            json!({
                "sub": "staff-1",
                "exp": Utc::now().timestamp() + 3600,
                "email": "staff@example.com",
                "realm_access": { "roles": realm },
                "resource_access": { "business-app": { "roles": client } }
            }),
            TEST_SECRET,
            None,
        )
    }

    pub fn shared_secret_config() -> AuthConfig {
        AuthConfig {
            hs256_secret: Some(TEST_SECRET.to_string()),
            ..Default::default()
        }
    }

    fn verifier(config: &AuthConfig) -> TokenVerifier {
        TokenVerifier::from_config(config, reqwest::Client::new()).unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_roles_are_collected() {
        let verifier = verifier(&shared_secret_config());
        let claims = verifier
            .verify(&token_with_roles(&["offline_access", "Staff"], &["manager", "staff"]))
            .await
            .unwrap();

        assert_eq!(claims.sub, "staff-1");
        assert_eq!(claims.roles(), vec!["manager", "offline_access", "staff"]);
        assert!(verifier.is_allowed(&claims));
    }

    #[tokio::test]
    async fn test_token_without_allowed_role_is_not_allowed() {
        let verifier = verifier(&shared_secret_config());
        let claims = verifier
            .verify(&token_with_roles(&["customer"], &[]))
            .await
            .unwrap();
        assert!(!verifier.is_allowed(&claims));
    }

    #[tokio::test]
    async fn test_expired_token() {
        let verifier = verifier(&shared_secret_config());
        let token = sign(
            json!({ "sub": "x", "exp": Utc::now().timestamp() - 3600 }),
            TEST_SECRET,
            None,
        );

        match verifier.verify(&token).await {
            Err(AppError::Unauthorized { message }) => assert!(message.contains("expired")),
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wrong_secret_and_garbage_are_unauthorized() {
        let verifier = verifier(&shared_secret_config());
        let forged = sign(
            json!({ "sub": "x", "exp": Utc::now().timestamp() + 60 }),
            "another_secret_key_at_least_32_characters",
            None,
        );

        assert!(matches!(
            verifier.verify(&forged).await,
            Err(AppError::Unauthorized { .. })
        ));
        assert!(matches!(
            verifier.verify("invalid.token.format").await,
            Err(AppError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_issuer_is_enforced_when_configured() {
        let config = AuthConfig {
            issuer: Some("https://sso.example.com/realms/loyalty".to_string()),
            ..shared_secret_config()
        };
        let verifier = verifier(&config);
        let token = sign(
            json!({
                "sub": "x",
                "exp": Utc::now().timestamp() + 60,
                "iss": "https://evil.example.com"
            }),
            TEST_SECRET,
            None,
        );

        match verifier.verify(&token).await {
            Err(AppError::Unauthorized { message }) => assert!(message.contains("issuer")),
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_jwks_mode_resolves_key_by_kid() {
        let (url, _) = jwks_endpoint().await;
        let verifier = verifier(&AuthConfig {
            jwks_url: Some(url),
            ..Default::default()
        });
        let claims = json!({
            "sub": "owner-1",
            "exp": Utc::now().timestamp() + 60,
            "realm_access": { "roles": ["owner"] }
        });

        let token = sign(claims.clone(), OCT_SECRET, Some("k1"));
        let verified = verifier.verify(&token).await.unwrap();
        assert_eq!(verified.sub, "owner-1");
        assert!(verifier.is_allowed(&verified));

        let no_kid = sign(claims, OCT_SECRET, None);
        assert!(matches!(
            verifier.verify(&no_kid).await,
            Err(AppError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_jwks_mode_rejects_algorithm_the_key_does_not_declare() {
        let (url, _) = jwks_endpoint().await;
        let verifier = verifier(&AuthConfig {
            jwks_url: Some(url),
            ..Default::default()
        });
        let claims = json!({ "sub": "owner-1", "exp": Utc::now().timestamp() + 60 });

        // k1 declares HS256
        let token = sign_with(Algorithm::HS384, claims.clone(), OCT_SECRET, Some("k1"));
        match verifier.verify(&token).await {
            Err(AppError::Unauthorized { message }) => assert!(message.contains("algorithm")),
            other => panic!("expected Unauthorized, got {:?}", other),
        }

        // a key without alg accepts its family
        let token = sign_with(Algorithm::HS512, claims, OCT_SECRET, Some("any-hmac"));
        assert_eq!(verifier.verify(&token).await.unwrap().sub, "owner-1");
    }

    #[tokio::test]
    async fn test_shared_secret_mode_only_accepts_hs256() {
        let verifier = verifier(&shared_secret_config());
        let token = sign_with(
            Algorithm::HS512,
            json!({ "sub": "x", "exp": Utc::now().timestamp() + 60 }),
            TEST_SECRET,
            None,
        );
        assert!(matches!(
            verifier.verify(&token).await,
            Err(AppError::Unauthorized { .. })
        ));
    }
}

//! Signing keys published by the identity provider.

use std::time::{Duration, Instant};

use cached::{Cached, TimedSizedCache};
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};

/// Minimum gap between two fetches triggered by unknown key ids
const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(10);

/// Upper bound on cached keys
const MAX_KEYS: usize = 64;

/// A decoding key and the signature algorithms it may be used with.
#[derive(Clone, Debug)]
pub struct SigningKey {
    pub key: DecodingKey,
    pub algorithms: Vec<Algorithm>,
}

impl SigningKey {
    /// Pins the key to its declared `alg`, or to its key-type family when
    /// the JWK declares none.
    fn from_jwk(jwk: &Jwk) -> Option<Self> {
        let algorithms = match jwk.common.key_algorithm {
            Some(alg) => vec![signature_algorithm(alg)?],
            None => match &jwk.algorithm {
                AlgorithmParameters::RSA(_) => vec![
                    Algorithm::RS256,
                    Algorithm::RS384,
                    Algorithm::RS512,
                    Algorithm::PS256,
                    Algorithm::PS384,
                    Algorithm::PS512,
                ],
                AlgorithmParameters::EllipticCurve(_) => vec![Algorithm::ES256, Algorithm::ES384],
                AlgorithmParameters::OctetKeyPair(_) => vec![Algorithm::EdDSA],
                AlgorithmParameters::OctetKey(_) => {
                    vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512]
                }
            },
        };
        let key = DecodingKey::from_jwk(jwk).ok()?;
        Some(Self { key, algorithms })
    }
}

/// Encryption algorithms map to `None`.
fn signature_algorithm(alg: KeyAlgorithm) -> Option<Algorithm> {
    Some(match alg {
        KeyAlgorithm::HS256 => Algorithm::HS256,
        KeyAlgorithm::HS384 => Algorithm::HS384,
        KeyAlgorithm::HS512 => Algorithm::HS512,
        KeyAlgorithm::ES256 => Algorithm::ES256,
        KeyAlgorithm::ES384 => Algorithm::ES384,
        KeyAlgorithm::RS256 => Algorithm::RS256,
        KeyAlgorithm::RS384 => Algorithm::RS384,
        KeyAlgorithm::RS512 => Algorithm::RS512,
        KeyAlgorithm::PS256 => Algorithm::PS256,
        KeyAlgorithm::PS384 => Algorithm::PS384,
        KeyAlgorithm::PS512 => Algorithm::PS512,
        KeyAlgorithm::EdDSA => Algorithm::EdDSA,
        _ => return None,
    })
}

/// Caches signing keys by `kid` for `ttl`.
///
/// A `kid` missing from the cache triggers a refetch so rotated keys are
/// picked up, rate-limited to one fetch every ten seconds (or every `ttl`
/// when that is shorter).
pub struct JwksCache {
    http: reqwest::Client,
    url: String,
    refetch_interval: Duration,
    keys: Mutex<TimedSizedCache<String, SigningKey>>,
    last_fetch: Mutex<Option<Instant>>,
}

impl JwksCache {
    pub fn new(http: reqwest::Client, url: impl Into<String>, ttl: Duration) -> Self {
        Self {
            http,
            url: url.into(),
            refetch_interval: MIN_REFETCH_INTERVAL.min(ttl),
            keys: Mutex::new(TimedSizedCache::with_size_and_lifespan(MAX_KEYS, ttl)),
            last_fetch: Mutex::new(None),
        }
    }

    pub async fn signing_key(&self, kid: &str) -> AppResult<SigningKey> {
        if let Some(key) = self.keys.lock().await.cache_get(kid).cloned() {
            return Ok(key);
        }

        // serializes fetches; a concurrent miss waits here and rereads
        let mut last_fetch = self.last_fetch.lock().await;
        if let Some(key) = self.keys.lock().await.cache_get(kid).cloned() {
            return Ok(key);
        }

        let recently_fetched = last_fetch.is_some_and(|at| at.elapsed() < self.refetch_interval);
        if !recently_fetched {
            let fetched = self.fetch().await?;
            *last_fetch = Some(Instant::now());

            let mut keys = self.keys.lock().await;
            for (id, key) in fetched {
                keys.cache_set(id, key);
            }
            if let Some(key) = keys.cache_get(kid).cloned() {
                return Ok(key);
            }
        }

        Err(AppError::Unauthorized {
            message: "Unknown token signing key".to_string(),
        })
    }

    async fn fetch(&self) -> AppResult<Vec<(String, SigningKey)>> {
        let fail = |message: String, source: Option<anyhow::Error>| AppError::ExternalService {
            service: "identity-provider".to_string(),
            message,
            source,
        };

        let set: JwkSet = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| fail(format!("JWKS request failed: {}", e), Some(e.into())))?
            .error_for_status()
            .map_err(|e| fail(format!("JWKS endpoint rejected: {}", e), Some(e.into())))?
            .json()
            .await
            .map_err(|e| fail(format!("invalid JWKS document: {}", e), Some(e.into())))?;

        let keys: Vec<_> = set
            .keys
            .iter()
            .filter_map(|jwk| {
                let kid = jwk.common.key_id.clone()?;
                match SigningKey::from_jwk(jwk) {
                    Some(key) => Some((kid, key)),
                    None => {
                        tracing::warn!(kid = %kid, "Skipping unusable JWK");
                        None
                    }
                }
            })
            .collect();

        tracing::debug!(count = keys.len(), "Loaded signing keys");
        Ok(keys)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::test_support::spawn_stub;
    use axum::{Json, Router, extract::State, routing::get};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// base64url("jwks-shared-secret-for-tests-0123456789")
    pub const OCT_KEY: &str = "andrcy1zaGFyZWQtc2VjcmV0LWZvci10ZXN0cy0wMTIzNDU2Nzg5";
    pub const OCT_SECRET: &str = "jwks-shared-secret-for-tests-0123456789";

    pub async fn jwks_endpoint() -> (String, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/certs",
                get(|State(calls): State<Arc<AtomicUsize>>| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Json::<Value>(json!({
                        "keys": [
                            { "kty": "oct", "kid": "k1", "alg": "HS256", "k": OCT_KEY },
                            { "kty": "oct", "kid": "any-hmac", "k": OCT_KEY },
                            { "kty": "oct", "k": OCT_KEY }
                        ]
                    }))
                }),
            )
            .with_state(calls.clone());
        (format!("{}/certs", spawn_stub(router).await), calls)
    }

    #[tokio::test]
    async fn test_known_kid_is_served_from_cache() {
        let (url, calls) = jwks_endpoint().await;
        let cache = JwksCache::new(reqwest::Client::new(), url, Duration::from_secs(300));

        cache.signing_key("k1").await.unwrap();
        cache.signing_key("k1").await.unwrap();
        cache.signing_key("any-hmac").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_kid_is_rejected_without_refetching() {
        let (url, calls) = jwks_endpoint().await;
        let cache = JwksCache::new(reqwest::Client::new(), url, Duration::from_secs(300));

        cache.signing_key("k1").await.unwrap();
        let err = cache.signing_key("rotated").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { .. }));
        // fetched a moment ago, so no second fetch yet
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_keys_expire_after_ttl() {
        let (url, calls) = jwks_endpoint().await;
        let cache = JwksCache::new(reqwest::Client::new(), url, Duration::from_millis(200));

        cache.signing_key("k1").await.unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        cache.signing_key("k1").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_key_algorithms_follow_the_jwk() {
        let (url, _) = jwks_endpoint().await;
        let cache = JwksCache::new(reqwest::Client::new(), url, Duration::from_secs(300));

        let pinned = cache.signing_key("k1").await.unwrap();
        assert_eq!(pinned.algorithms, vec![Algorithm::HS256]);

        let family = cache.signing_key("any-hmac").await.unwrap();
        assert_eq!(
            family.algorithms,
            vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512]
        );
    }
}

use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// JSON body extractor that runs `validator` rules before the handler sees it.
///
/// Malformed JSON becomes `BadRequest`; rule violations become
/// `ValidationErrors` with one entry per failing field.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Query-string extractor with the same rules as [`ValidatedJson`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> AppResult<Self> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

/// `Path` whose rejection renders as a JSON `BAD_REQUEST`.
#[derive(Debug, Clone, Copy)]
pub struct PathParams<T>(pub T);

impl<T, S> FromRequestParts<S> for PathParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> AppResult<Self> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(PathParams(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    struct StampBody {
        #[validate(length(min = 1, message = "userId is required"))]
        user_id: String,
        #[validate(range(min = 1, max = 200, message = "limit must be between 1 and 200"))]
        limit: u32,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri("/test")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body() {
        let request = json_request(r#"{"userId":"u-1","limit":20}"#);
        let ValidatedJson(body) = ValidatedJson::<StampBody>::from_request(request, &())
            .await
            .unwrap();
        assert_eq!(body.user_id, "u-1");
        assert_eq!(body.limit, 20);
    }

    #[tokio::test]
    async fn test_rule_violations_are_reported_per_field() {
        let request = json_request(r#"{"userId":"","limit":500}"#);
        match ValidatedJson::<StampBody>::from_request(request, &()).await {
            Err(AppError::ValidationErrors { errors }) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["limit", "user_id"]);
                assert!(errors[0].message.contains("between 1 and 200"));
            }
            other => panic!("expected ValidationErrors, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let request = json_request(r#"{"userId":"#);
        assert!(matches!(
            ValidatedJson::<StampBody>::from_request(request, &()).await,
            Err(AppError::BadRequest { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/test")
            .body(Body::from(r#"{"userId":"u-1","limit":1}"#))
            .unwrap();
        assert!(matches!(
            ValidatedJson::<StampBody>::from_request(request, &()).await,
            Err(AppError::BadRequest { .. })
        ));
    }

    #[derive(Debug, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    struct DaysQuery {
        #[validate(range(min = 1, message = "days must be positive"))]
        days: i64,
    }

    #[tokio::test]
    async fn test_query_rules_are_enforced() {
        let (mut parts, _) = Request::builder()
            .uri("/test?days=0")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        assert!(matches!(
            ValidatedQuery::<DaysQuery>::from_request_parts(&mut parts, &()).await,
            Err(AppError::ValidationErrors { .. })
        ));

        let (mut parts, _) = Request::builder()
            .uri("/test?days=abc")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        assert!(matches!(
            ValidatedQuery::<DaysQuery>::from_request_parts(&mut parts, &()).await,
            Err(AppError::BadRequest { .. })
        ));
    }
}

//! Bearer token authentication and role gate.

use axum::{
    extract::{Request, State},
    http::{Method, header},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

pub const FORBIDDEN_MESSAGE: &str = "Requires staff or higher role";

/// Validates `Authorization: Bearer <token>` and requires one of the
/// configured roles.
///
/// CORS preflight requests pass through untouched. On success the verified
/// [`Claims`](crate::utils::Claims) are added to request extensions.
///
/// # Errors
/// - 401 when the header is missing or malformed, or the token fails verification
/// - 403 when the token carries none of the allowed roles
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized {
            message: "Missing authorization header".to_string(),
        })?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized {
            message: "Invalid authorization header format. Expected: Bearer <token>".to_string(),
        })?;

    let claims = state.verifier.verify(token).await?;

    if !state.verifier.is_allowed(&claims) {
        tracing::debug!(sub = %claims.sub, roles = ?claims.roles(), "Role gate rejected token");
        return Err(AppError::Forbidden {
            message: FORBIDDEN_MESSAGE.to_string(),
        });
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

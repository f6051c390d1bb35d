//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use std::sync::Arc;

use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::services::Services;
use crate::utils::TokenVerifier;

/// Application state containing all shared services and resources.
///
/// Cloning is cheap since services, the pool and the verifier are shared
/// through `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Direct access to the database connection pool (readiness check)
    pub db_pool: AsyncDbPool,
    /// Bearer token verification and role gate
    pub verifier: Arc<TokenVerifier>,
    /// Business used when a request names none
    pub default_business_id: Option<Uuid>,
}

impl AppState {
    pub fn new(
        services: Services,
        db_pool: AsyncDbPool,
        verifier: Arc<TokenVerifier>,
        default_business_id: Option<Uuid>,
    ) -> Self {
        Self {
            services,
            db_pool,
            verifier,
            default_business_id,
        }
    }
}

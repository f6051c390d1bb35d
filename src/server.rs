//! Server module for managing HTTP server lifecycle
//!
//! This module handles server initialization, startup, and graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;

use crate::api::routes::create_router;
use crate::config::{Environment, settings::Settings};
use crate::db::{establish_async_connection_pool, run_pending_migrations};
use crate::external::{TokenService, UserServiceClient, build_http_client};
use crate::repositories::Repositories;
use crate::services::{Services, counter_sync_channel};
use crate::state::AppState;
use crate::utils::TokenVerifier;

/// Upper bound on waiting for the counter sync worker after the listener closes
const WORKER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP server manager
pub struct Server {
    settings: Settings,
}

impl Server {
    /// Create a new server with the given settings
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    fn log_configuration(&self) {
        let settings = &self.settings;

        tracing::info!(
            app_name = %settings.application.name,
            app_version = %settings.application.version,
            environment = %Environment::from_env().as_str(),
            "Application starting"
        );

        tracing::info!(
            host = %settings.server.host,
            port = settings.server.port,
            request_timeout = settings.server.request_timeout,
            cors_origins = settings.server.cors_allowed_origins.len(),
            "Server configuration loaded"
        );

        // Connection strings and secrets are never logged
        tracing::info!(
            max_connections = settings.database.max_connections,
            min_connections = settings.database.min_connections,
            auto_migrate = settings.database.auto_migrate,
            "Database configuration loaded"
        );

        tracing::info!(
            jwks = settings.auth.jwks_url.is_some(),
            shared_secret = settings.auth.hs256_secret.is_some(),
            allowed_roles = ?settings.auth.allowed_roles,
            "Auth configuration loaded"
        );

        tracing::info!(
            base_url = %settings.user_service.base_url,
            oauth_configured = settings.user_service.oauth.client_id.is_some(),
            counter_sync = settings.counter_sync.enabled,
            "User-service configuration loaded"
        );
    }

    /// Start the server and run until a shutdown signal arrives.
    ///
    /// Startup order: database pool, optional migrations, outbound clients,
    /// counter sync worker, router. On shutdown the listener drains first,
    /// then the worker is cancelled and awaited.
    ///
    /// # Errors
    /// - Database pool or migration failures
    /// - Invalid outbound client or token verifier configuration
    /// - Address binding errors
    pub async fn run(self) -> anyhow::Result<()> {
        self.log_configuration();
        let settings = &self.settings;

        let pool = establish_async_connection_pool(&settings.database).await?;
        tracing::info!("Database connection pool initialized");

        if settings.database.auto_migrate {
            let applied = run_pending_migrations(settings.database.url.clone()).await?;
            tracing::info!(count = applied.len(), migrations = ?applied, "Database migrations applied");
        }

        let http = build_http_client(Duration::from_secs(settings.user_service.timeout_seconds))?;
        let tokens = Arc::new(TokenService::new(
            http.clone(),
            settings.user_service.oauth.clone(),
        ));
        let directory = Arc::new(UserServiceClient::new(
            http.clone(),
            &settings.user_service.base_url,
            tokens,
        )?);

        let repos = Repositories::new(pool.clone());
        let (counter_sync, worker) = counter_sync_channel(
            &settings.counter_sync,
            Arc::new(repos.clone()),
            directory.clone(),
        );

        let shutdown = CancellationToken::new();
        let worker_task = worker.map(|worker| tokio::spawn(worker.run(shutdown.clone())));

        let services = Services::new(repos, directory, counter_sync, settings);
        let verifier = Arc::new(TokenVerifier::from_config(&settings.auth, http)?);
        let state = AppState::new(
            services,
            pool,
            verifier,
            settings.loyalty.default_business_id,
        );

        let router = create_router(state, &settings.server.cors_allowed_origins).layer(
            TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(settings.server.request_timeout),
            ),
        );

        let address = settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;

        tracing::info!(address = %address, "Server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        shutdown.cancel();
        if let Some(task) = worker_task {
            match tokio::time::timeout(WORKER_SHUTDOWN_TIMEOUT, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "Counter sync worker panicked"),
                Err(_) => tracing::warn!("Counter sync worker did not stop in time"),
            }
        }

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

/// Waits for Ctrl+C or SIGTERM.
///
/// A handler that cannot be installed is logged and treated as never firing.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

//! Async database connection pool implementation.
//!
//! Uses bb8 connection pool manager with diesel_async for PostgreSQL connections.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::RunQueryDsl;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

/// Migrations compiled into the binary from `migrations/`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Async connection pool type alias.
///
/// bb8::Pool internally uses Arc, so Clone only bumps a reference count.
pub type AsyncDbPool = Pool<AsyncPgConnection>;

/// Creates an async database connection pool from the database settings.
///
/// # Errors
///
/// - `AppError::ConnectionPool` - If the pool cannot be built
///
/// # Example
///
/// ```ignore
/// let pool = establish_async_connection_pool(&settings.database).await?;
/// let mut conn = pool.get().await?;
/// ```
pub async fn establish_async_connection_pool(config: &DatabaseConfig) -> AppResult<AsyncDbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url.clone());
    Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(Duration::from_secs(config.connection_timeout))
        .build(manager)
        .await
        .map_err(|e| AppError::ConnectionPool {
            source: anyhow::Error::from(e),
        })
}

/// Runs a trivial query to prove a pooled connection is usable.
pub async fn ping(pool: &AsyncDbPool) -> AppResult<()> {
    let mut conn = pool.get().await?;
    diesel::sql_query("SELECT 1")
        .execute(&mut conn)
        .await
        .map_err(AppError::from)?;
    Ok(())
}

/// Runs `f` against a dedicated synchronous connection on a blocking
/// thread; the migration harness has no async API.
async fn with_migration_connection<T, F>(database_url: String, f: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce(&mut diesel::pg::PgConnection) -> AppResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        use diesel::Connection;

        let mut conn = diesel::pg::PgConnection::establish(&database_url).map_err(|e| {
            AppError::Database {
                operation: "establish connection for migrations".to_string(),
                source: anyhow::anyhow!("Connection error: {}", e),
            }
        })?;
        f(&mut conn)
    })
    .await
    .map_err(|e| AppError::Internal {
        source: anyhow::Error::from(e),
    })?
}

fn migration_error(operation: &str, e: impl std::fmt::Display) -> AppError {
    AppError::Database {
        operation: operation.to_string(),
        source: anyhow::anyhow!("Migration error: {}", e),
    }
}

/// Applies pending embedded migrations.
///
/// Returns the names of the migrations that were applied.
pub async fn run_pending_migrations(database_url: String) -> AppResult<Vec<String>> {
    with_migration_connection(database_url, |conn| {
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| migration_error("run pending migrations", e))?;
        Ok(applied.iter().map(|m| m.to_string()).collect())
    })
    .await
}

/// Names of embedded migrations not yet applied.
pub async fn pending_migrations(database_url: String) -> AppResult<Vec<String>> {
    with_migration_connection(database_url, |conn| {
        let pending = conn
            .pending_migrations(MIGRATIONS)
            .map_err(|e| migration_error("check pending migrations", e))?;
        Ok(pending.iter().map(|m| m.name().to_string()).collect())
    })
    .await
}

/// Reverts the last `steps` applied migrations, newest first.
pub async fn revert_migrations(database_url: String, steps: u32) -> AppResult<Vec<String>> {
    with_migration_connection(database_url, move |conn| {
        let applied = conn
            .applied_migrations()
            .map_err(|e| migration_error("list applied migrations", e))?;

        if applied.len() < steps as usize {
            return Err(AppError::Validation {
                field: "rollback".to_string(),
                reason: format!(
                    "Cannot roll back {} migration(s): only {} applied",
                    steps,
                    applied.len()
                ),
            });
        }

        (0..steps)
            .map(|_| {
                conn.revert_last_migration(MIGRATIONS)
                    .map(|version| version.to_string())
                    .map_err(|e| migration_error("revert migration", e))
            })
            .collect()
    })
    .await
}

//! `migrate`: apply, preview or roll back the embedded migrations

use crate::config::settings::Settings;
use crate::db;
use crate::error::AppResult;

pub struct MigrateCommandHandler {
    config: Settings,
}

impl MigrateCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// # Arguments
    /// * `dry_run` - List pending migrations without applying them
    /// * `rollback` - Revert this many of the most recent migrations
    ///
    /// # Errors
    /// - Invalid database configuration
    /// - Connection or migration failures
    pub async fn execute(&self, dry_run: bool, rollback: Option<u32>) -> AppResult<()> {
        self.config.database.validate()?;
        let url = self.config.database.url.clone();

        if dry_run {
            let pending = db::pending_migrations(url).await?;
            if pending.is_empty() {
                println!("✓ No pending migrations - database is up to date");
            } else {
                println!("Found {} pending migration(s):", pending.len());
                print_names(&pending);
                println!("\nRun without --dry-run to apply them");
            }
            return Ok(());
        }

        if let Some(steps) = rollback {
            println!("Rolling back {} migration(s)...", steps);
            let reverted = db::revert_migrations(url, steps).await?;
            println!("✓ Rolled back {} migration(s):", reverted.len());
            print_names(&reverted);
            return Ok(());
        }

        println!("Running database migrations...");
        let applied = db::run_pending_migrations(url).await?;
        if applied.is_empty() {
            println!("✓ No migrations to apply - database is already up to date");
        } else {
            println!("✓ Applied {} migration(s):", applied.len());
            print_names(&applied);
        }
        Ok(())
    }
}

fn print_names(names: &[String]) {
    for name in names {
        println!("  - {}", name);
    }
}

//! Dispatch of parsed CLI commands

use super::handlers::{MigrateCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};

/// What `main` should do once a command has been handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Start the HTTP server with the merged settings
    StartServer,
    /// The command ran to completion
    Done,
}

/// Runs the selected command.
///
/// `serve` without `--dry-run` (or no subcommand at all) is left to the
/// caller, which owns the server lifecycle.
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<CommandOutcome> {
    cli.validate().map_err(|reason| AppError::Validation {
        field: "cli_arguments".to_string(),
        reason,
    })?;

    match &cli.command {
        Some(Commands::Serve { dry_run: true, .. }) => {
            ServeCommandHandler::new(settings).validate_only()?;
            Ok(CommandOutcome::Done)
        }
        Some(Commands::Serve { .. }) | None => Ok(CommandOutcome::StartServer),
        Some(Commands::Migrate { dry_run, rollback }) => {
            if let Some(steps) = rollback
                && *steps > 50
            {
                tracing::warn!(steps, "Rolling back a large number of migrations");
            }
            MigrateCommandHandler::new(settings)
                .execute(*dry_run, *rollback)
                .await?;
            Ok(CommandOutcome::Done)
        }
    }
}

//! CLI argument parsing with clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::build;

/// Loyalty business service
#[derive(Parser, Debug)]
#[command(name = "loyalty-rs")]
#[command(about = "Stamp cards, prizes, coupons and CRM for loyalty businesses")]
#[command(long_about = "
loyalty-rs serves the business-facing loyalty API: stamps, prizes, coupons,
the CRM member list and dashboard analytics. Member identities live in a
separate user-service that this process calls with a service token.

EXAMPLES:
    # Start the server with layered configuration from ./config
    loyalty-rs serve

    # Bind to all interfaces on port 8080
    loyalty-rs serve --host 0.0.0.0 --port 8080

    # Use one configuration file instead of the layered directory
    loyalty-rs --config /etc/loyalty/production.toml serve

    # Check configuration without starting the server
    loyalty-rs serve --dry-run

    # Apply, preview or roll back database migrations
    loyalty-rs migrate
    loyalty-rs migrate --dry-run
    loyalty-rs migrate --rollback 1

Every setting can also be given as a LOYALTY_* environment variable, with
`__` between nested keys (LOYALTY_USER_SERVICE__BASE_URL).
")]
#[command(version = build::CLAP_LONG_VERSION)]
pub struct Cli {
    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Load this single TOML file instead of the layered `config/` directory.
    /// LOYALTY_* environment variables still override it.
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects which `{environment}.toml` layer is loaded.
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log errors only
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Host address to bind to
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// Port number to listen on
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Log level override, taking precedence over --verbose/--quiet
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        #[arg(long)]
        dry_run: bool,
    },
    /// Database migration operations
    Migrate {
        /// List pending migrations without applying them
        #[arg(long, conflicts_with = "rollback")]
        dry_run: bool,

        /// Revert this many of the most recent migrations (1-100)
        #[arg(long, value_name = "STEPS", conflicts_with = "dry_run", value_parser = super::validation::validate_rollback_steps)]
        rollback: Option<u32>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "production", alias = "prod")]
    Production,
    #[value(name = "test")]
    Test,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Cli {
    /// Cross-argument checks for a `Cli` built without clap.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(Commands::Migrate {
            dry_run: true,
            rollback: Some(_),
        }) = self.command
        {
            return Err("--dry-run cannot be combined with --rollback".to_string());
        }

        if self.verbose && self.quiet {
            return Err("--verbose cannot be combined with --quiet".to_string());
        }

        Ok(())
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Production => crate::config::Environment::Production,
            Environment::Test => crate::config::Environment::Test,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["loyalty-rs", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["loyalty-rs"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
        assert!(cli.env.is_none());
    }

    #[test]
    fn test_serve_command() {
        let cli = Cli::try_parse_from([
            "loyalty-rs",
            "--env",
            "prod",
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--log-level",
            "warning",
        ])
        .unwrap();

        assert_eq!(cli.env, Some(Environment::Production));
        match cli.command {
            Some(Commands::Serve {
                host,
                port,
                log_level,
                dry_run,
            }) => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(8080));
                assert_eq!(log_level, Some(LogLevel::Warn));
                assert!(!dry_run);
            }
            other => panic!("Expected Serve command, got {:?}", other),
        }
    }

    #[test]
    fn test_migrate_flags_conflict() {
        let err = Cli::try_parse_from(["loyalty-rs", "migrate", "--dry-run", "--rollback", "1"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);

        let cli = Cli::try_parse_from(["loyalty-rs", "migrate", "--rollback", "2"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Migrate {
                dry_run: false,
                rollback: Some(2)
            })
        ));
    }

    #[test]
    fn test_rollback_bounds_are_enforced() {
        assert!(Cli::try_parse_from(["loyalty-rs", "migrate", "--rollback", "0"]).is_err());
        assert!(Cli::try_parse_from(["loyalty-rs", "migrate", "--rollback", "101"]).is_err());
    }

    #[test]
    fn test_conflicting_verbose_quiet() {
        let err = Cli::try_parse_from(["loyalty-rs", "--verbose", "--quiet"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}

//! Merging of CLI overrides into file-based configuration
//!
//! Precedence, highest first: subcommand flags, global flags, `LOYALTY_*`
//! environment variables, configuration files.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, settings::Settings};

pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Loads the base configuration selected by `--config` and `--env`.
    ///
    /// Without `--config` the layered loader reads the configuration
    /// directory (or `LOYALTY_CONFIG_FILE`).
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let loader = match &cli.config {
            Some(path) => ConfigLoader::from_file(path.clone()),
            None => ConfigLoader::new()?,
        };

        let loader = match cli.env {
            Some(env) => loader.with_environment(env.into()),
            None => loader,
        };

        Ok(Self::new(loader.load()?))
    }

    /// Applies CLI overrides to a copy of the base configuration and
    /// validates the result.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(Commands::Serve {
            host,
            port,
            log_level,
            ..
        }) = &cli.command
        {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            // Takes precedence over --verbose/--quiet
            if let Some(level) = log_level {
                config.logger.level = level.as_str().to_string();
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

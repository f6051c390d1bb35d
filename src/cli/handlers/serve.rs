//! `serve --dry-run`: validate configuration and report what would start

use crate::config::settings::Settings;
use crate::error::AppResult;

pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Validates the configuration and prints a summary without binding.
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;

        for line in self.summary() {
            println!("✓ {}", line);
        }
        println!("Dry run completed successfully - configuration is ready for deployment");
        Ok(())
    }

    /// Human-readable summary of the effective configuration. Secrets are
    /// reported only as present or absent.
    fn summary(&self) -> Vec<String> {
        let config = &self.config;
        let token_verification = match (&config.auth.jwks_url, &config.auth.hs256_secret) {
            (Some(url), _) => format!("JWKS ({})", url),
            (None, Some(_)) => "shared HS256 secret".to_string(),
            (None, None) => "not configured".to_string(),
        };

        vec![
            "Configuration is valid".to_string(),
            format!("Server would bind to: {}", config.server.address()),
            format!(
                "Database pool: {}-{} connections, auto-migrate: {}",
                config.database.min_connections,
                config.database.max_connections,
                config.database.auto_migrate
            ),
            format!("Token verification: {}", token_verification),
            format!("User-service: {}", config.user_service.base_url),
            format!(
                "Service credentials: {}",
                if config.user_service.oauth.client_secret.is_some() {
                    "configured"
                } else {
                    "missing"
                }
            ),
            format!("Log level: {}", config.logger.level),
        ]
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

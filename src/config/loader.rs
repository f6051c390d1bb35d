//! Layered settings loading
//!
//! Sources, lowest priority first:
//! 1. `default.toml` (required)
//! 2. `{environment}.toml`
//! 3. `local.toml`, never committed
//! 4. `LOYALTY_*` environment variables, `__` between nested keys
//!
//! A single file (`LOYALTY_CONFIG_FILE` or `--config`) replaces the three
//! file layers; environment variables still apply on top of it.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

const CONFIG_DIR_ENV: &str = "LOYALTY_CONFIG_DIR";
const CONFIG_FILE_ENV: &str = "LOYALTY_CONFIG_FILE";
const DEFAULT_CONFIG_DIR: &str = "config";
const ENV_PREFIX: &str = "LOYALTY";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    /// Set in single-file mode
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Builds a loader from `LOYALTY_CONFIG_DIR`, `LOYALTY_CONFIG_FILE` and
    /// `LOYALTY_APP_ENV`.
    ///
    /// # Errors
    ///
    /// `MutualExclusivityError` when both the directory and the file variable
    /// are set.
    pub fn new() -> Result<Self, ConfigError> {
        let dir_var = std::env::var(CONFIG_DIR_ENV).ok();
        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if dir_var.is_some() && config_file.is_some() {
            return Err(ConfigError::mutual_exclusivity(format!(
                "{} and {} cannot both be set; pick layered loading or a single file",
                CONFIG_DIR_ENV, CONFIG_FILE_ENV
            )));
        }

        Ok(Self {
            config_dir: dir_var
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            config_file,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Loader for a single configuration file named on the command line.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: Some(path.into()),
            environment: AppEnvironment::from_env(),
        }
    }

    /// Overrides the environment detected from `LOYALTY_APP_ENV`.
    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    /// Reads every source, deserializes and validates the result.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let settings: Settings = self.build_config()?.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = match &self.config_file {
            Some(file) => add_toml(Config::builder(), file, true)?,
            None => {
                let env_file = format!("{}.toml", self.environment.as_str());
                let builder = add_toml(Config::builder(), &self.config_dir.join("default.toml"), true)?;
                let builder = add_toml(builder, &self.config_dir.join(env_file), false)?;
                add_toml(builder, &self.config_dir.join("local.toml"), false)?
            }
        };

        // LOYALTY_USER_SERVICE__OAUTH__CLIENT_ID -> user_service.oauth.client_id
        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator(ENV_SEPARATOR)
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()
            .map_err(ConfigError::from)
    }
}

fn add_toml(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
    required: bool,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if required && !path.exists() {
        return Err(ConfigError::file_not_found(path.display().to_string()));
    }

    Ok(builder.add_source(
        File::new(path.to_str().unwrap_or_default(), FileFormat::Toml).required(required),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::CustomerCountSource;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Tests touch process-wide env vars, so they run one at a time
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    const BASE_CONFIG: &str = r#"
[application]
name = "loyalty-test"
version = "1.0.0"

[server]
host = "127.0.0.1"
port = 3000

[database]
url = "postgres://localhost/loyalty_test"

[logger]
level = "info"

[auth]
hs256_secret = "0123456789abcdef0123456789abcdef"

[user_service]
base_url = "http://user-service:4000"
"#;

    fn setup_config_dir(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        for (name, content) in files {
            fs::write(temp_dir.path().join(name), content).expect("Failed to write config file");
        }
        temp_dir
    }

    /// Restores every touched env var on drop
    struct EnvGuard {
        vars_to_restore: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self {
                vars_to_restore: Vec::new(),
            }
        }

        fn set(&mut self, key: &str, value: &str) {
            self.vars_to_restore
                .push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::set_var(key, value);
            }
        }

        fn remove(&mut self, key: &str) {
            self.vars_to_restore
                .push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, original_value) in self.vars_to_restore.iter().rev() {
                unsafe {
                    match original_value {
                        Some(value) => std::env::set_var(key, value),
                        None => std::env::remove_var(key),
                    }
                }
            }
        }
    }

    fn use_dir(env: &mut EnvGuard, dir: &TempDir) {
        env.set("LOYALTY_CONFIG_DIR", dir.path().to_str().unwrap());
        env.remove("LOYALTY_CONFIG_FILE");
    }

    #[test]
    fn test_config_loader_new_default() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.remove("LOYALTY_CONFIG_DIR");
        env.remove("LOYALTY_CONFIG_FILE");
        env.remove("LOYALTY_APP_ENV");

        let loader = ConfigLoader::new().expect("Should create loader");
        assert_eq!(loader.config_dir, PathBuf::from("config"));
        assert!(loader.config_file.is_none());
        assert_eq!(loader.environment, AppEnvironment::Development);
    }

    #[test]
    fn test_config_loader_mutual_exclusivity_error() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.set("LOYALTY_CONFIG_DIR", "/custom/config");
        env.set("LOYALTY_CONFIG_FILE", "/path/to/config.toml");

        match ConfigLoader::new() {
            Err(ConfigError::MutualExclusivityError(msg)) => {
                assert!(msg.contains("LOYALTY_CONFIG_DIR"));
                assert!(msg.contains("LOYALTY_CONFIG_FILE"));
            }
            other => panic!("Expected MutualExclusivityError, got {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_default_toml() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[]);
        use_dir(&mut env, &temp_dir);
        env.remove("LOYALTY_APP_ENV");

        let result = ConfigLoader::new().unwrap().load();
        match result {
            Err(ConfigError::FileNotFound(msg)) => assert!(msg.contains("default.toml")),
            other => panic!("Expected FileNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_default_toml_only() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[("default.toml", BASE_CONFIG)]);
        use_dir(&mut env, &temp_dir);
        env.set("LOYALTY_APP_ENV", "test"); // no test.toml in the temp dir

        let settings = ConfigLoader::new().unwrap().load().expect("Should load settings");

        assert_eq!(settings.application.name, "loyalty-test");
        assert_eq!(settings.user_service.base_url, "http://user-service:4000");
        assert_eq!(settings.loyalty.coupon_validity_days, 30);
        assert_eq!(settings.counter_sync.max_retries, 3);
    }

    #[test]
    fn test_load_full_precedence_chain() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();

        let production_config = r#"
[server]
port = 8080

[analytics]
customer_count_source = "local"
"#;
        let local_config = r#"
[server]
port = 9090

[loyalty]
coupon_validity_days = 14
"#;
        let temp_dir = setup_config_dir(&[
            ("default.toml", BASE_CONFIG),
            ("production.toml", production_config),
            ("local.toml", local_config),
        ]);
        use_dir(&mut env, &temp_dir);
        env.set("LOYALTY_APP_ENV", "production");
        env.set(
            "LOYALTY_USER_SERVICE__OAUTH__CLIENT_SECRET",
            "from-the-environment",
        );
        env.set("LOYALTY_DATABASE__URL", "postgres://env-override/db");

        let settings = ConfigLoader::new().unwrap().load().expect("Should load settings");

        assert_eq!(settings.server.port, 9090);
        assert_eq!(
            settings.analytics.customer_count_source,
            CustomerCountSource::Local
        );
        assert_eq!(settings.loyalty.coupon_validity_days, 14);
        assert_eq!(settings.database.url, "postgres://env-override/db");
        assert_eq!(
            settings.user_service.oauth.client_secret.as_deref(),
            Some("from-the-environment")
        );
        assert_eq!(settings.server.host, "127.0.0.1");
    }

    #[test]
    fn test_load_single_file_mode() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[("single.toml", BASE_CONFIG)]);
        let config_file_path = temp_dir.path().join("single.toml");
        env.remove("LOYALTY_CONFIG_DIR");
        env.set("LOYALTY_CONFIG_FILE", config_file_path.to_str().unwrap());
        env.remove("LOYALTY_APP_ENV");

        let settings = ConfigLoader::new().unwrap().load().expect("Should load settings");
        assert_eq!(settings.database.url, "postgres://localhost/loyalty_test");
    }

    #[test]
    fn test_from_file_ignores_config_dir() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        let temp_dir = setup_config_dir(&[("cli.toml", BASE_CONFIG)]);
        env.set("LOYALTY_CONFIG_DIR", "/does/not/exist");
        env.remove("LOYALTY_CONFIG_FILE");
        env.remove("LOYALTY_APP_ENV");

        let loader = ConfigLoader::from_file(temp_dir.path().join("cli.toml"));
        assert_eq!(loader.environment(), AppEnvironment::Development);
        let settings = loader.load().expect("Should load settings");
        assert_eq!(settings.application.name, "loyalty-test");
    }

    #[test]
    fn test_load_rejects_invalid_settings() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        let broken = format!("{}\n[counter_sync]\nqueue_capacity = 0\n", BASE_CONFIG);
        let temp_dir = setup_config_dir(&[("default.toml", broken.as_str())]);
        use_dir(&mut env, &temp_dir);
        env.remove("LOYALTY_APP_ENV");

        let err = ConfigLoader::new().unwrap().load().unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError { field, .. } if field == "counter_sync.queue_capacity")
        );
    }
}

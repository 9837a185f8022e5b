//! Configuration loading and environment variable handling

use crate::domains::ProcwireConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "PROCWIRE".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<ProcwireConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: ProcwireConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<ProcwireConfig> {
        let mut config = ProcwireConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<ProcwireConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut ProcwireConfig) -> ConfigResult<()> {
        self.apply_logging_overrides(&mut config.logging)?;
        self.apply_signals_overrides(&mut config.signals)?;
        self.apply_messenger_overrides(&mut config.messenger)?;
        Ok(())
    }

    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(level) = self.get_env_var("LOG_LEVEL") {
            config.level = level.parse().map_err(ConfigError::EnvError)?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = format.parse().map_err(ConfigError::EnvError)?;
        }

        Ok(())
    }

    fn apply_signals_overrides(
        &self,
        config: &mut crate::domains::signals::SignalsConfig,
    ) -> ConfigResult<()> {
        if let Ok(code) = self.get_env_var("EXIT_CODE") {
            config.exit_code = self.parse_var("EXIT_CODE", &code)?;
        }

        if let Ok(terminate) = self.get_env_var("HANDLE_TERMINATE") {
            config.handle_terminate = self.parse_var("HANDLE_TERMINATE", &terminate)?;
        }

        Ok(())
    }

    fn apply_messenger_overrides(
        &self,
        config: &mut crate::domains::messenger::MessengerConfig,
    ) -> ConfigResult<()> {
        if let Ok(ms) = self.get_env_var("REPLY_TIMEOUT_MS") {
            config.reply_timeout = Duration::from_millis(self.parse_var("REPLY_TIMEOUT_MS", &ms)?);
        }

        if let Ok(ms) = self.get_env_var("SPAWN_TIMEOUT_MS") {
            config.spawn_timeout = Duration::from_millis(self.parse_var("SPAWN_TIMEOUT_MS", &ms)?);
        }

        if let Ok(ms) = self.get_env_var("SHUTDOWN_GRACE_MS") {
            config.shutdown_grace =
                Duration::from_millis(self.parse_var("SHUTDOWN_GRACE_MS", &ms)?);
        }

        if let Ok(policy) = self.get_env_var("CHILD_POLICY") {
            config.child_policy = policy.parse().map_err(ConfigError::EnvError)?;
        }

        Ok(())
    }

    fn parse_var<T>(&self, name: &str, value: &str) -> ConfigResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        value
            .parse()
            .map_err(|e| ConfigError::EnvError(format!("Invalid {}_{}: {}", self.prefix, name, e)))
    }

    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

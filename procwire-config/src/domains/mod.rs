//! Domain-specific configuration modules

pub mod logging;
pub mod messenger;
pub mod signals;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main procwire configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProcwireConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,

    /// Interrupt handling configuration
    #[serde(default)]
    pub signals: signals::SignalsConfig,

    /// Child process messenger configuration
    #[serde(default)]
    pub messenger: messenger::MessengerConfig,
}

impl ProcwireConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.logging.validate()?;
        self.signals.validate()?;
        self.messenger.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = ProcwireConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}

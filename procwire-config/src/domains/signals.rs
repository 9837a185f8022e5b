//! Interrupt handling configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Exit status reported after a user-requested interrupt
pub const DEFAULT_INTERRUPT_EXIT_CODE: i32 = 1;

/// Interrupt handling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalsConfig {
    /// Exit status used once the interrupt has been handled
    #[serde(default = "default_exit_code")]
    pub exit_code: i32,

    /// Treat SIGTERM like SIGINT (unix only)
    #[serde(default = "crate::domains::utils::default_false")]
    pub handle_terminate: bool,

    /// Emit a debug heartbeat while idle; disabled when unset
    #[serde(
        with = "crate::domains::utils::serde_duration_option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub keepalive_log_interval: Option<Duration>,
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            exit_code: default_exit_code(),
            handle_terminate: false,
            keepalive_log_interval: None,
        }
    }
}

impl Validatable for SignalsConfig {
    fn validate(&self) -> ConfigResult<()> {
        // Zero would read as a clean exit, 256+ gets truncated by the OS
        validate_positive(self.exit_code, "exit_code", self.domain_name())?;
        if self.exit_code > 255 {
            return Err(self.validation_error(format!(
                "exit_code must be at most 255, got {}",
                self.exit_code
            )));
        }

        if let Some(interval) = self.keepalive_log_interval {
            if interval.is_zero() {
                return Err(self.validation_error("keepalive_log_interval must be greater than zero"));
            }
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "signals"
    }
}

fn default_exit_code() -> i32 {
    DEFAULT_INTERRUPT_EXIT_CODE
}

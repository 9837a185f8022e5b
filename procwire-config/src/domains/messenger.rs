//! Child process messenger configuration

use crate::error::ConfigResult;
use crate::validation::{validate_non_zero_duration, Validatable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// What happens to the child once the parent is done with it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChildPolicy {
    /// Ask the child to stop, wait for it, kill it after the grace period.
    /// The child is also killed if the messenger is dropped.
    #[default]
    ReapOnExit,
    /// Close the channel and leave the child running on its own.
    Detach,
}

/// Messenger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessengerConfig {
    /// Upper bound for a single blocking receive
    #[serde(
        with = "crate::domains::utils::serde_duration_millis",
        default = "default_reply_timeout"
    )]
    pub reply_timeout: Duration,

    /// Upper bound for creating the child process
    #[serde(
        with = "crate::domains::utils::serde_duration_millis",
        default = "default_spawn_timeout"
    )]
    pub spawn_timeout: Duration,

    /// How long a reaped child gets to exit before it is killed
    #[serde(
        with = "crate::domains::utils::serde_duration_millis",
        default = "default_shutdown_grace"
    )]
    pub shutdown_grace: Duration,

    /// Child lifetime policy
    #[serde(default)]
    pub child_policy: ChildPolicy,
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            reply_timeout: default_reply_timeout(),
            spawn_timeout: default_spawn_timeout(),
            shutdown_grace: default_shutdown_grace(),
            child_policy: ChildPolicy::ReapOnExit,
        }
    }
}

impl ChildPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChildPolicy::ReapOnExit => "reap_on_exit",
            ChildPolicy::Detach => "detach",
        }
    }
}

impl fmt::Display for ChildPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChildPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "reap_on_exit" | "reap" => Ok(ChildPolicy::ReapOnExit),
            "detach" => Ok(ChildPolicy::Detach),
            _ => Err(format!("Invalid child policy: {}", s)),
        }
    }
}

impl Validatable for MessengerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_non_zero_duration(self.reply_timeout, "reply_timeout", self.domain_name())?;
        validate_non_zero_duration(self.spawn_timeout, "spawn_timeout", self.domain_name())?;
        validate_non_zero_duration(self.shutdown_grace, "shutdown_grace", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "messenger"
    }
}

fn default_reply_timeout() -> Duration {
    Duration::from_millis(5000)
}

fn default_spawn_timeout() -> Duration {
    Duration::from_millis(5000)
}

fn default_shutdown_grace() -> Duration {
    Duration::from_millis(500)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messenger_config_defaults() {
        let config = MessengerConfig::default();
        assert_eq!(config.reply_timeout, Duration::from_secs(5));
        assert_eq!(config.spawn_timeout, Duration::from_secs(5));
        assert_eq!(config.shutdown_grace, Duration::from_millis(500));
        assert_eq!(config.child_policy, ChildPolicy::ReapOnExit);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let config = MessengerConfig {
            reply_timeout: Duration::ZERO,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("reply_timeout"));
    }

    #[test]
    fn test_child_policy_from_str() {
        assert_eq!(ChildPolicy::from_str("detach").unwrap(), ChildPolicy::Detach);
        assert_eq!(ChildPolicy::from_str("Reap-On-Exit").unwrap(), ChildPolicy::ReapOnExit);
        assert!(ChildPolicy::from_str("orphan").is_err());
    }

    #[test]
    fn test_durations_deserialize_as_millis() {
        let config: MessengerConfig =
            serde_json::from_str(r#"{"reply_timeout": 250, "child_policy": "detach"}"#).unwrap();
        assert_eq!(config.reply_timeout, Duration::from_millis(250));
        assert_eq!(config.spawn_timeout, Duration::from_secs(5));
        assert_eq!(config.child_policy, ChildPolicy::Detach);
    }
}

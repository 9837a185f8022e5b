//! Configuration validation traits and utilities

use crate::error::{ConfigError, ConfigResult};
use std::time::Duration;

/// Trait for validatable configuration
pub trait Validatable {
    /// Validate the configuration
    fn validate(&self) -> ConfigResult<()>;

    /// Get the domain name for error reporting
    fn domain_name(&self) -> &'static str;

    /// Helper to create a domain-specific validation error
    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::DomainError {
            domain: self.domain_name().to_string(),
            message: message.into(),
        }
    }
}

/// Validate a positive number
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value <= T::default() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be greater than 0, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate a non-zero duration
pub fn validate_non_zero_duration(value: Duration, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.is_zero() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be greater than zero", field_name),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive(5u64, "count", "test").is_ok());
        assert!(validate_positive(0u64, "count", "test").is_err());
        assert!(validate_positive(-1i32, "code", "test").is_err());
    }

    #[test]
    fn test_validate_non_zero_duration() {
        assert!(validate_non_zero_duration(Duration::from_millis(1), "timeout", "test").is_ok());
        assert!(validate_non_zero_duration(Duration::ZERO, "timeout", "test").is_err());
    }
}

//! Domain-driven configuration management for procwire
//!
//! Configuration is split by functional domain (logging, signals, messenger),
//! each with its own defaults and validation, and can be loaded from a YAML
//! file with `PROCWIRE_*` environment variable overrides.

pub mod domains;
pub mod error;
pub mod loader;
pub mod validation;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    logging::{LogFormat, LogLevel, LoggingConfig},
    messenger::{ChildPolicy, MessengerConfig},
    signals::SignalsConfig,
    ProcwireConfig,
};

// Re-export utilities
pub use domains::utils::{serde_duration_millis, serde_duration_option};

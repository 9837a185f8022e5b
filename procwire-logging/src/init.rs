use anyhow::Result;
use procwire_config::{LogFormat, LoggingConfig};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Where formatted log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogWriter {
    Stdout,
    Stderr,
}

impl LogWriter {
    fn make_writer(self) -> BoxMakeWriter {
        match self {
            LogWriter::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogWriter::Stderr => BoxMakeWriter::new(std::io::stderr),
        }
    }
}

/// Resolve the filter: explicit override, then `RUST_LOG`, then the configured level.
pub fn build_env_filter(config: &LoggingConfig, level_override: Option<&str>) -> EnvFilter {
    match level_override {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| {
            eprintln!(
                "Invalid log level '{}', falling back to '{}'",
                level, config.level
            );
            EnvFilter::new(config.level.to_string())
        }),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.to_string())),
    }
}

/// Initialize the global subscriber from configuration
pub fn init_logging(
    config: &LoggingConfig,
    level_override: Option<&str>,
    writer: LogWriter,
) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(config, level_override))
        .with_writer(writer.make_writer())
        .with_target(config.include_target);

    let result = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    // A subscriber may already be installed
    if result.is_err() {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

/// Initialize tracing for the child side of a messenger channel (stderr only)
pub fn init_child_logging(config: &LoggingConfig, level_override: Option<&str>) -> Result<()> {
    init_logging(config, level_override, LogWriter::Stderr)?;
    tracing::debug!("Child tracing initialized");
    Ok(())
}

use anyhow::{Context, Result};
use procwire_config::SignalsConfig;
use procwire_signals::wait_for_interrupt;

/// Park until SIGINT, log it once, exit with the configured status
pub async fn run(config: &SignalsConfig) -> Result<()> {
    let termination = wait_for_interrupt(config)
        .await
        .context("Failed to wait for interrupt signal")?;

    termination.exit()
}

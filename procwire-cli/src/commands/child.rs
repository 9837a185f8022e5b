use anyhow::{Context, Result};
use procwire_messenger::{run_echo_child, ChildChannel};
use tracing::info;

/// Echo child: every message from the parent goes straight back
pub async fn run() -> Result<()> {
    info!("Child process {} started", std::process::id());

    let mut channel = ChildChannel::stdio();
    let summary = run_echo_child(&mut channel)
        .await
        .context("Echo child failed")?;

    info!(
        echoed = summary.echoed,
        shutdown_requested = summary.shutdown_requested,
        "Child process exiting"
    );
    Ok(())
}

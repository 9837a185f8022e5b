//! One-shot interrupt handler

use std::sync::Arc;
use std::time::Duration;

use procwire_config::SignalsConfig;
use tokio::time::{interval_at, Instant, Interval};
use tracing::{debug, info};

use crate::error::SignalError;
use crate::latch::ShutdownLatch;
use crate::source::{InterruptSource, OsSignalSource, SignalEvent, SignalKind};

/// Outcome of a handled interrupt: what to exit with
#[derive(Debug)]
pub struct Termination {
    pub exit_code: i32,
    pub signal: SignalKind,
    latch: Arc<ShutdownLatch>,
}

impl Termination {
    /// Mark the lifecycle terminated and exit the process
    pub fn exit(self) -> ! {
        self.latch.finish();
        std::process::exit(self.exit_code)
    }
}

/// Waits on an [`InterruptSource`] and handles the first accepted signal
pub struct InterruptHandler {
    config: SignalsConfig,
    latch: Arc<ShutdownLatch>,
}

impl InterruptHandler {
    pub fn new(config: SignalsConfig) -> Self {
        Self {
            config,
            latch: Arc::new(ShutdownLatch::new()),
        }
    }

    /// Share the lifecycle latch, e.g. with other shutdown paths
    pub fn latch(&self) -> Arc<ShutdownLatch> {
        self.latch.clone()
    }

    fn accepts(&self, kind: SignalKind) -> bool {
        match kind {
            SignalKind::Interrupt => true,
            SignalKind::Terminate => self.config.handle_terminate,
        }
    }

    /// Park until an accepted signal arrives, then run `on_interrupt` once.
    ///
    /// Only the first accepted signal is handled. The caller decides when to
    /// call [`Termination::exit`].
    pub async fn run<S, F>(&self, source: &mut S, on_interrupt: F) -> Result<Termination, SignalError>
    where
        S: InterruptSource + ?Sized,
        F: FnOnce(&SignalEvent),
    {
        let mut heartbeat = self.config.keepalive_log_interval.map(heartbeat_interval);

        loop {
            let event = match heartbeat.as_mut() {
                Some(tick) => tokio::select! {
                    event = source.next_event() => event,
                    _ = tick.tick() => {
                        debug!("Still waiting for an interrupt signal");
                        continue;
                    }
                },
                None => source.next_event().await,
            };

            let Some(event) = event else {
                return Err(SignalError::SourceClosed);
            };

            if !self.accepts(event.kind) {
                debug!(signal = %event.kind, "Ignoring signal not configured for handling");
                continue;
            }

            if !self.latch.trigger() {
                debug!(signal = %event.kind, "Interrupt already being handled, ignoring");
                continue;
            }

            info!(signal = %event.kind, "We received the {} signal!", event.kind);
            on_interrupt(&event);

            return Ok(Termination {
                exit_code: self.config.exit_code,
                signal: event.kind,
                latch: self.latch.clone(),
            });
        }
    }
}

fn heartbeat_interval(period: Duration) -> Interval {
    // First tick one full period from now, not immediately
    interval_at(Instant::now() + period, period)
}

/// Register with the OS and park until the process is interrupted
pub async fn wait_for_interrupt(config: &SignalsConfig) -> Result<Termination, SignalError> {
    let mut source = OsSignalSource::new(config.handle_terminate)?;
    let handler = InterruptHandler::new(config.clone());

    info!("Running...");
    handler.run(&mut source, |_| {}).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latch::LifecycleState;
    use crate::source::ChannelSource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn handler() -> InterruptHandler {
        InterruptHandler::new(SignalsConfig::default())
    }

    #[tokio::test]
    async fn test_single_interrupt_is_handled_once_with_exit_code_one() {
        let handler = handler();
        let (raiser, mut source) = ChannelSource::new();
        raiser.raise(SignalKind::Interrupt);

        let calls = AtomicUsize::new(0);
        let termination = handler
            .run(&mut source, |event| {
                assert_eq!(event.kind, SignalKind::Interrupt);
                calls.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(termination.exit_code, 1);
        assert_eq!(termination.signal, SignalKind::Interrupt);
        assert_eq!(handler.latch().state(), LifecycleState::Handling);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_interrupt_keeps_waiting() {
        let handler = handler();
        let (raiser, mut source) = ChannelSource::new();

        let waited = tokio::time::timeout(
            Duration::from_secs(3600),
            handler.run(&mut source, |_| panic!("no signal was raised")),
        )
        .await;

        assert!(waited.is_err());
        assert!(handler.latch().is_idle());
        drop(raiser);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_never_ends_the_wait() {
        let config = SignalsConfig {
            keepalive_log_interval: Some(Duration::from_secs(1)),
            ..Default::default()
        };
        let handler = InterruptHandler::new(config);
        let (raiser, mut source) = ChannelSource::new();

        let waited =
            tokio::time::timeout(Duration::from_secs(30), handler.run(&mut source, |_| {})).await;
        assert!(waited.is_err());

        // Still responsive after many heartbeats
        raiser.raise(SignalKind::Interrupt);
        let termination = handler.run(&mut source, |_| {}).await.unwrap();
        assert_eq!(termination.exit_code, 1);
    }

    #[tokio::test]
    async fn test_burst_of_interrupts_runs_handler_once() {
        let handler = handler();
        let (raiser, mut source) = ChannelSource::new();
        for _ in 0..3 {
            raiser.raise(SignalKind::Interrupt);
        }

        let calls = AtomicUsize::new(0);
        handler
            .run(&mut source, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();

        // A second waiter on the same latch never fires
        let second = tokio::time::timeout(
            Duration::from_millis(50),
            handler.run(&mut source, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .await;

        assert!(second.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_terminate_ignored_unless_configured() {
        let handler = handler();
        let (raiser, mut source) = ChannelSource::new();
        raiser.raise(SignalKind::Terminate);
        raiser.raise(SignalKind::Interrupt);

        let termination = handler.run(&mut source, |_| {}).await.unwrap();
        assert_eq!(termination.signal, SignalKind::Interrupt);

        let handler = InterruptHandler::new(SignalsConfig {
            handle_terminate: true,
            exit_code: 143,
            ..Default::default()
        });
        raiser.raise(SignalKind::Terminate);
        let termination = handler.run(&mut source, |_| {}).await.unwrap();
        assert_eq!(termination.signal, SignalKind::Terminate);
        assert_eq!(termination.exit_code, 143);
    }

    #[tokio::test]
    async fn test_closed_source_is_an_error() {
        let handler = handler();
        let (raiser, mut source) = ChannelSource::new();
        drop(raiser);

        let err = handler.run(&mut source, |_| {}).await.unwrap_err();
        assert!(matches!(err, SignalError::SourceClosed));
        assert!(handler.latch().is_idle());
    }
}

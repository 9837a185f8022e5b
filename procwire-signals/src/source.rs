//! Where interrupt notifications come from

use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc;

use crate::error::SignalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Interactive interrupt (SIGINT, Ctrl+C)
    Interrupt,
    /// Termination request (SIGTERM)
    Terminate,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Interrupt => f.write_str("SIGINT"),
            SignalKind::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// A single delivered notification; carries nothing but its kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalEvent {
    pub kind: SignalKind,
}

impl SignalEvent {
    pub fn interrupt() -> Self {
        Self {
            kind: SignalKind::Interrupt,
        }
    }

    pub fn terminate() -> Self {
        Self {
            kind: SignalKind::Terminate,
        }
    }
}

/// A stream of signal events.
///
/// `next_event` must be cancel safe: dropping the future before it resolves
/// must not lose an event.
#[async_trait]
pub trait InterruptSource: Send {
    /// Wait for the next event. `None` means nothing will ever arrive again.
    async fn next_event(&mut self) -> Option<SignalEvent>;
}

/// Process-wide OS signal registration.
///
/// Create it once during startup. The registration lives until the process
/// exits, and while it exists SIGINT no longer kills the process by default.
pub struct OsSignalSource {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: Option<tokio::signal::unix::Signal>,
    #[cfg(windows)]
    interrupt: tokio::signal::windows::CtrlC,
}

impl OsSignalSource {
    #[cfg(unix)]
    pub fn new(handle_terminate: bool) -> Result<Self, SignalError> {
        use tokio::signal::unix::{signal, SignalKind as UnixSignalKind};

        let interrupt = signal(UnixSignalKind::interrupt())?;
        let terminate = if handle_terminate {
            Some(signal(UnixSignalKind::terminate())?)
        } else {
            None
        };

        Ok(Self {
            interrupt,
            terminate,
        })
    }

    #[cfg(windows)]
    pub fn new(_handle_terminate: bool) -> Result<Self, SignalError> {
        Ok(Self {
            interrupt: tokio::signal::windows::ctrl_c()?,
        })
    }
}

#[async_trait]
impl InterruptSource for OsSignalSource {
    #[cfg(unix)]
    async fn next_event(&mut self) -> Option<SignalEvent> {
        match self.terminate.as_mut() {
            Some(terminate) => tokio::select! {
                received = self.interrupt.recv() => received.map(|_| SignalEvent::interrupt()),
                received = terminate.recv() => received.map(|_| SignalEvent::terminate()),
            },
            None => self
                .interrupt
                .recv()
                .await
                .map(|_| SignalEvent::interrupt()),
        }
    }

    #[cfg(windows)]
    async fn next_event(&mut self) -> Option<SignalEvent> {
        self.interrupt.recv().await.map(|_| SignalEvent::interrupt())
    }
}

/// In-memory source; events are raised through the paired [`SignalRaiser`]
pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<SignalEvent>,
}

/// Sending side of a [`ChannelSource`]. Dropping every raiser closes the source.
#[derive(Clone)]
pub struct SignalRaiser {
    tx: mpsc::UnboundedSender<SignalEvent>,
}

impl ChannelSource {
    pub fn new() -> (SignalRaiser, ChannelSource) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SignalRaiser { tx }, ChannelSource { rx })
    }
}

impl SignalRaiser {
    /// Returns `false` if the source is gone
    pub fn raise(&self, kind: SignalKind) -> bool {
        self.tx.send(SignalEvent { kind }).is_ok()
    }
}

#[async_trait]
impl InterruptSource for ChannelSource {
    async fn next_event(&mut self) -> Option<SignalEvent> {
        self.rx.recv().await
    }
}

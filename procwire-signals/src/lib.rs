//! Interrupt handling for procwire
//!
//! A process registers for the interrupt signal once at startup, parks on the
//! registration until a signal arrives, runs its handler exactly once and
//! exits with a fixed status. Signals that arrive while the first one is
//! being handled are ignored.

pub mod error;
pub mod handler;
pub mod latch;
pub mod source;

pub use error::SignalError;
pub use handler::{wait_for_interrupt, InterruptHandler, Termination};
pub use latch::{LifecycleState, ShutdownLatch};
pub use source::{ChannelSource, InterruptSource, OsSignalSource, SignalEvent, SignalKind, SignalRaiser};

//! Messenger error types

use std::time::Duration;

use procwire_ipc::IpcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessengerError {
    /// The child process could not be created
    #[error("Failed to spawn child process: {0}")]
    SpawnFailed(String),

    /// The channel ended before the expected message
    #[error("Channel to child process closed")]
    ChannelClosed,

    /// A bounded wait ran out
    #[error("Timed out after {after:?} waiting for {operation}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Protocol or serialization failure on the channel
    #[error("IPC error: {0}")]
    Ipc(IpcError),

    /// Waiting on or killing the child failed
    #[error("Child process error: {0}")]
    ChildError(String),
}

impl From<IpcError> for MessengerError {
    fn from(err: IpcError) -> Self {
        match err {
            IpcError::ConnectionClosed => MessengerError::ChannelClosed,
            other => MessengerError::Ipc(other),
        }
    }
}

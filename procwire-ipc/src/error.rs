//! IPC error types

use thiserror::Error;

/// IPC error types
#[derive(Debug, Error)]
pub enum IpcError {
    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Connection closed
    #[error("Connection closed")]
    ConnectionClosed,

    /// Protocol version mismatch
    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    ProtocolVersionMismatch { expected: u32, actual: u32 },

    /// Invalid message format
    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    /// Transport not connected
    #[error("Transport not connected")]
    NotConnected,
}

impl IpcError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IpcError::IoError(_) | IpcError::ConnectionClosed
        )
    }

    /// Check if this error indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            IpcError::ProtocolVersionMismatch { .. } | IpcError::InvalidMessage(_)
        )
    }
}

impl From<std::io::Error> for IpcError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::UnexpectedEof => {
                IpcError::ConnectionClosed
            }
            _ => IpcError::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for IpcError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            IpcError::IoError(err.to_string())
        } else if err.is_data() || err.is_syntax() || err.is_eof() {
            IpcError::DeserializationError(err.to_string())
        } else {
            IpcError::SerializationError(err.to_string())
        }
    }
}

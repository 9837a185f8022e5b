//! IPC protocol definitions and message types

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::IpcError;

/// IPC protocol version for compatibility checking
pub const IPC_PROTOCOL_VERSION: u32 = 1;

/// Packets exchanged in both directions over the channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Packet {
    /// One application message. `seq` starts at 0 per sender.
    Message { seq: u64, body: JsonValue },

    /// Parent asks the child to stop reading and exit
    Shutdown,
}

impl Packet {
    /// Build a message packet from any serializable body
    pub fn message<T: Serialize>(seq: u64, body: &T) -> Result<Self, IpcError> {
        let body = serde_json::to_value(body)
            .map_err(|e| IpcError::SerializationError(e.to_string()))?;
        Ok(Packet::Message { seq, body })
    }

    /// Sequence number, if this is a message packet
    pub fn seq(&self) -> Option<u64> {
        match self {
            Packet::Message { seq, .. } => Some(*seq),
            Packet::Shutdown => None,
        }
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(self, Packet::Shutdown)
    }

    /// Decode the body of a message packet into `T`
    pub fn decode_body<T: DeserializeOwned>(&self) -> Result<T, IpcError> {
        match self {
            Packet::Message { body, .. } => serde_json::from_value(body.clone())
                .map_err(|e| IpcError::DeserializationError(e.to_string())),
            Packet::Shutdown => Err(IpcError::InvalidMessage(
                "shutdown packet has no body".to_string(),
            )),
        }
    }
}

/// Message envelope for all IPC communications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope<T> {
    pub protocol_version: u32,
    pub timestamp: DateTime<Utc>,
    pub message: T,
}

impl<T> MessageEnvelope<T> {
    /// Create a new message envelope
    pub fn new(message: T) -> Self {
        Self {
            protocol_version: IPC_PROTOCOL_VERSION,
            timestamp: Utc::now(),
            message,
        }
    }

    /// Check if protocol version is compatible
    pub fn is_compatible(&self) -> bool {
        self.protocol_version == IPC_PROTOCOL_VERSION
    }

    /// Reject envelopes from a peer speaking another protocol version
    pub fn ensure_compatible(self) -> Result<Self, IpcError> {
        if self.is_compatible() {
            Ok(self)
        } else {
            Err(IpcError::ProtocolVersionMismatch {
                expected: IPC_PROTOCOL_VERSION,
                actual: self.protocol_version,
            })
        }
    }
}

//! Inter-process communication for procwire
//!
//! This crate provides the wire protocol and transport used between a parent
//! process and the child it spawns. Messages travel as one JSON envelope per
//! line over the child's stdin (parent to child) and stdout (child to parent).

pub mod error;
pub mod protocol;
pub mod transport;

// Re-export commonly used types
pub use error::IpcError;
pub use protocol::{MessageEnvelope, Packet, IPC_PROTOCOL_VERSION};
pub use transport::{
    ChildProcessTransport, EnvelopeReader, EnvelopeWriter, IpcTransport, LineTransport,
    StdioTransport,
};

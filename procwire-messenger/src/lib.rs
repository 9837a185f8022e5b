//! Parent/child process messaging
//!
//! The parent side ([`Messenger`]) spawns a child with its stdin and stdout
//! wired to a private channel, sends messages without waiting for any
//! readiness handshake and receives replies in the order the child sent them.
//! The child side ([`ChildChannel`]) reads and writes the same channel from
//! its own stdio.

pub mod child;
pub mod command;
pub mod error;
pub mod messenger;

pub use child::{run_echo_child, ChildChannel, EchoSummary};
pub use command::{ChildCommand, CHILD_FLAG};
pub use error::MessengerError;
pub use messenger::{ChildExit, Inbound, Messenger};

pub use procwire_config::{ChildPolicy, MessengerConfig};

//! Child side of the channel

use procwire_ipc::{IpcError, IpcTransport, MessageEnvelope, Packet, StdioTransport};
use serde::Serialize;
use tracing::{debug, info, warn};

/// The child's end of the channel; stdio by default
pub struct ChildChannel<T = StdioTransport> {
    transport: T,
    next_seq: u64,
}

impl ChildChannel<StdioTransport> {
    pub fn stdio() -> Self {
        Self::new(StdioTransport::stdio())
    }
}

impl<T: IpcTransport> ChildChannel<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            next_seq: 0,
        }
    }

    /// Next packet from the parent, `None` once the parent closed the channel
    pub async fn recv(&mut self) -> Result<Option<Packet>, IpcError> {
        match self.transport.receive::<Packet>().await {
            Ok(envelope) => Ok(Some(envelope.message)),
            Err(IpcError::ConnectionClosed) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Forward a packet as-is
    pub async fn send(&mut self, packet: &Packet) -> Result<(), IpcError> {
        self.transport.send(&MessageEnvelope::new(packet)).await
    }

    /// Send a new message with the child's own sequence number
    pub async fn reply<B: Serialize>(&mut self, body: &B) -> Result<u64, IpcError> {
        let seq = self.next_seq;
        self.send(&Packet::message(seq, body)?).await?;
        self.next_seq += 1;
        Ok(seq)
    }

    pub async fn close(&mut self) -> Result<(), IpcError> {
        self.transport.close().await
    }
}

/// What an echo child did before it stopped
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EchoSummary {
    pub echoed: u64,
    pub shutdown_requested: bool,
}

/// Write every message packet back unchanged until shutdown or EOF
pub async fn run_echo_child<T: IpcTransport>(
    channel: &mut ChildChannel<T>,
) -> Result<EchoSummary, IpcError> {
    let mut summary = EchoSummary::default();

    loop {
        let packet = match channel.recv().await {
            Ok(Some(packet)) => packet,
            Ok(None) => {
                debug!("Parent closed the channel");
                break;
            }
            Err(IpcError::DeserializationError(e)) => {
                warn!("Skipping unreadable message from parent: {}", e);
                continue;
            }
            Err(e) => return Err(e),
        };

        match &packet {
            Packet::Message { seq, body } => {
                info!("Parent said: {} (seq {})", body, seq);
                channel.send(&packet).await?;
                summary.echoed += 1;
            }
            Packet::Shutdown => {
                debug!("Parent requested shutdown");
                summary.shutdown_requested = true;
                break;
            }
        }
    }

    channel.close().await?;
    Ok(summary)
}

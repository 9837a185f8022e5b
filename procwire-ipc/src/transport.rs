//! IPC transport implementations

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::error::IpcError;
use crate::protocol::MessageEnvelope;

/// IPC transport trait for different communication mechanisms
#[async_trait]
pub trait IpcTransport: Send {
    /// Send a message to the other end
    async fn send<T: Serialize + Send + Sync>(
        &mut self,
        message: &MessageEnvelope<T>,
    ) -> Result<(), IpcError>;

    /// Receive a message from the other end
    async fn receive<T: DeserializeOwned + Send>(&mut self) -> Result<MessageEnvelope<T>, IpcError>;

    /// Close the transport
    async fn close(&mut self) -> Result<(), IpcError>;
}

/// Reading half: one JSON envelope per line
pub struct EnvelopeReader<R> {
    reader: BufReader<R>,
    line: String,
}

impl<R: AsyncRead + Unpin + Send> EnvelopeReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            line: String::new(),
        }
    }

    /// Read the next envelope. Returns `Ok(None)` once the peer closed its end.
    ///
    /// Blank lines are skipped. A line that is not a valid envelope yields an
    /// error but leaves the reader usable for the following lines.
    pub async fn read_envelope<T: DeserializeOwned>(
        &mut self,
    ) -> Result<Option<MessageEnvelope<T>>, IpcError> {
        loop {
            self.line.clear();
            let read = self.reader.read_line(&mut self.line).await?;
            if read == 0 {
                return Ok(None);
            }

            let trimmed = self.line.trim_end();
            if trimmed.is_empty() {
                continue;
            }

            let envelope: MessageEnvelope<T> = serde_json::from_str(trimmed)
                .map_err(|e| IpcError::DeserializationError(e.to_string()))?;

            return envelope.ensure_compatible().map(Some);
        }
    }
}

/// Writing half: serializes and flushes one envelope per line
pub struct EnvelopeWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin + Send> EnvelopeWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { writer: inner }
    }

    pub async fn write_envelope<T: Serialize>(
        &mut self,
        message: &MessageEnvelope<T>,
    ) -> Result<(), IpcError> {
        let mut json = serde_json::to_string(message)
            .map_err(|e| IpcError::SerializationError(e.to_string()))?;

        // Send with newline delimiter
        json.push('\n');
        self.writer.write_all(json.as_bytes()).await?;
        self.writer.flush().await?;

        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), IpcError> {
        self.writer.flush().await?;
        Ok(())
    }

    /// Flush and close the underlying writer; the peer will see EOF
    pub async fn shutdown(&mut self) -> Result<(), IpcError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// Transport over any reader/writer pair
pub struct LineTransport<R, W> {
    reader: EnvelopeReader<R>,
    writer: EnvelopeWriter<W>,
}

/// Stdin/Stdout IPC transport, used on the child side of the channel
pub type StdioTransport = LineTransport<tokio::io::Stdin, tokio::io::Stdout>;

impl<R, W> LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: EnvelopeReader::new(reader),
            writer: EnvelopeWriter::new(writer),
        }
    }
}

impl StdioTransport {
    /// Create a transport over this process's stdin and stdout
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::stdio()
    }
}

#[async_trait]
impl<R, W> IpcTransport for LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send<T: Serialize + Send + Sync>(
        &mut self,
        message: &MessageEnvelope<T>,
    ) -> Result<(), IpcError> {
        self.writer.write_envelope(message).await
    }

    async fn receive<T: DeserializeOwned + Send>(&mut self) -> Result<MessageEnvelope<T>, IpcError> {
        self.reader
            .read_envelope()
            .await?
            .ok_or(IpcError::ConnectionClosed)
    }

    async fn close(&mut self) -> Result<(), IpcError> {
        self.writer.shutdown().await
    }
}

/// Child process transport, used on the parent side of the channel
pub struct ChildProcessTransport {
    writer: Option<EnvelopeWriter<tokio::process::ChildStdin>>,
    reader: Option<EnvelopeReader<tokio::process::ChildStdout>>,
}

impl ChildProcessTransport {
    /// Create a new child process transport
    pub fn new(stdin: tokio::process::ChildStdin, stdout: tokio::process::ChildStdout) -> Self {
        Self {
            writer: Some(EnvelopeWriter::new(stdin)),
            reader: Some(EnvelopeReader::new(stdout)),
        }
    }

    /// Take both halves so they can be driven from separate tasks
    pub fn into_split(
        self,
    ) -> Result<
        (
            EnvelopeWriter<tokio::process::ChildStdin>,
            EnvelopeReader<tokio::process::ChildStdout>,
        ),
        IpcError,
    > {
        match (self.writer, self.reader) {
            (Some(writer), Some(reader)) => Ok((writer, reader)),
            _ => Err(IpcError::NotConnected),
        }
    }
}

#[async_trait]
impl IpcTransport for ChildProcessTransport {
    async fn send<T: Serialize + Send + Sync>(
        &mut self,
        message: &MessageEnvelope<T>,
    ) -> Result<(), IpcError> {
        let writer = self.writer.as_mut().ok_or(IpcError::NotConnected)?;
        writer.write_envelope(message).await
    }

    async fn receive<T: DeserializeOwned + Send>(&mut self) -> Result<MessageEnvelope<T>, IpcError> {
        let reader = self.reader.as_mut().ok_or(IpcError::NotConnected)?;
        reader.read_envelope().await?.ok_or(IpcError::ConnectionClosed)
    }

    async fn close(&mut self) -> Result<(), IpcError> {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.shutdown().await {
                // The child may already be gone
                debug!("Closing child stdin failed: {}", e);
            }
        }
        if self.reader.take().is_none() {
            warn!("Child process transport closed twice");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Packet;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_envelopes_arrive_in_write_order() {
        let (client, server) = tokio::io::duplex(64);
        let mut writer = EnvelopeWriter::new(client);
        let mut reader = EnvelopeReader::new(server);

        // Small duplex buffer forces the reader to see partial lines
        let producer = tokio::spawn(async move {
            for seq in 0..5u64 {
                let packet = Packet::message(seq, &format!("message number {}", seq)).unwrap();
                writer.write_envelope(&MessageEnvelope::new(packet)).await.unwrap();
            }
            writer.shutdown().await.unwrap();
        });

        let mut seen = Vec::new();
        while let Some(envelope) = reader.read_envelope::<Packet>().await.unwrap() {
            seen.push(envelope.message.seq().unwrap());
        }
        producer.await.unwrap();

        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_eof_is_none_not_error() {
        let (client, server) = tokio::io::duplex(64);
        drop(client);

        let mut reader = EnvelopeReader::new(server);
        assert!(reader.read_envelope::<Packet>().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_garbage_line_does_not_poison_reader() {
        let (mut client, server) = tokio::io::duplex(1024);
        let good = serde_json::to_string(&MessageEnvelope::new(Packet::Shutdown)).unwrap();
        client
            .write_all(format!("not json\n\n{}\n", good).as_bytes())
            .await
            .unwrap();
        drop(client);

        let mut reader = EnvelopeReader::new(server);
        let err = reader.read_envelope::<Packet>().await.unwrap_err();
        assert!(matches!(err, IpcError::DeserializationError(_)));

        let envelope = reader.read_envelope::<Packet>().await.unwrap().unwrap();
        assert!(envelope.message.is_shutdown());
        assert!(reader.read_envelope::<Packet>().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_version_mismatch_rejected() {
        let (mut client, server) = tokio::io::duplex(1024);
        let mut envelope = MessageEnvelope::new(Packet::Shutdown);
        envelope.protocol_version = 99;
        let line = serde_json::to_string(&envelope).unwrap();
        client.write_all(format!("{}\n", line).as_bytes()).await.unwrap();

        let mut reader = EnvelopeReader::new(server);
        let err = reader.read_envelope::<Packet>().await.unwrap_err();
        assert!(matches!(
            err,
            IpcError::ProtocolVersionMismatch { expected: 1, actual: 99 }
        ));
    }

    #[tokio::test]
    async fn test_line_transport_receive_after_close_is_connection_closed() {
        let (ours, theirs) = tokio::io::duplex(1024);
        let (our_read, our_write) = tokio::io::split(ours);
        let (their_read, their_write) = tokio::io::split(theirs);

        let mut near = LineTransport::new(our_read, our_write);
        let mut far = LineTransport::new(their_read, their_write);

        near.send(&MessageEnvelope::new(Packet::message(0, &"ping").unwrap()))
            .await
            .unwrap();
        let got: MessageEnvelope<Packet> = far.receive().await.unwrap();
        assert_eq!(got.message.decode_body::<String>().unwrap(), "ping");

        near.close().await.unwrap();
        let err = far.receive::<Packet>().await.unwrap_err();
        assert!(matches!(err, IpcError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_child_process_transport_round_trip_through_cat() {
        let mut child = match tokio::process::Command::new("cat")
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            // No `cat` on this host
            Err(_) => return,
        };

        let stdin = child.stdin.take().unwrap();
        let stdout = child.stdout.take().unwrap();
        let mut transport = ChildProcessTransport::new(stdin, stdout);

        let packet = Packet::message(0, &"I love you").unwrap();
        transport.send(&MessageEnvelope::new(packet.clone())).await.unwrap();

        let echoed: MessageEnvelope<Packet> = transport.receive().await.unwrap();
        assert_eq!(echoed.message, packet);

        transport.close().await.unwrap();
        let err = transport
            .send(&MessageEnvelope::new(Packet::Shutdown))
            .await
            .unwrap_err();
        assert!(matches!(err, IpcError::NotConnected));

        let status = child.wait().await.unwrap();
        assert!(status.success());
    }
}

//! Parent side of the channel

use std::process::ExitStatus;
use std::time::Duration;

use procwire_config::{ChildPolicy, MessengerConfig};
use procwire_ipc::{
    ChildProcessTransport, EnvelopeReader, EnvelopeWriter, IpcError, MessageEnvelope, Packet,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::command::ChildCommand;
use crate::error::MessengerError;

/// One message received from the child
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound<T> {
    /// Sequence number assigned by the child's sender
    pub seq: u64,
    pub body: T,
}

/// How the child ended up after [`Messenger::shutdown`]
#[derive(Debug)]
pub enum ChildExit {
    /// The child exited on its own within the grace period
    Exited(ExitStatus),
    /// The child outlived the grace period and was killed
    Killed,
    /// The child was left running
    Detached { pid: Option<u32> },
}

impl ChildExit {
    pub fn success(&self) -> bool {
        matches!(self, ChildExit::Exited(status) if status.success())
    }
}

/// Handle on a spawned child process and its message channel
pub struct Messenger {
    id: String,
    pid: Option<u32>,
    config: MessengerConfig,
    child: Option<Child>,
    outbound: Option<mpsc::UnboundedSender<Packet>>,
    inbound: mpsc::UnboundedReceiver<Result<Packet, IpcError>>,
    writer_task: Option<JoinHandle<()>>,
    reader_task: JoinHandle<()>,
    next_seq: u64,
}

impl Messenger {
    /// Spawn the child and wire the channel. Spawning is bounded by
    /// `config.spawn_timeout`.
    pub async fn spawn(
        command: ChildCommand,
        config: &MessengerConfig,
    ) -> Result<Self, MessengerError> {
        let id = Uuid::new_v4().to_string();
        debug!(
            "Spawning child {} from {}",
            id,
            command.program().display()
        );

        let mut cmd = command.build(config.child_policy);
        let spawn = tokio::task::spawn_blocking(move || cmd.spawn());

        let mut child = match tokio::time::timeout(config.spawn_timeout, spawn).await {
            Ok(Ok(Ok(child))) => child,
            Ok(Ok(Err(e))) => {
                return Err(MessengerError::SpawnFailed(format!(
                    "{}: {}",
                    command.program().display(),
                    e
                )))
            }
            Ok(Err(join_error)) => {
                return Err(MessengerError::SpawnFailed(join_error.to_string()));
            }
            Err(_) => {
                return Err(MessengerError::Timeout {
                    operation: "child process to start",
                    after: config.spawn_timeout,
                })
            }
        };

        let pid = child.id();

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MessengerError::SpawnFailed("Failed to get stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MessengerError::SpawnFailed("Failed to get stdout".to_string()))?;

        let (writer, reader) = ChildProcessTransport::new(stdin, stdout).into_split()?;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let writer_task = tokio::spawn(writer_loop(id.clone(), writer, outbound_rx));
        let reader_task = tokio::spawn(reader_loop(id.clone(), reader, inbound_tx));

        info!("Spawned child {} (pid {:?})", id, pid);

        Ok(Self {
            id,
            pid,
            config: config.clone(),
            child: Some(child),
            outbound: Some(outbound_tx),
            inbound: inbound_rx,
            writer_task: Some(writer_task),
            reader_task,
            next_seq: 0,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Queue a message for the child. Returns its sequence number.
    ///
    /// No acknowledgment is awaited; messages are written in queue order.
    pub fn send<T: Serialize>(&mut self, body: &T) -> Result<u64, MessengerError> {
        let outbound = self.outbound.as_ref().ok_or(MessengerError::ChannelClosed)?;

        let seq = self.next_seq;
        let packet = Packet::message(seq, body)?;
        outbound
            .send(packet)
            .map_err(|_| MessengerError::ChannelClosed)?;

        self.next_seq += 1;
        debug!("Queued message {} for child {}", seq, self.id);
        Ok(seq)
    }

    /// Wait for the next message from the child, bounded by `reply_timeout`
    pub async fn recv<T: DeserializeOwned>(&mut self) -> Result<Inbound<T>, MessengerError> {
        let timeout = self.config.reply_timeout;
        match tokio::time::timeout(timeout, self.next_inbound()).await {
            Ok(result) => result,
            Err(_) => Err(MessengerError::Timeout {
                operation: "reply",
                after: timeout,
            }),
        }
    }

    /// Take a message if one is already waiting
    pub fn try_recv<T: DeserializeOwned>(&mut self) -> Result<Option<Inbound<T>>, MessengerError> {
        match self.inbound.try_recv() {
            Ok(packet) => decode(packet?).map(Some),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(MessengerError::ChannelClosed),
        }
    }

    /// Invoke `callback` once per message for the next `expected` messages, in order
    pub async fn on_message<T, F>(
        &mut self,
        expected: usize,
        mut callback: F,
    ) -> Result<(), MessengerError>
    where
        T: DeserializeOwned,
        F: FnMut(Inbound<T>),
    {
        for _ in 0..expected {
            let message = self.recv().await?;
            callback(message);
        }
        Ok(())
    }

    async fn next_inbound<T: DeserializeOwned>(&mut self) -> Result<Inbound<T>, MessengerError> {
        match self.inbound.recv().await {
            Some(packet) => decode(packet?),
            None => Err(MessengerError::ChannelClosed),
        }
    }

    /// End the conversation according to the configured [`ChildPolicy`]
    pub async fn shutdown(mut self) -> Result<ChildExit, MessengerError> {
        let grace = self.config.shutdown_grace;

        if let Some(outbound) = self.outbound.take() {
            if self.config.child_policy == ChildPolicy::ReapOnExit {
                // Ignored if the writer already stopped
                let _ = outbound.send(Packet::Shutdown);
            }
            // Dropping the sender lets the writer drain and close stdin
        }

        if let Some(writer_task) = self.writer_task.take() {
            if tokio::time::timeout(grace, writer_task).await.is_err() {
                warn!("Child {} writer did not drain within {:?}", self.id, grace);
            }
        }

        let exit = match (self.config.child_policy, self.child.take()) {
            (ChildPolicy::Detach, child) => {
                // Dropping a detached child leaves it running
                drop(child);
                info!("Detached child {} (pid {:?})", self.id, self.pid);
                ChildExit::Detached { pid: self.pid }
            }
            (ChildPolicy::ReapOnExit, Some(child)) => self.reap(child, grace).await?,
            (ChildPolicy::ReapOnExit, None) => {
                return Err(MessengerError::ChildError("child already reaped".to_string()))
            }
        };

        self.reader_task.abort();
        Ok(exit)
    }

    async fn reap(&self, mut child: Child, grace: Duration) -> Result<ChildExit, MessengerError> {
        match tokio::time::timeout(grace, child.wait()).await {
            Ok(Ok(status)) => {
                debug!("Child {} exited with {}", self.id, status);
                Ok(ChildExit::Exited(status))
            }
            Ok(Err(e)) => Err(MessengerError::ChildError(e.to_string())),
            Err(_) => {
                debug!(
                    "Child {} didn't exit within {:?}, force killing",
                    self.id, grace
                );
                child
                    .kill()
                    .await
                    .map_err(|e| MessengerError::ChildError(e.to_string()))?;
                Ok(ChildExit::Killed)
            }
        }
    }
}

impl Drop for Messenger {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

fn decode<T: DeserializeOwned>(packet: Packet) -> Result<Inbound<T>, MessengerError> {
    match packet {
        Packet::Message { seq, .. } => {
            let body = packet.decode_body()?;
            Ok(Inbound { seq, body })
        }
        // A child only sends shutdown when it is going away
        Packet::Shutdown => Err(MessengerError::ChannelClosed),
    }
}

async fn writer_loop(
    child_id: String,
    mut writer: EnvelopeWriter<ChildStdin>,
    mut rx: mpsc::UnboundedReceiver<Packet>,
) {
    while let Some(packet) = rx.recv().await {
        match writer.write_envelope(&MessageEnvelope::new(packet)).await {
            Ok(()) => {}
            Err(IpcError::ConnectionClosed) => {
                // Expected when the child has already exited
                debug!("Child {} stdin closed (child likely terminated)", child_id);
                return;
            }
            Err(e) => {
                error!("Failed to write to child {} stdin: {}", child_id, e);
                return;
            }
        }
    }

    if let Err(e) = writer.shutdown().await {
        debug!("Closing child {} stdin: {}", child_id, e);
    }
}

async fn reader_loop(
    child_id: String,
    mut reader: EnvelopeReader<ChildStdout>,
    tx: mpsc::UnboundedSender<Result<Packet, IpcError>>,
) {
    loop {
        match reader.read_envelope::<Packet>().await {
            Ok(Some(envelope)) => {
                debug!(
                    "Received message from child {}: {:?}",
                    child_id, envelope.message
                );
                if tx.send(Ok(envelope.message)).is_err() {
                    return;
                }
            }
            Ok(None) => {
                debug!("Child {} stdout closed", child_id);
                return;
            }
            Err(IpcError::DeserializationError(e)) => {
                warn!("Failed to parse message from child {}: {}", child_id, e);
            }
            Err(e) => {
                error!("Failed to read from child {} stdout: {}", child_id, e);
                let _ = tx.send(Err(e));
                return;
            }
        }
    }
}

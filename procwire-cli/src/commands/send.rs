use anyhow::{Context, Result};
use procwire_messenger::{ChildCommand, ChildExit, Inbound, Messenger, MessengerConfig};
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use tracing::{info, warn};

pub const DEFAULT_MESSAGE: &str = "I love you";

pub struct SendRequest {
    pub messages: Vec<String>,
    pub program: Option<PathBuf>,
    pub args: Vec<String>,
    pub forward_config: Option<PathBuf>,
    pub forward_log_level: Option<String>,
}

impl SendRequest {
    fn child_command(&self) -> Result<ChildCommand> {
        match &self.program {
            Some(program) => Ok(ChildCommand::new(program).args(&self.args)),
            None => {
                let mut command = ChildCommand::current_exe_child()?;
                if let Some(path) = &self.forward_config {
                    command = command.arg("--config").arg(path);
                }
                if let Some(level) = &self.forward_log_level {
                    command = command.arg("--log-level").arg(level);
                }
                Ok(command)
            }
        }
    }

    fn messages(&self) -> Vec<String> {
        if self.messages.is_empty() {
            vec![DEFAULT_MESSAGE.to_string()]
        } else {
            self.messages.clone()
        }
    }
}

fn display_body(body: JsonValue) -> String {
    match body {
        JsonValue::String(text) => text,
        other => other.to_string(),
    }
}

/// Spawn the child, send every message, print one line per reply
pub async fn run(request: SendRequest, config: &MessengerConfig) -> Result<()> {
    let command = request.child_command()?;
    let messages = request.messages();

    let mut messenger = Messenger::spawn(command, config)
        .await
        .context("Failed to start child process")?;

    // Sent straight away; the pipe buffers until the child reads
    for message in &messages {
        messenger.send(message).context("Failed to send message to child")?;
    }

    messenger
        .on_message(messages.len(), |reply: Inbound<JsonValue>| {
            println!("Child said: {}", display_body(reply.body));
        })
        .await
        .context("Child did not reply to every message")?;

    match messenger.shutdown().await.context("Failed to shut down child")? {
        ChildExit::Exited(status) if status.success() => info!("Child exited cleanly"),
        ChildExit::Exited(status) => warn!("Child exited with {}", status),
        ChildExit::Killed => warn!("Child had to be killed"),
        ChildExit::Detached { pid } => info!("Child left running (pid {:?})", pid),
    }

    Ok(())
}

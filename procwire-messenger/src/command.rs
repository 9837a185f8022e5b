//! Describes how to launch the child process

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use procwire_config::ChildPolicy;
use tokio::process::Command;

use crate::error::MessengerError;

/// Hidden flag that turns the procwire binary into an echo child
pub const CHILD_FLAG: &str = "--child";

#[derive(Debug, Clone)]
pub struct ChildCommand {
    program: PathBuf,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
}

impl ChildCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// Re-run the current executable in child mode
    pub fn current_exe_child() -> Result<Self, MessengerError> {
        let current_exe = std::env::current_exe().map_err(|e| {
            MessengerError::SpawnFailed(format!("Failed to get current exe: {}", e))
        })?;
        Ok(Self::new(current_exe).arg(CHILD_FLAG))
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// stdin/stdout carry the channel; stderr is inherited so child logs stay visible
    pub(crate) fn build(&self, policy: ChildPolicy) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(policy == ChildPolicy::ReapOnExit);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_args_and_env() {
        let command = ChildCommand::new("/bin/echo")
            .arg("a")
            .args(["b", "c"])
            .env("PROCWIRE_LOG_LEVEL", "debug");

        assert_eq!(command.program(), Path::new("/bin/echo"));
        assert_eq!(command.envs.len(), 1);

        let built = command.build(ChildPolicy::ReapOnExit);
        let std_cmd = built.as_std();
        let args: Vec<_> = std_cmd
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_current_exe_child_passes_child_flag() {
        let command = ChildCommand::current_exe_child().unwrap();
        assert_eq!(command.args.len(), 1);
        assert_eq!(command.args[0].to_str(), Some(CHILD_FLAG));
    }
}

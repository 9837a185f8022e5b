#![allow(dead_code)]

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::process::Command;
use std::time::Duration;

const PROCWIRE_VARS: [&str; 8] = [
    "PROCWIRE_LOG_LEVEL",
    "PROCWIRE_LOG_FORMAT",
    "PROCWIRE_EXIT_CODE",
    "PROCWIRE_HANDLE_TERMINATE",
    "PROCWIRE_REPLY_TIMEOUT_MS",
    "PROCWIRE_SPAWN_TIMEOUT_MS",
    "PROCWIRE_SHUTDOWN_GRACE_MS",
    "PROCWIRE_CHILD_POLICY",
];

/// The procwire binary with a predictable environment
pub fn procwire() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_procwire"));
    command.env_remove("RUST_LOG");
    for name in PROCWIRE_VARS {
        command.env_remove(name);
    }
    command
}

pub fn send_signal(pid: u32, signal: Signal) -> nix::Result<()> {
    kill(Pid::from_raw(pid as i32), signal)
}

/// Kill the process if a test wedges instead of hanging the suite
pub fn watchdog(pid: u32, after: Duration) {
    std::thread::spawn(move || {
        std::thread::sleep(after);
        let _ = send_signal(pid, Signal::SIGKILL);
    });
}

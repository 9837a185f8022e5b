//! The `interrupt` command against real OS signals

#![cfg(unix)]

mod common;

use common::{procwire, send_signal, watchdog};
use nix::sys::signal::Signal;
use std::io::{BufRead, BufReader, Lines};
use std::process::{Child, ChildStdout, Stdio};
use std::time::Duration;

const HANDLED_LINE: &str = "We received the SIGINT signal!";

fn start_interrupt(extra_env: &[(&str, &str)]) -> (Child, Lines<BufReader<ChildStdout>>) {
    let mut command = procwire();
    command
        .args(["--log-level", "info", "interrupt"])
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    for (key, value) in extra_env {
        command.env(key, value);
    }

    let mut child = command.spawn().expect("failed to start procwire");
    watchdog(child.id(), Duration::from_secs(30));

    let mut lines = BufReader::new(child.stdout.take().unwrap()).lines();

    // "Running..." is logged only after the handler is registered
    let ready = lines
        .by_ref()
        .map_while(Result::ok)
        .any(|line| line.contains("Running..."));
    assert!(ready, "procwire never reported it was running");

    (child, lines)
}

#[test]
fn test_single_interrupt_logs_once_and_exits_with_one() {
    let (mut child, lines) = start_interrupt(&[]);

    send_signal(child.id(), Signal::SIGINT).unwrap();

    let rest: Vec<String> = lines.map_while(Result::ok).collect();
    let status = child.wait().unwrap();

    assert_eq!(status.code(), Some(1));
    assert_eq!(
        rest.iter().filter(|line| line.contains(HANDLED_LINE)).count(),
        1
    );
}

#[test]
fn test_without_interrupt_process_stays_alive() {
    let (mut child, lines) = start_interrupt(&[]);

    std::thread::sleep(Duration::from_millis(750));
    assert!(
        child.try_wait().unwrap().is_none(),
        "process exited without being interrupted"
    );

    send_signal(child.id(), Signal::SIGINT).unwrap();
    drop(lines);
    assert_eq!(child.wait().unwrap().code(), Some(1));
}

#[test]
fn test_repeated_interrupts_handled_once() {
    let (mut child, lines) = start_interrupt(&[]);

    for _ in 0..3 {
        // Later signals may find the process already gone
        let _ = send_signal(child.id(), Signal::SIGINT);
    }

    let rest: Vec<String> = lines.map_while(Result::ok).collect();
    let status = child.wait().unwrap();

    assert_eq!(status.code(), Some(1));
    assert_eq!(
        rest.iter().filter(|line| line.contains(HANDLED_LINE)).count(),
        1
    );
}

#[test]
fn test_exit_code_follows_configuration() {
    let (mut child, lines) = start_interrupt(&[("PROCWIRE_EXIT_CODE", "130")]);

    send_signal(child.id(), Signal::SIGINT).unwrap();
    drop(lines);

    assert_eq!(child.wait().unwrap().code(), Some(130));
}

#[test]
fn test_sigterm_handled_when_enabled() {
    let (mut child, lines) = start_interrupt(&[("PROCWIRE_HANDLE_TERMINATE", "true")]);

    send_signal(child.id(), Signal::SIGTERM).unwrap();

    let rest: Vec<String> = lines.map_while(Result::ok).collect();
    assert_eq!(child.wait().unwrap().code(), Some(1));
    assert!(rest
        .iter()
        .any(|line| line.contains("We received the SIGTERM signal!")));
}

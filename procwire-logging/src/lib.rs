//! Logging setup for procwire
//!
//! Parent processes log to stdout. Child processes must log to stderr
//! because their stdout carries the IPC channel.

pub mod init;

pub use init::{build_env_filter, init_child_logging, init_logging, LogWriter};

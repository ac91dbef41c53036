//! Logging utilities.
//!
//! The compiler itself only talks to the `log` facade; this module wires up
//! `env_logger` for binaries and tests that want to see it.

mod init;

pub use init::{LoggingConfig, init_logging};

// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Everything in here is a *supervisor* failure: the harness itself is
//! broken or misconfigured. Failures of the program under test are never
//! errors; they are classified outcomes (see [`crate::outcome`]).
//!
//! The binary's entry points wrap these in `anyhow` for context.

use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutoclaveError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("failed to start '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to {op} log file {path:?}: {source}")]
    LogFile {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("waitpid failed: {0}")]
    Wait(Errno),

    #[error("kill failed: {0}")]
    Kill(Errno),

    #[error("failed to run failure handler '{command}': {source}")]
    Handler {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("child-exit notification channel closed")]
    BridgeClosed,
}

pub type Result<T> = std::result::Result<T, AutoclaveError>;

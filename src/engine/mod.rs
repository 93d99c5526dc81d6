// src/engine/mod.rs

//! Run loop engine for autoclave.
//!
//! This module drives repeated runs until a stop condition is met:
//! - the maximum number of runs has been performed, or
//! - the number of failed runs reached the failure threshold.
//!
//! The pure counting/stopping state lives in [`core`]; the async shell that
//! executes runs, paces them and prints progress lives in [`runtime`].

use std::time::Duration;

use crate::config::Config;

/// Why the run loop stopped on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `max_runs` runs were performed.
    MaxRuns,
    /// `max_failures` runs failed.
    FailureThreshold,
}

/// Decision taken by the core after each run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopDecision {
    Continue,
    Stop(StopReason),
}

/// How the whole loop ended, for the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEnd {
    Stopped(StopReason),
    Interrupted,
}

/// Options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// `None` means no limit.
    pub max_runs: Option<u64>,
    pub max_failures: u64,
    /// Runs shorter than this are padded before the next run starts.
    pub min_duration: Duration,
    pub verbosity: u8,
}

impl RunOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            max_runs: cfg.max_runs,
            max_failures: cfg.max_failures,
            min_duration: cfg.min_duration,
            verbosity: cfg.verbosity,
        }
    }
}

pub mod core;
pub mod runtime;

pub use self::core::{RunState, Summary};
pub use self::runtime::RunLoop;

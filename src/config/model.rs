// src/config/model.rs

use std::time::Duration;

use nix::sys::signal::Signal;
use serde::Deserialize;

use crate::types::{IgnoredExitCodes, RotationPolicy, TickBudget};

/// Default number of failed runs before the loop stops.
pub const DEFAULT_MAX_FAILURES: u64 = 1;

/// Default minimum duration of a run, in milliseconds.
pub const DEFAULT_MIN_DURATION_MSEC: u64 = 50;

/// Configuration as read from a TOML file, before CLI flags are applied.
///
/// ```toml
/// max_failures = 3
/// max_runs = 10000
/// log_stdout = true
/// log_stderr = true
/// output_prefix = "logs/crash"
/// rotate_count = 20
/// timeout_sec = 5
/// kill_signal = "SIGABRT"
/// ignore_exit_codes = [3, 4]
/// on_failure = "./collect-core.sh"
/// command = ["./crash_example"]
/// ```
///
/// Every key is optional; missing values fall back to the built-in
/// defaults during validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    #[serde(default)]
    pub max_failures: Option<u64>,

    #[serde(default)]
    pub max_runs: Option<u64>,

    #[serde(default)]
    pub log_stdout: bool,

    #[serde(default)]
    pub log_stderr: bool,

    #[serde(default)]
    pub output_prefix: Option<String>,

    /// Keep the passing logs of only the last N runs.
    #[serde(default)]
    pub rotate_count: Option<u64>,

    #[serde(default)]
    pub min_duration_msec: Option<u64>,

    #[serde(default)]
    pub timeout_sec: Option<u64>,

    #[serde(default)]
    pub verbosity: u8,

    /// Shell command run after each failed run.
    #[serde(default)]
    pub on_failure: Option<String>,

    /// Arguments equal to this token are replaced with the run id.
    #[serde(default)]
    pub run_id_token: Option<String>,

    #[serde(default)]
    pub kill_signal: Option<SignalSpec>,

    #[serde(default)]
    pub ignore_exit_codes: Option<ExitCodeList>,

    #[serde(default)]
    pub command: Vec<String>,
}

/// A signal given either by number (`9`) or by name (`"KILL"`, `"SIGKILL"`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SignalSpec {
    Number(i64),
    Name(String),
}

/// Ignorable exit codes, either as a TOML array or a comma-separated string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ExitCodeList {
    List(Vec<i64>),
    Csv(String),
}

/// Which of the child's output streams are captured to log files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capture {
    pub stdout: bool,
    pub stderr: bool,
}

impl Capture {
    pub fn any(&self) -> bool {
        self.stdout || self.stderr
    }
}

/// Fully resolved configuration.
///
/// Only constructed through `TryFrom<RawConfig>`, which enforces the
/// invariants documented on each field.
#[derive(Debug, Clone)]
pub struct Config {
    /// Stop once this many runs have failed. Always `>= 1`.
    pub max_failures: u64,

    /// Stop after this many runs; `None` means no limit.
    pub max_runs: Option<u64>,

    pub capture: Capture,

    /// Prefix for log paths; always resolved, even when nothing is captured.
    pub output_prefix: String,

    pub rotation: RotationPolicy,

    /// Runs shorter than this are padded before the next one starts.
    pub min_duration: Duration,

    /// Per-run timeout in seconds; `None` means no timeout. Never zero.
    pub timeout_sec: Option<u64>,

    pub verbosity: u8,

    pub on_failure: Option<String>,

    pub run_id_token: Option<String>,

    /// Sent to a timed-out child when no failure handler is configured.
    pub kill_signal: Signal,

    pub ignored_exit_codes: IgnoredExitCodes,

    /// The target command and its arguments. Never empty.
    pub command: Vec<String>,
}

impl Config {
    pub(crate) fn new_unchecked(
        raw: RawConfig,
        output_prefix: String,
        kill_signal: Signal,
        ignored_exit_codes: IgnoredExitCodes,
    ) -> Self {
        let rotation = match raw.rotate_count {
            Some(count) => RotationPolicy::KeepLast(count),
            None => RotationPolicy::None,
        };

        Self {
            max_failures: raw.max_failures.unwrap_or(DEFAULT_MAX_FAILURES),
            max_runs: raw.max_runs,
            capture: Capture {
                stdout: raw.log_stdout,
                stderr: raw.log_stderr,
            },
            output_prefix,
            rotation,
            min_duration: Duration::from_millis(
                raw.min_duration_msec.unwrap_or(DEFAULT_MIN_DURATION_MSEC),
            ),
            timeout_sec: raw.timeout_sec,
            verbosity: raw.verbosity,
            on_failure: raw.on_failure,
            run_id_token: raw.run_id_token,
            kill_signal,
            ignored_exit_codes,
            command: raw.command,
        }
    }

    pub fn tick_budget(&self) -> TickBudget {
        TickBudget::from_timeout_secs(self.timeout_sec)
    }

    /// The program being run (`command[0]`).
    pub fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or_default()
    }
}

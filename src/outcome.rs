// src/outcome.rs

//! Classification of a finished run.
//!
//! [`classify`] is a pure function: it maps what the supervisor observed
//! (a raw wait status, or a timeout) plus the set of ignorable exit codes
//! onto a [`ChildStatus`]. It performs no IO and sends no signals.

use std::fmt;

use nix::sys::wait::WaitStatus;

use crate::types::IgnoredExitCodes;

/// A terminal wait status, as reported by `waitpid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawStatus {
    Exited(i32),
    Signaled { signal: i32, core_dumped: bool },
    Stopped(i32),
}

impl RawStatus {
    /// Convert a `waitpid` result, returning `None` for statuses that do
    /// not end supervision (still alive, continued, ptrace events).
    pub fn from_wait_status(status: WaitStatus) -> Option<Self> {
        match status {
            WaitStatus::Exited(_, code) => Some(RawStatus::Exited(code)),
            WaitStatus::Signaled(_, signal, core_dumped) => Some(RawStatus::Signaled {
                signal: signal as i32,
                core_dumped,
            }),
            WaitStatus::Stopped(_, signal) => Some(RawStatus::Stopped(signal as i32)),
            _ => None,
        }
    }
}

/// How supervision of a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Supervision {
    Finished(RawStatus),
    TimedOut,
}

/// Kind of outcome, named after `AUTOCLAVE_FAIL_TYPE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutcomeKind {
    #[default]
    Undefined,
    TimedOut,
    Exited,
    Signaled,
    Stopped,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Undefined => "undef",
            OutcomeKind::TimedOut => "timeout",
            OutcomeKind::Exited => "exit",
            OutcomeKind::Signaled => "term",
            OutcomeKind::Stopped => "stop",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verdict {
    #[default]
    Pass,
    Fail,
}

/// Everything known about one finished run.
///
/// Built fresh for every run and dropped once the run's logs and handler
/// have been dealt with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildStatus {
    pub pid: i32,
    pub run_id: u64,
    pub kind: OutcomeKind,
    pub dumped_core: bool,
    pub exit_code: u8,
    pub term_signal: i32,
    pub stop_signal: i32,
    pub verdict: Verdict,
}

impl ChildStatus {
    pub fn failed(&self) -> bool {
        self.verdict == Verdict::Fail
    }

    /// One-line summary used for verbose reports.
    pub fn detail_line(&self) -> String {
        format!(
            " -- type: {}, core? {}, exit: {}, term: {}, stop: {}",
            self.kind,
            u8::from(self.dumped_core),
            self.exit_code,
            self.term_signal,
            self.stop_signal
        )
    }
}

/// Classify a finished run.
///
/// 1. A timeout is always a failure.
/// 2. A normal exit fails unless its code is in `ignored` (0 always is).
/// 3. Termination by signal is always a failure.
/// 4. A stop is always a failure.
pub fn classify(
    pid: i32,
    run_id: u64,
    supervision: Supervision,
    ignored: &IgnoredExitCodes,
) -> ChildStatus {
    let mut status = ChildStatus {
        pid,
        run_id,
        ..ChildStatus::default()
    };

    match supervision {
        Supervision::TimedOut => {
            status.kind = OutcomeKind::TimedOut;
            status.verdict = Verdict::Fail;
        }
        Supervision::Finished(RawStatus::Exited(code)) => {
            // Only the low 8 bits reach the parent.
            let code = (code & 0xff) as u8;
            status.kind = OutcomeKind::Exited;
            status.exit_code = code;
            status.verdict = if ignored.contains(code) {
                Verdict::Pass
            } else {
                Verdict::Fail
            };
        }
        Supervision::Finished(RawStatus::Signaled {
            signal,
            core_dumped,
        }) => {
            status.kind = OutcomeKind::Signaled;
            status.term_signal = signal;
            status.dumped_core = core_dumped;
            status.verdict = Verdict::Fail;
        }
        Supervision::Finished(RawStatus::Stopped(signal)) => {
            status.kind = OutcomeKind::Stopped;
            status.stop_signal = signal;
            status.verdict = Verdict::Fail;
        }
    }

    status
}

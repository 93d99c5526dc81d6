// src/engine/core.rs

//! Pure run-loop state.
//!
//! [`RunState`] owns the run and failure counters and decides, after every
//! run, whether the loop continues. It has no channels, performs no IO and
//! is only ever touched by the loop itself, between runs.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::engine::{LoopDecision, LoopEnd, RunOptions, StopReason};

#[derive(Debug, Clone)]
pub struct RunState {
    options: RunOptions,
    /// Number of completed runs; also the id of the last run.
    runs: u64,
    failures: u64,
    started: Instant,
}

impl RunState {
    pub fn new(options: RunOptions) -> Self {
        Self {
            options,
            runs: 0,
            failures: 0,
            started: Instant::now(),
        }
    }

    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn passes(&self) -> u64 {
        self.runs - self.failures
    }

    /// Id of the next run. Run ids start at 1.
    pub fn next_run_id(&self) -> u64 {
        self.runs + 1
    }

    /// Stop reason that holds before any further run is started.
    pub fn stop_reason(&self) -> Option<StopReason> {
        if self.failures >= self.options.max_failures {
            return Some(StopReason::FailureThreshold);
        }
        match self.options.max_runs {
            Some(max) if self.runs >= max => Some(StopReason::MaxRuns),
            _ => None,
        }
    }

    /// Account for one finished run.
    pub fn record(&mut self, failed: bool) -> LoopDecision {
        self.runs += 1;
        if failed {
            self.failures += 1;
        }

        match self.stop_reason() {
            Some(reason) => LoopDecision::Stop(reason),
            None => LoopDecision::Continue,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn summary(&self) -> Summary {
        Summary {
            runs: self.runs,
            passes: self.passes(),
            failures: self.failures,
            elapsed: self.elapsed(),
        }
    }

    /// Exit status for the process.
    ///
    /// Reaching the failure threshold exits 1. Running out of runs exits 0.
    /// An interrupted loop exits 1 if any run failed.
    pub fn exit_code(&self, end: LoopEnd) -> u8 {
        match end {
            LoopEnd::Stopped(StopReason::FailureThreshold) => 1,
            LoopEnd::Stopped(StopReason::MaxRuns) => 0,
            LoopEnd::Interrupted => u8::from(self.failures > 0),
        }
    }

    /// Progress line printed after each run at verbosity >= 1.
    pub fn progress_line(&self, run_duration: Duration) -> String {
        let now = self.elapsed();
        format!(
            "{:08}.{:06} -- {} run{}, {} failure{}, {} msec",
            now.as_secs(),
            now.subsec_micros(),
            self.runs,
            plural(self.runs, "", "s"),
            self.failures,
            plural(self.failures, "", "s"),
            msec(run_duration)
        )
    }
}

/// Final statistics, printed at the end of every loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub runs: u64,
    pub passes: u64,
    pub failures: u64,
    pub elapsed: Duration,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "-- {} run{}, {} pass{}, {} failure{}, {} msec",
            self.runs,
            plural(self.runs, "", "s"),
            self.passes,
            plural(self.passes, "", "es"),
            self.failures,
            plural(self.failures, "", "s"),
            msec(self.elapsed)
        )
    }
}

fn plural(n: u64, one: &'static str, many: &'static str) -> &'static str {
    if n == 1 { one } else { many }
}

fn msec(d: Duration) -> String {
    format!("{:.3}", d.as_secs_f64() * 1000.0)
}

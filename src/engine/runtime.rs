// src/engine/runtime.rs

use std::fmt;

use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::engine::core::{RunState, Summary};
use crate::engine::{LoopDecision, LoopEnd, RunOptions, StopReason};
use crate::errors::Result;
use crate::exec::RunBackend;

/// Drives runs one after another until a stop condition is met, and
/// delegates each run to a `RunBackend`.
///
/// This is the IO shell around `RunState`, which holds the counting and
/// stopping semantics. This struct awaits runs, pads short ones and prints
/// progress.
pub struct RunLoop<B: RunBackend> {
    state: RunState,
    options: RunOptions,
    backend: B,
}

impl<B: RunBackend> fmt::Debug for RunLoop<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunLoop")
            .field("state", &self.state)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<B: RunBackend> RunLoop<B> {
    pub fn new(backend: B, options: RunOptions) -> Self {
        Self {
            state: RunState::new(options),
            options,
            backend,
        }
    }

    /// Main loop.
    ///
    /// Runs are strictly sequential. Each run's wall-clock time is measured
    /// on the monotonic clock; if it is shorter than `min_duration` and
    /// another run follows, the loop sleeps for the difference.
    ///
    /// Cancel-safe between runs: dropping this future mid-run leaves the
    /// counters describing every run that completed.
    pub async fn run(&mut self) -> Result<StopReason> {
        info!(
            max_runs = ?self.options.max_runs,
            max_failures = self.options.max_failures,
            "autoclave run loop started"
        );

        loop {
            if let Some(reason) = self.state.stop_reason() {
                info!(?reason, runs = self.state.runs(), "run loop finished");
                return Ok(reason);
            }

            let run_id = self.state.next_run_id();
            let started = Instant::now();
            let report = self.backend.execute_run(run_id).await?;
            let duration = started.elapsed();

            let decision = self.state.record(report.failed());
            debug!(
                run_id,
                failed = report.failed(),
                fail_type = %report.status.kind,
                duration_ms = duration.as_millis() as u64,
                "run finished"
            );

            if self.options.verbosity > 0 {
                println!("{}", self.state.progress_line(duration));
            }

            if let LoopDecision::Stop(reason) = decision {
                info!(?reason, runs = self.state.runs(), failures = self.state.failures(), "run loop finished");
                return Ok(reason);
            }

            if duration < self.options.min_duration {
                sleep(self.options.min_duration - duration).await;
            }
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn summary(&self) -> Summary {
        self.state.summary()
    }

    pub fn exit_code(&self, end: LoopEnd) -> u8 {
        self.state.exit_code(end)
    }
}

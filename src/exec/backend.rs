// src/exec/backend.rs

//! Pluggable run backend abstraction.
//!
//! The run loop talks to a `RunBackend` instead of spawning processes
//! itself. This keeps the loop's counting, pacing and stopping logic
//! testable with a fake backend, while the production pipeline lives in
//! [`ProcessBackend`].

use std::future::Future;
use std::pin::Pin;

use nix::sys::signal::Signal;
use nix::unistd::Pid;
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::Result;
use crate::exec::bridge::ChildExitBridge;
use crate::exec::handler::FailureHandler;
use crate::exec::launcher::{LaunchSpec, launch};
use crate::exec::supervisor::{Abandoned, reap_after_kill, resume_stopped, send_kill, supervise};
use crate::logs::{FinalizedLogs, LogManager};
use crate::outcome::{ChildStatus, OutcomeKind, classify};
use crate::types::{IgnoredExitCodes, TickBudget};

/// Result of one complete run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub status: ChildStatus,
    pub logs: FinalizedLogs,
}

impl RunReport {
    pub fn failed(&self) -> bool {
        self.status.failed()
    }
}

/// Trait abstracting how a single run is executed.
///
/// Production code uses [`ProcessBackend`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait RunBackend: Send {
    /// Execute run `run_id` to completion.
    ///
    /// An `Err` is a fatal supervisor error, never a failed run.
    fn execute_run(
        &mut self,
        run_id: u64,
    ) -> Pin<Box<dyn Future<Output = Result<RunReport>> + Send + '_>>;
}

/// Real backend: launch → supervise → classify → finalize logs → handle.
#[derive(Debug)]
pub struct ProcessBackend {
    launch: LaunchSpec,
    budget: TickBudget,
    kill_signal: Signal,
    ignored: IgnoredExitCodes,
    logs: LogManager,
    handler: Option<FailureHandler>,
    verbosity: u8,
    bridge: ChildExitBridge,
    abandoned: Abandoned,
}

impl ProcessBackend {
    pub fn new(cfg: &Config, bridge: ChildExitBridge) -> Self {
        let handler = cfg
            .on_failure
            .as_ref()
            .map(|cmd| FailureHandler::new(cmd.clone(), cfg.program()));

        Self {
            launch: LaunchSpec::from_config(cfg),
            budget: cfg.tick_budget(),
            kill_signal: cfg.kill_signal,
            ignored: cfg.ignored_exit_codes.clone(),
            logs: LogManager::from_config(cfg),
            handler,
            verbosity: cfg.verbosity,
            bridge,
            abandoned: Abandoned::default(),
        }
    }

    /// Children of earlier runs still waiting to be reaped.
    pub fn abandoned(&self) -> &Abandoned {
        &self.abandoned
    }

    async fn run_once(&mut self, run_id: u64) -> Result<RunReport> {
        self.abandoned.reap();

        let logs = self.logs.open_run(run_id)?;
        let child = launch(&self.launch, &logs)?;
        let pid = Pid::from_raw(child.id() as i32);

        let supervision =
            supervise(pid, self.budget, &mut self.bridge, &mut self.abandoned).await?;
        let status = classify(pid.as_raw(), run_id, supervision, &self.ignored);

        if self.verbosity > 1 {
            println!("{}", status.detail_line());
        }

        // A configured handler takes over a failed run, timeouts and stops
        // included: the child is left alone so the handler can inspect it,
        // and is reaped later once it terminates.
        let handled = status.failed() && self.handler.is_some();
        match status.kind {
            OutcomeKind::TimedOut | OutcomeKind::Stopped if handled => {
                self.abandoned.push(pid);
            }
            OutcomeKind::TimedOut | OutcomeKind::Stopped => {
                let stopped = status.kind == OutcomeKind::Stopped;
                self.terminate(run_id, pid, stopped).await?;
            }
            _ => {}
        }

        let finalized = self.logs.finalize(logs, status.failed())?;

        if status.failed() {
            warn!(
                run_id,
                pid = status.pid,
                fail_type = %status.kind,
                exit = status.exit_code,
                term = status.term_signal,
                stop = status.stop_signal,
                "run failed"
            );
        }

        if let Some(handler) = self.handler.as_ref().filter(|_| handled) {
            handler.invoke(&status, &finalized).await?;
        }
        self.abandoned.reap();

        Ok(RunReport {
            status,
            logs: finalized,
        })
    }

    /// Send the kill signal to a child the run is done with.
    ///
    /// A stopped child is resumed as well so the signal can be acted on.
    /// If the child is not gone within one tick it is tracked as abandoned.
    async fn terminate(&mut self, run_id: u64, pid: Pid, stopped: bool) -> Result<()> {
        if !send_kill(pid, self.kill_signal)? {
            return Ok(());
        }
        if stopped {
            resume_stopped(pid)?;
        }
        match reap_after_kill(pid, &mut self.bridge).await? {
            Some(raw) => debug!(run_id, ?raw, "reaped signalled child"),
            None => self.abandoned.push(pid),
        }
        Ok(())
    }
}

impl RunBackend for ProcessBackend {
    fn execute_run(
        &mut self,
        run_id: u64,
    ) -> Pin<Box<dyn Future<Output = Result<RunReport>> + Send + '_>> {
        Box::pin(self.run_once(run_id))
    }
}

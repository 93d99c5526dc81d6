// src/exec/supervisor.rs

//! Bounded supervision of one child.
//!
//! ```text
//! waiting --(child exited / signaled / stopped)--> finished
//!    |
//!    +------(tick budget exhausted)--------------> timed out
//! ```
//!
//! Every tick starts with a non-blocking `waitpid` on the child. Between
//! checks the supervisor sleeps until the tick's 100 ms window ends or the
//! child-exit bridge fires, whichever comes first. Only a full elapsed
//! window counts against the budget; a bridge wakeup just triggers an
//! earlier re-check. Without a timeout the tick counter never advances.
//!
//! Children that a run leaves behind (handed to the failure handler, or
//! still alive after the kill) are tracked in [`Abandoned`]. The backend
//! reaps them between runs and [`supervise`] on every tick.

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::errors::{AutoclaveError, Result};
use crate::exec::bridge::{ChildExitBridge, Wakeup};
use crate::outcome::{RawStatus, Supervision};
use crate::types::{TICK, TickBudget};

/// Children of earlier runs that have not been waited for yet.
#[derive(Debug, Default)]
pub struct Abandoned {
    pids: Vec<Pid>,
}

impl Abandoned {
    pub fn push(&mut self, pid: Pid) {
        debug!(pid = pid.as_raw(), "tracking abandoned child");
        self.pids.push(pid);
    }

    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.pids.contains(&pid)
    }

    /// Reap every abandoned child that has terminated, without blocking.
    ///
    /// Stopped children are not reported (no `WUNTRACED`) and stay tracked.
    pub fn reap(&mut self) {
        self.pids.retain(|&pid| loop {
            match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => return true,
                Ok(status) => {
                    debug!(pid = pid.as_raw(), ?status, "reaped abandoned child");
                    return false;
                }
                Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => return false,
                Err(e) => {
                    warn!(pid = pid.as_raw(), error = %e, "dropping unreapable child");
                    return false;
                }
            }
        });
    }
}

/// Wait for `pid` to finish, or for `budget` ticks to elapse.
///
/// Abandoned children of earlier runs are reaped on every tick.
pub async fn supervise(
    pid: Pid,
    budget: TickBudget,
    bridge: &mut ChildExitBridge,
    abandoned: &mut Abandoned,
) -> Result<Supervision> {
    let mut ticks: u64 = 0;
    let mut deadline = Instant::now() + TICK;

    loop {
        if !abandoned.is_empty() {
            abandoned.reap();
        }

        if let Some(raw) = poll_child(pid)? {
            debug!(pid = pid.as_raw(), ticks, ?raw, "child finished");
            return Ok(Supervision::Finished(raw));
        }

        if budget.is_exhausted(ticks) {
            debug!(pid = pid.as_raw(), ticks, "tick budget exhausted");
            return Ok(Supervision::TimedOut);
        }

        match bridge.wait_until(deadline).await? {
            Wakeup::Notified => {
                trace!(pid = pid.as_raw(), ticks, "woken by child-exit bridge");
            }
            Wakeup::Deadline => {
                if budget.is_bounded() {
                    ticks += 1;
                }
                deadline += TICK;
            }
        }
    }
}

/// Non-blocking status check of one child.
///
/// Returns `None` while the child is still running (or merely continued).
pub fn poll_child(pid: Pid) -> Result<Option<RawStatus>> {
    loop {
        match waitpid(pid, Some(WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED)) {
            Ok(status) => return Ok(RawStatus::from_wait_status(status)),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(AutoclaveError::Wait(e)),
        }
    }
}

/// Send the kill signal to a timed-out or stopped child.
///
/// Returns `false` when the child was already gone: it exited on its own
/// between the classification and the kill. The run keeps its outcome.
pub fn send_kill(pid: Pid, signal: Signal) -> Result<bool> {
    match kill(pid, signal) {
        Ok(()) => {
            debug!(pid = pid.as_raw(), %signal, "sent kill signal");
            Ok(true)
        }
        Err(Errno::ESRCH) => {
            warn!(pid = pid.as_raw(), "child exited before the kill signal was sent");
            Ok(false)
        }
        Err(e) => Err(AutoclaveError::Kill(e)),
    }
}

/// Resume a stopped child so a pending kill signal can take effect.
pub fn resume_stopped(pid: Pid) -> Result<()> {
    match kill(pid, Signal::SIGCONT) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(AutoclaveError::Kill(e)),
    }
}

/// Give a signalled child one tick to terminate, reaping it if it does.
///
/// A child that ignores the signal is left running; the caller tracks it
/// in [`Abandoned`].
pub async fn reap_after_kill(pid: Pid, bridge: &mut ChildExitBridge) -> Result<Option<RawStatus>> {
    let deadline = Instant::now() + TICK;
    loop {
        match poll_child(pid) {
            Ok(Some(RawStatus::Stopped(_))) | Ok(None) => {}
            Ok(Some(raw)) => return Ok(Some(raw)),
            Err(AutoclaveError::Wait(Errno::ECHILD)) => return Ok(None),
            Err(e) => return Err(e),
        }

        if bridge.wait_until(deadline).await? == Wakeup::Deadline {
            return Ok(None);
        }
    }
}

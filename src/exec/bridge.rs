// src/exec/bridge.rs

//! SIGCHLD → supervisor wakeup.
//!
//! The signal itself is caught by Tokio's signal driver, whose handler only
//! records the delivery. A watcher task then deposits a token into a
//! one-slot channel that the supervisor awaits between status checks.
//!
//! Tokens are a latency hint only. Their value is never read, and several
//! deliveries collapse into one pending token. The supervisor re-checks the
//! child on every tick whether or not a token arrived, so a lost wakeup
//! costs at most one tick.

use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, error};

use crate::errors::{AutoclaveError, Result};

/// Why [`ChildExitBridge::wait_until`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wakeup {
    /// A child changed state; re-check now.
    Notified,
    /// The deadline passed without a notification.
    Deadline,
}

/// Process-wide child-exit notification channel.
///
/// Created once at startup and kept for the lifetime of the supervisor.
#[derive(Debug)]
pub struct ChildExitBridge {
    rx: mpsc::Receiver<()>,
    watcher: Option<JoinHandle<()>>,
}

impl ChildExitBridge {
    /// Start listening for SIGCHLD.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn install() -> Result<Self> {
        let mut sigchld = signal(SignalKind::child())?;
        let (tx, rx) = mpsc::channel::<()>(1);

        let watcher = tokio::spawn(async move {
            while sigchld.recv().await.is_some() {
                if deposit(&tx).is_err() {
                    error!("child-exit bridge receiver gone; stopping SIGCHLD watcher");
                    break;
                }
            }
        });

        debug!("child-exit bridge installed");
        Ok(Self {
            rx,
            watcher: Some(watcher),
        })
    }

    /// Build a bridge fed by an arbitrary sender instead of SIGCHLD.
    pub fn from_channel(rx: mpsc::Receiver<()>) -> Self {
        Self { rx, watcher: None }
    }

    /// Wait until a notification arrives or `deadline` passes.
    ///
    /// Any further pending tokens are drained. A closed channel means the
    /// bridge is irrecoverably broken.
    pub async fn wait_until(&mut self, deadline: Instant) -> Result<Wakeup> {
        match timeout_at(deadline, self.rx.recv()).await {
            Ok(Some(())) => {
                self.drain();
                Ok(Wakeup::Notified)
            }
            Ok(None) => Err(AutoclaveError::BridgeClosed),
            Err(_elapsed) => Ok(Wakeup::Deadline),
        }
    }

    /// Discard pending tokens.
    pub fn drain(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }
}

impl Drop for ChildExitBridge {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }
}

/// Deposit one wakeup token.
///
/// A full channel already holds a token, which is all the supervisor needs,
/// so it counts as delivered. Only a closed channel is an error.
pub fn deposit(tx: &mpsc::Sender<()>) -> Result<()> {
    match tx.try_send(()) {
        Ok(()) | Err(TrySendError::Full(())) => Ok(()),
        Err(TrySendError::Closed(())) => Err(AutoclaveError::BridgeClosed),
    }
}

// src/signals.rs

//! Interrupt handling.
//!
//! [`wait_for_interrupt`] completes when the supervisor receives SIGINT
//! (Ctrl-C) or SIGTERM. The run loop is then abandoned between ticks, the
//! summary is printed, and the process exits. An in-flight child is not
//! signalled.

use tokio::signal::unix::{SignalKind, signal};

pub async fn wait_for_interrupt() -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
    }
    Ok(())
}

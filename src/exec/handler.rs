// src/exec/handler.rs

//! External failure handler (`-x CMD`).
//!
//! The handler is run through `sh -c` after a failed run's logs have been
//! finalized, with `AUTOCLAVE_*` variables describing the failure. The
//! supervisor blocks until it completes.

use std::path::Path;
use std::process::ExitStatus;

use tokio::process::Command;
use tracing::{info, warn};

use crate::errors::{AutoclaveError, Result};
use crate::logs::FinalizedLogs;
use crate::outcome::ChildStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureHandler {
    command: String,
    /// Value of `AUTOCLAVE_CMD` (the supervised program).
    target: String,
}

impl FailureHandler {
    pub fn new(command: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            target: target.into(),
        }
    }

    /// Environment describing one failed run.
    pub fn environment(&self, status: &ChildStatus, logs: &FinalizedLogs) -> Vec<(&'static str, String)> {
        let mut env = vec![
            ("AUTOCLAVE_DUMPED_CORE", u8::from(status.dumped_core).to_string()),
            ("AUTOCLAVE_FAIL_TYPE", status.kind.as_str().to_string()),
            ("AUTOCLAVE_EXIT_STATUS", status.exit_code.to_string()),
            ("AUTOCLAVE_TERM_SIGNAL", status.term_signal.to_string()),
            ("AUTOCLAVE_STOP_SIGNAL", status.stop_signal.to_string()),
            ("AUTOCLAVE_CHILD_PID", status.pid.to_string()),
            ("AUTOCLAVE_RUN_ID", status.run_id.to_string()),
            ("AUTOCLAVE_CMD", self.target.clone()),
        ];
        if let Some(ref path) = logs.stdout {
            env.push(("AUTOCLAVE_STDOUT_LOG", path_string(path)));
        }
        if let Some(ref path) = logs.stderr {
            env.push(("AUTOCLAVE_STDERR_LOG", path_string(path)));
        }
        env
    }

    /// Run the handler and wait for it.
    ///
    /// Failing to start the shell is fatal; a non-zero exit of the handler
    /// itself is only logged.
    pub async fn invoke(&self, status: &ChildStatus, logs: &FinalizedLogs) -> Result<ExitStatus> {
        info!(
            run_id = status.run_id,
            fail_type = %status.kind,
            cmd = %self.command,
            "running failure handler"
        );

        let exit = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .envs(self.environment(status, logs))
            .status()
            .await
            .map_err(|source| AutoclaveError::Handler {
                command: self.command.clone(),
                source,
            })?;

        if !exit.success() {
            warn!(
                run_id = status.run_id,
                cmd = %self.command,
                exit = %exit,
                "failure handler exited unsuccessfully"
            );
        }
        Ok(exit)
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

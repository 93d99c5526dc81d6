// src/exec/launcher.rs

//! Starting one run of the target command.

use std::process::{Child, Command};

use tracing::debug;

use crate::config::Config;
use crate::errors::{AutoclaveError, Result};
use crate::logs::{RunLogs, Stream};

/// What to launch for every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    /// `argv[0]` is looked up on `PATH`, like `execvp`.
    pub argv: Vec<String>,
    /// Arguments equal to this token are replaced with the run id.
    pub run_id_token: Option<String>,
}

impl LaunchSpec {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            argv: cfg.command.clone(),
            run_id_token: cfg.run_id_token.clone(),
        }
    }

    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    /// Arguments (without `argv[0]`) as passed to run `run_id`.
    ///
    /// Only the per-run copy is rewritten; `self.argv` is never modified.
    pub fn args_for_run(&self, run_id: u64) -> Vec<String> {
        let args = self.argv.iter().skip(1);
        match self.run_id_token {
            Some(ref token) => {
                let id = run_id.to_string();
                args.map(|arg| if arg == token { id.clone() } else { arg.clone() })
                    .collect()
            }
            None => args.cloned().collect(),
        }
    }
}

/// Start run `logs.run_id()` of the target command.
///
/// Captured streams are redirected into the run's log files; the others
/// are inherited. Any failure to start the child, including a program that
/// cannot be executed, is fatal for the supervisor.
pub fn launch(spec: &LaunchSpec, logs: &RunLogs) -> Result<Child> {
    let run_id = logs.run_id();
    let args = spec.args_for_run(run_id);

    let mut cmd = Command::new(spec.program());
    cmd.args(&args)
        .stdin(std::process::Stdio::inherit())
        .stdout(logs.stdio(Stream::Stdout)?)
        .stderr(logs.stdio(Stream::Stderr)?);

    let child = cmd.spawn().map_err(|source| AutoclaveError::Launch {
        command: spec.program().to_string(),
        source,
    })?;

    debug!(run_id, pid = child.id(), ?args, "launched child");
    Ok(child)
}

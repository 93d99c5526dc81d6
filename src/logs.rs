// src/logs.rs

//! Per-run log files: naming, lifecycle and rotation.
//!
//! A captured stream of run `N` goes through three names:
//!
//! ```text
//! <prefix>.N.stdout.log        while the run is in progress
//! <prefix>.pass.N.stdout.log   after a passing run
//! <prefix>.FAIL.N.stdout.log   after a failing run
//! ```
//!
//! The rename out of the running name is the point after which a file's
//! name is authoritative for its outcome. Rotation only ever deletes
//! `.pass` files.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tracing::debug;

use crate::config::{Capture, Config};
use crate::errors::{AutoclaveError, Result};
use crate::types::RotationPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    pub fn name(&self) -> &'static str {
        match self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatus {
    Running,
    Pass,
    Fail,
}

impl LogStatus {
    pub fn for_run(failed: bool) -> Self {
        if failed { LogStatus::Fail } else { LogStatus::Pass }
    }

    fn suffix(&self) -> &'static str {
        match self {
            LogStatus::Running => "",
            LogStatus::Pass => ".pass",
            LogStatus::Fail => ".FAIL",
        }
    }
}

/// Builds log paths from the configured prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogNaming {
    prefix: String,
}

impl LogNaming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// `<prefix><status-suffix>.<run-id>.<stream>.log`
    pub fn path(&self, run_id: u64, stream: Stream, status: LogStatus) -> PathBuf {
        PathBuf::from(format!(
            "{}{}.{}.{}.log",
            self.prefix,
            status.suffix(),
            run_id,
            stream.name()
        ))
    }
}

/// A running-state log file, open for the child to write into.
#[derive(Debug)]
struct OpenLog {
    stream: Stream,
    path: PathBuf,
    file: File,
}

/// The log files of one in-flight run.
///
/// Dropping this closes every descriptor, so no log file outlives its run
/// even when the run's pipeline bails out early.
#[derive(Debug)]
pub struct RunLogs {
    run_id: u64,
    stdout: Option<OpenLog>,
    stderr: Option<OpenLog>,
}

impl RunLogs {
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Stdio for the child's `stream`: the log file if captured, otherwise
    /// inherited from the supervisor.
    pub fn stdio(&self, stream: Stream) -> Result<Stdio> {
        let log = match stream {
            Stream::Stdout => self.stdout.as_ref(),
            Stream::Stderr => self.stderr.as_ref(),
        };
        match log {
            Some(log) => {
                let file = log.file.try_clone().map_err(|source| AutoclaveError::LogFile {
                    op: "duplicate",
                    path: log.path.clone(),
                    source,
                })?;
                Ok(Stdio::from(file))
            }
            None => Ok(Stdio::inherit()),
        }
    }

    pub fn running_path(&self, stream: Stream) -> Option<&Path> {
        match stream {
            Stream::Stdout => self.stdout.as_ref().map(|log| log.path.as_path()),
            Stream::Stderr => self.stderr.as_ref().map(|log| log.path.as_path()),
        }
    }
}

/// Terminal paths of a finished run's logs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizedLogs {
    pub stdout: Option<PathBuf>,
    pub stderr: Option<PathBuf>,
}

/// Owns log naming, the per-run lifecycle and rotation.
#[derive(Debug, Clone)]
pub struct LogManager {
    naming: LogNaming,
    capture: Capture,
    rotation: RotationPolicy,
}

impl LogManager {
    pub fn new(naming: LogNaming, capture: Capture, rotation: RotationPolicy) -> Self {
        Self {
            naming,
            capture,
            rotation,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            LogNaming::new(cfg.output_prefix.clone()),
            cfg.capture,
            cfg.rotation,
        )
    }

    /// Create (or truncate) the running-state file of every captured stream.
    pub fn open_run(&self, run_id: u64) -> Result<RunLogs> {
        let stdout = if self.capture.stdout {
            Some(self.open_stream(run_id, Stream::Stdout)?)
        } else {
            None
        };
        let stderr = if self.capture.stderr {
            Some(self.open_stream(run_id, Stream::Stderr)?)
        } else {
            None
        };

        Ok(RunLogs {
            run_id,
            stdout,
            stderr,
        })
    }

    fn open_stream(&self, run_id: u64, stream: Stream) -> Result<OpenLog> {
        let path = self.naming.path(run_id, stream, LogStatus::Running);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|source| AutoclaveError::LogFile {
                op: "open",
                path: path.clone(),
                source,
            })?;
        debug!(run_id, %stream, path = %path.display(), "opened run log");
        Ok(OpenLog { stream, path, file })
    }

    /// Close, rename to the terminal name, then rotate, for each stream.
    pub fn finalize(&self, logs: RunLogs, failed: bool) -> Result<FinalizedLogs> {
        let run_id = logs.run_id;
        let status = LogStatus::for_run(failed);
        let mut finalized = FinalizedLogs::default();

        for log in [logs.stdout, logs.stderr].into_iter().flatten() {
            let stream = log.stream;
            let running = log.path;
            drop(log.file);

            let terminal = self.naming.path(run_id, stream, status);
            fs::rename(&running, &terminal).map_err(|source| AutoclaveError::LogFile {
                op: "rename",
                path: running.clone(),
                source,
            })?;
            debug!(run_id, %stream, path = %terminal.display(), "finalized run log");

            self.rotate(stream, run_id)?;

            match stream {
                Stream::Stdout => finalized.stdout = Some(terminal),
                Stream::Stderr => finalized.stderr = Some(terminal),
            }
        }

        Ok(finalized)
    }

    /// Delete the passing log that just fell out of the rotation window.
    ///
    /// A missing file is not an error: that run may have failed (its log
    /// is kept) or the window may reach back before the first run.
    pub fn rotate(&self, stream: Stream, run_id: u64) -> Result<()> {
        let Some(expired) = self.rotation.expired_run(run_id) else {
            return Ok(());
        };

        let path = self.naming.path(expired, stream, LogStatus::Pass);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(run_id, expired, %stream, path = %path.display(), "rotated passing log");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(AutoclaveError::LogFile {
                op: "remove",
                path,
                source,
            }),
        }
    }
}

// src/config/validate.rs

use std::fs;
use std::path::Path;
use std::str::FromStr;

use nix::sys::signal::Signal;
use tracing::debug;

use crate::config::model::{Config, ExitCodeList, RawConfig, SignalSpec};
use crate::errors::{AutoclaveError, Result};
use crate::types::IgnoredExitCodes;

impl TryFrom<RawConfig> for Config {
    type Error = AutoclaveError;

    fn try_from(raw: RawConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;

        let kill_signal = match raw.kill_signal {
            Some(ref spec) => parse_signal(spec)?,
            None => Signal::SIGTERM,
        };
        let ignored = match raw.ignore_exit_codes {
            Some(ref list) => parse_exit_codes(list)?,
            None => IgnoredExitCodes::default(),
        };
        let prefix = match raw.output_prefix {
            Some(ref prefix) => prefix.clone(),
            None => default_output_prefix(&raw.command[0]),
        };

        Ok(Config::new_unchecked(raw, prefix, kill_signal, ignored))
    }
}

fn validate_raw_config(cfg: &RawConfig) -> Result<()> {
    ensure_has_command(cfg)?;
    validate_counts(cfg)?;
    Ok(())
}

fn ensure_has_command(cfg: &RawConfig) -> Result<()> {
    match cfg.command.first() {
        None => Err(AutoclaveError::ConfigError(
            "no command given to run".to_string(),
        )),
        Some(program) if program.is_empty() => Err(AutoclaveError::ConfigError(
            "command must not be an empty string".to_string(),
        )),
        Some(_) => Ok(()),
    }
}

fn validate_counts(cfg: &RawConfig) -> Result<()> {
    if cfg.max_failures == Some(0) {
        return Err(AutoclaveError::ConfigError(
            "max failures must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.rotate_count == Some(0) {
        return Err(AutoclaveError::ConfigError(
            "rotation count must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.timeout_sec == Some(0) {
        return Err(AutoclaveError::ConfigError(
            "timeout must be >= 1 second (got 0)".to_string(),
        ));
    }
    Ok(())
}

/// Resolve a signal given by number or by name.
///
/// Names are case-insensitive and the `SIG` prefix is optional, so `9`,
/// `kill`, `KILL` and `SIGKILL` all resolve to the same signal.
pub fn parse_signal(spec: &SignalSpec) -> Result<Signal> {
    match spec {
        SignalSpec::Number(n) => signal_from_number(*n),
        SignalSpec::Name(name) => {
            let name = name.trim();
            if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
                let n = name
                    .parse::<i64>()
                    .map_err(|_| invalid_signal(name))?;
                return signal_from_number(n);
            }

            let upper = name.to_ascii_uppercase();
            let full = if upper.starts_with("SIG") {
                upper
            } else {
                format!("SIG{upper}")
            };
            Signal::from_str(&full).map_err(|_| invalid_signal(name))
        }
    }
}

fn signal_from_number(n: i64) -> Result<Signal> {
    i32::try_from(n)
        .ok()
        .filter(|n| *n > 0)
        .and_then(|n| Signal::try_from(n).ok())
        .ok_or_else(|| invalid_signal(&n.to_string()))
}

fn invalid_signal(name: &str) -> AutoclaveError {
    AutoclaveError::ConfigError(format!("invalid signal: {name}"))
}

fn parse_exit_codes(list: &ExitCodeList) -> Result<IgnoredExitCodes> {
    match list {
        ExitCodeList::Csv(s) => IgnoredExitCodes::from_str(s).map_err(AutoclaveError::ConfigError),
        ExitCodeList::List(codes) => codes
            .iter()
            .map(|code| {
                u8::try_from(*code).map_err(|_| {
                    AutoclaveError::ConfigError(format!(
                        "invalid exit code {code} (expected 0-255)"
                    ))
                })
            })
            .collect(),
    }
}

/// Log prefix used when none is configured: `autoclave_<basename>`.
pub fn default_output_prefix(program: &str) -> String {
    let base = Path::new(program)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string());
    format!("autoclave_{base}")
}

/// Create the directory part of the log prefix, if logs are captured.
///
/// An existing directory is fine; anything else that prevents creating it
/// is a configuration error reported before the first run.
pub fn prepare_log_dir(cfg: &Config) -> Result<()> {
    if !cfg.capture.any() {
        return Ok(());
    }

    match Path::new(&cfg.output_prefix).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            debug!(dir = %dir.display(), "ensuring log directory exists");
            fs::create_dir_all(dir).map_err(|e| {
                AutoclaveError::ConfigError(format!(
                    "cannot create log directory {}: {e}",
                    dir.display()
                ))
            })
        }
        _ => Ok(()),
    }
}

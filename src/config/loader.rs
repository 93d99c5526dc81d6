// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::cli::CliArgs;
use crate::config::model::{Config, ExitCodeList, RawConfig, SignalSpec};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfig`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Build the validated configuration for this invocation.
///
/// - Reads the `--config` file, if one was given.
/// - Overlays every flag that was actually passed on the command line.
/// - Validates and resolves defaults (`TryFrom<RawConfig> for Config`).
pub fn load_and_validate(args: &CliArgs) -> Result<Config> {
    let mut raw = match args.config {
        Some(ref path) => load_from_path(path)?,
        None => RawConfig::default(),
    };
    raw.apply_cli(args);
    Config::try_from(raw)
}

impl RawConfig {
    /// Overlay command-line flags onto values read from a config file.
    ///
    /// Flags that were not given leave the file's value untouched. A
    /// non-empty positional command replaces the file's command entirely.
    pub fn apply_cli(&mut self, args: &CliArgs) {
        if let Some(count) = args.rotate_count {
            self.rotate_count = Some(count);
        }
        if let Some(max) = args.max_failures {
            self.max_failures = Some(max);
        }
        if let Some(ref token) = args.run_id_token {
            self.run_id_token = Some(token.clone());
        }
        if let Some(ref list) = args.ignore_exit_codes {
            self.ignore_exit_codes = Some(ExitCodeList::Csv(list.clone()));
        }
        if let Some(ref sig) = args.kill_signal {
            self.kill_signal = Some(SignalSpec::Name(sig.clone()));
        }
        if let Some(msec) = args.min_duration_msec {
            self.min_duration_msec = Some(msec);
        }
        if let Some(ref prefix) = args.output_prefix {
            self.output_prefix = Some(prefix.clone());
        }
        if let Some(max) = args.max_runs {
            self.max_runs = Some(max);
        }
        if let Some(secs) = args.timeout_sec {
            self.timeout_sec = Some(secs);
        }
        if let Some(ref cmd) = args.on_failure {
            self.on_failure = Some(cmd.clone());
        }

        if args.log_stdout || args.supervise {
            self.log_stdout = true;
        }
        if args.log_stderr || args.supervise {
            self.log_stderr = true;
        }

        // Flags add to the file's level; `-s` counts as one `-v`.
        self.verbosity = self
            .verbosity
            .saturating_add(args.verbosity)
            .saturating_add(u8::from(args.supervise));

        if !args.command.is_empty() {
            self.command = args.command.clone();
        }
    }
}

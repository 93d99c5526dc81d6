#![allow(dead_code)]

use std::path::Path;

use autoclave::config::{Config, ExitCodeList, RawConfig, SignalSpec};

/// Builder for `Config` to simplify test setup.
///
/// Starts from the built-in defaults except for `min_duration_msec`, which
/// is 0 so tests don't pay for run padding unless they ask for it.
pub struct ConfigBuilder {
    config: RawConfig,
}

impl ConfigBuilder {
    pub fn new(command: Vec<String>) -> Self {
        Self {
            config: RawConfig {
                min_duration_msec: Some(0),
                command,
                ..RawConfig::default()
            },
        }
    }

    pub fn max_runs(mut self, n: u64) -> Self {
        self.config.max_runs = Some(n);
        self
    }

    pub fn max_failures(mut self, n: u64) -> Self {
        self.config.max_failures = Some(n);
        self
    }

    pub fn min_duration_msec(mut self, msec: u64) -> Self {
        self.config.min_duration_msec = Some(msec);
        self
    }

    pub fn timeout_sec(mut self, secs: u64) -> Self {
        self.config.timeout_sec = Some(secs);
        self
    }

    pub fn kill_signal(mut self, sig: &str) -> Self {
        self.config.kill_signal = Some(SignalSpec::Name(sig.to_string()));
        self
    }

    pub fn ignore_exit_codes(mut self, codes: &[i64]) -> Self {
        self.config.ignore_exit_codes = Some(ExitCodeList::List(codes.to_vec()));
        self
    }

    /// Capture both streams under `<dir>/<name>`.
    pub fn capture_in(mut self, dir: &Path, name: &str) -> Self {
        self.config.log_stdout = true;
        self.config.log_stderr = true;
        self.config.output_prefix = Some(dir.join(name).to_string_lossy().into_owned());
        self
    }

    pub fn capture_stdout_only(mut self) -> Self {
        self.config.log_stderr = false;
        self
    }

    pub fn rotate(mut self, count: u64) -> Self {
        self.config.rotate_count = Some(count);
        self
    }

    pub fn run_id_token(mut self, token: &str) -> Self {
        self.config.run_id_token = Some(token.to_string());
        self
    }

    pub fn on_failure(mut self, cmd: &str) -> Self {
        self.config.on_failure = Some(cmd.to_string());
        self
    }

    pub fn build(self) -> Config {
        Config::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

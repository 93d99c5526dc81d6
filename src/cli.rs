// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every run-shaping flag is optional here so that values coming from a
//! `--config` file are only overridden by flags actually given. Defaults
//! are applied in [`crate::config`].

use clap::{ArgAction, Parser, ValueEnum};

/// Command-line arguments for `autoclave`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "autoclave",
    version,
    author = "Scott Vokes <vokes.s@gmail.com>",
    about = "Run a program over and over, logging and reacting to its failures.",
    long_about = None
)]
pub struct CliArgs {
    /// Rotate logs, keeping the passing logs of the last COUNT runs.
    #[arg(short = 'c', long = "rotate", value_name = "COUNT")]
    pub rotate_count: Option<u64>,

    /// Log the command's stderr.
    #[arg(short = 'e', long)]
    pub log_stderr: bool,

    /// Stop after this many failed runs (default 1).
    #[arg(short = 'f', long, value_name = "COUNT")]
    pub max_failures: Option<u64>,

    /// Replace every argument equal to STR with the run id.
    #[arg(short = 'i', long = "run-id", value_name = "STR")]
    pub run_id_token: Option<String>,

    /// Comma-separated exit codes that do not count as failures.
    #[arg(short = 'I', long = "ignore-exit", value_name = "LIST")]
    pub ignore_exit_codes: Option<String>,

    /// Signal (number or name) sent to the command on timeout (default SIGTERM).
    #[arg(short = 'k', long, value_name = "SIGNAL")]
    pub kill_signal: Option<String>,

    /// Log the command's stdout.
    #[arg(short = 'l', long)]
    pub log_stdout: bool,

    /// Minimum duration per run; short runs are padded (default 50 msec).
    #[arg(short = 'm', long = "min-duration", value_name = "MSEC")]
    pub min_duration_msec: Option<u64>,

    /// Log path prefix (default: `autoclave_` + the command's basename).
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output_prefix: Option<String>,

    /// Maximum number of runs (default: no limit).
    #[arg(short = 'r', long, value_name = "COUNT")]
    pub max_runs: Option<u64>,

    /// Supervise: shorthand for `-l -e -v`.
    #[arg(short = 's', long)]
    pub supervise: bool,

    /// Timeout for each run, in seconds (default: none).
    #[arg(short = 't', long = "timeout", value_name = "SEC")]
    pub timeout_sec: Option<u64>,

    /// Increase verbosity (repeatable).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbosity: u8,

    /// Shell command executed after each failed run.
    #[arg(short = 'x', long = "on-failure", value_name = "CMD")]
    pub on_failure: Option<String>,

    /// Optional TOML file providing defaults for the flags above.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `AUTOCLAVE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the configuration, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// The command line to run repeatedly.
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Parse the process arguments.
///
/// Usage errors exit with status 1; `--help` and `--version` exit 0.
pub fn parse() -> CliArgs {
    match CliArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    }
}

// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod logs;
pub mod outcome;
pub mod signals;
pub mod types;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{Config, load_and_validate, prepare_log_dir};
use crate::engine::{LoopEnd, RunLoop, RunOptions};
use crate::exec::{ChildExitBridge, ProcessBackend};
use crate::signals::wait_for_interrupt;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + CLI flags)
/// - the SIGCHLD bridge
/// - the process backend and run loop
/// - SIGINT / SIGTERM handling
///
/// Returns the process exit status.
pub async fn run(args: CliArgs) -> Result<u8> {
    let cfg = load_and_validate(&args)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(0);
    }

    prepare_log_dir(&cfg)?;

    let bridge = ChildExitBridge::install().context("installing SIGCHLD handler")?;
    let backend = ProcessBackend::new(&cfg, bridge);
    let mut run_loop = RunLoop::new(backend, RunOptions::from_config(&cfg));

    info!(cmd = ?cfg.command, "supervising command");

    let end = tokio::select! {
        res = run_loop.run() => LoopEnd::Stopped(res?),
        res = wait_for_interrupt() => {
            res.context("listening for interrupt signals")?;
            info!("interrupted; stopping run loop");
            LoopEnd::Interrupted
        }
    };

    println!("{}", run_loop.summary());
    Ok(run_loop.exit_code(end))
}

/// Simple dry-run output: print the resolved configuration.
fn print_dry_run(cfg: &Config) {
    println!("autoclave dry-run");
    println!("  command: {:?}", cfg.command);
    println!("  max_failures = {}", cfg.max_failures);
    match cfg.max_runs {
        Some(max) => println!("  max_runs = {max}"),
        None => println!("  max_runs = unlimited"),
    }
    match cfg.timeout_sec {
        Some(secs) => println!("  timeout_sec = {secs} (kill signal {})", cfg.kill_signal),
        None => println!("  timeout_sec = none"),
    }
    println!("  min_duration_msec = {}", cfg.min_duration.as_millis());
    println!(
        "  log_stdout = {}, log_stderr = {}",
        cfg.capture.stdout, cfg.capture.stderr
    );
    if cfg.capture.any() {
        println!("  output_prefix = {}", cfg.output_prefix);
        println!("  rotation = {:?}", cfg.rotation);
    }
    println!("  ignored exit codes: {:?}", cfg.ignored_exit_codes);
    if let Some(ref token) = cfg.run_id_token {
        println!("  run id token: {token}");
    }
    if let Some(ref cmd) = cfg.on_failure {
        println!("  on failure: {cmd}");
    }
    println!("  verbosity = {}", cfg.verbosity);

    debug!("dry-run complete (no execution)");
}

// tests/config_loading.rs

use std::error::Error;
use std::io::Write;
use std::time::Duration;

use clap::Parser;
use nix::sys::signal::Signal;
use tempfile::{NamedTempFile, TempDir};

use autoclave::cli::CliArgs;
use autoclave::config::{
    Config, RawConfig, SignalSpec, default_output_prefix, load_and_validate, parse_signal,
    prepare_log_dir,
};
use autoclave::errors::AutoclaveError;
use autoclave::types::{RotationPolicy, TickBudget};

type TestResult = Result<(), Box<dyn Error>>;

fn parse(args: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(std::iter::once("autoclave").chain(args.iter().copied()))
        .expect("valid command line")
}

fn config_error(result: autoclave::errors::Result<Config>) -> String {
    match result {
        Err(AutoclaveError::ConfigError(msg)) => msg,
        Err(e) => panic!("Expected ConfigError, got: {e:?}"),
        Ok(cfg) => panic!("Expected error, got Ok({cfg:?})"),
    }
}

#[test]
fn defaults_apply_when_only_a_command_is_given() -> TestResult {
    let cfg = load_and_validate(&parse(&["./crash_example"]))?;

    assert_eq!(cfg.command, vec!["./crash_example".to_string()]);
    assert_eq!(cfg.max_failures, 1);
    assert_eq!(cfg.max_runs, None);
    assert_eq!(cfg.min_duration, Duration::from_millis(50));
    assert_eq!(cfg.timeout_sec, None);
    assert_eq!(cfg.tick_budget(), TickBudget::Unbounded);
    assert_eq!(cfg.kill_signal, Signal::SIGTERM);
    assert_eq!(cfg.rotation, RotationPolicy::None);
    assert!(!cfg.capture.any());
    assert_eq!(cfg.verbosity, 0);
    assert_eq!(cfg.output_prefix, "autoclave_crash_example");
    assert_eq!(cfg.ignored_exit_codes.iter().collect::<Vec<_>>(), vec![0]);
    Ok(())
}

#[test]
fn flags_map_onto_the_config() -> TestResult {
    let cfg = load_and_validate(&parse(&[
        "-c", "5", "-f", "3", "-i", "RUNID", "-I", "1,2", "-k", "KILL", "-m", "200", "-o",
        "out/app", "-r", "100", "-t", "2", "-x", "echo failed", "-l", "echo", "RUNID", "-n",
    ]))?;

    assert_eq!(cfg.rotation, RotationPolicy::KeepLast(5));
    assert_eq!(cfg.max_failures, 3);
    assert_eq!(cfg.run_id_token.as_deref(), Some("RUNID"));
    assert_eq!(cfg.ignored_exit_codes.iter().collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(cfg.kill_signal, Signal::SIGKILL);
    assert_eq!(cfg.min_duration, Duration::from_millis(200));
    assert_eq!(cfg.output_prefix, "out/app");
    assert_eq!(cfg.max_runs, Some(100));
    assert_eq!(cfg.tick_budget(), TickBudget::Ticks(20));
    assert_eq!(cfg.on_failure.as_deref(), Some("echo failed"));
    assert!(cfg.capture.stdout);
    assert!(!cfg.capture.stderr);
    // Everything after the command belongs to the command, flags included.
    assert_eq!(cfg.command, vec!["echo", "RUNID", "-n"]);
    Ok(())
}

#[test]
fn supervise_shorthand_enables_capture_and_one_verbosity_level() -> TestResult {
    let cfg = load_and_validate(&parse(&["-s", "-v", "true"]))?;
    assert!(cfg.capture.stdout);
    assert!(cfg.capture.stderr);
    assert_eq!(cfg.verbosity, 2);
    Ok(())
}

#[test]
fn missing_command_is_a_config_error() {
    let msg = config_error(load_and_validate(&parse(&["-r", "3"])));
    assert!(msg.contains("no command"));
}

#[test]
fn zero_counts_are_rejected() {
    assert!(config_error(load_and_validate(&parse(&["-f", "0", "true"]))).contains("max failures"));
    assert!(config_error(load_and_validate(&parse(&["-c", "0", "true"]))).contains("rotation"));
    assert!(config_error(load_and_validate(&parse(&["-t", "0", "true"]))).contains("timeout"));
}

#[test]
fn malformed_ignore_list_is_rejected() {
    let msg = config_error(load_and_validate(&parse(&["-I", "1,300", "true"])));
    assert!(msg.contains("300"));
}

#[test]
fn invalid_signal_is_rejected() {
    let msg = config_error(load_and_validate(&parse(&["-k", "SIGNOPE", "true"])));
    assert!(msg.contains("invalid signal"));
    let msg = config_error(load_and_validate(&parse(&["-k", "0", "true"])));
    assert!(msg.contains("invalid signal"));
}

#[test]
fn signals_resolve_by_number_or_name() -> TestResult {
    assert_eq!(parse_signal(&SignalSpec::Number(9))?, Signal::SIGKILL);
    assert_eq!(parse_signal(&SignalSpec::Name("15".into()))?, Signal::SIGTERM);
    assert_eq!(parse_signal(&SignalSpec::Name("int".into()))?, Signal::SIGINT);
    assert_eq!(parse_signal(&SignalSpec::Name("SIGABRT".into()))?, Signal::SIGABRT);
    assert!(parse_signal(&SignalSpec::Number(-1)).is_err());
    assert!(parse_signal(&SignalSpec::Number(100_000)).is_err());
    Ok(())
}

#[test]
fn default_prefix_uses_the_command_basename() {
    assert_eq!(default_output_prefix("/usr/local/bin/flaky"), "autoclave_flaky");
    assert_eq!(default_output_prefix("flaky"), "autoclave_flaky");
}

#[test]
fn config_file_values_are_overridden_by_flags() -> TestResult {
    let mut file = NamedTempFile::new()?;
    write!(
        file,
        r#"
max_failures = 4
max_runs = 50
timeout_sec = 3
kill_signal = 9
ignore_exit_codes = [7]
log_stderr = true
command = ["./from-file", "arg"]
"#
    )?;
    let path = file.path().to_string_lossy().into_owned();

    let cfg = load_and_validate(&parse(&["--config", &path, "-r", "5"]))?;
    assert_eq!(cfg.max_failures, 4);
    assert_eq!(cfg.max_runs, Some(5));
    assert_eq!(cfg.timeout_sec, Some(3));
    assert_eq!(cfg.kill_signal, Signal::SIGKILL);
    assert!(cfg.ignored_exit_codes.contains(7));
    assert!(cfg.capture.stderr);
    assert_eq!(cfg.command, vec!["./from-file", "arg"]);

    let cfg = load_and_validate(&parse(&["--config", &path, "./from-cli"]))?;
    assert_eq!(cfg.command, vec!["./from-cli"]);
    Ok(())
}

#[test]
fn unknown_config_keys_are_rejected() -> TestResult {
    let mut file = NamedTempFile::new()?;
    write!(file, "max_fails = 2\ncommand = [\"true\"]\n")?;
    let path = file.path().to_string_lossy().into_owned();

    let result = load_and_validate(&parse(&["--config", &path]));
    assert!(matches!(result, Err(AutoclaveError::TomlError(_))));
    Ok(())
}

#[test]
fn log_directory_is_created_only_when_capturing() -> TestResult {
    let dir = TempDir::new()?;
    let prefix = dir.path().join("nested/logs/app").to_string_lossy().into_owned();

    let raw = RawConfig {
        output_prefix: Some(prefix.clone()),
        command: vec!["true".to_string()],
        ..RawConfig::default()
    };
    prepare_log_dir(&Config::try_from(raw.clone())?)?;
    assert!(!dir.path().join("nested").exists());

    let capturing = RawConfig {
        log_stdout: true,
        ..raw
    };
    let cfg = Config::try_from(capturing)?;
    prepare_log_dir(&cfg)?;
    assert!(dir.path().join("nested/logs").is_dir());

    // Second time around the directory already exists.
    prepare_log_dir(&cfg)?;
    Ok(())
}

#[test]
fn verbosity_flags_add_to_the_config_file_level() -> TestResult {
    let mut file = NamedTempFile::new()?;
    write!(file, "verbosity = 2\ncommand = [\"true\"]\n")?;
    let path = file.path().to_string_lossy().into_owned();

    assert_eq!(load_and_validate(&parse(&["--config", &path]))?.verbosity, 2);
    assert_eq!(load_and_validate(&parse(&["--config", &path, "-v"]))?.verbosity, 3);
    assert_eq!(load_and_validate(&parse(&["--config", &path, "-s", "-vv"]))?.verbosity, 5);
    Ok(())
}

// tests/run_loop.rs

mod common;
use crate::common::fake_backend::{RecordedRun, ScriptedBackend};
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use autoclave::engine::{LoopEnd, RunLoop, RunOptions, RunState, StopReason, Summary};
use autoclave::outcome::{RawStatus, Supervision};

type TestResult = Result<(), Box<dyn Error>>;

fn options(max_runs: Option<u64>, max_failures: u64) -> RunOptions {
    RunOptions {
        max_runs,
        max_failures,
        min_duration: Duration::ZERO,
        verbosity: 0,
    }
}

fn recorder() -> Arc<Mutex<Vec<RecordedRun>>> {
    Arc::new(Mutex::new(Vec::new()))
}

fn run_ids(recorded: &Arc<Mutex<Vec<RecordedRun>>>) -> Vec<u64> {
    recorded.lock().unwrap().iter().map(|r| r.run_id).collect()
}

#[tokio::test]
async fn always_failing_command_stops_at_the_failure_threshold() -> TestResult {
    init_tracing();
    let recorded = recorder();
    let backend = ScriptedBackend::always_exit(1, Arc::clone(&recorded));
    let mut run_loop = RunLoop::new(backend, options(None, 3));

    let reason = with_timeout(run_loop.run()).await?;

    assert_eq!(reason, StopReason::FailureThreshold);
    assert_eq!(run_ids(&recorded), vec![1, 2, 3]);
    assert_eq!(run_loop.state().failures(), 3);
    assert_eq!(run_loop.exit_code(LoopEnd::Stopped(reason)), 1);
    Ok(())
}

#[tokio::test]
async fn always_passing_command_stops_at_max_runs() -> TestResult {
    init_tracing();
    let recorded = recorder();
    let backend = ScriptedBackend::always_exit(0, Arc::clone(&recorded));
    let mut run_loop = RunLoop::new(backend, options(Some(5), 1));

    let reason = with_timeout(run_loop.run()).await?;

    assert_eq!(reason, StopReason::MaxRuns);
    assert_eq!(run_ids(&recorded), vec![1, 2, 3, 4, 5]);
    let summary = run_loop.summary();
    assert_eq!((summary.runs, summary.passes, summary.failures), (5, 5, 0));
    assert_eq!(run_loop.exit_code(LoopEnd::Stopped(reason)), 0);
    Ok(())
}

#[tokio::test]
async fn zero_max_runs_performs_no_run() -> TestResult {
    let recorded = recorder();
    let backend = ScriptedBackend::always_exit(1, Arc::clone(&recorded));
    let mut run_loop = RunLoop::new(backend, options(Some(0), 1));

    let reason = with_timeout(run_loop.run()).await?;

    assert_eq!(reason, StopReason::MaxRuns);
    assert!(run_ids(&recorded).is_empty());
    assert_eq!(run_loop.exit_code(LoopEnd::Stopped(reason)), 0);
    Ok(())
}

#[tokio::test]
async fn failure_on_the_last_allowed_run_still_counts() -> TestResult {
    let recorded = recorder();
    let backend = ScriptedBackend::new(
        vec![
            Supervision::Finished(RawStatus::Exited(0)),
            Supervision::Finished(RawStatus::Exited(0)),
            Supervision::TimedOut,
        ],
        Arc::clone(&recorded),
    );
    let mut run_loop = RunLoop::new(backend, options(Some(3), 1));

    let reason = with_timeout(run_loop.run()).await?;

    // Both limits are hit by run 3; the failure threshold wins.
    assert_eq!(reason, StopReason::FailureThreshold);
    let summary = run_loop.summary();
    assert_eq!((summary.runs, summary.passes, summary.failures), (3, 2, 1));
    assert_eq!(run_loop.exit_code(LoopEnd::Stopped(reason)), 1);
    Ok(())
}

#[tokio::test]
async fn mixed_outcomes_are_counted_separately() -> TestResult {
    let recorded = recorder();
    let backend = ScriptedBackend::new(
        vec![
            Supervision::Finished(RawStatus::Exited(0)),
            Supervision::Finished(RawStatus::Signaled {
                signal: 11,
                core_dumped: true,
            }),
            Supervision::Finished(RawStatus::Exited(0)),
            Supervision::Finished(RawStatus::Stopped(19)),
            Supervision::Finished(RawStatus::Exited(0)),
        ],
        Arc::clone(&recorded),
    );
    let mut run_loop = RunLoop::new(backend, options(Some(6), 10));

    let reason = with_timeout(run_loop.run()).await?;

    assert_eq!(reason, StopReason::MaxRuns);
    assert_eq!(run_loop.state().runs(), 6);
    assert_eq!(run_loop.state().failures(), 2);
    assert_eq!(run_loop.state().passes(), 4);
    // Hitting max runs is a clean stop even with failures below threshold.
    assert_eq!(run_loop.exit_code(LoopEnd::Stopped(reason)), 0);
    Ok(())
}

#[tokio::test]
async fn short_runs_are_padded_to_the_minimum_duration() -> TestResult {
    let recorded = recorder();
    let backend = ScriptedBackend::always_exit(0, Arc::clone(&recorded));
    let mut run_loop = RunLoop::new(
        backend,
        RunOptions {
            min_duration: Duration::from_millis(200),
            ..options(Some(3), 1)
        },
    );

    with_timeout(run_loop.run()).await?;

    let runs = recorded.lock().unwrap().clone();
    assert_eq!(runs.len(), 3);
    for pair in runs.windows(2) {
        let gap = pair[1].started - pair[0].started;
        assert!(gap >= Duration::from_millis(200), "gap too short: {gap:?}");
    }
    Ok(())
}

#[tokio::test]
async fn long_runs_are_not_padded() -> TestResult {
    let recorded = recorder();
    let backend = ScriptedBackend::always_exit(0, Arc::clone(&recorded))
        .with_run_time(Duration::from_millis(150));
    let mut run_loop = RunLoop::new(
        backend,
        RunOptions {
            min_duration: Duration::from_millis(100),
            ..options(Some(2), 1)
        },
    );

    with_timeout(run_loop.run()).await?;

    let runs = recorded.lock().unwrap().clone();
    let gap = runs[1].started - runs[0].started;
    assert!(gap >= Duration::from_millis(150));
    assert!(gap < Duration::from_millis(240), "unexpected padding: {gap:?}");
    Ok(())
}

#[tokio::test]
async fn no_padding_after_the_final_run() -> TestResult {
    let recorded = recorder();
    let backend = ScriptedBackend::always_exit(0, Arc::clone(&recorded));
    let mut run_loop = RunLoop::new(
        backend,
        RunOptions {
            min_duration: Duration::from_secs(5),
            ..options(Some(1), 1)
        },
    );

    let started = tokio::time::Instant::now();
    with_timeout(run_loop.run()).await?;

    assert!(started.elapsed() < Duration::from_secs(1));
    Ok(())
}

#[test]
fn interrupted_loop_exits_nonzero_only_after_a_failure() {
    let mut state = RunState::new(options(None, 5));
    state.record(false);
    assert_eq!(state.exit_code(LoopEnd::Interrupted), 0);
    state.record(true);
    assert_eq!(state.exit_code(LoopEnd::Interrupted), 1);
}

#[test]
fn run_ids_start_at_one_and_follow_the_run_count() {
    let mut state = RunState::new(options(None, 5));
    assert_eq!(state.next_run_id(), 1);
    state.record(true);
    state.record(false);
    assert_eq!(state.next_run_id(), 3);
    assert_eq!(state.stop_reason(), None);
}

#[test]
fn summary_line_uses_singular_and_plural_forms() {
    let one = Summary {
        runs: 1,
        passes: 1,
        failures: 1,
        elapsed: Duration::from_micros(1_500),
    };
    assert_eq!(one.to_string(), "-- 1 run, 1 pass, 1 failure, 1.500 msec");

    let many = Summary {
        runs: 3,
        passes: 0,
        failures: 3,
        elapsed: Duration::from_millis(2_000),
    };
    assert_eq!(many.to_string(), "-- 3 runs, 0 passes, 3 failures, 2000.000 msec");
}

#[test]
fn progress_line_reports_counts_and_run_duration() {
    let mut state = RunState::new(options(None, 5));
    state.record(false);
    state.record(true);

    let line = state.progress_line(Duration::from_millis(12));
    let (clock, rest) = line.split_once(" -- ").expect("separator");
    assert_eq!(rest, "2 runs, 1 failure, 12.000 msec");

    let (secs, micros) = clock.split_once('.').expect("clock");
    assert_eq!(secs.len(), 8);
    assert_eq!(micros.len(), 6);
}

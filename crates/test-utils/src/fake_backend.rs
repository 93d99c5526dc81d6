use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use autoclave::errors::Result;
use autoclave::exec::{RunBackend, RunReport};
use autoclave::logs::FinalizedLogs;
use autoclave::outcome::{classify, RawStatus, Supervision};
use autoclave::types::IgnoredExitCodes;

/// One run as recorded by [`ScriptedBackend`].
#[derive(Debug, Clone, Copy)]
pub struct RecordedRun {
    pub run_id: u64,
    pub started: Instant,
}

/// A fake backend that:
/// - records which run ids were executed, and when
/// - answers each run with the next scripted outcome (the last one repeats)
/// - optionally takes `run_time` per run.
pub struct ScriptedBackend {
    outcomes: Vec<Supervision>,
    run_time: Duration,
    recorded: Arc<Mutex<Vec<RecordedRun>>>,
}

impl ScriptedBackend {
    pub fn new(outcomes: Vec<Supervision>, recorded: Arc<Mutex<Vec<RecordedRun>>>) -> Self {
        assert!(!outcomes.is_empty(), "ScriptedBackend needs at least one outcome");
        Self {
            outcomes,
            run_time: Duration::ZERO,
            recorded,
        }
    }

    /// Every run exits with `code`.
    pub fn always_exit(code: i32, recorded: Arc<Mutex<Vec<RecordedRun>>>) -> Self {
        Self::new(vec![Supervision::Finished(RawStatus::Exited(code))], recorded)
    }

    pub fn with_run_time(mut self, run_time: Duration) -> Self {
        self.run_time = run_time;
        self
    }
}

impl RunBackend for ScriptedBackend {
    fn execute_run(
        &mut self,
        run_id: u64,
    ) -> Pin<Box<dyn Future<Output = Result<RunReport>> + Send + '_>> {
        let idx = (run_id as usize - 1).min(self.outcomes.len() - 1);
        let supervision = self.outcomes[idx];
        let run_time = self.run_time;
        let recorded = Arc::clone(&self.recorded);

        Box::pin(async move {
            recorded.lock().unwrap().push(RecordedRun {
                run_id,
                started: Instant::now(),
            });
            if !run_time.is_zero() {
                tokio::time::sleep(run_time).await;
            }

            let status = classify(4242, run_id, supervision, &IgnoredExitCodes::default());
            Ok(RunReport {
                status,
                logs: FinalizedLogs::default(),
            })
        })
    }
}

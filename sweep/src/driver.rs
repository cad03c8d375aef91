//! The sweep loop.
//!
//! Runs `trials_per_demand` trials at each demand count, starting at
//! `start_demands` and advancing by `increment`, until a whole batch fails.

use tracing::{info, instrument, warn};

use crate::core::outcome::{BatchTally, SweepStep, TrialStatus, next_step};
use crate::core::sweep_config::SweepConfig;
use crate::error::SweepError;
use crate::io::storage::ensure_dir;
use crate::io::tool::{TrialExecutor, TrialRequest};

/// What a finished sweep did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepSummary {
    /// Demand count of the batch in which every trial failed.
    pub stopped_at: u64,
    pub batches: Vec<BatchTally>,
}

impl SweepSummary {
    pub fn successes(&self) -> u32 {
        self.batches.iter().map(|batch| batch.succeeded).sum()
    }
}

/// Run the sweep to completion.
///
/// Only directory creation can fail the sweep; trial failures are printed and
/// counted.
#[instrument(skip_all, fields(start = config.start_demands, increment = config.increment, policy = %config.policy))]
pub fn run_sweep<E: TrialExecutor>(
    config: &SweepConfig,
    executor: &E,
) -> Result<SweepSummary, SweepError> {
    let layout = config.layout();
    let skew_dir = layout.skew_dir(config.policy, config.skew);
    ensure_dir(&skew_dir)?;
    println!("Output path: {}\n", skew_dir.display());

    let mut batches = Vec::new();
    let mut demands = config.start_demands;
    loop {
        let result_dir = layout.demands_dir(&config.key(demands));
        ensure_dir(&result_dir)?;

        let mut tally = BatchTally::new(demands);
        for trial in 0..config.trials_per_demand {
            println!("Running {demands} demands, iteration {trial}");
            let outcome = executor.run_trial(&TrialRequest {
                demands,
                trial,
                result_dir: &result_dir,
            });
            if !outcome.stdout.is_empty() {
                println!("{}", outcome.stdout);
            }
            match &outcome.status {
                TrialStatus::Succeeded => println!("\tExecution successful"),
                TrialStatus::Failed(reason) => {
                    warn!(demands, trial, reason = ?reason, "trial failed");
                    println!("\tExecution failed");
                }
            }
            tally.record(&outcome.status);
        }
        info!(
            demands,
            succeeded = tally.succeeded,
            failed = tally.failed,
            "batch finished"
        );
        batches.push(tally);

        match next_step(&tally, config.increment) {
            SweepStep::Continue { next_demands } => demands = next_demands,
            SweepStep::Stop => break,
        }
    }

    Ok(SweepSummary {
        stopped_at: demands,
        batches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sweep_config::RawSweepArgs;
    use crate::test_support::{FakeExecutor, count_artifacts};
    use std::path::{Path, PathBuf};

    fn config(root: &Path, start: u64, increment: u64, trials: u32) -> SweepConfig {
        SweepConfig::from_raw(RawSweepArgs {
            tool_dir: PathBuf::from("/opt/net2plan"),
            topology_file: PathBuf::from("topo.n2p"),
            class_file: PathBuf::from("Heuristic.java"),
            start_demands: start,
            increment,
            skew: 50.0,
            single_transponder: "true".to_string(),
            trials_per_demand: trials,
            output_root: root.to_path_buf(),
        })
        .expect("config")
    }

    #[test]
    fn always_failing_tool_stops_after_first_batch() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = config(temp.path(), 100, 50, 4);
        let exec = FakeExecutor::failing();

        let summary = run_sweep(&cfg, &exec).expect("sweep");
        assert_eq!(summary.stopped_at, 100);
        assert_eq!(summary.batches.len(), 1);
        assert_eq!(summary.batches[0].failed, 4);
        assert_eq!(summary.successes(), 0);
        assert_eq!(exec.calls(), 4);
        assert!(cfg.layout().demands_dir(&cfg.key(100)).is_dir());
    }

    #[test]
    fn stops_at_first_capacity_limit_batch() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = config(temp.path(), 10, 20, 3);
        let exec = FakeExecutor::succeeding_below(55);

        let summary = run_sweep(&cfg, &exec).expect("sweep");
        assert_eq!(summary.stopped_at, 70);
        let layout = cfg.layout();
        for demands in [10, 30, 50] {
            let dir = layout.demands_dir(&cfg.key(demands));
            assert_eq!(count_artifacts(&dir), 3, "demands {demands}");
        }
        assert_eq!(count_artifacts(&layout.demands_dir(&cfg.key(70))), 0);
    }

    #[test]
    fn partial_batch_failure_keeps_sweeping() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = config(temp.path(), 1, 1, 3);
        // trial 0 always fails, others succeed up to demands 2
        let exec = FakeExecutor::with(|demands, trial| trial > 0 && demands <= 2);

        let summary = run_sweep(&cfg, &exec).expect("sweep");
        assert_eq!(summary.stopped_at, 3);
        assert_eq!(summary.batches[0].succeeded, 2);
        assert_eq!(summary.batches[0].failed, 1);
    }

    #[test]
    fn blocked_output_root_is_storage_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let blocker = temp.path().join("results");
        std::fs::write(&blocker, "not a dir").expect("write");
        let cfg = config(&blocker, 1, 1, 1);

        let err = run_sweep(&cfg, &FakeExecutor::failing()).expect_err("storage");
        assert!(matches!(err, SweepError::Storage { .. }));
    }
}

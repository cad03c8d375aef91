//! Trial classification and the sweep stop rule.

use serde::{Deserialize, Serialize};

/// How a finished trial is judged successful.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessOracle {
    /// Stdout contained the success marker. Exit status is ignored.
    #[default]
    Marker,
    /// Marker present and the tool exited with code 0.
    MarkerAndExitCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    MarkerMissing { exit_code: Option<i32> },
    NonZeroExit { exit_code: Option<i32> },
    TimedOut,
    SpawnFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialStatus {
    Succeeded,
    Failed(FailureReason),
}

impl TrialStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Outcome of one planner invocation. Only used to drive the sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialOutcome {
    pub demands: u64,
    pub trial: u32,
    pub status: TrialStatus,
    pub stdout: String,
}

/// Facts about a finished child process.
#[derive(Debug, Clone, Copy)]
pub struct ProcessFacts {
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    /// The success marker appeared anywhere in stdout.
    pub marker_seen: bool,
}

pub fn classify(oracle: SuccessOracle, facts: ProcessFacts) -> TrialStatus {
    if facts.timed_out {
        return TrialStatus::Failed(FailureReason::TimedOut);
    }
    if !facts.marker_seen {
        return TrialStatus::Failed(FailureReason::MarkerMissing {
            exit_code: facts.exit_code,
        });
    }
    match oracle {
        SuccessOracle::Marker => TrialStatus::Succeeded,
        SuccessOracle::MarkerAndExitCode if facts.exit_code == Some(0) => TrialStatus::Succeeded,
        SuccessOracle::MarkerAndExitCode => TrialStatus::Failed(FailureReason::NonZeroExit {
            exit_code: facts.exit_code,
        }),
    }
}

/// Successes and failures of the trials at one demand count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchTally {
    pub demands: u64,
    pub succeeded: u32,
    pub failed: u32,
}

impl BatchTally {
    pub fn new(demands: u64) -> Self {
        Self {
            demands,
            succeeded: 0,
            failed: 0,
        }
    }

    pub fn record(&mut self, status: &TrialStatus) {
        if status.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn all_failed(&self) -> bool {
        self.succeeded == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepStep {
    Continue { next_demands: u64 },
    Stop,
}

/// The only stop condition: every trial of the batch failed.
///
/// Also stops if the next demand count would overflow.
pub fn next_step(tally: &BatchTally, increment: u64) -> SweepStep {
    if tally.all_failed() {
        return SweepStep::Stop;
    }
    match tally.demands.checked_add(increment) {
        Some(next_demands) => SweepStep::Continue { next_demands },
        None => SweepStep::Stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(exit_code: Option<i32>, marker_seen: bool) -> ProcessFacts {
        ProcessFacts {
            exit_code,
            timed_out: false,
            marker_seen,
        }
    }

    #[test]
    fn marker_oracle_ignores_exit_code() {
        let status = classify(SuccessOracle::Marker, facts(Some(1), true));
        assert_eq!(status, TrialStatus::Succeeded);
    }

    #[test]
    fn missing_marker_fails_even_on_zero_exit() {
        let status = classify(SuccessOracle::Marker, facts(Some(0), false));
        assert_eq!(
            status,
            TrialStatus::Failed(FailureReason::MarkerMissing { exit_code: Some(0) })
        );
    }

    #[test]
    fn strict_oracle_requires_zero_exit() {
        let status = classify(SuccessOracle::MarkerAndExitCode, facts(None, true));
        assert_eq!(
            status,
            TrialStatus::Failed(FailureReason::NonZeroExit { exit_code: None })
        );
        let status = classify(SuccessOracle::MarkerAndExitCode, facts(Some(0), true));
        assert!(status.is_success());
    }

    #[test]
    fn timeout_is_failure() {
        let facts = ProcessFacts {
            exit_code: None,
            timed_out: true,
            marker_seen: true,
        };
        assert_eq!(
            classify(SuccessOracle::Marker, facts),
            TrialStatus::Failed(FailureReason::TimedOut)
        );
    }

    #[test]
    fn partial_failure_continues_and_full_failure_stops() {
        let mut tally = BatchTally::new(100);
        tally.record(&TrialStatus::Failed(FailureReason::TimedOut));
        tally.record(&TrialStatus::Succeeded);
        assert_eq!(
            next_step(&tally, 50),
            SweepStep::Continue { next_demands: 150 }
        );

        let mut tally = BatchTally::new(150);
        tally.record(&TrialStatus::Failed(FailureReason::TimedOut));
        tally.record(&TrialStatus::Failed(FailureReason::TimedOut));
        assert_eq!(next_step(&tally, 50), SweepStep::Stop);
    }

    #[test]
    fn overflowing_increment_stops() {
        let mut tally = BatchTally::new(u64::MAX - 1);
        tally.record(&TrialStatus::Succeeded);
        assert_eq!(next_step(&tally, 5), SweepStep::Stop);
    }
}

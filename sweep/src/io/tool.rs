//! Planner invocation.
//!
//! [`TrialExecutor`] is the seam between the sweep loop and the external
//! planner; [`Net2PlanExecutor`] is the production implementation.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, instrument, warn};

use crate::core::layout::format_float;
use crate::core::outcome::{FailureReason, ProcessFacts, TrialOutcome, TrialStatus, classify};
use crate::core::sweep_config::SweepConfig;
use crate::error::SweepError;
use crate::io::config::ToolConfig;
use crate::io::process::run_command;

/// One trial to run: demand count, trial index and the leaf directory the
/// planner writes its result into.
#[derive(Debug, Clone, Copy)]
pub struct TrialRequest<'a> {
    pub demands: u64,
    pub trial: u32,
    pub result_dir: &'a Path,
}

pub trait TrialExecutor {
    /// Run one trial. Never fails: any problem is a failed trial.
    fn run_trial(&self, request: &TrialRequest<'_>) -> TrialOutcome;
}

/// Runs `java -jar Net2Plan-CLI.jar --mode net-design ...`.
#[derive(Debug, Clone)]
pub struct Net2PlanExecutor {
    tool: ToolConfig,
    jar: PathBuf,
    topology_file: PathBuf,
    class_file: PathBuf,
    class_name: String,
    skew: f64,
    single_transponder: bool,
}

impl Net2PlanExecutor {
    pub fn new(sweep: &SweepConfig, tool: ToolConfig) -> Result<Self, SweepError> {
        Ok(Self {
            jar: sweep.tool_dir.join(&tool.jar_name),
            topology_file: sweep.topology_file.clone(),
            class_file: sweep.class_file.clone(),
            class_name: sweep.class_name()?,
            skew: sweep.skew,
            single_transponder: sweep.policy.is_single(),
            tool,
        })
    }

    /// Named `--alg-param` values in the order they are passed.
    pub fn alg_params(&self, request: &TrialRequest<'_>) -> Vec<(&'static str, String)> {
        vec![
            ("NumberOfDemands", request.demands.to_string()),
            ("k", self.tool.k.to_string()),
            (
                "maxPropagationDelayMs",
                format_float(self.tool.max_propagation_delay_ms),
            ),
            (
                "numFrequencySlotsPerFiber",
                self.tool.num_frequency_slots_per_fiber.to_string(),
            ),
            ("percentageOfCoreTraffic", format_float(self.skew)),
            ("resultPath", request.result_dir.display().to_string()),
            (
                "singleTransponderForAll",
                self.single_transponder.to_string(),
            ),
            (
                "singleTransponderType",
                self.tool.single_transponder_type.to_string(),
            ),
        ]
    }

    pub fn args(&self, request: &TrialRequest<'_>) -> Vec<String> {
        let mut args = vec![
            "-jar".to_string(),
            self.jar.display().to_string(),
            "--mode".to_string(),
            "net-design".to_string(),
            "--input-file".to_string(),
            self.topology_file.display().to_string(),
            "--output-file".to_string(),
            self.tool.output_file.clone(),
            "--class-file".to_string(),
            self.class_file.display().to_string(),
            "--class-name".to_string(),
            self.class_name.clone(),
        ];
        for (name, value) in self.alg_params(request) {
            args.push("--alg-param".to_string());
            args.push(format!("{name}={value}"));
        }
        args
    }

    pub fn command(&self, request: &TrialRequest<'_>) -> Command {
        let mut cmd = Command::new(&self.tool.java);
        cmd.args(self.args(request));
        cmd
    }
}

impl TrialExecutor for Net2PlanExecutor {
    #[instrument(skip_all, fields(demands = request.demands, trial = request.trial))]
    fn run_trial(&self, request: &TrialRequest<'_>) -> TrialOutcome {
        let output = match run_command(
            self.command(request),
            self.tool.trial_timeout(),
            self.tool.output_limit_bytes,
            Some(self.tool.success_marker.as_str()),
        ) {
            Ok(output) => output,
            Err(err) => {
                warn!(err = %format!("{err:#}"), "planner could not be run");
                return TrialOutcome {
                    demands: request.demands,
                    trial: request.trial,
                    status: TrialStatus::Failed(FailureReason::SpawnFailed(format!("{err:#}"))),
                    stdout: String::new(),
                };
            }
        };

        let stdout = output.stdout_lossy();
        let stderr = output.stderr_lossy();
        if !stderr.trim().is_empty() {
            debug!(stderr = %stderr.trim(), "planner stderr");
        }

        let status = classify(
            self.tool.success_oracle,
            ProcessFacts {
                exit_code: output.status.code(),
                timed_out: output.timed_out,
                marker_seen: output.stdout_match,
            },
        );
        TrialOutcome {
            demands: request.demands,
            trial: request.trial,
            status,
            stdout,
        }
    }
}

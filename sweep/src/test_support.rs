//! Test-only helpers: a scripted trial executor and artifact fixtures.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::layout::{ArtifactKey, LayoutPath};
use crate::core::outcome::{FailureReason, TrialOutcome, TrialStatus};
use crate::io::tool::{TrialExecutor, TrialRequest};

pub const SUCCESS_MARKER: &str = "Algorithm finished successfully";

type Script = Box<dyn Fn(u64, u32) -> bool>;

/// Executor that succeeds when `script(demands, trial)` is true and then
/// writes one artifact into the result directory, like the real planner.
pub struct FakeExecutor {
    script: Script,
    calls: Cell<u32>,
}

impl FakeExecutor {
    pub fn with(script: impl Fn(u64, u32) -> bool + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: Cell::new(0),
        }
    }

    pub fn failing() -> Self {
        Self::with(|_, _| false)
    }

    pub fn succeeding_below(limit: u64) -> Self {
        Self::with(move |demands, _| demands < limit)
    }

    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl TrialExecutor for FakeExecutor {
    fn run_trial(&self, request: &TrialRequest<'_>) -> TrialOutcome {
        self.calls.set(self.calls.get() + 1);
        if !(self.script)(request.demands, request.trial) {
            return TrialOutcome {
                demands: request.demands,
                trial: request.trial,
                status: TrialStatus::Failed(FailureReason::MarkerMissing { exit_code: Some(1) }),
                stdout: "Not enough resources".to_string(),
            };
        }
        let fields = sample_fields(request.demands, true);
        write_artifact(
            request.result_dir,
            &format!("results{}_{}.xml", request.demands, request.trial),
            &fields,
        );
        TrialOutcome {
            demands: request.demands,
            trial: request.trial,
            status: TrialStatus::Succeeded,
            stdout: SUCCESS_MARKER.to_string(),
        }
    }
}

/// Plausible planner result fields for `demands`.
pub fn sample_fields(demands: u64, single: bool) -> Vec<(String, String)> {
    let zr = demands * 2;
    let lr = demands;
    vec![
        ("demands".to_string(), demands.to_string()),
        ("single_transponder_for_all".to_string(), single.to_string()),
        ("total_Cost".to_string(), format!("{}.5", zr + lr)),
        ("number_ZR".to_string(), zr.to_string()),
        ("number_LR".to_string(), lr.to_string()),
        ("Transponder_Island1".to_string(), (zr / 2).to_string()),
        ("Transponder_Island2".to_string(), (zr / 2 + lr).to_string()),
        ("ZR_Island1".to_string(), (zr / 2).to_string()),
        ("ZR_Island2".to_string(), (zr / 2).to_string()),
        ("LR_Island1".to_string(), "0".to_string()),
        ("LR_Island2".to_string(), lr.to_string()),
        ("ZR_NodeA".to_string(), zr.to_string()),
        ("LR_NodeB".to_string(), lr.to_string()),
    ]
}

/// Render one result row the way the planner writes it.
pub fn artifact_xml(fields: &[(String, String)]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<data>\n  <row>\n");
    for (name, value) in fields {
        xml.push_str(&format!("    <{name}>{value}</{name}>\n"));
    }
    xml.push_str("  </row>\n</data>\n");
    xml
}

pub fn write_artifact(dir: &Path, file_name: &str, fields: &[(String, String)]) -> PathBuf {
    fs::create_dir_all(dir).expect("create artifact dir");
    let path = dir.join(file_name);
    fs::write(&path, artifact_xml(fields)).expect("write artifact");
    path
}

/// Write `count` artifacts for `key` below `layout`.
pub fn populate(layout: &LayoutPath, key: &ArtifactKey, count: usize) {
    let dir = layout.demands_dir(key);
    for trial in 0..count {
        let fields = sample_fields(key.demands, key.policy.is_single());
        write_artifact(&dir, &format!("results{}_{trial}.xml", key.demands), &fields);
    }
}

/// Number of `.xml` files directly inside `dir` (0 if missing).
pub fn count_artifacts(dir: &Path) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().is_some_and(|e| e == "xml"))
        .count()
}

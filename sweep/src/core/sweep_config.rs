//! Sweep configuration validation.
//!
//! The raw values come from positional CLI arguments; this module turns them
//! into an immutable [`SweepConfig`] or a configuration error.

use std::path::{Path, PathBuf};

use crate::core::layout::{ArtifactKey, LayoutPath, TransponderPolicy};
use crate::error::SweepError;

const TRUTHY: &[&str] = &["true", "1", "t", "y", "yes"];
const FALSY: &[&str] = &["false", "0", "f", "n", "no"];

/// Immutable parameters of one sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    /// Directory containing the planner's CLI jar.
    pub tool_dir: PathBuf,
    pub topology_file: PathBuf,
    pub class_file: PathBuf,
    pub start_demands: u64,
    pub increment: u64,
    /// Percentage (0-100) of traffic generated by core nodes.
    pub skew: f64,
    pub policy: TransponderPolicy,
    pub trials_per_demand: u32,
    pub output_root: PathBuf,
}

/// Unvalidated values as they arrive from the command line.
#[derive(Debug, Clone)]
pub struct RawSweepArgs {
    pub tool_dir: PathBuf,
    pub topology_file: PathBuf,
    pub class_file: PathBuf,
    pub start_demands: u64,
    pub increment: u64,
    pub skew: f64,
    pub single_transponder: String,
    pub trials_per_demand: u32,
    pub output_root: PathBuf,
}

impl SweepConfig {
    pub fn from_raw(raw: RawSweepArgs) -> Result<Self, SweepError> {
        let single = parse_truthy(&raw.single_transponder)?;
        if raw.increment == 0 {
            return Err(SweepError::configuration(
                "increment number of demands must be > 0",
            ));
        }
        if raw.trials_per_demand == 0 {
            return Err(SweepError::configuration(
                "number of iterations per number of demands must be > 0",
            ));
        }
        if !(0.0..=100.0).contains(&raw.skew) {
            return Err(SweepError::configuration(format!(
                "percentage of core traffic must be within 0..=100, got {}",
                raw.skew
            )));
        }
        class_name(&raw.class_file)?;

        Ok(Self {
            tool_dir: raw.tool_dir,
            topology_file: raw.topology_file,
            class_file: raw.class_file,
            start_demands: raw.start_demands,
            increment: raw.increment,
            skew: raw.skew,
            policy: TransponderPolicy::from_single_flag(single),
            trials_per_demand: raw.trials_per_demand,
            output_root: raw.output_root,
        })
    }

    pub fn layout(&self) -> LayoutPath {
        LayoutPath::new(&self.output_root)
    }

    pub fn key(&self, demands: u64) -> ArtifactKey {
        ArtifactKey {
            policy: self.policy,
            skew: self.skew,
            demands,
        }
    }

    /// Class name handed to the planner, derived from the class file name.
    pub fn class_name(&self) -> Result<String, SweepError> {
        class_name(&self.class_file)
    }
}

/// Parse a transponder-policy flag.
///
/// Case-insensitive; `true, 1, t, y, yes` are true and `false, 0, f, n, no`
/// are false. Anything else is rejected.
pub fn parse_truthy(raw: &str) -> Result<bool, SweepError> {
    let lowered = raw.trim().to_lowercase();
    if TRUTHY.contains(&lowered.as_str()) {
        Ok(true)
    } else if FALSY.contains(&lowered.as_str()) {
        Ok(false)
    } else {
        Err(SweepError::configuration(format!(
            "singleTransponder must be one of {} or {}, got {raw:?}",
            TRUTHY.join("/"),
            FALSY.join("/")
        )))
    }
}

/// Last path component up to the first `.` (`algs/Foo.java` -> `Foo`).
pub fn class_name(class_file: &Path) -> Result<String, SweepError> {
    class_file
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            SweepError::configuration(format!(
                "cannot derive class name from {}",
                class_file.display()
            ))
        })
}

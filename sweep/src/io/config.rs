//! Planner invocation settings loaded from an optional TOML file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::outcome::SuccessOracle;

/// How to launch the planner and judge its output.
///
/// Missing fields default to the values the planner has always been run with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolConfig {
    /// Program used to launch the jar (`<java> -jar <tool dir>/<jar_name> ...`).
    pub java: String,
    pub jar_name: String,
    /// Output design file name passed to `--output-file`.
    pub output_file: String,
    pub success_marker: String,
    pub success_oracle: SuccessOracle,
    /// Maximum number of admissible paths per node pair.
    pub k: u32,
    /// Negative disables the propagation delay limit.
    pub max_propagation_delay_ms: f64,
    pub num_frequency_slots_per_fiber: u32,
    pub single_transponder_type: bool,
    /// Captured stdout/stderr beyond this many bytes is discarded.
    pub output_limit_bytes: usize,
    /// Kill a trial after this many seconds. Unset waits forever.
    pub trial_timeout_secs: Option<u64>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            java: "java".to_string(),
            jar_name: "Net2Plan-CLI.jar".to_string(),
            output_file: "output.n2p".to_string(),
            success_marker: "Algorithm finished successfully".to_string(),
            success_oracle: SuccessOracle::Marker,
            k: 5,
            max_propagation_delay_ms: -1.0,
            num_frequency_slots_per_fiber: 4950,
            single_transponder_type: true,
            output_limit_bytes: 1_000_000,
            trial_timeout_secs: None,
        }
    }
}

impl ToolConfig {
    pub fn validate(&self) -> Result<()> {
        if self.java.trim().is_empty() {
            return Err(anyhow!("java must be non-empty"));
        }
        if self.jar_name.trim().is_empty() {
            return Err(anyhow!("jar_name must be non-empty"));
        }
        if self.success_marker.is_empty() {
            return Err(anyhow!("success_marker must be non-empty"));
        }
        if self.k == 0 {
            return Err(anyhow!("k must be > 0"));
        }
        if self.num_frequency_slots_per_fiber == 0 {
            return Err(anyhow!("num_frequency_slots_per_fiber must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.trial_timeout_secs == Some(0) {
            return Err(anyhow!("trial_timeout_secs must be > 0 when set"));
        }
        Ok(())
    }

    pub fn trial_timeout(&self) -> Option<Duration> {
        self.trial_timeout_secs.map(Duration::from_secs)
    }
}

/// Load tool settings.
///
/// `None` yields `ToolConfig::default()`. An explicit path must exist.
pub fn load_tool_config(path: Option<&Path>) -> Result<ToolConfig> {
    let Some(path) = path else {
        let cfg = ToolConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    };
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ToolConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

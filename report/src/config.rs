//! Report configuration stored as TOML (default `<output-root>/report.toml`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "report.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// Number of nodes in each region, in region-number order.
    pub region_sizes: Vec<f64>,
    /// Nodes listed by the top-N reports (ties may add more).
    pub top_n: usize,
    /// Cached unified table, relative to the output root.
    pub cache_file: String,
    /// Chart directory. Defaults to `<output-root>/plots`.
    pub plots_dir: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            region_sizes: Vec::new(),
            top_n: 10,
            cache_file: "unified_table.json".to_string(),
            plots_dir: None,
        }
    }
}

impl ReportConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(anyhow!("top_n must be > 0"));
        }
        if self.cache_file.trim().is_empty() {
            return Err(anyhow!("cache_file must be non-empty"));
        }
        if Path::new(&self.cache_file).components().count() != 1 {
            return Err(anyhow!("cache_file must be a plain file name"));
        }
        if let Some(size) = self
            .region_sizes
            .iter()
            .find(|size| !size.is_finite() || **size <= 0.0)
        {
            return Err(anyhow!("region_sizes must be positive, got {size}"));
        }
        Ok(())
    }

    pub fn plots_dir(&self, output_root: &Path) -> PathBuf {
        self.plots_dir
            .clone()
            .unwrap_or_else(|| output_root.join("plots"))
    }
}

/// Load the report config.
///
/// With no explicit path, `<output-root>/report.toml` is used if present and
/// `ReportConfig::default()` otherwise. An explicit path must exist.
pub fn load_config(explicit: Option<&Path>, output_root: &Path) -> Result<ReportConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = output_root.join(DEFAULT_CONFIG_FILE);
            if !path.exists() {
                let cfg = ReportConfig::default();
                cfg.validate()?;
                return Ok(cfg);
            }
            path
        }
    };
    let contents = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ReportConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

//! `report` command implementation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use sweep::core::layout::LayoutPath;
use tracing::{debug, info};

use crate::cache::{TableSource, cache_path, load_table};
use crate::config::load_config;
use crate::reports::{ReportStatus, battery, run_reports};

pub struct ReportArgs<'a> {
    pub output_root: &'a Path,
    pub config: Option<&'a Path>,
    pub plots_dir: Option<&'a Path>,
    pub rebuild: bool,
}

/// Build (or load) the unified table and render the report battery.
pub fn run_report(args: &ReportArgs<'_>) -> Result<()> {
    if !args.output_root.is_dir() {
        bail!("results folder missing: {}", args.output_root.display());
    }
    let config = load_config(args.config, args.output_root).context("load report config")?;
    debug!(?config, "report config loaded");

    let cache = cache_path(args.output_root, &config.cache_file);
    if args.rebuild && cache.exists() {
        fs::remove_file(&cache).with_context(|| format!("remove cache {}", cache.display()))?;
        info!(cache = %cache.display(), "cache removed");
    }

    let layout = LayoutPath::new(args.output_root);
    let loaded = load_table(&layout, &cache).context("load unified table")?;
    let partitions = loaded.table.partition();
    let source = match loaded.source {
        TableSource::Cache => "cache",
        TableSource::Tree => "tree",
    };
    println!(
        "report: rows={} single={} multiple={} source={}",
        loaded.table.len(),
        partitions.single.len(),
        partitions.multiple.len(),
        source
    );

    for warning in &loaded.warnings {
        eprintln!("warning: {}", warning);
    }
    if loaded.table.is_empty() {
        println!("report: no rows, nothing to render");
        return Ok(());
    }

    let plots_dir = args
        .plots_dir
        .map_or_else(|| config.plots_dir(args.output_root), Path::to_path_buf);
    let outcomes = run_reports(&battery(), &loaded.table, &config, &plots_dir);
    for outcome in outcomes {
        match outcome.status {
            ReportStatus::Rendered(paths) => {
                for path in paths {
                    println!("report: {} rendered {}", outcome.name, path.display());
                }
            }
            ReportStatus::Skipped(reason) => {
                println!("report: {} skipped ({})", outcome.name, reason);
            }
        }
    }
    Ok(())
}

//! `report`: aggregate a sweep result tree into one table and chart it.

mod artifact;
mod cache;
mod chart;
mod cli;
mod config;
mod error;
mod reports;
mod stats;
mod store;
mod table;

use std::path::PathBuf;

use clap::Parser;

use crate::cli::{ReportArgs, run_report};

#[derive(Parser, Debug)]
#[command(
    name = "report",
    version,
    about = "Aggregate sweep results and render charts"
)]
struct Cli {
    /// Sweep output root.
    #[arg(default_value = "results")]
    output_root: PathBuf,
    /// Report settings (TOML). Defaults to <output-root>/report.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Chart directory, overriding the config.
    #[arg(long)]
    plots_dir: Option<PathBuf>,
    /// Discard the cached table and rescan the result tree.
    #[arg(long)]
    rebuild: bool,
    /// Log progress at info level unless RUST_LOG is set.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    sweep::logging::init(cli.verbose);

    let args = ReportArgs {
        output_root: &cli.output_root,
        config: cli.config.as_deref(),
        plots_dir: cli.plots_dir.as_deref(),
        rebuild: cli.rebuild,
    };
    if let Err(err) = run_report(&args) {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

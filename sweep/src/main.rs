//! `sweep`: run the Net2Plan planner over increasing demand counts until a
//! whole batch of trials fails.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;

use sweep::core::sweep_config::{RawSweepArgs, SweepConfig};
use sweep::driver::run_sweep;
use sweep::io::config::load_tool_config;
use sweep::io::storage::ensure_dir;
use sweep::io::tool::Net2PlanExecutor;
use sweep::{SweepError, exit_codes, logging};

const USAGE: &str = "Usage: sweep <path to Net2Plan-CLI.jar directory> <topology file> <class file> \
<start number of demands> <increment number of demands> \
<percentage of traffic generated by CORE nodes> <singleTransponder> \
<number of iterations per number of demands> [<output dir>]";

#[derive(Parser, Debug)]
#[command(
    name = "sweep",
    version,
    about = "Run the network planner over increasing demand counts"
)]
struct Cli {
    /// Directory containing Net2Plan-CLI.jar.
    tool_dir: PathBuf,
    /// Input topology file.
    topology_file: PathBuf,
    /// Algorithm class file; its stem is the class name.
    class_file: PathBuf,
    /// First number of demands.
    start_demands: u64,
    /// Step between demand counts.
    increment: u64,
    /// Percentage of traffic generated by CORE nodes.
    skew: f64,
    /// Use a single transponder type for all demands (true/1/t/y/yes or false/0/f/n/no).
    single_transponder: String,
    /// Trials per number of demands.
    trials_per_demand: u32,
    /// Output directory (default: ./results).
    output_dir: Option<PathBuf>,
    /// Planner invocation settings (TOML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log progress at info level unless RUST_LOG is set.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => usage_error(err),
    };
    logging::init(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("{:#}", err);
        let code = err
            .downcast_ref::<SweepError>()
            .map_or(exit_codes::INVALID, SweepError::exit_code);
        std::process::exit(code);
    }
}

fn usage_error(err: clap::Error) -> ! {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
        ErrorKind::MissingRequiredArgument => println!("Missing parameters\n"),
        ErrorKind::UnknownArgument => println!("Too many parameters\n"),
        _ => println!("{}", err.render()),
    }
    println!("{USAGE}");
    std::process::exit(exit_codes::INVALID);
}

fn run(cli: Cli) -> Result<()> {
    let tool = load_tool_config(cli.config.as_deref())
        .map_err(|err| SweepError::configuration(format!("{err:#}")))?;

    let output_root = match cli.output_dir {
        Some(dir) => dir,
        None => {
            println!("Missing output path\n");
            std::env::current_dir()
                .context("resolve current directory")?
                .join("results")
        }
    };

    let config = SweepConfig::from_raw(RawSweepArgs {
        tool_dir: cli.tool_dir,
        topology_file: cli.topology_file,
        class_file: cli.class_file,
        start_demands: cli.start_demands,
        increment: cli.increment,
        skew: cli.skew,
        single_transponder: cli.single_transponder,
        trials_per_demand: cli.trials_per_demand,
        output_root,
    })?;
    ensure_dir(&config.output_root)?;

    let executor = Net2PlanExecutor::new(&config, tool)?;
    let summary = run_sweep(&config, &executor)?;

    println!("Execution stopped at {} demands", summary.stopped_at);
    Ok(())
}

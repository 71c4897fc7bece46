#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

//! Binary entry point for the sumbench tool.
//!
//! This module is excluded from mutation testing because it only parses arguments and wires
//! stdio to library functions. The commands are exercised end to end by the integration tests.

use std::io;
use std::num::NonZero;
use std::path::PathBuf;
use std::process::ExitCode;

use argh::FromArgs;
use bench_logs::{ChartFormat, ResultGrid, render_charts};
use sum_pools::protocol::serve_worker;
use sum_pools::{LockMode, Workload};
use sumbench::{
    Driver, DriverConfig, Error, Target, TargetKind, collect, lock_mode_from_env, machine_name,
    scoping, self_worker_command,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

// Used when RUST_LOG is not set.
const DEFAULT_LOG_FILTER: &str = "sumbench=info,sum_pools=info,bench_logs=info";

/// Compare sequential, thread pool and process pool summation with and without a global
/// execution lock.
#[derive(FromArgs)]
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Drive(DriveArgs),
    Worker(WorkerArgs),
    Collect(CollectArgs),
    Chart(ChartArgs),
    Scoping(ScopingArgs),
}

/// Run the benchmark sweep and print the timing log to stdout.
#[derive(FromArgs)]
#[argh(subcommand, name = "drive")]
struct DriveArgs {
    /// TOML file with driver settings
    #[argh(option)]
    config: Option<PathBuf>,

    /// number of partitions the range is split into
    #[argh(option)]
    partitions: Option<NonZero<usize>>,

    /// largest worker count of the pooled strategies
    #[argh(option)]
    max_workers: Option<NonZero<usize>>,

    /// length of the range summed by the loop workload
    #[argh(option)]
    loop_total: Option<u64>,

    /// length of the range summed by the vectorized workload
    #[argh(option)]
    vectorized_total: Option<u64>,

    /// how many times each configuration is timed
    #[argh(option)]
    repeats: Option<NonZero<u32>>,

    /// GIL or free_thread (default: from SUMBENCH_GIL, else GIL)
    #[argh(option)]
    lock_mode: Option<LockMode>,
}

/// Serve summation requests from a process pool on stdin and stdout.
#[derive(FromArgs)]
#[argh(subcommand, name = "worker")]
struct WorkerArgs {
    /// summation function to apply (loop, vectorized)
    #[argh(option)]
    workload: Workload,
}

/// Run a benchmark once per lock mode and store the logs.
#[derive(FromArgs)]
#[argh(subcommand, name = "collect")]
struct CollectArgs {
    /// benchmark to run (native, python)
    #[argh(option, default = "TargetKind::Native")]
    target: TargetKind,

    /// directory the logs are written to
    #[argh(option, default = "PathBuf::from(\"results\")")]
    results_dir: PathBuf,

    /// driver settings passed to the native benchmark
    #[argh(option)]
    config: Option<PathBuf>,

    /// python version to pin for the python benchmark
    #[argh(option, default = "String::from(\"3.14\")")]
    python_version: String,

    /// benchmark script run by the python benchmark
    #[argh(option, default = "PathBuf::from(\"comparison.py\")")]
    script: PathBuf,
}

/// Render comparison charts from the logs in a results directory.
#[derive(FromArgs)]
#[argh(subcommand, name = "chart")]
struct ChartArgs {
    /// directory holding the logs
    #[argh(option, default = "PathBuf::from(\"results\")")]
    results_dir: PathBuf,

    /// directory the charts are written to (default: the results directory)
    #[argh(option)]
    out_dir: Option<PathBuf>,

    /// image format (png, svg)
    #[argh(option, default = "ChartFormat::Png")]
    format: ChartFormat,
}

/// Time a counting loop with its counter in different scopes.
#[derive(FromArgs)]
#[argh(subcommand, name = "scoping")]
struct ScopingArgs {
    /// number of loop iterations per variant
    #[argh(option, default = "scoping::DEFAULT_ITERATIONS")]
    iterations: u64,
}

// Binary entry point - mutations would require subprocess testing which is impractical.
#[cfg_attr(test, mutants::skip)]
fn main() -> ExitCode {
    let args: Args = argh::from_env();

    init_logging();

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(command: Command) -> Result<(), Error> {
    match command {
        Command::Drive(args) => drive(args),
        Command::Worker(args) => {
            let served = serve_worker(io::stdin().lock(), io::stdout().lock(), args.workload)?;
            debug!(served, workload = %args.workload, "worker input exhausted");
            Ok(())
        }
        Command::Collect(args) => collect_logs(args),
        Command::Chart(args) => chart(args),
        Command::Scoping(args) => scoping::run(&mut io::stdout().lock(), args.iterations),
    }
}

fn drive(args: DriveArgs) -> Result<(), Error> {
    let mut config = DriverConfig::load_or_default(args.config.as_deref())?;

    if let Some(partitions) = args.partitions {
        config.partitions = partitions;
    }
    if let Some(max_workers) = args.max_workers {
        config.max_workers = max_workers;
    }
    if let Some(loop_total) = args.loop_total {
        config.loop_total = loop_total;
    }
    if let Some(vectorized_total) = args.vectorized_total {
        config.vectorized_total = vectorized_total;
    }
    if let Some(repeats) = args.repeats {
        config.repeats = repeats;
    }

    let driver = Driver::new(
        config,
        lock_mode_from_env(args.lock_mode),
        self_worker_command()?,
    );

    driver.run(&mut io::stdout().lock())
}

fn collect_logs(args: CollectArgs) -> Result<(), Error> {
    let target = match args.target {
        TargetKind::Python => Target::Python {
            version: args.python_version,
            script: args.script,
        },
        _ => Target::native(args.config)?,
    };

    let machine = machine_name();
    info!(%machine, runtime = target.runtime(), version = target.version(), "identified machine");

    for path in collect(&target, &machine, &args.results_dir)? {
        println!("{}", path.display());
    }

    Ok(())
}

fn chart(args: ChartArgs) -> Result<(), Error> {
    let grid = ResultGrid::load_dir(&args.results_dir)?;
    let out_dir = args.out_dir.unwrap_or_else(|| args.results_dir.clone());

    for path in render_charts(&grid, &out_dir, args.format)? {
        println!("{}", path.display());
    }

    Ok(())
}

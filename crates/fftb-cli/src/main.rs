//! fftb - frequency-domain transform benchmarks
//!
//! Runs the RGB Gaussian-blur benchmark and the N-D cosine round trip.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fftb_ops::kernel::{DEFAULT_KERNEL_SIZE, DEFAULT_SIGMA};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "fftb")]
#[command(author, version, about = "Frequency-domain transform benchmarks")]
#[command(long_about = "
Benchmarks multi-threaded real-input FFTs.

Results are appended to a JSON log keyed by local timestamp.

Examples:
  fftb blur 4 10 blur_results.json                     # Blur test_images/cat.jpeg 10 times
  fftb blur 8 5 out.json --image photo.png --sigma 5 --save blurred.png
  fftb cosine noplot 4 20 1.0 3 64 64 64               # 64x64x64 cosine round trip
  fftb cosine plot 1 1 0.01 1 1024                     # Plot the reconstructed cosine
  fftb -vv cosine noplot 2 3 1.0 2 512 512 --log run.log
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Also write log output to FILE
    #[arg(long, global = true, value_name = "FILE")]
    log: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Blur an RGB image with a Gaussian kernel via the convolution theorem
    Blur(BlurArgs),

    /// Forward/inverse round trip of an N-dimensional cosine
    #[command(visible_alias = "cos")]
    Cosine(CosineArgs),
}

#[derive(Args)]
struct BlurArgs {
    /// Worker threads used by each transform
    threads: usize,

    /// Number of times the image is blurred
    iterations: usize,

    /// JSON results log (appended)
    output: PathBuf,

    /// Input image
    #[arg(short, long, default_value = "test_images/cat.jpeg")]
    image: PathBuf,

    /// Kernel extent in pixels
    #[arg(short, long, default_value_t = DEFAULT_KERNEL_SIZE)]
    kernel_size: usize,

    /// Kernel standard deviation in pixels
    #[arg(short, long, default_value_t = DEFAULT_SIGMA)]
    sigma: f64,

    /// Planning time budget in seconds
    #[arg(long, default_value_t = 2.0)]
    time_limit: f64,

    /// Share planner caches across iterations
    #[arg(long)]
    reuse_plans: bool,

    /// Center the kernel on the origin instead of the top-left corner
    #[arg(long)]
    centered_kernel: bool,

    /// Save the blurred image
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PlotMode {
    /// Plot the reconstructed 1-D slice with gnuplot
    Plot,
    /// No plot
    Noplot,
}

#[derive(Args)]
struct CosineArgs {
    /// Plot the result
    #[arg(value_enum)]
    plot: PlotMode,

    /// Worker threads used by each transform
    threads: usize,

    /// Number of round trips
    iterations: usize,

    /// Sampling frequency of the cosine
    fs: f64,

    /// Number of dimensions
    rank: usize,

    /// Size of each dimension (exactly RANK values)
    #[arg(required = true, num_args = 1..)]
    dims: Vec<usize>,

    /// JSON results log (appended)
    #[arg(short, long, default_value = "cosine_performance_results.json")]
    output: PathBuf,

    /// Data file handed to gnuplot
    #[arg(long, value_name = "FILE", default_value = fftb_io::plot::DEFAULT_SERIES_FILE)]
    data: PathBuf,

    /// Planning time budget in seconds
    #[arg(long, default_value_t = 2.0)]
    time_limit: f64,

    /// Share planner caches across iterations
    #[arg(long)]
    reuse_plans: bool,
}

/// Installs the global subscriber: stderr always, `file` when given.
///
/// `RUST_LOG` overrides the level derived from `-v`.
fn init_logging(verbose: u8, file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(verbose > 1)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install log subscriber")?;
    Ok(guard)
}

impl Commands {
    fn validate(&self) -> Result<()> {
        match self {
            Commands::Blur(args) => commands::blur::validate(args),
            Commands::Cosine(args) => commands::cosine::validate(args),
        }
    }
}

/// Validates, installs logging, then dispatches.
///
/// The `--log` file is only created once the arguments are known to be good.
fn run(cli: Cli) -> Result<()> {
    cli.command.validate()?;
    let _guard = init_logging(cli.verbose, cli.log.as_deref())?;

    match cli.command {
        Commands::Blur(args) => commands::blur::run(args, cli.verbose),
        Commands::Cosine(args) => commands::cosine::run(args, cli.verbose),
    }
}

fn main() -> Result<()> {
    run(Cli::parse())
}

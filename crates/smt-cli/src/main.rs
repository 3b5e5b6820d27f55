use std::sync::atomic::{AtomicI64, AtomicU32, AtomicUsize, Ordering};

use smt_threading::{ParallelismStrategy, ThreadingArgs, ThreadingContext, ThreadingError};
use smt_util::timing::ns_per_iter;
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Threading(#[from] ThreadingError),
    #[error("verification failed: {0}")]
    Verification(String),
}

type Result<T> = std::result::Result<T, CliError>;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Mode {
    OneD,
    TwoD,
}

impl Mode {
    fn as_str(self) -> &'static str {
        match self {
            Mode::OneD => "1d",
            Mode::TwoD => "2d",
        }
    }
}

struct CliArgs {
    mode: Mode,
    low: i64,
    high: i64,
    rows: usize,
    cols: usize,
    threading: ThreadingArgs,
}

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }
    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(args: &[String]) -> Result<()> {
    let cli = parse_args(args)?;
    let ctx = ThreadingContext::new(&cli.threading);
    tracing::info!(
        mode = cli.mode.as_str(),
        threads = ctx.num_threads(),
        strategy = ctx.strategy().as_str(),
        "starting loop"
    );
    match cli.mode {
        Mode::OneD => run_sum(&ctx, cli.low, cli.high),
        Mode::TwoD => run_fill(&ctx, cli.rows, cli.cols),
    }
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut cli = CliArgs {
        mode: Mode::OneD,
        low: 0,
        high: 999_999,
        rows: 512,
        cols: 512,
        threading: ThreadingArgs::default(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--mode" => {
                cli.mode = match value(args, &mut i)? {
                    "1d" => Mode::OneD,
                    "2d" => Mode::TwoD,
                    other => return Err(CliError::Usage(format!("unknown mode: {other}"))),
                };
            }
            "--low" => cli.low = parse_value(args, &mut i)?,
            "--high" => cli.high = parse_value(args, &mut i)?,
            "--rows" => cli.rows = parse_value(args, &mut i)?,
            "--cols" => cli.cols = parse_value(args, &mut i)?,
            "--threads" => cli.threading.max_threads = parse_value(args, &mut i)?,
            "--sequential" => cli.threading.strategy = ParallelismStrategy::None,
            "--quiet" => cli.threading.report_timing = false,
            other => return Err(CliError::Usage(format!("unknown flag: {other}"))),
        }
        i += 1;
    }
    Ok(cli)
}

fn value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| CliError::Usage(format!("{flag} needs a value")))
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: &mut usize) -> Result<T> {
    let flag = args[*i].clone();
    let raw = value(args, i)?;
    raw.parse()
        .map_err(|_| CliError::Usage(format!("invalid value for {flag}: {raw}")))
}

/// Sums every index of `[low, high]` and checks it against `n * (low + high) / 2`.
fn run_sum(ctx: &ThreadingContext, low: i64, high: i64) -> Result<()> {
    let sum = AtomicI64::new(0);
    let visits = AtomicUsize::new(0);
    let report = ctx.parallel_for_1d(low, high, |i| {
        sum.fetch_add(i, Ordering::Relaxed);
        visits.fetch_add(1, Ordering::Relaxed);
    })?;

    let n = high as i128 - low as i128 + 1;
    let ends = low as i128 + high as i128;
    // The atomic wraps, so compare modulo 2^64; one factor is always even.
    let (a, b) = if n % 2 == 0 { (n / 2, ends) } else { (n, ends / 2) };
    let expected = (a as i64).wrapping_mul(b as i64);
    let got = sum.into_inner();
    let visits = visits.into_inner();
    if got != expected || visits as i128 != n {
        return Err(CliError::Verification(format!(
            "sum={got} (expected {expected}), visits={visits} (expected {n})"
        )));
    }
    println!(
        "sum[{low}..={high}] = {got} | chunk={} spawned={} | {:.2} ns/index",
        report.plan.chunk_size(),
        report.spawned,
        ns_per_iter(report.elapsed, visits)
    );
    Ok(())
}

/// Fills a `rows x cols` grid and checks each cell was written exactly once.
fn run_fill(ctx: &ThreadingContext, rows: usize, cols: usize) -> Result<()> {
    let grid: Vec<AtomicU32> = (0..rows.saturating_mul(cols))
        .map(|_| AtomicU32::new(0))
        .collect();
    let report = ctx.parallel_for_2d(0, rows as i64, 0, cols as i64, |r, c| {
        grid[r as usize * cols + c as usize].fetch_add(1, Ordering::Relaxed);
    })?;

    if let Some(bad) = grid.iter().position(|cell| cell.load(Ordering::Relaxed) != 1) {
        return Err(CliError::Verification(format!(
            "cell ({}, {}) written {} times",
            bad / cols,
            bad % cols,
            grid[bad].load(Ordering::Relaxed)
        )));
    }
    println!(
        "filled {rows}x{cols} | chunk={} spawned={} | {:.2} ns/cell",
        report.plan.chunk_size(),
        report.spawned,
        ns_per_iter(report.elapsed, grid.len())
    );
    Ok(())
}

fn print_usage() {
    println!(
        "\
smt usage:
  --mode <1d|2d>        Loop shape (default 1d)
  --low <i64>           1D lower bound, inclusive (default 0)
  --high <i64>          1D upper bound, inclusive (default 999999)
  --rows <n>            2D row count (default 512)
  --cols <n>            2D column count (default 512)
  --threads <n>         Slots per loop, 0 = all CPUs (default 0)
  --sequential          Run every slot on the calling thread
  --quiet               Skip the completion and duration lines
  RUST_LOG=debug        Show partition and spawn details
"
    );
}

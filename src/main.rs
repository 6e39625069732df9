use std::{env, path::PathBuf, process};

use clap::Parser;
use log::LevelFilter;

use sales_analyzer::{Config, DEFAULT_TOP_PRODUCTS};

/// Cleans a CSV of sales transactions, prints revenue and unit summaries,
/// and saves charts of them as PNG files.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// CSV file with ProductName, Category, Region, CustomerSegment,
    /// Quantity, UnitPrice, and SaleDate columns
    #[arg(default_value = "sales_data.csv")]
    input: PathBuf,

    /// Directory to write chart images to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Number of products to rank by revenue
    #[arg(short, long, default_value_t = DEFAULT_TOP_PRODUCTS)]
    top: usize,

    /// Skip writing chart images
    #[arg(long)]
    no_charts: bool,

    /// Skip the initial data inspection
    #[arg(long)]
    no_inspect: bool,

    /// Log debug detail to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            input: args.input,
            out_dir: args.out_dir,
            top: args.top,
            charts: !args.no_charts,
            inspect: !args.no_inspect,
        }
    }
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    if verbose {
        builder.filter_module("sales_analyzer", LevelFilter::Debug);
    } else if env::var("RUST_LOG").is_err() {
        builder.filter_module("sales_analyzer", LevelFilter::Info);
    }
    builder.format_timestamp_millis().init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    if let Err(err) = sales_analyzer::run(&Config::from(args)) {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

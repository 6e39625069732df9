#![doc = include_str!("../README.md")]
use anyhow::{Context, Result};
use log::info;

use std::path::PathBuf;

pub mod aggregate;
pub mod chart;
pub mod clean;
pub mod error;
pub mod inspect;
pub mod loader;
pub mod record;
pub mod report;
pub mod usd;

pub use aggregate::{Summary, Totals, DEFAULT_TOP_PRODUCTS};
pub use clean::{clean, parse_date, Cleaned};
pub use error::{DataError, Error};
pub use inspect::Inspection;
pub use loader::load;
pub use record::{RawRecord, SaleMonth, SalesRecord, SalesTable, REQUIRED_COLUMNS};
pub use report::Report;
pub use usd::Usd;

/// Settings for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// CSV file to analyse.
    pub input: PathBuf,
    /// Directory the chart images are written to.
    pub out_dir: PathBuf,
    /// How many products to rank by revenue.
    pub top: usize,
    pub charts: bool,
    pub inspect: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("sales_data.csv"),
            out_dir: PathBuf::from("."),
            top: DEFAULT_TOP_PRODUCTS,
            charts: true,
            inspect: true,
        }
    }
}

/// The results of analysing one sales file.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub inspection: Inspection,
    pub cleaned: Cleaned,
    pub summary: Summary,
}

impl Analysis {
    /// Returns the console report for this analysis.
    #[must_use]
    pub fn report(&self, with_inspection: bool) -> Report<'_> {
        Report {
            inspection: with_inspection.then_some(&self.inspection),
            cleaned: &self.cleaned,
            summary: &self.summary,
        }
    }
}

/// Loads, inspects, cleans, and aggregates the sales data at `path`.
///
/// # Errors
///
/// Returns any [`Error`] from loading or cleaning.
pub fn analyze(path: impl AsRef<std::path::Path>, top: usize) -> Result<Analysis, Error> {
    let rows = load(path)?;
    let inspection = Inspection::new(&rows);
    let cleaned = clean(rows)?;
    let summary = Summary::compute(&cleaned.table, top);
    Ok(Analysis {
        inspection,
        cleaned,
        summary,
    })
}

/// Runs the whole pipeline for `config`: prints the report to stdout and
/// writes the charts.
///
/// # Errors
///
/// Returns any errors from analysing the input or rendering charts.
pub fn run(config: &Config) -> Result<()> {
    let analysis = analyze(&config.input, config.top)?;
    println!("Data loaded successfully from {}", config.input.display());
    println!();
    print!("{}", analysis.report(config.inspect));
    if config.charts {
        println!();
        println!("--- Generating Visualizations ---");
        let written = chart::render_all(&analysis.summary, &config.out_dir)
            .context("rendering charts")?;
        for path in &written {
            println!("Saved '{}'", path.display());
        }
        info!("wrote {} chart(s) to {}", written.len(), config.out_dir.display());
    }
    Ok(())
}

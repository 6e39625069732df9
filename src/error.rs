use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading and cleaning sales data.
///
/// Every variant is fatal: the pipeline never emits partial results.
#[derive(Debug, Error)]
pub enum Error {
    /// The input file does not exist.
    #[error("the file '{}' was not found", path.display())]
    NotFound { path: PathBuf },

    /// The input file exists but could not be read or parsed as sales data.
    #[error("failed to load '{}'{}: {source}", path.display(), at_line(line))]
    Load {
        path: PathBuf,
        line: Option<u64>,
        #[source]
        source: csv::Error,
    },

    /// The header row lacks one or more required columns.
    #[error("'{}' is missing required column(s): {}", path.display(), columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    /// The data could not be cleaned.
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Reasons the cleaner cannot produce a complete table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataError {
    /// Quantities are missing but none are present to take a median from.
    #[error("cannot fill missing quantities: no quantity values are present")]
    NoQuantities,

    /// A quantity is not a non-negative number that fits the quantity type.
    #[error("line {line}: invalid quantity {value:?}")]
    InvalidQuantity { line: u64, value: String },

    /// A sale date matches none of the accepted formats.
    #[error("line {line}: invalid sale date {value:?}")]
    InvalidDate { line: u64, value: String },

    /// A row's revenue, or the running revenue of the table, does not fit
    /// the money type.
    #[error("line {line}: revenue overflows")]
    Overflow { line: u64 },
}

fn at_line(line: &Option<u64>) -> String {
    line.map(|l| format!(" at line {l}")).unwrap_or_default()
}

/// Convenience alias for results carrying an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

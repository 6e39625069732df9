use log::{debug, info};

use std::{fs::File, io, path::Path};

use crate::{
    error::{Error, Result},
    record::{RawRecord, REQUIRED_COLUMNS},
};

/// Reads sales data from the CSV file at `path`.
///
/// Header names are trimmed before matching; columns beyond
/// [`REQUIRED_COLUMNS`] are ignored. A file with only a header row gives an
/// empty table.
///
/// # Errors
///
/// Returns:
/// * [`Error::NotFound`] if `path` does not exist
/// * [`Error::MissingColumns`] if the header lacks a required column
/// * [`Error::Load`] for any other I/O or parse failure, including an
///   unparseable unit price
pub fn load(path: impl AsRef<Path>) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => Error::NotFound {
            path: path.to_path_buf(),
        },
        _ => load_error(path, None, err.into()),
    })?;
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(file);
    let headers = rdr
        .headers()
        .map_err(|err| load_error(path, Some(1), err))?
        .clone();
    debug!("{}: columns {:?}", path.display(), headers);

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|&&col| !headers.iter().any(|h| h == col))
        .map(|col| (*col).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingColumns {
            path: path.to_path_buf(),
            columns: missing,
        });
    }

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result.map_err(|err| {
            let line = err.position().map(csv::Position::line);
            load_error(path, line, err)
        })?;
        let line = row.position().map_or(0, csv::Position::line);
        let mut record: RawRecord = row
            .deserialize(Some(&headers))
            .map_err(|err| load_error(path, Some(line), err))?;
        record.line = line;
        records.push(record);
    }
    info!("loaded {} row(s) from {}", records.len(), path.display());
    Ok(records)
}

fn load_error(path: &Path, line: Option<u64>, source: csv::Error) -> Error {
    Error::Load {
        path: path.to_path_buf(),
        line,
        source,
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::usd::Usd;

    #[test]
    fn load_fn_correctly_parses_sales_data() {
        let records = load("testdata/sales_data.csv").unwrap();
        assert_eq!(records.len(), 12, "wrong row count");
        let first = &records[0];
        assert_eq!(first.product_name, "Laptop Pro");
        assert_eq!(first.category, "Electronics");
        assert_eq!(first.unit_price, Usd::from_str("1200.00").unwrap());
        assert_eq!(first.sale_date, "2024-01-05");
        assert_eq!(first.line, 2);
        assert_eq!(records[11].line, 13);
    }

    #[test]
    fn load_fn_keeps_missing_quantities_as_none() {
        let records = load("testdata/sales_data.csv").unwrap();
        let missing = records.iter().filter(|r| r.quantity_text().is_none()).count();
        assert_eq!(missing, 2);
    }

    #[test]
    fn load_fn_returns_not_found_for_missing_file() {
        let err = load("testdata/bogus.csv").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }), "got {err:?}");
    }

    #[test]
    fn load_fn_reports_every_missing_column() {
        let err = load("testdata/missing_columns.csv").unwrap_err();
        let Error::MissingColumns { columns, .. } = err else {
            panic!("wrong error: {err:?}");
        };
        assert_eq!(columns, vec!["Region", "SaleDate"]);
    }

    #[test]
    fn load_fn_returns_load_error_with_line_for_bad_price() {
        let err = load("testdata/bad_price.csv").unwrap_err();
        let Error::Load { line, .. } = err else {
            panic!("wrong error: {err:?}");
        };
        assert_eq!(line, Some(3));
    }

    #[test]
    fn load_fn_accepts_header_only_file() {
        let records = load("testdata/empty.csv").unwrap();
        assert!(records.is_empty());
    }
}

//! A first look at raw sales rows, before any cleaning.

use std::fmt::Display;

use crate::record::{RawRecord, REQUIRED_COLUMNS};

/// Number of rows shown at each end of the table.
const PREVIEW_ROWS: usize = 5;

/// Summary statistics of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std_dev: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl ColumnStats {
    /// Describes `values`, or returns `None` if there are none.
    #[must_use]
    pub fn describe(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let count = sorted.len();
        let n = count as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let std_dev = (count > 1).then(|| {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        });
        Some(Self {
            count,
            mean,
            std_dev,
            min: sorted[0],
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted[count - 1],
        })
    }
}

/// Linearly interpolated quantile of already sorted, non-empty `sorted`.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower = pos.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let frac = pos - pos.floor();
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// What the raw table looks like: its ends, its gaps, and its ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    pub rows: usize,
    pub head: Vec<RawRecord>,
    pub tail: Vec<RawRecord>,
    /// Missing-value count for each of [`REQUIRED_COLUMNS`], in that order.
    pub missing: Vec<(&'static str, usize)>,
    pub categories: Vec<String>,
    pub regions: Vec<String>,
    pub segments: Vec<String>,
    pub quantity: Option<ColumnStats>,
    pub unit_price: Option<ColumnStats>,
}

impl Inspection {
    /// Inspects `rows` as loaded.
    ///
    /// Quantities that do not parse as numbers are left out of the
    /// quantity statistics; the cleaner reports them.
    #[must_use]
    pub fn new(rows: &[RawRecord]) -> Self {
        let missing = REQUIRED_COLUMNS
            .iter()
            .map(|&col| (col, rows.iter().filter(|r| is_missing(r, col)).count()))
            .collect();
        let quantities: Vec<f64> = rows
            .iter()
            .filter_map(RawRecord::quantity_text)
            .filter_map(|q| q.parse().ok())
            .collect();
        let prices: Vec<f64> = rows.iter().map(|r| r.unit_price.to_f64()).collect();
        let tail_start = rows.len().saturating_sub(PREVIEW_ROWS);
        Self {
            rows: rows.len(),
            head: rows.iter().take(PREVIEW_ROWS).cloned().collect(),
            tail: rows[tail_start..].to_vec(),
            missing,
            categories: unique(rows.iter().map(|r| r.category.as_str())),
            regions: unique(rows.iter().map(|r| r.region.as_str())),
            segments: unique(rows.iter().map(|r| r.customer_segment.as_str())),
            quantity: ColumnStats::describe(&quantities),
            unit_price: ColumnStats::describe(&prices),
        }
    }
}

fn is_missing(record: &RawRecord, column: &str) -> bool {
    let text = match column {
        "ProductName" => &record.product_name,
        "Category" => &record.category,
        "Region" => &record.region,
        "CustomerSegment" => &record.customer_segment,
        "Quantity" => return record.quantity_text().is_none(),
        "SaleDate" => &record.sale_date,
        _ => return false,
    };
    text.trim().is_empty()
}

/// Returns the distinct values of `values`, in first-seen order.
fn unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for value in values {
        if !seen.iter().any(|s| s == value) {
            seen.push(value.to_string());
        }
    }
    seen
}

impl Display for Inspection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Rows: {}", self.rows)?;
        writeln!(f)?;
        writeln!(f, "First rows:")?;
        write_rows(f, &self.head)?;
        writeln!(f)?;
        writeln!(f, "Last rows:")?;
        write_rows(f, &self.tail)?;
        writeln!(f)?;
        writeln!(f, "Missing values per column:")?;
        for (column, count) in &self.missing {
            writeln!(f, "{column:<16} {count:>6}")?;
        }
        writeln!(f)?;
        writeln!(f, "Descriptive statistics:")?;
        writeln!(
            f,
            "{:<10} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        )?;
        for (name, stats) in [("Quantity", &self.quantity), ("UnitPrice", &self.unit_price)] {
            match stats {
                Some(s) => writeln!(
                    f,
                    "{name:<10} {:>6} {:>10.2} {:>10} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
                    s.count,
                    s.mean,
                    s.std_dev.map_or_else(|| "-".to_string(), |sd| format!("{sd:.2}")),
                    s.min,
                    s.q25,
                    s.median,
                    s.q75,
                    s.max,
                )?,
                None => writeln!(f, "{name:<10} {:>6}", 0)?,
            }
        }
        writeln!(f)?;
        writeln!(f, "Unique values in 'Category': {}", self.categories.join(", "))?;
        writeln!(f, "Unique values in 'Region': {}", self.regions.join(", "))?;
        writeln!(
            f,
            "Unique values in 'CustomerSegment': {}",
            self.segments.join(", ")
        )?;
        Ok(())
    }
}

fn write_rows(f: &mut std::fmt::Formatter<'_>, rows: &[RawRecord]) -> std::fmt::Result {
    if rows.is_empty() {
        return writeln!(f, "(no rows)");
    }
    for r in rows {
        writeln!(
            f,
            "{:>5}  {} | {} | {} | {} | {} | {} | {}",
            r.line,
            r.product_name,
            r.category,
            r.region,
            r.customer_segment,
            r.quantity_text().unwrap_or("NaN"),
            r.unit_price,
            r.sale_date,
        )?;
    }
    Ok(())
}

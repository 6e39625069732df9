use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use std::fmt::Display;

use crate::usd::Usd;

/// Header columns every sales data file must contain.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "ProductName",
    "Category",
    "Region",
    "CustomerSegment",
    "Quantity",
    "UnitPrice",
    "SaleDate",
];

/// Columns of a [`SalesTable`] and the type each holds.
pub const CLEANED_COLUMNS: [(&str, &str); 9] = [
    ("ProductName", "text"),
    ("Category", "text"),
    ("Region", "text"),
    ("CustomerSegment", "text"),
    ("Quantity", "integer"),
    ("UnitPrice", "decimal"),
    ("SaleDate", "date"),
    ("Revenue", "decimal"),
    ("SaleMonth", "month"),
];

/// Defines the CSV format for sales data, as read from the file.
///
/// `quantity` and `sale_date` are kept as text here; turning them into
/// numbers and dates is the cleaner's job.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct RawRecord {
    pub product_name: String,
    pub category: String,
    pub region: String,
    pub customer_segment: String,
    pub quantity: Option<String>,
    pub unit_price: Usd,
    pub sale_date: String,
    /// CSV line number of this row, filled in by the loader.
    #[serde(skip)]
    pub line: u64,
}

/// Placeholders treated as a missing quantity, besides an empty field.
const MISSING_TOKENS: [&str; 9] = ["NA", "N/A", "NaN", "nan", "null", "NULL", "None", "none", "-"];

impl RawRecord {
    /// Returns the quantity text, or `None` if the value is missing.
    #[must_use]
    pub fn quantity_text(&self) -> Option<&str> {
        self.quantity
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty() && !MISSING_TOKENS.contains(q))
    }
}

/// One cleaned sale, with derived revenue and month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesRecord {
    pub product_name: String,
    pub category: String,
    pub region: String,
    pub customer_segment: String,
    pub quantity: u32,
    pub unit_price: Usd,
    pub sale_date: NaiveDate,
    pub revenue: Usd,
    pub sale_month: SaleMonth,
}

/// Calendar month bucket of a sale date.
///
/// Orders chronologically and displays as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SaleMonth {
    year: i32,
    month: u32,
}

impl SaleMonth {
    /// Creates the bucket for `month` (1-12) of `year`.
    #[must_use]
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }
}

impl From<NaiveDate> for SaleMonth {
    fn from(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }
}

impl Display for SaleMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&format!("{:04}-{:02}", self.year, self.month))
    }
}

/// The cleaned sales table.
///
/// Built once by [`crate::clean`], then only read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesTable {
    records: Vec<SalesRecord>,
}

impl SalesTable {
    #[must_use]
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SalesRecord> {
        self.records.iter()
    }

    /// Counts missing values per column of [`CLEANED_COLUMNS`], in that
    /// order. Only text columns can be blank; typed columns are always set.
    #[must_use]
    pub fn missing_counts(&self) -> Vec<(&'static str, usize)> {
        let blank = |field: fn(&SalesRecord) -> &str| {
            self.records
                .iter()
                .filter(|r| field(r).trim().is_empty())
                .count()
        };
        CLEANED_COLUMNS
            .iter()
            .map(|(name, _)| {
                let missing = match *name {
                    "ProductName" => blank(|r| r.product_name.as_str()),
                    "Category" => blank(|r| r.category.as_str()),
                    "Region" => blank(|r| r.region.as_str()),
                    "CustomerSegment" => blank(|r| r.customer_segment.as_str()),
                    _ => 0,
                };
                (*name, missing)
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a SalesTable {
    type Item = &'a SalesRecord;
    type IntoIter = std::slice::Iter<'a, SalesRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(quantity: Option<&str>) -> RawRecord {
        RawRecord {
            product_name: "ProductA".into(),
            category: "Electronics".into(),
            region: "East".into(),
            customer_segment: "Consumer".into(),
            quantity: quantity.map(String::from),
            unit_price: Usd::default(),
            sale_date: "2024-01-05".into(),
            line: 2,
        }
    }

    #[test]
    fn quantity_text_fn_treats_placeholders_as_missing() {
        assert_eq!(raw(None).quantity_text(), None);
        assert_eq!(raw(Some("")).quantity_text(), None);
        assert_eq!(raw(Some("  NaN ")).quantity_text(), None);
        assert_eq!(raw(Some("N/A")).quantity_text(), None);
        assert_eq!(raw(Some(" 4 ")).quantity_text(), Some("4"));
    }

    #[test]
    fn missing_counts_fn_reports_blank_text_fields() {
        let record = |region: &str| SalesRecord {
            product_name: "ProductA".into(),
            category: "Electronics".into(),
            region: region.into(),
            customer_segment: "Consumer".into(),
            quantity: 1,
            unit_price: Usd::default(),
            sale_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            revenue: Usd::default(),
            sale_month: SaleMonth::new(2024, 1),
        };
        let table = SalesTable::new(vec![record("East"), record(" "), record("")]);
        let counts = table.missing_counts();
        assert_eq!(counts.len(), CLEANED_COLUMNS.len());
        assert_eq!(counts[2], ("Region", 2));
        assert_eq!(counts[4], ("Quantity", 0));
        assert_eq!(counts.iter().map(|(_, n)| n).sum::<usize>(), 2);
    }

    #[test]
    fn sale_month_fn_orders_chronologically() {
        let mut months = vec![
            SaleMonth::new(2024, 2),
            SaleMonth::new(2023, 12),
            SaleMonth::new(2024, 1),
        ];
        months.sort();
        assert_eq!(
            months,
            vec![
                SaleMonth::new(2023, 12),
                SaleMonth::new(2024, 1),
                SaleMonth::new(2024, 2),
            ]
        );
    }

    #[test]
    fn sale_month_fn_displays_year_and_month() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(SaleMonth::from(date).to_string(), "2024-03");
    }
}

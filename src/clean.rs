use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, info};

use crate::{
    error::DataError,
    record::{RawRecord, SaleMonth, SalesRecord, SalesTable},
    usd::Usd,
};

/// Date-only layouts accepted for `SaleDate`, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Date-and-time layouts accepted for `SaleDate`; the time is discarded.
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];

/// The cleaned table, plus what the cleaner did to get it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cleaned {
    pub table: SalesTable,
    /// Median used to fill missing quantities, after rounding. `None` when
    /// nothing needed filling.
    pub median_quantity: Option<u32>,
    /// Number of rows whose quantity was filled with the median.
    pub filled: usize,
}

/// Cleans raw sales rows into a [`SalesTable`].
///
/// The steps, in order:
/// 1. Missing quantities are replaced by the median of the present ones.
/// 2. Quantities are rounded to whole units, halves away from zero, so a
///    median of 2.5 becomes 3.
/// 3. Sale dates are parsed.
/// 4. Revenue (`quantity * unit_price`) and the sale month are derived.
///
/// # Errors
///
/// Returns:
/// * [`DataError::InvalidQuantity`] for a quantity that is not a
///   non-negative number
/// * [`DataError::NoQuantities`] if some quantities are missing and none are
///   present
/// * [`DataError::InvalidDate`] for the first unparseable sale date
/// * [`DataError::Overflow`] if a row's revenue, or the sum of all revenue
///   magnitudes so far, overflows. Every grouped sum is bounded by that
///   total, so aggregating a cleaned table cannot overflow.
pub fn clean(rows: Vec<RawRecord>) -> Result<Cleaned, DataError> {
    let quantities = rows
        .iter()
        .map(|row| row.quantity_text().map(|q| parse_quantity(q, row.line)).transpose())
        .collect::<Result<Vec<Option<f64>>, _>>()?;

    let filled = quantities.iter().filter(|q| q.is_none()).count();
    let fill = if filled > 0 {
        let present: Vec<f64> = quantities.iter().flatten().copied().collect();
        let value = median(&present).ok_or(DataError::NoQuantities)?;
        info!("filling {filled} missing quantity value(s) with median {value}");
        Some(whole_units(value))
    } else {
        None
    };

    let mut records = Vec::with_capacity(rows.len());
    let mut magnitude = Usd::default();
    for (row, quantity) in rows.into_iter().zip(quantities) {
        let quantity = match quantity {
            Some(q) => whole_units(q),
            None => {
                debug!("line {}: quantity filled with median", row.line);
                fill.unwrap_or_default()
            }
        };
        let sale_date = parse_date(&row.sale_date).ok_or_else(|| DataError::InvalidDate {
            line: row.line,
            value: row.sale_date.clone(),
        })?;
        let revenue = row
            .unit_price
            .checked_mul(quantity)
            .ok_or(DataError::Overflow { line: row.line })?;
        magnitude = magnitude
            .checked_add(revenue.abs())
            .ok_or(DataError::Overflow { line: row.line })?;
        records.push(SalesRecord {
            revenue,
            sale_month: SaleMonth::from(sale_date),
            product_name: row.product_name,
            category: row.category,
            region: row.region,
            customer_segment: row.customer_segment,
            quantity,
            unit_price: row.unit_price,
            sale_date,
        });
    }
    info!("cleaned {} row(s)", records.len());
    Ok(Cleaned {
        table: SalesTable::new(records),
        median_quantity: fill,
        filled,
    })
}

/// Parses a present quantity, which must round to a valid `u32`.
fn parse_quantity(text: &str, line: u64) -> Result<f64, DataError> {
    match text.parse::<f64>() {
        Ok(q) if q.is_finite() && q >= 0.0 && q.round() <= f64::from(u32::MAX) => Ok(q),
        _ => Err(DataError::InvalidQuantity {
            line,
            value: text.to_string(),
        }),
    }
}

/// Rounds a quantity already checked by [`parse_quantity`] to whole units,
/// halves away from zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_units(quantity: f64) -> u32 {
    quantity.round() as u32
}

/// Returns the median of `values`, or `None` if there are none.
///
/// For an even count this is the mean of the two middle values.
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Parses a sale date in any of the accepted layouts.
///
/// # Examples
///
/// ```
/// # use sales_analyzer::parse_date;
/// let date = parse_date("03/15/2024").unwrap();
/// assert_eq!(date.to_string(), "2024-03-15");
/// assert_eq!(parse_date("2024-03-15T09:30:00Z"), Some(date));
/// assert_eq!(parse_date("next tuesday"), None);
/// ```
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use proptest::prelude::*;

    use super::*;
    use crate::{aggregate::Summary, loader::load};

    fn raw(line: u64, quantity: Option<&str>, price: &str, date: &str) -> RawRecord {
        RawRecord {
            product_name: "ProductA".into(),
            category: "Electronics".into(),
            region: "East".into(),
            customer_segment: "Consumer".into(),
            quantity: quantity.map(String::from),
            unit_price: Usd::from_str(price).unwrap(),
            sale_date: date.into(),
            line,
        }
    }

    #[test]
    fn clean_fn_fills_missing_quantity_with_median() {
        let cleaned = clean(vec![
            raw(2, Some("2"), "10.0", "2024-01-05"),
            raw(3, None, "10.0", "2024-01-20"),
        ])
        .unwrap();
        assert_eq!(cleaned.median_quantity, Some(2));
        assert_eq!(cleaned.filled, 1);
        let records = cleaned.table.records();
        assert_eq!(records[1].quantity, 2);
        assert_eq!(records[0].revenue, Usd::from_str("20.00").unwrap());
        assert_eq!(records[1].revenue, Usd::from_str("20.00").unwrap());
        assert_eq!(records[1].sale_month, SaleMonth::new(2024, 1));
    }

    #[test]
    fn clean_fn_rounds_fractional_median_half_away_from_zero() {
        let cleaned = clean(vec![
            raw(2, Some("2"), "1", "2024-01-05"),
            raw(3, Some("3"), "1", "2024-01-05"),
            raw(4, Some(""), "1", "2024-01-05"),
        ])
        .unwrap();
        assert_eq!(cleaned.median_quantity, Some(3));
        assert_eq!(cleaned.table.records()[2].quantity, 3);
    }

    #[test]
    fn clean_fn_accepts_float_formatted_quantities() {
        let cleaned = clean(vec![raw(2, Some("4.0"), "2.50", "2024-02-01")]).unwrap();
        assert_eq!(cleaned.table.records()[0].quantity, 4);
        assert_eq!(cleaned.median_quantity, None);
    }

    #[test]
    fn clean_fn_returns_no_quantities_when_all_missing() {
        let err = clean(vec![
            raw(2, None, "1", "2024-01-05"),
            raw(3, Some("NaN"), "1", "2024-01-05"),
        ])
        .unwrap_err();
        assert_eq!(err, DataError::NoQuantities);
    }

    #[test]
    fn clean_fn_rejects_negative_quantity() {
        let err = clean(vec![raw(7, Some("-1"), "1", "2024-01-05")]).unwrap_err();
        assert_eq!(
            err,
            DataError::InvalidQuantity {
                line: 7,
                value: "-1".into()
            }
        );
    }

    #[test]
    fn clean_fn_rejects_malformed_date() {
        let err = clean(vec![
            raw(2, Some("1"), "1", "2024-01-05"),
            raw(3, Some("1"), "1", "2024-13-45"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            DataError::InvalidDate {
                line: 3,
                value: "2024-13-45".into()
            }
        );
    }

    #[test]
    fn clean_fn_rejects_row_whose_revenue_overflows() {
        let err = clean(vec![
            raw(2, Some("1"), "1", "2024-01-05"),
            raw(3, Some("4000000000"), "100000000000000000000", "2024-01-05"),
        ])
        .unwrap_err();
        assert_eq!(err, DataError::Overflow { line: 3 });
    }

    #[test]
    fn clean_fn_rejects_table_whose_total_revenue_overflows() {
        let price = "70000000000000000000000000000";
        let err = clean(vec![
            raw(2, Some("1"), price, "2024-01-05"),
            raw(3, Some("1"), "-1", "2024-01-05"),
            raw(4, Some("1"), price, "2024-01-05"),
        ])
        .unwrap_err();
        assert_eq!(err, DataError::Overflow { line: 4 });
    }

    #[test]
    fn clean_fn_output_aggregates_without_overflow_near_the_limit() {
        let price = "39000000000000000000000000000";
        let cleaned = clean(vec![
            raw(2, Some("1"), price, "2024-01-05"),
            raw(3, Some("1"), price, "2024-02-05"),
        ])
        .unwrap();
        let summary = Summary::compute(&cleaned.table, 5);
        assert_eq!(
            summary.total_revenue,
            Usd::from_str("78000000000000000000000000000").unwrap()
        );
    }

    #[test]
    fn clean_fn_accepts_empty_table() {
        let cleaned = clean(Vec::new()).unwrap();
        assert!(cleaned.table.is_empty());
        assert_eq!(cleaned.median_quantity, None);
        assert_eq!(cleaned.filled, 0);
    }

    #[test]
    fn clean_fn_correctly_cleans_sales_data() {
        let cleaned = clean(load("testdata/sales_data.csv").unwrap()).unwrap();
        assert_eq!(cleaned.table.len(), 12);
        assert_eq!(cleaned.filled, 2);
        assert_eq!(cleaned.median_quantity, Some(3));
    }

    #[test]
    fn median_fn_averages_middle_pair_for_even_count() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn parse_date_fn_accepts_supported_layouts() {
        let want = NaiveDate::from_ymd_opt(2024, 1, 5);
        for text in [
            "2024-01-05",
            "2024/01/05",
            "01/05/2024",
            "2024-01-05 13:45:00",
            "2024-01-05T13:45:00",
            "2024-01-05T13:45:00+02:00",
        ] {
            assert_eq!(parse_date(text), want, "{text}");
        }
    }

    proptest! {
        #[test]
        fn clean_fn_leaves_no_missing_quantity_and_exact_revenue(
            rows in prop::collection::vec((prop::option::of(0u32..500), 0u32..100_000), 1..40)
        ) {
            prop_assume!(rows.iter().any(|(q, _)| q.is_some()));
            let raws = rows
                .iter()
                .enumerate()
                .map(|(i, (q, cents))| {
                    let price = format!("{}.{:02}", cents / 100, cents % 100);
                    raw(i as u64 + 2, q.map(|q| q.to_string()).as_deref(), &price, "2024-06-30")
                })
                .collect::<Vec<_>>();
            let cleaned = clean(raws).unwrap();
            prop_assert_eq!(cleaned.table.len(), rows.len());
            for (record, (q, _)) in cleaned.table.iter().zip(&rows) {
                if let Some(q) = q {
                    prop_assert_eq!(record.quantity, *q);
                }
                prop_assert_eq!(Some(record.revenue), record.unit_price.checked_mul(record.quantity));
            }
        }
    }
}

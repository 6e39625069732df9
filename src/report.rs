use std::fmt::Display;

use crate::{
    aggregate::{Summary, Totals},
    clean::Cleaned,
    inspect::Inspection,
    record::{SalesRecord, CLEANED_COLUMNS},
};

/// Number of cleaned rows shown after cleaning.
const PREVIEW_ROWS: usize = 5;

/// The console report for one analysis run.
///
/// To get a printable version of the report, use its [`Display`]
/// implementation. Each section is a heading followed by a table of group
/// names and totals.
#[derive(Debug, Clone)]
pub struct Report<'a> {
    pub inspection: Option<&'a Inspection>,
    pub cleaned: &'a Cleaned,
    pub summary: &'a Summary,
}

impl Display for Report<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(inspection) = self.inspection {
            writeln!(f, "--- Initial Data Inspection ---")?;
            writeln!(f)?;
            write!(f, "{inspection}")?;
            writeln!(f)?;
        }

        writeln!(f, "--- Data Cleaning and Transformation ---")?;
        writeln!(f)?;
        match self.cleaned.median_quantity {
            Some(median) => writeln!(
                f,
                "Missing 'Quantity' values filled with median: {median} ({} row(s))",
                self.cleaned.filled
            )?,
            None => writeln!(f, "No missing 'Quantity' values to fill.")?,
        }
        writeln!(f, "'Quantity' converted to whole units.")?;
        writeln!(f, "'SaleDate' parsed as calendar dates.")?;
        writeln!(f, "'Revenue' calculated (Quantity * UnitPrice).")?;
        writeln!(f)?;
        write_cleaned_columns(f, self.cleaned)?;
        writeln!(f)?;
        writeln!(f, "Cleaned data (first {PREVIEW_ROWS} rows):")?;
        write_records(
            f,
            &self.cleaned.table.records()[..self.cleaned.table.len().min(PREVIEW_ROWS)],
        )?;
        writeln!(f)?;

        let s = self.summary;
        writeln!(f, "--- Data Aggregation and Analysis ---")?;
        writeln!(f)?;
        let heading = format!("Top {} Products by Total Revenue", s.top_n);
        write_totals(f, &heading, "Product", "Revenue", &s.top_products, None)?;
        let total = Some(s.total_revenue.to_string());
        write_totals(
            f,
            "Total Revenue by Category",
            "Category",
            "Revenue",
            &s.revenue_by_category,
            total.clone(),
        )?;
        write_totals(
            f,
            "Total Sales (Quantity) by Category",
            "Category",
            "Units",
            &s.sales_by_category,
            Some(s.total_units.to_string()),
        )?;
        write_totals(
            f,
            "Total Revenue by Region",
            "Region",
            "Revenue",
            &s.revenue_by_region,
            total.clone(),
        )?;
        write_totals(
            f,
            "Monthly Sales Trends (Total Revenue)",
            "Month",
            "Revenue",
            &s.monthly_revenue,
            total.clone(),
        )?;
        write_totals(
            f,
            "Total Revenue by Customer Segment",
            "Segment",
            "Revenue",
            &s.revenue_by_segment,
            total,
        )?;
        writeln!(f, "--- Analysis Complete ---")?;
        Ok(())
    }
}

fn write_totals<K: Display, V: Display>(
    f: &mut std::fmt::Formatter<'_>,
    heading: &str,
    key_header: &str,
    value_header: &str,
    totals: &Totals<K, V>,
    total: Option<String>,
) -> std::fmt::Result {
    writeln!(f, "{heading}:")?;
    let names: Vec<String> = totals.keys().map(ToString::to_string).collect();
    let width = names
        .iter()
        .map(String::len)
        .chain([key_header.len(), "Total".len()])
        .max()
        .unwrap_or_default();
    writeln!(f, "{key_header:width$} {value_header:>12}")?;
    let length = width + 13;
    writeln!(f, "{:-<length$}", "")?;
    if totals.is_empty() {
        writeln!(f, "(no data)")?;
    }
    for (name, (_, value)) in names.iter().zip(totals) {
        writeln!(f, "{name:width$} {value:>12}")?;
    }
    if let Some(total) = total {
        writeln!(f, "{:-<length$}", "")?;
        writeln!(f, "{:width$} {total:>12}", "Total")?;
    }
    writeln!(f)?;
    Ok(())
}

/// Writes the missing-value recheck and the column type summary of the
/// cleaned table.
fn write_cleaned_columns(f: &mut std::fmt::Formatter<'_>, cleaned: &Cleaned) -> std::fmt::Result {
    let table = &cleaned.table;
    let missing = table.missing_counts();
    let width = CLEANED_COLUMNS
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or_default();
    writeln!(f, "Missing values after filling 'Quantity':")?;
    for (name, count) in &missing {
        writeln!(f, "{name:width$} {count:>8}")?;
    }
    writeln!(f)?;
    writeln!(f, "Columns after cleaning ({} rows):", table.len())?;
    writeln!(f, "{:width$} {:>8} {:<8}", "Column", "Non-null", "Type")?;
    for ((name, kind), (_, count)) in CLEANED_COLUMNS.iter().zip(&missing) {
        writeln!(f, "{name:width$} {:>8} {kind:<8}", table.len() - count)?;
    }
    Ok(())
}

fn write_records(f: &mut std::fmt::Formatter<'_>, records: &[SalesRecord]) -> std::fmt::Result {
    if records.is_empty() {
        return writeln!(f, "(no rows)");
    }
    let width = records
        .iter()
        .map(|r| r.product_name.len())
        .max()
        .unwrap_or_default()
        .max("Product".len());
    writeln!(
        f,
        "{:width$} {:>6} {:>10} {:>10} {:>12}",
        "Product", "Qty", "Price", "Date", "Revenue"
    )?;
    for r in records {
        writeln!(
            f,
            "{:width$} {:>6} {:>10} {:>10} {:>12}",
            r.product_name, r.quantity, r.unit_price, r.sale_date, r.revenue
        )?;
    }
    Ok(())
}

//! Grouped summaries over a cleaned [`SalesTable`].
//!
//! Every function here only reads the table. Groups appear in the order
//! their key was first seen before sorting, and all sorts are stable, so
//! equal totals keep that first-seen order.

use log::info;

use std::{borrow::Borrow, collections::HashMap, hash::Hash, ops::AddAssign};

use crate::{
    record::{SaleMonth, SalesRecord, SalesTable},
    usd::Usd,
};

/// Number of products [`Summary::compute`] ranks by default.
pub const DEFAULT_TOP_PRODUCTS: usize = 5;

/// An ordered list of per-group totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Totals<K, V> {
    entries: Vec<(K, V)>,
}

impl<K, V> Default for Totals<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K, V: Copy> Totals<K, V> {
    /// Returns the total for `key`, if that group exists.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.entries
            .iter()
            .find(|(k, _)| Borrow::<Q>::borrow(k) == key)
            .map(|(_, v)| *v)
    }

    /// Returns the group totals, in order.
    pub fn values(&self) -> impl Iterator<Item = V> + '_ {
        self.entries.iter().map(|(_, v)| *v)
    }
}

impl<K, V> Totals<K, V> {
    /// Returns the group keys, in order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (K, V)> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a, K, V> IntoIterator for &'a Totals<K, V> {
    type Item = &'a (K, V);
    type IntoIter = std::slice::Iter<'a, (K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Sums `value` over the records of `table`, grouped by `key`.
///
/// Groups come back in first-seen order.
fn group_sum<K, V>(
    table: &SalesTable,
    key: impl Fn(&SalesRecord) -> K,
    value: impl Fn(&SalesRecord) -> V,
) -> Vec<(K, V)>
where
    K: Eq + Hash + Clone,
    V: AddAssign + Default,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, V)> = Vec::new();
    for record in table {
        let k = key(record);
        let slot = *index.entry(k.clone()).or_insert_with(|| {
            groups.push((k, V::default()));
            groups.len() - 1
        });
        groups[slot].1 += value(record);
    }
    groups
}

fn descending<K, V: Ord>(mut groups: Vec<(K, V)>) -> Totals<K, V> {
    groups.sort_by(|a, b| b.1.cmp(&a.1));
    Totals { entries: groups }
}

/// Returns the `n` products with the highest total revenue, highest first.
#[must_use]
pub fn top_products_by_revenue(table: &SalesTable, n: usize) -> Totals<String, Usd> {
    let mut totals = revenue_by(table, |r| r.product_name.clone());
    totals.entries.truncate(n);
    totals
}

/// Returns total revenue per product category, highest first.
#[must_use]
pub fn revenue_by_category(table: &SalesTable) -> Totals<String, Usd> {
    revenue_by(table, |r| r.category.clone())
}

/// Returns total units sold per product category, highest first.
#[must_use]
pub fn sales_by_category(table: &SalesTable) -> Totals<String, u64> {
    descending(group_sum(
        table,
        |r| r.category.clone(),
        |r| u64::from(r.quantity),
    ))
}

/// Returns total revenue per region, highest first.
#[must_use]
pub fn revenue_by_region(table: &SalesTable) -> Totals<String, Usd> {
    revenue_by(table, |r| r.region.clone())
}

/// Returns total revenue per customer segment, highest first.
#[must_use]
pub fn revenue_by_segment(table: &SalesTable) -> Totals<String, Usd> {
    revenue_by(table, |r| r.customer_segment.clone())
}

/// Returns total revenue per month, in chronological order.
#[must_use]
pub fn monthly_revenue(table: &SalesTable) -> Totals<SaleMonth, Usd> {
    let mut groups = group_sum(table, |r| r.sale_month, |r| r.revenue);
    groups.sort_by_key(|(month, _)| *month);
    Totals { entries: groups }
}

/// Returns the revenue of every record in `table`.
#[must_use]
pub fn total_revenue(table: &SalesTable) -> Usd {
    table.iter().map(|r| r.revenue).sum()
}

/// Returns the quantity of every record in `table`.
#[must_use]
pub fn total_units(table: &SalesTable) -> u64 {
    table.iter().map(|r| u64::from(r.quantity)).sum()
}

fn revenue_by(table: &SalesTable, key: impl Fn(&SalesRecord) -> String) -> Totals<String, Usd> {
    descending(group_sum(table, key, |r| r.revenue))
}

/// Every aggregate the report shows, computed from one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// How many products `top_products` was asked for.
    pub top_n: usize,
    pub top_products: Totals<String, Usd>,
    pub revenue_by_category: Totals<String, Usd>,
    pub sales_by_category: Totals<String, u64>,
    pub revenue_by_region: Totals<String, Usd>,
    pub monthly_revenue: Totals<SaleMonth, Usd>,
    pub revenue_by_segment: Totals<String, Usd>,
    pub total_revenue: Usd,
    pub total_units: u64,
}

impl Summary {
    /// Computes all aggregates, ranking the top `top_n` products.
    #[must_use]
    pub fn compute(table: &SalesTable, top_n: usize) -> Self {
        let summary = Self {
            top_n,
            top_products: top_products_by_revenue(table, top_n),
            revenue_by_category: revenue_by_category(table),
            sales_by_category: sales_by_category(table),
            revenue_by_region: revenue_by_region(table),
            monthly_revenue: monthly_revenue(table),
            revenue_by_segment: revenue_by_segment(table),
            total_revenue: total_revenue(table),
            total_units: total_units(table),
        };
        info!(
            "aggregated {} row(s) into {} categories, {} regions, {} segments, {} months",
            table.len(),
            summary.revenue_by_category.len(),
            summary.revenue_by_region.len(),
            summary.revenue_by_segment.len(),
            summary.monthly_revenue.len(),
        );
        summary
    }
}

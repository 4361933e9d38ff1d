//! Grouping and summing sales for KPIs, charts, and the forecast input.
//!
//! Every function here is pure and total over any dataset, including the
//! empty one: sums are zero and averages or "top" values are `None` rather
//! than a division by zero.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
};

use time::Date;

use crate::record::{Dataset, SalesRecord};

/// Summed sales per month bucket. Iteration order is chronological.
pub type MonthlyAggregate = BTreeMap<Date, f64>;

/// The record field to group by when summing sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    /// Group by sales region.
    Region,
    /// Group by product category.
    Category,
    /// Group by customer name.
    CustomerName,
    /// Group by product name.
    ProductName,
    /// Group by order ID.
    OrderId,
}

impl GroupKey {
    fn value<'a>(&self, record: &'a SalesRecord) -> &'a str {
        match self {
            GroupKey::Region => &record.region,
            GroupKey::Category => &record.category,
            GroupKey::CustomerName => &record.customer_name,
            GroupKey::ProductName => &record.product_name,
            GroupKey::OrderId => &record.order_id,
        }
    }
}

/// Sums sales per month bucket.
pub fn sum_by_month(dataset: &Dataset) -> MonthlyAggregate {
    let mut totals = MonthlyAggregate::new();

    for record in dataset.records() {
        *totals.entry(record.month_bucket).or_insert(0.0) += record.sales;
    }

    totals
}

/// Sums sales per distinct value of `key`.
pub fn sum_by_key(dataset: &Dataset, key: GroupKey) -> HashMap<String, f64> {
    let mut totals = HashMap::new();

    for record in dataset.records() {
        *totals.entry(key.value(record).to_owned()).or_insert(0.0) += record.sales;
    }

    totals
}

/// The `n` largest groups by summed sales, descending.
///
/// Ties are broken lexicographically by key so the ranking is deterministic
/// regardless of record order. The result has length
/// `min(n, distinct key count)`.
pub fn top_n(dataset: &Dataset, key: GroupKey, n: usize) -> Vec<(String, f64)> {
    let mut entries: Vec<(String, f64)> = sum_by_key(dataset, key).into_iter().collect();

    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    entries.truncate(n);

    entries
}

/// The sum of all sales amounts. Zero for an empty dataset.
pub fn total_sales(dataset: &Dataset) -> f64 {
    dataset.records().iter().map(|record| record.sales).sum()
}

/// The mean of per-order sums, or `None` when the dataset is empty.
///
/// An order may span multiple records, so this averages over distinct order
/// IDs rather than rows.
pub fn average_order_value(dataset: &Dataset) -> Option<f64> {
    let order_totals = sum_by_key(dataset, GroupKey::OrderId);

    if order_totals.is_empty() {
        return None;
    }

    let total: f64 = order_totals.values().sum();

    Some(total / order_totals.len() as f64)
}

/// The customer with the highest summed sales, or `None` when the dataset is
/// empty. Ties are broken lexicographically by name.
pub fn top_customer(dataset: &Dataset) -> Option<String> {
    top_n(dataset, GroupKey::CustomerName, 1)
        .pop()
        .map(|(name, _)| name)
}

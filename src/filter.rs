//! Filtering the sales dataset by month range, region, and category.

use std::collections::HashSet;

use crate::record::Dataset;

/// A user's filter selections, created per interaction and consumed
/// immediately.
///
/// `min_month` and `max_month` are "YYYY-MM" labels drawn from the dataset's
/// month options. An empty region or category set yields an empty result,
/// not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    /// The earliest month to include, inclusive.
    pub min_month: String,
    /// The latest month to include, inclusive.
    pub max_month: String,
    /// The regions to include.
    pub regions: HashSet<String>,
    /// The categories to include.
    pub categories: HashSet<String>,
}

impl FilterCriteria {
    /// Criteria that select the entire dataset: the full month span and every
    /// distinct region and category.
    pub fn all_of(dataset: &Dataset) -> Self {
        let months = dataset.month_options();

        Self {
            min_month: months.first().cloned().unwrap_or_default(),
            max_month: months.last().cloned().unwrap_or_default(),
            regions: dataset.distinct_regions().into_iter().collect(),
            categories: dataset.distinct_categories().into_iter().collect(),
        }
    }
}

/// Returns the subset of `dataset` matching `criteria`, preserving the
/// original record order.
///
/// A record is kept iff its month bucket falls within the inclusive month
/// range AND its region is selected AND its category is selected. Month
/// comparison is lexicographic on the zero-padded "YYYY-MM" labels, which
/// agrees with chronological order.
///
/// An inverted range (`min_month > max_month`) silently falls back to the
/// dataset's full month span instead of raising an error, matching the
/// dashboard's behaviour of warning in the sidebar while still showing data.
pub fn filter(dataset: &Dataset, criteria: &FilterCriteria) -> Dataset {
    let (min_month, max_month) = effective_range(dataset, criteria);

    let records = dataset
        .records()
        .iter()
        .filter(|record| {
            let month = record.month();

            min_month <= month
                && month <= max_month
                && criteria.regions.contains(&record.region)
                && criteria.categories.contains(&record.category)
        })
        .cloned()
        .collect();

    Dataset::new(records)
}

/// The inclusive month bounds to filter with, falling back to the dataset's
/// full span when the requested range is inverted.
fn effective_range(dataset: &Dataset, criteria: &FilterCriteria) -> (String, String) {
    if criteria.min_month <= criteria.max_month {
        return (criteria.min_month.clone(), criteria.max_month.clone());
    }

    tracing::warn!(
        "inverted month range {} > {}, falling back to the full dataset span",
        criteria.min_month,
        criteria.max_month
    );

    let months = dataset.month_options();

    match (months.first(), months.last()) {
        (Some(first), Some(last)) => (first.clone(), last.clone()),
        _ => (String::new(), String::new()),
    }
}

/// Returns the records whose string representation contains `term`,
/// case-insensitively, in any column.
///
/// This backs the raw-data tab's search box. An empty term matches every
/// record. Dates are matched in their DD/MM/YYYY source form and amounts
/// with two decimal places.
pub fn search(dataset: &Dataset, term: &str) -> Dataset {
    if term.is_empty() {
        return dataset.clone();
    }

    let term = term.to_lowercase();

    let records = dataset
        .records()
        .iter()
        .filter(|record| {
            let date = format!(
                "{:02}/{:02}/{:04}",
                record.order_date.day(),
                record.order_date.month() as u8,
                record.order_date.year()
            );

            let fields = [
                date.as_str(),
                &record.region,
                &record.category,
                &record.customer_name,
                &record.product_name,
                &record.order_id,
            ];

            fields
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
                || format!("{:.2}", record.sales).contains(&term)
        })
        .cloned()
        .collect();

    Dataset::new(records)
}

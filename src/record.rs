//! The sales dataset and its rows.

use std::collections::BTreeSet;

use time::{Date, Month, format_description::BorrowedFormatItem, macros::format_description};

/// The format month buckets are displayed in, e.g. "2021-03".
///
/// Zero padding matters: it makes lexicographic comparison of month labels
/// agree with chronological order, which the filter engine relies on.
const MONTH_LABEL_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]");

/// Formats a month bucket as a "YYYY-MM" label.
pub fn month_label(month: Date) -> String {
    month
        .format(&MONTH_LABEL_FORMAT)
        .expect("could not format month label")
}

/// Returns the first day of the month after the given month bucket.
pub fn next_month(month: Date) -> Date {
    let (year, month) = match month.month() {
        Month::December => (month.year() + 1, Month::January),
        other => (month.year(), other.next()),
    };

    Date::from_calendar_date(year, month, 1).expect("first day of month is always a valid date")
}

/// One row of the source sales dataset. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    /// The date the order was placed.
    pub order_date: Date,
    /// The first day of the month containing [Self::order_date], used as the
    /// time-series granularity key.
    pub month_bucket: Date,
    /// The sales region, e.g. "West".
    pub region: String,
    /// The product category, e.g. "Furniture".
    pub category: String,
    /// The name of the customer who placed the order.
    pub customer_name: String,
    /// The name of the product sold.
    pub product_name: String,
    /// The order this row belongs to. Orders may span multiple rows.
    pub order_id: String,
    /// The sales amount in dollars. Non-negative.
    pub sales: f64,
}

impl SalesRecord {
    /// Creates a record and derives its month bucket from the order date.
    pub fn new(
        order_date: Date,
        region: impl Into<String>,
        category: impl Into<String>,
        customer_name: impl Into<String>,
        product_name: impl Into<String>,
        order_id: impl Into<String>,
        sales: f64,
    ) -> Self {
        Self {
            order_date,
            month_bucket: order_date
                .replace_day(1)
                .expect("day one is valid for every month"),
            region: region.into(),
            category: category.into(),
            customer_name: customer_name.into(),
            product_name: product_name.into(),
            order_id: order_id.into(),
            sales,
        }
    }

    /// The record's month bucket as a "YYYY-MM" label.
    pub fn month(&self) -> String {
        month_label(self.month_bucket)
    }
}

/// An ordered sequence of sales records, loaded once and read-only thereafter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<SalesRecord>,
}

impl Dataset {
    /// Wraps records in their load order.
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    /// The records in their original order.
    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    /// The number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The distinct month buckets present in the dataset as "YYYY-MM" labels,
    /// in chronological order.
    pub fn month_options(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|record| record.month_bucket)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(month_label)
            .collect()
    }

    /// The distinct regions in the dataset, sorted alphabetically.
    pub fn distinct_regions(&self) -> Vec<String> {
        self.distinct(|record| &record.region)
    }

    /// The distinct categories in the dataset, sorted alphabetically.
    pub fn distinct_categories(&self) -> Vec<String> {
        self.distinct(|record| &record.category)
    }

    fn distinct(&self, field: impl Fn(&SalesRecord) -> &String) -> Vec<String> {
        self.records
            .iter()
            .map(|record| field(record).clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::{Dataset, SalesRecord, month_label, next_month};

    fn record(order_date: time::Date, region: &str, category: &str) -> SalesRecord {
        SalesRecord::new(
            order_date,
            region,
            category,
            "Aaron Hawkins",
            "Staple remover",
            "CA-2021-100006",
            100.0,
        )
    }

    #[test]
    fn month_bucket_is_first_day_of_order_month() {
        let record = record(date!(2021 - 03 - 17), "West", "Furniture");

        assert_eq!(record.month_bucket, date!(2021 - 03 - 01));
        assert_eq!(record.month(), "2021-03");
    }

    #[test]
    fn month_label_zero_pads() {
        assert_eq!(month_label(date!(2021 - 03 - 01)), "2021-03");
        assert_eq!(month_label(date!(2021 - 11 - 01)), "2021-11");
    }

    #[test]
    fn next_month_rolls_over_december() {
        assert_eq!(next_month(date!(2021 - 12 - 01)), date!(2022 - 01 - 01));
        assert_eq!(next_month(date!(2021 - 01 - 01)), date!(2021 - 02 - 01));
    }

    #[test]
    fn month_options_are_distinct_and_chronological() {
        let dataset = Dataset::new(vec![
            record(date!(2021 - 03 - 17), "West", "Furniture"),
            record(date!(2020 - 11 - 02), "East", "Technology"),
            record(date!(2021 - 03 - 20), "West", "Furniture"),
            record(date!(2021 - 01 - 05), "South", "Office Supplies"),
        ]);

        assert_eq!(
            dataset.month_options(),
            vec!["2020-11", "2021-01", "2021-03"]
        );
    }

    #[test]
    fn distinct_values_are_sorted() {
        let dataset = Dataset::new(vec![
            record(date!(2021 - 03 - 17), "West", "Technology"),
            record(date!(2021 - 03 - 18), "East", "Furniture"),
            record(date!(2021 - 03 - 19), "West", "Furniture"),
        ]);

        assert_eq!(dataset.distinct_regions(), vec!["East", "West"]);
        assert_eq!(
            dataset.distinct_categories(),
            vec!["Furniture", "Technology"]
        );
    }
}

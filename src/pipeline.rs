//! Deriving every dashboard view from one dataset and one set of filters.
//!
//! [derive_views] is the single entry point the presentation layer calls per
//! interaction: it applies the filter once and computes the KPI cards, the
//! chart tables, the rankings, and the forecast from the same filtered
//! subset, so every view agrees on which records are in scope.
//!
//! The views serialize to JSON so a frontend or the `--json` CLI flag can
//! consume them directly. Month buckets appear as "YYYY-MM" labels.

use serde::Serialize;

use crate::{
    aggregate::{GroupKey, average_order_value, sum_by_month, top_customer, top_n, total_sales},
    filter::{FilterCriteria, filter},
    forecast::{self, Decomposition, ForecastOutcome, MIN_OBSERVATIONS, MonthlySeries},
    format::{format_currency, format_currency_rounded},
    record::{Dataset, month_label},
};

/// How many products the top-products ranking shows.
pub const TOP_PRODUCT_COUNT: usize = 10;
/// How many customers the top-customers ranking shows.
pub const TOP_CUSTOMER_COUNT: usize = 10;

/// One month's total sales, for the trend chart and the forecast tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthRow {
    /// The month bucket as a "YYYY-MM" label.
    pub month: String,
    /// The summed sales for that month.
    pub sales: f64,
}

/// One group's total sales, for the region and category charts and the
/// rankings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyRow {
    /// The group value, e.g. a region or product name.
    pub key: String,
    /// The summed sales for that group.
    pub sales: f64,
}

/// The headline figures shown at the top of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    /// The sum of all sales in the filtered subset.
    pub total_sales: f64,
    /// [Self::total_sales] rounded to whole dollars, e.g. `$2,297,201`.
    pub total_sales_display: String,
    /// The mean of per-order sums, `None` when no records match the filter.
    pub average_order_value: Option<f64>,
    /// [Self::average_order_value] as a currency string, or "-" when `None`.
    pub average_order_value_display: String,
    /// The customer with the highest summed sales, `None` when no records
    /// match the filter.
    pub top_customer: Option<String>,
}

/// One month of the seasonal decomposition, aligned across components.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecompositionRow {
    /// The month bucket as a "YYYY-MM" label.
    pub month: String,
    /// The observed monthly total.
    pub observed: f64,
    /// The centered-moving-average trend, `None` at the series edges.
    pub trend: Option<f64>,
    /// The repeating seasonal component.
    pub seasonal: f64,
    /// The remainder after trend and seasonal, `None` wherever the trend is.
    pub residual: Option<f64>,
}

/// The forecast tab's content. Always present in some form: a missing or
/// failed forecast renders as a message, never as a missing view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastSection {
    /// The model was fitted and projected.
    Ready {
        /// The monthly history the model was fitted to.
        history: Vec<MonthRow>,
        /// The projected totals for the months after the history.
        forecast: Vec<MonthRow>,
        /// The decomposition table, when the history supports one.
        decomposition: Option<Vec<DecompositionRow>>,
        /// Why the decomposition is missing, when it is.
        decomposition_note: Option<String>,
    },
    /// The filtered subset has too little history to fit the model.
    InsufficientData {
        /// How many monthly observations the subset produced.
        observed: usize,
        /// How many the model needs.
        required: usize,
    },
    /// The model could not be fitted or the horizon was invalid.
    Failed {
        /// A human-readable reason.
        message: String,
    },
}

/// Everything the dashboard renders for one filtered view of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedViews {
    /// The headline figures.
    pub kpis: Kpis,
    /// Total sales per month, chronological.
    pub monthly_trend: Vec<MonthRow>,
    /// Total sales per region, descending.
    pub sales_by_region: Vec<KeyRow>,
    /// Total sales per category, descending.
    pub sales_by_category: Vec<KeyRow>,
    /// The highest-grossing products, descending.
    pub top_products: Vec<KeyRow>,
    /// The highest-grossing customers, descending.
    pub top_customers: Vec<KeyRow>,
    /// The forecast tab.
    pub forecast: ForecastSection,
    /// How many records matched the filter.
    pub record_count: usize,
}

/// Applies `criteria` to `dataset` and derives every dashboard view from the
/// filtered subset.
///
/// A forecast that cannot be produced, whether from too little history, a
/// gap in the months, or an out-of-range horizon, degrades to a message in
/// [DerivedViews::forecast]. The other views are always computed.
pub fn derive_views(
    dataset: &Dataset,
    criteria: &FilterCriteria,
    horizon: usize,
) -> DerivedViews {
    let filtered = filter(dataset, criteria);

    tracing::debug!(
        "derived views over {} of {} records",
        filtered.len(),
        dataset.len()
    );

    DerivedViews {
        kpis: kpis(&filtered),
        monthly_trend: monthly_rows(&MonthlySeries::from_monthly_totals(&sum_by_month(
            &filtered,
        ))),
        sales_by_region: key_rows(top_n(&filtered, GroupKey::Region, usize::MAX)),
        sales_by_category: key_rows(top_n(&filtered, GroupKey::Category, usize::MAX)),
        top_products: key_rows(top_n(&filtered, GroupKey::ProductName, TOP_PRODUCT_COUNT)),
        top_customers: key_rows(top_n(
            &filtered,
            GroupKey::CustomerName,
            TOP_CUSTOMER_COUNT,
        )),
        forecast: forecast_section(&filtered, horizon),
        record_count: filtered.len(),
    }
}

fn kpis(dataset: &Dataset) -> Kpis {
    let total = total_sales(dataset);
    let average = average_order_value(dataset);

    Kpis {
        total_sales: total,
        total_sales_display: format_currency_rounded(total),
        average_order_value: average,
        average_order_value_display: average
            .map(format_currency)
            .unwrap_or_else(|| "-".to_owned()),
        top_customer: top_customer(dataset),
    }
}

fn monthly_rows(series: &MonthlySeries) -> Vec<MonthRow> {
    series
        .months()
        .iter()
        .zip(series.values())
        .map(|(month, sales)| MonthRow {
            month: month_label(*month),
            sales: *sales,
        })
        .collect()
}

fn key_rows(entries: Vec<(String, f64)>) -> Vec<KeyRow> {
    entries
        .into_iter()
        .map(|(key, sales)| KeyRow { key, sales })
        .collect()
}

fn decomposition_rows(decomposition: &Decomposition) -> Vec<DecompositionRow> {
    decomposition
        .months
        .iter()
        .enumerate()
        .map(|(index, month)| DecompositionRow {
            month: month_label(*month),
            observed: decomposition.observed[index],
            trend: decomposition.trend[index],
            seasonal: decomposition.seasonal[index],
            residual: decomposition.residual[index],
        })
        .collect()
}

fn forecast_section(dataset: &Dataset, horizon: usize) -> ForecastSection {
    match forecast::run(dataset, horizon) {
        Ok(ForecastOutcome::Ready(report)) => ForecastSection::Ready {
            history: monthly_rows(&report.history),
            forecast: monthly_rows(&report.forecast),
            decomposition: report.decomposition.as_ref().map(decomposition_rows),
            decomposition_note: report.decomposition_note,
        },
        Ok(ForecastOutcome::InsufficientData { observed }) => ForecastSection::InsufficientData {
            observed,
            required: MIN_OBSERVATIONS,
        },
        Err(error) => {
            tracing::warn!("the forecast is unavailable for this view: {error}");

            ForecastSection::Failed {
                message: error.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        filter::FilterCriteria,
        record::{Dataset, SalesRecord, next_month},
    };

    use super::{ForecastSection, derive_views};

    /// Two years of one record per month across two regions.
    fn test_dataset() -> Dataset {
        let mut month = date!(2020 - 01 - 01);
        let mut records = Vec::new();

        for index in 0..24 {
            let region = if index % 2 == 0 { "West" } else { "East" };
            records.push(SalesRecord::new(
                month,
                region,
                "Furniture",
                "Aaron Hawkins",
                "Bookcase",
                &format!("CA-{index:03}"),
                1000.0,
            ));
            month = next_month(month);
        }

        Dataset::new(records)
    }

    #[test]
    fn all_views_come_from_the_same_filtered_subset() {
        let dataset = test_dataset();
        let mut criteria = FilterCriteria::all_of(&dataset);
        criteria.regions = ["West".to_owned()].into();

        let views = derive_views(&dataset, &criteria, 6);

        assert_eq!(views.record_count, 12);
        assert_eq!(views.kpis.total_sales, 12_000.0);
        assert_eq!(views.sales_by_region.len(), 1);
        assert_eq!(views.sales_by_region[0].key, "West");

        let trend_total: f64 = views.monthly_trend.iter().map(|row| row.sales).sum();
        assert_eq!(trend_total, views.kpis.total_sales);
    }

    #[test]
    fn kpi_displays_are_formatted() {
        let dataset = test_dataset();
        let criteria = FilterCriteria::all_of(&dataset);

        let views = derive_views(&dataset, &criteria, 6);

        assert_eq!(views.kpis.total_sales_display, "$24,000");
        assert_eq!(views.kpis.average_order_value_display, "$1,000.00");
        assert_eq!(views.kpis.top_customer, Some("Aaron Hawkins".to_owned()));
    }

    #[test]
    fn monthly_trend_is_chronological_with_label_months() {
        let dataset = test_dataset();
        let criteria = FilterCriteria::all_of(&dataset);

        let views = derive_views(&dataset, &criteria, 6);

        assert_eq!(views.monthly_trend.len(), 24);
        assert_eq!(views.monthly_trend[0].month, "2020-01");
        assert_eq!(views.monthly_trend[23].month, "2021-12");
        for pair in views.monthly_trend.windows(2) {
            assert!(pair[0].month < pair[1].month);
        }
    }

    #[test]
    fn full_history_forecast_is_ready() {
        let dataset = test_dataset();
        let criteria = FilterCriteria::all_of(&dataset);

        let views = derive_views(&dataset, &criteria, 6);

        match views.forecast {
            ForecastSection::Ready { forecast, .. } => assert_eq!(forecast.len(), 6),
            other => panic!("expected a ready forecast, got {other:?}"),
        }
    }

    #[test]
    fn short_history_degrades_the_forecast_but_not_the_other_views() {
        let dataset = test_dataset();
        let mut criteria = FilterCriteria::all_of(&dataset);
        // Keep five months so the forecast has too little history.
        criteria.min_month = "2020-01".to_owned();
        criteria.max_month = "2020-05".to_owned();

        let views = derive_views(&dataset, &criteria, 6);

        assert_eq!(
            views.forecast,
            ForecastSection::InsufficientData {
                observed: 5,
                required: 12
            }
        );
        assert_eq!(views.record_count, 5);
        assert_eq!(views.kpis.total_sales, 5_000.0);
        assert_eq!(views.monthly_trend.len(), 5);
    }

    #[test]
    fn invalid_horizon_degrades_to_a_failed_section() {
        let dataset = test_dataset();
        let criteria = FilterCriteria::all_of(&dataset);

        let views = derive_views(&dataset, &criteria, 99);

        assert!(matches!(views.forecast, ForecastSection::Failed { .. }));
        assert_eq!(views.kpis.total_sales, 24_000.0);
    }

    #[test]
    fn empty_filter_yields_empty_views() {
        let dataset = test_dataset();
        let mut criteria = FilterCriteria::all_of(&dataset);
        criteria.regions.clear();

        let views = derive_views(&dataset, &criteria, 6);

        assert_eq!(views.record_count, 0);
        assert_eq!(views.kpis.total_sales, 0.0);
        assert_eq!(views.kpis.average_order_value, None);
        assert_eq!(views.kpis.top_customer, None);
        assert!(views.monthly_trend.is_empty());
        assert_eq!(
            views.forecast,
            ForecastSection::InsufficientData {
                observed: 0,
                required: 12
            }
        );
    }

    #[test]
    fn views_serialize_to_json() {
        let dataset = test_dataset();
        let criteria = FilterCriteria::all_of(&dataset);

        let views = derive_views(&dataset, &criteria, 6);
        let json = serde_json::to_value(&views).expect("could not serialize views");

        assert_eq!(json["kpis"]["total_sales"], 24_000.0);
        assert_eq!(json["forecast"]["status"], "ready");
    }
}

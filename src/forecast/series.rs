//! The monthly time series the forecast model operates on.

use time::Date;

use crate::{aggregate::MonthlyAggregate, record::next_month};

/// An ordered sequence of per-month sales totals.
///
/// Months are strictly increasing. The forecast model additionally requires
/// them to be consecutive, which [MonthlySeries::is_contiguous] checks.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeries {
    months: Vec<Date>,
    values: Vec<f64>,
}

impl MonthlySeries {
    /// Builds a series from chronologically ordered monthly totals.
    pub fn from_monthly_totals(totals: &MonthlyAggregate) -> Self {
        Self {
            months: totals.keys().copied().collect(),
            values: totals.values().copied().collect(),
        }
    }

    /// Builds a series from parallel month and value vectors.
    ///
    /// The caller must supply the months in strictly increasing order with
    /// one value per month.
    pub fn from_parts(months: Vec<Date>, values: Vec<f64>) -> Self {
        debug_assert_eq!(months.len(), values.len());

        Self { months, values }
    }

    /// The month buckets, chronologically ordered.
    pub fn months(&self) -> &[Date] {
        &self.months
    }

    /// The per-month totals, parallel to [Self::months].
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The number of monthly observations.
    pub fn len(&self) -> usize {
        self.months.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// The last observed month, if any.
    pub fn last_month(&self) -> Option<Date> {
        self.months.last().copied()
    }

    /// Whether every observation is exactly one calendar month after the
    /// previous one.
    pub fn is_contiguous(&self) -> bool {
        self.months
            .windows(2)
            .all(|pair| next_month(pair[0]) == pair[1])
    }

    /// The `horizon` consecutive months immediately after the last observed
    /// month. Empty when the series is empty.
    pub fn future_months(&self, horizon: usize) -> Vec<Date> {
        let Some(mut month) = self.last_month() else {
            return Vec::new();
        };

        let mut months = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            month = next_month(month);
            months.push(month);
        }

        months
    }
}

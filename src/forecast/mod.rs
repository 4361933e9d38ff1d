//! Forecasting the monthly sales trend.
//!
//! The entry point is [run]: it aggregates the dataset into a monthly series,
//! validates it, optionally decomposes it into trend and seasonal components,
//! fits a damped Holt-Winters model, and projects it over the requested
//! horizon. A dataset with too little history yields
//! [ForecastOutcome::InsufficientData] rather than an error, since that is an
//! expected state for a freshly filtered view, not a failure.

use crate::{Error, aggregate::sum_by_month, record::Dataset};

pub mod decompose;
pub mod holt_winters;
pub mod optimize;
pub mod series;

pub use decompose::{Decomposition, seasonal_decompose};
pub use holt_winters::DampedHoltWinters;
pub use series::MonthlySeries;

/// The number of months in one seasonal cycle.
pub const SEASONAL_PERIOD: usize = 12;
/// The minimum number of monthly observations needed to fit the model.
pub const MIN_OBSERVATIONS: usize = SEASONAL_PERIOD;
/// The minimum number of monthly observations needed for the seasonal
/// decomposition, which requires two full cycles.
pub const DECOMPOSITION_MIN_OBSERVATIONS: usize = 2 * SEASONAL_PERIOD;
/// The shortest forecast horizon, in months.
pub const MIN_HORIZON: usize = 3;
/// The longest forecast horizon, in months.
pub const MAX_HORIZON: usize = 60;

/// The result of a forecast run over a (possibly filtered) dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastOutcome {
    /// The model was fitted and projected over the requested horizon.
    Ready(Box<ForecastReport>),
    /// The dataset has fewer monthly observations than the model needs.
    ///
    /// The caller should display how much history exists and how much is
    /// required instead of a forecast.
    InsufficientData {
        /// How many monthly observations the dataset produced.
        observed: usize,
    },
}

/// A fitted forecast and its supporting analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastReport {
    /// The monthly history the model was fitted to.
    pub history: MonthlySeries,
    /// The seasonal decomposition of the history, when it could be computed.
    pub decomposition: Option<Decomposition>,
    /// Why the decomposition is missing, when it is.
    pub decomposition_note: Option<String>,
    /// The projected monthly totals for the months after the history.
    pub forecast: MonthlySeries,
}

/// Forecasts the next `horizon` months of total sales for `dataset`.
///
/// Fails with [Error::InvalidHorizon] when `horizon` is outside
/// [MIN_HORIZON]..=[MAX_HORIZON], with [Error::FitFailed] when the monthly
/// history has gaps or the model cannot be fitted. A history shorter than
/// [MIN_OBSERVATIONS] months is reported as
/// [ForecastOutcome::InsufficientData]. A failed decomposition never blocks
/// the forecast, it is recorded as a note on the report.
pub fn run(dataset: &Dataset, horizon: usize) -> Result<ForecastOutcome, Error> {
    if !(MIN_HORIZON..=MAX_HORIZON).contains(&horizon) {
        return Err(Error::InvalidHorizon(horizon));
    }

    let history = MonthlySeries::from_monthly_totals(&sum_by_month(dataset));

    if history.len() < MIN_OBSERVATIONS {
        tracing::info!(
            "not enough history to forecast: {} of {MIN_OBSERVATIONS} months",
            history.len()
        );

        return Ok(ForecastOutcome::InsufficientData {
            observed: history.len(),
        });
    }

    if !history.is_contiguous() {
        return Err(Error::FitFailed(
            "the monthly history has gaps; the model needs consecutive months".to_owned(),
        ));
    }

    let (decomposition, decomposition_note) =
        if history.len() >= DECOMPOSITION_MIN_OBSERVATIONS {
            match seasonal_decompose(&history, SEASONAL_PERIOD) {
                Ok(decomposition) => (Some(decomposition), None),
                Err(error) => {
                    tracing::warn!("skipping the seasonal decomposition: {error}");
                    (None, Some(error.to_string()))
                }
            }
        } else {
            (
                None,
                Some(format!(
                    "the seasonal decomposition needs {DECOMPOSITION_MIN_OBSERVATIONS} months \
                     of history, got {}",
                    history.len()
                )),
            )
        };

    let model = DampedHoltWinters::fit(history.values(), SEASONAL_PERIOD)?;

    let months = history.future_months(horizon);
    let values = model.predict(horizon);
    let forecast = MonthlySeries::from_parts(months, values);

    Ok(ForecastOutcome::Ready(Box::new(ForecastReport {
        history,
        decomposition,
        decomposition_note,
        forecast,
    })))
}

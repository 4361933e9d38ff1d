//! Additive seasonal decomposition of the monthly sales history.
//!
//! Splits the observed series into trend, seasonal, and residual components
//! under the additive model `observed = trend + seasonal + residual`. The
//! trend is a centered moving average; since the period is even (12 months)
//! the window takes half weight at both endpoints, so the first and last
//! `period / 2` trend and residual values are undefined.

use time::Date;

use crate::Error;

use super::series::MonthlySeries;

/// The components of an additively decomposed monthly series, aligned to the
/// same months as the observed data.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    /// The months the components are aligned to.
    pub months: Vec<Date>,
    /// The observed per-month totals.
    pub observed: Vec<f64>,
    /// The centered-moving-average trend. `None` at the edges where the
    /// window does not fit.
    pub trend: Vec<Option<f64>>,
    /// The repeating seasonal component, normalized to sum to zero over one
    /// period.
    pub seasonal: Vec<f64>,
    /// `observed - trend - seasonal`. `None` wherever the trend is.
    pub residual: Vec<Option<f64>>,
}

/// Decomposes `series` with the given seasonal period.
///
/// Requires at least two full periods of observations. Fails with
/// [Error::DecompositionFailed] when the data cannot support a seasonal
/// estimate; callers should degrade that to a warning and continue.
pub fn seasonal_decompose(series: &MonthlySeries, period: usize) -> Result<Decomposition, Error> {
    let values = series.values();
    let n = values.len();

    if period < 2 {
        return Err(Error::DecompositionFailed(format!(
            "seasonal period must be at least 2, got {period}"
        )));
    }

    if n < 2 * period {
        return Err(Error::DecompositionFailed(format!(
            "need at least {} observations for a period of {period}, got {n}",
            2 * period
        )));
    }

    if values.iter().any(|value| !value.is_finite()) {
        return Err(Error::DecompositionFailed(
            "the series contains non-finite values".to_owned(),
        ));
    }

    let trend = centered_trend(values, period);

    // Average the detrended values at each period position to estimate the
    // seasonal effect, then normalize so one full period sums to zero.
    let mut position_sums = vec![0.0; period];
    let mut position_counts = vec![0usize; period];

    for (index, (value, trend_value)) in values.iter().zip(&trend).enumerate() {
        if let Some(trend_value) = trend_value {
            position_sums[index % period] += value - trend_value;
            position_counts[index % period] += 1;
        }
    }

    if position_counts.iter().any(|&count| count == 0) {
        return Err(Error::DecompositionFailed(
            "not every month of the year is covered by the trend window".to_owned(),
        ));
    }

    let mut period_means: Vec<f64> = position_sums
        .iter()
        .zip(&position_counts)
        .map(|(sum, &count)| sum / count as f64)
        .collect();

    let mean_of_means = period_means.iter().sum::<f64>() / period as f64;
    for mean in &mut period_means {
        *mean -= mean_of_means;
    }

    let seasonal: Vec<f64> = (0..n).map(|index| period_means[index % period]).collect();

    let residual: Vec<Option<f64>> = values
        .iter()
        .zip(&trend)
        .zip(&seasonal)
        .map(|((value, trend_value), seasonal_value)| {
            trend_value.map(|trend_value| value - trend_value - seasonal_value)
        })
        .collect();

    Ok(Decomposition {
        months: series.months().to_vec(),
        observed: values.to_vec(),
        trend,
        seasonal,
        residual,
    })
}

/// A centered moving average with half-weight endpoints, the conventional
/// trend estimate for an even seasonal period.
fn centered_trend(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let half = period / 2;
    let mut trend = vec![None; n];

    for index in half..(n - half) {
        let window = &values[index - half..=index + half];
        let interior: f64 = window[1..window.len() - 1].iter().sum();
        let endpoints = 0.5 * (window[0] + window[window.len() - 1]);

        trend[index] = Some((interior + endpoints) / period as f64);
    }

    trend
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use time::macros::date;

    use crate::{Error, aggregate::MonthlyAggregate, forecast::series::MonthlySeries, record::next_month};

    use super::seasonal_decompose;

    /// A monthly series starting January 2020 with the given values.
    fn monthly_series(values: &[f64]) -> MonthlySeries {
        let mut totals = MonthlyAggregate::new();
        let mut month = date!(2020 - 01 - 01);

        for value in values {
            totals.insert(month, *value);
            month = next_month(month);
        }

        MonthlySeries::from_monthly_totals(&totals)
    }

    #[test]
    fn rejects_fewer_than_two_periods() {
        let series = monthly_series(&[100.0; 23]);

        let result = seasonal_decompose(&series, 12);

        assert!(matches!(result, Err(Error::DecompositionFailed(_))));
    }

    #[test]
    fn components_are_aligned_to_the_observed_months() {
        let values: Vec<f64> = (0..36).map(|i| 100.0 + i as f64).collect();
        let series = monthly_series(&values);

        let decomposition = seasonal_decompose(&series, 12).expect("could not decompose");

        assert_eq!(decomposition.months.len(), 36);
        assert_eq!(decomposition.observed.len(), 36);
        assert_eq!(decomposition.trend.len(), 36);
        assert_eq!(decomposition.seasonal.len(), 36);
        assert_eq!(decomposition.residual.len(), 36);
        assert_eq!(decomposition.months[0], date!(2020 - 01 - 01));
    }

    #[test]
    fn trend_is_undefined_at_the_edges() {
        let values: Vec<f64> = (0..24).map(|i| 100.0 + i as f64).collect();
        let series = monthly_series(&values);

        let decomposition = seasonal_decompose(&series, 12).expect("could not decompose");

        for index in 0..6 {
            assert_eq!(decomposition.trend[index], None);
            assert_eq!(decomposition.residual[index], None);
        }
        for index in 18..24 {
            assert_eq!(decomposition.trend[index], None);
            assert_eq!(decomposition.residual[index], None);
        }
        assert!(decomposition.trend[6].is_some());
        assert!(decomposition.trend[17].is_some());
    }

    #[test]
    fn linear_series_has_linear_trend_and_no_seasonality() {
        let values: Vec<f64> = (0..36).map(|i| 50.0 + 10.0 * i as f64).collect();
        let series = monthly_series(&values);

        let decomposition = seasonal_decompose(&series, 12).expect("could not decompose");

        // The centered moving average of a linear series is the series itself.
        for (index, trend) in decomposition.trend.iter().enumerate() {
            if let Some(trend) = trend {
                assert_relative_eq!(*trend, values[index], epsilon = 1e-9);
            }
        }

        for seasonal in &decomposition.seasonal {
            assert_relative_eq!(*seasonal, 0.0, epsilon = 1e-9);
        }

        for residual in decomposition.residual.iter().flatten() {
            assert_relative_eq!(*residual, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn seasonal_component_sums_to_zero_over_one_period() {
        // Trend plus a repeating 12-month pattern.
        let values: Vec<f64> = (0..48)
            .map(|i| 1000.0 + 5.0 * i as f64 + [0.0, 50.0, -30.0, 20.0][i % 4])
            .collect();
        let series = monthly_series(&values);

        let decomposition = seasonal_decompose(&series, 12).expect("could not decompose");

        let one_period: f64 = decomposition.seasonal[..12].iter().sum();
        assert_relative_eq!(one_period, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn seasonal_pattern_repeats_with_the_period() {
        let values: Vec<f64> = (0..48)
            .map(|i| 1000.0 + [0.0, 50.0, -30.0, 20.0][i % 4])
            .collect();
        let series = monthly_series(&values);

        let decomposition = seasonal_decompose(&series, 12).expect("could not decompose");

        for index in 0..36 {
            assert_relative_eq!(
                decomposition.seasonal[index],
                decomposition.seasonal[index + 12],
                epsilon = 1e-9
            );
        }
    }
}

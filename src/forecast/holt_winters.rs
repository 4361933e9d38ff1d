//! Damped additive Holt-Winters exponential smoothing.
//!
//! The model equations, with level `l`, trend `b`, seasonals `s`, period `m`,
//! and damping `phi`:
//!
//! - One-step forecast: `ŷ_t = l_{t-1} + φ·b_{t-1} + s_{t-m}`
//! - Level: `l_t = α(y_t - s_{t-m}) + (1-α)(l_{t-1} + φ·b_{t-1})`
//! - Trend: `b_t = β(l_t - l_{t-1}) + (1-β)·φ·b_{t-1}`
//! - Seasonal: `s_t = γ(y_t - l_t) + (1-γ)·s_{t-m}`
//! - h-step forecast: `ŷ_{t+h} = l_t + (φ + φ² + … + φ^h)·b_t + s_{t+h-m}`
//!
//! Damping attenuates the trend so long-horizon projections level off
//! instead of drifting without bound. The smoothing parameters are estimated
//! from the data by minimizing the in-sample sum of squared one-step errors.

use crate::Error;

use super::optimize::{NelderMeadConfig, nelder_mead};

/// Bounds for the smoothing parameters during the optimizer search.
const SMOOTHING_BOUNDS: (f64, f64) = (1e-4, 0.9999);
/// Bounds for the damping parameter. Values near zero kill the trend
/// entirely; values at one disable damping.
const DAMPING_BOUNDS: (f64, f64) = (0.1, 0.98);
/// The optimizer's start point: `[alpha, beta, gamma, phi]`.
const START_PARAMS: [f64; 4] = [0.3, 0.1, 0.1, 0.9];

/// A fitted damped additive-trend, additive-seasonal exponential-smoothing
/// model.
#[derive(Debug, Clone)]
pub struct DampedHoltWinters {
    alpha: f64,
    beta: f64,
    gamma: f64,
    phi: f64,
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
    period: usize,
    n: usize,
    sse: f64,
}

/// The end state of one smoothing pass over the history.
struct SmoothedState {
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
    sse: f64,
}

impl DampedHoltWinters {
    /// Fits the model to `values` with the given seasonal period, estimating
    /// the smoothing parameters by an optimized search.
    ///
    /// Requires at least one full season of observations. Fails with
    /// [Error::FitFailed] when the optimizer cannot produce a finite model
    /// state.
    pub fn fit(values: &[f64], period: usize) -> Result<Self, Error> {
        if values.len() < period {
            return Err(Error::FitFailed(format!(
                "need at least {period} monthly observations, got {}",
                values.len()
            )));
        }

        if values.iter().any(|value| !value.is_finite()) {
            return Err(Error::FitFailed(
                "the monthly history contains non-finite values".to_owned(),
            ));
        }

        let bounds = [
            SMOOTHING_BOUNDS,
            SMOOTHING_BOUNDS,
            SMOOTHING_BOUNDS,
            DAMPING_BOUNDS,
        ];

        let result = nelder_mead(
            |params| {
                smooth(values, period, params[0], params[1], params[2], params[3]).sse
            },
            &START_PARAMS,
            &bounds,
            NelderMeadConfig::default(),
        );

        let [alpha, beta, gamma, phi] = result.point[..] else {
            return Err(Error::FitFailed(
                "parameter search returned the wrong dimensionality".to_owned(),
            ));
        };

        tracing::debug!(
            "fitted smoothing parameters alpha={alpha:.4} beta={beta:.4} \
             gamma={gamma:.4} phi={phi:.4} in {} iterations",
            result.iterations
        );

        let state = smooth(values, period, alpha, beta, gamma, phi);

        let finite = state.level.is_finite()
            && state.trend.is_finite()
            && state.sse.is_finite()
            && state.seasonals.iter().all(|seasonal| seasonal.is_finite());

        if !finite {
            return Err(Error::FitFailed(
                "the optimized model state is not finite".to_owned(),
            ));
        }

        Ok(Self {
            alpha,
            beta,
            gamma,
            phi,
            level: state.level,
            trend: state.trend,
            seasonals: state.seasonals,
            period,
            n: values.len(),
            sse: state.sse,
        })
    }

    /// Projects the fitted model forward by `horizon` periods.
    pub fn predict(&self, horizon: usize) -> Vec<f64> {
        let mut predictions = Vec::with_capacity(horizon);
        let mut damped_sum = 0.0;
        let mut phi_power = 1.0;

        for step in 1..=horizon {
            phi_power *= self.phi;
            damped_sum += phi_power;

            let season_index = (self.n + step - 1) % self.period;

            predictions.push(self.level + damped_sum * self.trend + self.seasonals[season_index]);
        }

        predictions
    }

    /// The estimated `(alpha, beta, gamma, phi)` parameters.
    pub fn params(&self) -> (f64, f64, f64, f64) {
        (self.alpha, self.beta, self.gamma, self.phi)
    }

    /// The in-sample sum of squared one-step errors.
    pub fn sse(&self) -> f64 {
        self.sse
    }
}

/// Initializes the state from the first season: the level is the first
/// season's mean, the trend averages the season-over-season differences when
/// two full seasons exist, and the seasonals are the first season's
/// deviations from the level, normalized to sum to zero.
fn initial_state(values: &[f64], period: usize) -> (f64, f64, Vec<f64>) {
    let level = values[..period].iter().sum::<f64>() / period as f64;

    let trend = if values.len() >= 2 * period {
        (0..period)
            .map(|index| (values[period + index] - values[index]) / period as f64)
            .sum::<f64>()
            / period as f64
    } else {
        0.0
    };

    let mut seasonals: Vec<f64> = values[..period].iter().map(|value| value - level).collect();

    let mean = seasonals.iter().sum::<f64>() / period as f64;
    for seasonal in &mut seasonals {
        *seasonal -= mean;
    }

    (level, trend, seasonals)
}

/// Runs one smoothing pass over the history, accumulating the one-step
/// squared errors. The first season only initializes the state.
fn smooth(
    values: &[f64],
    period: usize,
    alpha: f64,
    beta: f64,
    gamma: f64,
    phi: f64,
) -> SmoothedState {
    let (mut level, mut trend, mut seasonals) = initial_state(values, period);
    let mut sse = 0.0;

    for (t, &y) in values.iter().enumerate().skip(period) {
        let season_index = t % period;
        let seasonal = seasonals[season_index];
        let damped_trend = phi * trend;

        let predicted = level + damped_trend + seasonal;
        let error = y - predicted;
        sse += error * error;

        let previous_level = level;
        level = alpha * (y - seasonal) + (1.0 - alpha) * (previous_level + damped_trend);
        trend = beta * (level - previous_level) + (1.0 - beta) * damped_trend;
        seasonals[season_index] = gamma * (y - level) + (1.0 - gamma) * seasonal;
    }

    SmoothedState {
        level,
        trend,
        seasonals,
        sse,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::Error;

    use super::DampedHoltWinters;

    fn seasonal_values(n: usize, base: f64, slope: f64, amplitude: f64) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let angle = 2.0 * std::f64::consts::PI * (i % 12) as f64 / 12.0;
                base + slope * i as f64 + amplitude * angle.sin()
            })
            .collect()
    }

    #[test]
    fn flat_series_forecasts_the_constant_level() {
        let values = vec![1000.0; 24];

        let model = DampedHoltWinters::fit(&values, 12).expect("could not fit model");
        let predictions = model.predict(6);

        assert_eq!(predictions.len(), 6);
        for prediction in predictions {
            assert_relative_eq!(prediction, 1000.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn fits_with_exactly_one_season_of_data() {
        let values: Vec<f64> = (0..12).map(|i| 100.0 + i as f64).collect();

        let model = DampedHoltWinters::fit(&values, 12).expect("could not fit model");
        let predictions = model.predict(3);

        assert_eq!(predictions.len(), 3);
        for prediction in predictions {
            assert!(prediction.is_finite());
        }
    }

    #[test]
    fn rejects_less_than_one_season() {
        let values = vec![100.0; 11];

        let result = DampedHoltWinters::fit(&values, 12);

        assert!(matches!(result, Err(Error::FitFailed(_))));
    }

    #[test]
    fn rejects_non_finite_history() {
        let mut values = vec![100.0; 24];
        values[5] = f64::NAN;

        let result = DampedHoltWinters::fit(&values, 12);

        assert!(matches!(result, Err(Error::FitFailed(_))));
    }

    #[test]
    fn captures_a_seasonal_pattern() {
        let values = seasonal_values(48, 1000.0, 0.0, 200.0);

        let model = DampedHoltWinters::fit(&values, 12).expect("could not fit model");
        let predictions = model.predict(12);

        // The forecast season should rise where the history rises (March,
        // index 2 of the cycle) and dip where it dips (September, index 8).
        assert!(
            predictions[2] > predictions[8],
            "expected the seasonal peak to exceed the trough: {predictions:?}"
        );
    }

    #[test]
    fn damping_bounds_long_range_drift() {
        let values = seasonal_values(48, 1000.0, 10.0, 0.0);

        let model = DampedHoltWinters::fit(&values, 12).expect("could not fit model");
        let predictions = model.predict(60);

        // With phi < 1 the per-step increment shrinks geometrically, so the
        // last step must be smaller than the first.
        let first_step = predictions[1] - predictions[0];
        let last_step = predictions[59] - predictions[58];
        assert!(
            last_step.abs() < first_step.abs() + 1e-9,
            "expected damped increments: first {first_step}, last {last_step}"
        );
    }

    #[test]
    fn estimated_parameters_stay_within_bounds() {
        let values = seasonal_values(36, 500.0, 2.0, 50.0);

        let model = DampedHoltWinters::fit(&values, 12).expect("could not fit model");
        let (alpha, beta, gamma, phi) = model.params();

        for param in [alpha, beta, gamma] {
            assert!((1e-4..=0.9999).contains(&param));
        }
        assert!((0.1..=0.98).contains(&phi));
        assert!(model.sse().is_finite());
    }
}

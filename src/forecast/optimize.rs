//! Nelder-Mead simplex minimization for the smoothing-parameter search.
//!
//! A small derivative-free optimizer is all the model fit needs: the
//! objective is an in-sample sum of squared errors over at most four bounded
//! parameters.

/// Settings for [nelder_mead].
#[derive(Debug, Clone, Copy)]
pub struct NelderMeadConfig {
    /// The maximum number of iterations before giving up on convergence.
    pub max_iterations: usize,
    /// Convergence threshold on the spread of objective values across the
    /// simplex.
    pub tolerance: f64,
    /// The offset added to the start point in each dimension to build the
    /// initial simplex.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-8,
            initial_step: 0.1,
        }
    }
}

/// The outcome of a [nelder_mead] search.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The best point found, clamped to the bounds.
    pub point: Vec<f64>,
    /// The objective value at [Self::point].
    pub value: f64,
    /// How many iterations were run.
    pub iterations: usize,
}

// Standard Nelder-Mead coefficients.
const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimizes `objective` starting from `start`, keeping every evaluated point
/// within `bounds` (one inclusive `(min, max)` pair per dimension).
pub fn nelder_mead<F>(
    objective: F,
    start: &[f64],
    bounds: &[(f64, f64)],
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    debug_assert_eq!(start.len(), bounds.len());

    let dimensions = start.len();
    let clamp = |point: &mut Vec<f64>| {
        for (value, (min, max)) in point.iter_mut().zip(bounds) {
            *value = value.clamp(*min, *max);
        }
    };

    // Initial simplex: the start point plus one offset vertex per dimension.
    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(dimensions + 1);
    let mut base = start.to_vec();
    clamp(&mut base);
    let base_value = objective(&base);
    simplex.push((base.clone(), base_value));

    for dimension in 0..dimensions {
        let mut vertex = base.clone();
        vertex[dimension] += config.initial_step;
        clamp(&mut vertex);
        let value = objective(&vertex);
        simplex.push((vertex, value));
    }

    let mut iterations = 0;

    while iterations < config.max_iterations {
        iterations += 1;

        simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let best_value = simplex[0].1;
        let worst_value = simplex[dimensions].1;
        if (worst_value - best_value).abs() < config.tolerance {
            break;
        }

        // Centroid of all vertices except the worst.
        let mut centroid = vec![0.0; dimensions];
        for (vertex, _) in &simplex[..dimensions] {
            for (total, component) in centroid.iter_mut().zip(vertex) {
                *total += component / dimensions as f64;
            }
        }

        let worst = simplex[dimensions].0.clone();

        let mut reflected: Vec<f64> = centroid
            .iter()
            .zip(&worst)
            .map(|(c, w)| c + REFLECTION * (c - w))
            .collect();
        clamp(&mut reflected);
        let reflected_value = objective(&reflected);

        if reflected_value < best_value {
            // Try expanding further in the same direction.
            let mut expanded: Vec<f64> = centroid
                .iter()
                .zip(&worst)
                .map(|(c, w)| c + EXPANSION * (c - w))
                .collect();
            clamp(&mut expanded);
            let expanded_value = objective(&expanded);

            simplex[dimensions] = if expanded_value < reflected_value {
                (expanded, expanded_value)
            } else {
                (reflected, reflected_value)
            };
            continue;
        }

        if reflected_value < simplex[dimensions - 1].1 {
            simplex[dimensions] = (reflected, reflected_value);
            continue;
        }

        let mut contracted: Vec<f64> = centroid
            .iter()
            .zip(&worst)
            .map(|(c, w)| c + CONTRACTION * (w - c))
            .collect();
        clamp(&mut contracted);
        let contracted_value = objective(&contracted);

        if contracted_value < simplex[dimensions].1 {
            simplex[dimensions] = (contracted, contracted_value);
            continue;
        }

        // Shrink every vertex towards the best one.
        let best = simplex[0].0.clone();
        for (vertex, value) in simplex.iter_mut().skip(1) {
            for (component, best_component) in vertex.iter_mut().zip(&best) {
                *component = best_component + SHRINK * (*component - best_component);
            }
            clamp(vertex);
            *value = objective(vertex);
        }
    }

    simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    let (point, value) = simplex.swap_remove(0);

    NelderMeadResult {
        point,
        value,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{NelderMeadConfig, nelder_mead};

    #[test]
    fn finds_the_minimum_of_a_quadratic() {
        let result = nelder_mead(
            |point| (point[0] - 3.0).powi(2) + (point[1] + 1.0).powi(2),
            &[0.0, 0.0],
            &[(-10.0, 10.0), (-10.0, 10.0)],
            NelderMeadConfig::default(),
        );

        assert_relative_eq!(result.point[0], 3.0, epsilon = 1e-3);
        assert_relative_eq!(result.point[1], -1.0, epsilon = 1e-3);
        assert!(result.value < 1e-6);
    }

    #[test]
    fn respects_bounds() {
        // Unconstrained minimum at 5.0, but the search space stops at 1.0.
        let result = nelder_mead(
            |point| (point[0] - 5.0).powi(2),
            &[0.5],
            &[(0.0, 1.0)],
            NelderMeadConfig::default(),
        );

        assert!(result.point[0] <= 1.0);
        assert_relative_eq!(result.point[0], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn stops_at_the_iteration_limit() {
        let config = NelderMeadConfig {
            max_iterations: 5,
            ..Default::default()
        };

        let result = nelder_mead(
            |point| point.iter().map(|x| x * x).sum(),
            &[4.0, 4.0, 4.0],
            &[(-10.0, 10.0); 3],
            config,
        );

        assert!(result.iterations <= 5);
    }
}

//! Maximum a posteriori fit via the Nelder-Mead simplex.

use itc_core::errors::ItcError;
use tracing::warn;

use crate::model::{log_posterior, BindingModel};

/// Options controlling the simplex search.
#[derive(Debug, Clone, Copy)]
pub struct MapOptions {
    /// Maximum number of simplex iterations.
    pub max_iterations: usize,
    /// Convergence threshold on the spread of log-posterior values across the
    /// simplex.
    pub tolerance: f64,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            max_iterations: 5_000,
            tolerance: 1e-8,
        }
    }
}

/// Result of a MAP fit.
///
/// Non-convergence is not an error: `converged` is `false` and the best point
/// found is still usable as a sampler start.
#[derive(Debug, Clone)]
pub struct MapFit {
    /// Best parameter values found, in model parameter order.
    pub values: Vec<f64>,
    /// Log posterior at `values`.
    pub log_posterior: f64,
    /// Simplex iterations executed.
    pub iterations: usize,
    /// Whether the simplex contracted below the tolerance.
    pub converged: bool,
}

// Standard Nelder-Mead coefficients.
const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Maximizes the log posterior starting from the model's initial values.
pub fn map_fit(model: &dyn BindingModel, options: &MapOptions) -> Result<MapFit, ItcError> {
    let dim = model.parameters().len();
    // Minimize the negative log posterior.
    let objective = |x: &[f64]| -> Result<f64, ItcError> {
        Ok(-log_posterior(model, x)?)
    };

    let x0: Vec<f64> = model.parameters().iter().map(|p| p.initial).collect();
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(dim + 1);
    simplex.push(x0.clone());
    for (i, parameter) in model.parameters().iter().enumerate() {
        let mut vertex = x0.clone();
        vertex[i] += parameter.prior.characteristic_scale(parameter.initial);
        simplex.push(vertex);
    }
    let mut scores: Vec<f64> = Vec::with_capacity(dim + 1);
    for vertex in &simplex {
        scores.push(objective(vertex)?);
    }

    let mut iterations = 0;
    let mut converged = false;
    while iterations < options.max_iterations {
        iterations += 1;

        // Order vertices best to worst.
        let mut order: Vec<usize> = (0..=dim).collect();
        order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
        let best = order[0];
        let worst = order[dim];
        let second_worst = order[dim - 1];

        if scores[worst].is_finite()
            && (scores[worst] - scores[best]).abs() < options.tolerance
        {
            converged = true;
            break;
        }

        let mut centroid = vec![0.0f64; dim];
        for &index in &order[..dim] {
            for (c, v) in centroid.iter_mut().zip(&simplex[index]) {
                *c += v / dim as f64;
            }
        }

        let blend = |from: &[f64], coefficient: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(from)
                .map(|(c, x)| c + coefficient * (c - x))
                .collect()
        };

        let reflected = blend(&simplex[worst], REFLECT);
        let reflected_score = objective(&reflected)?;
        if reflected_score < scores[best] {
            let expanded = blend(&simplex[worst], EXPAND);
            let expanded_score = objective(&expanded)?;
            if expanded_score < reflected_score {
                simplex[worst] = expanded;
                scores[worst] = expanded_score;
            } else {
                simplex[worst] = reflected;
                scores[worst] = reflected_score;
            }
        } else if reflected_score < scores[second_worst] {
            simplex[worst] = reflected;
            scores[worst] = reflected_score;
        } else {
            let contracted = blend(&simplex[worst], -CONTRACT);
            let contracted_score = objective(&contracted)?;
            if contracted_score < scores[worst] {
                simplex[worst] = contracted;
                scores[worst] = contracted_score;
            } else {
                // Shrink everything toward the best vertex.
                let anchor = simplex[best].clone();
                for index in 0..=dim {
                    if index == best {
                        continue;
                    }
                    for (v, a) in simplex[index].iter_mut().zip(&anchor) {
                        *v = a + SHRINK * (*v - a);
                    }
                    scores[index] = objective(&simplex[index])?;
                }
            }
        }
    }

    let best = (0..=dim)
        .min_by(|&a, &b| scores[a].total_cmp(&scores[b]))
        .unwrap_or(0);
    if !converged {
        warn!(
            model = model.name(),
            iterations, "MAP fit stopped before converging"
        );
    }
    Ok(MapFit {
        values: simplex[best].clone(),
        log_posterior: -scores[best],
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priors::{Parameter, Prior};

    /// Quadratic bowl disguised as a model: posterior peaks at (1, -2).
    struct Bowl {
        parameters: Vec<Parameter>,
        heats: Vec<f64>,
        durations: Vec<f64>,
    }

    impl Bowl {
        fn new() -> Self {
            Self {
                parameters: vec![
                    Parameter::new(
                        "x",
                        Prior::Uniform {
                            lower: -10.0,
                            upper: 10.0,
                        },
                        4.0,
                    ),
                    Parameter::new(
                        "y",
                        Prior::Uniform {
                            lower: -10.0,
                            upper: 10.0,
                        },
                        4.0,
                    ),
                    // Noise parameter pinned near zero so sigma stays 1.
                    Parameter::new(
                        "log_sigma",
                        Prior::Uniform {
                            lower: -1e-9,
                            upper: 1e-9,
                        },
                        0.0,
                    ),
                ],
                heats: vec![0.0],
                durations: vec![1.0],
            }
        }
    }

    impl BindingModel for Bowl {
        fn name(&self) -> &str {
            "bowl"
        }
        fn parameters(&self) -> &[Parameter] {
            &self.parameters
        }
        fn observed_heats(&self) -> &[f64] {
            &self.heats
        }
        fn durations(&self) -> &[f64] {
            &self.durations
        }
        fn expected_heats(&self, values: &[f64]) -> Result<Vec<f64>, ItcError> {
            let dx = values[0] - 1.0;
            let dy = values[1] + 2.0;
            Ok(vec![(dx * dx + dy * dy).sqrt()])
        }
    }

    #[test]
    fn simplex_finds_the_bowl_minimum() {
        let bowl = Bowl::new();
        let fit = map_fit(&bowl, &MapOptions::default()).unwrap();
        assert!(fit.converged);
        assert!((fit.values[0] - 1.0).abs() < 1e-2, "{:?}", fit.values);
        assert!((fit.values[1] + 2.0).abs() < 1e-2, "{:?}", fit.values);
    }

    #[test]
    fn iteration_budget_is_honored() {
        let bowl = Bowl::new();
        let fit = map_fit(
            &bowl,
            &MapOptions {
                max_iterations: 3,
                tolerance: 0.0,
            },
        )
        .unwrap();
        assert_eq!(fit.iterations, 3);
        assert!(!fit.converged);
    }
}

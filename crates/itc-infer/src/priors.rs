//! Prior distributions and named model parameters.

use serde::{Deserialize, Serialize};

/// Prior distribution over a scalar parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Prior {
    /// Flat density on `[lower, upper]`, zero outside.
    Uniform {
        /// Inclusive lower bound.
        lower: f64,
        /// Inclusive upper bound.
        upper: f64,
    },
    /// Log-normal density over positive reals.
    LogNormal {
        /// Mean of `ln x`.
        ln_mean: f64,
        /// Standard deviation of `ln x`.
        ln_sd: f64,
    },
}

const LN_2PI: f64 = 1.837_877_066_409_345_5;

impl Prior {
    /// Log density at `x`; `-inf` outside the support.
    pub fn log_density(&self, x: f64) -> f64 {
        match *self {
            Prior::Uniform { lower, upper } => {
                if x < lower || x > upper {
                    f64::NEG_INFINITY
                } else {
                    -(upper - lower).ln()
                }
            }
            Prior::LogNormal { ln_mean, ln_sd } => {
                if x <= 0.0 {
                    return f64::NEG_INFINITY;
                }
                let z = (x.ln() - ln_mean) / ln_sd;
                -0.5 * LN_2PI - ln_sd.ln() - x.ln() - 0.5 * z * z
            }
        }
    }

    /// Characteristic length used to seed random-walk proposal scales and the
    /// MAP initial simplex.
    pub fn characteristic_scale(&self, value: f64) -> f64 {
        match *self {
            Prior::Uniform { lower, upper } => (upper - lower) / 20.0,
            Prior::LogNormal { ln_sd, .. } => (value.abs() * ln_sd).max(f64::MIN_POSITIVE),
        }
    }
}

/// A named model parameter: prior plus current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Stable name used to key traces and reports
    /// (`DeltaG`, `DeltaH`, `DeltaH_0`, `P0`, `Ls`, `log_sigma`, ...).
    pub name: String,
    /// Prior distribution.
    pub prior: Prior,
    /// Initial value used to start MAP and sampling.
    pub initial: f64,
}

impl Parameter {
    /// Creates a parameter.
    pub fn new(name: impl Into<String>, prior: Prior, initial: f64) -> Self {
        Self {
            name: name.into(),
            prior,
            initial,
        }
    }
}

//! Binding models and the shared log-posterior.

use itc_core::errors::{ErrorInfo, ItcError};
use itc_core::units;

use crate::experiment::Titration;
use crate::priors::{Parameter, Prior};

/// Gas constant in kcal/(mol K).
pub const GAS_CONSTANT_KCAL: f64 = 1.987_204_118e-3;

const LN_2PI: f64 = 1.837_877_066_409_345_5;

/// A thermodynamic binding model: named parameters with priors plus the
/// expected-heat function the likelihood is built on.
///
/// Parameter order is fixed at construction and shared by the MAP fit, the
/// sampler, and the traces. The last parameter is always `log_sigma`.
pub trait BindingModel {
    /// Model name used in reports.
    fn name(&self) -> &str;
    /// Parameters in trace order.
    fn parameters(&self) -> &[Parameter];
    /// Observed injection heats in microcalories, chronological.
    fn observed_heats(&self) -> &[f64];
    /// Per-injection durations in seconds.
    fn durations(&self) -> &[f64];
    /// Expected heat per injection in microcalories at the given parameter
    /// values. Errors here are fatal for the titration, not rejections.
    fn expected_heats(&self, values: &[f64]) -> Result<Vec<f64>, ItcError>;
    /// Additional log-prior terms coupling several parameters (for example a
    /// simplex constraint). `-inf` rejects the state without evaluating the
    /// isotherm.
    fn log_prior_extra(&self, _values: &[f64]) -> f64 {
        0.0
    }

    /// Index of the `log_sigma` parameter.
    fn log_sigma_index(&self) -> usize {
        self.parameters().len() - 1
    }
}

/// Unnormalized log posterior density at `values`.
///
/// Prior violations short-circuit to `-inf` (the sampler rejects the
/// proposal); a failed isotherm evaluation inside the prior support is
/// propagated as an error.
pub fn log_posterior(model: &dyn BindingModel, values: &[f64]) -> Result<f64, ItcError> {
    let mut lp = model.log_prior_extra(values);
    if lp == f64::NEG_INFINITY {
        return Ok(f64::NEG_INFINITY);
    }
    for (parameter, &value) in model.parameters().iter().zip(values) {
        lp += parameter.prior.log_density(value);
        if lp == f64::NEG_INFINITY {
            return Ok(f64::NEG_INFINITY);
        }
    }

    let expected = model.expected_heats(values)?;
    let sigma_base = values[model.log_sigma_index()].exp();
    let observed = model.observed_heats();
    let durations = model.durations();
    for n in 0..observed.len() {
        // Noise grows with the square root of the integration window.
        let sigma = sigma_base * durations[n].sqrt();
        let z = (observed[n] - expected[n]) / sigma;
        lp += -0.5 * LN_2PI - sigma.ln() - 0.5 * z * z;
    }
    Ok(lp)
}

/// 1:1 binding model with heteroscedastic Gaussian noise.
///
/// Parameters, in trace order: `DeltaG` and `DeltaH` (kcal/mol), `DeltaH_0`
/// (ucal per injection), `P0` and `Ls` (molar), `log_sigma` (log of the noise
/// scale in ucal/s^1/2).
#[derive(Debug, Clone)]
pub struct SingleSiteModel {
    name: String,
    parameters: Vec<Parameter>,
    injection_volumes_l: Vec<f64>,
    observed_heats: Vec<f64>,
    durations_s: Vec<f64>,
    cell_volume_l: f64,
    beta: f64,
}

impl SingleSiteModel {
    /// Builds the model from a titration with stated concentrations.
    pub fn new(titration: &Titration) -> Result<Self, ItcError> {
        let stated = |quantity: Option<itc_core::units::Quantity>,
                      role: &str|
         -> Result<f64, ItcError> {
            let molar = quantity
                .map(|q| q.value_in(units::MOLAR))
                .transpose()?
                .unwrap_or(0.0);
            if molar <= 0.0 {
                return Err(ItcError::Model(
                    ErrorInfo::new(
                        "missing-concentration",
                        "a positive stated concentration is required to build the model",
                    )
                    .with_context("experiment", titration.name.clone())
                    .with_context("role", role.to_string()),
                ));
            }
            Ok(molar)
        };
        let p0_stated = stated(titration.cell_concentration, "cell")?;
        let ls_stated = stated(titration.syringe_concentration, "syringe")?;

        let injection_volumes_l = titration.injection_volumes_l()?;
        let observed_heats = titration.heats_ucal()?;
        let durations_s = titration.durations_s()?;
        let cell_volume_l = titration.cell_volume.value_in(units::LITER)?;
        let beta = 1.0 / (GAS_CONSTANT_KCAL * titration.temperature_k);

        let q_span = observed_heats
            .iter()
            .fold(0.0f64, |acc, q| acc.max(q.abs()))
            .max(1e-3);
        let mean_duration =
            durations_s.iter().sum::<f64>() / durations_s.len() as f64;
        let sigma_guess = q_span / (10.0 * mean_duration.sqrt());
        let dh0_guess = *observed_heats.last().unwrap_or(&0.0);

        let parameters = vec![
            Parameter::new(
                "DeltaG",
                Prior::Uniform {
                    lower: -40.0,
                    upper: 40.0,
                },
                -9.0,
            ),
            Parameter::new(
                "DeltaH",
                Prior::Uniform {
                    lower: -100.0,
                    upper: 100.0,
                },
                -5.0,
            ),
            Parameter::new(
                "DeltaH_0",
                Prior::Uniform {
                    lower: -q_span,
                    upper: q_span,
                },
                dh0_guess.clamp(-q_span, q_span),
            ),
            Parameter::new(
                "P0",
                Prior::LogNormal {
                    ln_mean: p0_stated.ln(),
                    ln_sd: 0.1,
                },
                p0_stated,
            ),
            Parameter::new(
                "Ls",
                Prior::LogNormal {
                    ln_mean: ls_stated.ln(),
                    ln_sd: 0.1,
                },
                ls_stated,
            ),
            Parameter::new(
                "log_sigma",
                Prior::Uniform {
                    lower: sigma_guess.ln() - 7.0,
                    upper: sigma_guess.ln() + 7.0,
                },
                sigma_guess.ln(),
            ),
        ];

        Ok(Self {
            name: format!("single-site:{}", titration.name),
            parameters,
            injection_volumes_l,
            observed_heats,
            durations_s,
            cell_volume_l,
            beta,
        })
    }
}

impl BindingModel for SingleSiteModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    fn observed_heats(&self) -> &[f64] {
        &self.observed_heats
    }

    fn durations(&self) -> &[f64] {
        &self.durations_s
    }

    fn expected_heats(&self, values: &[f64]) -> Result<Vec<f64>, ItcError> {
        let [delta_g, delta_h, delta_h0, p0, ls] = [
            values[0], values[1], values[2], values[3], values[4],
        ];
        let invalid = |message: &str| {
            ItcError::Isotherm(
                ErrorInfo::new("invalid-isotherm-state", message)
                    .with_context("model", self.name.clone())
                    .with_context("DeltaG", delta_g.to_string())
                    .with_context("P0", p0.to_string())
                    .with_context("Ls", ls.to_string()),
            )
        };
        if !values.iter().all(|v| v.is_finite()) {
            return Err(invalid("non-finite parameter value"));
        }
        if p0 <= 0.0 || ls <= 0.0 {
            return Err(invalid("concentrations must be positive"));
        }
        let kd = (self.beta * delta_g).exp();
        if !kd.is_finite() || kd <= 0.0 {
            return Err(invalid("dissociation constant overflowed"));
        }

        let v0 = self.cell_volume_l;
        let mut heats = Vec::with_capacity(self.injection_volumes_l.len());
        let mut dcum = 1.0f64;
        let mut pl_prev = 0.0f64;
        for &dv in &self.injection_volumes_l {
            // Perfusion model: each injection displaces dv of the cell volume.
            let dn = 1.0 - dv / v0;
            dcum *= dn;
            let p = p0 * dcum;
            let l = ls * (1.0 - dcum);
            let sum = p + l + kd;
            let discriminant = sum * sum - 4.0 * p * l;
            if discriminant < 0.0 {
                return Err(invalid("negative discriminant in complex concentration"));
            }
            let pl = 0.5 * (sum - discriminant.sqrt());
            // kcal of binding enthalpy, converted to ucal.
            heats.push(1e9 * v0 * delta_h * (pl - dn * pl_prev) + delta_h0);
            pl_prev = pl;
        }
        Ok(heats)
    }
}

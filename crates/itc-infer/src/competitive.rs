//! Competitive binding of several ligands to one host site.

use itc_core::errors::{ErrorInfo, ItcError};
use itc_core::units;

use crate::experiment::Titration;
use crate::model::{BindingModel, GAS_CONSTANT_KCAL};
use crate::priors::{Parameter, Prior};

/// A ligand species competing for the host site.
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitiveSpecies {
    /// Species name, used to suffix its parameters.
    pub name: String,
    /// Initial guess for its binding free energy in kcal/mol.
    pub delta_g_guess: f64,
    /// Initial guess for its binding enthalpy in kcal/mol.
    pub delta_h_guess: f64,
}

/// Competitive binding model: one host, `k` ligand species sharing the
/// syringe, each with its own `DeltaG`/`DeltaH`.
///
/// The syringe composition is parameterized with `k - 1` free fractions; the
/// last species takes the remainder. States whose fractions leave the simplex
/// are rejected through the prior, never through an isotherm error.
#[derive(Debug, Clone)]
pub struct CompetitiveModel {
    name: String,
    species_count: usize,
    parameters: Vec<Parameter>,
    injection_volumes_l: Vec<f64>,
    observed_heats: Vec<f64>,
    durations_s: Vec<f64>,
    cell_volume_l: f64,
    beta: f64,
}

/// Parameter layout offsets within the flat value vector.
struct Layout {
    species_count: usize,
}

impl Layout {
    fn delta_g(&self, i: usize) -> usize {
        2 * i
    }
    fn delta_h(&self, i: usize) -> usize {
        2 * i + 1
    }
    fn delta_h0(&self) -> usize {
        2 * self.species_count
    }
    fn p0(&self) -> usize {
        2 * self.species_count + 1
    }
    fn ls(&self) -> usize {
        2 * self.species_count + 2
    }
    fn fraction(&self, i: usize) -> usize {
        2 * self.species_count + 3 + i
    }
}

impl CompetitiveModel {
    /// Builds the model; requires at least two species and stated
    /// concentrations on the titration.
    pub fn new(titration: &Titration, species: &[CompetitiveSpecies]) -> Result<Self, ItcError> {
        if species.len() < 2 {
            return Err(ItcError::Model(
                ErrorInfo::new(
                    "too-few-species",
                    "a competitive model needs at least two ligand species",
                )
                .with_context("experiment", titration.name.clone())
                .with_context("species", species.len().to_string()),
            ));
        }
        let molar = |quantity: Option<itc_core::units::Quantity>,
                     role: &str|
         -> Result<f64, ItcError> {
            let value = quantity
                .map(|q| q.value_in(units::MOLAR))
                .transpose()?
                .unwrap_or(0.0);
            if value <= 0.0 {
                return Err(ItcError::Model(
                    ErrorInfo::new(
                        "missing-concentration",
                        "a positive stated concentration is required to build the model",
                    )
                    .with_context("experiment", titration.name.clone())
                    .with_context("role", role.to_string()),
                ));
            }
            Ok(value)
        };
        let p0_stated = molar(titration.cell_concentration, "cell")?;
        let ls_stated = molar(titration.syringe_concentration, "syringe")?;

        let observed_heats = titration.heats_ucal()?;
        let q_span = observed_heats
            .iter()
            .fold(0.0f64, |acc, q| acc.max(q.abs()))
            .max(1e-3);
        let durations_s = titration.durations_s()?;
        let mean_duration =
            durations_s.iter().sum::<f64>() / durations_s.len() as f64;
        let sigma_guess = q_span / (10.0 * mean_duration.sqrt());

        let mut parameters = Vec::new();
        for item in species {
            parameters.push(Parameter::new(
                format!("DeltaG_{}", item.name),
                Prior::Uniform {
                    lower: -40.0,
                    upper: 40.0,
                },
                item.delta_g_guess,
            ));
            parameters.push(Parameter::new(
                format!("DeltaH_{}", item.name),
                Prior::Uniform {
                    lower: -100.0,
                    upper: 100.0,
                },
                item.delta_h_guess,
            ));
        }
        parameters.push(Parameter::new(
            "DeltaH_0",
            Prior::Uniform {
                lower: -q_span,
                upper: q_span,
            },
            0.0,
        ));
        parameters.push(Parameter::new(
            "P0",
            Prior::LogNormal {
                ln_mean: p0_stated.ln(),
                ln_sd: 0.1,
            },
            p0_stated,
        ));
        parameters.push(Parameter::new(
            "Ls",
            Prior::LogNormal {
                ln_mean: ls_stated.ln(),
                ln_sd: 0.1,
            },
            ls_stated,
        ));
        let equal_share = 1.0 / species.len() as f64;
        for item in &species[..species.len() - 1] {
            parameters.push(Parameter::new(
                format!("Fraction_{}", item.name),
                Prior::Uniform {
                    lower: 0.0,
                    upper: 1.0,
                },
                equal_share,
            ));
        }
        parameters.push(Parameter::new(
            "log_sigma",
            Prior::Uniform {
                lower: sigma_guess.ln() - 7.0,
                upper: sigma_guess.ln() + 7.0,
            },
            sigma_guess.ln(),
        ));

        Ok(Self {
            name: format!("competitive:{}", titration.name),
            species_count: species.len(),
            parameters,
            injection_volumes_l: titration.injection_volumes_l()?,
            observed_heats,
            durations_s,
            cell_volume_l: titration.cell_volume.value_in(units::LITER)?,
            beta: 1.0 / (GAS_CONSTANT_KCAL * titration.temperature_k),
        })
    }

    fn layout(&self) -> Layout {
        Layout {
            species_count: self.species_count,
        }
    }

    fn fractions(&self, values: &[f64]) -> Vec<f64> {
        let layout = self.layout();
        let mut fractions = Vec::with_capacity(self.species_count);
        let mut remainder = 1.0;
        for i in 0..self.species_count - 1 {
            let f = values[layout.fraction(i)];
            fractions.push(f);
            remainder -= f;
        }
        fractions.push(remainder);
        fractions
    }
}

/// Solves the host mass balance `h + sum_i h L_i / (Kd_i + h) = h_total` for
/// the free host concentration by bisection. The left side is strictly
/// increasing in `h`, so the root in `[0, h_total]` is unique.
fn free_host(h_total: f64, ligands: &[(f64, f64)]) -> f64 {
    let balance = |h: f64| -> f64 {
        let mut bound = 0.0;
        for &(l_total, kd) in ligands {
            bound += h * l_total / (kd + h);
        }
        h + bound - h_total
    };
    let mut lo = 0.0f64;
    let mut hi = h_total;
    for _ in 0..100 {
        let mid = 0.5 * (lo + hi);
        if balance(mid) > 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    0.5 * (lo + hi)
}

impl BindingModel for CompetitiveModel {
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

    fn log_prior_extra(&self, values: &[f64]) -> f64 {
        // The implicit last fraction must stay positive.
        let layout = self.layout();
        let mut sum = 0.0;
        for i in 0..self.species_count - 1 {
            sum += values[layout.fraction(i)];
        }
        if sum >= 1.0 {
            f64::NEG_INFINITY
        } else {
            0.0
        }
    }

    fn expected_heats(&self, values: &[f64]) -> Result<Vec<f64>, ItcError> {
        let layout = self.layout();
        let invalid = |message: &str| {
            ItcError::Isotherm(
                ErrorInfo::new("invalid-isotherm-state", message)
                    .with_context("model", self.name.clone()),
            )
        };
        if !values.iter().all(|v| v.is_finite()) {
            return Err(invalid("non-finite parameter value"));
        }
        let p0 = values[layout.p0()];
        let ls = values[layout.ls()];
        if p0 <= 0.0 || ls <= 0.0 {
            return Err(invalid("concentrations must be positive"));
        }
        let fractions = self.fractions(values);
        let mut kds = Vec::with_capacity(self.species_count);
        for i in 0..self.species_count {
            let kd = (self.beta * values[layout.delta_g(i)]).exp();
            if !kd.is_finite() || kd <= 0.0 {
                return Err(invalid("dissociation constant overflowed"));
            }
            kds.push(kd);
        }

        let v0 = self.cell_volume_l;
        let delta_h0 = values[layout.delta_h0()];
        let mut heats = Vec::with_capacity(self.injection_volumes_l.len());
        let mut dcum = 1.0f64;
        let mut bound_prev = vec![0.0f64; self.species_count];
        for &dv in &self.injection_volumes_l {
            let dn = 1.0 - dv / v0;
            dcum *= dn;
            let h_total = p0 * dcum;
            let ligands: Vec<(f64, f64)> = (0..self.species_count)
                .map(|i| (fractions[i] * ls * (1.0 - dcum), kds[i]))
                .collect();
            let h_free = free_host(h_total, &ligands);

            let mut q = delta_h0;
            for i in 0..self.species_count {
                let (l_total, kd) = ligands[i];
                let bound = h_free * l_total / (kd + h_free);
                q += 1e9
                    * v0
                    * values[layout.delta_h(i)]
                    * (bound - dn * bound_prev[i]);
                bound_prev[i] = bound;
            }
            heats.push(q);
        }
        Ok(heats)
    }
}

//! Titration experiments and the heuristic concentration solver.

use itc_core::errors::{ErrorInfo, ItcError};
use itc_core::units::{self, Quantity};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PlannerConfig;
use crate::labware::{Labware, PipettingLocation};
use crate::materials::SimpleSolution;
use crate::protocol::ItcProtocol;

/// Source feeding the syringe or the sample cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TitrationSource {
    /// A solvent trough; carries no defined solute concentration.
    Trough(Labware),
    /// A prepared stock solution.
    Solution(SimpleSolution),
}

impl TitrationSource {
    /// Display name of the source.
    pub fn name(&self) -> &str {
        match self {
            TitrationSource::Trough(labware) => &labware.label,
            TitrationSource::Solution(solution) => &solution.compound.name,
        }
    }

    /// Stock concentration limit, if the source is a prepared solution.
    pub fn stock_concentration(&self) -> Result<Option<Quantity>, ItcError> {
        match self {
            TitrationSource::Trough(_) => Ok(None),
            TitrationSource::Solution(solution) => solution.concentration().map(Some),
        }
    }

    /// Pipetting location, if the source is a prepared solution.
    pub fn location(&self) -> Option<&PipettingLocation> {
        match self {
            TitrationSource::Trough(_) => None,
            TitrationSource::Solution(solution) => Some(&solution.location),
        }
    }
}

/// A single planned titration.
///
/// Concentrations start undefined and are populated exactly once by the
/// heuristic solver (or defaulted to zero for control titrations during
/// validation) before any worklist writer runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItcExperiment {
    /// Experiment name; used to identify the experiment in every diagnostic.
    pub name: String,
    /// Source loaded into the syringe.
    pub syringe_source: TitrationSource,
    /// Source loaded into the sample cell.
    pub cell_source: TitrationSource,
    /// Buffer trough used for dilution transfers, when applicable.
    pub buffer_source: Option<Labware>,
    /// Protocol run on the instrument.
    pub protocol: ItcProtocol,
    pub(crate) syringe_concentration: Option<Quantity>,
    pub(crate) cell_concentration: Option<Quantity>,
}

impl ItcExperiment {
    /// Creates an experiment with undefined concentrations.
    pub fn new(
        name: impl Into<String>,
        syringe_source: TitrationSource,
        cell_source: TitrationSource,
        protocol: ItcProtocol,
    ) -> Self {
        Self {
            name: name.into(),
            syringe_source,
            cell_source,
            buffer_source: None,
            protocol,
            syringe_concentration: None,
            cell_concentration: None,
        }
    }

    /// Syringe concentration, if populated.
    pub fn syringe_concentration(&self) -> Option<Quantity> {
        self.syringe_concentration
    }

    /// Cell concentration, if populated.
    pub fn cell_concentration(&self) -> Option<Quantity> {
        self.cell_concentration
    }

    /// Fills undefined concentrations with explicit zero-molar values.
    ///
    /// Control titrations (water into water, buffer into buffer) carry no
    /// solute; writers must still see populated fields.
    pub fn default_concentrations_to_zero(&mut self) {
        self.syringe_concentration
            .get_or_insert(Quantity::zero(units::MOLAR));
        self.cell_concentration
            .get_or_insert(Quantity::zero(units::MOLAR));
    }
}

/// A titration whose concentrations are solved from a target binding constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicExperiment {
    /// Underlying experiment record.
    pub base: ItcExperiment,
    target_ka: Quantity,
    injection_count: u32,
    injection_volume: Quantity,
    cell_volume: Quantity,
    requested_cell_concentration: Quantity,
    baseline_syringe: Option<Quantity>,
    baseline_cell: Quantity,
    c_value: Option<f64>,
    rescale_factor: Option<f64>,
}

impl HeuristicExperiment {
    /// Creates a heuristic experiment.
    ///
    /// `target_ka` is the association constant (L/mol) the solver designs
    /// for; `requested_cell_concentration` is the concentration the operator
    /// would prefer to load into the cell, treated as an upper bound by the
    /// solver. Geometry inputs are validated here so the solver itself only
    /// deals in feasibility.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        base: ItcExperiment,
        requested_cell_concentration: Quantity,
        target_ka: Quantity,
        injection_count: u32,
        injection_volume: Quantity,
        cell_volume: Quantity,
    ) -> Result<Self, ItcError> {
        let name = base.name.clone();
        let invalid = |code: &str, message: &str| {
            ItcError::Plan(ErrorInfo::new(code, message).with_context("experiment", name.clone()))
        };
        if target_ka.ln_value_in(units::LITER_PER_MOLE).is_err() {
            return Err(invalid(
                "invalid-ka",
                "target binding constant must be positive with dimension L/mol",
            ));
        }
        if injection_count < 1 {
            return Err(invalid("invalid-injections", "at least one injection required"));
        }
        if injection_volume.value_in(units::LITER)? <= 0.0 {
            return Err(invalid(
                "invalid-injection-volume",
                "injection volume must be positive",
            ));
        }
        if cell_volume.value_in(units::LITER)? <= 0.0 {
            return Err(invalid("invalid-cell-volume", "cell volume must be positive"));
        }
        if requested_cell_concentration.value_in(units::MOLAR)? <= 0.0 {
            return Err(invalid(
                "invalid-cell-concentration",
                "requested cell concentration must be positive",
            ));
        }
        Ok(Self {
            base,
            target_ka,
            injection_count,
            injection_volume,
            cell_volume,
            requested_cell_concentration,
            baseline_syringe: None,
            baseline_cell: requested_cell_concentration,
            c_value: None,
            rescale_factor: None,
        })
    }

    /// Target association constant.
    pub fn target_ka(&self) -> Quantity {
        self.target_ka
    }

    /// Wiseman c-parameter achieved by the last solve/rescale, if any.
    pub fn c_value(&self) -> Option<f64> {
        self.c_value
    }

    /// Rescale factor applied by the last [`rescale`](Self::rescale) call.
    pub fn rescale_factor(&self) -> Option<f64> {
        self.rescale_factor
    }

    /// Solves for a syringe concentration producing a resolvable titration.
    ///
    /// The Wiseman parameter `c = Ka * [cell]` is steered into
    /// `[cfg.c_low, cfg.c_high]` by lowering the requested cell concentration
    /// when c is too large, or raising it toward the cell stock limit when c
    /// is too small. The syringe concentration then follows the titration
    /// heuristic `Rm = 6.4 / c^0.2 + 13 / c`,
    /// `[syringe] = Rm * [cell] * V0 / (v * m)`.
    ///
    /// All arithmetic runs in log space: Ka spans many orders of magnitude in
    /// this dataset and `c^0.2`/`1/c` must not underflow.
    ///
    /// When the window cannot be reached, the closest boundary concentrations
    /// are still populated and a `Plan` error reports the infeasibility; the
    /// caller decides whether to flag or exclude the experiment.
    ///
    /// The computation reads only construction-time inputs, so repeated calls
    /// with unchanged inputs are idempotent.
    pub fn heuristic_syringe(&mut self, cfg: &PlannerConfig) -> Result<f64, ItcError> {
        let ln_ka = self.target_ka.ln_value_in(units::LITER_PER_MOLE)?;
        let ln_cell_requested = self
            .requested_cell_concentration
            .ln_value_in(units::MOLAR)?;
        let ln_c_raw = ln_ka + ln_cell_requested;
        let (ln_low, ln_high) = (cfg.c_low.ln(), cfg.c_high.ln());

        let mut infeasible = None;
        let (ln_c, ln_cell) = if ln_c_raw > ln_high {
            // Dilute the cell load until c sits at the top of the window.
            (ln_high, ln_high - ln_ka)
        } else if ln_c_raw < ln_low {
            // Weak binder: the cell load must be raised, capped by the stock.
            let stock_cap = match self.base.cell_source.stock_concentration()? {
                Some(stock) => Some(stock.ln_value_in(units::MOLAR)?),
                None => None,
            };
            match stock_cap {
                Some(ln_stock) if ln_ka + ln_stock >= ln_low => (ln_low, ln_low - ln_ka),
                Some(ln_stock) => {
                    infeasible = Some(ln_ka + ln_stock);
                    (ln_ka + ln_stock, ln_stock)
                }
                None => {
                    infeasible = Some(ln_c_raw);
                    (ln_c_raw, ln_cell_requested)
                }
            }
        } else {
            (ln_c_raw, ln_cell_requested)
        };

        let c = ln_c.exp();
        let rm = 6.4 * (-0.2 * ln_c).exp() + 13.0 * (-ln_c).exp();
        let cell = Quantity::new(ln_cell.exp(), units::MOLAR);
        let volume_ratio = self
            .cell_volume
            .ratio(&(self.injection_volume * f64::from(self.injection_count)))?;
        let syringe = cell * rm * volume_ratio;

        debug!(
            experiment = %self.base.name,
            c,
            rm,
            "heuristic syringe concentration solved"
        );

        self.baseline_cell = cell;
        self.baseline_syringe = Some(syringe);
        self.base.cell_concentration = Some(cell);
        self.base.syringe_concentration = Some(syringe);
        self.c_value = Some(c);

        if let Some(ln_best) = infeasible {
            return Err(ItcError::Plan(
                ErrorInfo::new(
                    "c-window",
                    "no achievable cell concentration places c inside the target window",
                )
                .with_context("experiment", self.base.name.clone())
                .with_context("c", format!("{:.6e}", ln_best.exp()))
                .with_context("window", format!("[{}, {}]", cfg.c_low, cfg.c_high))
                .with_hint("use a more concentrated cell stock or widen the window"),
            ));
        }
        Ok(c)
    }

    /// Rescales the solved concentrations to stay within stock limits.
    ///
    /// With `factor: None`, computes a fresh factor `min(1, stock/required)`
    /// over the syringe and cell stocks and applies it. With an explicit
    /// factor, applies it unchanged so a paired control experiment reproduces
    /// the titration symmetry of its partner.
    ///
    /// The factor is always applied to the solver's baseline concentrations,
    /// never to already-rescaled values, so reapplying a previously returned
    /// factor yields the same final concentrations.
    pub fn rescale(&mut self, factor: Option<f64>) -> Result<f64, ItcError> {
        let factor = match factor {
            Some(factor) => {
                if !(factor > 0.0 && factor <= 1.0) {
                    return Err(ItcError::Plan(
                        ErrorInfo::new("rescale-factor-range", "rescale factor must lie in (0, 1]")
                            .with_context("experiment", self.base.name.clone())
                            .with_context("factor", factor.to_string()),
                    ));
                }
                factor
            }
            None => {
                let mut factor = 1.0f64;
                if let Some(required) = self.baseline_syringe {
                    factor = factor.min(self.stock_headroom(
                        &required,
                        self.base.syringe_source.stock_concentration()?,
                        "syringe",
                    )?);
                }
                factor = factor.min(self.stock_headroom(
                    &self.baseline_cell,
                    self.base.cell_source.stock_concentration()?,
                    "cell",
                )?);
                factor
            }
        };

        self.base.syringe_concentration = match self.baseline_syringe {
            Some(baseline) => Some(baseline * factor),
            None => self.base.syringe_concentration,
        };
        let cell = self.baseline_cell * factor;
        self.base.cell_concentration = Some(cell);
        if let Ok(ln_cell) = cell.ln_value_in(units::MOLAR) {
            let ln_ka = self.target_ka.ln_value_in(units::LITER_PER_MOLE)?;
            self.c_value = Some((ln_ka + ln_cell).exp());
        }
        self.rescale_factor = Some(factor);
        debug!(experiment = %self.base.name, factor, "rescaled concentrations");
        Ok(factor)
    }

    fn stock_headroom(
        &self,
        required: &Quantity,
        stock: Option<Quantity>,
        side: &str,
    ) -> Result<f64, ItcError> {
        let Some(stock) = stock else {
            // Troughs impose no concentration limit.
            return Ok(1.0);
        };
        if !stock.is_positive() {
            if required.is_positive() {
                return Err(ItcError::Plan(
                    ErrorInfo::new(
                        "infeasible-stock",
                        "required concentration cannot be prepared from an empty stock",
                    )
                    .with_context("experiment", self.base.name.clone())
                    .with_context("side", side.to_string()),
                ));
            }
            return Ok(1.0);
        }
        let headroom = stock.ratio(required)?;
        Ok(headroom.min(1.0))
    }
}

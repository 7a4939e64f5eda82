//! Host-guest plan assembly.
//!
//! Builds the full titration schedule for a host-guest binding study from a
//! declarative [`PlanSpec`]: cleaning and control titrations, one heuristic
//! host-into-guest experiment per guest, and the paired buffer-into-guest
//! blank sharing the same rescale factor.

use itc_core::errors::ItcError;
use itc_core::units::{self, Quantity};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::PlannerConfig;
use crate::experiment::{HeuristicExperiment, ItcExperiment, TitrationSource};
use crate::labware::{DestinationPlate, Labware, PipettingLocation};
use crate::materials::{Compound, SimpleSolution, Solvent};
use crate::protocol::ItcProtocol;
use crate::set::{ExperimentSet, PlannedExperiment, ValidationReport};

/// Host compound and stock preparation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSpec {
    /// Compound name.
    pub name: String,
    /// Molar mass in g/mol.
    pub molar_mass_g_mol: f64,
    /// Purity fraction in (0, 1].
    pub purity: f64,
    /// Weighed compound mass in mg.
    pub compound_mass_mg: f64,
    /// Weighed solvent mass in g.
    pub solvent_mass_g: f64,
}

/// One guest compound, its stock preparation, and its expected affinity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestSpec {
    /// Compound name.
    pub name: String,
    /// Molar mass in g/mol.
    pub molar_mass_g_mol: f64,
    /// Purity fraction in (0, 1].
    pub purity: f64,
    /// Weighed compound mass in mg.
    pub compound_mass_mg: f64,
    /// Weighed solvent mass in g.
    pub solvent_mass_g: f64,
    /// Expected association constant in L/mol (measured or converted from a
    /// known free energy).
    pub ka_l_mol: f64,
}

/// Declarative description of a host-guest plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSpec {
    /// Plan name, used in file headers.
    pub name: String,
    /// Buffer density in g/mL.
    #[serde(default = "default_buffer_density")]
    pub buffer_density_g_ml: f64,
    /// Water density in g/mL.
    #[serde(default = "default_water_density")]
    pub water_density_g_ml: f64,
    /// Host stock.
    pub host: HostSpec,
    /// Guest stocks in titration order.
    pub guests: Vec<GuestSpec>,
    /// Requested cell concentration in mM (upper bound for the solver).
    #[serde(default = "default_cell_concentration")]
    pub cell_concentration_mm: f64,
    /// Number of injections per titration.
    #[serde(default = "default_injection_count")]
    pub injection_count: u32,
    /// Injection volume in uL.
    #[serde(default = "default_injection_volume")]
    pub injection_volume_ul: f64,
    /// Instrument cell volume in uL.
    #[serde(default = "default_cell_volume")]
    pub cell_volume_ul: f64,
    /// Number of trailing water-into-water control titrations.
    #[serde(default = "default_final_controls")]
    pub final_water_controls: u32,
}

fn default_buffer_density() -> f64 {
    1.014
}

fn default_water_density() -> f64 {
    0.997_047_9
}

fn default_cell_concentration() -> f64 {
    0.5
}

fn default_injection_count() -> u32 {
    10
}

fn default_injection_volume() -> f64 {
    3.0
}

fn default_cell_volume() -> f64 {
    202.8
}

fn default_final_controls() -> u32 {
    2
}

impl PlanSpec {
    /// Small two-guest plan used by tests and the demo config.
    pub fn example() -> Self {
        Self {
            name: "host-guest example".into(),
            buffer_density_g_ml: default_buffer_density(),
            water_density_g_ml: default_water_density(),
            host: HostSpec {
                name: "host".into(),
                molar_mass_g_mol: 1162.9632,
                purity: 0.7133,
                compound_mass_mg: 8.7,
                solvent_mass_g: 10.4732,
            },
            guests: vec![
                GuestSpec {
                    name: "guest01".into(),
                    molar_mass_g_mol: 209.12,
                    purity: 0.975,
                    compound_mass_mg: 2.210,
                    solvent_mass_g: 11.0478,
                    ka_l_mol: 2.102_428_764_08e7,
                },
                GuestSpec {
                    name: "guest04".into(),
                    molar_mass_g_mol: 189.13,
                    purity: 0.975,
                    compound_mass_mg: 1.945,
                    solvent_mass_g: 10.8034,
                    ka_l_mol: 1.788_684_707_09e6,
                },
            ],
            cell_concentration_mm: default_cell_concentration(),
            injection_count: default_injection_count(),
            injection_volume_ul: default_injection_volume(),
            cell_volume_ul: default_cell_volume(),
            final_water_controls: default_final_controls(),
        }
    }
}

/// Builds and validates the experiment set described by `spec`.
///
/// Infeasible heuristic experiments are flagged on the set and left in the
/// schedule; feasible ones carry solved, rescaled concentrations. The paired
/// buffer-into-guest blank always receives the exact factor returned by its
/// host-into-guest partner.
pub fn build_plan(
    spec: &PlanSpec,
    cfg: &PlannerConfig,
) -> Result<(ExperimentSet, ValidationReport), ItcError> {
    let buffer = Solvent::new(
        "buffer",
        Quantity::new(spec.buffer_density_g_ml, units::GRAM_PER_MILLILITER),
    )?;

    let water_trough = Labware::new("Water", "Trough 100ml");
    let buffer_trough = Labware::new("Buffer", "Trough 100ml");
    let source_plate = Labware::new("SourcePlate", "5x3 Vial Holder");

    let host_compound = Compound::new(
        spec.host.name.clone(),
        Quantity::new(spec.host.molar_mass_g_mol, units::GRAM_PER_MOLE),
        spec.host.purity,
    )?;
    let host_solution = SimpleSolution::new(
        host_compound,
        Quantity::new(spec.host.compound_mass_mg, units::MILLIGRAM),
        buffer.clone(),
        Quantity::new(spec.host.solvent_mass_g, units::GRAM),
        PipettingLocation::new(&source_plate.label, &source_plate.kind, 1),
    )?;

    let mut guest_solutions = Vec::with_capacity(spec.guests.len());
    for (index, guest) in spec.guests.iter().enumerate() {
        let compound = Compound::new(
            guest.name.clone(),
            Quantity::new(guest.molar_mass_g_mol, units::GRAM_PER_MOLE),
            guest.purity,
        )?;
        guest_solutions.push(SimpleSolution::new(
            compound,
            Quantity::new(guest.compound_mass_mg, units::MILLIGRAM),
            buffer.clone(),
            Quantity::new(guest.solvent_mass_g, units::GRAM),
            PipettingLocation::new(&source_plate.label, &source_plate.kind, 2 + index as u32),
        )?);
    }

    let mut set = ExperimentSet::new(spec.name.clone());
    set.add_destination_plate(DestinationPlate::new(
        Labware::new("DestinationPlate", "ITC Plate"),
        96,
    ));
    set.add_destination_plate(DestinationPlate::new(
        Labware::new("DestinationPlate2", "ITC Plate"),
        96,
    ));

    set.add_experiment(PlannedExperiment::Fixed(ItcExperiment::new(
        "initial cleaning water titration",
        TitrationSource::Trough(water_trough.clone()),
        TitrationSource::Trough(water_trough.clone()),
        ItcProtocol::cleaning(),
    )));
    set.add_experiment(PlannedExperiment::Fixed(ItcExperiment::new(
        "water into water 1",
        TitrationSource::Trough(water_trough.clone()),
        TitrationSource::Trough(water_trough.clone()),
        ItcProtocol::control(),
    )));
    set.add_experiment(PlannedExperiment::Fixed(ItcExperiment::new(
        "buffer into buffer 1",
        TitrationSource::Trough(buffer_trough.clone()),
        TitrationSource::Trough(buffer_trough.clone()),
        ItcProtocol::control(),
    )));
    set.add_experiment(PlannedExperiment::Fixed(ItcExperiment::new(
        "host into buffer 1",
        TitrationSource::Solution(host_solution.clone()),
        TitrationSource::Trough(buffer_trough.clone()),
        ItcProtocol::binding(),
    )));

    let requested_cell = Quantity::new(spec.cell_concentration_mm, units::MILLIMOLAR);
    let injection_volume = Quantity::new(spec.injection_volume_ul, units::MICROLITER);
    let cell_volume = Quantity::new(spec.cell_volume_ul, units::MICROLITER);

    for (guest, solution) in spec.guests.iter().zip(&guest_solutions) {
        let mut binding = ItcExperiment::new(
            format!("host into {}", guest.name),
            TitrationSource::Solution(host_solution.clone()),
            TitrationSource::Solution(solution.clone()),
            ItcProtocol::binding(),
        );
        binding.buffer_source = Some(buffer_trough.clone());
        let mut host_guest = HeuristicExperiment::new(
            binding,
            requested_cell,
            Quantity::new(guest.ka_l_mol, units::LITER_PER_MOLE),
            spec.injection_count,
            injection_volume,
            cell_volume,
        )?;

        let mut feasible = true;
        if let Err(err) = host_guest.heuristic_syringe(cfg) {
            warn!(error = %err, "heuristic solve hit the window boundary");
            feasible = false;
        }
        let factor = match host_guest.rescale(None) {
            Ok(factor) => Some(factor),
            Err(err) => {
                warn!(error = %err, "rescale infeasible");
                feasible = false;
                None
            }
        };

        let mut blank = ItcExperiment::new(
            format!("buffer into {}", guest.name),
            TitrationSource::Trough(buffer_trough.clone()),
            TitrationSource::Solution(solution.clone()),
            ItcProtocol::blank(),
        );
        blank.buffer_source = Some(buffer_trough.clone());
        let mut buffer_guest = HeuristicExperiment::new(
            blank,
            requested_cell,
            Quantity::new(guest.ka_l_mol, units::LITER_PER_MOLE),
            spec.injection_count,
            injection_volume,
            cell_volume,
        )?;
        if let Some(factor) = factor {
            // The pair shares the cell solution; the factor is applied
            // unchanged to preserve titration symmetry.
            buffer_guest.rescale(Some(factor))?;
        }

        if !feasible {
            set.flag_infeasible(host_guest.base.name.clone());
        }
        set.add_experiment(PlannedExperiment::Heuristic(buffer_guest));
        set.add_experiment(PlannedExperiment::Heuristic(host_guest));
    }

    for replicate in 0..spec.final_water_controls {
        set.add_experiment(PlannedExperiment::Fixed(ItcExperiment::new(
            format!("final water into water test {}", replicate + 1),
            TitrationSource::Trough(water_trough.clone()),
            TitrationSource::Trough(water_trough.clone()),
            ItcProtocol::control(),
        )));
    }

    let report = set.validate()?;
    info!(
        plan = %spec.name,
        experiments = set.experiments.len(),
        "host-guest plan built"
    );
    Ok((set, report))
}

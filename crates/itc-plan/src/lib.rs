//! Experiment planning for automated ITC titrations.
//!
//! Turns compounds, stock solutions, and expected binding constants into a
//! validated titration schedule: the heuristic solver picks syringe/cell
//! concentrations that place the Wiseman c-parameter in a resolvable window,
//! the rescaler keeps them within stock limits, and the worklist writers emit
//! the liquid-handler and instrument inputs.

pub mod config;
pub mod experiment;
pub mod host_guest;
pub mod labware;
pub mod materials;
pub mod protocol;
pub mod set;
pub mod thermo;
pub mod worklist;

pub use config::PlannerConfig;
pub use experiment::{HeuristicExperiment, ItcExperiment, TitrationSource};
pub use host_guest::{build_plan, GuestSpec, HostSpec, PlanSpec};
pub use labware::{DestinationPlate, Labware, PipettingLocation};
pub use materials::{Compound, SimpleSolution, Solvent};
pub use protocol::ItcProtocol;
pub use set::{ExperimentSet, PlannedExperiment, ValidationReport, WellAssignment};

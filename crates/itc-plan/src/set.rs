//! Ordered experiment sets and pre-run validation.

use itc_core::errors::{ErrorInfo, ItcError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::experiment::{HeuristicExperiment, ItcExperiment, TitrationSource};
use crate::labware::DestinationPlate;

/// An experiment in a set: either fully specified or heuristic-solved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlannedExperiment {
    /// Control/cleaning titration with fixed (possibly zero) concentrations.
    Fixed(ItcExperiment),
    /// Binding titration whose concentrations come from the solver.
    Heuristic(HeuristicExperiment),
}

impl PlannedExperiment {
    /// Shared view of the underlying experiment record.
    pub fn base(&self) -> &ItcExperiment {
        match self {
            PlannedExperiment::Fixed(experiment) => experiment,
            PlannedExperiment::Heuristic(heuristic) => &heuristic.base,
        }
    }

    fn base_mut(&mut self) -> &mut ItcExperiment {
        match self {
            PlannedExperiment::Fixed(experiment) => experiment,
            PlannedExperiment::Heuristic(heuristic) => &mut heuristic.base,
        }
    }
}

/// Destination well assigned to an experiment during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellAssignment {
    /// Experiment name.
    pub experiment: String,
    /// Destination plate label.
    pub plate: String,
    /// 1-based well index within the plate.
    pub well: u32,
}

/// Report produced by [`ExperimentSet::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ValidationReport {
    /// Well assignments in experiment order.
    pub assignments: Vec<WellAssignment>,
    /// Names of experiments flagged as infeasible by the solver.
    pub flagged: Vec<String>,
}

/// Named, ordered collection of planned titrations plus destination plates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSet {
    /// Set name, used in file headers.
    pub name: String,
    /// Planned experiments in execution order.
    pub experiments: Vec<PlannedExperiment>,
    /// Available destination plates.
    pub destination_plates: Vec<DestinationPlate>,
    /// Experiments flagged infeasible during planning, by name.
    pub flagged: Vec<String>,
}

impl ExperimentSet {
    /// Creates an empty experiment set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            experiments: Vec::new(),
            destination_plates: Vec::new(),
            flagged: Vec::new(),
        }
    }

    /// Registers a destination plate.
    pub fn add_destination_plate(&mut self, plate: DestinationPlate) {
        self.destination_plates.push(plate);
    }

    /// Appends an experiment to the execution order.
    pub fn add_experiment(&mut self, experiment: PlannedExperiment) {
        self.experiments.push(experiment);
    }

    /// Records a planning failure for an experiment that stays in the set.
    ///
    /// Infeasible experiments are flagged and reported, never silently
    /// dropped.
    pub fn flag_infeasible(&mut self, name: impl Into<String>) {
        let name = name.into();
        warn!(experiment = %name, "experiment flagged infeasible");
        self.flagged.push(name);
    }

    /// Validates the set before any worklist writer runs.
    ///
    /// Checks that every solution source has a pipetting location, assigns a
    /// destination well to each experiment, and fills control experiments'
    /// undefined concentrations with explicit zeros so no experiment reaches
    /// a writer with an unset field.
    pub fn validate(&mut self) -> Result<ValidationReport, ItcError> {
        let mut assignments = Vec::with_capacity(self.experiments.len());
        let mut plate_index = 0usize;
        let mut next_well = 1u32;

        for planned in &mut self.experiments {
            let name = planned.base().name.clone();
            for (side, source) in [
                ("syringe", &planned.base().syringe_source),
                ("cell", &planned.base().cell_source),
            ] {
                if let TitrationSource::Solution(solution) = source {
                    if solution.location.rack_label.is_empty() {
                        return Err(ItcError::Plan(
                            ErrorInfo::new(
                                "missing-source-location",
                                "solution source has no pipetting location",
                            )
                            .with_context("experiment", name.clone())
                            .with_context("side", side.to_string()),
                        ));
                    }
                }
            }

            while plate_index < self.destination_plates.len()
                && next_well > self.destination_plates[plate_index].capacity
            {
                plate_index += 1;
                next_well = 1;
            }
            let Some(plate) = self.destination_plates.get(plate_index) else {
                return Err(ItcError::Plan(
                    ErrorInfo::new("destination-plates-exhausted", "no destination well left")
                        .with_context("experiment", name.clone())
                        .with_context("plates", self.destination_plates.len().to_string()),
                ));
            };
            assignments.push(WellAssignment {
                experiment: name,
                plate: plate.labware.label.clone(),
                well: next_well,
            });
            next_well += 1;

            planned.base_mut().default_concentrations_to_zero();
        }

        info!(
            experiments = self.experiments.len(),
            flagged = self.flagged.len(),
            "experiment set validated"
        );
        Ok(ValidationReport {
            assignments,
            flagged: self.flagged.clone(),
        })
    }
}

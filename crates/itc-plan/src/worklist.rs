//! Worklist and run-sheet emission.
//!
//! Thin glue over a validated [`ExperimentSet`]: a Tecan-style `.gwl`
//! worklist (aspirate/dispense/wash records) and a CSV run sheet with the
//! per-well concentrations and protocol fields. Format fidelity for the
//! proprietary spreadsheet is out of scope; the CSV carries the same columns.

use std::fs;
use std::path::Path;

use itc_core::errors::{ErrorInfo, ItcError};
use itc_core::units::{self, Quantity};
use tracing::info;

use crate::experiment::TitrationSource;
use crate::set::{ExperimentSet, ValidationReport};

fn io_error(code: &str, err: impl ToString, path: &Path) -> ItcError {
    ItcError::Serde(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

fn source_record(source: &TitrationSource, volume_ul: f64) -> String {
    match source {
        TitrationSource::Trough(labware) => {
            format!("A;{};;{};1;;{volume_ul:.1}\r\n", labware.label, labware.kind)
        }
        TitrationSource::Solution(solution) => format!(
            "A;{};;{};{};;{volume_ul:.1}\r\n",
            solution.location.rack_label, solution.location.rack_type, solution.location.position
        ),
    }
}

/// Writes the pipetting worklist for a validated set.
///
/// Each experiment contributes a cell-load transfer and a syringe-load
/// transfer followed by a wash record.
pub fn write_worklist(
    set: &ExperimentSet,
    report: &ValidationReport,
    path: &Path,
) -> Result<(), ItcError> {
    let mut out = String::new();
    for (planned, assignment) in set.experiments.iter().zip(&report.assignments) {
        let base = planned.base();
        // Cell load: 400 uL into the destination well; syringe load: 120 uL.
        out.push_str(&source_record(&base.cell_source, 400.0));
        out.push_str(&format!(
            "D;{};;ITC Plate;{};;400.0\r\n",
            assignment.plate, assignment.well
        ));
        out.push_str("W;\r\n");
        out.push_str(&source_record(&base.syringe_source, 120.0));
        out.push_str(&format!(
            "D;{};;ITC Plate;{};;120.0\r\n",
            assignment.plate, assignment.well
        ));
        out.push_str("W;\r\n");
    }
    fs::write(path, out).map_err(|err| io_error("worklist-write", err, path))?;
    info!(path = %path.display(), experiments = set.experiments.len(), "worklist written");
    Ok(())
}

fn millimolar(concentration: Option<Quantity>) -> Result<String, ItcError> {
    match concentration {
        Some(quantity) => Ok(format!("{:.6}", quantity.value_in(units::MILLIMOLAR)?)),
        None => Err(ItcError::Plan(ErrorInfo::new(
            "unpopulated-concentration",
            "experiment reached the writer with an undefined concentration",
        ))),
    }
}

/// Writes the instrument run sheet as CSV.
pub fn write_run_sheet(
    set: &ExperimentSet,
    report: &ValidationReport,
    path: &Path,
) -> Result<(), ItcError> {
    let mut writer = csv::Writer::from_path(path).map_err(|err| io_error("run-sheet-open", err, path))?;
    writer
        .write_record([
            "name",
            "plate",
            "well",
            "syringe_source",
            "cell_source",
            "syringe_mM",
            "cell_mM",
            "sample_prep_method",
            "itc_method",
            "analysis_method",
        ])
        .map_err(|err| io_error("run-sheet-write", err, path))?;
    for (planned, assignment) in set.experiments.iter().zip(&report.assignments) {
        let base = planned.base();
        let syringe = millimolar(base.syringe_concentration()).map_err(|err| match err {
            ItcError::Plan(info) => {
                ItcError::Plan(info.with_context("experiment", base.name.clone()))
            }
            other => other,
        })?;
        let cell = millimolar(base.cell_concentration()).map_err(|err| match err {
            ItcError::Plan(info) => {
                ItcError::Plan(info.with_context("experiment", base.name.clone()))
            }
            other => other,
        })?;
        writer
            .write_record([
                base.name.as_str(),
                assignment.plate.as_str(),
                &assignment.well.to_string(),
                base.syringe_source.name(),
                base.cell_source.name(),
                &syringe,
                &cell,
                base.protocol.sample_prep_method.as_str(),
                base.protocol.itc_method.as_str(),
                base.protocol.analysis_method.as_str(),
            ])
            .map_err(|err| io_error("run-sheet-write", err, path))?;
    }
    writer
        .flush()
        .map_err(|err| io_error("run-sheet-flush", err, path))?;
    info!(path = %path.display(), "run sheet written");
    Ok(())
}

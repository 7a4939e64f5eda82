//! Observed titration data.

use std::path::Path;

use itc_core::errors::{ErrorInfo, ItcError};
use itc_core::units::{self, Quantity};
use serde::{Deserialize, Serialize};

/// A single injection record from the instrument trace. Immutable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Injection {
    /// Injected volume.
    pub volume: Quantity,
    /// Integrated heat released by this injection.
    pub heat: Quantity,
    /// Cumulative time at the end of the injection.
    pub time: Quantity,
}

impl Injection {
    /// Creates an injection record with dimension checks.
    pub fn new(volume: Quantity, heat: Quantity, time: Quantity) -> Result<Self, ItcError> {
        let volume_l = volume.value_in(units::LITER)?;
        heat.value_in(units::MICROCALORIE)?;
        let time_s = time.value_in(units::SECOND)?;
        if volume_l <= 0.0 || time_s <= 0.0 {
            return Err(ItcError::Model(
                ErrorInfo::new(
                    "invalid-injection",
                    "injection volume and time must be positive",
                )
                .with_context("volume_l", volume_l.to_string())
                .with_context("time_s", time_s.to_string()),
            ));
        }
        Ok(Self { volume, heat, time })
    }
}

/// A completed titration: ordered injection heats plus the metadata the
/// models need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Titration {
    /// Experiment name, used to key reports and diagnostics.
    pub name: String,
    injections: Vec<Injection>,
    /// Working volume of the sample cell.
    pub cell_volume: Quantity,
    /// Stated cell (titrand) concentration, if known.
    pub cell_concentration: Option<Quantity>,
    /// Stated syringe (titrant) concentration, if known.
    pub syringe_concentration: Option<Quantity>,
    /// Experiment temperature in kelvin.
    pub temperature_k: f64,
}

impl Titration {
    /// Creates a titration, validating that the injection sequence is
    /// non-empty and chronologically ordered.
    pub fn new(
        name: impl Into<String>,
        injections: Vec<Injection>,
        cell_volume: Quantity,
        cell_concentration: Option<Quantity>,
        syringe_concentration: Option<Quantity>,
        temperature_k: f64,
    ) -> Result<Self, ItcError> {
        let name = name.into();
        if injections.is_empty() {
            return Err(ItcError::Model(
                ErrorInfo::new("empty-trace", "titration has no injections")
                    .with_context("experiment", name.clone()),
            ));
        }
        let mut previous = 0.0f64;
        for (index, injection) in injections.iter().enumerate() {
            let time = injection.time.value_in(units::SECOND)?;
            if time <= previous {
                return Err(ItcError::Model(
                    ErrorInfo::new(
                        "non-chronological-trace",
                        "injection times must be strictly increasing",
                    )
                    .with_context("experiment", name.clone())
                    .with_context("injection", index.to_string()),
                ));
            }
            previous = time;
        }
        cell_volume.value_in(units::LITER)?;
        Ok(Self {
            name,
            injections,
            cell_volume,
            cell_concentration,
            syringe_concentration,
            temperature_k,
        })
    }

    /// Injection records in chronological order.
    pub fn injections(&self) -> &[Injection] {
        &self.injections
    }

    /// Injection volumes in liters.
    pub fn injection_volumes_l(&self) -> Result<Vec<f64>, ItcError> {
        self.injections
            .iter()
            .map(|injection| injection.volume.value_in(units::LITER))
            .collect()
    }

    /// Observed heats in microcalories.
    pub fn heats_ucal(&self) -> Result<Vec<f64>, ItcError> {
        self.injections
            .iter()
            .map(|injection| injection.heat.value_in(units::MICROCALORIE))
            .collect()
    }

    /// Per-injection durations in seconds, derived from cumulative times.
    pub fn durations_s(&self) -> Result<Vec<f64>, ItcError> {
        let mut durations = Vec::with_capacity(self.injections.len());
        let mut previous = 0.0f64;
        for injection in &self.injections {
            let time = injection.time.value_in(units::SECOND)?;
            durations.push(time - previous);
            previous = time;
        }
        Ok(durations)
    }
}

/// Reads a pre-integrated heats table (`volume_ul,heat_ucal,time_s` columns).
pub fn read_integrated_heats(path: &Path) -> Result<Vec<Injection>, ItcError> {
    let io_err = |code: &str, err: &dyn ToString| {
        ItcError::Serde(
            ErrorInfo::new(code, err.to_string())
                .with_context("path", path.display().to_string()),
        )
    };
    let mut reader = csv::Reader::from_path(path).map_err(|err| io_err("heats-open", &err))?;
    let headers = reader
        .headers()
        .map_err(|err| io_err("heats-header", &err))?
        .clone();
    let column = |name: &str| -> Result<usize, ItcError> {
        headers.iter().position(|header| header == name).ok_or_else(|| {
            ItcError::Serde(
                ErrorInfo::new("heats-missing-column", format!("column `{name}` not found"))
                    .with_context("path", path.display().to_string()),
            )
        })
    };
    let volume_col = column("volume_ul")?;
    let heat_col = column("heat_ucal")?;
    let time_col = column("time_s")?;

    let mut injections = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|err| io_err("heats-read", &err))?;
        let field = |col: usize| -> Result<f64, ItcError> {
            record
                .get(col)
                .unwrap_or("")
                .trim()
                .parse::<f64>()
                .map_err(|err| {
                    ItcError::Serde(
                        ErrorInfo::new("heats-parse", err.to_string())
                            .with_context("path", path.display().to_string())
                            .with_context("row", row.to_string()),
                    )
                })
        };
        injections.push(Injection::new(
            Quantity::new(field(volume_col)?, units::MICROLITER),
            Quantity::new(field(heat_col)?, units::MICROCALORIE),
            Quantity::new(field(time_col)?, units::SECOND),
        )?);
    }
    Ok(injections)
}

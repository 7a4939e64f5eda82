//! Compounds, solvents, and prepared stock solutions.

use itc_core::errors::{ErrorInfo, ItcError};
use itc_core::units::{self, Quantity};
use serde::{Deserialize, Serialize};

use crate::labware::PipettingLocation;

/// A solvent with a known density.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solvent {
    /// Display name ("water", "buffer").
    pub name: String,
    /// Density, dimension mass/volume.
    pub density: Quantity,
}

impl Solvent {
    /// Creates a solvent, checking that the density carries mass/volume.
    pub fn new(name: impl Into<String>, density: Quantity) -> Result<Self, ItcError> {
        let name = name.into();
        // Fail early rather than at the first concentration computation.
        density.value_in(units::GRAM_PER_MILLILITER).map_err(|err| {
            attach_material(err, &name)
        })?;
        Ok(Self { name, density })
    }
}

/// A compound with a molar mass and a purity fraction. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compound {
    /// Display name ("host", "guest04").
    pub name: String,
    /// Molar mass, dimension mass/amount.
    pub molar_mass: Quantity,
    /// Purity fraction in (0, 1].
    pub purity: f64,
}

impl Compound {
    /// Creates a compound, validating molar mass dimension and purity range.
    pub fn new(
        name: impl Into<String>,
        molar_mass: Quantity,
        purity: f64,
    ) -> Result<Self, ItcError> {
        let name = name.into();
        let magnitude = molar_mass
            .value_in(units::GRAM_PER_MOLE)
            .map_err(|err| attach_material(err, &name))?;
        if magnitude <= 0.0 {
            return Err(ItcError::Plan(
                ErrorInfo::new("non-positive-molar-mass", "molar mass must be positive")
                    .with_context("compound", name)
                    .with_context("molar_mass", magnitude.to_string()),
            ));
        }
        if !(purity > 0.0 && purity <= 1.0) {
            return Err(ItcError::Plan(
                ErrorInfo::new("purity-out-of-range", "purity must lie in (0, 1]")
                    .with_context("compound", name)
                    .with_context("purity", purity.to_string()),
            ));
        }
        Ok(Self {
            name,
            molar_mass,
            purity,
        })
    }
}

/// A stock solution prepared from measured compound and solvent masses.
///
/// The concentration is a derived quantity recomputed from the masses; it is
/// never mutated directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleSolution {
    /// Dissolved compound.
    pub compound: Compound,
    /// Measured compound mass.
    pub compound_mass: Quantity,
    /// Solvent used to prepare the solution.
    pub solvent: Solvent,
    /// Measured solvent mass.
    pub solvent_mass: Quantity,
    /// Pipetting location of the prepared stock on the deck.
    pub location: PipettingLocation,
}

impl SimpleSolution {
    /// Creates a solution and eagerly checks that the concentration is
    /// well-formed (positive masses, compatible dimensions).
    pub fn new(
        compound: Compound,
        compound_mass: Quantity,
        solvent: Solvent,
        solvent_mass: Quantity,
        location: PipettingLocation,
    ) -> Result<Self, ItcError> {
        let solution = Self {
            compound,
            compound_mass,
            solvent,
            solvent_mass,
            location,
        };
        let concentration = solution.concentration()?;
        if !concentration.is_positive() {
            return Err(ItcError::Plan(
                ErrorInfo::new(
                    "non-positive-concentration",
                    "solution concentration must be positive",
                )
                .with_context("compound", solution.compound.name.clone()),
            ));
        }
        Ok(solution)
    }

    /// Molar concentration derived from the measured masses:
    /// `mass * purity / molar_mass / (solvent_mass / density)`.
    pub fn concentration(&self) -> Result<Quantity, ItcError> {
        let amount = self.compound_mass * self.compound.purity / self.compound.molar_mass;
        let volume = self.solvent_mass / self.solvent.density;
        let concentration = amount / volume;
        // Surface a dimension defect here, with the compound named.
        concentration
            .value_in(units::MOLAR)
            .map_err(|err| attach_material(err, &self.compound.name))?;
        Ok(concentration)
    }
}

fn attach_material(err: ItcError, name: &str) -> ItcError {
    match err {
        ItcError::Unit(info) => ItcError::Unit(info.with_context("material", name.to_string())),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labware::PipettingLocation;
    use itc_core::units::{GRAM, GRAM_PER_MILLILITER, GRAM_PER_MOLE, MILLIGRAM, MILLIMOLAR};

    fn buffer() -> Solvent {
        Solvent::new("buffer", Quantity::new(1.014, GRAM_PER_MILLILITER)).unwrap()
    }

    fn location() -> PipettingLocation {
        PipettingLocation::new("SourcePlate", "5x3 Vial Holder", 1)
    }

    #[test]
    fn purity_must_be_a_fraction() {
        let molar_mass = Quantity::new(209.12, GRAM_PER_MOLE);
        assert!(Compound::new("guest01", molar_mass, 0.0).is_err());
        assert!(Compound::new("guest01", molar_mass, 1.2).is_err());
        assert!(Compound::new("guest01", molar_mass, 0.975).is_ok());
    }

    #[test]
    fn host_stock_concentration_matches_hand_calculation() {
        // Host: 8.7 mg at 71.33% purity, MW 1162.9632 g/mol, in 10.4732 g buffer.
        let host = Compound::new(
            "host",
            Quantity::new(1162.9632, GRAM_PER_MOLE),
            0.7133,
        )
        .unwrap();
        let solution = SimpleSolution::new(
            host,
            Quantity::new(8.7, MILLIGRAM),
            buffer(),
            Quantity::new(10.4732, GRAM),
            location(),
        )
        .unwrap();
        let millimolar = solution
            .concentration()
            .unwrap()
            .value_in(MILLIMOLAR)
            .unwrap();
        let expected = 8.7e-3 * 0.7133 / 1162.9632 / (10.4732 / 1.014 / 1e3);
        assert!((millimolar - expected * 1e3).abs() < 1e-9);
    }

    #[test]
    fn wrong_density_dimension_is_rejected() {
        let bad = Solvent::new("broken", Quantity::new(1.0, GRAM));
        assert!(matches!(bad, Err(ItcError::Unit(_))));
    }
}

//! Calorimeter descriptions.

use itc_core::errors::{ErrorInfo, ItcError};
use itc_core::units::{self, Quantity};
use serde::{Deserialize, Serialize};

/// A calorimeter model and the geometry the isotherm calculation needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Stable identifier (`vp-itc`, `auto-itc200`).
    pub id: String,
    /// Display name.
    pub description: String,
    /// Working volume of the sample cell.
    pub cell_volume: Quantity,
    /// Default operating temperature in kelvin.
    pub temperature_k: f64,
}

/// Instruments the toolkit knows out of the box.
pub fn known_instruments() -> Vec<Instrument> {
    vec![
        Instrument {
            id: "vp-itc".into(),
            description: "MicroCal VP-ITC".into(),
            cell_volume: Quantity::new(1.4301, units::MILLILITER),
            temperature_k: 298.15,
        },
        Instrument {
            id: "auto-itc200".into(),
            description: "MicroCal Auto-iTC200".into(),
            cell_volume: Quantity::new(202.8, units::MICROLITER),
            temperature_k: 298.15,
        },
    ]
}

/// Looks up an instrument by identifier.
pub fn instrument_by_id(id: &str) -> Result<Instrument, ItcError> {
    known_instruments()
        .into_iter()
        .find(|instrument| instrument.id == id)
        .ok_or_else(|| {
            ItcError::Model(
                ErrorInfo::new("unknown-instrument", "no instrument with this identifier")
                    .with_context("id", id.to_string())
                    .with_hint("known instruments: vp-itc, auto-itc200"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_itc200_cell_volume_is_202_8_ul() {
        let instrument = instrument_by_id("auto-itc200").unwrap();
        let ul = instrument.cell_volume.value_in(units::MICROLITER).unwrap();
        assert!((ul - 202.8).abs() < 1e-9);
    }

    #[test]
    fn unknown_instrument_is_an_error() {
        let err = instrument_by_id("nano-itc").unwrap_err();
        assert_eq!(err.info().code, "unknown-instrument");
    }
}

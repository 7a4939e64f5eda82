//! Free energy / association constant conversions used when planning.

use itc_core::errors::{ErrorInfo, ItcError};
use itc_core::units::{self, Quantity};

/// Gas constant in kcal/(mol*K).
pub const GAS_CONSTANT_KCAL: f64 = 1.987_204_118e-3;

/// Standard experiment temperature in kelvin (25 C).
pub const STANDARD_TEMPERATURE: f64 = 298.15;

/// Converts a binding free energy into an association constant (L/mol).
///
/// `Ka = exp(-DeltaG / RT)` referenced to the 1 M standard state.
pub fn ka_from_delta_g(delta_g: Quantity, temperature: f64) -> Result<Quantity, ItcError> {
    if temperature <= 0.0 {
        return Err(ItcError::Plan(
            ErrorInfo::new("invalid-temperature", "temperature must be positive kelvin")
                .with_context("temperature", temperature.to_string()),
        ));
    }
    let dg = delta_g.value_in(units::KILOCALORIE_PER_MOLE)?;
    let ka = (-dg / (GAS_CONSTANT_KCAL * temperature)).exp();
    Ok(Quantity::new(ka, units::LITER_PER_MOLE))
}

/// Converts an association constant back into a binding free energy.
pub fn delta_g_from_ka(ka: Quantity, temperature: f64) -> Result<Quantity, ItcError> {
    let ln_ka = ka.ln_value_in(units::LITER_PER_MOLE)?;
    Ok(Quantity::new(
        -GAS_CONSTANT_KCAL * temperature * ln_ka,
        units::KILOCALORIE_PER_MOLE,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_round_trips() {
        let dg = Quantity::new(-8.0, units::KILOCALORIE_PER_MOLE);
        let ka = ka_from_delta_g(dg, STANDARD_TEMPERATURE).unwrap();
        let back = delta_g_from_ka(ka, STANDARD_TEMPERATURE).unwrap();
        let recovered = back.value_in(units::KILOCALORIE_PER_MOLE).unwrap();
        assert!((recovered + 8.0).abs() < 1e-12);
    }

    #[test]
    fn stronger_binding_means_larger_ka() {
        let weak = ka_from_delta_g(
            Quantity::new(-5.0, units::KILOCALORIE_PER_MOLE),
            STANDARD_TEMPERATURE,
        )
        .unwrap();
        let strong = ka_from_delta_g(
            Quantity::new(-10.0, units::KILOCALORIE_PER_MOLE),
            STANDARD_TEMPERATURE,
        )
        .unwrap();
        assert!(strong.ratio(&weak).unwrap() > 1.0);
    }
}

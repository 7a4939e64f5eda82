use itc_core::units::{
    self, Quantity, GRAM, GRAM_PER_MILLILITER, GRAM_PER_MOLE, LITER, MICROLITER, MILLIGRAM,
    MILLILITER, MILLIMOLAR, MOLAR,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn volume_conversion_round_trips(value in 1e-6f64..1e6) {
        let quantity = Quantity::new(value, MICROLITER);
        let in_liters = quantity.value_in(LITER).unwrap();
        let back = Quantity::new(in_liters, LITER).value_in(MICROLITER).unwrap();
        prop_assert!((back - value).abs() <= value * 1e-12);
    }

    #[test]
    fn mass_conversion_round_trips(value in 1e-6f64..1e6) {
        let quantity = Quantity::new(value, MILLIGRAM);
        let in_grams = quantity.value_in(GRAM).unwrap();
        let back = Quantity::new(in_grams, GRAM).value_in(MILLIGRAM).unwrap();
        prop_assert!((back - value).abs() <= value * 1e-12);
    }

    #[test]
    fn concentration_from_masses_round_trips(
        compound_mg in 0.1f64..100.0,
        solvent_g in 1.0f64..100.0,
        molar_mass in 50.0f64..2000.0,
        purity in 0.1f64..1.0,
    ) {
        // concentration = mass * purity / molar_mass / (solvent_mass / density)
        let density = Quantity::new(1.014, GRAM_PER_MILLILITER);
        let mass = Quantity::new(compound_mg, MILLIGRAM);
        let solvent = Quantity::new(solvent_g, GRAM);
        let molar = Quantity::new(molar_mass, GRAM_PER_MOLE);

        let amount = mass * purity / molar;
        let volume = solvent / density;
        let concentration = amount / volume;

        let in_millimolar = concentration.value_in(MILLIMOLAR).unwrap();
        let back = Quantity::new(in_millimolar, MILLIMOLAR).value_in(MOLAR).unwrap();
        prop_assert!((back * 1e3 - in_millimolar).abs() <= in_millimolar.abs() * 1e-12);
        prop_assert!(in_millimolar > 0.0);
    }
}

#[test]
fn addition_of_mismatched_dimensions_fails() {
    let mass = Quantity::new(1.0, GRAM);
    let volume = Quantity::new(1.0, MILLILITER);
    assert!(mass.try_add(&volume).is_err());
    assert!(mass.try_sub(&volume).is_err());
    assert!(mass.ratio(&volume).is_err());
}

#[test]
fn addition_of_compatible_units_uses_canonical_scale() {
    let a = Quantity::new(1.0, MILLILITER);
    let b = Quantity::new(250.0, MICROLITER);
    let total = a.try_add(&b).unwrap();
    assert!((total.value_in(MILLILITER).unwrap() - 1.25).abs() < 1e-12);
}

#[test]
fn dimensionless_extraction_guards_dimension() {
    let conc = Quantity::new(0.5, MILLIMOLAR);
    assert!(conc.into_dimensionless().is_err());
    assert_eq!(
        Quantity::new(2.0, units::DIMENSIONLESS)
            .into_dimensionless()
            .unwrap(),
        2.0
    );
}

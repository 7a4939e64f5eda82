use itc_core::units::{
    Quantity, GRAM, GRAM_PER_MILLILITER, GRAM_PER_MOLE, LITER_PER_MOLE, MICROLITER, MILLIMOLAR,
};
use itc_plan::{
    Compound, HeuristicExperiment, ItcExperiment, ItcProtocol, Labware, PipettingLocation,
    PlannerConfig, SimpleSolution, Solvent, TitrationSource,
};

const GUEST04_KA: f64 = 1.788_684_707e6;

fn solution_with_concentration(name: &str, millimolar: f64, position: u32) -> SimpleSolution {
    let solvent = Solvent::new("water", Quantity::new(1.0, GRAM_PER_MILLILITER)).unwrap();
    let compound = Compound::new(name, Quantity::new(1000.0, GRAM_PER_MOLE), 1.0).unwrap();
    let mass_g = millimolar * 1e-3 * 1000.0 * 0.01;
    SimpleSolution::new(
        compound,
        Quantity::new(mass_g, GRAM),
        solvent,
        Quantity::new(10.0, GRAM),
        PipettingLocation::new("SourcePlate", "5x3 Vial Holder", position),
    )
    .unwrap()
}

fn host_guest(host_stock_mm: f64, guest_stock_mm: f64) -> HeuristicExperiment {
    let base = ItcExperiment::new(
        "host into guest04",
        TitrationSource::Solution(solution_with_concentration("host", host_stock_mm, 1)),
        TitrationSource::Solution(solution_with_concentration("guest04", guest_stock_mm, 2)),
        ItcProtocol::binding(),
    );
    HeuristicExperiment::new(
        base,
        Quantity::new(0.5, MILLIMOLAR),
        Quantity::new(GUEST04_KA, LITER_PER_MOLE),
        10,
        Quantity::new(3.0, MICROLITER),
        Quantity::new(202.8, MICROLITER),
    )
    .unwrap()
}

fn buffer_control(guest_stock_mm: f64) -> HeuristicExperiment {
    let base = ItcExperiment::new(
        "buffer into guest04",
        TitrationSource::Trough(Labware::new("Buffer", "Trough 100ml")),
        TitrationSource::Solution(solution_with_concentration("guest04", guest_stock_mm, 2)),
        ItcProtocol::blank(),
    );
    HeuristicExperiment::new(
        base,
        Quantity::new(0.5, MILLIMOLAR),
        Quantity::new(GUEST04_KA, LITER_PER_MOLE),
        10,
        Quantity::new(3.0, MICROLITER),
        Quantity::new(202.8, MICROLITER),
    )
    .unwrap()
}

#[test]
fn rescale_with_ample_stock_is_unity() {
    let mut experiment = host_guest(50.0, 10.0);
    experiment.heuristic_syringe(&PlannerConfig::default()).unwrap();
    let factor = experiment.rescale(None).unwrap();
    assert_eq!(factor, 1.0);
}

#[test]
fn limited_syringe_stock_computes_fractional_factor() {
    let cfg = PlannerConfig::default();

    // Learn the unconstrained syringe requirement first.
    let mut probe = host_guest(50.0, 10.0);
    probe.heuristic_syringe(&cfg).unwrap();
    let required_mm = probe
        .base
        .syringe_concentration()
        .unwrap()
        .value_in(MILLIMOLAR)
        .unwrap();

    // Now give the host stock exactly 60% of that requirement.
    let mut constrained = host_guest(0.6 * required_mm, 10.0);
    constrained.heuristic_syringe(&cfg).unwrap();
    let unscaled_cell = constrained.base.cell_concentration().unwrap();
    let factor = constrained.rescale(None).unwrap();
    assert!((factor - 0.6).abs() < 1e-9);

    // The paired buffer control shares the cell solution and receives the
    // identical factor, scaling its concentrations by exactly 0.6x.
    let mut control = buffer_control(10.0);
    let applied = control.rescale(Some(factor)).unwrap();
    assert_eq!(applied, factor);
    let control_cell = control
        .base
        .cell_concentration()
        .unwrap()
        .value_in(MILLIMOLAR)
        .unwrap();
    assert!((control_cell - 0.5 * factor).abs() < 1e-12);

    // And the binding experiment's own cell load scaled the same way.
    let scaled_cell = constrained
        .base
        .cell_concentration()
        .unwrap()
        .value_in(MILLIMOLAR)
        .unwrap();
    let unscaled_mm = unscaled_cell.value_in(MILLIMOLAR).unwrap();
    assert!((scaled_cell - unscaled_mm * factor).abs() < 1e-12);
}

#[test]
fn reapplying_a_returned_factor_does_not_double_scale() {
    let mut experiment = host_guest(50.0, 10.0);
    experiment.heuristic_syringe(&PlannerConfig::default()).unwrap();
    experiment.rescale(Some(0.6)).unwrap();
    let once = experiment.base.cell_concentration().unwrap();
    experiment.rescale(Some(0.6)).unwrap();
    let twice = experiment.base.cell_concentration().unwrap();
    assert_eq!(once, twice);
}

#[test]
fn factor_outside_unit_interval_is_rejected() {
    let mut experiment = host_guest(50.0, 10.0);
    experiment.heuristic_syringe(&PlannerConfig::default()).unwrap();
    assert!(experiment.rescale(Some(0.0)).is_err());
    assert!(experiment.rescale(Some(1.5)).is_err());
    assert!(experiment.rescale(Some(-0.2)).is_err());
}

use itc_core::errors::ItcError;
use itc_core::units::{
    Quantity, GRAM, GRAM_PER_MILLILITER, GRAM_PER_MOLE, LITER_PER_MOLE, MICROLITER, MILLIMOLAR,
};
use itc_plan::{
    Compound, HeuristicExperiment, ItcExperiment, ItcProtocol, PipettingLocation, PlannerConfig,
    SimpleSolution, Solvent, TitrationSource,
};
use proptest::prelude::*;

/// Solution with an exactly chosen molar concentration: purity 1.0,
/// molar mass 1000 g/mol, 10 g of unit-density solvent (10 mL).
fn solution_with_concentration(name: &str, millimolar: f64, position: u32) -> SimpleSolution {
    let solvent = Solvent::new("water", Quantity::new(1.0, GRAM_PER_MILLILITER)).unwrap();
    let compound =
        Compound::new(name, Quantity::new(1000.0, GRAM_PER_MOLE), 1.0).unwrap();
    // conc [M] = mass_g / 1000 / 0.01 L
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

fn binding_experiment(ka_l_mol: f64, guest_stock_mm: f64) -> HeuristicExperiment {
    let host = solution_with_concentration("host", 50.0, 1);
    let guest = solution_with_concentration("guest", guest_stock_mm, 2);
    let base = ItcExperiment::new(
        "host into guest",
        TitrationSource::Solution(host),
        TitrationSource::Solution(guest),
        ItcProtocol::binding(),
    );
    HeuristicExperiment::new(
        base,
        Quantity::new(0.5, MILLIMOLAR),
        Quantity::new(ka_l_mol, LITER_PER_MOLE),
        10,
        Quantity::new(3.0, MICROLITER),
        Quantity::new(202.8, MICROLITER),
    )
    .unwrap()
}

#[test]
fn guest04_scenario_is_feasible() {
    // Ka from the SAMPL4-CB7 dataset, guest04.
    let mut experiment = binding_experiment(1.788_684_707e6, 10.0);
    let cfg = PlannerConfig::default();
    let c = experiment.heuristic_syringe(&cfg).expect("feasible");
    assert!(c >= cfg.c_low && c <= cfg.c_high);
    let syringe = experiment.base.syringe_concentration().unwrap();
    assert!(syringe.is_positive());
    // Raw c = 894 exceeds the window, so the cell load is diluted to hit it.
    let cell = experiment
        .base
        .cell_concentration()
        .unwrap()
        .value_in(MILLIMOLAR)
        .unwrap();
    assert!(cell < 0.5);
    assert!((1.788_684_707e6 * cell * 1e-3 - cfg.c_high).abs() < 1e-6);
}

#[test]
fn solver_is_idempotent() {
    let mut experiment = binding_experiment(2.102_428_764e7, 10.0);
    let cfg = PlannerConfig::default();
    let first = experiment.heuristic_syringe(&cfg).unwrap();
    let syringe_first = experiment.base.syringe_concentration().unwrap();
    let second = experiment.heuristic_syringe(&cfg).unwrap();
    assert_eq!(first, second);
    assert_eq!(experiment.base.syringe_concentration().unwrap(), syringe_first);
}

#[test]
fn weak_binder_beyond_stock_is_infeasible() {
    // Ka = 10 L/mol with a 10 mM stock caps c at 0.1, far below the window.
    let mut experiment = binding_experiment(10.0, 10.0);
    let cfg = PlannerConfig::default();
    let err = experiment.heuristic_syringe(&cfg).unwrap_err();
    assert!(matches!(err, ItcError::Plan(_)));
    assert_eq!(err.info().code, "c-window");
    // Boundary values are still populated for the caller to inspect.
    assert!(experiment.base.syringe_concentration().is_some());
    assert!(experiment.base.cell_concentration().is_some());
}

#[test]
fn weak_binder_within_stock_raises_cell_load() {
    // Ka = 100 L/mol: c_raw = 0.05; the 25 mM stock allows c = 1.0 exactly.
    let mut experiment = binding_experiment(100.0, 25.0);
    let cfg = PlannerConfig::default();
    let c = experiment.heuristic_syringe(&cfg).expect("stock suffices");
    assert!((c - cfg.c_low).abs() < 1e-9);
    let cell = experiment
        .base
        .cell_concentration()
        .unwrap()
        .value_in(MILLIMOLAR)
        .unwrap();
    assert!(cell > 0.5);
}

proptest! {
    #[test]
    fn dataset_affinity_range_stays_in_window(exponent in 4.0f64..10.0) {
        let ka = 10f64.powf(exponent);
        let mut experiment = binding_experiment(ka, 10.0);
        let cfg = PlannerConfig::default();
        let c = experiment.heuristic_syringe(&cfg).expect("dataset range is feasible");
        prop_assert!(c >= cfg.c_low - 1e-9 && c <= cfg.c_high + 1e-9);
        let syringe = experiment.base.syringe_concentration().unwrap();
        prop_assert!(syringe.is_positive());
    }
}

use itc_core::units::{self, Quantity};
use itc_infer::{map_fit, BindingModel, Injection, MapOptions, SingleSiteModel, Titration};

const TRUTH: [f64; 5] = [-8.0, -5.0, 0.2, 5e-4, 7.5e-3];

fn titration_with_heats(heats_ucal: &[f64]) -> Titration {
    let injections = heats_ucal
        .iter()
        .enumerate()
        .map(|(n, &heat)| {
            Injection::new(
                Quantity::new(3.0, units::MICROLITER),
                Quantity::new(heat, units::MICROCALORIE),
                Quantity::new(180.0 * (n + 1) as f64, units::SECOND),
            )
            .unwrap()
        })
        .collect();
    Titration::new(
        "synthetic single-site",
        injections,
        Quantity::new(202.8, units::MICROLITER),
        Some(Quantity::new(0.5, units::MILLIMOLAR)),
        Some(Quantity::new(7.5, units::MILLIMOLAR)),
        298.15,
    )
    .unwrap()
}

/// Heats generated from the known ground truth, with a small deterministic
/// perturbation so the noise scale stays finite at the optimum.
fn synthetic_titration() -> Titration {
    let placeholder = titration_with_heats(&[-10.0; 10]);
    let model = SingleSiteModel::new(&placeholder).unwrap();
    let values = [TRUTH[0], TRUTH[1], TRUTH[2], TRUTH[3], TRUTH[4], 0.0];
    let clean = model.expected_heats(&values).unwrap();
    let noisy: Vec<f64> = clean
        .iter()
        .enumerate()
        .map(|(n, q)| q + if n % 2 == 0 { 0.05 } else { -0.05 })
        .collect();
    titration_with_heats(&noisy)
}

#[test]
fn map_fit_recovers_the_generating_thermodynamics() {
    let titration = synthetic_titration();
    let model = SingleSiteModel::new(&titration).unwrap();
    let fit = map_fit(&model, &MapOptions::default()).unwrap();

    assert!(fit.converged, "stopped after {} iterations", fit.iterations);
    assert!((fit.values[0] / TRUTH[0] - 1.0).abs() < 0.01, "DeltaG {}", fit.values[0]);
    assert!((fit.values[1] / TRUTH[1] - 1.0).abs() < 0.01, "DeltaH {}", fit.values[1]);
    // Stated concentrations are the truth here, so the lognormal priors and
    // the data agree.
    assert!((fit.values[3] / TRUTH[3] - 1.0).abs() < 0.05, "P0 {}", fit.values[3]);
    assert!((fit.values[4] / TRUTH[4] - 1.0).abs() < 0.05, "Ls {}", fit.values[4]);
}

#[test]
fn map_log_posterior_beats_the_starting_point() {
    let titration = synthetic_titration();
    let model = SingleSiteModel::new(&titration).unwrap();
    let start: Vec<f64> = model.parameters().iter().map(|p| p.initial).collect();
    let start_lp = itc_infer::log_posterior(&model, &start).unwrap();

    let fit = map_fit(&model, &MapOptions::default()).unwrap();
    assert!(fit.log_posterior >= start_lp);
}

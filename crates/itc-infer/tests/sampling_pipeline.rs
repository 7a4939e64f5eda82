use itc_core::units::{self, Quantity};
use itc_infer::{analyze, analyze_all, AnalysisConfig, Injection, SingleSiteModel, Titration};
use itc_infer::model::BindingModel;

const TRUTH_DELTA_G: f64 = -8.5;
const TRUTH_DELTA_H: f64 = -4.0;

fn titration_with_heats(name: &str, heats_ucal: &[f64]) -> Titration {
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
        name,
        injections,
        Quantity::new(202.8, units::MICROLITER),
        Some(Quantity::new(0.5, units::MILLIMOLAR)),
        Some(Quantity::new(7.5, units::MILLIMOLAR)),
        298.15,
    )
    .unwrap()
}

fn synthetic_titration(name: &str) -> Titration {
    let placeholder = titration_with_heats(name, &[-10.0; 10]);
    let model = SingleSiteModel::new(&placeholder).unwrap();
    let values = [TRUTH_DELTA_G, TRUTH_DELTA_H, 0.2, 5e-4, 7.5e-3, 0.0];
    let clean = model.expected_heats(&values).unwrap();
    let noisy: Vec<f64> = clean
        .iter()
        .enumerate()
        .map(|(n, q)| q + if n % 2 == 0 { 0.05 } else { -0.05 })
        .collect();
    titration_with_heats(name, &noisy)
}

fn quick_config() -> AnalysisConfig {
    AnalysisConfig {
        nfit: 3_000,
        iterations: 2_000,
        burn_in: 500,
        thinning: 5,
        ..AnalysisConfig::default()
    }
}

#[test]
fn full_pipeline_recovers_free_energy() {
    let outcome = analyze(&synthetic_titration("pipeline"), &quick_config()).unwrap();

    let delta_g = outcome
        .summaries
        .iter()
        .find(|s| s.name == "DeltaG")
        .unwrap();
    assert!((delta_g.mean - TRUTH_DELTA_G).abs() < 0.3, "{delta_g:?}");
    assert!(delta_g.lower <= delta_g.upper);

    // Retained samples follow the burn-in/thinning schedule.
    let expected_samples = (2_000 - 500 + 4) / 5;
    for trace in outcome.sampler.traces.values() {
        assert_eq!(trace.len(), expected_samples);
    }
    for rate in &outcome.sampler.acceptance {
        assert!((0.0..=1.0).contains(rate));
    }
}

#[test]
fn batch_failures_do_not_poison_other_experiments() {
    let good = synthetic_titration("good");
    let mut bad = synthetic_titration("bad");
    bad.cell_concentration = None;

    let results = analyze_all(&[bad, good], &quick_config());
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, "bad");
    assert_eq!(
        results[0].1.as_ref().unwrap_err().info().code,
        "missing-concentration"
    );
    assert!(results[1].1.is_ok());
}

use itc_core::errors::{ErrorInfo, ItcError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("experiment", "host into guest04")
        .with_context("reason", "example")
}

#[test]
fn unit_error_surface() {
    let err = ItcError::Unit(sample_info("dimension-mismatch", "g vs L"));
    assert_eq!(err.info().code, "dimension-mismatch");
    assert!(err.info().context.contains_key("experiment"));
}

#[test]
fn plan_error_surface() {
    let err = ItcError::Plan(sample_info("c-window", "c outside target range"));
    assert_eq!(err.info().code, "c-window");
    assert!(err.info().context.contains_key("reason"));
}

#[test]
fn model_error_surface() {
    let err = ItcError::Model(sample_info("missing-concentration", "cell undefined"));
    assert_eq!(err.info().code, "missing-concentration");
}

#[test]
fn isotherm_error_surface() {
    let err = ItcError::Isotherm(sample_info("negative-concentration", "P0 < 0"));
    assert_eq!(err.info().code, "negative-concentration");
}

#[test]
fn error_display_includes_hint() {
    let err = ItcError::Sampler(
        ErrorInfo::new("bad-resume", "iteration past configured total")
            .with_hint("lower the checkpoint iteration or raise `iterations`"),
    );
    let rendered = err.to_string();
    assert!(rendered.contains("bad-resume"));
    assert!(rendered.contains("hint"));
}

#[test]
fn errors_serialize_round_trip() {
    let err = ItcError::Serde(sample_info("report-write", "disk full"));
    let json = serde_json::to_string(&err).unwrap();
    let back: ItcError = serde_json::from_str(&json).unwrap();
    assert_eq!(err, back);
}

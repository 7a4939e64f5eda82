//! Human-readable interval reports and trace export.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use itc_core::errors::{ErrorInfo, ItcError};

use crate::analysis::summarize_trace;

/// Display rule for one trace: reported name, unit label, and the transform
/// applied sample-by-sample before summarizing.
fn display_rule(name: &str) -> (String, &'static str, fn(f64) -> f64) {
    if name == "log_sigma" {
        // Report the noise scale itself, not its logarithm.
        return ("sigma".to_string(), "ucal/s^0.5", f64::exp);
    }
    if name == "DeltaH_0" {
        return (name.to_string(), "ucal", |x| x);
    }
    if name.starts_with("DeltaG") || name.starts_with("DeltaH") {
        return (name.to_string(), "kcal/mol", |x| x);
    }
    if name == "P0" || name == "Ls" {
        return (name.to_string(), "uM", |x| x * 1e6);
    }
    (name.to_string(), "", |x| x)
}

/// Renders the confidence-interval report for one analyzed titration.
pub fn render_report(
    experiment: &str,
    model_name: &str,
    traces: &IndexMap<String, Vec<f64>>,
    ci: f64,
) -> Result<String, ItcError> {
    let samples = traces.values().next().map_or(0, Vec::len);
    let mut out = String::new();
    let _ = writeln!(out, "# {experiment} ({model_name})");
    let _ = writeln!(
        out,
        "# {:.1}% intervals from {samples} posterior samples",
        ci * 100.0
    );
    for (name, trace) in traces {
        let (label, unit, transform) = display_rule(name);
        let transformed: Vec<f64> = trace.iter().copied().map(transform).collect();
        let summary = summarize_trace(&label, &transformed, ci)?;
        let _ = writeln!(
            out,
            "{label:<12} = {:12.6} [{:12.6}, {:12.6}] {unit}",
            summary.mean, summary.lower, summary.upper
        );
    }
    Ok(out)
}

/// Writes the interval report beside the analyzed experiment.
pub fn write_report(
    path: &Path,
    experiment: &str,
    model_name: &str,
    traces: &IndexMap<String, Vec<f64>>,
    ci: f64,
) -> Result<(), ItcError> {
    let contents = render_report(experiment, model_name, traces, ci)?;
    fs::write(path, contents).map_err(|err| {
        ItcError::Serde(
            ErrorInfo::new("report-write", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })
}

/// Writes the raw retained traces as CSV, one column per parameter.
pub fn write_traces_csv(
    path: &Path,
    traces: &IndexMap<String, Vec<f64>>,
) -> Result<(), ItcError> {
    let csv_err = |code: &str, err: &dyn ToString| {
        ItcError::Serde(
            ErrorInfo::new(code, err.to_string())
                .with_context("path", path.display().to_string()),
        )
    };
    let mut writer = csv::Writer::from_path(path).map_err(|err| csv_err("traces-open", &err))?;
    let names: Vec<&String> = traces.keys().collect();
    writer
        .write_record(&names)
        .map_err(|err| csv_err("traces-header", &err))?;
    let rows = traces.values().next().map_or(0, Vec::len);
    for row in 0..rows {
        let record: Vec<String> = traces
            .values()
            .map(|trace| trace[row].to_string())
            .collect();
        writer
            .write_record(&record)
            .map_err(|err| csv_err("traces-row", &err))?;
    }
    writer.flush().map_err(|err| csv_err("traces-flush", &err))
}

//! Posterior trace summaries.

use indexmap::IndexMap;
use itc_core::errors::{ErrorInfo, ItcError};
use serde::{Deserialize, Serialize};

/// Summary statistics for one parameter trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    /// Parameter name.
    pub name: String,
    /// Sample mean.
    pub mean: f64,
    /// Sample standard deviation.
    pub stddev: f64,
    /// Lower interval bound.
    pub lower: f64,
    /// Upper interval bound.
    pub upper: f64,
    /// Two-sided confidence level of `lower..upper`.
    pub ci: f64,
}

/// Summarizes a trace with an empirical interval.
///
/// Bounds are order statistics of the sorted trace at ranks
/// `round((0.5 -+ ci/2) * n)`, not a Gaussian interval, so they track skewed
/// marginals faithfully.
pub fn summarize_trace(name: &str, trace: &[f64], ci: f64) -> Result<TraceSummary, ItcError> {
    if trace.is_empty() {
        return Err(ItcError::Sampler(
            ErrorInfo::new("empty-trace", "cannot summarize an empty trace")
                .with_context("parameter", name.to_string()),
        ));
    }
    if !(0.0..1.0).contains(&ci) {
        return Err(ItcError::Sampler(
            ErrorInfo::new("invalid-ci", "confidence level must lie in [0, 1)")
                .with_context("ci", ci.to_string()),
        ));
    }

    let n = trace.len();
    let mean = trace.iter().sum::<f64>() / n as f64;
    let variance = trace.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;

    let mut sorted = trace.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = |p: f64| -> usize {
        ((p * n as f64).round() as usize).min(n - 1)
    };
    let lower = sorted[rank(0.5 - ci / 2.0)];
    let upper = sorted[rank(0.5 + ci / 2.0)];

    Ok(TraceSummary {
        name: name.to_string(),
        mean,
        stddev: variance.sqrt(),
        lower,
        upper,
        ci,
    })
}

/// Summarizes every trace of a sampling run, preserving parameter order.
pub fn summarize_traces(
    traces: &IndexMap<String, Vec<f64>>,
    ci: f64,
) -> Result<Vec<TraceSummary>, ItcError> {
    traces
        .iter()
        .map(|(name, trace)| summarize_trace(name, trace, ci))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_bounds_are_order_statistics() {
        // 0, 1, ..., 999: the interval ranks are exact.
        let trace: Vec<f64> = (0..1000).map(f64::from).collect();
        let summary = summarize_trace("DeltaG", &trace, 0.95).unwrap();
        assert_eq!(summary.lower, 25.0);
        assert_eq!(summary.upper, 975.0);
        assert!((summary.mean - 499.5).abs() < 1e-9);
    }

    #[test]
    fn skewed_traces_get_asymmetric_intervals() {
        let trace: Vec<f64> = (0..1000).map(|i| (f64::from(i) / 100.0).exp()).collect();
        let summary = summarize_trace("Ka", &trace, 0.9).unwrap();
        // Mean sits far above the median for a log-convex trace.
        let median = summarize_trace("Ka", &trace, 0.0).unwrap().lower;
        assert!(summary.mean > median);
        assert!(summary.upper - summary.mean > summary.mean - summary.lower);
    }

    #[test]
    fn empty_trace_is_an_error() {
        let err = summarize_trace("DeltaH", &[], 0.95).unwrap_err();
        assert_eq!(err.info().code, "empty-trace");
    }

    #[test]
    fn singleton_trace_clamps_both_bounds() {
        let summary = summarize_trace("P0", &[0.25], 0.95).unwrap();
        assert_eq!(summary.lower, 0.25);
        assert_eq!(summary.upper, 0.25);
        assert_eq!(summary.stddev, 0.0);
    }
}

//! End-to-end analysis entry points.

use itc_core::errors::ItcError;
use tracing::{error, info};

use crate::analysis::{summarize_traces, TraceSummary};
use crate::checkpoint::CheckpointPayload;
use crate::config::AnalysisConfig;
use crate::experiment::Titration;
use crate::map::{map_fit, MapFit, MapOptions};
use crate::model::{BindingModel, SingleSiteModel};
use crate::sampler::{Sampler, SamplerOutcome};

/// Everything produced by analyzing one titration.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Experiment name the outcome belongs to.
    pub experiment: String,
    /// Model name used for the fit.
    pub model: String,
    /// The MAP fit that seeded the chain; `None` when the chain was resumed
    /// from a checkpoint and no fit ran in this process.
    pub map: Option<MapFit>,
    /// Sampler traces and acceptance statistics.
    pub sampler: SamplerOutcome,
    /// Interval summaries of the raw traces, in parameter order.
    pub summaries: Vec<TraceSummary>,
}

/// Fits and samples an explicit model.
pub fn analyze_model(
    model: &dyn BindingModel,
    experiment: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisOutcome, ItcError> {
    analyze_model_with_observer(model, experiment, config, |_| {})
}

/// Like [`analyze_model`], reporting each completed sampling iteration to
/// `observer` (used for progress display).
pub fn analyze_model_with_observer(
    model: &dyn BindingModel,
    experiment: &str,
    config: &AnalysisConfig,
    observer: impl FnMut(usize),
) -> Result<AnalysisOutcome, ItcError> {
    let options = MapOptions {
        max_iterations: config.nfit,
        ..MapOptions::default()
    };
    let map = map_fit(model, &options)?;
    info!(
        experiment,
        model = model.name(),
        log_posterior = map.log_posterior,
        converged = map.converged,
        "MAP fit complete"
    );

    let mut sampler = Sampler::new(model, config, map.values.clone())?;
    let outcome = sampler.run_with_observer(observer)?;
    let summaries = summarize_traces(&outcome.traces, config.ci)?;
    Ok(AnalysisOutcome {
        experiment: experiment.to_string(),
        model: model.name().to_string(),
        map: Some(map),
        sampler: outcome,
        summaries,
    })
}

/// Continues a checkpointed chain to completion and summarizes it.
///
/// No MAP fit runs here; the outcome records that with `map: None`.
pub fn resume_analysis(
    model: &dyn BindingModel,
    experiment: &str,
    payload: CheckpointPayload,
) -> Result<AnalysisOutcome, ItcError> {
    resume_analysis_with_observer(model, experiment, payload, |_| {})
}

/// Like [`resume_analysis`], reporting each completed sampling iteration to
/// `observer`.
pub fn resume_analysis_with_observer(
    model: &dyn BindingModel,
    experiment: &str,
    payload: CheckpointPayload,
    observer: impl FnMut(usize),
) -> Result<AnalysisOutcome, ItcError> {
    let ci = payload.config.ci;
    info!(
        experiment,
        model = model.name(),
        iteration = payload.iteration,
        "resuming from checkpoint"
    );
    let mut sampler = Sampler::resume(model, payload)?;
    let outcome = sampler.run_with_observer(observer)?;
    let summaries = summarize_traces(&outcome.traces, ci)?;
    Ok(AnalysisOutcome {
        experiment: experiment.to_string(),
        model: model.name().to_string(),
        map: None,
        sampler: outcome,
        summaries,
    })
}

/// Builds a single-site model for the titration and analyzes it.
pub fn analyze(titration: &Titration, config: &AnalysisConfig) -> Result<AnalysisOutcome, ItcError> {
    let model = SingleSiteModel::new(titration)?;
    analyze_model(&model, &titration.name, config)
}

/// Analyzes a batch of titrations with single-site models.
///
/// A failure is fatal for its own titration only; the remaining experiments
/// still run, and the per-experiment results are returned in input order.
pub fn analyze_all(
    titrations: &[Titration],
    config: &AnalysisConfig,
) -> Vec<(String, Result<AnalysisOutcome, ItcError>)> {
    titrations
        .iter()
        .map(|titration| {
            let result = analyze(titration, config);
            if let Err(err) = &result {
                error!(
                    experiment = titration.name.as_str(),
                    %err,
                    "analysis failed; continuing with the remaining experiments"
                );
            }
            (titration.name.clone(), result)
        })
        .collect()
}

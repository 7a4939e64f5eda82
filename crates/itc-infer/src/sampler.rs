//! Component-wise Metropolis-Hastings sampling of a binding posterior.

use std::path::PathBuf;

use indexmap::IndexMap;
use itc_core::errors::{ErrorInfo, ItcError};
use itc_core::rng::RngHandle;
use rand::Rng;
use rand_distr::StandardNormal;
use tracing::{debug, info};

use crate::checkpoint::{
    checkpoint_path, enforce_retention, existing_checkpoints, CheckpointPayload,
};
use crate::config::AnalysisConfig;
use crate::model::{log_posterior, BindingModel};

/// Result of a completed sampling run.
#[derive(Debug, Clone)]
pub struct SamplerOutcome {
    /// Retained (thinned, post-burn-in) samples per parameter, in parameter
    /// order.
    pub traces: IndexMap<String, Vec<f64>>,
    /// Per-parameter acceptance rate over the post-burn-in iterations.
    pub acceptance: Vec<f64>,
    /// Total iterations completed, including burn-in.
    pub iterations: usize,
    /// Parameter values at the final iteration.
    pub final_values: Vec<f64>,
    /// Log posterior at the final iteration.
    pub final_log_posterior: f64,
}

/// One-parameter-at-a-time random-walk Metropolis-Hastings sampler.
///
/// Every proposal draws from `RngHandle::substream(run_seed, iteration * dim
/// + parameter)`, so a run restarted from a checkpoint replays the identical
/// chain.
pub struct Sampler<'a> {
    model: &'a dyn BindingModel,
    config: AnalysisConfig,
    run_seed: u64,
    iteration: usize,
    values: Vec<f64>,
    scales: Vec<f64>,
    current_log_posterior: f64,
    traces: IndexMap<String, Vec<f64>>,
    accepted: Vec<usize>,
    proposed: Vec<usize>,
    checkpoints: Vec<PathBuf>,
}

impl std::fmt::Debug for Sampler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("model", &self.model.name())
            .field("config", &self.config)
            .field("run_seed", &self.run_seed)
            .field("iteration", &self.iteration)
            .field("values", &self.values)
            .field("scales", &self.scales)
            .field("current_log_posterior", &self.current_log_posterior)
            .field("accepted", &self.accepted)
            .field("proposed", &self.proposed)
            .field("checkpoints", &self.checkpoints)
            .finish_non_exhaustive()
    }
}

impl<'a> Sampler<'a> {
    /// Creates a sampler positioned at `start` (usually the MAP estimate).
    pub fn new(
        model: &'a dyn BindingModel,
        config: &AnalysisConfig,
        start: Vec<f64>,
    ) -> Result<Self, ItcError> {
        let dim = model.parameters().len();
        if start.len() != dim {
            return Err(ItcError::Sampler(
                ErrorInfo::new("start-dimension-mismatch", "start vector length != parameters")
                    .with_context("expected", dim.to_string())
                    .with_context("got", start.len().to_string()),
            ));
        }
        if config.thinning == 0 || config.iterations == 0 {
            return Err(ItcError::Sampler(
                ErrorInfo::new(
                    "invalid-sampler-config",
                    "iterations and thinning must be positive",
                )
                .with_context("iterations", config.iterations.to_string())
                .with_context("thinning", config.thinning.to_string()),
            ));
        }
        if config.burn_in >= config.iterations {
            return Err(ItcError::Sampler(
                ErrorInfo::new("invalid-sampler-config", "burn-in consumes the whole run")
                    .with_context("iterations", config.iterations.to_string())
                    .with_context("burn_in", config.burn_in.to_string()),
            ));
        }
        let current_log_posterior = log_posterior(model, &start)?;
        if !current_log_posterior.is_finite() {
            return Err(ItcError::Sampler(
                ErrorInfo::new(
                    "invalid-start",
                    "the starting point has zero posterior density",
                )
                .with_hint("run a MAP fit first or adjust the initial values"),
            ));
        }
        let scales = model
            .parameters()
            .iter()
            .zip(&start)
            .map(|(p, &v)| p.prior.characteristic_scale(v))
            .collect();
        let traces = model
            .parameters()
            .iter()
            .map(|p| (p.name.clone(), Vec::new()))
            .collect();
        Ok(Self {
            model,
            config: config.clone(),
            run_seed: config.seed_policy.run_seed(),
            iteration: 0,
            values: start,
            scales,
            current_log_posterior,
            traces,
            accepted: vec![0; dim],
            proposed: vec![0; dim],
            checkpoints: Vec::new(),
        })
    }

    /// Rebuilds a sampler from a checkpoint payload.
    pub fn resume(
        model: &'a dyn BindingModel,
        payload: CheckpointPayload,
    ) -> Result<Self, ItcError> {
        let names: Vec<&str> = model.parameters().iter().map(|p| p.name.as_str()).collect();
        if payload.names != names {
            return Err(ItcError::Sampler(
                ErrorInfo::new(
                    "checkpoint-mismatch",
                    "checkpoint parameter names do not match the model",
                )
                .with_context("model", model.name().to_string())
                .with_context("checkpoint", payload.names.join(",")),
            ));
        }
        let current_log_posterior = log_posterior(model, &payload.values)?;
        if !current_log_posterior.is_finite() {
            return Err(ItcError::Sampler(ErrorInfo::new(
                "corrupt-checkpoint",
                "checkpointed state has zero posterior density",
            )));
        }
        // Retention must account for files an earlier run already wrote.
        let checkpoints = match &payload.config.checkpoint.directory {
            Some(directory) => existing_checkpoints(directory)?,
            None => Vec::new(),
        };
        Ok(Self {
            model,
            config: payload.config.clone(),
            run_seed: payload.config.seed_policy.run_seed(),
            iteration: payload.iteration,
            values: payload.values,
            scales: payload.scales,
            current_log_posterior,
            traces: payload.traces,
            accepted: payload.accepted,
            proposed: payload.proposed,
            checkpoints,
        })
    }

    /// Runs the chain to completion.
    pub fn run(&mut self) -> Result<SamplerOutcome, ItcError> {
        self.run_with_observer(|_| {})
    }

    /// Runs the chain, invoking `observer` with the iteration number after
    /// each completed iteration.
    pub fn run_with_observer(
        &mut self,
        mut observer: impl FnMut(usize),
    ) -> Result<SamplerOutcome, ItcError> {
        let dim = self.model.parameters().len();
        info!(
            model = self.model.name(),
            iterations = self.config.iterations,
            burn_in = self.config.burn_in,
            thinning = self.config.thinning,
            start = self.iteration,
            "sampling"
        );
        while self.iteration < self.config.iterations {
            let iteration = self.iteration;
            if iteration == self.config.burn_in {
                // Reported acceptance covers the fixed post-burn-in kernel
                // only, not the adaptation tail.
                self.accepted.fill(0);
                self.proposed.fill(0);
            }
            for parameter in 0..dim {
                self.step(iteration, parameter)?;
            }

            let in_burn_in = iteration < self.config.burn_in;
            if in_burn_in
                && self.config.adapt_interval > 0
                && (iteration + 1) % self.config.adapt_interval == 0
            {
                self.adapt();
            }
            if !in_burn_in && (iteration - self.config.burn_in) % self.config.thinning == 0 {
                for (trace, &value) in self.traces.values_mut().zip(&self.values) {
                    trace.push(value);
                }
            }

            self.iteration += 1;
            self.maybe_checkpoint()?;
            observer(self.iteration);
        }

        let acceptance = self
            .accepted
            .iter()
            .zip(&self.proposed)
            .map(|(&a, &p)| if p == 0 { 0.0 } else { a as f64 / p as f64 })
            .collect();
        Ok(SamplerOutcome {
            traces: self.traces.clone(),
            acceptance,
            iterations: self.iteration,
            final_values: self.values.clone(),
            final_log_posterior: self.current_log_posterior,
        })
    }

    fn step(&mut self, iteration: usize, parameter: usize) -> Result<(), ItcError> {
        let dim = self.model.parameters().len();
        let substream = (iteration * dim + parameter) as u64;
        let mut rng = RngHandle::substream(self.run_seed, substream);

        let step: f64 = rng.sample(StandardNormal);
        let mut proposal = self.values.clone();
        proposal[parameter] += self.scales[parameter] * step;

        self.proposed[parameter] += 1;
        let proposal_log_posterior = log_posterior(self.model, &proposal)?;
        let threshold: f64 = rng.gen::<f64>().ln();
        if proposal_log_posterior - self.current_log_posterior > threshold {
            self.values = proposal;
            self.current_log_posterior = proposal_log_posterior;
            self.accepted[parameter] += 1;
        }
        Ok(())
    }

    /// Nudges proposal scales toward a 0.3..0.5 acceptance band. Burn-in only,
    /// so the post-burn-in kernel is fixed and the chain stays Markovian.
    fn adapt(&mut self) {
        for parameter in 0..self.scales.len() {
            if self.proposed[parameter] == 0 {
                continue;
            }
            let rate = self.accepted[parameter] as f64 / self.proposed[parameter] as f64;
            if rate < 0.3 {
                self.scales[parameter] *= 0.8;
            } else if rate > 0.5 {
                self.scales[parameter] *= 1.25;
            }
            debug!(
                parameter = self.model.parameters()[parameter].name.as_str(),
                rate,
                scale = self.scales[parameter],
                "proposal scale adapted"
            );
            self.accepted[parameter] = 0;
            self.proposed[parameter] = 0;
        }
    }

    fn maybe_checkpoint(&mut self) -> Result<(), ItcError> {
        let interval = self.config.checkpoint.interval;
        if interval == 0 || self.iteration % interval != 0 {
            return Ok(());
        }
        let Some(directory) = self.config.checkpoint.directory.clone() else {
            return Ok(());
        };
        let payload = CheckpointPayload {
            iteration: self.iteration,
            config: self.config.clone(),
            master_seed: self.config.seed_policy.master_seed,
            names: self
                .model
                .parameters()
                .iter()
                .map(|p| p.name.clone())
                .collect(),
            values: self.values.clone(),
            scales: self.scales.clone(),
            traces: self.traces.clone(),
            accepted: self.accepted.clone(),
            proposed: self.proposed.clone(),
        };
        let path = checkpoint_path(&directory, self.iteration);
        payload.store(&path)?;
        // An overwritten file moves to the back of the retention order.
        self.checkpoints.retain(|existing| existing != &path);
        self.checkpoints.push(path);
        enforce_retention(&mut self.checkpoints, self.config.checkpoint.max_to_keep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priors::{Parameter, Prior};

    /// Standard normal target expressed through the model interface.
    struct GaussianTarget {
        parameters: Vec<Parameter>,
        heats: Vec<f64>,
        durations: Vec<f64>,
    }

    impl GaussianTarget {
        fn new() -> Self {
            Self {
                parameters: vec![
                    Parameter::new(
                        "x",
                        Prior::Uniform {
                            lower: -50.0,
                            upper: 50.0,
                        },
                        0.0,
                    ),
                    Parameter::new(
                        "log_sigma",
                        Prior::Uniform {
                            lower: -1e-9,
                            upper: 1e-9,
                        },
                        0.0,
                    ),
                ],
                heats: vec![0.0],
                durations: vec![1.0],
            }
        }
    }

    impl BindingModel for GaussianTarget {
        fn name(&self) -> &str {
            "gaussian-target"
        }
        fn parameters(&self) -> &[Parameter] {
            &self.parameters
        }
        fn observed_heats(&self) -> &[f64] {
            &self.heats
        }
        fn durations(&self) -> &[f64] {
            &self.durations
        }
        fn expected_heats(&self, values: &[f64]) -> Result<Vec<f64>, ItcError> {
            Ok(vec![values[0]])
        }
    }

    fn config(iterations: usize) -> AnalysisConfig {
        AnalysisConfig {
            iterations,
            burn_in: iterations / 5,
            thinning: 2,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn runs_are_reproducible() {
        let target = GaussianTarget::new();
        let cfg = config(500);
        let first = Sampler::new(&target, &cfg, vec![0.0, 0.0])
            .unwrap()
            .run()
            .unwrap();
        let second = Sampler::new(&target, &cfg, vec![0.0, 0.0])
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(first.traces["x"], second.traces["x"]);
        assert_eq!(first.final_values, second.final_values);
    }

    #[test]
    fn trace_length_matches_retention_schedule() {
        let target = GaussianTarget::new();
        let cfg = config(500);
        let outcome = Sampler::new(&target, &cfg, vec![0.0, 0.0])
            .unwrap()
            .run()
            .unwrap();
        // Iterations 100..499 retained every 2nd: ceil(400 / 2).
        assert_eq!(outcome.traces["x"].len(), 200);
    }

    #[test]
    fn chain_explores_the_gaussian_target() {
        let target = GaussianTarget::new();
        let cfg = config(4_000);
        let outcome = Sampler::new(&target, &cfg, vec![3.0, 0.0])
            .unwrap()
            .run()
            .unwrap();
        let trace = &outcome.traces["x"];
        let mean = trace.iter().sum::<f64>() / trace.len() as f64;
        let var = trace.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / trace.len() as f64;
        assert!(mean.abs() < 0.3, "mean {mean}");
        assert!((0.5..2.0).contains(&var), "variance {var}");
    }

    #[test]
    fn zero_density_start_is_rejected() {
        let target = GaussianTarget::new();
        let err = Sampler::new(&target, &config(100), vec![60.0, 0.0]).unwrap_err();
        assert_eq!(err.info().code, "invalid-start");
    }

    #[test]
    fn burn_in_must_leave_sampling_iterations() {
        let target = GaussianTarget::new();
        let cfg = AnalysisConfig {
            iterations: 100,
            burn_in: 100,
            ..AnalysisConfig::default()
        };
        let err = Sampler::new(&target, &cfg, vec![0.0, 0.0]).unwrap_err();
        assert_eq!(err.info().code, "invalid-sampler-config");
    }
}

//! Inference run configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// YAML-configurable parameters governing one inference run.
///
/// Passed explicitly into the driver; there is no process-global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Iteration budget for the MAP fit preceding sampling.
    #[serde(default = "default_nfit")]
    pub nfit: usize,
    /// Total number of MCMC iterations to execute.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Number of initial iterations discarded as burn-in.
    #[serde(default = "default_burn_in")]
    pub burn_in: usize,
    /// Stride at which post-burn-in samples are retained.
    #[serde(default = "default_thinning")]
    pub thinning: usize,
    /// Two-sided confidence level for interval summaries.
    #[serde(default = "default_ci")]
    pub ci: f64,
    /// Iterations between proposal-scale adaptations (burn-in only).
    #[serde(default = "default_adapt_interval")]
    pub adapt_interval: usize,
    /// Checkpointing behaviour.
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    /// Master seed and substream policy.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
}

fn default_nfit() -> usize {
    5_000
}

fn default_iterations() -> usize {
    10_000
}

fn default_burn_in() -> usize {
    1_000
}

fn default_thinning() -> usize {
    10
}

fn default_ci() -> f64 {
    0.95
}

fn default_adapt_interval() -> usize {
    100
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            nfit: default_nfit(),
            iterations: default_iterations(),
            burn_in: default_burn_in(),
            thinning: default_thinning(),
            ci: default_ci(),
            adapt_interval: default_adapt_interval(),
            checkpoint: CheckpointConfig::default(),
            seed_policy: SeedPolicy::default(),
        }
    }
}

/// Checkpointing configuration.
///
/// Checkpoints are written between iterations only; a half-updated parameter
/// vector is never observable on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Interval in iterations between checkpoint writes (0 disables them).
    #[serde(default)]
    pub interval: usize,
    /// Directory where checkpoints are stored.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Maximum number of checkpoint files to retain.
    #[serde(default = "default_checkpoint_retention")]
    pub max_to_keep: usize,
}

fn default_checkpoint_retention() -> usize {
    4
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            interval: 0,
            directory: None,
            max_to_keep: default_checkpoint_retention(),
        }
    }
}

/// Deterministic seeding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed used for the run.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Optional run label mixed into the seed, so repeat runs of one master
    /// seed can draw decorrelated chains.
    #[serde(default)]
    pub label: Option<String>,
}

impl SeedPolicy {
    /// Seed the sampler derives its proposal substreams from.
    pub fn run_seed(&self) -> u64 {
        match &self.label {
            Some(label) => itc_core::rng::derive_labelled_seed(self.master_seed, label),
            None => self.master_seed,
        }
    }
}

fn default_master_seed() -> u64 {
    0x17C0_BA7E_5EED_u64
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            label: None,
        }
    }
}

#![deny(missing_docs)]

//! Bayesian analysis of isothermal titration calorimetry data: binding
//! models, a MAP fit, and a deterministic Metropolis-Hastings sampler with
//! checkpointing and empirical interval summaries.

/// Posterior trace summaries.
pub mod analysis;
/// Checkpoint serialization helpers and payload structures.
pub mod checkpoint;
/// Competitive multi-ligand binding model.
pub mod competitive;
/// YAML configuration schema and defaults.
pub mod config;
/// End-to-end analysis entry points.
pub mod driver;
/// Observed titration data and heat-table loading.
pub mod experiment;
/// Calorimeter descriptions.
pub mod instruments;
/// MAP fitting via the Nelder-Mead simplex.
pub mod map;
/// Binding models and the shared log-posterior.
pub mod model;
/// Prior distributions and named parameters.
pub mod priors;
/// Interval reports and trace export.
pub mod report;
/// Metropolis-Hastings sampling kernel.
pub mod sampler;

pub use analysis::{summarize_trace, summarize_traces, TraceSummary};
pub use checkpoint::{checkpoint_path, CheckpointPayload};
pub use competitive::{CompetitiveModel, CompetitiveSpecies};
pub use config::{AnalysisConfig, CheckpointConfig, SeedPolicy};
pub use driver::{analyze, analyze_all, analyze_model, resume_analysis, AnalysisOutcome};
pub use experiment::{read_integrated_heats, Injection, Titration};
pub use instruments::{instrument_by_id, known_instruments, Instrument};
pub use map::{map_fit, MapFit, MapOptions};
pub use model::{log_posterior, BindingModel, SingleSiteModel};
pub use sampler::{Sampler, SamplerOutcome};

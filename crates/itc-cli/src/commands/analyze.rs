use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use itc_core::units::{self, Quantity};
use itc_infer::checkpoint::CheckpointPayload;
use itc_infer::driver::{analyze_model_with_observer, resume_analysis_with_observer};
use itc_infer::report::{write_report, write_traces_csv};
use itc_infer::{
    instrument_by_id, read_integrated_heats, AnalysisConfig, AnalysisOutcome, BindingModel,
    CompetitiveModel, CompetitiveSpecies, SingleSiteModel, Titration,
};
use serde_json::json;
use tracing::{error, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModelKind {
    /// One ligand binding a single host site.
    SingleSite,
    /// Several ligand species competing for one host site.
    Competitive,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Integrated-heats CSV files (`volume_ul,heat_ucal,time_s`), one per
    /// experiment; the file stem names the experiment.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
    /// Output directory for reports and traces.
    #[arg(long)]
    pub out: PathBuf,
    /// Optional YAML analysis configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Calorimeter the data came from.
    #[arg(long, default_value = "auto-itc200")]
    pub instrument: String,
    /// Binding model to fit.
    #[arg(long, value_enum, default_value_t = ModelKind::SingleSite)]
    pub model: ModelKind,
    /// Ligand species for the competitive model, `NAME=DG,DH` with initial
    /// guesses in kcal/mol. Repeat the flag once per species.
    #[arg(long = "species", value_parser = parse_species)]
    pub species: Vec<CompetitiveSpecies>,
    /// Stated cell concentration in millimolar.
    #[arg(long = "cell-mm")]
    pub cell_mm: f64,
    /// Stated syringe concentration in millimolar.
    #[arg(long = "syringe-mm")]
    pub syringe_mm: f64,
    /// Directory for sampler checkpoints (enables checkpointing).
    #[arg(long)]
    pub checkpoint_dir: Option<PathBuf>,
    /// Iterations between checkpoints.
    #[arg(long, default_value_t = 1000)]
    pub checkpoint_interval: usize,
    /// Resume sampling from a checkpoint payload (single input only).
    #[arg(long)]
    pub resume: Option<PathBuf>,
}

pub fn run(args: &AnalyzeArgs) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(&args.out)?;
    let mut config: AnalysisConfig = match &args.config {
        Some(path) => serde_yaml::from_str(&fs::read_to_string(path)?)?,
        None => AnalysisConfig::default(),
    };
    if let Some(dir) = &args.checkpoint_dir {
        config.checkpoint.directory = Some(dir.clone());
        config.checkpoint.interval = args.checkpoint_interval;
    }

    let instrument = instrument_by_id(&args.instrument)?;
    let mut titrations = Vec::new();
    for input in &args.inputs {
        let name = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());
        let injections = read_integrated_heats(input)?;
        titrations.push(Titration::new(
            name,
            injections,
            instrument.cell_volume,
            Some(Quantity::new(args.cell_mm, units::MILLIMOLAR)),
            Some(Quantity::new(args.syringe_mm, units::MILLIMOLAR)),
            instrument.temperature_k,
        )?);
    }

    if let Some(payload_path) = &args.resume {
        if titrations.len() != 1 {
            return Err("--resume requires exactly one input".into());
        }
        let model = build_model(&titrations[0], args.model, &args.species)?;
        return resume_run(&titrations[0], model.as_ref(), payload_path, &args.out);
    }

    let mut failures = 0usize;
    for titration in &titrations {
        match analyze_one(titration, args.model, &args.species, &config, &args.out) {
            Ok(()) => {}
            Err(err) => {
                failures += 1;
                error!(
                    experiment = titration.name.as_str(),
                    %err,
                    "analysis failed; continuing with the remaining experiments"
                );
            }
        }
    }
    if failures == titrations.len() {
        return Err("every analysis failed".into());
    }
    Ok(())
}

fn progress_bar(total: usize, name: &str) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("{prefix} [{bar:40}] {pos}/{len} {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_prefix(name.to_string());
    bar
}

fn build_model(
    titration: &Titration,
    kind: ModelKind,
    species: &[CompetitiveSpecies],
) -> Result<Box<dyn BindingModel>, Box<dyn Error>> {
    match kind {
        ModelKind::SingleSite => Ok(Box::new(SingleSiteModel::new(titration)?)),
        ModelKind::Competitive => Ok(Box::new(CompetitiveModel::new(titration, species)?)),
    }
}

fn parse_species(raw: &str) -> Result<CompetitiveSpecies, String> {
    let malformed = || format!("expected NAME=DG,DH, got `{raw}`");
    let (name, guesses) = raw.split_once('=').ok_or_else(malformed)?;
    let (delta_g, delta_h) = guesses.split_once(',').ok_or_else(malformed)?;
    if name.is_empty() {
        return Err(malformed());
    }
    Ok(CompetitiveSpecies {
        name: name.to_string(),
        delta_g_guess: delta_g.trim().parse().map_err(|_| malformed())?,
        delta_h_guess: delta_h.trim().parse().map_err(|_| malformed())?,
    })
}

fn analyze_one(
    titration: &Titration,
    kind: ModelKind,
    species: &[CompetitiveSpecies],
    config: &AnalysisConfig,
    out: &Path,
) -> Result<(), Box<dyn Error>> {
    let model = build_model(titration, kind, species)?;
    let bar = progress_bar(config.iterations, &titration.name);
    let outcome =
        analyze_model_with_observer(model.as_ref(), &titration.name, config, |iteration| {
            bar.set_position(iteration as u64)
        })?;
    bar.finish_and_clear();
    write_outputs(&outcome, config.ci, out)
}

fn resume_run(
    titration: &Titration,
    model: &dyn BindingModel,
    payload_path: &Path,
    out: &Path,
) -> Result<(), Box<dyn Error>> {
    let payload = CheckpointPayload::load(payload_path)?;
    let ci = payload.config.ci;
    let total = payload.config.iterations;

    let bar = progress_bar(total, &titration.name);
    let outcome =
        resume_analysis_with_observer(model, &titration.name, payload, |iteration| {
            bar.set_position(iteration as u64)
        })?;
    bar.finish_and_clear();
    write_outputs(&outcome, ci, out)
}

fn write_outputs(outcome: &AnalysisOutcome, ci: f64, out: &Path) -> Result<(), Box<dyn Error>> {
    let report_path = out.join(format!("{}.confidence-intervals.out", outcome.experiment));
    write_report(
        &report_path,
        &outcome.experiment,
        &outcome.model,
        &outcome.sampler.traces,
        ci,
    )?;
    write_traces_csv(
        &out.join(format!("{}.traces.csv", outcome.experiment)),
        &outcome.sampler.traces,
    )?;

    // A resumed chain has no MAP fit in this process; the summary says so
    // instead of inventing one.
    let summary = json!({
        "experiment": outcome.experiment,
        "model": outcome.model,
        "resumed": outcome.map.is_none(),
        "map_converged": outcome.map.as_ref().map(|fit| fit.converged),
        "map_log_posterior": outcome.map.as_ref().map(|fit| fit.log_posterior),
        "iterations": outcome.sampler.iterations,
        "acceptance": outcome.sampler.acceptance,
        "summaries": outcome.summaries,
    });
    fs::write(
        out.join(format!("{}.summary.json", outcome.experiment)),
        serde_json::to_string_pretty(&summary)?,
    )?;
    info!(
        experiment = outcome.experiment.as_str(),
        report = %report_path.display(),
        "analysis written"
    );
    Ok(())
}

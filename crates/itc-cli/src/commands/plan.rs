use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use itc_plan::worklist::{write_run_sheet, write_worklist};
use itc_plan::{build_plan, PlanSpec, PlannerConfig};
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// YAML plan specification; omitted, the built-in host-guest example is
    /// planned.
    #[arg(long)]
    pub spec: Option<PathBuf>,
    /// Output directory for the worklist, run sheet, and plan snapshot.
    #[arg(long)]
    pub out: PathBuf,
    /// Base name for the emitted files.
    #[arg(long, default_value = "host-guest-itc")]
    pub name: String,
}

pub fn run(args: &PlanArgs) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(&args.out)?;
    let spec: PlanSpec = match &args.spec {
        Some(path) => serde_yaml::from_str(&fs::read_to_string(path)?)?,
        None => PlanSpec::example(),
    };

    let (set, report) = build_plan(&spec, &PlannerConfig::default())?;
    for name in &report.flagged {
        warn!(
            experiment = name.as_str(),
            "experiment is infeasible; it stays in the worklist flagged for review"
        );
    }

    let worklist_path = args.out.join(format!("{}.gwl", args.name));
    let sheet_path = args.out.join(format!("{}.csv", args.name));
    write_worklist(&set, &report, &worklist_path)?;
    write_run_sheet(&set, &report, &sheet_path)?;

    // Snapshot of the solved plan for later inspection or analysis pairing.
    let plan_path = args.out.join(format!("{}.plan.json", args.name));
    fs::write(&plan_path, serde_json::to_string_pretty(&set)?)?;

    info!(
        experiments = set.experiments.len(),
        flagged = report.flagged.len(),
        out = %args.out.display(),
        "plan written"
    );
    Ok(())
}

use std::error::Error;

use clap::{ArgAction, Parser, Subcommand};

use commands::{
    analyze::{self, AnalyzeArgs},
    ka::{self, KaArgs},
    plan::{self, PlanArgs},
};

mod commands;
mod logging;

#[derive(Parser, Debug)]
#[command(name = "itc", about = "ITC experiment planning and Bayesian analysis")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve concentrations for a host-guest plan and emit worklists.
    Plan(PlanArgs),
    /// Fit binding models to integrated heats and report intervals.
    Analyze(AnalyzeArgs),
    /// Convert between association constants and binding free energies.
    Ka(KaArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match cli.command {
        Command::Plan(args) => plan::run(&args),
        Command::Analyze(args) => analyze::run(&args),
        Command::Ka(args) => ka::run(&args),
    }
}

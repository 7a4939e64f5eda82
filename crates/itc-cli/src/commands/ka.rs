use std::error::Error;

use clap::Args;
use itc_core::units::{self, Quantity};
use itc_plan::thermo::{delta_g_from_ka, ka_from_delta_g, STANDARD_TEMPERATURE};

#[derive(Args, Debug)]
pub struct KaArgs {
    /// Binding free energy in kcal/mol to convert to Ka.
    #[arg(long = "delta-g", conflicts_with = "ka", required_unless_present = "ka")]
    pub delta_g: Option<f64>,
    /// Association constant in 1/M to convert to a free energy.
    #[arg(long)]
    pub ka: Option<f64>,
    /// Temperature in kelvin.
    #[arg(long, default_value_t = STANDARD_TEMPERATURE)]
    pub temperature: f64,
}

pub fn run(args: &KaArgs) -> Result<(), Box<dyn Error>> {
    if let Some(delta_g) = args.delta_g {
        let ka = ka_from_delta_g(
            Quantity::new(delta_g, units::KILOCALORIE_PER_MOLE),
            args.temperature,
        )?;
        println!(
            "DeltaG = {delta_g} kcal/mol  =>  Ka = {:.6e} 1/M at {} K",
            ka.value_in(units::LITER_PER_MOLE)?,
            args.temperature
        );
    }
    if let Some(ka) = args.ka {
        let delta_g = delta_g_from_ka(
            Quantity::new(ka, units::LITER_PER_MOLE),
            args.temperature,
        )?;
        println!(
            "Ka = {ka:.6e} 1/M  =>  DeltaG = {:.4} kcal/mol at {} K",
            delta_g.value_in(units::KILOCALORIE_PER_MOLE)?,
            args.temperature
        );
    }
    Ok(())
}

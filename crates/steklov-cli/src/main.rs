//! Steklov command-line driver.
//!
//! Runs the reference fluid-structure problem described by a JSON parameter
//! file:
//!
//! ```text
//! steklov params/default.json
//! RUST_LOG=debug steklov params/default.json
//! ```

mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use steklov_core::{BlockId, Field, Parameters};
use steklov_fem::FsiModel;
use steklov_solver::FsiProblem;

#[derive(Parser)]
#[command(name = "steklov")]
#[command(about = "Monolithic fluid-structure simulation with interface GMRES coupling")]
#[command(version)]
struct Cli {
    /// Path to the JSON parameter file
    parameter_file: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match run(&cli.parameter_file) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("----------------------------------------------------");
            eprintln!("Exception on processing:");
            eprintln!("{e:#}");
            eprintln!("Aborting!");
            eprintln!("----------------------------------------------------");
            ExitCode::FAILURE
        }
    }
}

fn run(path: &Path) -> Result<()> {
    let params = Parameters::load(path)
        .with_context(|| format!("failed to load parameters from {}", path.display()))?;
    log::info!("parameters loaded from {}", path.display());
    output::print_header(&params);

    let model = FsiModel::build(&params).context("failed to build the finite-element model")?;
    let x = model
        .fluid_mesh
        .x_coords(&model.interface.dofs(BlockId::Fluid, Field::All));
    let (fluid, structure, interface) = model.into_parts();

    let mut fsi = FsiProblem::new(params, fluid, structure, interface)?;
    let summary = fsi.run().context("simulation failed")?;

    output::print_interface(fsi.interface(), &x, fsi.solution(), &fsi.interface_stress());
    output::print_summary(&summary);
    Ok(())
}

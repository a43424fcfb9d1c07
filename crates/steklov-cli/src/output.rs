//! Run report printed after a simulation.

use nalgebra::DVector;
use steklov_core::{AdjointType, BlockId, BlockVector, Field, InterfaceMap, Parameters};
use steklov_solver::RunSummary;

/// Print the run header.
pub fn print_header(params: &Parameters) {
    let coupling = match params.fem.adjoint_type() {
        AdjointType::Displacement => "displacement",
        AdjointType::Velocity => "velocity",
    };
    println!(
        "FSI run: {} steps of {} ({} coupling, restart {})",
        params.time.n_time_steps, params.time.time_step, coupling, params.fem.restart
    );
    println!("==========================================");
}

/// Print the run statistics.
pub fn print_summary(summary: &RunSummary) {
    println!();
    println!("Timesteps:         {}", summary.timesteps);
    println!("Final time:        {:.6}", summary.final_time);
    println!("GMRES calls:       {}", summary.gmres_calls);
    println!("Sub-system solves: {}", summary.total_solves);
    println!("Final jump:        {:.3e}", summary.final_jump);
}

/// Print interface velocities and stress at the final time.
pub fn print_interface(
    interface: &InterfaceMap,
    x: &[f64],
    solution: &BlockVector,
    stress: &DVector<f64>,
) {
    let fluid = interface.restrict(solution, BlockId::Fluid, Field::All);
    let structure = interface.restrict(solution, BlockId::Structure, Field::Velocity);

    println!();
    println!("{:>10}  {:>14}  {:>14}  {:>14}", "x", "u_fluid", "v_structure", "stress");
    for (i, xi) in x.iter().enumerate() {
        println!(
            "{:>10.4}  {:>14.6e}  {:>14.6e}  {:>14.6e}",
            xi, fluid[i], structure[i], stress[i]
        );
    }
}

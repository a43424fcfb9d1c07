//! Interface coupling solver for Steklov.
//!
//! This crate provides:
//! - Restarted GMRES on the interface stress ([`gmres`])
//! - Cached LU factorizations of the sub-physics systems ([`factorization`])
//! - The matrix-free linearized interface operator ([`linearized`])
//! - The timestep loop of the coupled problem ([`fsi`])

pub mod factorization;
pub mod fsi;
pub mod gmres;
pub mod linearized;
pub mod operator;

pub use factorization::{SPARSE_THRESHOLD, SubSolver};
pub use fsi::{FsiProblem, INITIAL_TIMESTEP_NUMBER, RunSummary};
pub use gmres::{
    GmresConfig, GmresReport, GmresStatus, RestartCycle, SOLVES_PER_APPLY, rotmat,
    solve_coupling_gmres,
};
pub use linearized::{FactorStep, LinearizedOperator, neumann_data, solve_blocks, trace_mismatch};
pub use operator::{CouplingProblem, MatrixCoupling};

// Re-export core types for convenience
pub use steklov_core::{Error, Result};

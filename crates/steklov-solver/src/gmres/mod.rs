//! Restarted GMRES for the interface coupling equation.
//!
//! The driver works on a [`CouplingProblem`](crate::operator::CouplingProblem):
//! every operator application hides one fluid and one structure solve, so the
//! cost of the method is counted in sub-physics solves rather than in
//! matrix-vector products.
//!
//! # Module Structure
//!
//! - [`coupling`] - the restarted driver
//! - [`helpers`] - Givens rotations and back-substitution

pub mod coupling;
pub mod helpers;

pub use coupling::{SOLVES_PER_APPLY, solve_coupling_gmres};
pub use helpers::{back_substitute, rotate, rotmat};

/// GMRES configuration.
#[derive(Debug, Clone)]
pub struct GmresConfig {
    /// Maximum number of outer (restart) iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the relative interface residual.
    pub tol: f64,
    /// Krylov subspace dimension between restarts.
    pub restart: usize,
}

impl Default for GmresConfig {
    fn default() -> Self {
        Self {
            max_iter: 50,
            tol: 1e-8,
            restart: 3,
        }
    }
}

impl GmresConfig {
    /// Set the outer iteration cap.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the relative tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the restart length.
    pub fn with_restart(mut self, restart: usize) -> Self {
        self.restart = restart;
        self
    }
}

/// Outcome of a GMRES call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GmresStatus {
    /// The relative residual dropped below the tolerance.
    Converged,
    /// The outer iteration cap was reached first.
    NotConverged,
}

impl GmresStatus {
    /// Integer status code: 0 on convergence, 1 otherwise.
    pub fn code(self) -> i32 {
        match self {
            GmresStatus::Converged => 0,
            GmresStatus::NotConverged => 1,
        }
    }

    pub fn is_converged(self) -> bool {
        self == GmresStatus::Converged
    }
}

/// Residual history of one restart cycle.
#[derive(Debug, Clone)]
pub struct RestartCycle {
    /// Arnoldi estimates `|s[i+1]| / ‖b‖` after each inner step.
    pub estimates: Vec<f64>,
    /// True relative residual after the cycle's update.
    pub error: f64,
}

/// Result of a GMRES call.
#[derive(Debug, Clone)]
pub struct GmresReport {
    pub status: GmresStatus,
    /// Outer iterations performed.
    pub iterations: usize,
    /// Relative residual of the initial guess.
    pub initial_error: f64,
    /// Final relative residual.
    pub error: f64,
    /// Per-restart residual history.
    pub cycles: Vec<RestartCycle>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gmres_config_default() {
        let config = GmresConfig::default();
        assert_eq!(config.max_iter, 50);
        assert!((config.tol - 1e-8).abs() < 1e-15);
        assert_eq!(config.restart, 3);
    }

    #[test]
    fn gmres_config_builders() {
        let config = GmresConfig::default()
            .with_max_iter(7)
            .with_tol(1e-4)
            .with_restart(5);
        assert_eq!(config.max_iter, 7);
        assert_eq!(config.restart, 5);
        assert!((config.tol - 1e-4).abs() < 1e-15);
    }

    #[test]
    fn status_codes() {
        assert_eq!(GmresStatus::Converged.code(), 0);
        assert_eq!(GmresStatus::NotConverged.code(), 1);
        assert!(!GmresStatus::NotConverged.is_converged());
    }
}

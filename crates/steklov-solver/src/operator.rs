//! Interface problems seen by the GMRES coupling driver.

use nalgebra::{DMatrix, DVector};
use steklov_core::{Error, Result};

/// A linear interface equation `A x = b` with a matrix-free `A`.
///
/// The driver only ever talks to the coupling through this trait, so the
/// finite-element sub-solves can be replaced by synthetic operators.
pub trait CouplingProblem {
    /// Number of interface unknowns.
    fn dim(&self) -> usize;

    /// Right-hand side `b` of the interface equation.
    fn rhs(&mut self) -> Result<DVector<f64>>;

    /// Starting iterate `x₀`.
    fn initial_guess(&mut self) -> DVector<f64>;

    /// Operator application `A x`. Counts as two sub-physics solves.
    fn apply(&mut self, x: &DVector<f64>) -> Result<DVector<f64>>;

    /// Inner product of the interface space.
    fn inner_product(&self, a: &DVector<f64>, b: &DVector<f64>) -> f64;

    /// Norm induced by [`inner_product`](Self::inner_product).
    fn norm(&self, a: &DVector<f64>) -> f64 {
        self.inner_product(a, a).max(0.0).sqrt()
    }

    /// Accept the converged solution `x` into the persistent state.
    fn commit(&mut self, x: &DVector<f64>) -> Result<()>;
}

/// Explicit-matrix interface problem.
///
/// Stands in for the fluid/structure composition in tests and benchmarks;
/// `commit` accumulates into [`stress`](Self::stress).
#[derive(Debug, Clone)]
pub struct MatrixCoupling {
    matrix: DMatrix<f64>,
    rhs: DVector<f64>,
    guess: DVector<f64>,
    weight: Option<DMatrix<f64>>,
    /// Accumulated committed solutions.
    pub stress: DVector<f64>,
    /// Number of `apply` calls made so far.
    pub applications: usize,
}

impl MatrixCoupling {
    /// Create from a square matrix and a right-hand side; starts from zero.
    pub fn new(matrix: DMatrix<f64>, rhs: DVector<f64>) -> Result<Self> {
        if !matrix.is_square() {
            return Err(Error::DimensionMismatch {
                expected: matrix.nrows(),
                actual: matrix.ncols(),
            });
        }
        if matrix.nrows() != rhs.len() {
            return Err(Error::DimensionMismatch {
                expected: matrix.nrows(),
                actual: rhs.len(),
            });
        }
        let n = rhs.len();
        Ok(Self {
            matrix,
            rhs,
            guess: DVector::zeros(n),
            weight: None,
            stress: DVector::zeros(n),
            applications: 0,
        })
    }

    /// Use `guess` as the starting iterate.
    pub fn with_initial_guess(mut self, guess: DVector<f64>) -> Self {
        self.guess = guess;
        self
    }

    /// Measure vectors with `aᵀ W b` instead of the Euclidean product.
    pub fn with_weight(mut self, weight: DMatrix<f64>) -> Self {
        self.weight = Some(weight);
        self
    }
}

impl CouplingProblem for MatrixCoupling {
    fn dim(&self) -> usize {
        self.rhs.len()
    }

    fn rhs(&mut self) -> Result<DVector<f64>> {
        Ok(self.rhs.clone())
    }

    fn initial_guess(&mut self) -> DVector<f64> {
        self.guess.clone()
    }

    fn apply(&mut self, x: &DVector<f64>) -> Result<DVector<f64>> {
        if x.len() != self.dim() {
            return Err(Error::DimensionMismatch {
                expected: self.dim(),
                actual: x.len(),
            });
        }
        self.applications += 1;
        Ok(&self.matrix * x)
    }

    fn inner_product(&self, a: &DVector<f64>, b: &DVector<f64>) -> f64 {
        match &self.weight {
            Some(w) => a.dot(&(w * b)),
            None => a.dot(b),
        }
    }

    fn commit(&mut self, x: &DVector<f64>) -> Result<()> {
        self.stress += x;
        Ok(())
    }
}

//! Cached LU factorizations of the sub-physics systems.
//!
//! Every block keeps its own [`SubSolver`]. The caller decides when the cache
//! is rebuilt:
//! 1. [`SubSolver::initialize`]: sparsity analysis + numeric factorization
//! 2. [`SubSolver::factorize`]: numeric factorization on the cached analysis
//! 3. [`SubSolver::solve`]: back-solve with the current factors
//!
//! Small systems are factorized densely with nalgebra, larger ones with faer's
//! sparse LU.

use faer::prelude::*;
use faer::sparse::linalg::solvers::{Lu, SymbolicLu};
use faer::sparse::{SparseColMat, Triplet};
use nalgebra::{DVector, Dyn, LU};
use steklov_core::{BlockId, Error, LinearSystem, Result};

/// Systems with this many or more unknowns use the sparse path.
pub const SPARSE_THRESHOLD: usize = 50;

enum Factorization {
    Dense(LU<f64, Dyn, Dyn>),
    Sparse(Lu<usize, f64>),
}

/// Symbolic analysis together with the sparsity pattern it was computed for.
struct Analysis {
    col_ptr: Vec<usize>,
    row_idx: Vec<usize>,
    symbolic: SymbolicLu<usize>,
}

/// Factorization cache for one block.
pub struct SubSolver {
    block: BlockId,
    size: usize,
    analysis: Option<Analysis>,
    factors: Option<Factorization>,
    factorizations: usize,
}

impl SubSolver {
    /// Create an empty cache for `block`.
    pub fn new(block: BlockId) -> Self {
        Self {
            block,
            size: 0,
            analysis: None,
            factors: None,
            factorizations: 0,
        }
    }

    /// Block served by this cache.
    pub fn block(&self) -> BlockId {
        self.block
    }

    /// Whether a factorization is available for [`solve`](Self::solve).
    pub fn is_factorized(&self) -> bool {
        self.factors.is_some()
    }

    /// Number of numeric factorizations performed so far.
    pub fn factorizations(&self) -> usize {
        self.factorizations
    }

    /// Drop all cached data.
    pub fn reset(&mut self) {
        self.size = 0;
        self.analysis = None;
        self.factors = None;
    }

    /// Analyze and factorize `system` from scratch.
    pub fn initialize(&mut self, system: &LinearSystem) -> Result<()> {
        self.analysis = None;
        self.factorize(system)
    }

    /// Factorize `system`, reusing the cached analysis when the sparsity
    /// pattern is unchanged.
    pub fn factorize(&mut self, system: &LinearSystem) -> Result<()> {
        if !system.has_matrix() {
            return Err(Error::Unsupported(format!(
                "factorization of a {} system assembled without a matrix",
                self.block
            )));
        }
        self.factors = None;

        let n = system.size();
        let factors = if n < SPARSE_THRESHOLD {
            self.analysis = None;
            let lu = system.to_dense().lu();
            if !lu.is_invertible() {
                return Err(Error::SingularMatrix { block: self.block });
            }
            Factorization::Dense(lu)
        } else {
            Factorization::Sparse(self.factorize_sparse(system)?)
        };

        self.size = n;
        self.factors = Some(factors);
        self.factorizations += 1;
        Ok(())
    }

    fn factorize_sparse(&mut self, system: &LinearSystem) -> Result<Lu<usize, f64>> {
        let n = system.size();
        let triplets: Vec<_> = system
            .triplets
            .iter()
            .map(|&(r, c, v)| Triplet::new(r, c, v))
            .collect();
        let mat = SparseColMat::<usize, f64>::try_new_from_triplets(n, n, &triplets)
            .map_err(|_| Error::SingularMatrix { block: self.block })?;

        let pattern = mat.symbolic();
        let reusable = self.analysis.as_ref().is_some_and(|analysis| {
            analysis.col_ptr == pattern.col_ptr() && analysis.row_idx == pattern.row_idx()
        });
        if !reusable {
            log::debug!("symbolic LU analysis of the {} block ({n} unknowns)", self.block);
            let symbolic = SymbolicLu::try_new(pattern)
                .map_err(|_| Error::SingularMatrix { block: self.block })?;
            self.analysis = Some(Analysis {
                col_ptr: pattern.col_ptr().to_vec(),
                row_idx: pattern.row_idx().to_vec(),
                symbolic,
            });
        }

        let analysis = self
            .analysis
            .as_ref()
            .ok_or(Error::FactorizationMissing(self.block))?;
        Lu::try_new_with_symbolic(analysis.symbolic.clone(), mat.as_ref())
            .map_err(|_| Error::SingularMatrix { block: self.block })
    }

    /// Solve with the cached factors.
    pub fn solve(&self, rhs: &DVector<f64>) -> Result<DVector<f64>> {
        let factors = self
            .factors
            .as_ref()
            .ok_or(Error::FactorizationMissing(self.block))?;
        if rhs.len() != self.size {
            return Err(Error::DimensionMismatch {
                expected: self.size,
                actual: rhs.len(),
            });
        }

        let x = match factors {
            Factorization::Dense(lu) => lu
                .solve(rhs)
                .ok_or(Error::SingularMatrix { block: self.block })?,
            Factorization::Sparse(lu) => {
                let b = Col::<f64>::from_fn(self.size, |i| rhs[i]);
                let x = lu.solve(&b);
                DVector::from_fn(self.size, |i, _| x[i])
            }
        };

        if x.iter().any(|v| !v.is_finite()) {
            return Err(Error::SingularMatrix { block: self.block });
        }
        Ok(x)
    }
}

impl std::fmt::Debug for SubSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.factors {
            Some(Factorization::Dense(_)) => "dense",
            Some(Factorization::Sparse(_)) => "sparse",
            None => "empty",
        };
        f.debug_struct("SubSolver")
            .field("block", &self.block)
            .field("size", &self.size)
            .field("factors", &kind)
            .field("factorizations", &self.factorizations)
            .finish()
    }
}

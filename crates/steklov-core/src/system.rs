//! Linear system container produced by the sub-physics assemblers.

use nalgebra::{DMatrix, DVector};

/// Sparse linear system `A x = b` in triplet form.
///
/// When built without a matrix only the right-hand side is meaningful; such
/// systems are solved with a factorization cached from an earlier assembly.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    size: usize,
    /// Matrix entries `(row, col, value)`. Duplicates are summed.
    pub triplets: Vec<(usize, usize, f64)>,
    rhs: DVector<f64>,
    has_matrix: bool,
}

impl LinearSystem {
    /// Create an empty system with matrix storage.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            triplets: Vec::new(),
            rhs: DVector::zeros(size),
            has_matrix: true,
        }
    }

    /// Create an empty system that only carries a right-hand side.
    pub fn rhs_only(size: usize) -> Self {
        Self {
            has_matrix: false,
            ..Self::new(size)
        }
    }

    /// Number of unknowns.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether matrix entries were assembled.
    pub fn has_matrix(&self) -> bool {
        self.has_matrix
    }

    /// Add `value` at `(row, col)`; ignored for right-hand-side-only systems.
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        if self.has_matrix {
            self.triplets.push((row, col, value));
        }
    }

    /// Add `value` to the right-hand side entry `row`.
    pub fn add_rhs(&mut self, row: usize, value: f64) {
        self.rhs[row] += value;
    }

    /// Right-hand side.
    pub fn rhs(&self) -> &DVector<f64> {
        &self.rhs
    }

    /// Mutable right-hand side.
    pub fn rhs_mut(&mut self) -> &mut DVector<f64> {
        &mut self.rhs
    }

    /// Impose Dirichlet values by row replacement.
    ///
    /// Each constrained row becomes the identity row and its right-hand side
    /// the prescribed value.
    pub fn apply_dirichlet(&mut self, constraints: &[(usize, f64)]) {
        let mut constrained = vec![false; self.size];
        for &(dof, value) in constraints {
            constrained[dof] = true;
            self.rhs[dof] = value;
        }
        if self.has_matrix {
            self.triplets.retain(|&(row, _, _)| !constrained[row]);
            for &(dof, _) in constraints {
                self.triplets.push((dof, dof, 1.0));
            }
        }
    }

    /// Swap rows and columns of the matrix entries.
    pub fn transpose_matrix(&mut self) {
        for entry in &mut self.triplets {
            *entry = (entry.1, entry.0, entry.2);
        }
    }

    /// Dense copy of the matrix.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut dense = DMatrix::zeros(self.size, self.size);
        for &(row, col, value) in &self.triplets {
            dense[(row, col)] += value;
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirichlet_rows_become_identity() {
        let mut system = LinearSystem::new(2);
        system.add(0, 0, 4.0);
        system.add(0, 1, -1.0);
        system.add(1, 0, -1.0);
        system.add(1, 1, 4.0);
        system.add_rhs(1, 3.0);

        system.apply_dirichlet(&[(0, 2.5)]);

        let dense = system.to_dense();
        assert_eq!(dense[(0, 0)], 1.0);
        assert_eq!(dense[(0, 1)], 0.0);
        assert_eq!(dense[(1, 0)], -1.0);
        assert_eq!(system.rhs()[0], 2.5);
        assert_eq!(system.rhs()[1], 3.0);
    }

    #[test]
    fn rhs_only_system_ignores_matrix_entries() {
        let mut system = LinearSystem::rhs_only(2);
        system.add(0, 0, 1.0);
        system.apply_dirichlet(&[(1, 0.0)]);

        assert!(!system.has_matrix());
        assert!(system.triplets.is_empty());
    }

    #[test]
    fn duplicate_entries_are_summed() {
        let mut system = LinearSystem::new(1);
        system.add(0, 0, 2.0);
        system.add(0, 0, 1.0);
        assert_eq!(system.to_dense()[(0, 0)], 3.0);
    }
}

//! Interface degree-of-freedom maps and the interface inner product.
//!
//! The fluid and structure meshes are conforming along the interface, so the
//! k-th interface point owns one fluid velocity DoF, one structure displacement
//! DoF and one structure velocity DoF. Interface vectors are stored compactly
//! (one entry per interface point) and weighted by the interface mass matrix
//! `M_Γ` when measured.

use nalgebra::{DMatrix, DVector};

use crate::block::{BlockId, BlockVector, Field};
use crate::error::{Error, Result};

/// Mapping between compact interface vectors and block DoF indices.
#[derive(Debug, Clone)]
pub struct InterfaceMap {
    fluid: Vec<usize>,
    structure_displacement: Vec<usize>,
    structure_velocity: Vec<usize>,
    mass: DMatrix<f64>,
}

impl InterfaceMap {
    /// Create a map from per-point DoF lists and the interface mass matrix.
    pub fn new(
        fluid: Vec<usize>,
        structure_displacement: Vec<usize>,
        structure_velocity: Vec<usize>,
        mass: DMatrix<f64>,
    ) -> Result<Self> {
        let n = fluid.len();
        for len in [
            structure_displacement.len(),
            structure_velocity.len(),
            mass.nrows(),
            mass.ncols(),
        ] {
            if len != n {
                return Err(Error::DimensionMismatch {
                    expected: n,
                    actual: len,
                });
            }
        }
        Ok(Self {
            fluid,
            structure_displacement,
            structure_velocity,
            mass,
        })
    }

    /// Number of interface points.
    pub fn dim(&self) -> usize {
        self.fluid.len()
    }

    /// Interface mass matrix `M_Γ`.
    pub fn mass(&self) -> &DMatrix<f64> {
        &self.mass
    }

    /// DoF indices of `block` selected by `field`.
    ///
    /// The fluid block has a single interface field, so `field` is ignored
    /// there. `Field::All` on the structure yields displacement slots followed
    /// by velocity slots.
    pub fn dofs(&self, block: BlockId, field: Field) -> Vec<usize> {
        match (block, field) {
            (BlockId::Fluid, _) => self.fluid.clone(),
            (BlockId::Structure, Field::Displacement) => self.structure_displacement.clone(),
            (BlockId::Structure, Field::Velocity) => self.structure_velocity.clone(),
            (BlockId::Structure, Field::All) => self
                .structure_displacement
                .iter()
                .chain(self.structure_velocity.iter())
                .copied()
                .collect(),
        }
    }

    /// Gather the interface values of `block` into a compact vector.
    pub fn restrict(&self, v: &BlockVector, block: BlockId, field: Field) -> DVector<f64> {
        let source = v.block(block);
        let dofs = self.dofs(block, field);
        DVector::from_iterator(dofs.len(), dofs.iter().map(|&i| source[i]))
    }

    /// Overwrite the interface slots of `block` with the compact vector `x`.
    pub fn extend(
        &self,
        x: &DVector<f64>,
        dst: &mut BlockVector,
        block: BlockId,
        field: Field,
    ) -> Result<()> {
        let dofs = self.dofs(block, field);
        if dofs.len() != x.len() {
            return Err(Error::DimensionMismatch {
                expected: dofs.len(),
                actual: x.len(),
            });
        }
        let target = dst.block_mut(block);
        for (&i, &value) in dofs.iter().zip(x.iter()) {
            target[i] = value;
        }
        Ok(())
    }

    /// Copy the interface values of `src_block` in `src` over the interface
    /// slots of `dst_block` in `dst`.
    pub fn transfer_interface_dofs(
        &self,
        src: &BlockVector,
        dst: &mut BlockVector,
        src_block: BlockId,
        dst_block: BlockId,
        field: Field,
    ) -> Result<()> {
        let values = self.restrict(src, src_block, field);
        self.extend_checked(&values, dst, src_block, dst_block, field)
    }

    /// Same as [`transfer_interface_dofs`](Self::transfer_interface_dofs) with
    /// source and destination being the same vector.
    pub fn transfer_within(
        &self,
        v: &mut BlockVector,
        src_block: BlockId,
        dst_block: BlockId,
        field: Field,
    ) -> Result<()> {
        let values = self.restrict(v, src_block, field);
        self.extend_checked(&values, v, src_block, dst_block, field)
    }

    fn extend_checked(
        &self,
        values: &DVector<f64>,
        dst: &mut BlockVector,
        src_block: BlockId,
        dst_block: BlockId,
        field: Field,
    ) -> Result<()> {
        let dst_len = self.dofs(dst_block, field).len();
        if dst_len != values.len() {
            return Err(Error::Unsupported(format!(
                "transfer of {:?} interface data from the {} block ({} slots) to the {} block ({} slots)",
                field,
                src_block,
                values.len(),
                dst_block,
                dst_len
            )));
        }
        self.extend(values, dst, dst_block, field)
    }

    /// Mass-weighted inner product `aᵀ M_Γ b`.
    pub fn inner_product(&self, a: &DVector<f64>, b: &DVector<f64>) -> f64 {
        a.dot(&(&self.mass * b))
    }

    /// Interface norm `sqrt(aᵀ M_Γ a)`.
    pub fn interface_norm(&self, a: &DVector<f64>) -> f64 {
        self.inner_product(a, a).max(0.0).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    fn two_point_map() -> InterfaceMap {
        // fluid has 3 nodes (interface = 1, 2), structure has 2 nodes x 2 fields
        InterfaceMap::new(vec![1, 2], vec![0, 1], vec![2, 3], DMatrix::identity(2, 2)).unwrap()
    }

    #[test]
    fn transfer_fluid_to_structure_displacement() {
        let map = two_point_map();
        let src = BlockVector::from_blocks(dvector![9.0, 1.0, 2.0], DVector::zeros(4));
        let mut dst = BlockVector::zeros(3, 4);

        map.transfer_interface_dofs(&src, &mut dst, BlockId::Fluid, BlockId::Structure, Field::Displacement)
            .unwrap();

        assert_eq!(dst[BlockId::Structure], dvector![1.0, 2.0, 0.0, 0.0]);
        assert_eq!(dst[BlockId::Fluid], DVector::zeros(3));
    }

    #[test]
    fn transfer_within_structure_velocity() {
        let map = two_point_map();
        let mut v = BlockVector::from_blocks(dvector![0.0, 3.0, 4.0], DVector::zeros(4));

        map.transfer_within(&mut v, BlockId::Fluid, BlockId::Structure, Field::Velocity)
            .unwrap();

        assert_eq!(v[BlockId::Structure], dvector![0.0, 0.0, 3.0, 4.0]);
    }

    #[test]
    fn transfer_all_structure_fields_into_fluid_is_rejected() {
        let map = two_point_map();
        let src = BlockVector::zeros(3, 4);
        let mut dst = BlockVector::zeros(3, 4);

        let result =
            map.transfer_interface_dofs(&src, &mut dst, BlockId::Structure, BlockId::Fluid, Field::All);
        assert!(matches!(result, Err(Error::Unsupported(_))));
    }

    #[test]
    fn weighted_norm_uses_mass() {
        let mass = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]);
        let map = InterfaceMap::new(vec![0, 1], vec![0, 1], vec![2, 3], mass).unwrap();

        let a = dvector![1.0, 1.0];
        assert!((map.interface_norm(&a) - 6.0_f64.sqrt()).abs() < 1e-14);
        assert!((map.inner_product(&a, &dvector![1.0, -1.0])).abs() < 1e-14);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let result = InterfaceMap::new(vec![0, 1], vec![0], vec![2, 3], DMatrix::identity(2, 2));
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }
}

//! Shear-elastic layer above the interface.
//!
//! Unknowns are stacked as `[d; v]`: out-of-plane displacement and velocity
//! per node. Backward Euler in first-order form:
//!
//! ```text
//! d - Δt v                = d_old
//! ρ_s M v + Δt G K d      = ρ_s M v_old + Δt M_Γ t
//! ```
//!
//! The traction `t` is read from the displacement slots of the interface
//! nodes in the boundary data. The top edge is clamped.

use nalgebra::{DMatrix, DVector};
use steklov_core::{
    Assembler, AssemblyContext, BlockId, BlockVector, LinearSystem, Mode, PhysicalProperties,
    Result,
};

use crate::element::{assemble_triplets, mass, stiffness, triplet_mul};
use crate::mesh::RectangleMesh;

/// Assembler of the structure block.
#[derive(Debug, Clone)]
pub struct StructureAssembler {
    density: f64,
    shear_modulus: f64,
    stiffness: Vec<(usize, usize, f64)>,
    mass: Vec<(usize, usize, f64)>,
    num_nodes: usize,
    clamped_nodes: Vec<usize>,
    interface_nodes: Vec<usize>,
    interface_mass: DMatrix<f64>,
}

impl StructureAssembler {
    /// Build from the structure mesh; the interface is the bottom edge.
    pub fn new(mesh: &RectangleMesh, physical: &PhysicalProperties, interface_mass: DMatrix<f64>) -> Self {
        Self {
            density: physical.rho_s,
            shear_modulus: physical.shear_modulus,
            stiffness: assemble_triplets(mesh, stiffness),
            mass: assemble_triplets(mesh, mass),
            num_nodes: mesh.num_nodes(),
            clamped_nodes: mesh.top_nodes(),
            interface_nodes: mesh.bottom_nodes(),
            interface_mass,
        }
    }

    /// Number of mesh nodes; the block holds twice as many unknowns.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Interface nodes, ordered by `x`.
    pub fn interface_nodes(&self) -> &[usize] {
        &self.interface_nodes
    }

    /// Index of the displacement unknown of `node`.
    pub fn displacement_dof(&self, node: usize) -> usize {
        node
    }

    /// Index of the velocity unknown of `node`.
    pub fn velocity_dof(&self, node: usize) -> usize {
        self.num_nodes + node
    }
}

impl Assembler for StructureAssembler {
    fn block(&self) -> BlockId {
        BlockId::Structure
    }

    fn num_dofs(&self) -> usize {
        2 * self.num_nodes
    }

    fn assemble(&self, mode: Mode, ctx: &AssemblyContext<'_>, boundary: &BlockVector) -> Result<LinearSystem> {
        let n = self.num_nodes;
        let dt = ctx.time_step;
        let mut system = if ctx.assemble_matrix {
            LinearSystem::new(2 * n)
        } else {
            LinearSystem::rhs_only(2 * n)
        };

        if system.has_matrix() {
            for i in 0..n {
                system.add(i, i, 1.0);
                system.add(i, n + i, -dt);
            }
            for &(i, j, m) in &self.mass {
                system.add(n + i, n + j, self.density * m);
            }
            for &(i, j, k) in &self.stiffness {
                system.add(n + i, j, dt * self.shear_modulus * k);
            }
            if mode == Mode::Adjoint {
                system.transpose_matrix();
            }
        }

        if mode == Mode::State {
            let old = ctx.old_solution.block(BlockId::Structure);
            let d_old = old.rows(0, n).into_owned();
            let v_old = old.rows(n, n).into_owned();
            let inertia = triplet_mul(&self.mass, &v_old) * self.density;
            let rhs = system.rhs_mut();
            rhs.rows_mut(0, n).copy_from(&d_old);
            rhs.rows_mut(n, n).copy_from(&inertia);
        }

        let traction = DVector::from_iterator(
            self.interface_nodes.len(),
            self.interface_nodes
                .iter()
                .map(|&node| boundary[BlockId::Structure][self.displacement_dof(node)]),
        );
        let load = &self.interface_mass * traction * dt;
        for (&node, &value) in self.interface_nodes.iter().zip(load.iter()) {
            system.add_rhs(self.velocity_dof(node), value);
        }

        Ok(system)
    }

    fn dirichlet_boundaries(&self, _mode: Mode, _ctx: &AssemblyContext<'_>, system: &mut LinearSystem) {
        let constraints: Vec<(usize, f64)> = self
            .clamped_nodes
            .iter()
            .flat_map(|&node| [(self.displacement_dof(node), 0.0), (self.velocity_dof(node), 0.0)])
            .collect();
        system.apply_dirichlet(&constraints);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::line_mass;

    fn assembler() -> StructureAssembler {
        let mesh = RectangleMesh::new(2, 1, 1.0, 0.5, 0.25);
        let interface_mass = line_mass(&mesh.x_coords(&mesh.bottom_nodes()));
        StructureAssembler::new(&mesh, &PhysicalProperties::default(), interface_mass)
    }

    #[test]
    fn state_rhs_carries_previous_step() {
        let structure = assembler();
        let n = structure.num_nodes();
        let mut old = BlockVector::zeros(1, 2 * n);
        old[BlockId::Structure][0] = 0.3;
        let boundary = BlockVector::zeros(1, 2 * n);
        let ctx = AssemblyContext {
            time: 0.0,
            time_step: 0.1,
            old_solution: &old,
            assemble_matrix: true,
        };

        let system = structure.assemble(Mode::State, &ctx, &boundary).unwrap();
        assert_eq!(system.rhs()[0], 0.3);

        let dense = system.to_dense();
        assert_eq!(dense[(0, 0)], 1.0);
        assert!((dense[(0, n)] + 0.1).abs() < 1e-15);
    }

    #[test]
    fn clamped_top_rows_are_identity() {
        let structure = assembler();
        let n = structure.num_nodes();
        let old = BlockVector::zeros(1, 2 * n);
        let boundary = BlockVector::zeros(1, 2 * n);
        let ctx = AssemblyContext {
            time: 0.0,
            time_step: 0.1,
            old_solution: &old,
            assemble_matrix: true,
        };

        let mut system = structure.assemble(Mode::Linear, &ctx, &boundary).unwrap();
        structure.dirichlet_boundaries(Mode::Linear, &ctx, &mut system);
        let dense = system.to_dense();

        // top nodes of a 2 x 1 mesh are 3, 4, 5
        for node in 3..6 {
            for dof in [node, n + node] {
                assert_eq!(dense[(dof, dof)], 1.0);
                assert_eq!(dense.row(dof).sum(), 1.0);
                assert_eq!(system.rhs()[dof], 0.0);
            }
        }
    }

    #[test]
    fn traction_loads_velocity_rows() {
        let structure = assembler();
        let n = structure.num_nodes();
        let old = BlockVector::zeros(1, 2 * n);
        let mut boundary = BlockVector::zeros(1, 2 * n);
        for &node in structure.interface_nodes() {
            boundary[BlockId::Structure][node] = -1.0;
        }
        let ctx = AssemblyContext {
            time: 0.0,
            time_step: 0.5,
            old_solution: &old,
            assemble_matrix: false,
        };

        let system = structure.assemble(Mode::Linear, &ctx, &boundary).unwrap();

        assert!(system.rhs().rows(0, n).iter().all(|&v| v == 0.0));
        assert!((system.rhs().rows(n, n).sum() + 0.5).abs() < 1e-14);
    }
}

//! Unidirectional viscous flow in the channel below the interface.
//!
//! The unknown is the out-of-plane velocity `u` per node. Backward Euler in
//! time gives
//!
//! ```text
//! (ρ_f/Δt) M u + μ K u = (ρ_f/Δt) M u_old + M_Γ g
//! ```
//!
//! with `g` the interface traction. The bottom wall moves with the prescribed
//! inflow velocity; the side walls are traction free.

use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector};
use steklov_core::{
    Assembler, AssemblyContext, BlockId, BlockVector, LinearSystem, Mode, PhysicalProperties,
    Result,
};

use crate::element::{assemble_triplets, mass, stiffness, triplet_mul};
use crate::mesh::RectangleMesh;

/// Velocity profile of the driving wall, scaled to a peak of 1 at `x = L/3`.
pub fn inflow_profile(x: f64, length: f64) -> f64 {
    let s = x / length;
    6.75 * s * (1.0 - s).powi(2)
}

/// Assembler of the fluid block.
#[derive(Debug, Clone)]
pub struct FluidAssembler {
    density: f64,
    viscosity: f64,
    amplitude: f64,
    frequency: f64,
    length: f64,
    stiffness: Vec<(usize, usize, f64)>,
    mass: Vec<(usize, usize, f64)>,
    num_nodes: usize,
    wall_nodes: Vec<usize>,
    wall_x: Vec<f64>,
    interface_nodes: Vec<usize>,
    interface_mass: DMatrix<f64>,
}

impl FluidAssembler {
    /// Build from the fluid mesh; the interface is the top edge.
    pub fn new(mesh: &RectangleMesh, physical: &PhysicalProperties, length: f64, interface_mass: DMatrix<f64>) -> Self {
        let wall_nodes = mesh.bottom_nodes();
        let wall_x = mesh.x_coords(&wall_nodes);
        Self {
            density: physical.rho_f,
            viscosity: physical.viscosity,
            amplitude: physical.inflow_amplitude,
            frequency: physical.inflow_frequency,
            length,
            stiffness: assemble_triplets(mesh, stiffness),
            mass: assemble_triplets(mesh, mass),
            num_nodes: mesh.num_nodes(),
            wall_nodes,
            wall_x,
            interface_nodes: mesh.top_nodes(),
            interface_mass,
        }
    }

    /// Interface nodes, ordered by `x`.
    pub fn interface_nodes(&self) -> &[usize] {
        &self.interface_nodes
    }

    /// Prescribed wall velocity at `x` and time `t`.
    pub fn wall_velocity(&self, x: f64, t: f64) -> f64 {
        self.amplitude * inflow_profile(x, self.length) * (2.0 * PI * self.frequency * t).sin()
    }
}

impl Assembler for FluidAssembler {
    fn block(&self) -> BlockId {
        BlockId::Fluid
    }

    fn num_dofs(&self) -> usize {
        self.num_nodes
    }

    fn assemble(&self, mode: Mode, ctx: &AssemblyContext<'_>, boundary: &BlockVector) -> Result<LinearSystem> {
        let n = self.num_nodes;
        let mut system = if ctx.assemble_matrix {
            LinearSystem::new(n)
        } else {
            LinearSystem::rhs_only(n)
        };
        let inertia = self.density / ctx.time_step;

        if system.has_matrix() {
            system.triplets.reserve(self.mass.len() + self.stiffness.len());
            for &(i, j, m) in &self.mass {
                system.add(i, j, inertia * m);
            }
            for &(i, j, k) in &self.stiffness {
                system.add(i, j, self.viscosity * k);
            }
            if mode == Mode::Adjoint {
                system.transpose_matrix();
            }
        }

        if mode == Mode::State {
            let old = ctx.old_solution.block(BlockId::Fluid);
            *system.rhs_mut() += triplet_mul(&self.mass, old) * inertia;
        }

        let traction = DVector::from_iterator(
            self.interface_nodes.len(),
            self.interface_nodes.iter().map(|&n| boundary[BlockId::Fluid][n]),
        );
        let load = &self.interface_mass * traction;
        for (&node, &value) in self.interface_nodes.iter().zip(load.iter()) {
            system.add_rhs(node, value);
        }

        Ok(system)
    }

    fn dirichlet_boundaries(&self, mode: Mode, ctx: &AssemblyContext<'_>, system: &mut LinearSystem) {
        let constraints: Vec<(usize, f64)> = self
            .wall_nodes
            .iter()
            .zip(&self.wall_x)
            .map(|(&node, &x)| {
                let value = match mode {
                    Mode::State => self.wall_velocity(x, ctx.time),
                    Mode::Linear | Mode::Adjoint => 0.0,
                };
                (node, value)
            })
            .collect();
        system.apply_dirichlet(&constraints);
    }
}

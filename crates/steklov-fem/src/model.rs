//! Conforming fluid/structure discretization built from run parameters.

use steklov_core::{InterfaceMap, Parameters, Result};

use crate::element::line_mass;
use crate::fluid::FluidAssembler;
use crate::mesh::RectangleMesh;
use crate::structure::StructureAssembler;

/// Fluid channel `[0, L] × [0, H_f]` below an elastic layer
/// `[0, L] × [H_f, H_f + H_s]`, sharing the interface line `y = H_f`.
#[derive(Debug, Clone)]
pub struct FsiModel {
    pub fluid_mesh: RectangleMesh,
    pub structure_mesh: RectangleMesh,
    pub fluid: FluidAssembler,
    pub structure: StructureAssembler,
    pub interface: InterfaceMap,
}

impl FsiModel {
    pub fn build(params: &Parameters) -> Result<Self> {
        params.validate()?;
        let mesh = &params.mesh;

        let fluid_mesh = RectangleMesh::new(mesh.nx, mesh.ny_fluid, mesh.length, 0.0, mesh.fluid_height);
        let structure_mesh = RectangleMesh::new(
            mesh.nx,
            mesh.ny_structure,
            mesh.length,
            mesh.fluid_height,
            mesh.structure_height,
        );

        let fluid_interface = fluid_mesh.top_nodes();
        let structure_interface = structure_mesh.bottom_nodes();
        let interface_mass = line_mass(&fluid_mesh.x_coords(&fluid_interface));

        let fluid = FluidAssembler::new(&fluid_mesh, &params.physical, mesh.length, interface_mass.clone());
        let structure = StructureAssembler::new(&structure_mesh, &params.physical, interface_mass.clone());

        let interface = InterfaceMap::new(
            fluid_interface,
            structure_interface.iter().map(|&n| structure.displacement_dof(n)).collect(),
            structure_interface.iter().map(|&n| structure.velocity_dof(n)).collect(),
            interface_mass,
        )?;

        log::info!(
            "mesh: {} fluid nodes, {} structure nodes, {} interface points",
            fluid_mesh.num_nodes(),
            structure_mesh.num_nodes(),
            interface.dim()
        );

        Ok(Self {
            fluid_mesh,
            structure_mesh,
            fluid,
            structure,
            interface,
        })
    }

    /// Split into the fluid assembler, the structure assembler and the
    /// interface map.
    pub fn into_parts(self) -> (FluidAssembler, StructureAssembler, InterfaceMap) {
        (self.fluid, self.structure, self.interface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steklov_core::{Assembler, BlockId, Field};

    #[test]
    fn interface_points_line_up() {
        let params = Parameters::default();
        let model = FsiModel::build(&params).unwrap();

        assert_eq!(model.interface.dim(), params.mesh.nx + 1);
        let fluid_x = model.fluid_mesh.x_coords(&model.interface.dofs(BlockId::Fluid, Field::All));
        let structure_x = model
            .structure_mesh
            .x_coords(&model.interface.dofs(BlockId::Structure, Field::Displacement));
        for (a, b) in fluid_x.iter().zip(&structure_x) {
            assert!((a - b).abs() < 1e-14);
        }

        let fluid_y = model.fluid_mesh.nodes()[model.interface.dofs(BlockId::Fluid, Field::All)[0]].y;
        assert!((fluid_y - params.mesh.fluid_height).abs() < 1e-14);
    }

    #[test]
    fn velocity_slots_follow_displacement_slots() {
        let model = FsiModel::build(&Parameters::default()).unwrap();
        let n = model.structure.num_nodes();

        let d = model.interface.dofs(BlockId::Structure, Field::Displacement);
        let v = model.interface.dofs(BlockId::Structure, Field::Velocity);
        for (d, v) in d.iter().zip(&v) {
            assert_eq!(v - d, n);
        }
        assert_eq!(model.structure.num_dofs(), 2 * n);
    }

    #[test]
    fn interface_mass_sums_to_length() {
        let mut params = Parameters::default();
        params.mesh.length = 2.5;
        let model = FsiModel::build(&params).unwrap();
        assert!((model.interface.mass().sum() - 2.5).abs() < 1e-13);
    }
}

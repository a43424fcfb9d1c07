//! Reference finite-element collaborators for Steklov.
//!
//! An anti-plane shear model: unidirectional viscous flow driven by a moving
//! wall, coupled to a shear-elastic layer clamped on its far side. Both
//! domains use P1 triangles on structured meshes that conform along the
//! interface.

pub mod element;
pub mod fluid;
pub mod mesh;
pub mod model;
pub mod structure;

pub use fluid::{FluidAssembler, inflow_profile};
pub use mesh::RectangleMesh;
pub use model::FsiModel;
pub use structure::StructureAssembler;

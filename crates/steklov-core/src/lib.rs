//! Core data structures for Steklov.
//!
//! This crate holds everything the coupling solver and the finite-element
//! collaborators share:
//! - [`BlockVector`] and the block/field/mode selectors
//! - [`InterfaceMap`] for moving interface data between blocks and measuring it
//! - [`LinearSystem`] produced by an [`Assembler`]
//! - [`Parameters`] read from the parameter file

pub mod assembly;
pub mod block;
pub mod error;
pub mod interface;
pub mod params;
pub mod system;

pub use assembly::{Assembler, AssemblyContext};
pub use block::{AdjointType, BlockId, BlockVector, Field, Mode};
pub use error::{Error, Result};
pub use interface::InterfaceMap;
pub use params::{FemProperties, MeshProperties, Parameters, PhysicalProperties, TimeProperties};
pub use system::LinearSystem;

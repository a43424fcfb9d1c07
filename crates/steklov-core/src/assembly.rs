//! Assembler interface consumed by the coupling core.

use crate::block::{BlockId, BlockVector, Mode};
use crate::error::Result;
use crate::system::LinearSystem;

/// State an assembler may read besides the boundary data.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyContext<'a> {
    /// Time at the end of the current step.
    pub time: f64,
    /// Step size.
    pub time_step: f64,
    /// Converged solution of the previous step.
    pub old_solution: &'a BlockVector,
    /// Assemble matrix entries, not only the right-hand side.
    pub assemble_matrix: bool,
}

/// Builds the linear system of one sub-physics block.
///
/// Implementations must be deterministic given the context and the boundary
/// data, and must only read their own block of `boundary`.
pub trait Assembler: Send + Sync {
    /// Block this assembler produces.
    fn block(&self) -> BlockId;

    /// Number of unknowns of the block.
    fn num_dofs(&self) -> usize;

    /// Assemble the system for `mode`.
    ///
    /// `boundary` carries the interface Neumann data in this block's interface
    /// slots, with the sign already adjusted for the block's outward normal.
    fn assemble(
        &self,
        mode: Mode,
        ctx: &AssemblyContext<'_>,
        boundary: &BlockVector,
    ) -> Result<LinearSystem>;

    /// Impose the block's Dirichlet conditions on an assembled system.
    fn dirichlet_boundaries(&self, mode: Mode, ctx: &AssemblyContext<'_>, system: &mut LinearSystem);
}

//! Block solves and the matrix-free linearized interface operator.

use nalgebra::DVector;
use steklov_core::{
    AdjointType, Assembler, AssemblyContext, BlockId, BlockVector, Field, InterfaceMap, Mode,
    Result,
};

use crate::factorization::SubSolver;

/// What to do with a block's cached factorization before solving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorStep {
    /// Analyze and factorize from scratch.
    Initialize,
    /// Numeric refactorization on the cached analysis.
    Refactorize,
    /// Solve with the factors already in the cache.
    Reuse,
}

impl FactorStep {
    /// `Initialize` on the initial timestep, `Refactorize` afterwards.
    pub fn for_timestep(timestep_number: usize, initial_timestep_number: usize) -> Self {
        if timestep_number == initial_timestep_number {
            FactorStep::Initialize
        } else {
            FactorStep::Refactorize
        }
    }
}

/// Neumann data of both blocks for the compact interface stress `x`.
///
/// The fluid receives `x` as is; the structure receives it in its
/// displacement slots with the opposite sign (opposite outward normal).
pub fn neumann_data(
    interface: &InterfaceMap,
    x: &DVector<f64>,
    fluid_dofs: usize,
    structure_dofs: usize,
) -> Result<BlockVector> {
    let mut boundary = BlockVector::zeros(fluid_dofs, structure_dofs);
    interface.extend(x, &mut boundary, BlockId::Fluid, Field::All)?;
    interface.transfer_within(&mut boundary, BlockId::Fluid, BlockId::Structure, Field::Displacement)?;
    boundary[BlockId::Structure].neg_mut();
    Ok(boundary)
}

/// Interface trace of the structure matched against the fluid velocity.
///
/// For displacement matching this is the displacement rate over the step,
/// `(d - d_old) / Δt`; pass `old = None` for linearized solutions.
pub fn structure_trace(
    interface: &InterfaceMap,
    adjoint_type: AdjointType,
    time_step: f64,
    solution: &BlockVector,
    old: Option<&BlockVector>,
) -> DVector<f64> {
    match adjoint_type {
        AdjointType::Displacement => {
            let mut d = interface.restrict(solution, BlockId::Structure, Field::Displacement);
            if let Some(old) = old {
                d -= interface.restrict(old, BlockId::Structure, Field::Displacement);
            }
            d / time_step
        }
        AdjointType::Velocity => interface.restrict(solution, BlockId::Structure, Field::Velocity),
    }
}

/// `structure_trace - fluid_trace` of a block solution.
pub fn trace_mismatch(
    interface: &InterfaceMap,
    adjoint_type: AdjointType,
    time_step: f64,
    solution: &BlockVector,
    old: Option<&BlockVector>,
) -> DVector<f64> {
    structure_trace(interface, adjoint_type, time_step, solution, old)
        - interface.restrict(solution, BlockId::Fluid, Field::All)
}

fn solve_block<A: Assembler>(
    assembler: &A,
    solver: &mut SubSolver,
    mode: Mode,
    ctx: &AssemblyContext<'_>,
    boundary: &BlockVector,
    step: FactorStep,
) -> Result<DVector<f64>> {
    let mut system = assembler.assemble(mode, ctx, boundary)?;
    assembler.dirichlet_boundaries(mode, ctx, &mut system);
    match step {
        FactorStep::Initialize => solver.initialize(&system)?,
        FactorStep::Refactorize => solver.factorize(&system)?,
        FactorStep::Reuse => {}
    }
    solver.solve(system.rhs())
}

/// Assemble, constrain and solve both blocks concurrently.
///
/// `ctx.assemble_matrix` must be set unless `step` is [`FactorStep::Reuse`].
pub fn solve_blocks<F: Assembler, S: Assembler>(
    fluid: &F,
    structure: &S,
    solvers: &mut [SubSolver; 2],
    mode: Mode,
    ctx: &AssemblyContext<'_>,
    boundary: &BlockVector,
    step: FactorStep,
) -> Result<BlockVector> {
    let [fluid_solver, structure_solver] = solvers;
    let (fluid_result, structure_result) = rayon::join(
        || solve_block(fluid, fluid_solver, mode, ctx, boundary, step),
        || solve_block(structure, structure_solver, mode, ctx, boundary, step),
    );
    Ok(BlockVector::from_blocks(fluid_result?, structure_result?))
}

/// Matrix-free linearized interface operator.
///
/// Maps an interface stress increment to the mismatch of the interface traces
/// it produces in the homogeneous linearized problems:
/// `A x = structure_trace(-x) - fluid_trace(x)`.
pub struct LinearizedOperator<'a, F: Assembler, S: Assembler> {
    fluid: &'a F,
    structure: &'a S,
    interface: &'a InterfaceMap,
    solvers: &'a mut [SubSolver; 2],
    adjoint_type: AdjointType,
    time: f64,
    time_step: f64,
    old_solution: &'a BlockVector,
    last_solution: &'a mut BlockVector,
}

impl<'a, F: Assembler, S: Assembler> LinearizedOperator<'a, F, S> {
    /// Build the operator and factorize the linearized block matrices.
    ///
    /// `last_solution` receives the block solution of every application.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fluid: &'a F,
        structure: &'a S,
        interface: &'a InterfaceMap,
        solvers: &'a mut [SubSolver; 2],
        adjoint_type: AdjointType,
        time: f64,
        time_step: f64,
        old_solution: &'a BlockVector,
        last_solution: &'a mut BlockVector,
        step: FactorStep,
    ) -> Result<Self> {
        let mut operator = Self {
            fluid,
            structure,
            interface,
            solvers,
            adjoint_type,
            time,
            time_step,
            old_solution,
            last_solution,
        };
        operator.prepare(step)?;
        Ok(operator)
    }

    fn context(&self, assemble_matrix: bool) -> AssemblyContext<'a> {
        AssemblyContext {
            time: self.time,
            time_step: self.time_step,
            old_solution: self.old_solution,
            assemble_matrix,
        }
    }

    fn prepare(&mut self, step: FactorStep) -> Result<()> {
        if step == FactorStep::Reuse {
            return Ok(());
        }
        let ctx = self.context(true);
        let boundary = BlockVector::zeros(self.fluid.num_dofs(), self.structure.num_dofs());
        let (fluid, structure) = (self.fluid, self.structure);
        let [fluid_solver, structure_solver] = &mut *self.solvers;

        let (fluid_result, structure_result) = rayon::join(
            || factor_block(fluid, fluid_solver, &ctx, &boundary, step),
            || factor_block(structure, structure_solver, &ctx, &boundary, step),
        );
        fluid_result?;
        structure_result
    }

    /// Number of interface unknowns.
    pub fn dim(&self) -> usize {
        self.interface.dim()
    }

    /// Apply the operator to the interface vector `x`.
    pub fn apply(&mut self, x: &DVector<f64>) -> Result<DVector<f64>> {
        let boundary = neumann_data(
            self.interface,
            x,
            self.fluid.num_dofs(),
            self.structure.num_dofs(),
        )?;
        let ctx = self.context(false);
        let solution = solve_blocks(
            self.fluid,
            self.structure,
            self.solvers,
            Mode::Linear,
            &ctx,
            &boundary,
            FactorStep::Reuse,
        )?;

        let ax = trace_mismatch(self.interface, self.adjoint_type, self.time_step, &solution, None);
        *self.last_solution = solution;
        Ok(ax)
    }
}

fn factor_block<A: Assembler>(
    assembler: &A,
    solver: &mut SubSolver,
    ctx: &AssemblyContext<'_>,
    boundary: &BlockVector,
    step: FactorStep,
) -> Result<()> {
    let mut system = assembler.assemble(Mode::Linear, ctx, boundary)?;
    assembler.dirichlet_boundaries(Mode::Linear, ctx, &mut system);
    match step {
        FactorStep::Initialize => solver.initialize(&system),
        FactorStep::Refactorize => solver.factorize(&system),
        FactorStep::Reuse => Ok(()),
    }
}

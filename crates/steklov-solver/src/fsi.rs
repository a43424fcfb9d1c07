//! Monolithic fluid-structure problem driven by interface GMRES.
//!
//! The unknown of the coupling is the interface stress. Each timestep solves
//! the fluid and structure state problems with the current stress and, while
//! the interface velocities disagree, corrects the stress with
//! [`FsiProblem::optimization_gmres`].

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use steklov_core::{
    AdjointType, Assembler, AssemblyContext, BlockId, BlockVector, Error, Field, InterfaceMap,
    Mode, Parameters, Result,
};

use crate::factorization::SubSolver;
use crate::gmres::{GmresConfig, GmresStatus, solve_coupling_gmres};
use crate::linearized::{
    FactorStep, LinearizedOperator, neumann_data, solve_blocks, trace_mismatch,
};
use crate::operator::CouplingProblem;

/// Number of the first timestep; factorizations are built from scratch there.
pub const INITIAL_TIMESTEP_NUMBER: usize = 1;

/// Statistics of a complete run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub timesteps: usize,
    /// Sub-physics linear solves, state and linearized.
    pub total_solves: usize,
    pub gmres_calls: usize,
    /// Interface jump after the last timestep.
    pub final_jump: f64,
    pub final_time: f64,
}

/// Fluid and structure sub-problems coupled through the interface stress.
pub struct FsiProblem<F: Assembler, S: Assembler> {
    params: Parameters,
    fluid: F,
    structure: S,
    interface: InterfaceMap,
    solution: BlockVector,
    old_solution: BlockVector,
    linear_solution: BlockVector,
    stress: BlockVector,
    state_solvers: [SubSolver; 2],
    linear_solvers: [SubSolver; 2],
    time: f64,
    timestep_number: usize,
    gmres_calls: usize,
    rng: StdRng,
}

impl<F: Assembler, S: Assembler> FsiProblem<F, S> {
    /// Couple `fluid` and `structure` through `interface`.
    pub fn new(params: Parameters, fluid: F, structure: S, interface: InterfaceMap) -> Result<Self> {
        params.validate()?;
        if fluid.block() != BlockId::Fluid || structure.block() != BlockId::Structure {
            return Err(Error::Unsupported(format!(
                "assemblers for the {} and {} blocks given as fluid and structure",
                fluid.block(),
                structure.block()
            )));
        }

        let (nf, ns) = (fluid.num_dofs(), structure.num_dofs());
        for (block, dofs) in [(BlockId::Fluid, nf), (BlockId::Structure, ns)] {
            if let Some(&max) = interface.dofs(block, Field::All).iter().max() {
                if max >= dofs {
                    return Err(Error::DimensionMismatch {
                        expected: dofs,
                        actual: max + 1,
                    });
                }
            }
        }

        let rng = StdRng::seed_from_u64(params.fem.seed);
        Ok(Self {
            params,
            fluid,
            structure,
            interface,
            solution: BlockVector::zeros(nf, ns),
            old_solution: BlockVector::zeros(nf, ns),
            linear_solution: BlockVector::zeros(nf, ns),
            stress: BlockVector::zeros(nf, ns),
            state_solvers: [SubSolver::new(BlockId::Fluid), SubSolver::new(BlockId::Structure)],
            linear_solvers: [SubSolver::new(BlockId::Fluid), SubSolver::new(BlockId::Structure)],
            time: 0.0,
            timestep_number: 0,
            gmres_calls: 0,
            rng,
        })
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn interface(&self) -> &InterfaceMap {
        &self.interface
    }

    /// Current state solution.
    pub fn solution(&self) -> &BlockVector {
        &self.solution
    }

    /// State solution of the previous timestep.
    pub fn old_solution(&self) -> &BlockVector {
        &self.old_solution
    }

    /// Block solution of the latest linearized operator application.
    pub fn linear_solution(&self) -> &BlockVector {
        &self.linear_solution
    }

    /// Interface stress; the structure displacement slots mirror the fluid ones.
    pub fn stress(&self) -> &BlockVector {
        &self.stress
    }

    /// Compact interface stress.
    pub fn interface_stress(&self) -> DVector<f64> {
        self.interface.restrict(&self.stress, BlockId::Fluid, Field::All)
    }

    /// Overwrite the interface stress and its structure mirror.
    pub fn set_interface_stress(&mut self, x: &DVector<f64>) -> Result<()> {
        self.interface.extend(x, &mut self.stress, BlockId::Fluid, Field::All)?;
        self.interface.transfer_within(
            &mut self.stress,
            BlockId::Fluid,
            BlockId::Structure,
            Field::Displacement,
        )
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn timestep_number(&self) -> usize {
        self.timestep_number
    }

    pub fn gmres_calls(&self) -> usize {
        self.gmres_calls
    }

    fn adjoint_type(&self) -> AdjointType {
        self.params.fem.adjoint_type()
    }

    /// Move to the next timestep, keeping the current solution as the old one.
    pub fn advance_time(&mut self) {
        self.timestep_number += 1;
        self.time += self.params.time.time_step;
        self.old_solution = self.solution.clone();
    }

    /// Solve the fluid and structure state problems with the current stress.
    pub fn solve_state(&mut self, total_solves: &mut usize) -> Result<()> {
        let x = self.interface_stress();
        let boundary = neumann_data(
            &self.interface,
            &x,
            self.fluid.num_dofs(),
            self.structure.num_dofs(),
        )?;
        let ctx = AssemblyContext {
            time: self.time,
            time_step: self.params.time.time_step,
            old_solution: &self.old_solution,
            assemble_matrix: true,
        };
        let step = FactorStep::for_timestep(self.timestep_number, INITIAL_TIMESTEP_NUMBER);

        self.solution = solve_blocks(
            &self.fluid,
            &self.structure,
            &mut self.state_solvers,
            Mode::State,
            &ctx,
            &boundary,
            step,
        )?;
        *total_solves += 2;
        Ok(())
    }

    /// Solve the adjoint problems driven by the interface data `x`.
    ///
    /// The adjoint matrices are the transposed linearized ones with
    /// homogeneous Dirichlet data.
    pub fn solve_adjoint(&mut self, x: &DVector<f64>, total_solves: &mut usize) -> Result<BlockVector> {
        let boundary = neumann_data(
            &self.interface,
            x,
            self.fluid.num_dofs(),
            self.structure.num_dofs(),
        )?;
        let ctx = AssemblyContext {
            time: self.time,
            time_step: self.params.time.time_step,
            old_solution: &self.old_solution,
            assemble_matrix: true,
        };
        let mut solvers = [SubSolver::new(BlockId::Fluid), SubSolver::new(BlockId::Structure)];
        let adjoint = solve_blocks(
            &self.fluid,
            &self.structure,
            &mut solvers,
            Mode::Adjoint,
            &ctx,
            &boundary,
            FactorStep::Initialize,
        )?;
        *total_solves += 2;
        Ok(adjoint)
    }

    /// Interface trace mismatch `structure_trace - fluid_trace` of the state.
    pub fn mismatch(&self) -> DVector<f64> {
        trace_mismatch(
            &self.interface,
            self.adjoint_type(),
            self.params.time.time_step,
            &self.solution,
            Some(&self.old_solution),
        )
    }

    /// Interface norm of [`mismatch`](Self::mismatch).
    pub fn jump(&self) -> f64 {
        self.interface.interface_norm(&self.mismatch())
    }

    /// Build the linearized interface operator, factorizing its blocks.
    pub fn linearized_operator(&mut self, step: FactorStep) -> Result<LinearizedOperator<'_, F, S>> {
        LinearizedOperator::new(
            &self.fluid,
            &self.structure,
            &self.interface,
            &mut self.linear_solvers,
            self.params.fem.adjoint_type(),
            self.time,
            self.params.time.time_step,
            &self.old_solution,
            &mut self.linear_solution,
            step,
        )
    }

    /// Correct the interface stress so the state traces match.
    ///
    /// Solves `A x = -mismatch` for the stress increment with restarted GMRES,
    /// where `A` is the linearized interface operator and the mismatch is
    /// taken from the current state solution (call
    /// [`solve_state`](Self::solve_state) first). On convergence the stress is
    /// incremented by `x`; otherwise it is left untouched and
    /// [`GmresStatus::NotConverged`] is returned.
    pub fn optimization_gmres(
        &mut self,
        total_solves: &mut usize,
        initial_timestep_number: usize,
        random_initial_guess: bool,
        max_iterations: usize,
    ) -> Result<GmresStatus> {
        let config = GmresConfig::default()
            .with_tol(self.params.fem.cg_tolerance)
            .with_restart(self.params.fem.restart)
            .with_max_iter(max_iterations);

        let n = self.interface.dim();
        let scale = self.params.physical.rho_f.max(self.params.physical.rho_s);
        let guess = if random_initial_guess {
            DVector::from_fn(n, |_, _| scale * self.rng.r#gen::<f64>())
        } else {
            DVector::from_element(n, scale)
        };
        let rhs = -self.mismatch();
        let step = FactorStep::for_timestep(self.timestep_number, initial_timestep_number);

        let operator = LinearizedOperator::new(
            &self.fluid,
            &self.structure,
            &self.interface,
            &mut self.linear_solvers,
            self.params.fem.adjoint_type(),
            self.time,
            self.params.time.time_step,
            &self.old_solution,
            &mut self.linear_solution,
            step,
        )?;
        let mut coupling = InterfaceCoupling {
            operator,
            interface: &self.interface,
            stress: &mut self.stress,
            rhs,
            guess,
        };

        let report = solve_coupling_gmres(&mut coupling, &config, total_solves)?;
        self.gmres_calls += 1;

        match report.status {
            GmresStatus::Converged => log::debug!(
                "timestep {}: GMRES converged after {} iterations (error = {:.3e})",
                self.timestep_number,
                report.iterations,
                report.error
            ),
            GmresStatus::NotConverged => log::warn!(
                "timestep {}: GMRES stopped after {} iterations (error = {:.3e})",
                self.timestep_number,
                report.iterations,
                report.error
            ),
        }
        Ok(report.status)
    }

    /// Advance one timestep and iterate the coupling until the jump is small.
    ///
    /// Returns the final interface jump.
    pub fn step(&mut self, total_solves: &mut usize) -> Result<f64> {
        self.advance_time();
        let fem = self.params.fem.clone();

        let mut gmres_calls = 0;
        loop {
            self.solve_state(total_solves)?;
            let jump = self.jump();
            log::debug!(
                "timestep {} (t = {:.4}): jump = {jump:.3e}",
                self.timestep_number,
                self.time
            );
            if jump < fem.jump_tolerance {
                return Ok(jump);
            }
            if gmres_calls == fem.max_coupling_iterations {
                return Err(Error::CouplingNotConverged {
                    timestep: self.timestep_number,
                    jump,
                });
            }

            let status = self.optimization_gmres(
                total_solves,
                INITIAL_TIMESTEP_NUMBER,
                fem.random_initial_guess,
                fem.max_optimization_iterations,
            )?;
            gmres_calls += 1;
            if !status.is_converged() {
                log::warn!(
                    "timestep {}: retrying coupling ({gmres_calls}/{})",
                    self.timestep_number,
                    fem.max_coupling_iterations
                );
            }
        }
    }

    /// Run all configured timesteps.
    pub fn run(&mut self) -> Result<RunSummary> {
        let n_steps = self.params.time.n_time_steps;
        let mut total_solves = 0;
        let mut final_jump = 0.0;

        for _ in 0..n_steps {
            final_jump = self.step(&mut total_solves)?;
            log::info!(
                "timestep {:>4}  t = {:.4}  jump = {final_jump:.3e}  solves = {total_solves}",
                self.timestep_number,
                self.time
            );
        }

        Ok(RunSummary {
            timesteps: self.timestep_number,
            total_solves,
            gmres_calls: self.gmres_calls,
            final_jump,
            final_time: self.time,
        })
    }
}

/// Interface equation of one GMRES call.
struct InterfaceCoupling<'a, F: Assembler, S: Assembler> {
    operator: LinearizedOperator<'a, F, S>,
    interface: &'a InterfaceMap,
    stress: &'a mut BlockVector,
    rhs: DVector<f64>,
    guess: DVector<f64>,
}

impl<F: Assembler, S: Assembler> CouplingProblem for InterfaceCoupling<'_, F, S> {
    fn dim(&self) -> usize {
        self.operator.dim()
    }

    fn rhs(&mut self) -> Result<DVector<f64>> {
        Ok(self.rhs.clone())
    }

    fn initial_guess(&mut self) -> DVector<f64> {
        self.guess.clone()
    }

    fn apply(&mut self, x: &DVector<f64>) -> Result<DVector<f64>> {
        self.operator.apply(x)
    }

    fn inner_product(&self, a: &DVector<f64>, b: &DVector<f64>) -> f64 {
        self.interface.inner_product(a, b)
    }

    fn commit(&mut self, x: &DVector<f64>) -> Result<()> {
        let updated = self.interface.restrict(self.stress, BlockId::Fluid, Field::All) + x;
        self.interface.extend(&updated, self.stress, BlockId::Fluid, Field::All)?;
        self.interface.transfer_within(
            self.stress,
            BlockId::Fluid,
            BlockId::Structure,
            Field::Displacement,
        )
    }
}

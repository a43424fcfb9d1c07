//! Coupled fluid-structure runs on the reference finite-element model.

use nalgebra::{DVector, Matrix2, Vector2};
use steklov_core::{BlockId, BlockVector, Error, Field, Parameters};
use steklov_fem::{FluidAssembler, FsiModel, StructureAssembler};
use steklov_solver::{FactorStep, FsiProblem, GmresStatus, INITIAL_TIMESTEP_NUMBER};

type Problem = FsiProblem<FluidAssembler, StructureAssembler>;

fn small_params() -> Parameters {
    let mut params = Parameters::default();
    params.mesh.nx = 4;
    params.mesh.ny_fluid = 2;
    params.mesh.ny_structure = 2;
    params.time.n_time_steps = 5;
    params
}

fn problem(params: Parameters) -> Problem {
    let (fluid, structure, interface) = FsiModel::build(&params).unwrap().into_parts();
    FsiProblem::new(params, fluid, structure, interface).unwrap()
}

#[test]
fn linearized_operator_is_linear() {
    let mut fsi = problem(small_params());
    fsi.advance_time();
    let mut op = fsi.linearized_operator(FactorStep::Initialize).unwrap();
    let n = op.dim();

    let zero = op.apply(&DVector::zeros(n)).unwrap();
    assert_eq!(zero, DVector::zeros(n));

    let x = DVector::from_fn(n, |i, _| (i as f64 + 1.0).cos());
    let y = DVector::from_fn(n, |i, _| 0.5 - i as f64);
    let ax = op.apply(&x).unwrap();
    let ay = op.apply(&y).unwrap();
    let combined = op.apply(&(&x * 2.0 - &y * 3.0)).unwrap();

    let expected = ax * 2.0 - ay * 3.0;
    assert!((combined - &expected).norm() < 1e-12 * expected.norm());
}

/// One cell per domain: the interface has two points and the operator is a
/// 2 x 2 matrix that can be written down by hand.
fn one_cell_jacobian(params: &Parameters, structure_sign: f64) -> Matrix2<f64> {
    let w = params.mesh.length;
    let dt = params.time.time_step;
    let p = &params.physical;

    // Interface nodes of the fluid cell are its top corners, the structure's
    // are its bottom corners. Entries below are the 2 x 2 blocks of the P1
    // mass and stiffness matrices on those corners.
    let hf = params.mesh.fluid_height;
    let af = 0.5 * w * hf;
    let fluid_mass = Matrix2::new(af / 6.0, af / 12.0, af / 12.0, af / 3.0);
    let fluid_stiffness = Matrix2::new(
        (hf * hf + w * w) / (2.0 * w * hf),
        -hf / (2.0 * w),
        -hf / (2.0 * w),
        (hf * hf + w * w) / (2.0 * w * hf),
    );

    let hs = params.mesh.structure_height;
    let a_s = 0.5 * w * hs;
    let structure_mass = Matrix2::new(a_s / 3.0, a_s / 12.0, a_s / 12.0, a_s / 6.0);
    let structure_stiffness = Matrix2::new(
        (hs * hs + w * w) / (2.0 * w * hs),
        -hs / (2.0 * w),
        -hs / (2.0 * w),
        (hs * hs + w * w) / (2.0 * w * hs),
    );

    let interface_mass = Matrix2::new(w / 3.0, w / 6.0, w / 6.0, w / 3.0);

    let fluid = fluid_mass * (p.rho_f / dt) + fluid_stiffness * p.viscosity;
    let structure = structure_mass * p.rho_s + structure_stiffness * (dt * dt * p.shear_modulus);

    let fluid_response = fluid.try_inverse().unwrap() * interface_mass;
    let structure_response = structure.try_inverse().unwrap() * interface_mass * dt;

    structure_response * structure_sign - fluid_response
}

fn one_cell_params(adjoint_type: u32) -> Parameters {
    let mut params = Parameters::default();
    params.mesh.nx = 1;
    params.mesh.ny_fluid = 1;
    params.mesh.ny_structure = 1;
    params.physical.rho_s = 2.0;
    params.fem.adjoint_type = adjoint_type;
    params
}

#[test]
fn one_cell_operator_matches_hand_assembled_jacobian() {
    for flag in [0, 1] {
        let params = one_cell_params(flag);
        let reference = one_cell_jacobian(&params, -1.0);
        let wrong_sign = one_cell_jacobian(&params, 1.0);

        let mut fsi = problem(params);
        fsi.advance_time();
        let mut op = fsi.linearized_operator(FactorStep::Initialize).unwrap();
        assert_eq!(op.dim(), 2);

        for j in 0..2 {
            let mut e = DVector::zeros(2);
            e[j] = 1.0;
            let column = op.apply(&e).unwrap();
            let expected = Vector2::new(reference[(0, j)], reference[(1, j)]);
            let mistaken = Vector2::new(wrong_sign[(0, j)], wrong_sign[(1, j)]);

            let column = Vector2::new(column[0], column[1]);
            assert!(
                (column - expected).norm() < 1e-10 * expected.norm(),
                "column {j} for adjoint type {flag}: {column} vs {expected}"
            );
            assert!((column - mistaken).norm() > 1e-6 * expected.norm());
        }
    }
}

#[test]
fn full_run_matches_interface_velocities() {
    for flag in [0, 1] {
        let mut params = small_params();
        params.fem.adjoint_type = flag;
        let mut fsi = problem(params.clone());

        let summary = fsi.run().unwrap();

        assert_eq!(summary.timesteps, 5);
        assert!((summary.final_time - 5.0 * params.time.time_step).abs() < 1e-12);
        assert!(summary.final_jump < params.fem.jump_tolerance);
        assert!(summary.gmres_calls >= 1);
        assert_eq!(summary.total_solves % 2, 0);

        // the wall drives the flow and the layer follows
        assert!(fsi.solution()[BlockId::Fluid].amax() > 1e-3);
        let interface = fsi.interface();
        let velocity = interface.restrict(fsi.solution(), BlockId::Structure, Field::Velocity);
        assert!(velocity.amax() > 0.0);

        // the structure mirror of the stress is in sync
        let fluid_stress = interface.restrict(fsi.stress(), BlockId::Fluid, Field::All);
        let mirror = interface.restrict(fsi.stress(), BlockId::Structure, Field::Displacement);
        assert_eq!(fluid_stress, mirror);
    }
}

#[test]
fn random_initial_guess_converges() {
    let mut params = small_params();
    params.fem.random_initial_guess = true;
    params.fem.seed = 7;
    params.time.n_time_steps = 2;

    let summary = problem(params.clone()).run().unwrap();
    assert!(summary.final_jump < params.fem.jump_tolerance);
}

#[test]
fn gmres_without_iterations_keeps_stress() {
    let mut fsi = problem(small_params());
    fsi.advance_time();
    let mut solves = 0;
    fsi.solve_state(&mut solves).unwrap();
    assert_eq!(solves, 2);
    let before = fsi.stress().clone();

    let status = fsi
        .optimization_gmres(&mut solves, INITIAL_TIMESTEP_NUMBER, false, 0)
        .unwrap();

    assert_eq!(status, GmresStatus::NotConverged);
    assert_eq!(status.code(), 1);
    assert_eq!(solves, 4);
    assert_eq!(fsi.stress(), &before);
}

#[test]
fn one_gmres_call_removes_the_jump() {
    let mut fsi = problem(small_params());
    fsi.advance_time();
    let mut solves = 0;
    fsi.solve_state(&mut solves).unwrap();
    let initial_jump = fsi.jump();
    assert!(initial_jump > 1e-6);

    let status = fsi
        .optimization_gmres(&mut solves, INITIAL_TIMESTEP_NUMBER, false, 50)
        .unwrap();
    assert!(status.is_converged());
    assert_eq!(fsi.gmres_calls(), 1);

    fsi.solve_state(&mut solves).unwrap();
    assert!(fsi.jump() < 1e-6 * initial_jump);
}

#[test]
fn velocity_and_displacement_matching_agree() {
    // d - d_old = Δt v holds exactly, so both coupling variables give the
    // same interface stress
    let mut stresses = Vec::new();
    for flag in [0, 1] {
        let mut params = small_params();
        params.fem.adjoint_type = flag;
        params.time.n_time_steps = 3;
        let mut fsi = problem(params);
        fsi.run().unwrap();
        stresses.push(fsi.interface_stress());
    }
    assert!((&stresses[0] - &stresses[1]).norm() < 1e-6 * stresses[0].norm().max(1e-12));
}

#[test]
fn exhausted_coupling_iterations_fail_the_timestep() {
    let mut params = small_params();
    params.fem.max_optimization_iterations = 0;
    let max_coupling = params.fem.max_coupling_iterations;
    let mut fsi = problem(params);
    let mut solves = 0;

    let result = fsi.step(&mut solves);

    match result {
        Err(Error::CouplingNotConverged { timestep, jump }) => {
            assert_eq!(timestep, 1);
            assert!(jump >= fsi.params().fem.jump_tolerance);
        }
        other => panic!("expected CouplingNotConverged, got {other:?}"),
    }
    assert_eq!(fsi.gmres_calls(), max_coupling);
    // one state solve per attempt plus the initial residual of each GMRES call
    assert_eq!(solves, 2 * (max_coupling + 1) + 2 * max_coupling);
    assert_eq!(fsi.stress(), &BlockVector::zeros_like(fsi.stress()));
}


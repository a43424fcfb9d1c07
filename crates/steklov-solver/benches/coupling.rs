//! Benchmarks for the interface GMRES and the coupled timestep.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use nalgebra::{DMatrix, DVector};
use steklov_core::Parameters;
use steklov_fem::FsiModel;
use steklov_solver::{FsiProblem, GmresConfig, MatrixCoupling, solve_coupling_gmres};

fn bench_gmres_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("gmres_matrix_coupling");

    for size in [8, 32, 128] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bencher, &size| {
            // Diagonally dominant, nonsymmetric band
            let a = DMatrix::from_fn(size, size, |i, j| {
                if i == j {
                    4.0
                } else if i + 1 == j {
                    -1.5
                } else if j + 1 == i {
                    -0.5
                } else {
                    0.0
                }
            });
            let b = DVector::from_fn(size, |i, _| (i + 1) as f64);
            let config = GmresConfig::default().with_tol(1e-10).with_max_iter(500);

            bencher.iter(|| {
                let mut problem = MatrixCoupling::new(a.clone(), b.clone()).unwrap();
                let mut solves = 0;
                solve_coupling_gmres(black_box(&mut problem), &config, &mut solves).unwrap()
            });
        });
    }

    group.finish();
}

fn bench_fsi_timestep(c: &mut Criterion) {
    let mut group = c.benchmark_group("fsi_timestep");
    group.sample_size(20);

    for nx in [4, 8, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(nx), &nx, |bencher, &nx| {
            let mut params = Parameters::default();
            params.mesh.nx = nx;
            params.mesh.ny_fluid = nx / 2;
            params.mesh.ny_structure = nx / 2;
            params.time.n_time_steps = 1;

            bencher.iter(|| {
                let (fluid, structure, interface) = FsiModel::build(&params).unwrap().into_parts();
                let mut fsi = FsiProblem::new(params.clone(), fluid, structure, interface).unwrap();
                fsi.run().unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_gmres_matrix, bench_fsi_timestep);
criterion_main!(benches);

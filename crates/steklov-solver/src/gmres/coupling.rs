//! Restarted GMRES driver for the interface equation `A x = b`.

use nalgebra::{DMatrix, DVector};
use steklov_core::{Error, Result};

use super::helpers::{back_substitute, rotate, rotmat};
use super::{GmresConfig, GmresReport, GmresStatus, RestartCycle};
use crate::operator::CouplingProblem;

/// Sub-physics solves hidden in one operator application.
pub const SOLVES_PER_APPLY: usize = 2;

/// Relative size of the new Arnoldi direction below which the Krylov space
/// is treated as invariant.
const BREAKDOWN_TOL: f64 = 1e-14;

fn apply<P: CouplingProblem + ?Sized>(
    problem: &mut P,
    x: &DVector<f64>,
    total_solves: &mut usize,
) -> Result<DVector<f64>> {
    let ax = problem.apply(x)?;
    *total_solves += SOLVES_PER_APPLY;
    if ax.len() != x.len() {
        return Err(Error::DimensionMismatch {
            expected: x.len(),
            actual: ax.len(),
        });
    }
    Ok(ax)
}

fn residual<P: CouplingProblem + ?Sized>(
    problem: &mut P,
    b: &DVector<f64>,
    x: &DVector<f64>,
    total_solves: &mut usize,
) -> Result<DVector<f64>> {
    Ok(b - apply(problem, x, total_solves)?)
}

/// Solve the interface equation of `problem` with restarted GMRES.
///
/// The starting iterate comes from [`CouplingProblem::initial_guess`]. Each
/// outer iteration recomputes the residual, runs up to `restart` Arnoldi
/// steps orthogonalized with the problem's inner product, updates the
/// iterate and checks the true residual. On convergence the accumulated
/// iterate is passed to [`CouplingProblem::commit`]. This includes the case
/// where the initial guess already meets the tolerance: the guess itself is
/// committed and no Arnoldi step runs. When `max_iter` is exhausted nothing
/// is committed and the report carries [`GmresStatus::NotConverged`]. An
/// error from [`CouplingProblem::apply`] aborts the solve without a commit.
///
/// Every operator application adds [`SOLVES_PER_APPLY`] to `total_solves`.
pub fn solve_coupling_gmres<P: CouplingProblem + ?Sized>(
    problem: &mut P,
    config: &GmresConfig,
    total_solves: &mut usize,
) -> Result<GmresReport> {
    let n = problem.dim();
    let b = problem.rhs()?;
    if b.len() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            actual: b.len(),
        });
    }
    let mut x = problem.initial_guess();
    if x.len() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            actual: x.len(),
        });
    }

    let mut bnrm2 = problem.norm(&b);
    if bnrm2 == 0.0 {
        bnrm2 = 1.0;
    }
    log::debug!("bnrm2 = {bnrm2:.6e}");

    let r = residual(problem, &b, &x, total_solves)?;
    let mut error = problem.norm(&r) / bnrm2;
    let mut report = GmresReport {
        status: GmresStatus::Converged,
        iterations: 0,
        initial_error: error,
        error,
        cycles: Vec::new(),
    };

    if error < config.tol {
        log::info!("Error sufficiently small before running algorithm ({error:.3e})");
        problem.commit(&x)?;
        return Ok(report);
    }

    let m = config.restart.min(n).max(1);

    for iter in 0..config.max_iter {
        report.iterations = iter + 1;

        let r = residual(problem, &b, &x, total_solves)?;
        let r_norm = problem.norm(&r);
        log::debug!("GMRES iteration {}: r_norm = {r_norm:.6e}", iter + 1);
        if r_norm == 0.0 {
            report.error = 0.0;
            problem.commit(&x)?;
            return Ok(report);
        }

        let mut v = DMatrix::<f64>::zeros(n, m + 1);
        v.set_column(0, &(r / r_norm));
        let mut h = DMatrix::<f64>::zeros(m + 1, m);
        let mut s = DVector::<f64>::zeros(m + 1);
        s[0] = r_norm;
        let mut cs = vec![0.0; m];
        let mut sn = vec![0.0; m];
        let mut estimates = Vec::with_capacity(m);
        let mut h_size = m;

        for i in 0..m {
            let vi = v.column(i).into_owned();
            let mut w = apply(problem, &vi, total_solves)?;
            let w_scale = problem.norm(&w);

            // Modified Gram-Schmidt
            for k in 0..=i {
                let vk = v.column(k).into_owned();
                let hk = problem.inner_product(&w, &vk);
                h[(k, i)] = hk;
                w.axpy(-hk, &vk, 1.0);
            }

            let w_norm = problem.norm(&w);
            h[(i + 1, i)] = w_norm;
            let breakdown = w_norm <= BREAKDOWN_TOL * w_scale;
            if !breakdown {
                v.set_column(i + 1, &(w / w_norm));
            }

            for k in 0..i {
                let (upper, lower) = rotate(cs[k], sn[k], h[(k, i)], h[(k + 1, i)]);
                h[(k, i)] = upper;
                h[(k + 1, i)] = lower;
            }

            let (c, sv) = rotmat(h[(i, i)], h[(i + 1, i)]);
            cs[i] = c;
            sn[i] = sv;

            let (si, si1) = rotate(c, sv, s[i], s[i + 1]);
            s[i] = si;
            s[i + 1] = si1;
            h[(i, i)] = c * h[(i, i)] + sv * h[(i + 1, i)];
            h[(i + 1, i)] = 0.0;

            error = s[i + 1].abs() / bnrm2;
            estimates.push(error);
            log::trace!("GMRES step {}: estimate = {error:.6e}", i + 1);

            if breakdown {
                log::debug!("Krylov space invariant after {} steps", i + 1);
                h_size = i + 1;
                break;
            }
        }

        let y = back_substitute(&h, &s, h_size);
        x += v.columns(0, h_size) * y;

        let r = residual(problem, &b, &x, total_solves)?;
        error = problem.norm(&r) / bnrm2;
        log::info!("GMRES iteration {}: error = {error:.6e}", iter + 1);

        report.cycles.push(RestartCycle { estimates, error });
        report.error = error;

        if error <= config.tol {
            problem.commit(&x)?;
            return Ok(report);
        }
    }

    log::warn!(
        "GMRES did not converge in {} iterations (error = {error:.3e}, tol = {:.3e})",
        config.max_iter,
        config.tol
    );
    report.status = GmresStatus::NotConverged;
    Ok(report)
}

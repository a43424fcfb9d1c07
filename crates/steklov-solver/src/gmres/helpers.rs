//! Givens rotations and triangular back-substitution for the GMRES driver.

use nalgebra::{DMatrix, DVector};

/// Compute Givens rotation coefficients for `a` and `b`.
///
/// Returns `(c, s)` such that:
/// ```text
/// [ c  s ] [ a ]   [ r ]
/// [-s  c ] [ b ] = [ 0 ]
/// ```
///
/// The branch on the larger magnitude keeps `t` in `[-1, 1]`. The branching
/// and the order of operations are fixed so results are reproducible bit for
/// bit.
pub fn rotmat(a: f64, b: f64) -> (f64, f64) {
    if b == 0.0 {
        (1.0, 0.0)
    } else if b.abs() > a.abs() {
        let temp = a / b;
        let s = 1.0 / (1.0 + temp.powi(2)).sqrt();
        (temp * s, s)
    } else {
        let temp = b / a;
        let c = 1.0 / (1.0 + temp.powi(2)).sqrt();
        (c, temp * c)
    }
}

/// Apply the rotation `(c, s)` to the pair `(x, y)`.
#[inline]
pub fn rotate(c: f64, s: f64, x: f64, y: f64) -> (f64, f64) {
    (c * x + s * y, -s * x + c * y)
}

/// Solve the leading `k × k` upper-triangular block of `h` against `g[0..k]`.
///
/// Zero pivots leave the corresponding unknown at zero.
pub fn back_substitute(h: &DMatrix<f64>, g: &DVector<f64>, k: usize) -> DVector<f64> {
    let mut y = DVector::zeros(k);
    for i in (0..k).rev() {
        let mut sum = g[i];
        for j in (i + 1)..k {
            sum -= h[(i, j)] * y[j];
        }
        if h[(i, i)] != 0.0 {
            y[i] = sum / h[(i, i)];
        }
    }
    y
}

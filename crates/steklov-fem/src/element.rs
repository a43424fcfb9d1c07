//! Linear (P1) element matrices and their parallel global assembly.

use nalgebra::{DMatrix, DVector, Matrix2, Matrix3, Point2};
use rayon::prelude::*;

use crate::mesh::RectangleMesh;

/// Signed area of a triangle (positive for counterclockwise vertices).
pub fn signed_area(v: &[Point2<f64>; 3]) -> f64 {
    0.5 * ((v[1].x - v[0].x) * (v[2].y - v[0].y) - (v[2].x - v[0].x) * (v[1].y - v[0].y))
}

/// Element stiffness `∫ ∇φ_i · ∇φ_j`.
pub fn stiffness(v: &[Point2<f64>; 3]) -> Matrix3<f64> {
    let area = signed_area(v).abs();
    let mut b = [0.0; 3];
    let mut c = [0.0; 3];
    for i in 0..3 {
        let j = (i + 1) % 3;
        let k = (i + 2) % 3;
        b[i] = v[j].y - v[k].y;
        c[i] = v[k].x - v[j].x;
    }
    Matrix3::from_fn(|i, j| (b[i] * b[j] + c[i] * c[j]) / (4.0 * area))
}

/// Consistent element mass `∫ φ_i φ_j`.
pub fn mass(v: &[Point2<f64>; 3]) -> Matrix3<f64> {
    let area = signed_area(v).abs();
    Matrix3::from_fn(|i, j| if i == j { area / 6.0 } else { area / 12.0 })
}

/// Consistent mass of a line segment of length `h`.
pub fn edge_mass(h: f64) -> Matrix2<f64> {
    Matrix2::new(h / 3.0, h / 6.0, h / 6.0, h / 3.0)
}

/// Assemble an element matrix over all triangles into global triplets.
///
/// Elements are processed in parallel; each produces its own triplet list.
pub fn assemble_triplets<E>(mesh: &RectangleMesh, element: E) -> Vec<(usize, usize, f64)>
where
    E: Fn(&[Point2<f64>; 3]) -> Matrix3<f64> + Sync,
{
    let local: Vec<Vec<(usize, usize, f64)>> = mesh
        .triangles()
        .par_iter()
        .map(|triangle| {
            let k = element(&mesh.vertices(triangle));
            let mut entries = Vec::with_capacity(9);
            for (i, &row) in triangle.iter().enumerate() {
                for (j, &col) in triangle.iter().enumerate() {
                    entries.push((row, col, k[(i, j)]));
                }
            }
            entries
        })
        .collect();
    local.into_iter().flatten().collect()
}

/// Mass matrix of a polyline through points with the given coordinates.
pub fn line_mass(coords: &[f64]) -> DMatrix<f64> {
    let n = coords.len();
    let mut m = DMatrix::zeros(n, n);
    for e in 0..n.saturating_sub(1) {
        let local = edge_mass((coords[e + 1] - coords[e]).abs());
        for i in 0..2 {
            for j in 0..2 {
                m[(e + i, e + j)] += local[(i, j)];
            }
        }
    }
    m
}

/// `y = A x` for a matrix in triplet form.
pub fn triplet_mul(triplets: &[(usize, usize, f64)], x: &DVector<f64>) -> DVector<f64> {
    let mut y = DVector::zeros(x.len());
    for &(row, col, value) in triplets {
        y[row] += value * x[col];
    }
    y
}

//! Structured triangle meshes of axis-aligned rectangles.

use nalgebra::Point2;

/// Rectangle `[0, width] × [y0, y0 + height]` split into `nx × ny` cells,
/// each cut into two triangles along its rising diagonal.
///
/// Node `(i, j)` (column `i`, row `j`) has index `j * (nx + 1) + i`.
#[derive(Debug, Clone)]
pub struct RectangleMesh {
    nx: usize,
    ny: usize,
    nodes: Vec<Point2<f64>>,
    triangles: Vec<[usize; 3]>,
}

impl RectangleMesh {
    pub fn new(nx: usize, ny: usize, width: f64, y0: f64, height: f64) -> Self {
        let dx = width / nx as f64;
        let dy = height / ny as f64;

        let mut nodes = Vec::with_capacity((nx + 1) * (ny + 1));
        for j in 0..=ny {
            for i in 0..=nx {
                nodes.push(Point2::new(i as f64 * dx, y0 + j as f64 * dy));
            }
        }

        let mut triangles = Vec::with_capacity(2 * nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let n00 = j * (nx + 1) + i;
                let n10 = n00 + 1;
                let n01 = n00 + nx + 1;
                let n11 = n01 + 1;
                triangles.push([n00, n10, n11]);
                triangles.push([n00, n11, n01]);
            }
        }

        Self {
            nx,
            ny,
            nodes,
            triangles,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[Point2<f64>] {
        &self.nodes
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Vertex coordinates of a triangle.
    pub fn vertices(&self, triangle: &[usize; 3]) -> [Point2<f64>; 3] {
        triangle.map(|n| self.nodes[n])
    }

    /// Nodes on the bottom edge, ordered by `x`.
    pub fn bottom_nodes(&self) -> Vec<usize> {
        (0..=self.nx).collect()
    }

    /// Nodes on the top edge, ordered by `x`.
    pub fn top_nodes(&self) -> Vec<usize> {
        let offset = self.ny * (self.nx + 1);
        (offset..=offset + self.nx).collect()
    }

    /// `x` coordinates of the given nodes.
    pub fn x_coords(&self, nodes: &[usize]) -> Vec<f64> {
        nodes.iter().map(|&n| self.nodes[n].x).collect()
    }
}

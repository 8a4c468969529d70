use super::ReferenceElement;
use nalgebra::{Point2, Vector2};

/// Barycentric coordinates of a point on the reference triangle.
fn barycentric(xi: &Point2<f64>) -> [f64; 3] {
    [-0.5 * xi.x - 0.5 * xi.y, 0.5 * xi.x + 0.5, 0.5 * xi.y + 0.5]
}

/// Reference gradients of the barycentric coordinates.
const BARYCENTRIC_GRADIENTS: [[f64; 2]; 3] = [[-0.5, -0.5], [0.5, 0.0], [0.0, 0.5]];

fn barycentric_gradient(i: usize) -> Vector2<f64> {
    Vector2::from(BARYCENTRIC_GRADIENTS[i])
}

fn reference_vertices() -> [Point2<f64>; 3] {
    [Point2::new(-1.0, -1.0), Point2::new(1.0, -1.0), Point2::new(-1.0, 1.0)]
}

/// Linear Lagrange basis on triangles (P1).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Tri3Element;

impl ReferenceElement for Tri3Element {
    fn num_nodes(&self) -> usize {
        3
    }

    fn degree(&self) -> usize {
        1
    }

    fn dofs_per_edge(&self) -> usize {
        0
    }

    fn populate_basis(&self, basis_values: &mut [f64], xi: &Point2<f64>) {
        assert_eq!(basis_values.len(), 3);
        basis_values.copy_from_slice(&barycentric(xi));
    }

    fn populate_basis_gradients(&self, gradients: &mut [Vector2<f64>], _xi: &Point2<f64>) {
        assert_eq!(gradients.len(), 3);
        for (i, gradient) in gradients.iter_mut().enumerate() {
            *gradient = barycentric_gradient(i);
        }
    }

    fn reference_nodes(&self) -> Vec<Point2<f64>> {
        reference_vertices().to_vec()
    }
}

/// Quadratic Lagrange basis on triangles (P2).
///
/// Nodes 0, 1, 2 are the vertices and nodes 3, 4, 5 the midpoints of the edges
/// `(0, 1)`, `(1, 2)` and `(2, 0)`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Tri6Element;

impl ReferenceElement for Tri6Element {
    fn num_nodes(&self) -> usize {
        6
    }

    fn degree(&self) -> usize {
        2
    }

    fn dofs_per_edge(&self) -> usize {
        1
    }

    fn populate_basis(&self, basis_values: &mut [f64], xi: &Point2<f64>) {
        assert_eq!(basis_values.len(), 6);
        let l = barycentric(xi);
        for i in 0..3 {
            basis_values[i] = l[i] * (2.0 * l[i] - 1.0);
            basis_values[3 + i] = 4.0 * l[i] * l[(i + 1) % 3];
        }
    }

    fn populate_basis_gradients(&self, gradients: &mut [Vector2<f64>], xi: &Point2<f64>) {
        assert_eq!(gradients.len(), 6);
        let l = barycentric(xi);
        for i in 0..3 {
            let j = (i + 1) % 3;
            gradients[i] = barycentric_gradient(i) * (4.0 * l[i] - 1.0);
            gradients[3 + i] = (barycentric_gradient(i) * l[j] + barycentric_gradient(j) * l[i]) * 4.0;
        }
    }

    fn reference_nodes(&self) -> Vec<Point2<f64>> {
        let v = reference_vertices();
        let mut nodes = v.to_vec();
        for i in 0..3 {
            nodes.push(nalgebra::center(&v[i], &v[(i + 1) % 3]));
        }
        nodes
    }
}

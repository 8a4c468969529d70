//! Reference elements and element geometry.
use crate::FemError;
use itertools::Itertools;
use nalgebra::{distance, Matrix2, Point2, Vector2};
use std::fmt::Debug;

mod triangle;

pub use triangle::*;

/// Relative threshold below which a Jacobian determinant is considered zero.
///
/// The determinant is compared against `DEGENERACY_TOLERANCE * diameter^2`.
pub const DEGENERACY_TOLERANCE: f64 = 1e-12;

/// A finite element defined on the reference triangle `(-1, -1), (1, -1), (-1, 1)`.
///
/// Local DOFs are ordered with the three vertex DOFs first. Elements with edge DOFs place the DOF
/// of local edge `k` (joining vertex `k` and vertex `(k + 1) % 3`) at local index `3 + k`.
pub trait ReferenceElement: Debug + Sync {
    /// Number of local basis functions.
    fn num_nodes(&self) -> usize;

    /// Polynomial degree of the basis.
    fn degree(&self) -> usize;

    /// Number of DOFs attached to the interior of each edge.
    fn dofs_per_edge(&self) -> usize;

    /// Evaluates every basis function at `xi`.
    ///
    /// `basis_values` must have length [`num_nodes`](Self::num_nodes).
    fn populate_basis(&self, basis_values: &mut [f64], xi: &Point2<f64>);

    /// Evaluates the reference gradient of every basis function at `xi`.
    fn populate_basis_gradients(&self, gradients: &mut [Vector2<f64>], xi: &Point2<f64>);

    /// Reference coordinates of the nodes associated with each local DOF.
    fn reference_nodes(&self) -> Vec<Point2<f64>>;

    /// Local DOF indices that do not vanish on local facet `facet`.
    fn facet_local_dofs(&self, facet: usize) -> Vec<usize> {
        assert!(facet < 3, "triangles have three facets");
        let mut dofs = vec![facet, (facet + 1) % 3];
        if self.dofs_per_edge() > 0 {
            dofs.push(3 + facet);
        }
        dofs
    }
}

impl<'a, E> ReferenceElement for &'a E
where
    E: ?Sized + ReferenceElement,
{
    fn num_nodes(&self) -> usize {
        E::num_nodes(self)
    }

    fn degree(&self) -> usize {
        E::degree(self)
    }

    fn dofs_per_edge(&self) -> usize {
        E::dofs_per_edge(self)
    }

    fn populate_basis(&self, basis_values: &mut [f64], xi: &Point2<f64>) {
        E::populate_basis(self, basis_values, xi)
    }

    fn populate_basis_gradients(&self, gradients: &mut [Vector2<f64>], xi: &Point2<f64>) {
        E::populate_basis_gradients(self, gradients, xi)
    }

    fn reference_nodes(&self) -> Vec<Point2<f64>> {
        E::reference_nodes(self)
    }

    fn facet_local_dofs(&self, facet: usize) -> Vec<usize> {
        E::facet_local_dofs(self, facet)
    }
}

/// The affine map from the reference triangle to a physical triangle.
///
/// Vertices are expected in counter-clockwise order; clockwise triangles have a negative
/// Jacobian determinant and are rejected by [`check_nondegenerate`](Self::check_nondegenerate).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AffineTriangle {
    vertices: [Point2<f64>; 3],
}

impl AffineTriangle {
    pub fn from_vertices(vertices: [Point2<f64>; 3]) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point2<f64>; 3] {
        &self.vertices
    }

    /// The constant Jacobian `dx/dxi` of the reference map.
    pub fn jacobian(&self) -> Matrix2<f64> {
        let [a, b, c] = &self.vertices;
        Matrix2::from_columns(&[(b - a) * 0.5, (c - a) * 0.5])
    }

    pub fn determinant(&self) -> f64 {
        self.jacobian().determinant()
    }

    pub fn map_reference_coords(&self, xi: &Point2<f64>) -> Point2<f64> {
        let shifted = xi.coords + Vector2::new(1.0, 1.0);
        self.vertices[0] + self.jacobian() * shifted
    }

    /// Signed area. Positive for counter-clockwise vertices.
    pub fn area(&self) -> f64 {
        // The reference triangle has area 2
        2.0 * self.determinant()
    }

    pub fn diameter(&self) -> f64 {
        self.vertices
            .iter()
            .tuple_combinations()
            .map(|(x, y)| distance(x, y))
            .fold(0.0, f64::max)
    }

    /// The two vertices of local facet `facet`, in facet order.
    pub fn facet_vertices(&self, facet: usize) -> [Point2<f64>; 2] {
        [self.vertices[facet % 3], self.vertices[(facet + 1) % 3]]
    }

    pub fn facet_length(&self, facet: usize) -> f64 {
        let [a, b] = self.facet_vertices(facet);
        distance(&a, &b)
    }

    /// Unit normal of local facet `facet`, pointing out of the triangle.
    pub fn outward_normal(&self, facet: usize) -> Vector2<f64> {
        let [a, b] = self.facet_vertices(facet);
        let tangent = b - a;
        // Clockwise rotation of the tangent points outward for counter-clockwise triangles
        Vector2::new(tangent.y, -tangent.x).normalize()
    }

    /// Returns an error if the Jacobian determinant is not safely positive.
    ///
    /// `element` is only used to label the error.
    pub fn check_nondegenerate(&self, element: usize) -> Result<(), FemError> {
        let determinant = self.determinant();
        let threshold = DEGENERACY_TOLERANCE * self.diameter().powi(2);
        if determinant > threshold {
            Ok(())
        } else {
            Err(FemError::DegenerateElement { element, determinant })
        }
    }

    /// The inverse transpose of the Jacobian, used to map reference gradients to physical ones.
    pub fn inverse_transpose_jacobian(&self) -> Option<Matrix2<f64>> {
        self.jacobian().try_inverse().map(|j_inv| j_inv.transpose())
    }
}

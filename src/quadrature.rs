//! Quadrature rules keyed by reference shape and polynomial degree.
//!
//! The tables themselves live in `tagfem-quadrature`; this module wraps them in nalgebra points
//! and maps their errors into [`FemError`].
use crate::FemError;
use nalgebra::{Const, OPoint, Point1, Point2};
use serde::{Deserialize, Serialize};

/// Reference domains for which quadrature rules are available.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceShape {
    /// The interval `[-1, 1]`.
    Segment,
    /// The triangle with corners `(-1, -1)`, `(1, -1)`, `(-1, 1)`.
    Triangle,
}

impl ReferenceShape {
    pub fn dim(&self) -> usize {
        match self {
            Self::Segment => 1,
            Self::Triangle => 2,
        }
    }
}

/// A quadrature rule on a `D`-dimensional reference domain.
///
/// Weights are scaled so that they sum to the measure of the reference domain.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureRule<const D: usize> {
    weights: Vec<f64>,
    points: Vec<OPoint<f64, Const<D>>>,
}

impl<const D: usize> QuadratureRule<D> {
    pub fn from_weights_and_points(weights: Vec<f64>, points: Vec<OPoint<f64, Const<D>>>) -> Self {
        assert_eq!(weights.len(), points.len(), "weights and points must have equal length");
        Self { weights, points }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn points(&self) -> &[OPoint<f64, Const<D>>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Iterates over `(weight, point)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &OPoint<f64, Const<D>>)> {
        self.weights.iter().copied().zip(self.points.iter())
    }

    /// Approximates the integral of `f` over the reference domain.
    pub fn integrate(&self, mut f: impl FnMut(&OPoint<f64, Const<D>>) -> f64) -> f64 {
        self.iter().map(|(w, xi)| w * f(xi)).sum()
    }
}

/// Returns a rule for `shape` that integrates polynomials of total degree `degree` exactly.
///
/// Fails with [`FemError::UnsupportedShape`] if `D` does not match the dimension of `shape` or
/// no rule of sufficient degree is tabulated.
pub fn rule<const D: usize>(shape: ReferenceShape, degree: usize) -> Result<QuadratureRule<D>, FemError> {
    let unsupported = || FemError::UnsupportedShape { shape, degree };
    if shape.dim() != D {
        return Err(unsupported());
    }

    let (weights, points): (Vec<f64>, Vec<Vec<f64>>) = match shape {
        ReferenceShape::Segment => {
            let (w, p) = tagfem_quadrature::univariate::gauss_for_strength(degree);
            (w, p.iter().map(|p| p.to_vec()).collect())
        }
        ReferenceShape::Triangle => {
            let (w, p) = tagfem_quadrature::triangle::triangle(degree).map_err(|_| unsupported())?;
            (w, p.iter().map(|p| p.to_vec()).collect())
        }
    };

    // Lengths match D by the dimension check above
    let points = points
        .iter()
        .map(|p| OPoint::<f64, Const<D>>::from_slice(p))
        .collect();
    Ok(QuadratureRule { weights, points })
}

/// Rule on the reference triangle of the given degree.
pub fn triangle(degree: usize) -> Result<QuadratureRule<2>, FemError> {
    rule(ReferenceShape::Triangle, degree)
}

/// Gauss-Legendre rule on `[-1, 1]` of the given degree. Every degree is available.
pub fn segment(degree: usize) -> QuadratureRule<1> {
    let (weights, points) = tagfem_quadrature::univariate::gauss_for_strength(degree);
    let points = points.into_iter().map(|[x]| Point1::new(x)).collect();
    QuadratureRule { weights, points }
}

/// Maps a point on the reference segment onto local facet `facet` of the reference triangle.
///
/// The facet parameterization runs from vertex `facet` to vertex `(facet + 1) % 3`.
pub fn reference_triangle_facet_point(facet: usize, t: f64) -> Point2<f64> {
    let corners = [Point2::new(-1.0, -1.0), Point2::new(1.0, -1.0), Point2::new(-1.0, 1.0)];
    let a = corners[facet % 3].coords;
    let b = corners[(facet + 1) % 3].coords;
    Point2::from(a * (0.5 * (1.0 - t)) + b * (0.5 * (1.0 + t)))
}

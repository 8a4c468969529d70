//! Weak forms evaluated pointwise at quadrature points.
//!
//! A form receives the value and physical gradient of a basis function together with geometric
//! data about the quadrature point and returns the integrand. The assemblers take care of
//! quadrature weights and Jacobian determinants.
//!
//! Closures with the matching signature are forms, so ad-hoc forms need no new types:
//!
//! ```
//! # use tagfem::assembly::forms::{BasisValue, ElementPoint};
//! let weighted_mass = |u: &BasisValue, v: &BasisValue, p: &ElementPoint| (1.0 + p.x.x) * u.value * v.value;
//! # let _ = weighted_mass;
//! ```
use nalgebra::{Point2, Vector2};

/// Value and physical gradient of a basis function at a quadrature point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BasisValue {
    pub value: f64,
    pub gradient: Vector2<f64>,
}

/// A quadrature point in the interior of an element.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ElementPoint {
    /// Physical coordinates.
    pub x: Point2<f64>,
    pub element: usize,
}

/// A quadrature point on a boundary facet.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FacetPoint {
    /// Physical coordinates.
    pub x: Point2<f64>,
    /// Unit outward normal of the owning element.
    pub normal: Vector2<f64>,
    pub element: usize,
    /// Local facet index in the owning element.
    pub facet: usize,
}

/// A bilinear form `a(u, v)` integrated over element interiors.
pub trait BilinearForm: Sync {
    /// Quadrature degree required for basis functions of polynomial degree `element_degree`.
    fn quadrature_degree(&self, element_degree: usize) -> usize {
        2 * element_degree
    }

    fn evaluate(&self, trial: &BasisValue, test: &BasisValue, point: &ElementPoint) -> f64;
}

/// A linear form `l(v)` integrated over element interiors.
pub trait LinearForm: Sync {
    fn quadrature_degree(&self, element_degree: usize) -> usize {
        2 * element_degree + 2
    }

    fn evaluate(&self, test: &BasisValue, point: &ElementPoint) -> f64;
}

/// A linear form `l(v)` integrated over boundary facets.
pub trait FacetLinearForm: Sync {
    fn quadrature_degree(&self, element_degree: usize) -> usize {
        2 * element_degree
    }

    fn evaluate(&self, test: &BasisValue, point: &FacetPoint) -> f64;
}

impl<F> BilinearForm for F
where
    F: Sync + Fn(&BasisValue, &BasisValue, &ElementPoint) -> f64,
{
    fn evaluate(&self, trial: &BasisValue, test: &BasisValue, point: &ElementPoint) -> f64 {
        self(trial, test, point)
    }
}

impl<F> LinearForm for F
where
    F: Sync + Fn(&BasisValue, &ElementPoint) -> f64,
{
    fn evaluate(&self, test: &BasisValue, point: &ElementPoint) -> f64 {
        self(test, point)
    }
}

impl<F> FacetLinearForm for F
where
    F: Sync + Fn(&BasisValue, &FacetPoint) -> f64,
{
    fn evaluate(&self, test: &BasisValue, point: &FacetPoint) -> f64 {
        self(test, point)
    }
}

/// The Laplace form `grad u . grad v`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Laplace;

impl BilinearForm for Laplace {
    fn quadrature_degree(&self, element_degree: usize) -> usize {
        2 * element_degree.saturating_sub(1)
    }

    fn evaluate(&self, trial: &BasisValue, test: &BasisValue, _point: &ElementPoint) -> f64 {
        trial.gradient.dot(&test.gradient)
    }
}

/// The mass form `u v`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Mass;

impl BilinearForm for Mass {
    fn evaluate(&self, trial: &BasisValue, test: &BasisValue, _point: &ElementPoint) -> f64 {
        trial.value * test.value
    }
}

/// The load form `f v` for a scalar function `f`.
#[derive(Debug, Copy, Clone)]
pub struct Source<F>(pub F);

impl<F> LinearForm for Source<F>
where
    F: Sync + Fn(&Point2<f64>) -> f64,
{
    fn evaluate(&self, test: &BasisValue, point: &ElementPoint) -> f64 {
        (self.0)(&point.x) * test.value
    }
}

/// The boundary flux form `n . grad v`.
///
/// Assembled over a facet set `S` into a vector `b`, the product `b . u` is the outward flux
/// `int_S n . grad u` of the discrete field `u`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct NormalFlux;

impl FacetLinearForm for NormalFlux {
    fn quadrature_degree(&self, element_degree: usize) -> usize {
        element_degree.saturating_sub(1)
    }

    fn evaluate(&self, test: &BasisValue, point: &FacetPoint) -> f64 {
        point.normal.dot(&test.gradient)
    }
}

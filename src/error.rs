//! Library-wide error type.
use crate::quadrature::ReferenceShape;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Errors raised by space construction, assembly, condensation and solves.
///
/// All variants are fatal to the operation that produced them; no partial results are returned.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum FemError {
    /// The mesh connectivity or a boundary tag references entities that do not exist,
    /// or a tagged facet is not a boundary facet of its owning element.
    InconsistentTopology { reason: String },
    /// No quadrature rule exists for the requested reference shape and degree.
    UnsupportedShape { shape: ReferenceShape, degree: usize },
    /// An element has a zero or negative Jacobian determinant.
    DegenerateElement { element: usize, determinant: f64 },
    /// Condensation left no free degrees of freedom.
    EmptyFreeSet,
    /// The linear system is (numerically) singular.
    SingularSystem { reason: String },
    /// An iterative solver exhausted its iteration budget.
    NoConvergence { iterations: usize },
    /// The mesh carries no boundary with the given tag.
    UnknownBoundaryTag { tag: String },
}

impl Display for FemError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InconsistentTopology { reason } => write!(f, "Inconsistent mesh topology: {}", reason),
            Self::UnsupportedShape { shape, degree } => {
                write!(f, "No quadrature rule of degree {} available for shape {:?}", degree, shape)
            }
            Self::DegenerateElement { element, determinant } => write!(
                f,
                "Element {} is degenerate (Jacobian determinant {:e})",
                element, determinant
            ),
            Self::EmptyFreeSet => write!(f, "All degrees of freedom are fixed, nothing to solve for"),
            Self::SingularSystem { reason } => write!(f, "Linear system is singular: {}", reason),
            Self::NoConvergence { iterations } => {
                write!(f, "Iterative solver did not converge within {} iterations", iterations)
            }
            Self::UnknownBoundaryTag { tag } => write!(f, "Mesh has no boundary tagged \"{}\"", tag),
        }
    }
}

impl std::error::Error for FemError {}

//! Quadrature rules for finite element reference domains.
//!
//! The rules are plain `f64` tables and do not depend on any linear algebra library, so that
//! `tagfem` can convert them into whatever point type it needs.
//!
//! Reference domains:
//!
//! - segment: the interval `[-1, 1]`,
//! - triangle: the triangle with corners `(-1, -1)`, `(1, -1)`, `(-1, 1)`, which has area 2.
//!
//! Rules are requested by *strength*: a rule of strength `k` integrates every polynomial of
//! total degree at most `k` exactly.

use std::fmt;
use std::fmt::{Display, Formatter};

pub mod triangle;
pub mod univariate;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Indicates that a rule satisfying the given requirements is not available.
    NoRuleAvailable,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuleAvailable => {
                write!(f, "There is no quadrature rule satisfying the requirements available")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A D-dimensional rule, stored as `(weights, points)`.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// A one-dimensional quadrature rule.
pub type Rule1d = Rule<1>;

/// A two-dimensional quadrature rule.
pub type Rule2d = Rule<2>;

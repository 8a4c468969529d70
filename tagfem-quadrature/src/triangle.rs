//! Symmetric quadrature rules for the reference triangle `(-1, -1), (1, -1), (-1, 1)`.
//!
//! The tables are the symmetric rules of Dunavant (1985), stored as barycentric orbits with
//! weights normalized to sum to one. They are expanded and scaled to the reference triangle on request.

use crate::{Error, Point, Rule2d};

/// The highest strength for which a triangle rule is available.
pub const MAX_STRENGTH: usize = 6;

/// A set of quadrature points generated by permuting barycentric coordinates.
#[derive(Debug, Clone, Copy)]
enum Orbit {
    /// The centroid `(1/3, 1/3, 1/3)`.
    Centroid { weight: f64 },
    /// The three permutations of `(a, a, 1 - 2a)`.
    Edge { a: f64, weight: f64 },
    /// The six permutations of `(a, b, 1 - a - b)`.
    General { a: f64, b: f64, weight: f64 },
}

const STRENGTH_1: &[Orbit] = &[Orbit::Centroid { weight: 1.0 }];

const STRENGTH_2: &[Orbit] = &[Orbit::Edge {
    a: 1.0 / 6.0,
    weight: 1.0 / 3.0,
}];

const STRENGTH_4: &[Orbit] = &[
    Orbit::Edge {
        a: 0.445948490915965,
        weight: 0.223381589678011,
    },
    Orbit::Edge {
        a: 0.091576213509771,
        weight: 0.109951743655322,
    },
];

const STRENGTH_5: &[Orbit] = &[
    Orbit::Centroid { weight: 0.225 },
    Orbit::Edge {
        a: 0.470142064105115,
        weight: 0.132394152788506,
    },
    Orbit::Edge {
        a: 0.101286507323456,
        weight: 0.125939180544827,
    },
];

const STRENGTH_6: &[Orbit] = &[
    Orbit::Edge {
        a: 0.249286745170910,
        weight: 0.116786275726379,
    },
    Orbit::Edge {
        a: 0.063089014491502,
        weight: 0.050844906370207,
    },
    Orbit::General {
        a: 0.053145049844817,
        b: 0.310352451033784,
        weight: 0.082851075618374,
    },
];

/// Area of the reference triangle.
const REFERENCE_AREA: f64 = 2.0;

fn orbits_for_strength(strength: usize) -> Option<&'static [Orbit]> {
    match strength {
        0 | 1 => Some(STRENGTH_1),
        2 => Some(STRENGTH_2),
        // Dunavant's strength 3 rule has a negative weight, so we use the strength 4 rule instead
        3 | 4 => Some(STRENGTH_4),
        5 => Some(STRENGTH_5),
        6 => Some(STRENGTH_6),
        _ => None,
    }
}

/// Maps barycentric coordinates to the reference triangle.
fn barycentric_to_reference([l0, l1, l2]: [f64; 3]) -> Point<2> {
    // Corners (-1, -1), (1, -1), (-1, 1)
    [-l0 + l1 - l2, -l0 - l1 + l2]
}

/// Returns a rule of the requested strength for the reference triangle.
///
/// Returns [`Error::NoRuleAvailable`] if `strength` exceeds [`MAX_STRENGTH`].
pub fn triangle(strength: usize) -> Result<Rule2d, Error> {
    let orbits = orbits_for_strength(strength).ok_or(Error::NoRuleAvailable)?;

    let mut weights = Vec::new();
    let mut points = Vec::new();
    let mut push = |barycentric: [f64; 3], weight: f64| {
        weights.push(REFERENCE_AREA * weight);
        points.push(barycentric_to_reference(barycentric));
    };

    for orbit in orbits {
        match *orbit {
            Orbit::Centroid { weight } => push([1.0 / 3.0; 3], weight),
            Orbit::Edge { a, weight } => {
                let c = 1.0 - 2.0 * a;
                push([c, a, a], weight);
                push([a, c, a], weight);
                push([a, a, c], weight);
            }
            Orbit::General { a, b, weight } => {
                let c = 1.0 - a - b;
                for barycentric in [[a, b, c], [b, c, a], [c, a, b], [b, a, c], [a, c, b], [c, b, a]] {
                    push(barycentric, weight);
                }
            }
        }
    }

    Ok((weights, points))
}

use crate::unit_tests::factorial;
use matrixcompare::assert_scalar_eq;
use tagfem_quadrature::triangle::{triangle, MAX_STRENGTH};
use tagfem_quadrature::Error;

/// Exact integral of `xi^a * eta^b` over the unit triangle `(0, 0), (1, 0), (0, 1)`.
fn unit_triangle_monomial_integral(a: u32, b: u32) -> f64 {
    factorial(a) * factorial(b) / factorial(a + b + 2)
}

#[test]
fn triangle_rules_have_expected_numbers_of_points() {
    let expected_sizes = [1, 1, 3, 6, 6, 7, 12];
    for (strength, &size) in expected_sizes.iter().enumerate() {
        let (weights, points) = triangle(strength).expect("Expected valid quadrature rule");
        assert_eq!(weights.len(), size);
        assert_eq!(points.len(), size);
    }
}

#[test]
fn no_triangle_rule_beyond_max_strength() {
    assert_eq!(triangle(MAX_STRENGTH + 1), Err(Error::NoRuleAvailable));
    assert_eq!(triangle(20), Err(Error::NoRuleAvailable));
}

#[test]
fn triangle_rules_integrate_monomials_exactly() {
    for strength in 0..=MAX_STRENGTH as u32 {
        let (weights, points) = triangle(strength as usize).unwrap();
        for a in 0..=strength {
            for b in 0..=(strength - a) {
                // Map reference coordinates back to the unit triangle, where the closed form is known.
                // The map has constant Jacobian determinant 4.
                let integral: f64 = weights
                    .iter()
                    .zip(&points)
                    .map(|(w, [x, y])| {
                        let xi = 0.5 * (x + 1.0);
                        let eta = 0.5 * (y + 1.0);
                        w * xi.powi(a as i32) * eta.powi(b as i32)
                    })
                    .sum();
                let expected = 4.0 * unit_triangle_monomial_integral(a, b);
                assert_scalar_eq!(integral, expected, comp = abs, tol = 1e-13);
            }
        }
    }
}

#[test]
fn triangle_points_lie_inside_reference_triangle() {
    for strength in 0..=MAX_STRENGTH {
        let (_, points) = triangle(strength).unwrap();
        for [x, y] in points {
            assert!(x > -1.0 && y > -1.0 && x + y < 0.0);
        }
    }
}

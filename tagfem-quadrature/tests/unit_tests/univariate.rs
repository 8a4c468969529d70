use matrixcompare::assert_scalar_eq;
use proptest::prelude::*;
use tagfem_quadrature::univariate::{gauss, gauss_for_strength};

/// Exact integral of `x^k` over `[-1, 1]`.
fn monomial_integral(k: u32) -> f64 {
    if k % 2 == 1 {
        0.0
    } else {
        2.0 / f64::from(k + 1)
    }
}

#[test]
fn gauss_has_requested_number_of_points() {
    for n in 1..=10 {
        let (weights, points) = gauss(n);
        assert_eq!(weights.len(), n);
        assert_eq!(points.len(), n);
    }
}

#[test]
fn gauss_small_rules_match_closed_form() {
    let (weights, points) = gauss(2);
    let x = 1.0 / f64::sqrt(3.0);
    assert_scalar_eq!(points[0][0], -x, comp = abs, tol = 1e-14);
    assert_scalar_eq!(points[1][0], x, comp = abs, tol = 1e-14);
    assert_scalar_eq!(weights[0], 1.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(weights[1], 1.0, comp = abs, tol = 1e-14);

    let (weights, points) = gauss(3);
    let x = f64::sqrt(3.0 / 5.0);
    assert_scalar_eq!(points[0][0], -x, comp = abs, tol = 1e-14);
    assert_scalar_eq!(points[1][0], 0.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(points[2][0], x, comp = abs, tol = 1e-14);
    assert_scalar_eq!(weights[0], 5.0 / 9.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(weights[1], 8.0 / 9.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(weights[2], 5.0 / 9.0, comp = abs, tol = 1e-14);
}

#[test]
fn gauss_for_strength_is_exact_for_monomials() {
    for strength in 0..=15u32 {
        let (weights, points) = gauss_for_strength(strength as usize);
        for k in 0..=strength {
            let integral: f64 = weights
                .iter()
                .zip(&points)
                .map(|(w, [x])| w * x.powi(k as i32))
                .sum();
            assert_scalar_eq!(integral, monomial_integral(k), comp = abs, tol = 1e-13);
        }
    }
}

proptest! {
    #[test]
    fn gauss_points_are_sorted_and_interior(n in 1usize..20) {
        let (weights, points) = gauss(n);
        prop_assert!(weights.iter().all(|&w| w > 0.0));
        prop_assert!(points.iter().all(|[x]| -1.0 < *x && *x < 1.0));
        prop_assert!(points.windows(2).all(|pair| pair[0][0] < pair[1][0]));
    }
}

//! Quadrature rules for the one-dimensional domain `[-1, 1]`.

use crate::Rule1d;
use std::f64::consts::PI;

/// Evaluates the Legendre polynomial `P_n` and its derivative at `x` in the open interval `(-1, 1)`.
fn legendre_with_derivative(n: usize, x: f64) -> (f64, f64) {
    // Bonnet's recursion:
    //  m P_m(x) = (2m - 1) x P_{m - 1}(x) - (m - 1) P_{m - 2}(x)
    let mut p_current = 1.0;
    let mut p_previous = 0.0;
    for m in 1..=n {
        let m = m as f64;
        let p_next = ((2.0 * m - 1.0) * x * p_current - (m - 1.0) * p_previous) / m;
        p_previous = p_current;
        p_current = p_next;
    }

    // P_n'(x) = n (x P_n(x) - P_{n - 1}(x)) / (x^2 - 1), undefined at |x| == 1
    let n = n as f64;
    let derivative = n * (x * p_current - p_previous) / (x * x - 1.0);
    (p_current, derivative)
}

/// Gauss-Legendre quadrature for the reference interval `[-1, 1]`.
///
/// With `n` points the rule integrates polynomials of degree up to `2n - 1` exactly.
/// The points are returned in ascending order.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss(num_points: usize) -> Rule1d {
    let n = num_points;
    assert!(n > 0, "number of points must be positive");

    let mut points = vec![[0.0]; n];
    let mut weights = vec![0.0; n];

    // The roots are symmetric about the origin, so only the first half is computed
    let half = (n + 1) / 2;
    for i in 0..half {
        // Chebyshev-like initial guess followed by Newton iterations
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut derivative = 0.0;
        for _ in 0..100 {
            let (p, dp) = legendre_with_derivative(n, x);
            derivative = dp;
            let dx = p / dp;
            x -= dx;
            if dx.abs() <= 1e-15 {
                let (_, dp) = legendre_with_derivative(n, x);
                derivative = dp;
                break;
            }
        }

        let w = 2.0 / ((1.0 - x * x) * derivative * derivative);
        // x is positive and decreasing with i, so we fill from both ends
        points[n - 1 - i] = [x];
        points[i] = [-x];
        weights[n - 1 - i] = w;
        weights[i] = w;
    }

    (weights, points)
}

/// The Gauss-Legendre rule with the fewest points that integrates polynomials of degree `strength`
/// exactly.
pub fn gauss_for_strength(strength: usize) -> Rule1d {
    gauss(strength / 2 + 1)
}

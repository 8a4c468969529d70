mod triangle;
mod univariate;

/// `n!` as a float.
pub fn factorial(n: u32) -> f64 {
    (1..=n).map(f64::from).product()
}

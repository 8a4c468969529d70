//! Sparse linear algebra used by `tagfem`.
//!
//! This crate builds on the storage formats of `nalgebra-sparse` and adds the few operations the
//! finite element pipeline needs: allocation-free sparse matrix-vector products and a
//! preconditioned Conjugate Gradient solver.
use nalgebra::{DVector, DVectorView, DVectorViewMut};
use nalgebra_sparse::CsrMatrix;

pub mod cg;

/// Computes `y = A x` for a CSR matrix `A`.
///
/// # Panics
///
/// Panics if the dimensions of `y`, `A` and `x` are not compatible.
pub fn spmv_into(mut y: DVectorViewMut<f64>, a: &CsrMatrix<f64>, x: DVectorView<f64>) {
    assert_eq!(a.nrows(), y.len(), "Output dimension must match number of rows");
    assert_eq!(a.ncols(), x.len(), "Input dimension must match number of columns");
    for (i, row) in a.row_iter().enumerate() {
        y[i] = row
            .col_indices()
            .iter()
            .zip(row.values())
            .map(|(&j, &a_ij)| a_ij * x[j])
            .sum();
    }
}

/// Computes `A x` for a CSR matrix `A`.
pub fn spmv(a: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    let mut y = DVector::zeros(a.nrows());
    spmv_into((&mut y).into(), a, x.into());
    y
}

/// Computes the quadratic form `x^T A y`.
pub fn quadratic_form(x: &DVector<f64>, a: &CsrMatrix<f64>, y: &DVector<f64>) -> f64 {
    x.dot(&spmv(a, y))
}

/// Returns the diagonal entries of a square CSR matrix, with zeros where no entry is stored.
pub fn diagonal(a: &CsrMatrix<f64>) -> DVector<f64> {
    assert_eq!(a.nrows(), a.ncols(), "Matrix must be square");
    DVector::from_iterator(
        a.nrows(),
        a.row_iter().enumerate().map(|(i, row)| {
            row.col_indices()
                .binary_search(&i)
                .map(|idx| row.values()[idx])
                .unwrap_or(0.0)
        }),
    )
}

//! Dirichlet condensation: splitting DOFs into fixed and free sets and reducing a global system
//! to the free set.
use crate::element::ReferenceElement;
use crate::space::FiniteElementSpace;
use crate::FemError;
use log::debug;
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

/// A partition of `0..num_dofs` into fixed DOFs with prescribed values and free DOFs.
#[derive(Debug, Clone, PartialEq)]
pub struct DofPartition {
    fixed: Vec<usize>,
    free: Vec<usize>,
    /// Full-length vector holding prescribed values on fixed DOFs and zero elsewhere.
    values: DVector<f64>,
}

impl DofPartition {
    /// Fixes `fixed_dofs[i]` to `prescribed[i]`.
    ///
    /// If a DOF is listed more than once, the last value wins.
    ///
    /// # Panics
    ///
    /// Panics if the slices differ in length or a DOF is out of bounds.
    pub fn new(num_dofs: usize, fixed_dofs: &[usize], prescribed: &[f64]) -> Self {
        assert_eq!(fixed_dofs.len(), prescribed.len(), "one prescribed value per fixed DOF");
        let mut is_fixed = vec![false; num_dofs];
        let mut values = DVector::zeros(num_dofs);
        for (&dof, &value) in fixed_dofs.iter().zip(prescribed) {
            assert!(dof < num_dofs, "fixed DOF {} out of bounds ({} DOFs)", dof, num_dofs);
            is_fixed[dof] = true;
            values[dof] = value;
        }

        let (fixed, free): (Vec<usize>, Vec<usize>) = (0..num_dofs).partition(|&dof| is_fixed[dof]);
        Self { fixed, free, values }
    }

    /// Fixes every DOF on each tagged boundary to a constant value.
    ///
    /// DOFs shared by several tags (for example at corners) take the value of the last tag listed.
    pub fn from_boundary_values<E>(space: &FiniteElementSpace<E>, boundary_values: &[(&str, f64)]) -> Result<Self, FemError>
    where
        E: ReferenceElement,
    {
        let mut fixed = Vec::new();
        let mut prescribed = Vec::new();
        for &(tag, value) in boundary_values {
            let dofs = space.dofs_for_boundary_tag(tag)?;
            prescribed.extend(std::iter::repeat(value).take(dofs.len()));
            fixed.extend(dofs);
        }
        Ok(Self::new(space.num_dofs(), &fixed, &prescribed))
    }

    pub fn num_dofs(&self) -> usize {
        self.values.len()
    }

    /// Fixed DOFs in ascending order.
    pub fn fixed(&self) -> &[usize] {
        &self.fixed
    }

    /// Free DOFs in ascending order. The `i`-th free DOF is row `i` of a condensed system.
    pub fn free(&self) -> &[usize] {
        &self.free
    }

    /// Full-length vector of prescribed values, zero on free DOFs.
    pub fn prescribed_values(&self) -> &DVector<f64> {
        &self.values
    }

    /// Builds the full solution from values on the free DOFs.
    ///
    /// # Panics
    ///
    /// Panics if `free_values` does not have one entry per free DOF.
    pub fn scatter(&self, free_values: &DVector<f64>) -> DVector<f64> {
        assert_eq!(free_values.len(), self.free.len());
        let mut u = self.values.clone();
        for (&dof, &value) in self.free.iter().zip(free_values.iter()) {
            u[dof] = value;
        }
        u
    }

    /// Restricts a full-length vector to the free DOFs.
    pub fn restrict(&self, u: &DVector<f64>) -> DVector<f64> {
        assert_eq!(u.len(), self.num_dofs());
        DVector::from_iterator(self.free.len(), self.free.iter().map(|&dof| u[dof]))
    }

    /// Reduces `matrix u = rhs` to the free DOFs. See [`condense`].
    pub fn condense(&self, matrix: &CsrMatrix<f64>, rhs: &DVector<f64>) -> Result<(CsrMatrix<f64>, DVector<f64>), FemError> {
        condense(matrix, rhs, &self.values, &self.fixed)
    }
}

/// Eliminates the fixed DOFs from `matrix u = rhs`.
///
/// `prescribed_values` is a full-length vector, only read at `fixed_dofs`. With `free` the
/// ascending complement of `fixed_dofs`, the result is
///
/// ```text
/// reduced_matrix = matrix[free, free]
/// reduced_rhs    = rhs[free] - matrix[free, fixed] * prescribed_values[fixed]
/// ```
///
/// The sparsity pattern of `matrix` restricted to the free block is kept as is, explicit zeros
/// included. Fails with [`FemError::EmptyFreeSet`] if every DOF is fixed.
///
/// # Panics
///
/// Panics if dimensions are inconsistent or a fixed DOF is out of bounds.
pub fn condense(
    matrix: &CsrMatrix<f64>,
    rhs: &DVector<f64>,
    prescribed_values: &DVector<f64>,
    fixed_dofs: &[usize],
) -> Result<(CsrMatrix<f64>, DVector<f64>), FemError> {
    let n = matrix.nrows();
    assert_eq!(matrix.ncols(), n, "matrix must be square");
    assert_eq!(rhs.len(), n);
    assert_eq!(prescribed_values.len(), n);

    let mut is_fixed = vec![false; n];
    for &dof in fixed_dofs {
        assert!(dof < n, "fixed DOF {} out of bounds ({} DOFs)", dof, n);
        is_fixed[dof] = true;
    }

    // Free DOFs are numbered in ascending order, so mapped column indices stay sorted
    let mut free_index = vec![None; n];
    let mut free = Vec::new();
    for dof in 0..n {
        if !is_fixed[dof] {
            free_index[dof] = Some(free.len());
            free.push(dof);
        }
    }
    if free.is_empty() {
        return Err(FemError::EmptyFreeSet);
    }

    let mut offsets = Vec::with_capacity(free.len() + 1);
    let mut column_indices = Vec::new();
    let mut values = Vec::new();
    let mut reduced_rhs = DVector::zeros(free.len());
    offsets.push(0);
    for (reduced_row, &row) in free.iter().enumerate() {
        let csr_row = matrix.row(row);
        let mut rhs_value = rhs[row];
        for (&col, &value) in csr_row.col_indices().iter().zip(csr_row.values()) {
            match free_index[col] {
                Some(reduced_col) => {
                    column_indices.push(reduced_col);
                    values.push(value);
                }
                None => rhs_value -= value * prescribed_values[col],
            }
        }
        reduced_rhs[reduced_row] = rhs_value;
        offsets.push(column_indices.len());
    }

    debug!(
        "Condensed {} DOFs to {} free DOFs ({} fixed)",
        n,
        free.len(),
        n - free.len()
    );

    let reduced_matrix = CsrMatrix::try_from_csr_data(free.len(), free.len(), offsets, column_indices, values)
        .map_err(|err| FemError::InconsistentTopology {
            reason: format!("condensed matrix is malformed: {}", err),
        })?;
    Ok((reduced_matrix, reduced_rhs))
}

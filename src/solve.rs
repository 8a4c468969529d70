//! Linear solves for condensed systems.
use crate::condense::DofPartition;
use crate::FemError;
use log::{info, warn};
use nalgebra::DVector;
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::{CscMatrix, CsrMatrix};
use serde::{Deserialize, Serialize};
use tagfem_sparse::cg::{CgWorkspace, ConjugateGradient, JacobiPreconditioner, RelativeResidualCriterion, SolveErrorKind};

/// Choice of linear solver for symmetric positive definite systems.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LinearSolver {
    /// Sparse Cholesky factorization.
    ///
    /// The system is rejected as singular if a squared pivot falls below `pivot_tolerance` times
    /// the largest diagonal entry of the matrix.
    Cholesky { pivot_tolerance: f64 },
    /// Jacobi-preconditioned Conjugate Gradient.
    ///
    /// `max_iterations` defaults to ten times the system size. Besides the actual solve, the
    /// operator is solved once more for a fixed generic right-hand side, and the system is
    /// rejected as singular if that solve breaks down or does not converge.
    ConjugateGradient {
        relative_tolerance: f64,
        max_iterations: Option<usize>,
    },
}

impl Default for LinearSolver {
    fn default() -> Self {
        Self::cholesky()
    }
}

impl LinearSolver {
    pub fn cholesky() -> Self {
        Self::Cholesky { pivot_tolerance: 1e-12 }
    }

    pub fn conjugate_gradient() -> Self {
        Self::ConjugateGradient {
            relative_tolerance: 1e-10,
            max_iterations: None,
        }
    }

    /// Solves `matrix x = rhs`.
    ///
    /// # Panics
    ///
    /// Panics if the matrix is not square or `rhs` has the wrong length.
    pub fn solve(&self, matrix: &CsrMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>, FemError> {
        assert_eq!(matrix.nrows(), matrix.ncols(), "matrix must be square");
        assert_eq!(matrix.nrows(), rhs.len(), "rhs dimension must match matrix");
        if rhs.is_empty() {
            return Ok(DVector::zeros(0));
        }

        match *self {
            Self::Cholesky { pivot_tolerance } => solve_cholesky(matrix, rhs, pivot_tolerance),
            Self::ConjugateGradient {
                relative_tolerance,
                max_iterations,
            } => solve_cg(matrix, rhs, relative_tolerance, max_iterations),
        }
    }
}

/// Solves `matrix x = rhs` with the default solver.
pub fn solve(matrix: &CsrMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>, FemError> {
    LinearSolver::default().solve(matrix, rhs)
}

/// Solves `matrix u = rhs` subject to the Dirichlet conditions in `partition`.
///
/// Condenses, solves the reduced system and scatters the result back into a full-length vector
/// that holds the prescribed values on fixed DOFs.
pub fn solve_dirichlet(
    matrix: &CsrMatrix<f64>,
    rhs: &DVector<f64>,
    partition: &DofPartition,
    solver: &LinearSolver,
) -> Result<DVector<f64>, FemError> {
    let (reduced_matrix, reduced_rhs) = partition.condense(matrix, rhs)?;
    let free_values = solver.solve(&reduced_matrix, &reduced_rhs)?;
    Ok(partition.scatter(&free_values))
}

fn singular(reason: String) -> FemError {
    warn!("Rejecting linear system: {}", reason);
    FemError::SingularSystem { reason }
}

fn solve_cholesky(matrix: &CsrMatrix<f64>, rhs: &DVector<f64>, pivot_tolerance: f64) -> Result<DVector<f64>, FemError> {
    let scale = tagfem_sparse::diagonal(matrix)
        .iter()
        .fold(0.0, |max: f64, &d| max.max(d.abs()));
    if !(scale > 0.0) {
        return Err(singular("matrix has a zero diagonal".to_string()));
    }

    let csc = CscMatrix::from(matrix);
    let cholesky =
        CscCholesky::factor(&csc).map_err(|err| singular(format!("Cholesky factorization failed: {}", err)))?;

    let min_pivot = min_squared_pivot(cholesky.l());
    if !(min_pivot > pivot_tolerance * scale) {
        return Err(singular(format!(
            "smallest squared Cholesky pivot {:e} is below {:e} times the largest diagonal entry {:e}",
            min_pivot, pivot_tolerance, scale
        )));
    }

    let x = cholesky.solve(rhs);
    info!("Solved {}x{} system with sparse Cholesky", rhs.len(), rhs.len());
    Ok(x.column(0).into_owned())
}

/// Smallest `L_jj^2` of a lower triangular factor.
fn min_squared_pivot(l: &CscMatrix<f64>) -> f64 {
    let (col_offsets, row_indices, values) = l.csc_data();
    (0..l.ncols())
        .map(|j| {
            let range = col_offsets[j]..col_offsets[j + 1];
            row_indices[range.clone()]
                .iter()
                .zip(&values[range])
                .find(|(i, _)| **i == j)
                .map(|(_, &l_jj)| l_jj * l_jj)
                .unwrap_or(0.0)
        })
        .fold(f64::INFINITY, f64::min)
}

fn solve_cg(
    matrix: &CsrMatrix<f64>,
    rhs: &DVector<f64>,
    relative_tolerance: f64,
    max_iterations: Option<usize>,
) -> Result<DVector<f64>, FemError> {
    let max_iter = max_iterations.unwrap_or(10 * rhs.len());
    let preconditioner = JacobiPreconditioner::from_csr(matrix)
        .ok_or_else(|| singular("matrix has a non-positive diagonal entry".to_string()))?;

    let mut workspace = CgWorkspace::default();
    let mut cg = ConjugateGradient::with_workspace(&mut workspace)
        .with_operator(matrix)
        .with_preconditioner(preconditioner)
        .with_stopping_criterion(RelativeResidualCriterion::new(relative_tolerance))
        .with_max_iter(max_iter);

    let (x, output) = cg.solve(rhs).map_err(|err| match err.kind {
        SolveErrorKind::MaxIterationsReached { max_iter } => {
            warn!("CG did not converge within {} iterations", max_iter);
            FemError::NoConvergence { iterations: max_iter }
        }
        _ => singular(err.to_string()),
    })?;

    // A singular operator can still converge when rhs lies in its range (or is zero), so the
    // operator is also solved against a right-hand side with components along every direction.
    cg.solve(&certification_rhs(rhs.len()))
        .map_err(|err| singular(format!("CG failed for a generic right-hand side: {}", err)))?;

    info!(
        "Solved {}x{} system with CG in {} iterations",
        rhs.len(),
        rhs.len(),
        output.num_iterations
    );
    Ok(x)
}

/// Strictly positive vector with irregular variation between entries.
fn certification_rhs(n: usize) -> DVector<f64> {
    // Fractional parts of multiples of the golden ratio are equidistributed in [0, 1)
    let golden = 0.5 * (1.0 + 5.0_f64.sqrt());
    DVector::from_fn(n, |i, _| 1.0 + ((i + 1) as f64 * golden).fract())
}

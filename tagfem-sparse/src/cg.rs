//! Preconditioned Conjugate Gradient for symmetric positive definite systems.
use crate::{diagonal, spmv_into};
use log::debug;
use nalgebra::{DVector, DVectorView, DVectorViewMut};
use nalgebra_sparse::CsrMatrix;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// A linear map `x -> y = A x`.
pub trait LinearOperator {
    fn apply(&self, y: DVectorViewMut<f64>, x: DVectorView<f64>);
}

impl<'a, A> LinearOperator for &'a A
where
    A: ?Sized + LinearOperator,
{
    fn apply(&self, y: DVectorViewMut<f64>, x: DVectorView<f64>) {
        <A as LinearOperator>::apply(self, y, x)
    }
}

impl LinearOperator for CsrMatrix<f64> {
    fn apply(&self, y: DVectorViewMut<f64>, x: DVectorView<f64>) {
        spmv_into(y, self, x)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IdentityOperator;

impl LinearOperator for IdentityOperator {
    fn apply(&self, mut y: DVectorViewMut<f64>, x: DVectorView<f64>) {
        y.copy_from(&x);
    }
}

/// Diagonal (Jacobi) preconditioner `P = diag(A)^{-1}`.
#[derive(Debug, Clone)]
pub struct JacobiPreconditioner {
    inverse_diagonal: DVector<f64>,
}

impl JacobiPreconditioner {
    /// Builds the preconditioner from the diagonal of `a`.
    ///
    /// Returns `None` if any diagonal entry is not strictly positive, in which case the matrix
    /// cannot be positive definite.
    pub fn from_csr(a: &CsrMatrix<f64>) -> Option<Self> {
        let diag = diagonal(a);
        if diag.iter().any(|&d| !(d > 0.0)) {
            return None;
        }
        Some(Self {
            inverse_diagonal: diag.map(|d| 1.0 / d),
        })
    }
}

impl LinearOperator for JacobiPreconditioner {
    fn apply(&self, mut y: DVectorViewMut<f64>, x: DVectorView<f64>) {
        y.copy_from(&x.component_mul(&self.inverse_diagonal));
    }
}

pub trait CgStoppingCriterion {
    fn has_converged(&self, b_norm: f64, iteration: usize, approx_residual: DVectorView<f64>) -> bool;
}

/// Relative residual tolerance `||r|| <= tol * ||b||`.
///
/// The residual is the recursively updated residual of CG, not `b - Ax` recomputed from scratch.
#[derive(Debug, Clone, Copy)]
pub struct RelativeResidualCriterion {
    tol: f64,
}

impl RelativeResidualCriterion {
    pub fn new(tol: f64) -> Self {
        Self { tol }
    }
}

impl Default for RelativeResidualCriterion {
    fn default() -> Self {
        Self::new(1e-10)
    }
}

impl CgStoppingCriterion for RelativeResidualCriterion {
    fn has_converged(&self, b_norm: f64, _iteration: usize, approx_residual: DVectorView<f64>) -> bool {
        approx_residual.norm() <= self.tol * b_norm
    }
}

#[derive(Debug, Clone)]
pub struct CgWorkspace {
    r: DVector<f64>,
    z: DVector<f64>,
    p: DVector<f64>,
    ap: DVector<f64>,
}

impl Default for CgWorkspace {
    fn default() -> Self {
        Self {
            r: DVector::zeros(0),
            z: DVector::zeros(0),
            p: DVector::zeros(0),
            ap: DVector::zeros(0),
        }
    }
}

impl CgWorkspace {
    fn resize(&mut self, dim: usize) {
        for buffer in [&mut self.r, &mut self.z, &mut self.p, &mut self.ap] {
            buffer.resize_vertically_mut(dim, 0.0);
        }
    }
}

#[derive(Debug)]
enum OwnedOrMutRef<'a, T> {
    Owned(T),
    MutRef(&'a mut T),
}

impl<'a, T> Deref for OwnedOrMutRef<'a, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Owned(owned) => owned,
            Self::MutRef(mutref) => mutref,
        }
    }
}

impl<'a, T> DerefMut for OwnedOrMutRef<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            Self::Owned(owned) => owned,
            Self::MutRef(mutref) => mutref,
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum SolveErrorKind {
    /// A search direction `p` with `p^T A p` vanishing relative to the largest Rayleigh quotient
    /// seen so far. The operator is (numerically) singular or indefinite.
    IndefiniteOperator,
    IndefinitePreconditioner,
    MaxIterationsReached { max_iter: usize },
}

impl fmt::Display for SolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndefiniteOperator => write!(f, "Operator appears to be singular or indefinite"),
            Self::IndefinitePreconditioner => write!(f, "Indefinite preconditioner"),
            Self::MaxIterationsReached { max_iter } => {
                write!(f, "Max iterations ({}) reached", max_iter)
            }
        }
    }
}

#[non_exhaustive]
#[derive(Debug)]
pub struct SolveError {
    pub output: CgOutput,
    pub kind: SolveErrorKind,
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CG solve failed after {} iterations: {}",
            self.output.num_iterations, self.kind
        )
    }
}

impl std::error::Error for SolveError {}

#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct CgOutput {
    /// Number of updates made to the (initial) solution vector.
    pub num_iterations: usize,
}

#[derive(Debug)]
pub struct ConjugateGradient<'a, A, P, Criterion> {
    workspace: OwnedOrMutRef<'a, CgWorkspace>,
    operator: A,
    preconditioner: P,
    stopping_criterion: Criterion,
    max_iter: Option<usize>,
    breakdown_tolerance: f64,
}

impl ConjugateGradient<'static, (), IdentityOperator, RelativeResidualCriterion> {
    pub fn new() -> Self {
        Self {
            workspace: OwnedOrMutRef::Owned(CgWorkspace::default()),
            operator: (),
            preconditioner: IdentityOperator,
            stopping_criterion: RelativeResidualCriterion::default(),
            max_iter: None,
            breakdown_tolerance: 1e-14,
        }
    }
}

impl<'a> ConjugateGradient<'a, (), IdentityOperator, RelativeResidualCriterion> {
    pub fn with_workspace(workspace: &'a mut CgWorkspace) -> Self {
        Self {
            workspace: OwnedOrMutRef::MutRef(workspace),
            operator: (),
            preconditioner: IdentityOperator,
            stopping_criterion: RelativeResidualCriterion::default(),
            max_iter: None,
            breakdown_tolerance: 1e-14,
        }
    }
}

impl<'a, P, Criterion> ConjugateGradient<'a, (), P, Criterion> {
    pub fn with_operator<A>(self, operator: A) -> ConjugateGradient<'a, A, P, Criterion> {
        ConjugateGradient {
            workspace: self.workspace,
            operator,
            preconditioner: self.preconditioner,
            stopping_criterion: self.stopping_criterion,
            max_iter: self.max_iter,
            breakdown_tolerance: self.breakdown_tolerance,
        }
    }
}

impl<'a, A, P, Criterion> ConjugateGradient<'a, A, P, Criterion> {
    pub fn with_preconditioner<P2>(self, preconditioner: P2) -> ConjugateGradient<'a, A, P2, Criterion> {
        ConjugateGradient {
            workspace: self.workspace,
            operator: self.operator,
            preconditioner,
            stopping_criterion: self.stopping_criterion,
            max_iter: self.max_iter,
            breakdown_tolerance: self.breakdown_tolerance,
        }
    }

    pub fn with_stopping_criterion<C2>(self, stopping_criterion: C2) -> ConjugateGradient<'a, A, P, C2> {
        ConjugateGradient {
            workspace: self.workspace,
            operator: self.operator,
            preconditioner: self.preconditioner,
            stopping_criterion,
            max_iter: self.max_iter,
            breakdown_tolerance: self.breakdown_tolerance,
        }
    }

    pub fn with_max_iter(self, max_iter: usize) -> Self {
        Self {
            max_iter: Some(max_iter),
            ..self
        }
    }

    /// Sets the relative threshold below which a Rayleigh quotient `p^T A p / p^T p` is treated as zero.
    pub fn with_breakdown_tolerance(self, breakdown_tolerance: f64) -> Self {
        Self {
            breakdown_tolerance,
            ..self
        }
    }
}

impl<'a, A, P, Criterion> ConjugateGradient<'a, A, P, Criterion>
where
    A: LinearOperator,
    P: LinearOperator,
    Criterion: CgStoppingCriterion,
{
    /// Solves `A x = b` starting from a zero initial guess.
    pub fn solve(&mut self, b: &DVector<f64>) -> Result<(DVector<f64>, CgOutput), SolveError> {
        let mut x = DVector::zeros(b.len());
        let output = self.solve_with_guess(b.into(), (&mut x).into())?;
        Ok((x, output))
    }

    pub fn solve_with_guess(
        &mut self,
        b: DVectorView<f64>,
        mut x: DVectorViewMut<f64>,
    ) -> Result<CgOutput, SolveError> {
        use SolveErrorKind::*;
        assert_eq!(b.len(), x.len());

        let mut output = CgOutput { num_iterations: 0 };

        let b_norm = b.norm();
        if b_norm == 0.0 {
            x.fill(0.0);
            return Ok(output);
        }

        self.workspace.resize(x.len());
        let CgWorkspace { r, z, p, ap } = &mut *self.workspace;

        // r = b - Ax
        self.operator.apply((&mut *r).into(), (&x).into());
        r.axpy(1.0, &b, -1.0);

        // z = Pr, p = z
        self.preconditioner.apply((&mut *z).into(), (&*r).into());
        p.copy_from(&*z);

        let mut z_dot_r = z.dot(&*r);
        let mut max_rayleigh_quotient: f64 = 0.0;

        loop {
            if self
                .stopping_criterion
                .has_converged(b_norm, output.num_iterations, (&*r).into())
            {
                break;
            } else if let Some(max_iter) = self.max_iter {
                if output.num_iterations >= max_iter {
                    return Err(SolveError {
                        output,
                        kind: MaxIterationsReached { max_iter },
                    });
                }
            }

            // ap = A p
            self.operator.apply((&mut *ap).into(), (&*p).into());
            let p_ap = p.dot(&*ap);
            let rayleigh_quotient = p_ap / p.norm_squared();
            max_rayleigh_quotient = max_rayleigh_quotient.max(rayleigh_quotient);

            if !(rayleigh_quotient > self.breakdown_tolerance * max_rayleigh_quotient) {
                return Err(SolveError {
                    output,
                    kind: IndefiniteOperator,
                });
            }
            if !(z_dot_r > 0.0) {
                return Err(SolveError {
                    output,
                    kind: IndefinitePreconditioner,
                });
            }

            let alpha = z_dot_r / p_ap;
            x.axpy(alpha, &*p, 1.0);
            r.axpy(-alpha, &*ap, 1.0);
            output.num_iterations += 1;

            // z = P r
            self.preconditioner.apply((&mut *z).into(), (&*r).into());
            let z_dot_r_next = z.dot(&*r);
            let beta = z_dot_r_next / z_dot_r;

            // p = z + beta p
            p.axpy(1.0, &*z, beta);
            z_dot_r = z_dot_r_next;
        }

        debug!(
            "CG converged after {} iterations (dimension {})",
            output.num_iterations,
            x.len()
        );
        Ok(output)
    }
}

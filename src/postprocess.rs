//! Derived quantities: projections, error norms and boundary fluxes.
use crate::assembly::forms::{FacetLinearForm, Mass, NormalFlux, Source};
use crate::assembly::local::BasisBuffer;
use crate::assembly::{assemble_bilinear, assemble_boundary_linear, assemble_linear};
use crate::element::ReferenceElement;
use crate::quadrature;
use crate::solve::LinearSolver;
use crate::space::FiniteElementSpace;
use crate::FemError;
use nalgebra::{DVector, Point2};
use nalgebra_sparse::CsrMatrix;
use std::collections::BTreeMap;
use tagfem_quadrature::triangle::MAX_STRENGTH;

/// L2 projection of `f` onto the space.
///
/// Solves `M u = b` with the mass matrix `M` and `b_i = int f phi_i`, without any boundary
/// conditions.
pub fn l2_project<E, F>(space: &FiniteElementSpace<E>, f: F) -> Result<DVector<f64>, FemError>
where
    E: ReferenceElement,
    F: Sync + Fn(&Point2<f64>) -> f64,
{
    let mass = assemble_bilinear(space, &Mass)?;
    let rhs = assemble_linear(space, &Source(f))?;
    LinearSolver::default().solve(&mass, &rhs)
}

/// The L2 norm of the difference of two discrete fields, `sqrt((u1 - u2)^T M (u1 - u2))`.
///
/// Round-off can make the quadratic form slightly negative for nearly equal fields; it is
/// clamped to zero.
pub fn l2_norm(mass: &CsrMatrix<f64>, u1: &DVector<f64>, u2: &DVector<f64>) -> f64 {
    let difference = u1 - u2;
    tagfem_sparse::quadratic_form(&difference, mass, &difference)
        .max(0.0)
        .sqrt()
}

/// The energy `u^T A u`. For the Laplace matrix with unit potential difference between two ports,
/// this is the conductance between them.
pub fn energy(matrix: &CsrMatrix<f64>, u: &DVector<f64>) -> f64 {
    tagfem_sparse::quadratic_form(u, matrix, u)
}

/// Integrates `form` over the facets tagged `tag` and contracts the result with `u`.
pub fn boundary_integral<E, F>(
    space: &FiniteElementSpace<E>,
    form: &F,
    tag: &str,
    u: &DVector<f64>,
) -> Result<f64, FemError>
where
    E: ReferenceElement,
    F: ?Sized + FacetLinearForm,
{
    assert_eq!(u.len(), space.num_dofs());
    Ok(assemble_boundary_linear(space, form, tag)?.dot(u))
}

/// Outward flux of `grad u` through every tagged boundary.
pub fn boundary_currents<E>(space: &FiniteElementSpace<E>, u: &DVector<f64>) -> Result<BTreeMap<String, f64>, FemError>
where
    E: ReferenceElement,
{
    space
        .mesh()
        .boundary_tags()
        .map(|tag| Ok((tag.to_string(), boundary_integral(space, &NormalFlux, tag, u)?)))
        .collect()
}

/// The L2 error `||u_h - f||` computed by direct quadrature on every element.
///
/// Unlike [`l2_norm`], `f` is not projected first, so the result includes the error of
/// representing `f` in the space.
pub fn l2_error<E, F>(space: &FiniteElementSpace<E>, u: &DVector<f64>, f: F) -> Result<f64, FemError>
where
    E: ReferenceElement,
    F: Fn(&Point2<f64>) -> f64,
{
    assert_eq!(u.len(), space.num_dofs());
    let rule = quadrature::triangle(MAX_STRENGTH)?;
    let mut buffer = BasisBuffer::default();
    let mut error_squared = 0.0;
    for i in 0..space.num_elements() {
        let geometry = space.element_geometry(i)?;
        let j_inv_t = geometry.inverse_transpose_jacobian().ok_or(FemError::DegenerateElement {
            element: i,
            determinant: geometry.determinant(),
        })?;
        let dofs = space.local_to_global(i);
        for (weight, xi) in rule.iter() {
            buffer.evaluate(space.element(), xi, &j_inv_t);
            let u_h: f64 = buffer
                .basis()
                .iter()
                .zip(dofs)
                .map(|(phi, &dof)| phi.value * u[dof])
                .sum();
            let difference = u_h - f(&geometry.map_reference_coords(xi));
            error_squared += weight * geometry.determinant() * difference * difference;
        }
    }
    Ok(error_squared.sqrt())
}

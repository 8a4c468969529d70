//! Element-level integration of weak forms.
use crate::assembly::forms::{BasisValue, BilinearForm, ElementPoint, FacetLinearForm, FacetPoint, LinearForm};
use crate::element::{AffineTriangle, ReferenceElement};
use crate::quadrature::{reference_triangle_facet_point, QuadratureRule};
use crate::FemError;
use nalgebra::{DMatrix, DVector, Matrix2, Point2, Vector2};

/// Scratch buffers for evaluating basis functions at a quadrature point.
#[derive(Debug, Clone, Default)]
pub struct BasisBuffer {
    values: Vec<f64>,
    reference_gradients: Vec<Vector2<f64>>,
    basis: Vec<BasisValue>,
}

impl BasisBuffer {
    /// Evaluates all basis functions at `xi` and maps their gradients to physical space.
    pub fn evaluate<E>(&mut self, element: &E, xi: &Point2<f64>, inverse_transpose_jacobian: &Matrix2<f64>)
    where
        E: ?Sized + ReferenceElement,
    {
        let n = element.num_nodes();
        self.values.resize(n, 0.0);
        self.reference_gradients.resize(n, Vector2::zeros());
        element.populate_basis(&mut self.values, xi);
        element.populate_basis_gradients(&mut self.reference_gradients, xi);

        self.basis.clear();
        self.basis.extend(
            self.values
                .iter()
                .zip(&self.reference_gradients)
                .map(|(&value, gradient)| BasisValue {
                    value,
                    gradient: inverse_transpose_jacobian * gradient,
                }),
        );
    }

    pub fn basis(&self) -> &[BasisValue] {
        &self.basis
    }
}

fn inverse_transpose_jacobian(geometry: &AffineTriangle, element_index: usize) -> Result<Matrix2<f64>, FemError> {
    geometry
        .inverse_transpose_jacobian()
        .ok_or(FemError::DegenerateElement {
            element: element_index,
            determinant: geometry.determinant(),
        })
}

/// Computes the element matrix `A_ij = int a(phi_j, phi_i)` into `matrix`.
///
/// `matrix` is resized to `num_nodes x num_nodes` and overwritten. Row `i` belongs to test
/// function `i`, column `j` to trial function `j`.
pub fn assemble_element_matrix<E, F>(
    matrix: &mut DMatrix<f64>,
    buffer: &mut BasisBuffer,
    element: &E,
    geometry: &AffineTriangle,
    element_index: usize,
    rule: &QuadratureRule<2>,
    form: &F,
) -> Result<(), FemError>
where
    E: ?Sized + ReferenceElement,
    F: ?Sized + BilinearForm,
{
    geometry.check_nondegenerate(element_index)?;
    let j_inv_t = inverse_transpose_jacobian(geometry, element_index)?;
    let det = geometry.determinant();

    let n = element.num_nodes();
    matrix.resize_mut(n, n, 0.0);
    matrix.fill(0.0);

    for (weight, xi) in rule.iter() {
        buffer.evaluate(element, xi, &j_inv_t);
        let point = ElementPoint {
            x: geometry.map_reference_coords(xi),
            element: element_index,
        };
        let scale = weight * det;
        for (i, test) in buffer.basis().iter().enumerate() {
            for (j, trial) in buffer.basis().iter().enumerate() {
                matrix[(i, j)] += scale * form.evaluate(trial, test, &point);
            }
        }
    }
    Ok(())
}

/// Computes the element vector `b_i = int l(phi_i)` into `vector`.
pub fn assemble_element_vector<E, F>(
    vector: &mut DVector<f64>,
    buffer: &mut BasisBuffer,
    element: &E,
    geometry: &AffineTriangle,
    element_index: usize,
    rule: &QuadratureRule<2>,
    form: &F,
) -> Result<(), FemError>
where
    E: ?Sized + ReferenceElement,
    F: ?Sized + LinearForm,
{
    geometry.check_nondegenerate(element_index)?;
    let j_inv_t = inverse_transpose_jacobian(geometry, element_index)?;
    let det = geometry.determinant();

    let n = element.num_nodes();
    vector.resize_vertically_mut(n, 0.0);
    vector.fill(0.0);

    for (weight, xi) in rule.iter() {
        buffer.evaluate(element, xi, &j_inv_t);
        let point = ElementPoint {
            x: geometry.map_reference_coords(xi),
            element: element_index,
        };
        for (i, test) in buffer.basis().iter().enumerate() {
            vector[i] += weight * det * form.evaluate(test, &point);
        }
    }
    Ok(())
}

/// Computes `b_i = int_facet l(phi_i)` over local facet `facet` of the element into `vector`.
///
/// Every basis function of the element is evaluated, including those that vanish on the facet,
/// since their gradients generally do not.
#[allow(clippy::too_many_arguments)]
pub fn assemble_facet_vector<E, F>(
    vector: &mut DVector<f64>,
    buffer: &mut BasisBuffer,
    element: &E,
    geometry: &AffineTriangle,
    element_index: usize,
    facet: usize,
    rule: &QuadratureRule<1>,
    form: &F,
) -> Result<(), FemError>
where
    E: ?Sized + ReferenceElement,
    F: ?Sized + FacetLinearForm,
{
    geometry.check_nondegenerate(element_index)?;
    let j_inv_t = inverse_transpose_jacobian(geometry, element_index)?;
    let normal = geometry.outward_normal(facet);
    // The reference segment [-1, 1] has length 2
    let facet_det = 0.5 * geometry.facet_length(facet);

    let n = element.num_nodes();
    vector.resize_vertically_mut(n, 0.0);
    vector.fill(0.0);

    for (weight, t) in rule.iter() {
        let xi = reference_triangle_facet_point(facet, t.x);
        buffer.evaluate(element, &xi, &j_inv_t);
        let point = FacetPoint {
            x: geometry.map_reference_coords(&xi),
            normal,
            element: element_index,
            facet,
        };
        for (i, test) in buffer.basis().iter().enumerate() {
            vector[i] += weight * facet_det * form.evaluate(test, &point);
        }
    }
    Ok(())
}

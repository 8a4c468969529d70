use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DVector, Point2};
use proptest::prelude::*;
use tagfem::assembly::assemble_bilinear;
use tagfem::assembly::forms::{Laplace, Mass, NormalFlux};
use tagfem::element::{Tri3Element, Tri6Element};
use tagfem::mesh::procedural::create_unit_square_tri_mesh;
use tagfem::postprocess::{boundary_currents, boundary_integral, energy, l2_error, l2_norm, l2_project};
use tagfem::space::FiniteElementSpace;

#[test]
fn l2_projection_is_idempotent_on_the_space() {
    let mesh = create_unit_square_tri_mesh(4);

    let p1 = FiniteElementSpace::build(&mesh, Tri3Element).unwrap();
    let linear = |x: &Point2<f64>| 1.0 + 2.0 * x.x - 3.0 * x.y;
    let projected = l2_project(&p1, linear).unwrap();
    assert_matrix_eq!(projected, p1.interpolate(linear), comp = abs, tol = 1e-10);

    let p2 = FiniteElementSpace::build(&mesh, Tri6Element).unwrap();
    let quadratic = |x: &Point2<f64>| x.x * x.x + x.x * x.y - x.y + 0.25;
    let projected = l2_project(&p2, quadratic).unwrap();
    assert_matrix_eq!(projected, p2.interpolate(quadratic), comp = abs, tol = 1e-10);
}

#[test]
fn l2_norm_of_known_fields() {
    let mesh = create_unit_square_tri_mesh(3);
    let space = FiniteElementSpace::build(&mesh, Tri6Element).unwrap();
    let mass = assemble_bilinear(&space, &Mass).unwrap();
    let zero = DVector::zeros(space.num_dofs());
    let one = DVector::repeat(space.num_dofs(), 1.0);
    assert_scalar_eq!(l2_norm(&mass, &one, &zero), 1.0, comp = abs, tol = 1e-12);

    // ||x||^2 = 1/3 on the unit square
    let x = space.interpolate(|p| p.x);
    assert_scalar_eq!(l2_norm(&mass, &x, &zero), (1.0f64 / 3.0).sqrt(), comp = abs, tol = 1e-12);
}

#[test]
fn l2_error_matches_mass_matrix_norm_for_representable_fields() {
    let mesh = create_unit_square_tri_mesh(3);
    let space = FiniteElementSpace::build(&mesh, Tri6Element).unwrap();
    let mass = assemble_bilinear(&space, &Mass).unwrap();
    let u = space.interpolate(|p| p.x * p.y);
    let zero = DVector::zeros(space.num_dofs());

    assert_scalar_eq!(l2_error(&space, &u, |p| p.x * p.y).unwrap(), 0.0, comp = abs, tol = 1e-13);
    assert_scalar_eq!(
        l2_error(&space, &u, |_| 0.0).unwrap(),
        l2_norm(&mass, &u, &zero),
        comp = abs,
        tol = 1e-12
    );
}

#[test]
fn energy_and_currents_of_linear_field() {
    let mesh = create_unit_square_tri_mesh(4);
    let space = FiniteElementSpace::build(&mesh, Tri3Element).unwrap();
    let a = assemble_bilinear(&space, &Laplace).unwrap();
    let u = space.interpolate(|p| p.x);

    // Unit potential difference across a unit square of unit conductivity
    assert_scalar_eq!(energy(&a, &u), 1.0, comp = abs, tol = 1e-12);

    let currents = boundary_currents(&space, &u).unwrap();
    assert_eq!(currents.len(), 4);
    assert_scalar_eq!(currents["right"], 1.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(currents["left"], -1.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(currents["top"], 0.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(currents["bottom"], 0.0, comp = abs, tol = 1e-12);

    assert_scalar_eq!(
        boundary_integral(&space, &NormalFlux, "right", &u).unwrap(),
        currents["right"],
        comp = abs,
        tol = 0.0
    );
    assert!(boundary_integral(&space, &NormalFlux, "ground", &u).is_err());
}

proptest! {
    #[test]
    fn l2_norm_is_symmetric_and_non_negative(
        u1 in prop::collection::vec(-5.0..5.0f64, 16),
        u2 in prop::collection::vec(-5.0..5.0f64, 16),
    ) {
        let mesh = create_unit_square_tri_mesh(3);
        let space = FiniteElementSpace::build(&mesh, Tri3Element).unwrap();
        let mass = assemble_bilinear(&space, &Mass).unwrap();
        let u1 = DVector::from_vec(u1);
        let u2 = DVector::from_vec(u2);

        let forward = l2_norm(&mass, &u1, &u2);
        let backward = l2_norm(&mass, &u2, &u1);
        prop_assert!(forward >= 0.0);
        prop_assert!((forward - backward).abs() <= 1e-12 * forward.max(1.0));
        prop_assert_eq!(l2_norm(&mass, &u1, &u1), 0.0);
    }
}

use matrixcompare::assert_matrix_eq;
use nalgebra::{DMatrix, DVector, Point2};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use tagfem::assembly::forms::{Laplace, Source};
use tagfem::assembly::{assemble_bilinear, assemble_linear};
use tagfem::condense::DofPartition;
use tagfem::element::{Tri3Element, Tri6Element};
use tagfem::mesh::procedural::create_unit_square_tri_mesh;
use tagfem::solve::{solve, solve_dirichlet, LinearSolver};
use tagfem::space::FiniteElementSpace;
use tagfem::FemError;

fn csr_from_dense(dense: &DMatrix<f64>) -> CsrMatrix<f64> {
    CsrMatrix::from(&CooMatrix::from(dense))
}

fn poisson_system(cells_per_dim: usize) -> (CsrMatrix<f64>, DVector<f64>) {
    let mesh = create_unit_square_tri_mesh(cells_per_dim);
    let space = FiniteElementSpace::build(&mesh, Tri3Element).unwrap();
    let a = assemble_bilinear(&space, &Laplace).unwrap();
    let b = assemble_linear(&space, &Source(|x: &Point2<f64>| 1.0 + x.x * x.y)).unwrap();
    let fixed = space.dofs_for_boundary_tag("left").unwrap();
    let partition = DofPartition::new(space.num_dofs(), &fixed, &vec![0.0; fixed.len()]);
    partition.condense(&a, &b).unwrap()
}

#[test]
fn cholesky_and_cg_agree_with_dense_solve() {
    let (a, b) = poisson_system(5);
    let expected = DMatrix::from(&a).cholesky().unwrap().solve(&b);

    let x_cholesky = solve(&a, &b).unwrap();
    assert_matrix_eq!(x_cholesky, expected, comp = abs, tol = 1e-10);

    let x_cg = LinearSolver::conjugate_gradient().solve(&a, &b).unwrap();
    assert_matrix_eq!(x_cg, expected, comp = abs, tol = 1e-7);
}

#[test]
fn default_solver_is_cholesky() {
    assert_eq!(LinearSolver::default(), LinearSolver::Cholesky { pivot_tolerance: 1e-12 });
}

#[test]
fn singular_systems_are_rejected() {
    let dense = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
    let a = csr_from_dense(&dense);
    let inconsistent = DVector::from_column_slice(&[1.0, 0.0]);
    let compatible = DVector::from_column_slice(&[1.0, 1.0]);
    let zero = DVector::zeros(2);

    for solver in [LinearSolver::cholesky(), LinearSolver::conjugate_gradient()] {
        for b in [&inconsistent, &compatible, &zero] {
            assert!(matches!(solver.solve(&a, b), Err(FemError::SingularSystem { .. })));
        }
    }
}

#[test]
fn pure_neumann_laplace_with_compatible_source_is_singular() {
    // The source integrates to zero, so rhs lies in the range of the Laplace matrix
    let mesh = create_unit_square_tri_mesh(4);
    let space = FiniteElementSpace::build(&mesh, Tri6Element).unwrap();
    let a = assemble_bilinear(&space, &Laplace).unwrap();
    let b = assemble_linear(&space, &Source(|x: &Point2<f64>| x.x - 0.5)).unwrap();
    assert!(b.sum().abs() < 1e-12);

    for solver in [LinearSolver::cholesky(), LinearSolver::conjugate_gradient()] {
        assert!(matches!(solver.solve(&a, &b), Err(FemError::SingularSystem { .. })));
    }
}

#[test]
fn cg_accepts_zero_rhs_for_nonsingular_systems() {
    let (a, b) = poisson_system(4);
    let x = LinearSolver::conjugate_gradient()
        .solve(&a, &DVector::zeros(b.len()))
        .unwrap();
    assert_matrix_eq!(x, DVector::zeros(b.len()), comp = abs, tol = 0.0);
}

#[test]
fn pure_neumann_laplace_is_singular() {
    let mesh = create_unit_square_tri_mesh(4);
    let space = FiniteElementSpace::build(&mesh, Tri6Element).unwrap();
    let a = assemble_bilinear(&space, &Laplace).unwrap();
    let b = DVector::repeat(space.num_dofs(), 1.0);
    assert!(matches!(solve(&a, &b), Err(FemError::SingularSystem { .. })));
}

#[test]
fn cg_reports_missing_convergence() {
    let (a, b) = poisson_system(6);
    let solver = LinearSolver::ConjugateGradient {
        relative_tolerance: 1e-12,
        max_iterations: Some(1),
    };
    assert_eq!(solver.solve(&a, &b), Err(FemError::NoConvergence { iterations: 1 }));
}

#[test]
fn solve_dirichlet_recovers_linear_field() {
    // u = x solves the Laplace equation with u = 0 on the left, u = 1 on the right and
    // zero flux on top and bottom
    let mesh = create_unit_square_tri_mesh(4);
    let space = FiniteElementSpace::build(&mesh, Tri6Element).unwrap();
    let a = assemble_bilinear(&space, &Laplace).unwrap();
    let b = DVector::zeros(space.num_dofs());
    let partition = DofPartition::from_boundary_values(&space, &[("left", 0.0), ("right", 1.0)]).unwrap();

    for solver in [LinearSolver::cholesky(), LinearSolver::conjugate_gradient()] {
        let u = solve_dirichlet(&a, &b, &partition, &solver).unwrap();
        assert_matrix_eq!(u, space.interpolate(|x| x.x), comp = abs, tol = 1e-7);
    }
}

#[test]
fn empty_system_solves_trivially() {
    let a = CsrMatrix::<f64>::zeros(0, 0);
    let b = DVector::zeros(0);
    assert_eq!(solve(&a, &b).unwrap().len(), 0);
}

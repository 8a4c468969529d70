use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use proptest::prelude::*;
use tagfem::assembly::forms::{Laplace, Source};
use tagfem::assembly::{assemble_bilinear, assemble_linear};
use tagfem::condense::{condense, DofPartition};
use tagfem::element::Tri3Element;
use tagfem::mesh::procedural::create_unit_square_tri_mesh;
use tagfem::solve::solve;
use tagfem::space::FiniteElementSpace;
use tagfem::FemError;

/// Symmetric tridiagonal 4x4 matrix with an explicitly stored zero at (0, 1).
fn small_system() -> (CsrMatrix<f64>, DVector<f64>) {
    let mut coo = CooMatrix::new(4, 4);
    for i in 0..4 {
        coo.push(i, i, 4.0);
    }
    coo.push(0, 1, 0.0);
    coo.push(1, 0, 0.0);
    coo.push(1, 2, -1.0);
    coo.push(2, 1, -1.0);
    coo.push(2, 3, -2.0);
    coo.push(3, 2, -2.0);
    let rhs = DVector::from_column_slice(&[1.0, 2.0, 3.0, 4.0]);
    (CsrMatrix::from(&coo), rhs)
}

#[test]
fn condense_small_system() {
    let (matrix, rhs) = small_system();
    let prescribed = DVector::from_column_slice(&[0.0, 0.0, 0.0, 10.0]);
    let (reduced_matrix, reduced_rhs) = condense(&matrix, &rhs, &prescribed, &[3]).unwrap();

    let expected_matrix = DMatrix::from(&matrix).view((0, 0), (3, 3)).into_owned();
    assert_matrix_eq!(DMatrix::from(&reduced_matrix), expected_matrix, comp = abs, tol = 0.0);
    // rhs[2] - A[2, 3] * 10
    let expected_rhs = DVector::from_column_slice(&[1.0, 2.0, 23.0]);
    assert_matrix_eq!(reduced_rhs, expected_rhs, comp = abs, tol = 1e-14);

    // The explicit zero survives condensation
    assert_eq!(reduced_matrix.nnz(), 3 + 4);
    assert_eq!(reduced_matrix.row(0).col_indices(), &[0, 1]);
}

#[test]
fn condense_renumbers_free_dofs() {
    let (matrix, rhs) = small_system();
    let prescribed = DVector::from_column_slice(&[5.0, 0.0, 0.0, 0.0]);
    let (reduced_matrix, reduced_rhs) = condense(&matrix, &rhs, &prescribed, &[0, 2]).unwrap();
    assert_eq!(reduced_matrix.nrows(), 2);
    // Free DOFs 1 and 3 are not coupled to each other
    assert_matrix_eq!(
        DMatrix::from(&reduced_matrix),
        DMatrix::from_diagonal_element(2, 2, 4.0),
        comp = abs,
        tol = 0.0
    );
    // Row 1 couples to fixed DOF 0 through an explicit zero and to DOF 2 with value zero
    assert_matrix_eq!(reduced_rhs, DVector::from_column_slice(&[2.0, 4.0]), comp = abs, tol = 1e-14);
}

#[test]
fn fixing_everything_is_an_error() {
    let (matrix, rhs) = small_system();
    let prescribed = DVector::zeros(4);
    assert_eq!(
        condense(&matrix, &rhs, &prescribed, &[0, 1, 2, 3]).unwrap_err(),
        FemError::EmptyFreeSet
    );
}

#[test]
fn partition_scatter_and_restrict() {
    let partition = DofPartition::new(5, &[4, 1, 4], &[1.0, 2.0, 3.0]);
    assert_eq!(partition.fixed(), &[1, 4]);
    assert_eq!(partition.free(), &[0, 2, 3]);
    // The last value listed for a DOF wins
    assert_eq!(partition.prescribed_values()[4], 3.0);

    let u = partition.scatter(&DVector::from_column_slice(&[7.0, 8.0, 9.0]));
    assert_eq!(u, DVector::from_column_slice(&[7.0, 2.0, 8.0, 9.0, 3.0]));
    assert_eq!(partition.restrict(&u), DVector::from_column_slice(&[7.0, 8.0, 9.0]));
}

#[test]
fn partition_from_boundary_values() {
    let mesh = create_unit_square_tri_mesh(3);
    let space = FiniteElementSpace::build(&mesh, Tri3Element).unwrap();
    let partition = DofPartition::from_boundary_values(&space, &[("left", 1.0), ("bottom", 2.0)]).unwrap();
    assert_eq!(partition.fixed().len(), 4 + 4 - 1);
    assert_eq!(partition.free().len(), space.num_dofs() - 7);
    // The corner shared by both tags takes the later value
    let corner = space.vertex_dofs()[0].unwrap();
    assert_eq!(partition.prescribed_values()[corner], 2.0);

    assert!(matches!(
        DofPartition::from_boundary_values(&space, &[("ground", 0.0)]),
        Err(FemError::UnknownBoundaryTag { .. })
    ));
}

#[test]
fn condensed_solution_satisfies_the_full_system_on_free_dofs() {
    let mesh = create_unit_square_tri_mesh(6);
    let space = FiniteElementSpace::build(&mesh, Tri3Element).unwrap();
    let a = assemble_bilinear(&space, &Laplace).unwrap();
    let b = assemble_linear(&space, &Source(|x: &nalgebra::Point2<f64>| x.x.sin())).unwrap();
    let partition = DofPartition::from_boundary_values(&space, &[("left", 0.5), ("right", -1.0)]).unwrap();

    let (reduced_a, reduced_b) = partition.condense(&a, &b).unwrap();
    let u = partition.scatter(&solve(&reduced_a, &reduced_b).unwrap());

    let residual = tagfem_sparse::spmv(&a, &u) - &b;
    for &dof in partition.free() {
        assert_scalar_eq!(residual[dof], 0.0, comp = abs, tol = 1e-10);
    }
    for &dof in partition.fixed() {
        assert_eq!(u[dof], partition.prescribed_values()[dof]);
    }
}

proptest! {
    #[test]
    fn condensation_matches_dense_elimination(
        fixed_mask in prop::collection::vec(any::<bool>(), 4),
        values in prop::collection::vec(-10.0..10.0f64, 4),
    ) {
        prop_assume!(fixed_mask.iter().any(|&fixed| !fixed));
        let (matrix, rhs) = small_system();
        let fixed: Vec<_> = (0..4).filter(|&i| fixed_mask[i]).collect();
        let free: Vec<_> = (0..4).filter(|&i| !fixed_mask[i]).collect();
        let prescribed = DVector::from_column_slice(&values);
        let (reduced_matrix, reduced_rhs) = condense(&matrix, &rhs, &prescribed, &fixed).unwrap();

        let dense = DMatrix::from(&matrix);
        let reduced_dense = DMatrix::from(&reduced_matrix);
        for (r, &i) in free.iter().enumerate() {
            let mut expected_rhs = rhs[i];
            for &j in &fixed {
                expected_rhs -= dense[(i, j)] * prescribed[j];
            }
            prop_assert!((reduced_rhs[r] - expected_rhs).abs() <= 1e-12);
            for (c, &j) in free.iter().enumerate() {
                prop_assert_eq!(reduced_dense[(r, c)], dense[(i, j)]);
            }
        }
    }
}

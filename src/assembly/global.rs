//! Global assembly of sparse matrices and vectors from element contributions.
use crate::assembly::forms::{BilinearForm, FacetLinearForm, LinearForm};
use crate::assembly::local::{assemble_element_matrix, assemble_element_vector, assemble_facet_vector, BasisBuffer};
use crate::element::ReferenceElement;
use crate::mesh::Facet;
use crate::quadrature;
use crate::space::FiniteElementSpace;
use crate::FemError;
use log::debug;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CsrMatrix;
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use rayon::slice::ParallelSliceMut;
use std::cell::RefCell;
use std::collections::BTreeSet;
use thread_local::ThreadLocal;

#[derive(Debug, Clone)]
struct CsrAssemblerWorkspace {
    connectivity_permutation: Vec<usize>,
    element_matrix: DMatrix<f64>,
    basis: BasisBuffer,
}

impl Default for CsrAssemblerWorkspace {
    fn default() -> Self {
        Self {
            connectivity_permutation: Vec::new(),
            element_matrix: DMatrix::zeros(0, 0),
            basis: BasisBuffer::default(),
        }
    }
}

/// A serial assembler for CSR matrices.
///
/// Buffers are kept between calls, so reusing one assembler for several matrices avoids
/// repeated allocation.
#[derive(Debug, Default)]
pub struct CsrAssembler {
    workspace: RefCell<CsrAssemblerWorkspace>,
}

impl CsrAssembler {
    /// Sparsity pattern with an entry for every pair of DOFs sharing an element.
    pub fn assemble_pattern<E>(&self, space: &FiniteElementSpace<E>) -> Result<SparsityPattern, FemError> {
        // Collecting into a BTreeSet stores each entry once, which keeps memory usage low when
        // many elements share DOFs
        let mut matrix_entries = BTreeSet::new();
        for i in 0..space.num_elements() {
            let dofs = space.local_to_global(i);
            for &dof_i in dofs {
                for &dof_j in dofs {
                    matrix_entries.insert((dof_i, dof_j));
                }
            }
        }

        let num_rows = space.num_dofs();
        let mut offsets = Vec::with_capacity(num_rows + 1);
        let mut column_indices = Vec::with_capacity(matrix_entries.len());
        offsets.push(0);
        for (i, j) in matrix_entries {
            // A while loop handles consecutive empty rows
            while i + 1 > offsets.len() {
                offsets.push(column_indices.len());
            }
            column_indices.push(j);
        }
        while offsets.len() < num_rows + 1 {
            offsets.push(column_indices.len());
        }

        pattern_from_offsets_and_indices(num_rows, offsets, column_indices)
    }

    pub fn assemble<E, F>(&self, space: &FiniteElementSpace<E>, form: &F) -> Result<CsrMatrix<f64>, FemError>
    where
        E: ReferenceElement,
        F: ?Sized + BilinearForm,
    {
        let pattern = self.assemble_pattern(space)?;
        let mut matrix = zeros_with_pattern(pattern)?;
        self.assemble_into_csr(&mut matrix, space, form)?;
        debug!(
            "Assembled {}x{} matrix with {} non-zeros from {} elements",
            matrix.nrows(),
            matrix.ncols(),
            matrix.nnz(),
            space.num_elements()
        );
        Ok(matrix)
    }

    /// Adds the element contributions of `form` to the existing entries of `csr`.
    ///
    /// # Panics
    ///
    /// Panics if the sparsity pattern of `csr` lacks an entry coupling two DOFs of some element.
    pub fn assemble_into_csr<E, F>(
        &self,
        csr: &mut CsrMatrix<f64>,
        space: &FiniteElementSpace<E>,
        form: &F,
    ) -> Result<(), FemError>
    where
        E: ReferenceElement,
        F: ?Sized + BilinearForm,
    {
        assert_eq!(csr.nrows(), space.num_dofs());
        assert_eq!(csr.ncols(), space.num_dofs());
        let rule = quadrature::triangle(form.quadrature_degree(space.element().degree()))?;

        let ws = &mut *self.workspace.borrow_mut();
        for i in 0..space.num_elements() {
            let geometry = space.element_geometry(i)?;
            assemble_element_matrix(
                &mut ws.element_matrix,
                &mut ws.basis,
                space.element(),
                &geometry,
                i,
                &rule,
                form,
            )?;
            add_element_matrix_to_csr(
                csr,
                space.local_to_global(i),
                &mut ws.connectivity_permutation,
                &ws.element_matrix,
            );
        }
        Ok(())
    }
}

/// A parallel assembler for CSR matrices.
///
/// Element matrices are computed in parallel with per-thread workspaces and then added to the
/// global matrix in element order on the calling thread, so the result does not depend on the
/// number of threads.
#[derive(Debug, Default)]
pub struct CsrParAssembler {
    workspace: ThreadLocal<RefCell<CsrAssemblerWorkspace>>,
}

impl CsrParAssembler {
    pub fn assemble_pattern<E>(&self, space: &FiniteElementSpace<E>) -> Result<SparsityPattern, FemError>
    where
        E: ReferenceElement,
    {
        let num_total_entries: usize = (0..space.num_elements())
            .into_par_iter()
            .with_min_len(50)
            .map(|i| space.local_to_global(i).len().pow(2))
            .sum();

        let mut coordinates = Vec::with_capacity(num_total_entries);
        for i in 0..space.num_elements() {
            let dofs = space.local_to_global(i);
            for &dof_i in dofs {
                for &dof_j in dofs {
                    coordinates.push((dof_i, dof_j));
                }
            }
        }
        coordinates.par_sort_unstable();
        coordinates.dedup();

        let num_rows = space.num_dofs();
        let mut row_offsets = Vec::with_capacity(num_rows + 1);
        let mut column_indices = Vec::with_capacity(coordinates.len());
        row_offsets.push(0);
        let mut current_row = 0;
        for (i, j) in coordinates {
            while i > current_row {
                row_offsets.push(column_indices.len());
                current_row += 1;
            }
            column_indices.push(j);
        }
        // Remaining (possibly empty) rows
        while row_offsets.len() < num_rows + 1 {
            row_offsets.push(column_indices.len());
        }

        pattern_from_offsets_and_indices(num_rows, row_offsets, column_indices)
    }

    pub fn assemble<E, F>(&self, space: &FiniteElementSpace<E>, form: &F) -> Result<CsrMatrix<f64>, FemError>
    where
        E: ReferenceElement,
        F: ?Sized + BilinearForm,
    {
        let pattern = self.assemble_pattern(space)?;
        let mut matrix = zeros_with_pattern(pattern)?;
        self.assemble_into_csr(&mut matrix, space, form)?;
        debug!(
            "Assembled {}x{} matrix with {} non-zeros from {} elements in parallel",
            matrix.nrows(),
            matrix.ncols(),
            matrix.nnz(),
            space.num_elements()
        );
        Ok(matrix)
    }

    pub fn assemble_into_csr<E, F>(
        &self,
        csr: &mut CsrMatrix<f64>,
        space: &FiniteElementSpace<E>,
        form: &F,
    ) -> Result<(), FemError>
    where
        E: ReferenceElement,
        F: ?Sized + BilinearForm,
    {
        assert_eq!(csr.nrows(), space.num_dofs());
        assert_eq!(csr.ncols(), space.num_dofs());
        let rule = quadrature::triangle(form.quadrature_degree(space.element().degree()))?;

        let element_matrices = (0..space.num_elements())
            .into_par_iter()
            .map(|i| {
                let ws = &mut *self.workspace.get_or_default().borrow_mut();
                let geometry = space.element_geometry(i)?;
                assemble_element_matrix(
                    &mut ws.element_matrix,
                    &mut ws.basis,
                    space.element(),
                    &geometry,
                    i,
                    &rule,
                    form,
                )?;
                Ok(ws.element_matrix.clone())
            })
            .collect::<Result<Vec<_>, FemError>>()?;

        let mut permutation = Vec::new();
        for (i, element_matrix) in element_matrices.iter().enumerate() {
            add_element_matrix_to_csr(csr, space.local_to_global(i), &mut permutation, element_matrix);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct VectorAssemblerWorkspace {
    element_vector: DVector<f64>,
    basis: BasisBuffer,
}

impl Default for VectorAssemblerWorkspace {
    fn default() -> Self {
        Self {
            element_vector: DVector::zeros(0),
            basis: BasisBuffer::default(),
        }
    }
}

/// A serial assembler for global vectors from element or facet contributions.
#[derive(Debug, Default)]
pub struct VectorAssembler {
    workspace: RefCell<VectorAssemblerWorkspace>,
}

impl VectorAssembler {
    pub fn assemble_vector<E, F>(&self, space: &FiniteElementSpace<E>, form: &F) -> Result<DVector<f64>, FemError>
    where
        E: ReferenceElement,
        F: ?Sized + LinearForm,
    {
        let rule = quadrature::triangle(form.quadrature_degree(space.element().degree()))?;
        let ws = &mut *self.workspace.borrow_mut();
        let mut vector = DVector::zeros(space.num_dofs());
        for i in 0..space.num_elements() {
            let geometry = space.element_geometry(i)?;
            assemble_element_vector(
                &mut ws.element_vector,
                &mut ws.basis,
                space.element(),
                &geometry,
                i,
                &rule,
                form,
            )?;
            for (&dof, value) in space.local_to_global(i).iter().zip(ws.element_vector.iter()) {
                vector[dof] += value;
            }
        }
        Ok(vector)
    }

    /// Assembles `form` over the given facets only.
    ///
    /// Fails with [`FemError::InconsistentTopology`] if a facet is not a boundary edge of its
    /// element.
    pub fn assemble_facet_vector<E, F>(
        &self,
        space: &FiniteElementSpace<E>,
        form: &F,
        facets: &[Facet],
    ) -> Result<DVector<f64>, FemError>
    where
        E: ReferenceElement,
        F: ?Sized + FacetLinearForm,
    {
        let rule = quadrature::segment(form.quadrature_degree(space.element().degree()));
        let ws = &mut *self.workspace.borrow_mut();
        let mut vector = DVector::zeros(space.num_dofs());
        space.check_facets(facets)?;
        for facet in facets {
            let geometry = space.element_geometry(facet.element)?;
            assemble_facet_vector(
                &mut ws.element_vector,
                &mut ws.basis,
                space.element(),
                &geometry,
                facet.element,
                facet.local_index,
                &rule,
                form,
            )?;
            for (&dof, value) in space
                .local_to_global(facet.element)
                .iter()
                .zip(ws.element_vector.iter())
            {
                vector[dof] += value;
            }
        }
        Ok(vector)
    }
}

/// Assembles the sparse matrix of a bilinear form.
pub fn assemble_bilinear<E, F>(space: &FiniteElementSpace<E>, form: &F) -> Result<CsrMatrix<f64>, FemError>
where
    E: ReferenceElement,
    F: ?Sized + BilinearForm,
{
    CsrAssembler::default().assemble(space, form)
}

/// Parallel variant of [`assemble_bilinear`].
pub fn assemble_bilinear_par<E, F>(space: &FiniteElementSpace<E>, form: &F) -> Result<CsrMatrix<f64>, FemError>
where
    E: ReferenceElement,
    F: ?Sized + BilinearForm,
{
    CsrParAssembler::default().assemble(space, form)
}

/// Assembles the vector of a linear form over all elements.
pub fn assemble_linear<E, F>(space: &FiniteElementSpace<E>, form: &F) -> Result<DVector<f64>, FemError>
where
    E: ReferenceElement,
    F: ?Sized + LinearForm,
{
    VectorAssembler::default().assemble_vector(space, form)
}

/// Assembles the vector of a facet linear form over a set of boundary facets.
pub fn assemble_facet_linear<E, F>(
    space: &FiniteElementSpace<E>,
    form: &F,
    facets: &[Facet],
) -> Result<DVector<f64>, FemError>
where
    E: ReferenceElement,
    F: ?Sized + FacetLinearForm,
{
    VectorAssembler::default().assemble_facet_vector(space, form, facets)
}

/// Assembles a facet linear form over the facets tagged `tag`.
pub fn assemble_boundary_linear<E, F>(
    space: &FiniteElementSpace<E>,
    form: &F,
    tag: &str,
) -> Result<DVector<f64>, FemError>
where
    E: ReferenceElement,
    F: ?Sized + FacetLinearForm,
{
    let facets = space.mesh().boundary(tag)?;
    assemble_facet_linear(space, form, facets)
}

/// Integration measure of every element, summed from quadrature weights and Jacobian determinants.
pub fn element_measures<E>(space: &FiniteElementSpace<E>) -> Result<Vec<f64>, FemError> {
    let rule = quadrature::triangle(0)?;
    (0..space.num_elements())
        .map(|i| {
            let det = space.element_geometry(i)?.determinant();
            Ok(rule.weights().iter().map(|w| w * det).sum())
        })
        .collect()
}

fn pattern_from_offsets_and_indices(
    num_rows: usize,
    offsets: Vec<usize>,
    column_indices: Vec<usize>,
) -> Result<SparsityPattern, FemError> {
    SparsityPattern::try_from_offsets_and_indices(num_rows, num_rows, offsets, column_indices).map_err(|err| {
        FemError::InconsistentTopology {
            reason: format!("element DOFs do not form a valid sparsity pattern: {}", err),
        }
    })
}

fn zeros_with_pattern(pattern: SparsityPattern) -> Result<CsrMatrix<f64>, FemError> {
    let nnz = pattern.nnz();
    CsrMatrix::try_from_pattern_and_values(pattern, vec![0.0; nnz]).map_err(|err| FemError::InconsistentTopology {
        reason: format!("failed to allocate matrix: {}", err),
    })
}

/// Adds a dense element matrix to the rows of `csr` given by `element_dofs`.
///
/// `permutation` is scratch space for the local indices sorted by global DOF, which lets each CSR
/// row be scanned once per element row.
fn add_element_matrix_to_csr(
    csr: &mut CsrMatrix<f64>,
    element_dofs: &[usize],
    permutation: &mut Vec<usize>,
    element_matrix: &DMatrix<f64>,
) {
    assert_eq!(element_dofs.len(), element_matrix.nrows());
    permutation.clear();
    permutation.extend(0..element_dofs.len());
    permutation.sort_unstable_by_key(|&local| element_dofs[local]);

    let (row_offsets, col_indices, values) = csr.csr_data_mut();
    for (local_row, &global_row) in element_dofs.iter().enumerate() {
        let row_range = row_offsets[global_row]..row_offsets[global_row + 1];
        let row_cols = &col_indices[row_range.clone()];
        let row_values = &mut values[row_range];

        let mut csr_col_iter = row_cols.iter().copied().enumerate();
        for &local_col in permutation.iter() {
            let global_col = element_dofs[local_col];
            let (csr_idx, _) = csr_col_iter
                .find(|&(_, col)| col == global_col)
                .expect("CSR pattern must contain all element entries");
            row_values[csr_idx] += element_matrix[(local_row, local_col)];
        }
    }
}

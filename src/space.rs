//! Finite element spaces: global DOF numbering and local-to-global maps.
use crate::element::{AffineTriangle, ReferenceElement};
use crate::mesh::{sorted_edge, triangle_edge, Facet, TaggedMesh};
use crate::FemError;
use log::debug;
use nalgebra::{DVector, Point2};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// A conforming finite element space on a [`TaggedMesh`].
///
/// Every mesh vertex referenced by an element carries one DOF; elements with edge DOFs add one
/// DOF per distinct edge. DOFs shared between elements map to a single global index.
///
/// Global numbering: referenced vertices in ascending vertex order come first, followed by edge
/// DOFs in the order edges are first encountered when traversing elements and their local edges.
#[derive(Debug, Clone)]
pub struct FiniteElementSpace<'a, E> {
    mesh: &'a TaggedMesh,
    element: E,
    num_dofs: usize,
    nodes_per_element: usize,
    element_dofs: Vec<usize>,
    vertex_dofs: Vec<Option<usize>>,
}

impl<'a, E: ReferenceElement> FiniteElementSpace<'a, E> {
    /// Builds the DOF numbering for `element` on `mesh`.
    ///
    /// Fails with [`FemError::InconsistentTopology`] if an element references a missing or repeated
    /// vertex, or if a tagged facet does not exist or is not a boundary facet of its element.
    pub fn build(mesh: &'a TaggedMesh, element: E) -> Result<Self, FemError> {
        check_connectivity(mesh)?;
        check_boundaries(mesh)?;
        assert!(
            element.num_nodes() == 3 + 3 * element.dofs_per_edge(),
            "triangle elements carry vertex and edge DOFs only"
        );

        let mut vertex_dofs = vec![None; mesh.vertices().len()];
        for triangle in mesh.connectivity() {
            for &v in triangle {
                vertex_dofs[v] = Some(0);
            }
        }
        let mut num_dofs = 0;
        for dof in vertex_dofs.iter_mut().flatten() {
            *dof = num_dofs;
            num_dofs += 1;
        }

        let nodes_per_element = element.num_nodes();
        let mut element_dofs = Vec::with_capacity(nodes_per_element * mesh.num_elements());
        let mut edge_dofs = FxHashMap::default();
        for triangle in mesh.connectivity() {
            for &v in triangle {
                // All referenced vertices were numbered above
                element_dofs.push(vertex_dofs[v].unwrap_or(usize::MAX));
            }
            if element.dofs_per_edge() > 0 {
                for local_edge in 0..3 {
                    let edge = sorted_edge(triangle_edge(triangle, local_edge));
                    let dof = *edge_dofs.entry(edge).or_insert_with(|| {
                        num_dofs += 1;
                        num_dofs - 1
                    });
                    element_dofs.push(dof);
                }
            }
        }

        debug!(
            "Built space with {} DOFs ({} elements, {} edge DOFs)",
            num_dofs,
            mesh.num_elements(),
            edge_dofs.len()
        );

        Ok(Self {
            mesh,
            element,
            num_dofs,
            nodes_per_element,
            element_dofs,
            vertex_dofs,
        })
    }
}

impl<'a, E> FiniteElementSpace<'a, E> {
    pub fn mesh(&self) -> &'a TaggedMesh {
        self.mesh
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn num_dofs(&self) -> usize {
        self.num_dofs
    }

    pub fn num_elements(&self) -> usize {
        self.mesh.num_elements()
    }

    /// Global DOF indices of element `element`, in local DOF order.
    ///
    /// # Panics
    ///
    /// Panics if the element index is out of bounds.
    pub fn local_to_global(&self, element: usize) -> &[usize] {
        let start = self.nodes_per_element * element;
        &self.element_dofs[start..start + self.nodes_per_element]
    }

    /// The DOF of every mesh vertex, or `None` for vertices not referenced by any element.
    pub fn vertex_dofs(&self) -> &[Option<usize>] {
        &self.vertex_dofs
    }

    /// Geometry of an element, checked for degeneracy.
    pub fn element_geometry(&self, element: usize) -> Result<AffineTriangle, FemError> {
        let geometry = self
            .mesh
            .element_geometry(element)
            .ok_or_else(|| FemError::InconsistentTopology {
                reason: format!("element {} does not exist", element),
            })?;
        geometry.check_nondegenerate(element)?;
        Ok(geometry)
    }

    /// Sorted, deduplicated DOFs that are not in `dofs`.
    pub fn complement_dofs(&self, dofs: &[usize]) -> Vec<usize> {
        let mut excluded = vec![false; self.num_dofs];
        for &dof in dofs {
            excluded[dof] = true;
        }
        (0..self.num_dofs).filter(|&dof| !excluded[dof]).collect()
    }
}

impl<'a, E: ReferenceElement> FiniteElementSpace<'a, E> {
    /// Validates a facet set that does not come from the mesh's own tags.
    ///
    /// Fails with [`FemError::InconsistentTopology`] unless every facet is an existing edge of its
    /// element and lies on the mesh boundary.
    pub fn check_facets(&self, facets: &[Facet]) -> Result<(), FemError> {
        check_facets(self.mesh, &edge_counts(self.mesh), "in facet set", facets)
    }

    /// Global DOFs that do not vanish on a boundary facet.
    pub fn facet_dofs(&self, facet: &Facet) -> Vec<usize> {
        let element_dofs = self.local_to_global(facet.element);
        self.element
            .facet_local_dofs(facet.local_index)
            .into_iter()
            .map(|local| element_dofs[local])
            .collect()
    }

    /// Sorted, deduplicated union of the DOFs on all facets tagged `tag`.
    pub fn dofs_for_boundary_tag(&self, tag: &str) -> Result<Vec<usize>, FemError> {
        Ok(self.dofs_for_facets(self.mesh.boundary(tag)?))
    }

    /// DOF sets of every boundary tag of the mesh.
    pub fn boundary_dofs(&self) -> BTreeMap<String, Vec<usize>> {
        self.mesh
            .boundaries()
            .iter()
            .map(|(tag, facets)| (tag.clone(), self.dofs_for_facets(facets)))
            .collect()
    }

    fn dofs_for_facets(&self, facets: &[Facet]) -> Vec<usize> {
        let mut dofs: Vec<_> = facets
            .iter()
            .flat_map(|facet| self.facet_dofs(facet))
            .collect();
        dofs.sort_unstable();
        dofs.dedup();
        dofs
    }

    /// Nodal interpolant of `f`: every DOF takes the value of `f` at its node.
    pub fn interpolate(&self, f: impl Fn(&Point2<f64>) -> f64) -> DVector<f64> {
        let reference_nodes = self.element.reference_nodes();
        let mut u = DVector::zeros(self.num_dofs);
        for i in 0..self.num_elements() {
            let Some(geometry) = self.mesh.element_geometry(i) else {
                continue;
            };
            for (xi, &dof) in reference_nodes.iter().zip(self.local_to_global(i)) {
                u[dof] = f(&geometry.map_reference_coords(xi));
            }
        }
        u
    }
}

fn check_connectivity(mesh: &TaggedMesh) -> Result<(), FemError> {
    let num_vertices = mesh.vertices().len();
    for (i, triangle) in mesh.connectivity().iter().enumerate() {
        if let Some(&v) = triangle.iter().find(|&&v| v >= num_vertices) {
            return Err(FemError::InconsistentTopology {
                reason: format!(
                    "element {} references vertex {}, but the mesh has {} vertices",
                    i, v, num_vertices
                ),
            });
        }
        let [a, b, c] = *triangle;
        if a == b || b == c || a == c {
            return Err(FemError::InconsistentTopology {
                reason: format!("element {} has repeated vertices {:?}", i, triangle),
            });
        }
    }
    Ok(())
}

fn check_boundaries(mesh: &TaggedMesh) -> Result<(), FemError> {
    let edge_counts = edge_counts(mesh);
    for (tag, facets) in mesh.boundaries() {
        check_facets(mesh, &edge_counts, &format!("tagged \"{}\"", tag), facets)?;
    }
    Ok(())
}

/// Number of elements sharing each (sorted) edge.
fn edge_counts(mesh: &TaggedMesh) -> FxHashMap<[usize; 2], usize> {
    let mut counts: FxHashMap<[usize; 2], usize> = FxHashMap::default();
    for triangle in mesh.connectivity() {
        for local_index in 0..3 {
            *counts
                .entry(sorted_edge(triangle_edge(triangle, local_index)))
                .or_default() += 1;
        }
    }
    counts
}

/// Checks that every facet is the `local_index`-th edge of its element and lies on the boundary.
fn check_facets(
    mesh: &TaggedMesh,
    edge_counts: &FxHashMap<[usize; 2], usize>,
    context: &str,
    facets: &[Facet],
) -> Result<(), FemError> {
    for facet in facets {
        let inconsistent = |what: &str| FemError::InconsistentTopology {
            reason: format!("facet {:?} {} {}", facet.vertices, context, what),
        };
        let triangle = mesh
            .connectivity()
            .get(facet.element)
            .ok_or_else(|| inconsistent("references a missing element"))?;
        if facet.local_index >= 3 {
            return Err(inconsistent("has a local index out of range"));
        }
        let local_edge = sorted_edge(triangle_edge(triangle, facet.local_index));
        if local_edge != facet.sorted_vertices() {
            return Err(inconsistent("does not match the edge of its element"));
        }
        if edge_counts.get(&local_edge) != Some(&1) {
            return Err(inconsistent("is not a boundary facet"));
        }
    }
    Ok(())
}

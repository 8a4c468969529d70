//! Triangle meshes with named sets of boundary facets.
use crate::element::AffineTriangle;
use crate::FemError;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod procedural;

/// A boundary facet (edge) of a triangle mesh.
///
/// `vertices` are global vertex indices, `element` the index of the only triangle containing the
/// edge and `local_index` the position of the edge in that triangle: local facet `k` joins local
/// vertex `k` and local vertex `(k + 1) % 3`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Facet {
    pub vertices: [usize; 2],
    pub element: usize,
    pub local_index: usize,
}

impl Facet {
    /// The vertex indices in ascending order, identifying the edge regardless of orientation.
    pub fn sorted_vertices(&self) -> [usize; 2] {
        sorted_edge(self.vertices)
    }
}

pub(crate) fn sorted_edge([a, b]: [usize; 2]) -> [usize; 2] {
    if a <= b {
        [a, b]
    } else {
        [b, a]
    }
}

/// Global vertex indices of local edge `local_index` of a triangle.
pub(crate) fn triangle_edge(triangle: &[usize; 3], local_index: usize) -> [usize; 2] {
    [triangle[local_index], triangle[(local_index + 1) % 3]]
}

/// Index-based triangle mesh with tagged boundary facets.
///
/// Triangles are expected to be counter-clockwise. The mesh is not validated on construction;
/// [`FiniteElementSpace::build`](crate::space::FiniteElementSpace::build) checks connectivity
/// and tags before anything is assembled on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedMesh {
    vertices: Vec<Point2<f64>>,
    connectivity: Vec<[usize; 3]>,
    boundaries: BTreeMap<String, Vec<Facet>>,
}

impl TaggedMesh {
    pub fn from_vertices_and_connectivity(vertices: Vec<Point2<f64>>, connectivity: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            connectivity,
            boundaries: BTreeMap::new(),
        }
    }

    /// Attaches (or replaces) the facet set tagged `tag`.
    pub fn with_boundary(mut self, tag: impl Into<String>, facets: Vec<Facet>) -> Self {
        self.boundaries.insert(tag.into(), facets);
        self
    }

    /// Attaches a boundary tag given only as a list of vertex pairs.
    ///
    /// The owning element and local facet index of every pair are looked up among the boundary
    /// facets of the mesh. Fails with [`FemError::InconsistentTopology`] if a pair is not a
    /// boundary edge.
    pub fn with_boundary_edges(self, tag: impl Into<String>, edges: &[[usize; 2]]) -> Result<Self, FemError> {
        let tag = tag.into();
        let boundary_facets: BTreeMap<_, _> = self
            .find_boundary_facets()
            .into_iter()
            .map(|facet| (facet.sorted_vertices(), facet))
            .collect();

        let facets = edges
            .iter()
            .map(|&edge| {
                boundary_facets
                    .get(&sorted_edge(edge))
                    .copied()
                    .ok_or_else(|| FemError::InconsistentTopology {
                        reason: format!(
                            "edge ({}, {}) tagged \"{}\" is not a boundary edge of the mesh",
                            edge[0], edge[1], tag
                        ),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.with_boundary(tag, facets))
    }

    pub fn vertices(&self) -> &[Point2<f64>] {
        &self.vertices
    }

    pub fn connectivity(&self) -> &[[usize; 3]] {
        &self.connectivity
    }

    pub fn num_elements(&self) -> usize {
        self.connectivity.len()
    }

    pub fn boundaries(&self) -> &BTreeMap<String, Vec<Facet>> {
        &self.boundaries
    }

    pub fn boundary_tags(&self) -> impl Iterator<Item = &str> {
        self.boundaries.keys().map(String::as_str)
    }

    pub fn boundary(&self, tag: &str) -> Result<&[Facet], FemError> {
        self.boundaries
            .get(tag)
            .map(Vec::as_slice)
            .ok_or_else(|| FemError::UnknownBoundaryTag { tag: tag.to_string() })
    }

    /// Geometry of element `index`, or `None` if the index or its vertex indices are out of bounds.
    pub fn element_geometry(&self, index: usize) -> Option<AffineTriangle> {
        let triangle = self.connectivity.get(index)?;
        let mut vertices = [Point2::origin(); 3];
        for (vertex, &v) in vertices.iter_mut().zip(triangle) {
            *vertex = *self.vertices.get(v)?;
        }
        Some(AffineTriangle::from_vertices(vertices))
    }

    /// Sum of the signed areas of all elements.
    pub fn total_area(&self) -> f64 {
        (0..self.num_elements())
            .filter_map(|i| self.element_geometry(i))
            .map(|triangle| triangle.area())
            .sum()
    }

    /// Finds edges that belong to exactly one triangle.
    ///
    /// The result is sorted by owning element, then local facet index.
    pub fn find_boundary_facets(&self) -> Vec<Facet> {
        // BTreeMap rather than HashMap keeps the result independent of hashing
        let mut edge_counts = BTreeMap::new();
        for (element, triangle) in self.connectivity.iter().enumerate() {
            for local_index in 0..3 {
                let vertices = triangle_edge(triangle, local_index);
                let facet = Facet {
                    vertices,
                    element,
                    local_index,
                };
                edge_counts
                    .entry(sorted_edge(vertices))
                    .and_modify(|(_, count)| *count += 1)
                    .or_insert((facet, 1usize));
            }
        }

        let mut facets: Vec<_> = edge_counts
            .into_values()
            .filter(|&(_, count)| count == 1)
            .map(|(facet, _)| facet)
            .collect();
        facets.sort_unstable_by_key(|facet| (facet.element, facet.local_index));
        facets
    }
}

//! Procedural tagged meshes for tests, benchmarks and demos.
use crate::mesh::{Facet, TaggedMesh};
use nalgebra::Point2;
use std::f64::consts::FRAC_PI_2;

/// Splits a structured grid of `nx * ny` cells into counter-clockwise triangles.
///
/// Vertex `(i, j)` has index `j * (nx + 1) + i`. Cell `(i, j)` with corners `a, b, c, d`
/// (counter-clockwise, starting at `(i, j)`) becomes triangles `[a, b, c]` and `[a, c, d]`, stored
/// at indices `2 * (j * nx + i)` and `2 * (j * nx + i) + 1`.
fn structured_triangles(nx: usize, ny: usize) -> Vec<[usize; 3]> {
    let vertex = |i: usize, j: usize| j * (nx + 1) + i;
    let mut connectivity = Vec::with_capacity(2 * nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let a = vertex(i, j);
            let b = vertex(i + 1, j);
            let c = vertex(i + 1, j + 1);
            let d = vertex(i, j + 1);
            connectivity.push([a, b, c]);
            connectivity.push([a, c, d]);
        }
    }
    connectivity
}

fn facet_of(connectivity: &[[usize; 3]], element: usize, local_index: usize) -> Facet {
    let triangle = &connectivity[element];
    Facet {
        vertices: [triangle[local_index], triangle[(local_index + 1) % 3]],
        element,
        local_index,
    }
}

/// Triangulated quarter annulus `r_inner <= r <= r_outer, 0 <= theta <= pi / 2`.
///
/// Cells are sized so that no edge on the outer arc is longer than roughly `characteristic_length`.
/// The straight edge on the x-axis is tagged `ground`, the one on the y-axis `positive`.
///
/// # Panics
///
/// Panics unless `0 < r_inner < r_outer` and `characteristic_length > 0`.
pub fn create_quarter_annulus_mesh(r_inner: f64, r_outer: f64, characteristic_length: f64) -> TaggedMesh {
    assert!(0.0 < r_inner && r_inner < r_outer, "radii must satisfy 0 < r_inner < r_outer");
    assert!(characteristic_length > 0.0, "characteristic length must be positive");

    let h = characteristic_length;
    let n_r = ((r_outer - r_inner) / h).ceil().max(1.0) as usize;
    let n_theta = (FRAC_PI_2 * r_outer / h).ceil().max(1.0) as usize;

    let mut vertices = Vec::with_capacity((n_r + 1) * (n_theta + 1));
    for j in 0..=n_theta {
        let theta = FRAC_PI_2 * j as f64 / n_theta as f64;
        for i in 0..=n_r {
            let r = r_inner + (r_outer - r_inner) * i as f64 / n_r as f64;
            vertices.push(Point2::new(r * theta.cos(), r * theta.sin()));
        }
    }

    let connectivity = structured_triangles(n_r, n_theta);
    let cell = |i: usize, j: usize| 2 * (j * n_r + i);
    let ground = (0..n_r).map(|i| facet_of(&connectivity, cell(i, 0), 0)).collect();
    let positive = (0..n_r)
        .map(|i| facet_of(&connectivity, cell(i, n_theta - 1) + 1, 1))
        .collect();

    TaggedMesh::from_vertices_and_connectivity(vertices, connectivity)
        .with_boundary("ground", ground)
        .with_boundary("positive", positive)
}

/// Uniform triangulation of `[0, 1]^2` with `cells_per_dim` cells along each axis.
///
/// The four sides are tagged `left`, `right`, `bottom` and `top`.
pub fn create_unit_square_tri_mesh(cells_per_dim: usize) -> TaggedMesh {
    let n = cells_per_dim;
    if n == 0 {
        return TaggedMesh::from_vertices_and_connectivity(Vec::new(), Vec::new());
    }

    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point2::new(i as f64 / n as f64, j as f64 / n as f64));
        }
    }

    let connectivity = structured_triangles(n, n);
    let cell = |i: usize, j: usize| 2 * (j * n + i);
    let bottom = (0..n).map(|i| facet_of(&connectivity, cell(i, 0), 0)).collect();
    let right = (0..n).map(|j| facet_of(&connectivity, cell(n - 1, j), 1)).collect();
    let top = (0..n)
        .map(|i| facet_of(&connectivity, cell(i, n - 1) + 1, 1))
        .collect();
    let left = (0..n).map(|j| facet_of(&connectivity, cell(0, j) + 1, 2)).collect();

    TaggedMesh::from_vertices_and_connectivity(vertices, connectivity)
        .with_boundary("left", left)
        .with_boundary("right", right)
        .with_boundary("bottom", bottom)
        .with_boundary("top", top)
}

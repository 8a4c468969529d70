use matrixcompare::assert_scalar_eq;
use nalgebra::point;
use std::f64::consts::PI;
use tagfem::mesh::procedural::{create_quarter_annulus_mesh, create_unit_square_tri_mesh};
use tagfem::mesh::{Facet, TaggedMesh};
use tagfem::FemError;

fn two_triangle_mesh() -> TaggedMesh {
    TaggedMesh::from_vertices_and_connectivity(
        vec![point![0.0, 0.0], point![1.0, 0.0], point![1.0, 1.0], point![0.0, 1.0]],
        vec![[0, 1, 2], [0, 2, 3]],
    )
}

#[test]
fn find_boundary_facets_skips_shared_edges() {
    let mesh = two_triangle_mesh();
    let facets = mesh.find_boundary_facets();
    let expected = vec![
        Facet {
            vertices: [0, 1],
            element: 0,
            local_index: 0,
        },
        Facet {
            vertices: [1, 2],
            element: 0,
            local_index: 1,
        },
        Facet {
            vertices: [2, 3],
            element: 1,
            local_index: 1,
        },
        Facet {
            vertices: [3, 0],
            element: 1,
            local_index: 2,
        },
    ];
    assert_eq!(facets, expected);
}

#[test]
fn with_boundary_edges_resolves_owner_and_local_index() {
    let mesh = two_triangle_mesh()
        .with_boundary_edges("top", &[[3, 2]])
        .unwrap();
    assert_eq!(
        mesh.boundary("top").unwrap(),
        &[Facet {
            vertices: [2, 3],
            element: 1,
            local_index: 1
        }]
    );
}

#[test]
fn with_boundary_edges_rejects_interior_edges() {
    let result = two_triangle_mesh().with_boundary_edges("diagonal", &[[0, 2]]);
    assert!(matches!(result, Err(FemError::InconsistentTopology { .. })));
    let result = two_triangle_mesh().with_boundary_edges("missing", &[[1, 3]]);
    assert!(matches!(result, Err(FemError::InconsistentTopology { .. })));
}

#[test]
fn unknown_tag_lookup_fails() {
    let mesh = two_triangle_mesh();
    assert_eq!(
        mesh.boundary("ground"),
        Err(FemError::UnknownBoundaryTag {
            tag: "ground".to_string()
        })
    );
}

#[test]
fn unit_square_mesh_is_tagged_on_all_sides() {
    let n = 4;
    let mesh = create_unit_square_tri_mesh(n);
    assert_eq!(mesh.vertices().len(), (n + 1) * (n + 1));
    assert_eq!(mesh.num_elements(), 2 * n * n);
    assert_scalar_eq!(mesh.total_area(), 1.0, comp = abs, tol = 1e-12);
    assert_eq!(
        mesh.boundary_tags().collect::<Vec<_>>(),
        vec!["bottom", "left", "right", "top"]
    );

    let boundary_facets = mesh.find_boundary_facets();
    assert_eq!(boundary_facets.len(), 4 * n);
    let mut tagged: Vec<_> = mesh.boundaries().values().flatten().copied().collect();
    tagged.sort_unstable_by_key(|facet| (facet.element, facet.local_index));
    assert_eq!(tagged, boundary_facets);

    let on_side = |tag: &str, predicate: fn(f64, f64) -> bool| {
        mesh.boundary(tag).unwrap().iter().all(|facet| {
            facet
                .vertices
                .iter()
                .all(|&v| predicate(mesh.vertices()[v].x, mesh.vertices()[v].y))
        })
    };
    assert!(on_side("left", |x, _| x == 0.0));
    assert!(on_side("right", |x, _| x == 1.0));
    assert!(on_side("bottom", |_, y| y == 0.0));
    assert!(on_side("top", |_, y| y == 1.0));
}

#[test]
fn quarter_annulus_mesh_geometry_and_tags() {
    let mesh = create_quarter_annulus_mesh(1.0, 2.0, 0.1);
    let exact_area = 0.25 * PI * (4.0 - 1.0);
    // Chords cut off a little area along the arcs
    assert!(mesh.total_area() < exact_area);
    assert_scalar_eq!(mesh.total_area(), exact_area, comp = abs, tol = 1e-2);

    for i in 0..mesh.num_elements() {
        assert!(mesh.element_geometry(i).unwrap().area() > 0.0);
    }

    for facet in mesh.boundary("ground").unwrap() {
        assert!(facet.vertices.iter().all(|&v| mesh.vertices()[v].y.abs() < 1e-12));
    }
    for facet in mesh.boundary("positive").unwrap() {
        assert!(facet.vertices.iter().all(|&v| mesh.vertices()[v].x.abs() < 1e-12));
    }
    assert_eq!(mesh.boundary("ground").unwrap().len(), 10);
    assert_eq!(mesh.boundary("positive").unwrap().len(), 10);
}

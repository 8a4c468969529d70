//! Electrostatic potential in a quarter annulus between a grounded and a charged port.
//!
//! Usage: `cargo run --release --example quarter_disk [characteristic_length]`
use eyre::{eyre, WrapErr};
use nalgebra::{DVector, Point2};
use std::f64::consts::{LN_2, PI};
use tagfem::assembly::assemble_bilinear;
use tagfem::assembly::forms::{Laplace, Mass};
use tagfem::condense::DofPartition;
use tagfem::element::Tri6Element;
use tagfem::mesh::procedural::create_quarter_annulus_mesh;
use tagfem::postprocess::{boundary_currents, energy, l2_norm, l2_project};
use tagfem::solve::{solve_dirichlet, LinearSolver};
use tagfem::space::FiniteElementSpace;

fn exact_potential(x: &Point2<f64>) -> f64 {
    2.0 * x.y.atan2(x.x) / PI
}

fn main() -> eyre::Result<()> {
    let characteristic_length = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<f64>()
            .wrap_err_with(|| format!("invalid characteristic length \"{}\"", arg))?,
        None => 0.1,
    };
    if !(characteristic_length > 0.0) {
        return Err(eyre!("characteristic length must be positive"));
    }

    let mesh = create_quarter_annulus_mesh(1.0, 2.0, characteristic_length);
    let space = FiniteElementSpace::build(&mesh, Tri6Element)?;
    println!(
        "Mesh: {} vertices, {} triangles, {} DOFs",
        mesh.vertices().len(),
        mesh.num_elements(),
        space.num_dofs()
    );

    let a = assemble_bilinear(&space, &Laplace)?;
    let b = DVector::zeros(space.num_dofs());
    let partition = DofPartition::from_boundary_values(&space, &[("ground", 0.0), ("positive", 1.0)])?;
    let u = solve_dirichlet(&a, &b, &partition, &LinearSolver::default())?;

    let mass = assemble_bilinear(&space, &Mass)?;
    let u_exact = l2_project(&space, exact_potential)?;
    println!("L2 error: {:.3e}", l2_norm(&mass, &u, &u_exact));

    let conductance = energy(&a, &u);
    let exact_conductance = 2.0 * LN_2 / PI;
    println!(
        "Conductance: {:.6} (exact {:.6}, error {:.3e})",
        conductance,
        exact_conductance,
        (conductance - exact_conductance).abs()
    );

    for (port, current) in boundary_currents(&space, &u)? {
        println!("Current through {}: {:.6}", port, current);
    }
    Ok(())
}

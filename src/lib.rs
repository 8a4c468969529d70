//! Finite element assembly and solve engine for steady-state scalar potential problems on
//! two-dimensional triangle meshes with tagged boundaries.
//!
//! The typical pipeline is
//!
//! 1. a [`TaggedMesh`](mesh::TaggedMesh) produced by an external mesh generator,
//! 2. a [`FiniteElementSpace`](space::FiniteElementSpace) built from the mesh and an element type,
//! 3. global matrices and vectors from [`assembly`] driven by weak forms,
//! 4. Dirichlet condensation with [`condense`] and a linear solve with [`solve`],
//! 5. derived quantities (projections, error norms, boundary fluxes) from [`postprocess`].
pub mod assembly;
pub mod condense;
pub mod element;
pub mod error;
pub mod mesh;
pub mod postprocess;
pub mod quadrature;
pub mod solve;
pub mod space;

pub use error::FemError;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

//! Assembly of global sparse matrices and vectors from weak forms.
//!
//! [`forms`] defines what is integrated, [`local`] integrates a form over a single element or
//! facet, and [`global`] scatters element contributions into global structures.
pub mod forms;
pub mod global;
pub mod local;

pub use global::{
    assemble_bilinear, assemble_bilinear_par, assemble_boundary_linear, assemble_facet_linear, assemble_linear,
    element_measures, CsrAssembler, CsrParAssembler, VectorAssembler,
};

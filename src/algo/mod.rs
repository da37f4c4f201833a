//! Discrete exterior calculus on triangle meshes.
//!
//! The pipeline, bottom up:
//!
//! - **Weights**: cotangent or uniform edge weights ([`weights`])
//! - **Operators**: exterior derivatives `d0`, `d1` and codifferentials
//!   `δ1`, `δ2` ([`operators`])
//! - **Poisson systems**: vertex and face Laplacians, Dirichlet reduction and
//!   a conjugate gradient solver ([`poisson`], [`sparse`])
//! - **Decomposition**: splitting a 1-form into exact, coexact and harmonic
//!   parts ([`decomposition`])
//! - **Harmonic measure**: exact harmonic forms from boundary data
//!   ([`harmonic`])
//! - **Integration**: summing 1-forms into potentials and flattenings
//!   ([`integration`])
//!
//! [`inner_product`] and [`diagnostics`] are shared by all stages.

pub mod decomposition;
pub mod diagnostics;
pub mod harmonic;
pub mod inner_product;
pub mod integration;
pub mod operators;
pub mod poisson;
pub mod sparse;
pub mod weights;

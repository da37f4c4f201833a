//! # Hodge
//!
//! Discrete Hodge decomposition and harmonic 1-forms on triangle meshes.
//!
//! Hodge stores 0-, 1- and 2-forms as buffers over a half-edge mesh and
//! provides the discrete exterior calculus needed to split a 1-form into its
//! exact, coexact and harmonic parts, build harmonic forms from boundary data,
//! and integrate closed forms into potentials and planar flattenings.
//!
//! ## Features
//!
//! - **Half-edge data structure**: O(1) adjacency queries with type-safe indices
//! - **Flexible indexing**: Support for 16-bit, 32-bit, and 64-bit indices
//! - **Typed forms**: 1-forms live on halfedges and are antisymmetric by construction
//! - **Cotangent Laplacians**: vertex and face Poisson systems solved by conjugate gradients
//! - **Diagnostics**: every result reports its closedness, coclosedness and solver status
//!
//! ## Quick Start
//!
//! ```
//! use hodge::prelude::*;
//! use nalgebra::Point3;
//!
//! // A square split along its diagonal
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2], [0, 2, 3]];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! // The derivative of a vertex function is closed
//! let f = ZeroForm::from_values(nalgebra::DVector::from_vec(vec![0.0, 1.0, 2.0, 1.0]));
//! let df = d0(&mesh, &f);
//! assert!(d1(&mesh, &df).max_abs() < 1e-12);
//!
//! // On a disk every 1-form is exact plus coexact
//! let split = decompose(&mesh, &df, &DecompositionOptions::default()).unwrap();
//! assert!(split.harmonic.max_abs() < 1e-8);
//! ```
//!
//! ## Flattening an Annulus
//!
//! The harmonic measure of the inner boundary and the harmonic form winding
//! around the hole combine into a complex 1-form whose integral maps the
//! annulus onto a planar ring:
//!
//! ```
//! use hodge::prelude::*;
//! use nalgebra::Point3;
//!
//! # let n = 16;
//! # let mut vertices = Vec::new();
//! # let mut faces = Vec::new();
//! # let q = (3f64.sqrt() * std::f64::consts::PI / n as f64).exp();
//! # for k in 0..3 {
//! #     for j in 0..n {
//! #         let t = 2.0 * std::f64::consts::PI * (j as f64 + 0.5 * k as f64) / n as f64;
//! #         let r = q.powi(k as i32);
//! #         vertices.push(Point3::new(r * t.cos(), r * t.sin(), 0.0));
//! #     }
//! # }
//! # for k in 0..2 {
//! #     for j in 0..n {
//! #         let (a, b) = (k * n + j, k * n + (j + 1) % n);
//! #         let (c, d) = (a + n, b + n);
//! #         faces.push([a, c, b]);
//! #         faces.push([b, c, d]);
//! #     }
//! # }
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! let radial = exact_harmonic_form(&mesh, 0, &HarmonicOptions::default()).unwrap();
//! let angular =
//!     random_harmonic_form(&mesh, &DecompositionOptions::default().with_seed(3)).unwrap();
//! let duv = ComplexEdgeForm::from_parts(&radial.du, &angular.du).unwrap();
//!
//! let fathers = FatherMap::identity(mesh.num_vertices());
//! let flat = integrate(&mesh, &duv, &mesh, &fathers, &IntegrationOptions::default()).unwrap();
//! assert_eq!(flat.uvs().len(), mesh.num_vertices());
//! assert!(flat.holonomy.is_some());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod form;
pub mod mesh;

#[cfg(test)]
pub(crate) mod test_meshes;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use hodge::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::decomposition::{
        decompose, random_harmonic_form, DecompositionOptions, HarmonicForm, HodgeDecomposition,
    };
    pub use crate::algo::harmonic::{exact_harmonic_form, ExactHarmonicForm, HarmonicOptions};
    pub use crate::algo::inner_product::{normalize, CotanHodgeStar, InnerProduct};
    pub use crate::algo::integration::{integrate, FatherMap, Flattening, IntegrationOptions};
    pub use crate::algo::operators::{d0, d1, delta1, delta2};
    pub use crate::algo::poisson::{SolveStatus, SolverOptions};
    pub use crate::algo::weights::{compute_weights, EdgeWeights, WeightScheme};
    pub use crate::error::{HodgeError, Result};
    pub use crate::form::{ComplexEdgeForm, EdgeForm, OneForm, TwoForm, ZeroForm};
    pub use crate::mesh::{
        build_from_triangles, BoundaryLoop, EdgeId, FaceId, HalfEdgeId, HalfEdgeMesh, MeshIndex,
        VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use crate::test_meshes::torus;

    #[test]
    fn test_torus_topology() {
        let mesh = torus(24, 8, 3.0, 1.0);

        assert_eq!(mesh.num_vertices(), 192);
        assert_eq!(mesh.num_edges(), 576);
        assert_eq!(mesh.num_faces(), 384);
        // closed: every halfedge belongs to a face
        assert_eq!(mesh.num_halfedges(), 2 * mesh.num_edges());
        assert!(mesh.is_valid());
        assert!(mesh.boundary_loops().is_empty());

        // Euler characteristic of a torus
        let chi = mesh.num_vertices() as i64 - mesh.num_edges() as i64 + mesh.num_faces() as i64;
        assert_eq!(chi, 0);
    }

    #[test]
    fn test_pipeline_on_torus() {
        let mesh = torus(18, 6, 3.0, 1.0);
        let options = DecompositionOptions::default().with_seed(11);
        let h = random_harmonic_form(&mesh, &options).unwrap();

        assert!(h.scale.is_some());
        let star = CotanHodgeStar::new(&mesh);
        let norm = star.inner_product(&h.du, &h.du);
        assert!((norm - 1.0).abs() < 1e-10);
    }
}

//! Half-edge triangle mesh.
//!
//! The mesh is the substrate every form lives on. It owns topology and vertex
//! positions only; forms, weights and potentials are separate buffers indexed
//! by the handles defined here (see [`crate::form`]).
//!
//! # Handles
//!
//! - [`VertexId`] - vertex, row index of vertex Poisson systems
//! - [`HalfEdgeId`] - oriented halfedge, carries 1-form values
//! - [`EdgeId`] - undirected edge, carries weights and per-edge forms
//! - [`FaceId`] - triangle, row index of face Poisson systems
//!
//! # Construction
//!
//! ```
//! use hodge::mesh::{build_from_triangles, HalfEdgeMesh};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2], [0, 2, 3]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_edges(), 5);
//! ```

mod boundary;
mod builder;
mod halfedge;
mod index;

pub use boundary::BoundaryLoop;
pub use builder::{build_from_triangles, to_face_vertex};
pub use halfedge::{Edge, Face, HalfEdge, HalfEdgeMesh, Vertex, VertexHalfEdgeIter};
pub use index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};

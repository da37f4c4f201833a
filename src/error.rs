//! Error types for hodge.
//!
//! Hard failures only: input that cannot be worked with at all. Numerical
//! trouble (degenerate corners, solver non-convergence, residuals) is reported
//! through the diagnostic structs carried by each result instead.

use thiserror::Error;

/// Result type alias using [`HodgeError`].
pub type Result<T> = std::result::Result<T, HodgeError>;

/// Errors that can occur while building meshes or running the form pipelines.
#[derive(Error, Debug)]
pub enum HodgeError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face or mapping references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face (or domain vertex, for father maps) holding the reference.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has duplicate vertex indices (degenerate triangle).
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// The same directed edge is used by two faces.
    #[error("edge ({v0}, {v1}) has more than two incident faces or inconsistent orientation")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// A vertex joins more than one boundary gap (bow-tie vertex).
    #[error("vertex {vertex} is non-manifold")]
    NonManifoldVertex {
        /// The vertex index.
        vertex: usize,
    },

    /// The operation needs at least one boundary loop.
    #[error("mesh has no boundary")]
    NoBoundary,

    /// A buffer does not match the mesh it is used with.
    #[error("{what} has {found} entries, mesh expects {expected}")]
    SizeMismatch {
        /// Which buffer was checked.
        what: &'static str,
        /// The element count the mesh requires.
        expected: usize,
        /// The element count found.
        found: usize,
    },

    /// The discrete norm of a 1-form is zero, negative or not finite.
    #[error("1-form has degenerate squared norm {norm_squared}")]
    DegenerateNorm {
        /// The evaluated self inner product.
        norm_squared: f64,
    },

    /// Two domain vertices map to form-mesh vertices that share no edge.
    #[error("form mesh has no edge between vertices {v0} and {v1}")]
    MissingFormEdge {
        /// First form-mesh vertex.
        v0: usize,
        /// Second form-mesh vertex.
        v1: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl HodgeError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        HodgeError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a size mismatch error.
    pub fn size_mismatch(what: &'static str, expected: usize, found: usize) -> Self {
        HodgeError::SizeMismatch {
            what,
            expected,
            found,
        }
    }
}

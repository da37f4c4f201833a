//! Edge weights (the discrete metric).
//!
//! Two schemes are supported:
//!
//! - [`WeightScheme::Uniform`]: 1 on interior edges, 1/2 on boundary edges.
//!   Purely combinatorial; used for the coexact solve.
//! - [`WeightScheme::Cotangent`]: `cot α + cot β` over the corners opposite
//!   the edge, a single `cot` on boundary edges. Corner angles come from the
//!   law of cosines on edge lengths.
//!
//! Geometric trouble never reaches the linear systems as NaN or infinity.
//! Out-of-range cosines are clamped, corners with a vanishing sine contribute
//! a cotangent of zero, and both are recorded in [`WeightDiagnostics`]
//! together with every edge whose weight ends up non-positive.

use crate::mesh::{EdgeId, HalfEdgeId, HalfEdgeMesh, MeshIndex};

/// Sine below which a corner is treated as degenerate (angle near 0 or π).
pub const DEGENERATE_SINE: f64 = 1e-8;

/// Cosines further than this outside [-1, 1] are counted as clamped.
const CLAMP_SLACK: f64 = 1e-12;

/// How edge weights are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightScheme {
    /// Topology only: 1 interior, 1/2 boundary.
    Uniform,
    /// Cotangent of the opposite corner angles.
    Cotangent,
}

/// Degeneracies encountered while computing weights.
#[derive(Debug, Clone)]
pub struct WeightDiagnostics<I: MeshIndex = u32> {
    /// Number of law-of-cosines arguments clamped back into [-1, 1].
    pub clamped_cosines: usize,
    /// Face halfedges whose opposite corner was treated as degenerate.
    pub degenerate_corners: Vec<HalfEdgeId<I>>,
    /// Edges whose weight is zero, negative or not finite.
    pub nonpositive_edges: Vec<EdgeId<I>>,
}

impl<I: MeshIndex> Default for WeightDiagnostics<I> {
    fn default() -> Self {
        Self {
            clamped_cosines: 0,
            degenerate_corners: Vec::new(),
            nonpositive_edges: Vec::new(),
        }
    }
}

impl<I: MeshIndex> WeightDiagnostics<I> {
    /// Whether no degeneracy was found.
    pub fn is_clean(&self) -> bool {
        self.clamped_cosines == 0
            && self.degenerate_corners.is_empty()
            && self.nonpositive_edges.is_empty()
    }
}

/// Per-edge weights and lengths, plus per-halfedge corner angles.
#[derive(Debug, Clone)]
pub struct EdgeWeights<I: MeshIndex = u32> {
    scheme: WeightScheme,
    weights: Vec<f64>,
    lengths: Vec<f64>,
    /// Angle of the corner opposite each face halfedge (cotangent scheme only).
    angles: Vec<f64>,
    diagnostics: WeightDiagnostics<I>,
}

impl<I: MeshIndex> EdgeWeights<I> {
    /// Scheme these weights were computed with.
    #[inline]
    pub fn scheme(&self) -> WeightScheme {
        self.scheme
    }

    /// Weight of an edge.
    #[inline]
    pub fn weight(&self, e: EdgeId<I>) -> f64 {
        self.weights[e.index()]
    }

    /// `1 / w(e)`, or `None` when the weight is not strictly positive.
    #[inline]
    pub fn reciprocal(&self, e: EdgeId<I>) -> Option<f64> {
        let w = self.weight(e);
        (w > 0.0 && w.is_finite()).then(|| 1.0 / w)
    }

    /// Length of an edge.
    #[inline]
    pub fn length(&self, e: EdgeId<I>) -> f64 {
        self.lengths[e.index()]
    }

    /// Angle of the corner opposite a face halfedge.
    ///
    /// `None` for uniform weights and for face-less halfedges.
    pub fn angle(&self, he: HalfEdgeId<I>) -> Option<f64> {
        self.angles.get(he.index()).copied().filter(|a| !a.is_nan())
    }

    /// All weights, indexed by edge.
    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }

    /// Degeneracies found during computation.
    pub fn diagnostics(&self) -> &WeightDiagnostics<I> {
        &self.diagnostics
    }
}

/// Compute edge weights for a mesh.
///
/// # Example
///
/// ```
/// use hodge::prelude::*;
/// use hodge::algo::weights::{compute_weights, WeightScheme};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
///
/// let weights = compute_weights(&mesh, WeightScheme::Uniform);
/// assert!(mesh.edge_ids().all(|e| weights.weight(e) == 0.5));
/// ```
pub fn compute_weights<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, scheme: WeightScheme) -> EdgeWeights<I> {
    let lengths: Vec<f64> = mesh.edge_ids().map(|e| mesh.edge_length(e)).collect();
    let mut diagnostics = WeightDiagnostics::default();

    let (weights, angles) = match scheme {
        WeightScheme::Uniform => {
            let weights: Vec<f64> = mesh
                .edge_ids()
                .map(|e| if mesh.is_boundary_edge(e) { 0.5 } else { 1.0 })
                .collect();
            (weights, Vec::new())
        }
        WeightScheme::Cotangent => {
            let (angles, cotangents) = corner_angles(mesh, &lengths, &mut diagnostics);
            let weights: Vec<f64> = mesh
                .edge_ids()
                .map(|e| {
                    let he = mesh.edge_halfedge(e);
                    let twin = mesh.twin(he);
                    cotangents[he.index()] + cotangents[twin.index()]
                })
                .collect();
            (weights, angles)
        }
    };

    for e in mesh.edge_ids() {
        let w = weights[e.index()];
        if !(w > 0.0 && w.is_finite()) {
            diagnostics.nonpositive_edges.push(e);
        }
    }

    if !diagnostics.is_clean() {
        log::warn!(
            "{:?} weights: {} clamped cosines, {} degenerate corners, {} non-positive edges",
            scheme,
            diagnostics.clamped_cosines,
            diagnostics.degenerate_corners.len(),
            diagnostics.nonpositive_edges.len()
        );
    }
    log::debug!("computed {:?} weights for {} edges", scheme, weights.len());

    EdgeWeights {
        scheme,
        weights,
        lengths,
        angles,
        diagnostics,
    }
}

/// Corner angles and cotangents, stored on the halfedge opposite each corner.
///
/// Face-less halfedges get a NaN angle and a zero cotangent.
fn corner_angles<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    lengths: &[f64],
    diagnostics: &mut WeightDiagnostics<I>,
) -> (Vec<f64>, Vec<f64>) {
    let mut angles = vec![f64::NAN; mesh.num_halfedges()];
    let mut cotangents = vec![0.0; mesh.num_halfedges()];

    for f in mesh.face_ids() {
        let hs = mesh.face_halfedges(f);
        for k in 0..3 {
            let he = hs[k];
            // the corner opposite `he` is enclosed by the other two edges
            let c = lengths[mesh.edge_of(he).index()];
            let a = lengths[mesh.edge_of(hs[(k + 1) % 3]).index()];
            let b = lengths[mesh.edge_of(hs[(k + 2) % 3]).index()];

            if a <= 0.0 || b <= 0.0 {
                angles[he.index()] = 0.0;
                diagnostics.degenerate_corners.push(he);
                continue;
            }

            let raw = (a * a + b * b - c * c) / (2.0 * a * b);
            if raw.abs() > 1.0 + CLAMP_SLACK {
                diagnostics.clamped_cosines += 1;
            }
            let cos = raw.clamp(-1.0, 1.0);
            let sin = (1.0 - cos * cos).sqrt();

            angles[he.index()] = cos.acos();
            if sin < DEGENERATE_SINE {
                diagnostics.degenerate_corners.push(he);
            } else {
                cotangents[he.index()] = cos / sin;
            }
        }
    }

    (angles, cotangents)
}

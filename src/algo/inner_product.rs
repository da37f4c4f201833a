//! Discrete inner product of 1-forms and unit-norm normalization.

use crate::algo::weights::{compute_weights, EdgeWeights, WeightScheme};
use crate::error::{HodgeError, Result};
use crate::form::{EdgeForm, OneForm};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Squared norms at or below this are treated as zero.
pub const NORM_EPSILON: f64 = 1e-20;

/// Pairing of two edge-valued 1-forms.
pub trait InnerProduct<I: MeshIndex = u32> {
    /// `⟨a, b⟩`.
    fn inner_product(&self, a: &EdgeForm<I>, b: &EdgeForm<I>) -> f64;

    /// Number of edges the pairing is defined on.
    fn num_edges(&self) -> usize;
}

/// Diagonal cotangent Hodge star: `⟨a, b⟩ = Σ ½ w(e) a(e) b(e)`.
///
/// The weights are captured from one mesh; forms of any mesh with the same
/// edge numbering can be paired with it.
#[derive(Debug, Clone)]
pub struct CotanHodgeStar<I: MeshIndex = u32> {
    weights: EdgeWeights<I>,
}

impl<I: MeshIndex> CotanHodgeStar<I> {
    /// Build the Hodge star of a mesh.
    pub fn new(mesh: &HalfEdgeMesh<I>) -> Self {
        Self {
            weights: compute_weights(mesh, WeightScheme::Cotangent),
        }
    }

    /// Reuse already computed cotangent weights.
    pub fn from_weights(weights: EdgeWeights<I>) -> Self {
        Self { weights }
    }
}

impl<I: MeshIndex> InnerProduct<I> for CotanHodgeStar<I> {
    fn inner_product(&self, a: &EdgeForm<I>, b: &EdgeForm<I>) -> f64 {
        let w = self.weights.as_slice();
        w.iter()
            .zip(a.values().iter().zip(b.values().iter()))
            .map(|(w, (a, b))| 0.5 * w * a * b)
            .sum()
    }

    fn num_edges(&self) -> usize {
        self.weights.as_slice().len()
    }
}

/// Outcome of normalizing a 1-form.
#[derive(Debug, Clone)]
pub struct Normalization<I: MeshIndex = u32> {
    /// Normalized per-edge values.
    pub du: EdgeForm<I>,
    /// The norm divided out, `√⟨du, du⟩` before scaling.
    pub scale: f64,
}

/// Scale a 1-form to unit norm.
///
/// # Errors
/// `SizeMismatch` when `form` does not belong to `mesh` or `product` covers a
/// different number of edges. `DegenerateNorm` when `⟨du, du⟩` is not finite
/// or at most [`NORM_EPSILON`]. `form` is left untouched in every case.
pub fn normalize<I: MeshIndex, P: InnerProduct<I> + ?Sized>(
    mesh: &HalfEdgeMesh<I>,
    form: &mut OneForm<I>,
    product: &P,
) -> Result<Normalization<I>> {
    form.check_size(mesh)?;
    let du = form.to_edge_form(mesh);
    if product.num_edges() != du.len() {
        return Err(HodgeError::size_mismatch("inner product", du.len(), product.num_edges()));
    }
    let norm_squared = product.inner_product(&du, &du);
    if !norm_squared.is_finite() || norm_squared <= NORM_EPSILON {
        return Err(HodgeError::DegenerateNorm { norm_squared });
    }

    let scale = norm_squared.sqrt();
    *form.values_mut() /= scale;
    log::debug!("normalized 1-form by {:.6e}", scale);

    Ok(Normalization {
        du: form.to_edge_form(mesh),
        scale,
    })
}

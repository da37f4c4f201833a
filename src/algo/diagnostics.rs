//! Residual reports for closedness and coclosedness.
//!
//! Exact discrete zeros are not expected after iterative solves, so both
//! properties are measured rather than asserted.

use crate::algo::operators::{d1, delta1};
use crate::algo::weights::EdgeWeights;
use crate::form::OneForm;
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Max and RMS of a set of residuals.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResidualReport {
    /// Largest absolute residual.
    pub max_error: f64,
    /// Root mean square residual.
    pub rms_error: f64,
    /// Number of residuals measured.
    pub samples: usize,
}

impl ResidualReport {
    /// Summarize a sequence of residuals.
    pub fn from_residuals(residuals: impl IntoIterator<Item = f64>) -> Self {
        let (mut max_error, mut sum_sq, mut samples) = (0.0f64, 0.0, 0);
        for r in residuals {
            max_error = max_error.max(r.abs());
            sum_sq += r * r;
            samples += 1;
        }
        let rms_error = if samples > 0 {
            (sum_sq / samples as f64).sqrt()
        } else {
            0.0
        };
        Self {
            max_error,
            rms_error,
            samples,
        }
    }

    /// Whether both errors are below `tolerance`.
    pub fn within(&self, tolerance: f64) -> bool {
        self.max_error < tolerance && self.rms_error < tolerance
    }
}

/// Per-face circulation of a 1-form.
pub fn closedness<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, omega: &OneForm<I>) -> ResidualReport {
    let report = ResidualReport::from_residuals(d1(mesh, omega).values().iter().copied());
    log::info!(
        "closedness: max {:.3e}, rms {:.3e} over {} faces",
        report.max_error,
        report.rms_error,
        report.samples
    );
    report
}

/// Weighted divergence of a 1-form at interior vertices.
pub fn coclosedness<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    weights: &EdgeWeights<I>,
    omega: &OneForm<I>,
) -> ResidualReport {
    let div = delta1(mesh, weights, omega);
    let report = ResidualReport::from_residuals(
        mesh.vertex_ids()
            .filter(|&v| !mesh.is_boundary_vertex(v))
            .map(|v| div[v]),
    );
    log::info!(
        "coclosedness: max {:.3e}, rms {:.3e} over {} interior vertices",
        report.max_error,
        report.rms_error,
        report.samples
    );
    report
}

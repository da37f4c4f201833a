//! Exact harmonic 1-forms from Dirichlet data on boundary loops.
//!
//! The potential is fixed to −1 on one target loop and to 0 on every other
//! loop, then extended harmonically into the interior with cotangent weights.
//! Its derivative is the discrete harmonic measure of the target loop; on an
//! annulus it is the radial coordinate `d log r` up to scale.
//!
//! Boundary values are copied into the potential, never solved for, so they
//! hold exactly.

use crate::algo::diagnostics::{closedness, coclosedness, ResidualReport};
use crate::algo::inner_product::{normalize, CotanHodgeStar};
use crate::algo::operators::d0;
use crate::algo::poisson::{dirichlet_system, solve_laplacian, DiagonalSign, SolveReport, SolverOptions};
use crate::algo::weights::{compute_weights, WeightScheme};
use crate::error::{HodgeError, Result};
use crate::form::{EdgeForm, OneForm, ZeroForm};
use crate::mesh::{BoundaryLoop, HalfEdgeMesh, MeshIndex};

/// Potential on the target loop.
pub const TARGET_VALUE: f64 = -1.0;

/// Options for [`exact_harmonic_form`].
#[derive(Debug, Clone)]
pub struct HarmonicOptions {
    /// Conjugate gradient settings for the interior solve.
    pub solver: SolverOptions,

    /// Scale the resulting 1-form to unit norm.
    pub normalize: bool,
}

impl Default for HarmonicOptions {
    fn default() -> Self {
        Self {
            solver: SolverOptions::default(),
            normalize: true,
        }
    }
}

impl HarmonicOptions {
    /// Set solver options.
    pub fn with_solver(mut self, solver: SolverOptions) -> Self {
        self.solver = solver;
        self
    }

    /// Enable or disable unit-norm scaling.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

/// An exact harmonic 1-form and its potential.
#[derive(Debug, Clone)]
pub struct ExactHarmonicForm<I: MeshIndex = u32> {
    /// Harmonic potential carrying the Dirichlet data (never rescaled).
    pub potential: ZeroForm<I>,
    /// `d(potential)`, divided by `scale` when normalized.
    pub form: OneForm<I>,
    /// Per-edge values of `form` in canonical orientation.
    pub du: EdgeForm<I>,
    /// Norm divided out, `None` if normalization was off or degenerate.
    pub scale: Option<f64>,
    /// Per-face circulation of `form`.
    pub closedness: ResidualReport,
    /// Divergence of `form` at interior vertices.
    pub coclosedness: ResidualReport,
    /// Interior Dirichlet solve.
    pub solve: SolveReport,
}

/// Dirichlet data: −1 on loop `target`, 0 on every other loop and inside.
///
/// # Errors
/// `NoBoundary` if `loops` is empty, `InvalidParameter` if `target` is not
/// a loop index.
pub fn boundary_condition<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    loops: &[BoundaryLoop<I>],
    target: usize,
) -> Result<ZeroForm<I>> {
    if loops.is_empty() {
        return Err(HodgeError::NoBoundary);
    }
    if target >= loops.len() {
        return Err(HodgeError::invalid_param(
            "target",
            target,
            "not a boundary loop index",
        ));
    }

    let mut values = ZeroForm::zeros(mesh);
    for (i, boundary) in loops.iter().enumerate() {
        let value = if i == target { TARGET_VALUE } else { 0.0 };
        for v in boundary.vertices(mesh) {
            values[v] = value;
        }
    }
    Ok(values)
}

/// Build the exact harmonic 1-form whose potential is −1 on boundary loop
/// `target` and 0 on all others.
///
/// Loops are numbered in [`HalfEdgeMesh::boundary_loops`] order.
///
/// # Errors
/// `NoBoundary` on a closed mesh, `InvalidParameter` for an out-of-range
/// `target`.
pub fn exact_harmonic_form<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    target: usize,
    options: &HarmonicOptions,
) -> Result<ExactHarmonicForm<I>> {
    if mesh.num_faces() == 0 {
        return Err(HodgeError::EmptyMesh);
    }
    let loops = mesh.boundary_loops();
    let mut potential = boundary_condition(mesh, &loops, target)?;
    log::debug!("harmonic measure of loop {} of {}", target, loops.len());

    let weights = compute_weights(mesh, WeightScheme::Cotangent);
    let system = dirichlet_system(mesh, &weights);
    let solve = solve_laplacian(
        &system.a,
        &system.rhs(&potential),
        DiagonalSign::Positive,
        &options.solver,
    )?;
    for (i, &v) in system.partition.interior().iter().enumerate() {
        potential[v] = solve.x[i];
    }

    let mut form = d0(mesh, &potential);
    let scale = if options.normalize {
        let star = CotanHodgeStar::from_weights(weights.clone());
        match normalize(mesh, &mut form, &star) {
            Ok(n) => Some(n.scale),
            Err(HodgeError::DegenerateNorm { norm_squared }) => {
                log::warn!("harmonic measure has degenerate norm {:.3e}", norm_squared);
                None
            }
            Err(err) => return Err(err),
        }
    } else {
        None
    };

    Ok(ExactHarmonicForm {
        potential,
        du: form.to_edge_form(mesh),
        closedness: closedness(mesh, &form),
        coclosedness: coclosedness(mesh, &weights, &form),
        form,
        scale,
        solve,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::inner_product::InnerProduct;
    use crate::mesh::VertexId;
    use crate::test_meshes::{annulus, grid_mesh, octahedron};
    use approx::assert_relative_eq;

    #[test]
    fn test_boundary_condition() {
        let mesh = annulus(8, 2);
        let loops = mesh.boundary_loops();
        let bc = boundary_condition(&mesh, &loops, 1).unwrap();

        for v in loops[1].vertices(&mesh) {
            assert_eq!(bc[v], -1.0);
        }
        for v in loops[0].vertices(&mesh) {
            assert_eq!(bc[v], 0.0);
        }
        assert_eq!(bc.values().sum(), -8.0);
    }

    #[test]
    fn test_boundary_condition_errors() {
        let mesh = annulus(8, 2);
        let loops = mesh.boundary_loops();
        assert!(matches!(
            boundary_condition(&mesh, &loops, 2),
            Err(HodgeError::InvalidParameter { name: "target", .. })
        ));
        assert!(matches!(
            boundary_condition(&mesh, &[], 0),
            Err(HodgeError::NoBoundary)
        ));
    }

    #[test]
    fn test_closed_mesh_is_rejected() {
        let result = exact_harmonic_form(&octahedron(), 0, &HarmonicOptions::default());
        assert!(matches!(result, Err(HodgeError::NoBoundary)));
    }

    #[test]
    fn test_dirichlet_data_is_exact() {
        let mesh = annulus(16, 4);
        let loops = mesh.boundary_loops();
        let result = exact_harmonic_form(&mesh, 0, &HarmonicOptions::default()).unwrap();

        assert!(result.solve.converged());
        for v in loops[0].vertices(&mesh) {
            assert_eq!(result.potential[v], -1.0);
        }
        for v in loops[1].vertices(&mesh) {
            assert_eq!(result.potential[v], 0.0);
        }
        for v in mesh.vertex_ids() {
            assert!(result.potential[v] >= -1.0 && result.potential[v] <= 0.0);
        }
    }

    #[test]
    fn test_potential_is_linear_in_log_radius() {
        // rings sit at r = q^k, so log r is linear in k
        let (sectors, rings) = (16, 4);
        let mesh = annulus(sectors, rings);
        let result = exact_harmonic_form(&mesh, 0, &HarmonicOptions::default()).unwrap();

        for k in 0..=rings {
            for j in 0..sectors {
                let v = VertexId::new(k * sectors + j);
                let expected = -1.0 + k as f64 / rings as f64;
                assert_relative_eq!(result.potential[v], expected, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_form_is_harmonic_and_unit() {
        let mesh = annulus(16, 4);
        let result = exact_harmonic_form(&mesh, 1, &HarmonicOptions::default()).unwrap();

        assert!(result.scale.is_some());
        assert!(result.closedness.within(1e-12));
        assert!(result.coclosedness.within(1e-6));
        let star = CotanHodgeStar::new(&mesh);
        assert_relative_eq!(star.inner_product(&result.du, &result.du), 1.0, epsilon = 1e-10);
        assert!(result.form.antisymmetry_defect(&mesh) < 1e-15);
    }

    #[test]
    fn test_unnormalized_form_is_gradient() {
        let mesh = annulus(12, 3);
        let options = HarmonicOptions::default().with_normalize(false);
        let result = exact_harmonic_form(&mesh, 0, &options).unwrap();

        assert!(result.scale.is_none());
        assert_eq!(result.form, d0(&mesh, &result.potential));
    }

    #[test]
    fn test_single_loop_gives_constant_potential() {
        // a disk has one loop; harmonic extension of a constant is constant
        let mesh = grid_mesh(4);
        let options = HarmonicOptions::default().with_normalize(false);
        let result = exact_harmonic_form(&mesh, 0, &options).unwrap();

        for v in mesh.vertex_ids() {
            assert_relative_eq!(result.potential[v], -1.0, epsilon = 1e-8);
        }
        assert!(result.form.max_abs() < 1e-8);
    }
}

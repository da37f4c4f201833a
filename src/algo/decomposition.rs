//! Hodge decomposition of 1-forms.
//!
//! Any 1-form splits as
//!
//! ```text
//! ω = dα + δβ + γ
//! ```
//!
//! with a vertex potential `α`, a face potential `β` and a harmonic remainder
//! `γ` that is both closed and coclosed. The coexact part is removed first
//! with a face Poisson solve, then the exact part with a vertex Poisson
//! solve. Whatever is left is `γ`.
//!
//! On a disk the remainder vanishes; on an annulus or a torus it spans the
//! non-contractible loops, which is what [`random_harmonic_form`] is for.
//!
//! # Example
//!
//! ```
//! use hodge::prelude::*;
//! use hodge::algo::decomposition::{random_harmonic_form, DecompositionOptions};
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
//! // an annulus has one independent harmonic 1-form
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! let options = DecompositionOptions::default().with_seed(7);
//!
//! let harmonic = random_harmonic_form(&mesh, &options).unwrap();
//! assert!(harmonic.scale.is_some());
//! assert!(harmonic.closedness.within(1e-6));
//! ```

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::algo::diagnostics::{closedness, coclosedness, ResidualReport};
use crate::algo::inner_product::{normalize, CotanHodgeStar, InnerProduct};
use crate::algo::operators::{d0, d1, delta1, delta2};
use crate::algo::poisson::{
    face_laplacian, solve_laplacian, vertex_laplacian, DiagonalSign, SolveReport, SolverOptions,
};
use crate::algo::weights::{compute_weights, EdgeWeights, WeightScheme};
use crate::error::{HodgeError, Result};
use crate::form::{EdgeForm, OneForm, TwoForm, ZeroForm};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Harmonic parts smaller than this fraction of the input norm are treated
/// as zero.
pub const VANISHING_RATIO: f64 = 1e-6;

/// Options for the decomposition pipelines.
#[derive(Debug, Clone)]
pub struct DecompositionOptions {
    /// Seed for the random 1-form. `None` draws from system entropy.
    pub seed: Option<u64>,

    /// Use uniform weights for the coexact solve (cotangent otherwise).
    pub uniform_coexact_weights: bool,

    /// Conjugate gradient settings for both solves.
    pub solver: SolverOptions,
}

impl Default for DecompositionOptions {
    fn default() -> Self {
        Self {
            seed: None,
            uniform_coexact_weights: true,
            solver: SolverOptions::default(),
        }
    }
}

impl DecompositionOptions {
    /// Make the random draw reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Choose the weights of the coexact solve.
    pub fn with_uniform_coexact_weights(mut self, uniform: bool) -> Self {
        self.uniform_coexact_weights = uniform;
        self
    }

    /// Set solver options.
    pub fn with_solver(mut self, solver: SolverOptions) -> Self {
        self.solver = solver;
        self
    }
}

/// The three components of a 1-form and how they were obtained.
#[derive(Debug, Clone)]
pub struct HodgeDecomposition<I: MeshIndex = u32> {
    /// The input form.
    pub raw: OneForm<I>,
    /// `d(exact_potential)`.
    pub exact: OneForm<I>,
    /// `δ(coexact_potential)`.
    pub coexact: OneForm<I>,
    /// The closed and coclosed remainder.
    pub harmonic: OneForm<I>,
    /// Vertex potential of the exact part.
    pub exact_potential: ZeroForm<I>,
    /// Face potential of the coexact part.
    pub coexact_potential: TwoForm<I>,
    /// Per-face circulation of the remainder.
    pub closedness: ResidualReport,
    /// Divergence of the remainder at interior vertices.
    pub coclosedness: ResidualReport,
    /// Face Poisson solve.
    pub coexact_solve: SolveReport,
    /// Vertex Poisson solve.
    pub exact_solve: SolveReport,
    /// Cotangent weights used for the exact part.
    pub weights: EdgeWeights<I>,
}

impl<I: MeshIndex> HodgeDecomposition<I> {
    /// Largest deviation of `exact + coexact + harmonic` from the input.
    pub fn reconstruction_error(&self) -> f64 {
        let sum = &(&self.exact + &self.coexact) + &self.harmonic;
        (&sum - &self.raw).max_abs()
    }
}

/// A unit-norm harmonic 1-form.
#[derive(Debug, Clone)]
pub struct HarmonicForm<I: MeshIndex = u32> {
    /// The form on halfedges.
    pub form: OneForm<I>,
    /// Per-edge values in canonical orientation.
    pub du: EdgeForm<I>,
    /// Norm divided out; `None` when the form vanished and was left as is.
    pub scale: Option<f64>,
    /// Per-face circulation of `form`.
    pub closedness: ResidualReport,
    /// Divergence of `form` at interior vertices.
    pub coclosedness: ResidualReport,
    /// Face Poisson solve.
    pub coexact_solve: SolveReport,
    /// Vertex Poisson solve.
    pub exact_solve: SolveReport,
}

/// Draw one uniform value in [-1, 1] per edge.
pub fn random_form<I: MeshIndex, R: Rng + ?Sized>(mesh: &HalfEdgeMesh<I>, rng: &mut R) -> OneForm<I> {
    let dist = Uniform::new_inclusive(-1.0, 1.0);
    let du = EdgeForm::from_values(nalgebra::DVector::from_fn(mesh.num_edges(), |_, _| {
        dist.sample(rng)
    }));
    let mut form = OneForm::zeros(mesh);
    for e in mesh.edge_ids() {
        let he = mesh.edge_halfedge(e);
        form[he] = du[e];
        form[mesh.twin(he)] = -du[e];
    }
    form
}

/// Split a 1-form into exact, coexact and harmonic parts.
///
/// # Errors
/// `EmptyMesh` without faces, `SizeMismatch` when `omega` does not belong to
/// `mesh`. Solver trouble is reported in the result, not as an error.
pub fn decompose<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    omega: &OneForm<I>,
    options: &DecompositionOptions,
) -> Result<HodgeDecomposition<I>> {
    if mesh.num_faces() == 0 {
        return Err(HodgeError::EmptyMesh);
    }
    omega.check_size(mesh)?;

    // coexact part: L_F β = d1 ω
    let scheme = if options.uniform_coexact_weights {
        WeightScheme::Uniform
    } else {
        WeightScheme::Cotangent
    };
    let face_weights = compute_weights(mesh, scheme);
    let lf = face_laplacian(mesh, &face_weights, DiagonalSign::Negative);
    let curl = d1(mesh, omega);
    let coexact_solve = solve_laplacian(&lf, curl.values(), DiagonalSign::Negative, &options.solver)?;
    let coexact_potential = TwoForm::from_values(coexact_solve.x.clone());
    let coexact = delta2(mesh, &face_weights, &coexact_potential);
    let mut harmonic = omega - &coexact;
    log::debug!("removed coexact part ({:?})", coexact_solve.status);

    let closed = closedness(mesh, &harmonic);

    // exact part: L_V α = δ1 ω', then ω' + dα is coclosed
    let weights = compute_weights(mesh, WeightScheme::Cotangent);
    let lv = vertex_laplacian(mesh, &weights, DiagonalSign::Negative);
    let div = delta1(mesh, &weights, &harmonic);
    let exact_solve = solve_laplacian(&lv, div.values(), DiagonalSign::Negative, &options.solver)?;
    let exact_potential = -&ZeroForm::from_values(exact_solve.x.clone());
    let exact = d0(mesh, &exact_potential);
    harmonic -= &exact;
    log::debug!("removed exact part ({:?})", exact_solve.status);

    let coclosed = coclosedness(mesh, &weights, &harmonic);

    Ok(HodgeDecomposition {
        raw: omega.clone(),
        exact,
        coexact,
        harmonic,
        exact_potential,
        coexact_potential,
        closedness: closed,
        coclosedness: coclosed,
        coexact_solve,
        exact_solve,
        weights,
    })
}

/// Harmonic part of a random 1-form, scaled to unit norm.
///
/// When the harmonic part vanishes (the mesh is a disk or a sphere) the form
/// is returned unscaled with `scale == None`.
pub fn random_harmonic_form<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &DecompositionOptions,
) -> Result<HarmonicForm<I>> {
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let omega = random_form(mesh, &mut rng);
    let decomposition = decompose(mesh, &omega, options)?;
    let HodgeDecomposition {
        raw,
        mut harmonic,
        weights,
        coexact_solve,
        exact_solve,
        ..
    } = decomposition;

    let star = CotanHodgeStar::from_weights(weights.clone());
    let raw_norm_sq = star.inner_product(&raw.to_edge_form(mesh), &raw.to_edge_form(mesh));
    let du = harmonic.to_edge_form(mesh);
    let harmonic_norm_sq = star.inner_product(&du, &du);

    let scale = if harmonic_norm_sq <= VANISHING_RATIO * VANISHING_RATIO * raw_norm_sq.abs() {
        log::warn!(
            "harmonic part vanishes (|γ|² = {:.3e}, |ω|² = {:.3e}); left unnormalized",
            harmonic_norm_sq,
            raw_norm_sq
        );
        None
    } else {
        match normalize(mesh, &mut harmonic, &star) {
            Ok(n) => Some(n.scale),
            Err(HodgeError::DegenerateNorm { norm_squared }) => {
                log::warn!("harmonic form has degenerate norm {:.3e}", norm_squared);
                None
            }
            Err(err) => return Err(err),
        }
    };

    Ok(HarmonicForm {
        du: harmonic.to_edge_form(mesh),
        closedness: closedness(mesh, &harmonic),
        coclosedness: coclosedness(mesh, &weights, &harmonic),
        form: harmonic,
        scale,
        coexact_solve,
        exact_solve,
    })
}

//! Poisson system assembly and the solve wrapper.
//!
//! Three system shapes are assembled from [`EdgeWeights`]:
//!
//! - [`vertex_laplacian`]: V×V, weight `w` between neighbors
//! - [`face_laplacian`]: F×F, `1/w` across every interior edge, with boundary
//!   edges contributing to the diagonal only
//! - [`dirichlet_system`]: interior×interior Laplacian plus the
//!   interior×boundary coupling for fixed boundary values
//!
//! The overall sign of a Laplacian is a convention that silently flips a
//! solved potential when mixed up, so every assembled matrix carries a
//! [`DiagonalSign`] tag and [`solve_laplacian`] refuses a right-hand side
//! derived under the other convention.

use nalgebra::DVector;

use crate::algo::sparse::{conjugate_gradient, CsrMatrix};
use crate::algo::weights::EdgeWeights;
use crate::error::{HodgeError, Result};
use crate::form::ZeroForm;
use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

pub use crate::algo::sparse::{SolveReport, SolveStatus};

/// Sign of the diagonal of an assembled Laplacian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagonalSign {
    /// Diagonal `-Σw`, off-diagonal `+w` (negative semidefinite).
    Negative,
    /// Diagonal `+Σw`, off-diagonal `-w` (positive semidefinite).
    Positive,
}

impl DiagonalSign {
    /// Factor applied to off-diagonal couplings.
    #[inline]
    fn off_diagonal(self) -> f64 {
        match self {
            DiagonalSign::Negative => 1.0,
            DiagonalSign::Positive => -1.0,
        }
    }

    /// Whether a diagonal entry agrees with this convention.
    #[inline]
    fn admits(self, diagonal: f64) -> bool {
        match self {
            DiagonalSign::Negative => diagonal <= 0.0,
            DiagonalSign::Positive => diagonal >= 0.0,
        }
    }
}

/// A square Laplacian tagged with its sign convention.
#[derive(Debug, Clone)]
pub struct Laplacian {
    matrix: CsrMatrix,
    sign: DiagonalSign,
}

impl Laplacian {
    fn new(matrix: CsrMatrix, sign: DiagonalSign, strict: bool) -> Self {
        let wrong = matrix.diagonal().iter().filter(|&&d| !sign.admits(d)).count();
        if wrong > 0 {
            log::warn!("{} diagonal entries contradict the {:?} convention", wrong, sign);
        }
        debug_assert!(!strict || wrong == 0, "diagonal sign does not match {:?}", sign);
        Self { matrix, sign }
    }

    /// The assembled matrix.
    pub fn matrix(&self) -> &CsrMatrix {
        &self.matrix
    }

    /// Sign convention of the diagonal.
    pub fn sign(&self) -> DiagonalSign {
        self.sign
    }

    /// Number of rows (and columns).
    pub fn size(&self) -> usize {
        self.matrix.nrows()
    }
}

/// Assemble the V×V vertex Laplacian.
///
/// Off-diagonal `(i, j)` is `±w(ij)`, the diagonal `∓Σw` over incident edges.
pub fn vertex_laplacian<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    weights: &EdgeWeights<I>,
    sign: DiagonalSign,
) -> Laplacian {
    let s = sign.off_diagonal();
    let mut triplets = Vec::with_capacity(mesh.num_vertices() + 2 * mesh.num_edges());

    for v in mesh.vertex_ids() {
        let mut diagonal = 0.0;
        for he in mesh.vertex_halfedges(v) {
            let w = weights.weight(mesh.edge_of(he));
            triplets.push((v.index(), mesh.dest(he).index(), s * w));
            diagonal -= s * w;
        }
        triplets.push((v.index(), v.index(), diagonal));
    }

    let strict = weights.diagnostics().nonpositive_edges.is_empty();
    let n = mesh.num_vertices();
    Laplacian::new(CsrMatrix::from_triplets(n, n, triplets), sign, strict)
}

/// Assemble the F×F face Laplacian over the dual graph.
///
/// Off-diagonal `(f, f')` is `±1/w` of the shared edge, the diagonal `∓Σ1/w`
/// over all three edges of `f`, boundary edges included. Edges without a
/// reciprocal weight are left out.
pub fn face_laplacian<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    weights: &EdgeWeights<I>,
    sign: DiagonalSign,
) -> Laplacian {
    let s = sign.off_diagonal();
    let mut triplets = Vec::with_capacity(4 * mesh.num_faces());

    for f in mesh.face_ids() {
        let mut diagonal = 0.0;
        for he in mesh.face_halfedges(f) {
            let Some(inv_w) = weights.reciprocal(mesh.edge_of(he)) else {
                continue;
            };
            if let Some(across) = mesh.sym(he) {
                triplets.push((f.index(), mesh.face_of(across).index(), s * inv_w));
            }
            diagonal -= s * inv_w;
        }
        triplets.push((f.index(), f.index(), diagonal));
    }

    let n = mesh.num_faces();
    Laplacian::new(CsrMatrix::from_triplets(n, n, triplets), sign, true)
}

/// Split of the vertices into interior and boundary ranges.
///
/// Local indices follow ascending vertex order within each range.
#[derive(Debug, Clone)]
pub struct VertexPartition<I: MeshIndex = u32> {
    local: Vec<usize>,
    is_boundary: Vec<bool>,
    interior: Vec<VertexId<I>>,
    boundary: Vec<VertexId<I>>,
}

impl<I: MeshIndex> VertexPartition<I> {
    /// Partition the vertices of a mesh.
    pub fn new(mesh: &HalfEdgeMesh<I>) -> Self {
        let mut local = Vec::with_capacity(mesh.num_vertices());
        let mut is_boundary = Vec::with_capacity(mesh.num_vertices());
        let mut interior = Vec::new();
        let mut boundary = Vec::new();

        for v in mesh.vertex_ids() {
            let on_boundary = mesh.is_boundary_vertex(v);
            let range = if on_boundary { &mut boundary } else { &mut interior };
            local.push(range.len());
            range.push(v);
            is_boundary.push(on_boundary);
        }

        Self {
            local,
            is_boundary,
            interior,
            boundary,
        }
    }

    /// Whether a vertex is in the boundary range.
    #[inline]
    pub fn is_boundary(&self, v: VertexId<I>) -> bool {
        self.is_boundary[v.index()]
    }

    /// Index of a vertex inside its own range.
    #[inline]
    pub fn local(&self, v: VertexId<I>) -> usize {
        self.local[v.index()]
    }

    /// Interior vertices in local order.
    pub fn interior(&self) -> &[VertexId<I>] {
        &self.interior
    }

    /// Boundary vertices in local order.
    pub fn boundary(&self) -> &[VertexId<I>] {
        &self.boundary
    }

    /// Gather the boundary values of a 0-form in local order.
    pub fn boundary_values(&self, f: &ZeroForm<I>) -> DVector<f64> {
        DVector::from_iterator(self.boundary.len(), self.boundary.iter().map(|&v| f[v]))
    }
}

/// Interior Laplacian and boundary coupling for `A x = B b`.
#[derive(Debug, Clone)]
pub struct DirichletSystem<I: MeshIndex = u32> {
    /// Interior×interior Laplacian, positive convention.
    pub a: Laplacian,
    /// Interior×boundary coupling, `+w` to every boundary neighbor.
    pub b: CsrMatrix,
    /// The partition the local indices refer to.
    pub partition: VertexPartition<I>,
}

impl<I: MeshIndex> DirichletSystem<I> {
    /// Right-hand side `B b` for the boundary values held by `f`.
    pub fn rhs(&self, f: &ZeroForm<I>) -> DVector<f64> {
        self.b.mul_vec(&self.partition.boundary_values(f))
    }
}

/// Assemble the Dirichlet system on the interior vertices.
pub fn dirichlet_system<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    weights: &EdgeWeights<I>,
) -> DirichletSystem<I> {
    let partition = VertexPartition::new(mesh);
    let mut a_triplets = Vec::new();
    let mut b_triplets = Vec::new();

    for (row, &v) in partition.interior().iter().enumerate() {
        let mut diagonal = 0.0;
        for he in mesh.vertex_halfedges(v) {
            let w = weights.weight(mesh.edge_of(he));
            let u = mesh.dest(he);
            if partition.is_boundary(u) {
                b_triplets.push((row, partition.local(u), w));
            } else {
                a_triplets.push((row, partition.local(u), -w));
            }
            diagonal += w;
        }
        a_triplets.push((row, row, diagonal));
    }

    let ni = partition.interior().len();
    let nb = partition.boundary().len();
    let strict = weights.diagnostics().nonpositive_edges.is_empty();
    log::debug!("dirichlet system: {} interior, {} boundary vertices", ni, nb);

    DirichletSystem {
        a: Laplacian::new(
            CsrMatrix::from_triplets(ni, ni, a_triplets),
            DiagonalSign::Positive,
            strict,
        ),
        b: CsrMatrix::from_triplets(ni, nb, b_triplets),
        partition,
    }
}

/// Options for the conjugate gradient solver.
#[derive(Debug, Clone)]
pub struct SolverOptions {
    /// Maximum iterations.
    pub max_iterations: usize,

    /// Convergence tolerance on the relative residual.
    pub tolerance: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-10,
        }
    }
}

impl SolverOptions {
    /// Set maximum CG iterations.
    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Set CG convergence tolerance.
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }
}

/// Solve `A x = b` by conjugate gradient.
///
/// Never fails: anything other than convergence is logged and reported
/// through [`SolveReport::status`].
pub fn solve(a: &CsrMatrix, b: &DVector<f64>, options: &SolverOptions) -> SolveReport {
    let report = conjugate_gradient(a, b, None, options.max_iterations, options.tolerance);
    match report.status {
        SolveStatus::Converged => log::debug!(
            "solve: {}x{} converged in {} iterations (residual {:.3e})",
            a.nrows(),
            a.ncols(),
            report.iterations,
            report.relative_residual
        ),
        status => log::warn!(
            "solve: {}x{} ended {:?} after {} iterations (residual {:.3e})",
            a.nrows(),
            a.ncols(),
            status,
            report.iterations,
            report.relative_residual
        ),
    }
    report
}

/// Solve with a tagged Laplacian whose right-hand side was derived under
/// `rhs_sign`.
///
/// # Errors
/// `InvalidParameter` when the conventions disagree.
pub fn solve_laplacian(
    laplacian: &Laplacian,
    rhs: &DVector<f64>,
    rhs_sign: DiagonalSign,
    options: &SolverOptions,
) -> Result<SolveReport> {
    if laplacian.sign() != rhs_sign {
        return Err(HodgeError::invalid_param(
            "rhs_sign",
            format!("{:?}", rhs_sign),
            "right-hand side and Laplacian use different sign conventions",
        ));
    }
    Ok(solve(laplacian.matrix(), rhs, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::operators::{d0, d1, delta1, delta2};
    use crate::algo::weights::{compute_weights, WeightScheme};
    use crate::form::TwoForm;
    use crate::test_meshes::{annulus, grid_mesh, octahedron};
    use approx::assert_relative_eq;

    #[test]
    fn test_vertex_laplacian_matches_operators() {
        let mesh = octahedron();
        let weights = compute_weights(&mesh, WeightScheme::Cotangent);
        let lap = vertex_laplacian(&mesh, &weights, DiagonalSign::Negative);
        let f = ZeroForm::from_values(DVector::from_fn(mesh.num_vertices(), |i, _| (i * i) as f64));

        let via_matrix = lap.matrix().mul_vec(f.values());
        let via_operators = -delta1(&mesh, &weights, &d0(&mesh, &f)).into_values();
        assert!((via_matrix - via_operators).norm() < 1e-12);
    }

    #[test]
    fn test_vertex_laplacian_signs() {
        let mesh = grid_mesh(2);
        let weights = compute_weights(&mesh, WeightScheme::Uniform);
        let neg = vertex_laplacian(&mesh, &weights, DiagonalSign::Negative);
        let pos = vertex_laplacian(&mesh, &weights, DiagonalSign::Positive);

        assert_eq!(neg.sign(), DiagonalSign::Negative);
        assert!(neg.matrix().diagonal().iter().all(|&d| d < 0.0));
        assert!(pos.matrix().diagonal().iter().all(|&d| d > 0.0));
        // rows sum to zero
        let ones = DVector::from_element(mesh.num_vertices(), 1.0);
        assert!(neg.matrix().mul_vec(&ones).norm() < 1e-12);
        assert_eq!(neg.matrix().get(0, 1), -pos.matrix().get(0, 1));
    }

    #[test]
    fn test_face_laplacian_matches_operators() {
        let mesh = grid_mesh(3);
        let weights = compute_weights(&mesh, WeightScheme::Uniform);
        let lap = face_laplacian(&mesh, &weights, DiagonalSign::Negative);
        let beta = TwoForm::from_values(DVector::from_fn(mesh.num_faces(), |i, _| (i as f64).cos()));

        let via_matrix = lap.matrix().mul_vec(beta.values());
        let via_operators = d1(&mesh, &delta2(&mesh, &weights, &beta)).into_values();
        assert!((via_matrix - via_operators).norm() < 1e-12);
    }

    #[test]
    fn test_face_laplacian_boundary_only_on_diagonal() {
        let mesh = grid_mesh(1);
        let weights = compute_weights(&mesh, WeightScheme::Uniform);
        let lap = face_laplacian(&mesh, &weights, DiagonalSign::Negative);

        // each face: two boundary edges (1/w = 2) and the shared diagonal (1)
        assert_relative_eq!(lap.matrix().get(0, 0), -5.0);
        assert_relative_eq!(lap.matrix().get(0, 1), 1.0);
        assert_eq!(lap.matrix().nnz(), 4);
    }

    #[test]
    fn test_partition_is_dense() {
        let mesh = annulus(8, 3);
        let partition = VertexPartition::new(&mesh);

        assert_eq!(partition.boundary().len(), 16);
        assert_eq!(partition.interior().len(), 16);
        for (i, &v) in partition.interior().iter().enumerate() {
            assert!(!partition.is_boundary(v));
            assert_eq!(partition.local(v), i);
        }
        for (i, &v) in partition.boundary().iter().enumerate() {
            assert!(partition.is_boundary(v));
            assert_eq!(partition.local(v), i);
        }
    }

    #[test]
    fn test_dirichlet_system_reproduces_linear_field() {
        // a linear function is discrete-harmonic for cotangent weights on a
        // flat mesh; fix it on the boundary and recover it inside
        let mesh = grid_mesh(4);
        let weights = compute_weights(&mesh, WeightScheme::Cotangent);
        let system = dirichlet_system(&mesh, &weights);

        let exact = ZeroForm::from_values(DVector::from_fn(mesh.num_vertices(), |i, _| {
            let p = mesh.position(VertexId::new(i));
            2.0 * p.x - p.y
        }));
        let report = solve_laplacian(
            &system.a,
            &system.rhs(&exact),
            DiagonalSign::Positive,
            &SolverOptions::default(),
        )
        .unwrap();

        assert!(report.converged());
        for (i, &v) in system.partition.interior().iter().enumerate() {
            assert_relative_eq!(report.x[i], exact[v], epsilon = 1e-8);
        }
    }

    #[test]
    fn test_sign_mismatch_is_rejected() {
        let mesh = grid_mesh(2);
        let weights = compute_weights(&mesh, WeightScheme::Uniform);
        let lap = vertex_laplacian(&mesh, &weights, DiagonalSign::Negative);
        let rhs = DVector::zeros(mesh.num_vertices());

        let result = solve_laplacian(&lap, &rhs, DiagonalSign::Positive, &SolverOptions::default());
        assert!(matches!(result, Err(HodgeError::InvalidParameter { .. })));
    }

    #[test]
    fn test_solve_reports_failure() {
        let mesh = grid_mesh(4);
        let weights = compute_weights(&mesh, WeightScheme::Uniform);
        let lap = vertex_laplacian(&mesh, &weights, DiagonalSign::Positive);
        // inconsistent: constant right-hand side is outside the range
        let rhs = DVector::from_element(mesh.num_vertices(), 1.0);

        let report = solve(
            lap.matrix(),
            &rhs,
            &SolverOptions::default().with_max_iterations(20),
        );
        assert!(!report.converged());
        assert!(report.x.iter().all(|v| v.is_finite()));
    }
}

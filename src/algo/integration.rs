//! Integration of closed complex 1-forms and log-polar flattening.
//!
//! A closed 1-form `duv = dρ + i dθ` is integrated along a breadth-first
//! spanning tree of a *domain* mesh into a potential `(ρ, θ)` per vertex, then
//! remapped to the plane by `exp(ρ + iθ)`. An annulus carrying the harmonic
//! measure as `dρ` and its conjugate as `dθ` flattens into a planar ring.
//!
//! The domain may differ from the *form* mesh that carries `duv`: each domain
//! vertex names the form vertex it stands for through a [`FatherMap`]. A cut
//! or branched cover of the form mesh thus integrates without the tree ever
//! crossing the cut, and the holonomy shows up as a difference between
//! domain vertices that share a father. Those differences are reported as
//! [`BranchMismatch`] entries, never corrected.
//!
//! Before integrating, the angular holonomy around a reference boundary loop
//! can be rescaled to exactly `2π` (see [`normalize_holonomy`]).

use std::collections::{HashMap, VecDeque};
use std::f64::consts::TAU;

use nalgebra::{Point2, Vector2};

use crate::error::{HodgeError, Result};
use crate::form::ComplexEdgeForm;
use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

/// Holonomies smaller than this cannot be normalized.
const HOLONOMY_EPSILON: f64 = 1e-12;

/// Maps domain vertices to form-mesh vertices.
///
/// `None` means the domain vertex stands for the form vertex with the same
/// index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatherMap<I: MeshIndex = u32> {
    fathers: Vec<Option<VertexId<I>>>,
}

impl<I: MeshIndex> FatherMap<I> {
    /// Every domain vertex stands for itself.
    pub fn identity(num_vertices: usize) -> Self {
        Self {
            fathers: vec![None; num_vertices],
        }
    }

    /// Build from explicit entries.
    pub fn new(fathers: Vec<Option<VertexId<I>>>) -> Self {
        Self { fathers }
    }

    /// Build from raw indices.
    pub fn from_indices(fathers: &[Option<usize>]) -> Self {
        Self::new(fathers.iter().map(|f| f.map(VertexId::new)).collect())
    }

    /// Number of domain vertices covered.
    pub fn len(&self) -> usize {
        self.fathers.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.fathers.is_empty()
    }

    /// Explicit father of a domain vertex.
    #[inline]
    pub fn get(&self, v: VertexId<I>) -> Option<VertexId<I>> {
        self.fathers[v.index()]
    }

    /// Set or clear the father of a domain vertex.
    pub fn set(&mut self, v: VertexId<I>, father: Option<VertexId<I>>) {
        self.fathers[v.index()] = father;
    }

    /// Form vertex a domain vertex stands for.
    #[inline]
    pub fn resolve(&self, v: VertexId<I>) -> VertexId<I> {
        self.get(v).unwrap_or(v)
    }
}

/// Options for [`integrate`].
#[derive(Debug, Clone)]
pub struct IntegrationOptions {
    /// Domain vertex whose potential is fixed to (0, 0).
    pub root: usize,

    /// Rescale `duv` so the reference loop has angular holonomy `2π`.
    pub normalize_holonomy: bool,

    /// Boundary loop of the form mesh used for holonomy normalization.
    pub reference_loop: usize,

    /// Potential differences above this between vertices sharing a father
    /// are reported.
    pub mismatch_tolerance: f64,
}

impl Default for IntegrationOptions {
    fn default() -> Self {
        Self {
            root: 0,
            normalize_holonomy: true,
            reference_loop: 0,
            mismatch_tolerance: 1e-6,
        }
    }
}

impl IntegrationOptions {
    /// Set the root vertex.
    pub fn with_root(mut self, root: usize) -> Self {
        self.root = root;
        self
    }

    /// Enable or disable holonomy normalization.
    pub fn with_normalize_holonomy(mut self, normalize: bool) -> Self {
        self.normalize_holonomy = normalize;
        self
    }

    /// Set the reference boundary loop.
    pub fn with_reference_loop(mut self, index: usize) -> Self {
        self.reference_loop = index;
        self
    }

    /// Set the mismatch tolerance.
    pub fn with_mismatch_tolerance(mut self, tol: f64) -> Self {
        self.mismatch_tolerance = tol;
        self
    }
}

/// Angular holonomy around a boundary loop before and after rescaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HolonomyReport {
    /// Loop sum of the angular part before rescaling.
    pub raw: f64,
    /// Factor every value was divided by (`raw / 2π`).
    pub scale: f64,
    /// Loop sum after rescaling.
    pub normalized: f64,
}

/// Two domain vertices with the same father whose potentials disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchMismatch<I: MeshIndex = u32> {
    /// The shared form vertex.
    pub father: VertexId<I>,
    /// First domain vertex found for `father`.
    pub first: VertexId<I>,
    /// The disagreeing domain vertex.
    pub other: VertexId<I>,
    /// `potential(other) - potential(first)`.
    pub difference: Vector2<f64>,
}

/// Integrated potential and its planar image.
#[derive(Debug, Clone)]
pub struct Flattening<I: MeshIndex = u32> {
    potential: Vec<Vector2<f64>>,
    uv: Vec<Point2<f64>>,
    /// Holonomy normalization, if it ran.
    pub holonomy: Option<HolonomyReport>,
    /// Disagreements between branches of the same father.
    pub mismatches: Vec<BranchMismatch<I>>,
    /// Number of connected components traversed.
    pub components: usize,
}

impl<I: MeshIndex> Flattening<I> {
    /// `(ρ, θ)` of a domain vertex.
    #[inline]
    pub fn potential(&self, v: VertexId<I>) -> Vector2<f64> {
        self.potential[v.index()]
    }

    /// Planar position `exp(ρ) (cos θ, sin θ)` of a domain vertex.
    #[inline]
    pub fn uv(&self, v: VertexId<I>) -> Point2<f64> {
        self.uv[v.index()]
    }

    /// All planar positions, indexed by domain vertex.
    pub fn uvs(&self) -> &[Point2<f64>] {
        &self.uv
    }
}

/// Rescale `duv` so its angular part sums to `2π` around a boundary loop.
///
/// The loop is walked in face orientation and the scale keeps its sign, so
/// the normalized holonomy is `+2π` whichever way the form winds. When the
/// raw holonomy is negative the real part is divided by a negative scale as
/// well, so the radial direction flips and the flattening is mirrored through
/// the unit circle (`z → 1/z`).
///
/// Returns `Ok(None)` and leaves `duv` untouched when the form mesh has no
/// boundary or the holonomy is numerically zero.
///
/// # Errors
/// `SizeMismatch` if `duv` does not belong to `form_mesh`, `InvalidParameter`
/// for an out-of-range loop.
pub fn normalize_holonomy<I: MeshIndex>(
    form_mesh: &HalfEdgeMesh<I>,
    duv: &mut ComplexEdgeForm<I>,
    loop_index: usize,
) -> Result<Option<HolonomyReport>> {
    duv.check_size(form_mesh)?;
    let loops = form_mesh.boundary_loops();
    if loops.is_empty() {
        return Ok(None);
    }
    let reference = loops.get(loop_index).ok_or_else(|| {
        HodgeError::invalid_param("reference_loop", loop_index, "not a boundary loop index")
    })?;

    let raw = duv.loop_sum(form_mesh, reference).y;
    log::info!("holonomy around loop {}: {:.6}", loop_index, raw);
    if !raw.is_finite() || raw.abs() < HOLONOMY_EPSILON {
        log::warn!("holonomy {:.3e} is too small to normalize", raw);
        return Ok(None);
    }

    let scale = raw / TAU;
    duv.scale_down(scale);
    let normalized = duv.loop_sum(form_mesh, reference).y;
    log::info!("normalized holonomy: {:.6}", normalized);

    Ok(Some(HolonomyReport {
        raw,
        scale,
        normalized,
    }))
}

/// Integrate `duv` over `domain` and map the result to the plane.
///
/// Every connected component of the domain is traversed breadth-first; the
/// component holding `options.root` goes first, the others start at their
/// lowest vertex. Each tree edge `(v, u)` adds the value of `duv` along the
/// form edge from `father(v)` to `father(u)`.
///
/// # Errors
/// - `EmptyMesh` if the domain has no vertices
/// - `SizeMismatch` if `duv` or `fathers` do not fit their meshes
/// - `InvalidVertexIndex` if a domain vertex stands for a vertex outside the
///   form mesh
/// - `InvalidParameter` for an out-of-range root or reference loop
/// - `MissingFormEdge` if a domain edge has no counterpart in the form mesh
pub fn integrate<I: MeshIndex>(
    form_mesh: &HalfEdgeMesh<I>,
    duv: &ComplexEdgeForm<I>,
    domain: &HalfEdgeMesh<I>,
    fathers: &FatherMap<I>,
    options: &IntegrationOptions,
) -> Result<Flattening<I>> {
    let n = domain.num_vertices();
    if n == 0 {
        return Err(HodgeError::EmptyMesh);
    }
    duv.check_size(form_mesh)?;
    if fathers.len() != n {
        return Err(HodgeError::size_mismatch("father map", n, fathers.len()));
    }
    for v in domain.vertex_ids() {
        let father = fathers.resolve(v);
        if father.index() >= form_mesh.num_vertices() {
            return Err(HodgeError::InvalidVertexIndex {
                face: v.index(),
                vertex: father.index(),
            });
        }
    }
    if options.root >= n {
        return Err(HodgeError::invalid_param("root", options.root, "not a domain vertex"));
    }

    let mut duv = duv.clone();
    let holonomy = if options.normalize_holonomy {
        normalize_holonomy(form_mesh, &mut duv, options.reference_loop)?
    } else {
        None
    };

    let mut potential = vec![Vector2::zeros(); n];
    let mut visited = vec![false; n];
    let mut queue = VecDeque::new();
    let mut components = 0;

    let root = VertexId::<I>::new(options.root);
    for start in std::iter::once(root).chain(domain.vertex_ids()) {
        if visited[start.index()] {
            continue;
        }
        components += 1;
        visited[start.index()] = true;
        queue.push_back(start);

        while let Some(v) = queue.pop_front() {
            for he in domain.vertex_halfedges(v) {
                let u = domain.dest(he);
                if visited[u.index()] {
                    continue;
                }
                let step = form_step(form_mesh, &duv, fathers.resolve(v), fathers.resolve(u))?;
                potential[u.index()] = potential[v.index()] + step;
                visited[u.index()] = true;
                queue.push_back(u);
            }
        }
    }
    log::debug!("integrated {} vertices in {} components", n, components);

    let mismatches = branch_mismatches(domain, fathers, &potential, options.mismatch_tolerance);
    if !mismatches.is_empty() {
        log::info!("{} branch mismatches between shared fathers", mismatches.len());
    }

    let uv = potential
        .iter()
        .map(|p| {
            let r = p.x.exp();
            Point2::new(r * p.y.cos(), r * p.y.sin())
        })
        .collect();

    Ok(Flattening {
        potential,
        uv,
        holonomy,
        mismatches,
        components,
    })
}

/// Value of `duv` along the form edge from `a` to `b`.
fn form_step<I: MeshIndex>(
    form_mesh: &HalfEdgeMesh<I>,
    duv: &ComplexEdgeForm<I>,
    a: VertexId<I>,
    b: VertexId<I>,
) -> Result<Vector2<f64>> {
    form_mesh
        .vertex_halfedges(a)
        .find(|&he| form_mesh.dest(he) == b)
        .map(|he| duv.along(form_mesh, he))
        .ok_or(HodgeError::MissingFormEdge {
            v0: a.index(),
            v1: b.index(),
        })
}

fn branch_mismatches<I: MeshIndex>(
    domain: &HalfEdgeMesh<I>,
    fathers: &FatherMap<I>,
    potential: &[Vector2<f64>],
    tolerance: f64,
) -> Vec<BranchMismatch<I>> {
    let mut first_seen: HashMap<VertexId<I>, VertexId<I>> = HashMap::new();
    let mut mismatches = Vec::new();

    for v in domain.vertex_ids() {
        let father = fathers.resolve(v);
        let first = *first_seen.entry(father).or_insert(v);
        if first == v {
            continue;
        }
        let difference = potential[v.index()] - potential[first.index()];
        if difference.norm() > tolerance {
            mismatches.push(BranchMismatch {
                father,
                first,
                other: v,
                difference,
            });
        }
    }

    mismatches
}

//! Half-edge mesh arena.
//!
//! Elements are stored in flat vectors and reference each other through typed
//! handles; nothing is independently owned.
//!
//! # Structure
//!
//! - Every face owns three halfedges linked by `next`/`prev` into a cycle.
//! - Every halfedge knows its `twin`. For an edge on the mesh boundary the twin
//!   is a *face-less* halfedge; face-less halfedges are chained into boundary
//!   loops through their own `next`/`prev`.
//! - Every undirected edge has a record pointing at its *canonical* halfedge:
//!   the first face halfedge created for it. For boundary edges this is the
//!   only halfedge that belongs to a face.
//! - Each vertex stores one outgoing halfedge; boundary vertices store their
//!   outgoing face-less halfedge so rotations around them start at the gap.
//!
//! [`HalfEdgeMesh::sym`] exposes the opposite halfedge the way the form
//! operators see it: `None` exactly when the edge lies on the boundary.

use nalgebra::Point3;

use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};

/// A vertex of the mesh.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32> {
    /// Position in space.
    pub position: Point3<f64>,

    /// One outgoing halfedge (face-less for boundary vertices).
    pub halfedge: HalfEdgeId<I>,
}

impl<I: MeshIndex> Vertex<I> {
    /// Create an unconnected vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            halfedge: HalfEdgeId::invalid(),
        }
    }
}

/// An oriented halfedge.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge<I: MeshIndex = u32> {
    /// Source vertex.
    pub origin: VertexId<I>,

    /// Oppositely oriented halfedge of the same edge.
    pub twin: HalfEdgeId<I>,

    /// Next halfedge in the face cycle (or boundary loop).
    pub next: HalfEdgeId<I>,

    /// Previous halfedge in the face cycle (or boundary loop).
    pub prev: HalfEdgeId<I>,

    /// Owning face; invalid for face-less boundary halfedges.
    pub face: FaceId<I>,

    /// Undirected edge this halfedge belongs to.
    pub edge: EdgeId<I>,
}

impl<I: MeshIndex> HalfEdge<I> {
    /// Create an unlinked halfedge.
    pub fn new() -> Self {
        Self {
            origin: VertexId::invalid(),
            twin: HalfEdgeId::invalid(),
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            face: FaceId::invalid(),
            edge: EdgeId::invalid(),
        }
    }

    /// Whether this is a face-less boundary halfedge.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.face.is_valid()
    }
}

impl<I: MeshIndex> Default for HalfEdge<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// An undirected edge.
#[derive(Debug, Clone, Copy)]
pub struct Edge<I: MeshIndex = u32> {
    /// Canonical halfedge; always owned by a face.
    pub halfedge: HalfEdgeId<I>,
}

/// A triangle.
#[derive(Debug, Clone, Copy)]
pub struct Face<I: MeshIndex = u32> {
    /// One halfedge of the face cycle.
    pub halfedge: HalfEdgeId<I>,
}

/// Triangle mesh stored as a half-edge arena.
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh<I: MeshIndex = u32> {
    pub(crate) vertices: Vec<Vertex<I>>,
    pub(crate) halfedges: Vec<HalfEdge<I>>,
    pub(crate) edges: Vec<Edge<I>>,
    pub(crate) faces: Vec<Face<I>>,
}

impl<I: MeshIndex> Default for HalfEdgeMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            halfedges: Vec::new(),
            edges: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create an empty mesh with room for the given element counts.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        // E ~ 3F/2 on a closed mesh, a little more with boundary
        let num_edges = num_faces * 3 / 2 + num_faces / 4;
        Self {
            vertices: Vec::with_capacity(num_vertices),
            halfedges: Vec::with_capacity(2 * num_edges),
            edges: Vec::with_capacity(num_edges),
            faces: Vec::with_capacity(num_faces),
        }
    }

    // ==================== Counts ====================

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of halfedges, face-less boundary halfedges included.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Number of undirected edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    // ==================== Element access ====================

    /// Get a vertex by handle.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        &self.vertices[id.index()]
    }

    #[inline]
    pub(crate) fn vertex_mut(&mut self, id: VertexId<I>) -> &mut Vertex<I> {
        &mut self.vertices[id.index()]
    }

    /// Get a halfedge by handle.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId<I>) -> &HalfEdge<I> {
        &self.halfedges[id.index()]
    }

    #[inline]
    pub(crate) fn halfedge_mut(&mut self, id: HalfEdgeId<I>) -> &mut HalfEdge<I> {
        &mut self.halfedges[id.index()]
    }

    /// Get an edge by handle.
    #[inline]
    pub fn edge(&self, id: EdgeId<I>) -> &Edge<I> {
        &self.edges[id.index()]
    }

    /// Get a face by handle.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<I> {
        &self.faces[id.index()]
    }

    /// Position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    // ==================== Topology ====================

    /// Twin halfedge (face-less for boundary edges).
    #[inline]
    pub fn twin(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).twin
    }

    /// Opposite halfedge inside a neighboring face, `None` on boundary edges.
    #[inline]
    pub fn sym(&self, he: HalfEdgeId<I>) -> Option<HalfEdgeId<I>> {
        let twin = self.twin(he);
        if self.is_boundary_halfedge(he) || self.is_boundary_halfedge(twin) {
            None
        } else {
            Some(twin)
        }
    }

    /// Next halfedge in the face cycle.
    #[inline]
    pub fn next(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).next
    }

    /// Previous halfedge in the face cycle.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).prev
    }

    /// Source vertex of a halfedge.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.halfedge(he).origin
    }

    /// Target vertex of a halfedge.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.origin(self.twin(he))
    }

    /// Face of a halfedge (invalid for face-less halfedges).
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId<I>) -> FaceId<I> {
        self.halfedge(he).face
    }

    /// Edge of a halfedge.
    #[inline]
    pub fn edge_of(&self, he: HalfEdgeId<I>) -> EdgeId<I> {
        self.halfedge(he).edge
    }

    /// Canonical halfedge of an edge.
    #[inline]
    pub fn edge_halfedge(&self, e: EdgeId<I>) -> HalfEdgeId<I> {
        self.edge(e).halfedge
    }

    /// Endpoints of an edge in canonical orientation.
    #[inline]
    pub fn edge_vertices(&self, e: EdgeId<I>) -> (VertexId<I>, VertexId<I>) {
        let he = self.edge_halfedge(e);
        (self.origin(he), self.dest(he))
    }

    /// Whether a halfedge is face-less.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId<I>) -> bool {
        self.halfedge(he).is_boundary()
    }

    /// Whether an edge lies on the boundary.
    #[inline]
    pub fn is_boundary_edge(&self, e: EdgeId<I>) -> bool {
        self.is_boundary_halfedge(self.twin(self.edge_halfedge(e)))
    }

    /// Whether a vertex lies on the boundary (isolated vertices count as boundary).
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        let start = self.vertex(v).halfedge;
        if !start.is_valid() {
            return true;
        }
        self.vertex_halfedges(v)
            .any(|he| self.is_boundary_halfedge(he))
    }

    /// Edge joining two vertices, if any.
    pub fn find_edge(&self, v0: VertexId<I>, v1: VertexId<I>) -> Option<EdgeId<I>> {
        self.vertex_halfedges(v0)
            .find(|&he| self.dest(he) == v1)
            .map(|he| self.edge_of(he))
    }

    // ==================== Iteration ====================

    /// All vertex handles.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// All halfedge handles.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        (0..self.halfedges.len()).map(HalfEdgeId::new)
    }

    /// All edge handles.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId<I>> + '_ {
        (0..self.edges.len()).map(EdgeId::new)
    }

    /// All face handles.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Outgoing halfedges of a vertex, exactly one per incident edge.
    pub fn vertex_halfedges(&self, v: VertexId<I>) -> VertexHalfEdgeIter<'_, I> {
        VertexHalfEdgeIter::new(self, v)
    }

    /// Edges incident to a vertex.
    pub fn vertex_edges(&self, v: VertexId<I>) -> impl Iterator<Item = EdgeId<I>> + '_ {
        self.vertex_halfedges(v).map(|he| self.edge_of(he))
    }

    /// Vertices adjacent to a vertex.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertex_halfedges(v).map(|he| self.dest(he))
    }

    /// The three halfedges of a face, in cycle order.
    pub fn face_halfedges(&self, f: FaceId<I>) -> [HalfEdgeId<I>; 3] {
        let h0 = self.face(f).halfedge;
        let h1 = self.next(h0);
        let h2 = self.next(h1);
        [h0, h1, h2]
    }

    /// The three vertices of a face, in cycle order.
    pub fn face_triangle(&self, f: FaceId<I>) -> [VertexId<I>; 3] {
        self.face_halfedges(f).map(|he| self.origin(he))
    }

    // ==================== Geometry ====================

    /// Euclidean length of the edge carrying a halfedge.
    pub fn halfedge_length(&self, he: HalfEdgeId<I>) -> f64 {
        (self.position(self.dest(he)) - self.position(self.origin(he))).norm()
    }

    /// Euclidean length of an edge.
    pub fn edge_length(&self, e: EdgeId<I>) -> f64 {
        self.halfedge_length(self.edge_halfedge(e))
    }

    // ==================== Construction ====================

    /// Add an unconnected vertex.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::new(position));
        id
    }

    // ==================== Validation ====================

    /// Check that all links are mutually consistent.
    pub fn is_valid(&self) -> bool {
        for (i, v) in self.vertices.iter().enumerate() {
            if v.halfedge.is_valid() && self.origin(v.halfedge).index() != i {
                return false;
            }
        }

        for (i, he) in self.halfedges.iter().enumerate() {
            let id = HalfEdgeId::<I>::new(i);
            if !he.twin.is_valid() || self.twin(he.twin) != id || he.twin == id {
                return false;
            }
            if !he.next.is_valid() || self.prev(he.next) != id {
                return false;
            }
            if !he.edge.is_valid() || self.edge_of(he.twin) != he.edge {
                return false;
            }
        }

        for e in &self.edges {
            if !e.halfedge.is_valid() || self.is_boundary_halfedge(e.halfedge) {
                return false;
            }
        }

        self.face_ids().all(|f| {
            let [h0, _, h2] = self.face_halfedges(f);
            self.next(h2) == h0
        })
    }
}

/// Rotation over the outgoing halfedges of a vertex.
pub struct VertexHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> VertexHalfEdgeIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, v: VertexId<I>) -> Self {
        let start = mesh.vertex(v).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for VertexHalfEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        // twin(v -> w) arrives at v; its successor leaves v again
        self.current = self.mesh.next(self.mesh.twin(self.current));
        if self.current == self.start || !self.current.is_valid() {
            self.done = true;
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;
    use crate::test_meshes::{grid_mesh, octahedron};

    #[test]
    fn test_empty_mesh() {
        let mesh = HalfEdgeMesh::<u32>::new();
        assert_eq!(mesh.num_vertices(), 0);
        assert_eq!(mesh.num_edges(), 0);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_sym_is_none_exactly_on_boundary() {
        let mesh = grid_mesh(2);
        for f in mesh.face_ids() {
            for he in mesh.face_halfedges(f) {
                let boundary = mesh.is_boundary_edge(mesh.edge_of(he));
                match mesh.sym(he) {
                    Some(s) => {
                        assert!(!boundary);
                        assert_eq!(mesh.sym(s), Some(he));
                        assert_ne!(mesh.face_of(s), f);
                    }
                    None => assert!(boundary),
                }
            }
        }
    }

    #[test]
    fn test_vertex_rotation_visits_each_incident_edge_once() {
        let mesh = grid_mesh(3);
        for v in mesh.vertex_ids() {
            let mut edges: Vec<_> = mesh.vertex_edges(v).collect();
            let n = edges.len();
            edges.sort();
            edges.dedup();
            assert_eq!(edges.len(), n);
            for he in mesh.vertex_halfedges(v) {
                assert_eq!(mesh.origin(he), v);
            }
        }
        // interior vertex of a 3x3 grid with diagonal splits has valence 6
        assert_eq!(mesh.vertex_halfedges(VertexId::new(5)).count(), 6);
    }

    #[test]
    fn test_closed_mesh_has_no_boundary() {
        let mesh = octahedron();
        assert_eq!(mesh.num_edges(), 12);
        assert!(mesh.edge_ids().all(|e| !mesh.is_boundary_edge(e)));
        assert!(mesh.vertex_ids().all(|v| !mesh.is_boundary_vertex(v)));
        assert_eq!(mesh.vertex_neighbors(VertexId::new(0)).count(), 4);
    }

    #[test]
    fn test_find_edge_and_canonical_orientation() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3]];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

        let shared = mesh.find_edge(VertexId::new(0), VertexId::new(1)).unwrap();
        assert_eq!(
            mesh.find_edge(VertexId::new(1), VertexId::new(0)),
            Some(shared)
        );
        // the first face created the canonical halfedge
        assert_eq!(
            mesh.edge_vertices(shared),
            (VertexId::new(0), VertexId::new(1))
        );
        assert!(!mesh.is_boundary_edge(shared));
        assert!(mesh.find_edge(VertexId::new(2), VertexId::new(3)).is_none());
        assert!((mesh.edge_length(shared) - 1.0).abs() < 1e-12);
    }
}

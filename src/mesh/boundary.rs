//! Boundary loop extraction.

use super::halfedge::HalfEdgeMesh;
use super::index::{HalfEdgeId, MeshIndex, VertexId};

/// One closed boundary curve of the mesh.
///
/// Holds the face halfedges along the boundary, ordered so that each one ends
/// where the next one starts. The walk follows face orientation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryLoop<I: MeshIndex = u32> {
    halfedges: Vec<HalfEdgeId<I>>,
}

impl<I: MeshIndex> BoundaryLoop<I> {
    /// Face halfedges of the loop in walking order.
    pub fn halfedges(&self) -> &[HalfEdgeId<I>] {
        &self.halfedges
    }

    /// Number of edges on the loop.
    pub fn len(&self) -> usize {
        self.halfedges.len()
    }

    /// Whether the loop is empty (never true for loops produced by a mesh).
    pub fn is_empty(&self) -> bool {
        self.halfedges.is_empty()
    }

    /// Vertices of the loop, each listed once, as targets of the halfedges.
    pub fn vertices<'a>(
        &'a self,
        mesh: &'a HalfEdgeMesh<I>,
    ) -> impl Iterator<Item = VertexId<I>> + 'a {
        self.halfedges.iter().map(move |&he| mesh.dest(he))
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Extract all boundary loops.
    ///
    /// Loops are discovered in ascending order of their lowest face-less
    /// halfedge, which makes the loop numbering a function of the input face
    /// list. A closed mesh returns an empty list.
    pub fn boundary_loops(&self) -> Vec<BoundaryLoop<I>> {
        let mut visited = vec![false; self.num_halfedges()];
        let mut loops = Vec::new();

        for start in self.halfedge_ids() {
            if visited[start.index()] || !self.is_boundary_halfedge(start) {
                continue;
            }

            let mut gaps = Vec::new();
            let mut he = start;
            while he.is_valid() && !visited[he.index()] {
                visited[he.index()] = true;
                gaps.push(he);
                he = self.next(he);
            }

            // face-less halfedges run against face orientation
            let halfedges = gaps.iter().rev().map(|&gap| self.twin(gap)).collect();
            loops.push(BoundaryLoop { halfedges });
        }

        loops
    }
}

//! Mesh construction from face-vertex lists.
//!
//! Linking is done strictly in face order, so halfedge, edge and boundary-loop
//! numbering is reproducible from the input lists alone.

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::{Edge, Face, HalfEdge, HalfEdgeMesh};
use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{HodgeError, Result};

/// Build a half-edge mesh from vertices and consistently oriented triangles.
///
/// # Arguments
/// * `vertices` - Vertex positions
/// * `faces` - Triangles as `[v0, v1, v2]` indices into `vertices`
///
/// # Errors
/// Empty face list, out-of-range or repeated indices inside a face, a directed
/// edge used twice (non-manifold edge or flipped neighbor), or a vertex where
/// two boundary gaps meet.
///
/// # Example
/// ```
/// use hodge::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_edges(), 3);
/// assert_eq!(mesh.boundary_loops().len(), 1);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I>> {
    if faces.is_empty() {
        return Err(HodgeError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        for &vi in face {
            if vi >= vertices.len() {
                return Err(HodgeError::InvalidVertexIndex { face: fi, vertex: vi });
            }
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(HodgeError::DegenerateFace { face: fi });
        }
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());
    for &pos in vertices {
        mesh.add_vertex(pos);
    }

    // Face halfedges occupy 0..3F; (origin, dest) per halfedge
    let mut directed: Vec<(usize, usize)> = Vec::with_capacity(3 * faces.len());
    let mut lookup: HashMap<(usize, usize), HalfEdgeId<I>> = HashMap::with_capacity(3 * faces.len());

    for (fi, face) in faces.iter().enumerate() {
        let face_id = FaceId::<I>::new(fi);
        let base = mesh.halfedges.len();
        mesh.faces.push(Face {
            halfedge: HalfEdgeId::new(base),
        });

        for k in 0..3 {
            let (a, b) = (face[k], face[(k + 1) % 3]);
            let he = HalfEdgeId::<I>::new(base + k);
            if lookup.insert((a, b), he).is_some() {
                return Err(HodgeError::NonManifoldEdge { v0: a, v1: b });
            }
            directed.push((a, b));

            mesh.halfedges.push(HalfEdge {
                origin: VertexId::new(a),
                next: HalfEdgeId::new(base + (k + 1) % 3),
                prev: HalfEdgeId::new(base + (k + 2) % 3),
                face: face_id,
                ..HalfEdge::new()
            });
            mesh.vertex_mut(VertexId::new(a)).halfedge = he;
        }
    }

    // Twins and edge records; the lower face halfedge becomes canonical
    let mut outgoing_gap: HashMap<usize, HalfEdgeId<I>> = HashMap::new();
    for (i, &(a, b)) in directed.iter().enumerate() {
        let he = HalfEdgeId::<I>::new(i);
        if mesh.twin(he).is_valid() {
            continue;
        }

        let edge = EdgeId::<I>::new(mesh.edges.len());
        mesh.edges.push(Edge { halfedge: he });

        let twin = match lookup.get(&(b, a)) {
            Some(&twin) => twin,
            None => {
                let gap = HalfEdgeId::<I>::new(mesh.halfedges.len());
                mesh.halfedges.push(HalfEdge {
                    origin: VertexId::new(b),
                    ..HalfEdge::new()
                });
                if outgoing_gap.insert(b, gap).is_some() {
                    return Err(HodgeError::NonManifoldVertex { vertex: b });
                }
                gap
            }
        };

        mesh.halfedge_mut(he).twin = twin;
        mesh.halfedge_mut(he).edge = edge;
        mesh.halfedge_mut(twin).twin = he;
        mesh.halfedge_mut(twin).edge = edge;
    }

    link_boundary_loops(&mut mesh, &outgoing_gap);

    Ok(mesh)
}

/// Chain face-less halfedges into loops and anchor boundary vertices on them.
fn link_boundary_loops<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    outgoing_gap: &HashMap<usize, HalfEdgeId<I>>,
) {
    let gaps: Vec<HalfEdgeId<I>> = mesh
        .halfedge_ids()
        .filter(|&he| mesh.is_boundary_halfedge(he))
        .collect();

    for gap in gaps {
        // a face-less halfedge ends where its twin starts
        let dest = mesh.origin(mesh.twin(gap));
        if let Some(&next) = outgoing_gap.get(&dest.index()) {
            mesh.halfedge_mut(gap).next = next;
            mesh.halfedge_mut(next).prev = gap;
        }
        let origin = mesh.origin(gap);
        mesh.vertex_mut(origin).halfedge = gap;
    }
}

/// Convert a half-edge mesh back to a face-vertex representation.
pub fn to_face_vertex<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let vertices = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();
    let faces = mesh
        .face_ids()
        .map(|f| mesh.face_triangle(f).map(|v| v.index()))
        .collect();
    (vertices, faces)
}

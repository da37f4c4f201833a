//! Discrete exterior derivative and codifferential.
//!
//! | operator  | maps                  | rule                                         |
//! |-----------|-----------------------|----------------------------------------------|
//! | [`d0`]    | vertices → halfedges  | `f(dest) - f(origin)`                        |
//! | [`d1`]    | halfedges → faces     | sum around the face cycle                    |
//! | [`delta2`]| faces → halfedges     | `(β(f') - β(f)) / w`, `f'` absent → `0`      |
//! | [`delta1`]| halfedges → vertices  | `-Σ w(e) ω(h)` over outgoing halfedges `h`   |
//!
//! With these conventions `d1 ∘ delta2` is the face Laplacian and
//! `delta1 ∘ d0` is the negated vertex Laplacian of [`crate::algo::poisson`].
//! Every returned 1-form is antisymmetric over the whole halfedge arena.

use crate::algo::weights::EdgeWeights;
use crate::form::{OneForm, TwoForm, ZeroForm};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Exterior derivative of a 0-form.
///
/// `f` must hold one value per vertex of `mesh`; debug builds assert it.
pub fn d0<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, f: &ZeroForm<I>) -> OneForm<I> {
    debug_assert_eq!(f.len(), mesh.num_vertices(), "zero-form does not fit the mesh");
    let mut df = OneForm::zeros(mesh);
    for he in mesh.halfedge_ids() {
        df[he] = f[mesh.dest(he)] - f[mesh.origin(he)];
    }
    df
}

/// Exterior derivative of a 1-form: the circulation around every face.
///
/// `omega` must hold one value per halfedge of `mesh`; debug builds assert it.
pub fn d1<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, omega: &OneForm<I>) -> TwoForm<I> {
    debug_assert_eq!(omega.len(), mesh.num_halfedges(), "one-form does not fit the mesh");
    let mut curl = TwoForm::zeros(mesh);
    for f in mesh.face_ids() {
        curl[f] = mesh.face_halfedges(f).iter().map(|&he| omega[he]).sum();
    }
    curl
}

/// Codifferential of a face potential.
///
/// Edges whose weight has no reciprocal (see [`EdgeWeights::reciprocal`])
/// carry zero. `beta` and `weights` must belong to `mesh`; debug builds
/// assert it.
pub fn delta2<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    weights: &EdgeWeights<I>,
    beta: &TwoForm<I>,
) -> OneForm<I> {
    debug_assert_eq!(beta.len(), mesh.num_faces(), "two-form does not fit the mesh");
    debug_assert_eq!(weights.as_slice().len(), mesh.num_edges(), "weights do not fit the mesh");
    let mut form = OneForm::zeros(mesh);
    for f in mesh.face_ids() {
        for he in mesh.face_halfedges(f) {
            let Some(inv_w) = weights.reciprocal(mesh.edge_of(he)) else {
                continue;
            };
            let across = mesh.sym(he).map_or(0.0, |s| beta[mesh.face_of(s)]);
            form[he] = inv_w * (across - beta[f]);
        }
    }
    form.mirror_boundary(mesh);
    form
}

/// Codifferential of a 1-form: the weighted divergence at every vertex.
///
/// `omega` and `weights` must belong to `mesh`; debug builds assert it.
pub fn delta1<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    weights: &EdgeWeights<I>,
    omega: &OneForm<I>,
) -> ZeroForm<I> {
    debug_assert_eq!(omega.len(), mesh.num_halfedges(), "one-form does not fit the mesh");
    debug_assert_eq!(weights.as_slice().len(), mesh.num_edges(), "weights do not fit the mesh");
    let mut div = ZeroForm::zeros(mesh);
    for v in mesh.vertex_ids() {
        div[v] = -mesh
            .vertex_halfedges(v)
            .map(|he| weights.weight(mesh.edge_of(he)) * omega.along(mesh, he))
            .sum::<f64>();
    }
    div
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::weights::{compute_weights, WeightScheme};
    use crate::form::EdgeForm;
    use crate::mesh::VertexId;
    use crate::test_meshes::{annulus, grid_mesh, octahedron};
    use approx::assert_relative_eq;
    use nalgebra::DVector;

    fn vertex_field(mesh: &HalfEdgeMesh) -> ZeroForm {
        ZeroForm::from_values(DVector::from_fn(mesh.num_vertices(), |i, _| {
            let p = mesh.position(VertexId::new(i));
            (3.0 * p.x).sin() + p.y * p.y - 0.5 * p.z
        }))
    }

    fn edge_field(mesh: &HalfEdgeMesh) -> OneForm {
        let du = EdgeForm::from_values(DVector::from_fn(mesh.num_edges(), |i, _| {
            ((i * 7919) % 13) as f64 / 6.5 - 1.0
        }));
        OneForm::from_edge_form(mesh, &du).unwrap()
    }

    #[test]
    fn test_d0_is_antisymmetric() {
        let mesh = annulus(10, 2);
        let df = d0(&mesh, &vertex_field(&mesh));
        assert_eq!(df.antisymmetry_defect(&mesh), 0.0);
    }

    #[test]
    fn test_d1_of_d0_vanishes() {
        for mesh in [grid_mesh(4), annulus(10, 3), octahedron()] {
            let curl = d1(&mesh, &d0(&mesh, &vertex_field(&mesh)));
            assert!(curl.max_abs() < 1e-12);
        }
    }

    #[test]
    fn test_delta2_is_antisymmetric() {
        let mesh = grid_mesh(3);
        let weights = compute_weights(&mesh, WeightScheme::Uniform);
        let beta = TwoForm::from_values(DVector::from_fn(mesh.num_faces(), |i, _| i as f64));

        let form = delta2(&mesh, &weights, &beta);
        assert!(form.antisymmetry_defect(&mesh) < 1e-15);
    }

    #[test]
    fn test_delta2_boundary_rule() {
        let mesh = grid_mesh(1);
        let weights = compute_weights(&mesh, WeightScheme::Uniform);
        let beta = TwoForm::from_values(DVector::from_vec(vec![1.0, 3.0]));

        let form = delta2(&mesh, &weights, &beta);
        for f in mesh.face_ids() {
            for he in mesh.face_halfedges(f) {
                let e = mesh.edge_of(he);
                if mesh.is_boundary_edge(e) {
                    // w = 1/2 on the boundary
                    assert_relative_eq!(form[he], -2.0 * beta[f]);
                } else {
                    let other = mesh.face_of(mesh.twin(he));
                    assert_relative_eq!(form[he], beta[other] - beta[f]);
                }
            }
        }
    }

    #[test]
    fn test_delta1_of_d0_is_graph_laplacian() {
        let mesh = octahedron();
        let weights = compute_weights(&mesh, WeightScheme::Cotangent);
        let f = vertex_field(&mesh);

        let div = delta1(&mesh, &weights, &d0(&mesh, &f));
        for v in mesh.vertex_ids() {
            let laplacian: f64 = mesh
                .vertex_halfedges(v)
                .map(|he| weights.weight(mesh.edge_of(he)) * (f[mesh.dest(he)] - f[v]))
                .sum();
            assert_relative_eq!(div[v], -laplacian, epsilon = 1e-12);
        }
        // divergence of anything sums to zero
        assert!(div.values().sum().abs() < 1e-12);
    }

    #[test]
    fn test_delta1_uses_orientation_of_outgoing_halfedge() {
        let mesh = grid_mesh(2);
        let weights = compute_weights(&mesh, WeightScheme::Uniform);
        let omega = edge_field(&mesh);

        let div = delta1(&mesh, &weights, &omega);
        for v in mesh.vertex_ids() {
            let expected: f64 = mesh
                .vertex_edges(v)
                .map(|e| {
                    let he = mesh.edge_halfedge(e);
                    let sign = if mesh.origin(he) == v { 1.0 } else { -1.0 };
                    -weights.weight(e) * sign * omega[he]
                })
                .sum();
            assert_relative_eq!(div[v], expected, epsilon = 1e-12);
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "one-form does not fit the mesh")]
    fn test_d1_rejects_foreign_form_in_debug() {
        let mesh = grid_mesh(2);
        let other = grid_mesh(3);
        d1(&mesh, &OneForm::zeros(&other));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "weights do not fit the mesh")]
    fn test_delta1_rejects_foreign_weights_in_debug() {
        let mesh = grid_mesh(2);
        let weights = compute_weights(&grid_mesh(3), WeightScheme::Uniform);
        delta1(&mesh, &weights, &OneForm::zeros(&mesh));
    }
}

//! Discrete differential forms as stage-scoped buffers.
//!
//! A k-form assigns one number to every k-dimensional element of the mesh:
//!
//! - [`ZeroForm`]: one value per vertex (potentials, divergences)
//! - [`OneForm`]: one value per *halfedge*, with `form(twin(h)) == -form(h)`
//! - [`TwoForm`]: one value per face (curl defects, face potentials)
//!
//! Two per-edge views exist for consumers that want one value per undirected
//! edge in canonical orientation: [`EdgeForm`] (`du`) and [`ComplexEdgeForm`]
//! (`duv`, real part plus angular part).
//!
//! Buffers are plain owned vectors indexed by mesh handles. Every pipeline
//! stage takes its inputs by reference and hands back fresh buffers, so the
//! meaning of a buffer is fixed by its name at the call site.

use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Neg, Sub, SubAssign};

use nalgebra::{DVector, Vector2};

use crate::error::{HodgeError, Result};
use crate::mesh::{BoundaryLoop, EdgeId, FaceId, HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId};

macro_rules! scalar_form {
    ($(#[$doc:meta])* $name:ident, $handle:ident, $count:ident, $what:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name<I: MeshIndex = u32> {
            values: DVector<f64>,
            _marker: PhantomData<I>,
        }

        impl<I: MeshIndex> $name<I> {
            /// Wrap a vector of values indexed by handle.
            pub fn from_values(values: DVector<f64>) -> Self {
                Self {
                    values,
                    _marker: PhantomData,
                }
            }

            /// A form that is zero everywhere on `mesh`.
            pub fn zeros(mesh: &HalfEdgeMesh<I>) -> Self {
                Self::from_values(DVector::zeros(mesh.$count()))
            }

            /// Check that this buffer has one entry per element of `mesh`.
            pub fn check_size(&self, mesh: &HalfEdgeMesh<I>) -> Result<()> {
                if self.values.len() == mesh.$count() {
                    Ok(())
                } else {
                    Err(HodgeError::size_mismatch($what, mesh.$count(), self.values.len()))
                }
            }

            /// Number of entries.
            #[inline]
            pub fn len(&self) -> usize {
                self.values.len()
            }

            /// Whether the buffer is empty.
            #[inline]
            pub fn is_empty(&self) -> bool {
                self.values.is_empty()
            }

            /// Underlying values.
            #[inline]
            pub fn values(&self) -> &DVector<f64> {
                &self.values
            }

            /// Mutable access to the underlying values.
            #[inline]
            pub fn values_mut(&mut self) -> &mut DVector<f64> {
                &mut self.values
            }

            /// Consume into the underlying values.
            pub fn into_values(self) -> DVector<f64> {
                self.values
            }

            /// Largest absolute entry (0 for an empty form).
            pub fn max_abs(&self) -> f64 {
                self.values.iter().fold(0.0, |m, v| m.max(v.abs()))
            }
        }

        impl<I: MeshIndex> Index<$handle<I>> for $name<I> {
            type Output = f64;

            #[inline]
            fn index(&self, id: $handle<I>) -> &f64 {
                &self.values[id.index()]
            }
        }

        impl<I: MeshIndex> IndexMut<$handle<I>> for $name<I> {
            #[inline]
            fn index_mut(&mut self, id: $handle<I>) -> &mut f64 {
                &mut self.values[id.index()]
            }
        }

        impl<I: MeshIndex> Add<&$name<I>> for &$name<I> {
            type Output = $name<I>;

            fn add(self, rhs: &$name<I>) -> $name<I> {
                $name::from_values(&self.values + &rhs.values)
            }
        }

        impl<I: MeshIndex> Sub<&$name<I>> for &$name<I> {
            type Output = $name<I>;

            fn sub(self, rhs: &$name<I>) -> $name<I> {
                $name::from_values(&self.values - &rhs.values)
            }
        }

        impl<I: MeshIndex> AddAssign<&$name<I>> for $name<I> {
            fn add_assign(&mut self, rhs: &$name<I>) {
                self.values += &rhs.values;
            }
        }

        impl<I: MeshIndex> SubAssign<&$name<I>> for $name<I> {
            fn sub_assign(&mut self, rhs: &$name<I>) {
                self.values -= &rhs.values;
            }
        }

        impl<I: MeshIndex> Mul<f64> for &$name<I> {
            type Output = $name<I>;

            fn mul(self, rhs: f64) -> $name<I> {
                $name::from_values(&self.values * rhs)
            }
        }

        impl<I: MeshIndex> Neg for &$name<I> {
            type Output = $name<I>;

            fn neg(self) -> $name<I> {
                $name::from_values(-&self.values)
            }
        }
    };
}

scalar_form!(
    /// Vertex-valued 0-form.
    ZeroForm, VertexId, num_vertices, "zero-form"
);
scalar_form!(
    /// Halfedge-valued 1-form. Face-less boundary halfedges carry the negated
    /// value of their twin so the pair stays antisymmetric.
    OneForm, HalfEdgeId, num_halfedges, "one-form"
);
scalar_form!(
    /// Face-valued 2-form.
    TwoForm, FaceId, num_faces, "two-form"
);
scalar_form!(
    /// Edge-valued 1-form in canonical orientation (`du`).
    EdgeForm, EdgeId, num_edges, "edge form"
);

impl<I: MeshIndex> OneForm<I> {
    /// Spread per-edge values onto halfedges: the canonical halfedge gets the
    /// value, its twin the negation.
    pub fn from_edge_form(mesh: &HalfEdgeMesh<I>, du: &EdgeForm<I>) -> Result<Self> {
        du.check_size(mesh)?;
        let mut form = Self::zeros(mesh);
        for e in mesh.edge_ids() {
            let he = mesh.edge_halfedge(e);
            form[he] = du[e];
            form[mesh.twin(he)] = -du[e];
        }
        Ok(form)
    }

    /// Read the canonical halfedge value of every edge.
    pub fn to_edge_form(&self, mesh: &HalfEdgeMesh<I>) -> EdgeForm<I> {
        let values = DVector::from_iterator(
            mesh.num_edges(),
            mesh.edge_ids().map(|e| self[mesh.edge_halfedge(e)]),
        );
        EdgeForm::from_values(values)
    }

    /// Value of the form along `he` as seen from its canonical edge entry.
    #[inline]
    pub fn along(&self, mesh: &HalfEdgeMesh<I>, he: HalfEdgeId<I>) -> f64 {
        let canonical = mesh.edge_halfedge(mesh.edge_of(he));
        if canonical == he {
            self[he]
        } else {
            -self[canonical]
        }
    }

    /// Overwrite every face-less halfedge with the negated value of its twin.
    pub(crate) fn mirror_boundary(&mut self, mesh: &HalfEdgeMesh<I>) {
        for e in mesh.edge_ids() {
            if mesh.is_boundary_edge(e) {
                let he = mesh.edge_halfedge(e);
                let gap = mesh.twin(he);
                self[gap] = -self[he];
            }
        }
    }

    /// Largest `|form(h) + form(twin(h))|` over all edges.
    pub fn antisymmetry_defect(&self, mesh: &HalfEdgeMesh<I>) -> f64 {
        mesh.edge_ids()
            .map(|e| {
                let he = mesh.edge_halfedge(e);
                (self[he] + self[mesh.twin(he)]).abs()
            })
            .fold(0.0, f64::max)
    }
}

/// Edge-valued complex 1-form (`duv`): `x` is the real (log-radius) part,
/// `y` the angular part, both in canonical edge orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexEdgeForm<I: MeshIndex = u32> {
    values: Vec<Vector2<f64>>,
    _marker: PhantomData<I>,
}

impl<I: MeshIndex> ComplexEdgeForm<I> {
    /// Wrap per-edge vectors.
    pub fn new(values: Vec<Vector2<f64>>) -> Self {
        Self {
            values,
            _marker: PhantomData,
        }
    }

    /// Pair two real edge forms into `real + i * imag`.
    pub fn from_parts(real: &EdgeForm<I>, imag: &EdgeForm<I>) -> Result<Self> {
        if real.len() != imag.len() {
            return Err(HodgeError::size_mismatch("imaginary part", real.len(), imag.len()));
        }
        let values = real
            .values()
            .iter()
            .zip(imag.values().iter())
            .map(|(&re, &im)| Vector2::new(re, im))
            .collect();
        Ok(Self::new(values))
    }

    /// Check that this buffer has one entry per edge of `mesh`.
    pub fn check_size(&self, mesh: &HalfEdgeMesh<I>) -> Result<()> {
        if self.values.len() == mesh.num_edges() {
            Ok(())
        } else {
            Err(HodgeError::size_mismatch("complex edge form", mesh.num_edges(), self.values.len()))
        }
    }

    /// Number of edges covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value on an edge in canonical orientation.
    #[inline]
    pub fn get(&self, e: EdgeId<I>) -> Vector2<f64> {
        self.values[e.index()]
    }

    /// Value along a halfedge (negated against canonical orientation).
    #[inline]
    pub fn along(&self, mesh: &HalfEdgeMesh<I>, he: HalfEdgeId<I>) -> Vector2<f64> {
        let e = mesh.edge_of(he);
        if mesh.edge_halfedge(e) == he {
            self.get(e)
        } else {
            -self.get(e)
        }
    }

    /// Divide every value by `factor`.
    pub fn scale_down(&mut self, factor: f64) {
        for v in &mut self.values {
            *v /= factor;
        }
    }

    /// Sum of the canonical edge values over the edges of a boundary loop.
    ///
    /// Boundary edges are canonically oriented along the loop, so this is the
    /// integral of the form around it.
    pub fn loop_sum(&self, mesh: &HalfEdgeMesh<I>, boundary: &BoundaryLoop<I>) -> Vector2<f64> {
        boundary
            .halfedges()
            .iter()
            .map(|&he| self.get(mesh.edge_of(he)))
            .sum()
    }

    /// Per-edge values.
    pub fn as_slice(&self) -> &[Vector2<f64>] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_meshes::{annulus, grid_mesh};

    #[test]
    fn test_edge_form_roundtrip_keeps_antisymmetry() {
        let mesh = grid_mesh(2);
        let du = EdgeForm::from_values(DVector::from_fn(mesh.num_edges(), |i, _| i as f64 - 3.5));
        let form = OneForm::from_edge_form(&mesh, &du).unwrap();

        assert_eq!(form.antisymmetry_defect(&mesh), 0.0);
        assert_eq!(form.to_edge_form(&mesh), du);
        for he in mesh.halfedge_ids() {
            assert_eq!(form.along(&mesh, he), form[he]);
        }
    }

    #[test]
    fn test_size_checks() {
        let mesh = grid_mesh(2);
        let short: OneForm = OneForm::from_values(DVector::zeros(3));
        assert!(matches!(
            short.check_size(&mesh),
            Err(HodgeError::SizeMismatch { what: "one-form", .. })
        ));
        assert!(ZeroForm::zeros(&mesh).check_size(&mesh).is_ok());
        assert!(OneForm::from_edge_form(&mesh, &EdgeForm::from_values(DVector::zeros(1))).is_err());
    }

    #[test]
    fn test_arithmetic() {
        let mesh = grid_mesh(1);
        let mut a = ZeroForm::zeros(&mesh);
        a[VertexId::new(0)] = 2.0;
        let b = &a * 3.0;
        let c = &b - &a;
        assert_eq!(c[VertexId::new(0)], 4.0);
        let mut d = -&c;
        d += &a;
        assert_eq!(d[VertexId::new(0)], -2.0);
        assert_eq!(d.max_abs(), 2.0);
    }

    #[test]
    fn test_complex_loop_sum_follows_loop_orientation() {
        let mesh = annulus(12, 1);
        let real = EdgeForm::zeros(&mesh);
        let imag = EdgeForm::from_values(DVector::from_element(mesh.num_edges(), 1.0));
        let duv = ComplexEdgeForm::from_parts(&real, &imag).unwrap();

        for lp in mesh.boundary_loops() {
            let s = duv.loop_sum(&mesh, &lp);
            assert_eq!(s.x, 0.0);
            assert_eq!(s.y, lp.len() as f64);
        }

        let mut halved = duv.clone();
        halved.scale_down(2.0);
        let he = mesh.edge_halfedge(EdgeId::new(0));
        assert_eq!(halved.along(&mesh, mesh.twin(he)).y, -0.5);
    }
}

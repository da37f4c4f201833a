//! Small meshes shared by the unit tests.

use crate::mesh::{build_from_triangles, HalfEdgeMesh};
use nalgebra::Point3;
use std::f64::consts::PI;

/// Unit square split into `n x n` cells, each cut along its main diagonal.
///
/// Vertex `(i, j)` has index `j * (n + 1) + i` and sits at `(i / n, j / n)`.
pub(crate) fn grid_mesh(n: usize) -> HalfEdgeMesh {
    let h = 1.0 / n as f64;
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(i as f64 * h, j as f64 * h, 0.0));
        }
    }

    let mut faces = Vec::with_capacity(2 * n * n);
    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + n + 1;
            let v11 = v01 + 1;
            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

fn ring_ratio(sectors: usize) -> f64 {
    (3f64.sqrt() * PI / sectors as f64).exp()
}

fn ring_point(sectors: usize, ring: usize, j: usize) -> Point3<f64> {
    let r = ring_ratio(sectors).powi(ring as i32);
    let theta = 2.0 * PI * (j as f64 + 0.5 * ring as f64) / sectors as f64;
    Point3::new(r * theta.cos(), r * theta.sin(), 0.0)
}

/// Planar annulus of `rings + 1` concentric circles with `sectors` vertices
/// each.
///
/// Circle `k` has radius `q^k` and is rotated by half a sector against circle
/// `k - 1`, which keeps every triangle close to equilateral. Vertex `(k, j)`
/// has index `k * sectors + j`. The inner circle is boundary loop 0.
pub(crate) fn annulus(sectors: usize, rings: usize) -> HalfEdgeMesh {
    let mut vertices = Vec::with_capacity((rings + 1) * sectors);
    for k in 0..=rings {
        for j in 0..sectors {
            vertices.push(ring_point(sectors, k, j));
        }
    }

    let mut faces = Vec::with_capacity(2 * rings * sectors);
    for k in 0..rings {
        for j in 0..sectors {
            let jn = (j + 1) % sectors;
            let a = k * sectors + j;
            let b = k * sectors + jn;
            let c = (k + 1) * sectors + j;
            let d = (k + 1) * sectors + jn;
            faces.push([a, c, b]);
            faces.push([b, c, d]);
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

/// Ratio of outer to inner radius of [`annulus`].
pub(crate) fn annulus_ratio(sectors: usize, rings: usize) -> f64 {
    ring_ratio(sectors).powi(rings as i32)
}

/// [`annulus`] cut open along the ray through sector 0.
///
/// Each circle gets an extra copy of its first vertex at `j = sectors`, so
/// vertex `(k, j)` has index `k * (sectors + 1) + j`. The returned fathers map
/// every vertex to its counterpart in the uncut annulus.
pub(crate) fn cut_annulus(sectors: usize, rings: usize) -> (HalfEdgeMesh, Vec<Option<usize>>) {
    let stride = sectors + 1;
    let mut vertices = Vec::with_capacity((rings + 1) * stride);
    let mut fathers = Vec::with_capacity((rings + 1) * stride);
    for k in 0..=rings {
        for j in 0..=sectors {
            vertices.push(ring_point(sectors, k, j));
            fathers.push(Some(k * sectors + j % sectors));
        }
    }

    let mut faces = Vec::with_capacity(2 * rings * sectors);
    for k in 0..rings {
        for j in 0..sectors {
            let a = k * stride + j;
            let b = a + 1;
            let c = (k + 1) * stride + j;
            let d = c + 1;
            faces.push([a, c, b]);
            faces.push([b, c, d]);
        }
    }

    (build_from_triangles(&vertices, &faces).unwrap(), fathers)
}

/// Torus of revolution around the z axis.
///
/// `n_minor` must be even: odd rows are shifted by half a step around the
/// major circle so the rows interlock like the annulus rings.
pub(crate) fn torus(n_major: usize, n_minor: usize, major: f64, minor: f64) -> HalfEdgeMesh {
    assert!(n_minor % 2 == 0, "torus rows must interlock");

    let mut vertices = Vec::with_capacity(n_major * n_minor);
    for j in 0..n_minor {
        let shift = 0.5 * (j % 2) as f64;
        let v = 2.0 * PI * j as f64 / n_minor as f64;
        for i in 0..n_major {
            let u = 2.0 * PI * (i as f64 + shift) / n_major as f64;
            let rho = major + minor * v.cos();
            vertices.push(Point3::new(rho * u.cos(), rho * u.sin(), minor * v.sin()));
        }
    }

    let mut faces = Vec::with_capacity(2 * n_major * n_minor);
    for j in 0..n_minor {
        let jn = (j + 1) % n_minor;
        for i in 0..n_major {
            let inext = (i + 1) % n_major;
            let a = j * n_major + i;
            let b = j * n_major + inext;
            let c = jn * n_major + i;
            let d = jn * n_major + inext;
            if j % 2 == 0 {
                faces.push([a, b, c]);
                faces.push([b, d, c]);
            } else {
                faces.push([a, b, d]);
                faces.push([a, d, c]);
            }
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

/// Regular octahedron with vertices on the unit axes, faces oriented outward.
pub(crate) fn octahedron() -> HalfEdgeMesh {
    let vertices = vec![
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(-1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, -1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(0.0, 0.0, -1.0),
    ];
    let faces = vec![
        [0, 2, 4],
        [2, 1, 4],
        [1, 3, 4],
        [3, 0, 4],
        [2, 0, 5],
        [1, 2, 5],
        [3, 1, 5],
        [0, 3, 5],
    ];

    build_from_triangles(&vertices, &faces).unwrap()
}

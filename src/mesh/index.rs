//! Typed handles into the mesh arena.
//!
//! Every element (vertex, halfedge, edge, face) is addressed by a dense integer
//! handle. Handles double as row/column indices of the sparse systems assembled
//! in [`crate::algo::poisson`], so they are always contiguous `0..N`.

use std::fmt::{self, Debug};
use std::hash::Hash;

/// Integer type backing mesh handles.
///
/// Implemented for `u16`, `u32` and `u64`. The maximum value of the type is
/// reserved as the "no element" sentinel.
pub trait MeshIndex: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {
    /// Sentinel meaning "no element".
    const INVALID: Self;

    /// Convert from usize to this index type.
    ///
    /// # Panics
    /// Panics in debug builds if the value does not fit.
    fn from_usize(v: usize) -> Self;

    /// Convert to usize.
    fn to_usize(self) -> usize;

    /// Whether this is a real handle rather than the sentinel.
    fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

macro_rules! impl_mesh_index {
    ($($ty:ty),*) => {
        $(
            impl MeshIndex for $ty {
                const INVALID: Self = <$ty>::MAX;

                #[inline]
                fn from_usize(v: usize) -> Self {
                    debug_assert!(
                        (v as u128) < <$ty>::MAX as u128,
                        "index {} too large for {}",
                        v,
                        stringify!($ty)
                    );
                    v as $ty
                }

                #[inline]
                fn to_usize(self) -> usize {
                    self as usize
                }
            }
        )*
    };
}

impl_mesh_index!(u16, u32, u64);

/// Handle of a vertex (0-simplex, carries 0-forms).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId<I: MeshIndex = u32>(I);

/// Handle of an oriented halfedge (carries 1-form values).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct HalfEdgeId<I: MeshIndex = u32>(I);

/// Handle of an undirected edge (carries weights, `du` and `duv`).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct EdgeId<I: MeshIndex = u32>(I);

/// Handle of a triangle (2-simplex, carries 2-forms).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId<I: MeshIndex = u32>(I);

macro_rules! impl_handle {
    ($name:ident, $tag:literal) => {
        impl<I: MeshIndex> $name<I> {
            /// Create a handle from a dense index.
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(I::from_usize(index))
            }

            /// The "no element" handle.
            #[inline]
            pub fn invalid() -> Self {
                Self(I::INVALID)
            }

            /// Dense index of this handle.
            #[inline]
            pub fn index(self) -> usize {
                self.0.to_usize()
            }

            /// Whether this handle refers to an element.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0.is_valid()
            }
        }

        impl<I: MeshIndex> Debug for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $tag, self.index())
                } else {
                    write!(f, "{}(INVALID)", $tag)
                }
            }
        }

        impl<I: MeshIndex> Default for $name<I> {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl<I: MeshIndex> From<usize> for $name<I> {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_handle!(VertexId, "V");
impl_handle!(HalfEdgeId, "HE");
impl_handle!(EdgeId, "E");
impl_handle!(FaceId, "F");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_dense_indices() {
        let v: VertexId = VertexId::new(42);
        let e: EdgeId = EdgeId::new(42);
        assert_eq!(v.index(), e.index());
        assert!(v.is_valid());
        assert!(!VertexId::<u32>::invalid().is_valid());
        assert!(!EdgeId::<u32>::default().is_valid());
    }

    #[test]
    fn test_small_and_large_backing_types() {
        let v: VertexId<u16> = VertexId::new(1000);
        assert_eq!(v.index(), 1000);
        let f: FaceId<u64> = FaceId::from(7usize);
        assert_eq!(f.index(), 7);
    }

    #[test]
    fn test_debug_format() {
        let h: HalfEdgeId = HalfEdgeId::new(3);
        assert_eq!(format!("{:?}", h), "HE(3)");
        assert_eq!(format!("{:?}", EdgeId::<u32>::invalid()), "E(INVALID)");
    }
}

//! Typed handles into the node, arc and label pools
//!
//! Every record in the engine is addressed by a small integer handle rather
//! than a reference: pool growth may relocate backing storage, so handles are
//! the only names that stay valid across allocation. The raw value 0 is the
//! reserved sentinel [`NONE`](NodeId::NONE) and doubles as the terminator of
//! every intrusive list in the graph.

use std::fmt;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// The reserved null handle; never addresses a live record.
            pub const NONE: $name = $name(0);

            #[inline]
            pub(crate) const fn new(raw: u32) -> Self {
                $name(raw)
            }

            /// Returns the raw table index.
            #[inline]
            pub const fn get(self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn is_none(self) -> bool {
                self.0 == 0
            }

            #[inline]
            pub const fn is_some(self) -> bool {
                self.0 != 0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_handle!(
    /// Handle of a graph node (one per surviving mesh vertex).
    NodeId
);
define_handle!(
    /// Handle of a monotone arc between two nodes.
    ArcId
);
define_handle!(
    /// Handle of a path label attached to an arc.
    LabelId
);

#[cfg(test)]
mod layout_tests {
    //! Compile-time assertion that handles cost no more than a bare `u32`.
    use super::*;
    use static_assertions::{assert_eq_align, assert_eq_size};

    assert_eq_size!(NodeId, u32);
    assert_eq_size!(ArcId, u32);
    assert_eq_size!(LabelId, u32);

    #[test]
    fn alignment_matches_u32() {
        assert_eq_align!(NodeId, u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_zero_and_default() {
        assert_eq!(NodeId::NONE.get(), 0);
        assert_eq!(ArcId::default(), ArcId::NONE);
        assert!(LabelId::NONE.is_none());
        assert!(NodeId::new(3).is_some());
    }

    #[test]
    fn debug_and_display() {
        let n = NodeId::new(7);
        assert_eq!(format!("{:?}", n), "NodeId(7)");
        assert_eq!(format!("{}", n), "7");
    }

    #[test]
    fn ordering_and_hash() {
        use std::collections::HashSet;
        let a = ArcId::new(1);
        let b = ArcId::new(2);
        assert!(a < b);
        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn serde_roundtrip() {
        let n = NodeId::new(123);
        let s = serde_json::to_string(&n).unwrap();
        let n2: NodeId = serde_json::from_str(&s).unwrap();
        assert_eq!(n, n2);
    }
}

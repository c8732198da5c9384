//! Pooled record types: `Node`, `Arc`, `Label` and the shared link pair.

use crate::topology::handles::{ArcId, LabelId, NodeId};

/// One prev/next pair of an intrusive doubly-linked list threaded through a
/// pool. The same helper backs all three list families in the graph: node
/// arc-lists, per-arc label lists, and the vertical chains of one path.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Links<I> {
    pub prev: I,
    pub next: I,
}

impl<I: Copy + Default> Links<I> {
    #[inline]
    pub fn clear(&mut self) {
        *self = Links::default();
    }
}

/// A graph node, standing for one mesh vertex still present in the graph.
#[derive(Clone, Debug, Default)]
pub struct Node {
    /// External mesh vertex id.
    pub vertex: u64,
    /// Scalar field value at that vertex.
    pub value: f64,
    /// Head of the list of arcs whose high endpoint is this node.
    pub down_arcs: ArcId,
    /// Head of the list of arcs whose low endpoint is this node.
    pub up_arcs: ArcId,
    /// All incident cells have been processed; degree can no longer grow.
    pub finalized: bool,
    /// Protected from regular-node removal.
    pub critical: bool,
}

/// A monotone arc. Invariant: `value(low) <= value(high)`, ties broken by
/// mesh vertex id.
#[derive(Clone, Debug, Default)]
pub struct Arc {
    pub low: NodeId,
    pub high: NodeId,
    /// Threads this arc into `low`'s up-list.
    pub low_links: Links<ArcId>,
    /// Threads this arc into `high`'s down-list.
    pub high_links: Links<ArcId>,
    /// Head of this arc's label list.
    pub label_head: LabelId,
    /// Tail of this arc's label list.
    pub label_tail: LabelId,
}

/// Identity of a monotone path running through the graph.
///
/// Mesh edges are identified by their endpoint vertices in ascending
/// `(scalar, vertex)` order. The two route markers are transient tags used
/// only inside one branch-simplification search; as enum variants they can
/// never collide with a real edge key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LabelTag {
    /// A mesh edge, `(low vertex, high vertex)`.
    Edge(u64, u64),
    /// Marks the path being cancelled during branch simplification.
    RouteOld,
    /// Marks the replacement path during branch simplification.
    RouteNew,
}

impl Default for LabelTag {
    fn default() -> Self {
        LabelTag::Edge(0, 0)
    }
}

/// Tags one arc as part of a monotone path. Labels are linked horizontally
/// across all labels sharing one arc and vertically along the chain of arcs
/// forming one logical path.
#[derive(Clone, Debug, Default)]
pub struct Label {
    pub arc: ArcId,
    pub tag: LabelTag,
    pub h: Links<LabelId>,
    pub v: Links<LabelId>,
}

/// One simplification rewrite, as endpoint mesh-vertex pairs. Appended by
/// every step that rewires the graph and consumed by the commit pass to remap
/// published super-arcs onto their surviving destinations.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    pub removed: Vec<(u64, u64)>,
    pub inserted: Vec<(u64, u64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_clear() {
        let mut l = Links {
            prev: ArcId::new(3),
            next: ArcId::new(4),
        };
        l.clear();
        assert_eq!(l, Links::default());
    }

    #[test]
    fn tags_never_alias_routes() {
        // Edge keys built from any vertex pair stay distinct from the
        // transient route markers.
        for v in [0u64, 100, 200, u64::MAX] {
            assert_ne!(LabelTag::Edge(v, v), LabelTag::RouteOld);
            assert_ne!(LabelTag::Edge(v, v), LabelTag::RouteNew);
        }
        assert_ne!(LabelTag::RouteOld, LabelTag::RouteNew);
    }
}

//! Streaming construction: vertices, monotone paths, and cell insertion.
//!
//! Cells arrive one at a time. Each cell contributes its edges as labelled
//! monotone paths, then merges them pairwise so that level sets crossing the
//! cell are identified. Vertices whose incident cells have all been seen are
//! finalized on the spot when the stream was opened with a full incidence
//! census (see [`ReebGraph::build`](crate::ReebGraph::build)).

use std::cmp::Ordering;

use itertools::Itertools;
use log::trace;

use crate::error::ReebGraphError;
use crate::topology::graph::ReebGraph;
use crate::topology::handles::{ArcId, NodeId};
use crate::topology::records::{Arc, LabelTag, Node};

impl ReebGraph {
    /// Total order on nodes as a comparator, for sorting cell corners.
    #[inline]
    pub(crate) fn node_cmp(&self, a: NodeId, b: NodeId) -> Ordering {
        let (na, nb) = (self.node(a), self.node(b));
        na.value
            .total_cmp(&nb.value)
            .then(na.vertex.cmp(&nb.vertex))
    }

    /// Creates a node for a mesh vertex and records its scalar value.
    pub(crate) fn add_vertex(&mut self, vertex: u64, value: f64) -> NodeId {
        let n = NodeId::new(self.nodes.allocate());
        *self.node_mut(n) = Node {
            vertex,
            value,
            ..Node::default()
        };
        self.vertex_nodes.insert(vertex, n);
        self.scalar_field.insert(vertex, value);
        if self.have_values {
            self.min_value = self.min_value.min(value);
            self.max_value = self.max_value.max(value);
        } else {
            self.min_value = value;
            self.max_value = value;
            self.have_values = true;
        }
        n
    }

    /// Returns the node of `vertex`, creating it on first sight. A vertex
    /// keeps the scalar value it was first streamed with.
    fn ensure_vertex(&mut self, vertex: u64, value: f64) -> NodeId {
        if let Some(&n) = self.vertex_nodes.get(&vertex) {
            return n;
        }
        self.add_vertex(vertex, value)
    }

    /// Chains `nodes` (already in ascending order) with one arc per
    /// consecutive pair, each optionally carrying a `tag` label linked
    /// vertically along the path. Returns the first arc.
    pub(crate) fn add_path(&mut self, nodes: &[NodeId], tag: Option<LabelTag>) -> ArcId {
        debug_assert!(nodes.len() >= 2);
        let mut first = ArcId::NONE;
        let mut prev_label = crate::topology::handles::LabelId::NONE;
        for pair in nodes.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            let a = ArcId::new(self.arcs.allocate());
            *self.arc_mut(a) = Arc {
                low: lo,
                high: hi,
                ..Arc::default()
            };
            if let Some(tag) = tag {
                let l = crate::topology::handles::LabelId::new(self.labels.allocate());
                {
                    let label = self.label_mut(l);
                    label.arc = a;
                    label.tag = tag;
                    label.h.clear();
                    label.v.clear();
                    label.v.prev = prev_label;
                }
                if prev_label.is_some() {
                    self.label_mut(prev_label).v.next = l;
                }
                let arc = self.arc_mut(a);
                arc.label_head = l;
                arc.label_tail = l;
                prev_label = l;
            }
            self.add_up_arc(lo, a);
            self.add_down_arc(hi, a);
            if first.is_none() {
                first = a;
            }
        }
        first
    }

    /// Connects two nodes with a bare monotone arc.
    pub(crate) fn add_arc(&mut self, n0: NodeId, n1: NodeId) -> ArcId {
        let (lo, hi) = if self.is_smaller(n0, n1) {
            (n0, n1)
        } else {
            (n1, n0)
        };
        self.add_path(&[lo, hi], None)
    }

    /// Inserts one labelled mesh edge between two ascending nodes, unless a
    /// path with that label already leaves the lower node.
    fn insert_edge(&mut self, lo: NodeId, hi: NodeId) -> LabelTag {
        let tag = LabelTag::Edge(self.node(lo).vertex, self.node(hi).vertex);
        if self.find_up_label(lo, tag).is_none() {
            self.add_path(&[lo, hi], Some(tag));
        }
        tag
    }

    /// Inserts a triangular face whose corners are already ascending, then
    /// merges its edge paths.
    fn add_face(&mut self, n0: NodeId, n1: NodeId, n2: NodeId) {
        let tag01 = self.insert_edge(n0, n1);
        let tag12 = self.insert_edge(n1, n2);
        let tag02 = self.insert_edge(n0, n2);
        self.collapse(n0, n1, tag01, tag02);
        self.collapse(n1, n2, tag12, tag02);
    }

    fn settle_pending(&mut self, vertices: &[u64]) {
        if !self.track_pending {
            return;
        }
        for &v in vertices {
            let done = match self.pending.get_mut(&v) {
                Some(count) => {
                    *count -= 1;
                    *count == 0
                }
                None => false,
            };
            if done {
                if let Some(&n) = self.vertex_nodes.get(&v) {
                    if self.node_live(n) && self.node(n).vertex == v {
                        self.end_vertex(n);
                    }
                }
            }
        }
    }

    /// Streams one triangle cell with per-corner scalar values.
    ///
    /// Unseen vertices are created on the fly; a vertex keeps the value of
    /// its first appearance. Fails with
    /// [`StreamClosed`](ReebGraphError::StreamClosed) after
    /// [`close_stream`](ReebGraph::close_stream).
    pub fn stream_triangle(
        &mut self,
        v0: u64,
        s0: f64,
        v1: u64,
        s1: f64,
        v2: u64,
        s2: f64,
    ) -> Result<(), ReebGraphError> {
        if self.closed {
            return Err(ReebGraphError::StreamClosed);
        }
        trace!("stream triangle ({v0}, {v1}, {v2})");
        let corners = [
            self.ensure_vertex(v0, s0),
            self.ensure_vertex(v1, s1),
            self.ensure_vertex(v2, s2),
        ];
        let sorted: Vec<NodeId> = corners
            .iter()
            .copied()
            .sorted_by(|&a, &b| self.node_cmp(a, b))
            .collect();
        self.add_face(sorted[0], sorted[1], sorted[2]);
        self.settle_pending(&[v0, v1, v2]);
        self.invalidate_loops();
        Ok(())
    }

    /// Streams one tetrahedral cell with per-corner scalar values.
    ///
    /// Three of the four faces suffice: the Reeb equivalence induced by them
    /// already identifies the level sets crossing the cell, so the fourth
    /// face would only repeat collapses.
    pub fn stream_tetrahedron(
        &mut self,
        v0: u64,
        s0: f64,
        v1: u64,
        s1: f64,
        v2: u64,
        s2: f64,
        v3: u64,
        s3: f64,
    ) -> Result<(), ReebGraphError> {
        if self.closed {
            return Err(ReebGraphError::StreamClosed);
        }
        trace!("stream tetrahedron ({v0}, {v1}, {v2}, {v3})");
        let corners = [
            self.ensure_vertex(v0, s0),
            self.ensure_vertex(v1, s1),
            self.ensure_vertex(v2, s2),
            self.ensure_vertex(v3, s3),
        ];
        let sorted: Vec<NodeId> = corners
            .iter()
            .copied()
            .sorted_by(|&a, &b| self.node_cmp(a, b))
            .collect();
        self.add_face(sorted[0], sorted[1], sorted[2]);
        self.add_face(sorted[0], sorted[1], sorted[3]);
        self.add_face(sorted[0], sorted[2], sorted[3]);
        self.settle_pending(&[v0, v1, v2, v3]);
        self.invalidate_loops();
        Ok(())
    }
}

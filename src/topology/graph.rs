//! `ReebGraph`: the engine root.
//!
//! Owns the three record pools, the vertex bookkeeping of the stream, the
//! running scalar range, the cancellation log and the published skeleton.
//! Mutation is spread over the sibling modules (`builder`, `collapse`,
//! `label`, the `simplify` family and `commit`); this module holds state,
//! ordering predicates, the intrusive arc-list operations and the read-only
//! query surface.

use hashbrown::HashMap;
use once_cell::sync::OnceCell;

use crate::arena::Pool;
use crate::commit::SkeletonGraph;
use crate::simplify::loops::LoopCensus;
use crate::topology::handles::{ArcId, LabelId, NodeId};
use crate::topology::records::{Arc, Cancellation, Label, Node};

/// A streaming Reeb graph over a scalar field on a simplicial mesh.
///
/// Build one with [`ReebGraph::new`], feed it cells through
/// [`stream_triangle`](ReebGraph::stream_triangle) /
/// [`stream_tetrahedron`](ReebGraph::stream_tetrahedron) (or the
/// [`build`](ReebGraph::build) driver), publish with
/// [`close_stream`](ReebGraph::close_stream), then optionally
/// [`simplify`](ReebGraph::simplify).
#[derive(Clone, Debug)]
pub struct ReebGraph {
    pub(crate) nodes: Pool<Node>,
    pub(crate) arcs: Pool<Arc>,
    pub(crate) labels: Pool<Label>,

    /// Mesh vertex id -> live node handle.
    pub(crate) vertex_nodes: HashMap<u64, NodeId>,
    /// Mesh vertex id -> scalar value, for re-sorting absorbed vertices.
    pub(crate) scalar_field: HashMap<u64, f64>,
    /// Remaining incident-cell count per vertex; populated by `build`, which
    /// sees the whole mesh up front. Raw streaming leaves this empty and all
    /// finalization happens in `close_stream`.
    pub(crate) pending: HashMap<u64, i64>,
    pub(crate) track_pending: bool,

    pub(crate) min_value: f64,
    pub(crate) max_value: f64,
    pub(crate) have_values: bool,

    pub(crate) removed_loops: usize,
    pub(crate) loop_census: OnceCell<LoopCensus>,
    pub(crate) cancellations: Vec<Cancellation>,
    pub(crate) skeleton: SkeletonGraph,
    pub(crate) closed: bool,
}

impl ReebGraph {
    pub fn new() -> Self {
        ReebGraph {
            nodes: Pool::new(),
            arcs: Pool::new(),
            labels: Pool::new(),
            vertex_nodes: HashMap::new(),
            scalar_field: HashMap::new(),
            pending: HashMap::new(),
            track_pending: false,
            min_value: 0.0,
            max_value: 0.0,
            have_values: false,
            removed_loops: 0,
            loop_census: OnceCell::new(),
            cancellations: Vec::new(),
            skeleton: SkeletonGraph::default(),
            closed: false,
        }
    }

    // ---- record access ------------------------------------------------

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.get()]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.get()]
    }

    #[inline]
    pub(crate) fn arc(&self, id: ArcId) -> &Arc {
        &self.arcs[id.get()]
    }

    #[inline]
    pub(crate) fn arc_mut(&mut self, id: ArcId) -> &mut Arc {
        &mut self.arcs[id.get()]
    }

    #[inline]
    pub(crate) fn label(&self, id: LabelId) -> &Label {
        &self.labels[id.get()]
    }

    #[inline]
    pub(crate) fn label_mut(&mut self, id: LabelId) -> &mut Label {
        &mut self.labels[id.get()]
    }

    #[inline]
    pub(crate) fn node_live(&self, id: NodeId) -> bool {
        self.nodes.contains(id.get())
    }

    #[inline]
    pub(crate) fn arc_live(&self, id: ArcId) -> bool {
        self.arcs.contains(id.get())
    }

    // ---- ordering predicates ------------------------------------------

    /// Total order on nodes: scalar value, ties broken by mesh vertex id.
    #[inline]
    pub(crate) fn is_smaller(&self, a: NodeId, b: NodeId) -> bool {
        let (na, nb) = (self.node(a), self.node(b));
        na.value < nb.value || (na.value == nb.value && na.vertex < nb.vertex)
    }

    #[inline]
    pub(crate) fn is_higher(&self, a: NodeId, b: NodeId) -> bool {
        let (na, nb) = (self.node(a), self.node(b));
        na.value > nb.value || (na.value == nb.value && na.vertex > nb.vertex)
    }

    /// A node is regular when it has exactly one down-arc and one up-arc and
    /// is not marked critical. Only meaningful once the node is finalized.
    pub(crate) fn is_regular(&self, id: NodeId) -> bool {
        let n = self.node(id);
        if n.critical {
            return false;
        }
        n.down_arcs.is_some()
            && self.arc(n.down_arcs).high_links.next.is_none()
            && n.up_arcs.is_some()
            && self.arc(n.up_arcs).low_links.next.is_none()
    }

    /// Normalized persistence of an arc: its scalar span over the global
    /// scalar range. Zero when the field is constant.
    pub(crate) fn arc_persistence(&self, id: ArcId) -> f64 {
        let a = self.arc(id);
        let span = self.max_value - self.min_value;
        if span == 0.0 {
            return 0.0;
        }
        (self.node(a.high).value - self.node(a.low).value) / span
    }

    // ---- intrusive arc lists ------------------------------------------

    /// Pushes `a` at the head of `n`'s up-list.
    pub(crate) fn add_up_arc(&mut self, n: NodeId, a: ArcId) {
        let head = self.node(n).up_arcs;
        {
            let arc = self.arc_mut(a);
            arc.low_links.prev = ArcId::NONE;
            arc.low_links.next = head;
        }
        if head.is_some() {
            self.arc_mut(head).low_links.prev = a;
        }
        self.node_mut(n).up_arcs = a;
    }

    /// Pushes `a` at the head of `n`'s down-list.
    pub(crate) fn add_down_arc(&mut self, n: NodeId, a: ArcId) {
        let head = self.node(n).down_arcs;
        {
            let arc = self.arc_mut(a);
            arc.high_links.prev = ArcId::NONE;
            arc.high_links.next = head;
        }
        if head.is_some() {
            self.arc_mut(head).high_links.prev = a;
        }
        self.node_mut(n).down_arcs = a;
    }

    /// Unlinks `a` from `n`'s up-list.
    pub(crate) fn remove_up_arc(&mut self, n: NodeId, a: ArcId) {
        let links = self.arc(a).low_links;
        if links.prev.is_some() {
            self.arc_mut(links.prev).low_links.next = links.next;
        } else {
            self.node_mut(n).up_arcs = links.next;
        }
        if links.next.is_some() {
            self.arc_mut(links.next).low_links.prev = links.prev;
        }
    }

    /// Unlinks `a` from `n`'s down-list.
    pub(crate) fn remove_down_arc(&mut self, n: NodeId, a: ArcId) {
        let links = self.arc(a).high_links;
        if links.prev.is_some() {
            self.arc_mut(links.prev).high_links.next = links.next;
        } else {
            self.node_mut(n).down_arcs = links.next;
        }
        if links.next.is_some() {
            self.arc_mut(links.next).high_links.prev = links.prev;
        }
    }

    pub(crate) fn down_degree(&self, n: NodeId) -> usize {
        let mut count = 0;
        let mut a = self.node(n).down_arcs;
        while a.is_some() {
            count += 1;
            a = self.arc(a).high_links.next;
        }
        count
    }

    pub(crate) fn up_degree(&self, n: NodeId) -> usize {
        let mut count = 0;
        let mut a = self.node(n).up_arcs;
        while a.is_some() {
            count += 1;
            a = self.arc(a).low_links.next;
        }
        count
    }

    pub(crate) fn release_node(&mut self, n: NodeId) {
        self.nodes.release(n.get());
        self.invalidate_loops();
    }

    pub(crate) fn release_arc(&mut self, a: ArcId) {
        self.arcs.release(a.get());
        self.invalidate_loops();
    }

    pub(crate) fn invalidate_loops(&mut self) {
        self.loop_census.take();
    }

    pub(crate) fn census(&self) -> &LoopCensus {
        self.loop_census.get_or_init(|| self.compute_loop_census())
    }

    // ---- query surface ------------------------------------------------

    /// Number of live nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live arcs.
    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }

    /// Number of independent cycles in the graph.
    pub fn num_loops(&self) -> usize {
        self.census().loop_arcs.len()
    }

    /// Number of connected components.
    pub fn num_connected_components(&self) -> usize {
        self.census().components
    }

    /// Loops removed by simplification since construction.
    pub fn num_removed_loops(&self) -> usize {
        self.removed_loops
    }

    /// Mesh vertex id of a node, or `None` for a dead handle.
    pub fn vertex_id(&self, n: NodeId) -> Option<u64> {
        self.nodes.get(n.get()).map(|node| node.vertex)
    }

    /// Scalar value of a node, or `None` for a dead handle.
    pub fn scalar_value(&self, n: NodeId) -> Option<f64> {
        self.nodes.get(n.get()).map(|node| node.value)
    }

    /// Lower endpoint of an arc, or `None` for a dead handle.
    pub fn low_node(&self, a: ArcId) -> Option<NodeId> {
        self.arcs.get(a.get()).map(|arc| arc.low)
    }

    /// Upper endpoint of an arc, or `None` for a dead handle.
    pub fn high_node(&self, a: ArcId) -> Option<NodeId> {
        self.arcs.get(a.get()).map(|arc| arc.high)
    }

    /// Forward/backward cursor over live node handles.
    pub fn node_ids(&self) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.nodes.iter_handles().map(NodeId::new)
    }

    /// Forward/backward cursor over live arc handles.
    pub fn arc_ids(&self) -> impl DoubleEndedIterator<Item = ArcId> + '_ {
        self.arcs.iter_handles().map(ArcId::new)
    }

    /// Collects the ids of the arcs entering `n` from below into `out`.
    pub fn node_down_arcs(&self, n: NodeId, out: &mut Vec<ArcId>) {
        out.clear();
        if !self.node_live(n) {
            return;
        }
        let mut a = self.node(n).down_arcs;
        while a.is_some() {
            out.push(a);
            a = self.arc(a).high_links.next;
        }
    }

    /// Collects the ids of the arcs leaving `n` upward into `out`.
    pub fn node_up_arcs(&self, n: NodeId, out: &mut Vec<ArcId>) {
        out.clear();
        if !self.node_live(n) {
            return;
        }
        let mut a = self.node(n).up_arcs;
        while a.is_some() {
            out.push(a);
            a = self.arc(a).low_links.next;
        }
    }

    /// The super-arc graph published by `close_stream` and updated by
    /// simplification commits.
    pub fn skeleton(&self) -> &SkeletonGraph {
        &self.skeleton
    }

    /// Global scalar range seen so far, `None` before any vertex streamed.
    pub fn scalar_range(&self) -> Option<(f64, f64)> {
        self.have_values.then_some((self.min_value, self.max_value))
    }

    // ---- consistency checks -------------------------------------------

    /// Asserts the structural invariants of the graph. Intended for tests;
    /// panics on violation.
    pub fn debug_validate(&self) {
        for a in self.arc_ids() {
            let arc = self.arc(a);
            assert!(self.node_live(arc.low), "arc {a} has dead low node");
            assert!(self.node_live(arc.high), "arc {a} has dead high node");
            assert!(
                !self.is_higher(arc.low, arc.high),
                "arc {a} violates low <= high ordering"
            );
        }
        let mut list = Vec::new();
        for n in self.node_ids() {
            self.node_down_arcs(n, &mut list);
            for &a in &list {
                assert!(self.arc_live(a), "down-list of node {n} holds dead arc {a}");
                assert_eq!(self.arc(a).high, n, "down-list of node {n} holds foreign arc {a}");
            }
            let down_listed = list.len();
            self.node_up_arcs(n, &mut list);
            for &a in &list {
                assert!(self.arc_live(a), "up-list of node {n} holds dead arc {a}");
                assert_eq!(self.arc(a).low, n, "up-list of node {n} holds foreign arc {a}");
            }
            let up_listed = list.len();

            let mut down_actual = 0;
            let mut up_actual = 0;
            for a in self.arc_ids() {
                if self.arc(a).high == n {
                    down_actual += 1;
                }
                if self.arc(a).low == n {
                    up_actual += 1;
                }
            }
            assert_eq!(down_listed, down_actual, "node {n} down-list incomplete");
            assert_eq!(up_listed, up_actual, "node {n} up-list incomplete");
        }
    }
}

impl Default for ReebGraph {
    fn default() -> Self {
        ReebGraph::new()
    }
}

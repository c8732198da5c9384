//! Path merging: the collapse engine.
//!
//! `collapse` walks two labelled monotone paths that share both endpoints and
//! merges them arc by arc, which is exactly the Reeb identification of level
//! sets crossing one cell. `vertex_collapse` removes a finalized regular node
//! by fusing its single down-arc with its single up-arc. Both feed the
//! cancellation log so a later commit can remap published super-arcs.

use crate::topology::graph::ReebGraph;
use crate::topology::handles::{ArcId, LabelId, NodeId};
use crate::topology::records::{Cancellation, LabelTag};

impl ReebGraph {
    /// Declares that every cell incident to this node has been streamed.
    /// Prunes label chains pinned at the node and, if the node turned out
    /// regular, removes it.
    pub(crate) fn end_vertex(&mut self, n: NodeId) {
        if !self.node_live(n) {
            return;
        }
        self.node_mut(n).finalized = true;
        self.simplify_labels(n, None, true, true);
        if self.node_live(n) && self.is_regular(n) {
            self.vertex_collapse(n);
        }
    }

    /// Records the removal of a regular node as a cancellation: its two
    /// incident arcs disappear, one spanning arc takes their place.
    pub(crate) fn log_vertex_collapse(&mut self, n: NodeId) {
        let up = self.node(n).up_arcs;
        let down = self.node(n).down_arcs;
        let pair = |g: &ReebGraph, a: ArcId| {
            let arc = g.arc(a);
            (g.node(arc.low).vertex, g.node(arc.high).vertex)
        };
        let removed = vec![pair(self, up), pair(self, down)];
        let inserted = vec![(
            self.node(self.arc(down).low).vertex,
            self.node(self.arc(up).high).vertex,
        )];
        self.cancellations.push(Cancellation { removed, inserted });
    }

    /// Fuses the single down-arc and single up-arc of a regular node. The
    /// down-arc survives and inherits the up-arc's high endpoint and list
    /// position; the up-arc's labels are spliced out of their chains.
    ///
    /// Caller guarantees `is_regular(n)`.
    pub(crate) fn vertex_collapse(&mut self, n: NodeId) {
        let a0 = self.node(n).down_arcs;
        let a1 = self.node(n).up_arcs;
        debug_assert!(a0.is_some() && a1.is_some());

        let (high, high_links, labels) = {
            let arc1 = self.arc(a1);
            (arc1.high, arc1.high_links, arc1.label_head)
        };
        {
            let arc0 = self.arc_mut(a0);
            arc0.high = high;
            arc0.high_links = high_links;
        }
        if high_links.prev.is_some() {
            self.arc_mut(high_links.prev).high_links.next = a0;
        }
        if high_links.next.is_some() {
            self.arc_mut(high_links.next).high_links.prev = a0;
        }
        if self.node(high).down_arcs == a1 {
            self.node_mut(high).down_arcs = a0;
        }

        // Chains running through the dying arc skip straight over it.
        let mut l = labels;
        while l.is_some() {
            let (vprev, vnext, hnext) = {
                let label = self.label(l);
                (label.v.prev, label.v.next, label.h.next)
            };
            if vprev.is_some() {
                self.label_mut(vprev).v.next = vnext;
            }
            if vnext.is_some() {
                self.label_mut(vnext).v.prev = vprev;
            }
            self.labels.release(l.get());
            l = hnext;
        }

        self.release_arc(a1);
        self.release_node(n);
    }

    /// Merges the `tag_start` path and the `tag_end` path between `start`
    /// and `end`, arc by arc from the bottom. Interior nodes that become
    /// finalized regular nodes along the way are removed immediately.
    pub(crate) fn collapse(
        &mut self,
        start: NodeId,
        end: NodeId,
        tag_start: LabelTag,
        tag_end: LabelTag,
    ) {
        if start == end {
            return;
        }
        let (start, end) = if self.is_smaller(start, end) {
            (start, end)
        } else {
            (end, start)
        };
        let mut l0 = self.find_up_label(start, tag_start);
        let mut l1 = self.find_up_label(start, tag_end);
        if l0.is_none() || l1.is_none() {
            return;
        }

        loop {
            let mut a0 = self.label(l0).arc;
            let mut a1 = self.label(l1).arc;
            let l0n;
            let l1n;

            if a0 == a1 {
                // The paths already share this arc.
                l0n = self.label(l0).v.next;
                l1n = self.label(l1).v.next;
            } else if self.arc(a0).high == self.arc(a1).high {
                // Parallel arcs with equal endpoints merge into one.
                let low = self.arc(a0).low;
                let high = self.arc(a0).high;
                self.remove_up_arc(low, a1);
                self.remove_down_arc(high, a1);

                let head1 = self.arc(a1).label_head;
                let tail1 = self.arc(a1).label_tail;
                let mut l = head1;
                while l.is_some() {
                    self.label_mut(l).arc = a0;
                    l = self.label(l).h.next;
                }
                let tail0 = self.arc(a0).label_tail;
                debug_assert!(tail0.is_some() && head1.is_some());
                self.label_mut(head1).h.prev = tail0;
                self.label_mut(tail0).h.next = head1;
                self.arc_mut(a0).label_tail = tail1;
                {
                    let arc1 = self.arc_mut(a1);
                    arc1.label_head = LabelId::NONE;
                    arc1.label_tail = LabelId::NONE;
                }
                self.release_arc(a1);

                l0n = self.label(l0).v.next;
                l1n = self.label(l1).v.next;
            } else {
                // The paths branch apart. Log the rewrite with the arcs as
                // they stand, then reroute the farther-reaching arc through
                // the nearer arc's high endpoint.
                let d0 = self.node(self.arc(a0).low).vertex;
                let u0 = self.node(self.arc(a0).high).vertex;
                let u1 = self.node(self.arc(a1).high).vertex;
                self.cancellations.push(Cancellation {
                    removed: vec![(d0, u1)],
                    inserted: vec![(d0, u0), (u0, u1)],
                });

                if !self.is_smaller(self.arc(a0).high, self.arc(a1).high) {
                    std::mem::swap(&mut a0, &mut a1);
                    std::mem::swap(&mut l0, &mut l1);
                }
                let low = self.arc(a0).low;
                let mid = self.arc(a0).high;
                self.remove_up_arc(low, a1);
                self.arc_mut(a1).low = mid;
                self.add_up_arc(mid, a1);

                // Every chain crossing the rerouted arc gets a twin label on
                // the nearer arc so it still runs gap-free from below.
                let mut lcur = self.arc(a1).label_head;
                while lcur.is_some() {
                    let lnew = LabelId::new(self.labels.allocate());
                    let (tag, vprev) = {
                        let c = self.label(lcur);
                        (c.tag, c.v.prev)
                    };
                    {
                        let rec = self.label_mut(lnew);
                        rec.arc = a0;
                        rec.tag = tag;
                        rec.h.clear();
                        rec.v.prev = vprev;
                        rec.v.next = lcur;
                    }
                    if vprev.is_some() {
                        self.label_mut(vprev).v.next = lnew;
                    }
                    self.label_mut(lcur).v.prev = lnew;
                    let tail0 = self.arc(a0).label_tail;
                    self.label_mut(lnew).h.prev = tail0;
                    if tail0.is_some() {
                        self.label_mut(tail0).h.next = lnew;
                    } else {
                        self.arc_mut(a0).label_head = lnew;
                    }
                    self.arc_mut(a0).label_tail = lnew;
                    lcur = self.label(lcur).h.next;
                }

                l0n = self.label(l0).v.next;
                l1n = l1;
            }

            // `a0` may die below if its low node collapses; keep the high
            // endpoint before that can happen.
            let n0 = self.arc(a0).low;
            let a0_high = self.arc(a0).high;
            if self.node(n0).finalized && self.is_regular(n0) {
                self.log_vertex_collapse(n0);
                self.vertex_collapse(n0);
            }
            if a0_high == end {
                if self.node(end).finalized && self.is_regular(end) {
                    self.log_vertex_collapse(end);
                    self.vertex_collapse(end);
                }
                return;
            }
            l0 = l0n;
            l1 = l1n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_vertex_removes_regular_node() {
        let mut g = ReebGraph::new();
        let a = g.add_vertex(0, 0.0);
        let b = g.add_vertex(1, 1.0);
        let c = g.add_vertex(2, 2.0);
        g.add_path(&[a, b, c], Some(LabelTag::Edge(0, 2)));
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.num_arcs(), 2);

        g.end_vertex(b);
        assert_eq!(g.num_nodes(), 2);
        assert_eq!(g.num_arcs(), 1);
        let arc = g.arc_ids().next().unwrap();
        assert_eq!(g.low_node(arc), Some(a));
        assert_eq!(g.high_node(arc), Some(c));
        // The dying up-arc's label is gone; the survivor's chain now ends
        // on the fused arc.
        assert_eq!(g.labels.len(), 1);
        let l = g.arc(arc).label_head;
        assert!(l.is_some());
        assert!(g.label(l).v.next.is_none());
        g.debug_validate();
    }

    #[test]
    fn end_vertex_keeps_critical_nodes() {
        let mut g = ReebGraph::new();
        let a = g.add_vertex(0, 0.0);
        let b = g.add_vertex(1, 1.0);
        let c = g.add_vertex(2, 2.0);
        g.add_path(&[a, b, c], None);
        g.node_mut(b).critical = true;

        g.end_vertex(b);
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.num_arcs(), 2);
    }

    #[test]
    fn collapse_merges_parallel_paths() {
        let mut g = ReebGraph::new();
        let a = g.add_vertex(0, 0.0);
        let b = g.add_vertex(1, 1.0);
        let t0 = LabelTag::Edge(0, 1);
        let t1 = LabelTag::Edge(10, 11);
        g.add_path(&[a, b], Some(t0));
        g.add_path(&[a, b], Some(t1));
        assert_eq!(g.num_arcs(), 2);

        g.collapse(a, b, t0, t1);
        assert_eq!(g.num_arcs(), 1);
        let arc = g.arc_ids().next().unwrap();
        // The surviving arc carries both path labels.
        let mut tags = Vec::new();
        let mut l = g.arc(arc).label_head;
        while l.is_some() {
            tags.push(g.label(l).tag);
            l = g.label(l).h.next;
        }
        assert_eq!(tags, vec![t0, t1]);
        g.debug_validate();
    }

    #[test]
    fn collapse_reroutes_branching_path_and_logs_it() {
        let mut g = ReebGraph::new();
        let a = g.add_vertex(0, 0.0);
        let b = g.add_vertex(1, 1.0);
        let c = g.add_vertex(2, 2.0);
        let short = LabelTag::Edge(0, 1);
        let long = LabelTag::Edge(0, 2);
        g.add_path(&[a, b], Some(short));
        g.add_path(&[a, c], Some(long));

        g.collapse(a, b, short, long);
        // The a->c arc now runs b->c; the long chain gained a twin on a->b.
        assert_eq!(g.num_arcs(), 2);
        assert_eq!(g.up_degree(b), 1);
        assert_eq!(g.down_degree(b), 1);
        assert_eq!(g.cancellations.len(), 1);
        assert_eq!(g.cancellations[0].removed, vec![(0, 2)]);
        assert_eq!(g.cancellations[0].inserted, vec![(0, 1), (1, 2)]);
        g.debug_validate();
    }

    #[test]
    fn collapse_with_missing_chain_is_a_no_op() {
        let mut g = ReebGraph::new();
        let a = g.add_vertex(0, 0.0);
        let b = g.add_vertex(1, 1.0);
        g.add_path(&[a, b], Some(LabelTag::Edge(0, 1)));
        g.collapse(a, b, LabelTag::Edge(0, 1), LabelTag::Edge(7, 8));
        assert_eq!(g.num_arcs(), 1);
    }
}

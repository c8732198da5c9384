//! Branch cancellation: removal of low-persistence leaf branches.
//!
//! A candidate is an arc hanging off a minimum or maximum whose score falls
//! under the threshold. Cancelling one reroutes the branch onto a longer
//! monotone path found elsewhere in the graph (located with the transient
//! route labels), then lets the collapse engine merge the two paths. The
//! worklist reseeds itself from nodes that became extrema and repeats until
//! a fixed point.

use crate::simplify::metric::SimplificationMetric;
use crate::topology::graph::ReebGraph;
use crate::topology::handles::{ArcId, NodeId};
use crate::topology::records::LabelTag;

impl ReebGraph {
    /// Walks up from `n` along label-free finalized arcs until it reaches a
    /// node strictly above `start`. Marks the traversed arcs with `tag`.
    pub(crate) fn find_greater(
        &mut self,
        n: NodeId,
        start: NodeId,
        tag: Option<LabelTag>,
    ) -> Option<NodeId> {
        if !self.node(n).finalized {
            return None;
        }
        if self.is_higher(n, start) {
            return Some(n);
        }
        let mut arcs = Vec::new();
        self.node_up_arcs(n, &mut arcs);
        for a in arcs {
            let m = self.arc(a).high;
            if self.arc(a).label_head.is_some() || !self.node(m).finalized {
                continue;
            }
            if let Some(found) = self.find_greater(m, start, tag) {
                if let Some(t) = tag {
                    self.attach_label(a, t);
                }
                return Some(found);
            }
        }
        None
    }

    /// Mirror of [`find_greater`](ReebGraph::find_greater): walks down until
    /// a node strictly below `start`.
    pub(crate) fn find_less(
        &mut self,
        n: NodeId,
        start: NodeId,
        tag: Option<LabelTag>,
    ) -> Option<NodeId> {
        if !self.node(n).finalized {
            return None;
        }
        if self.is_smaller(n, start) {
            return Some(n);
        }
        let mut arcs = Vec::new();
        self.node_down_arcs(n, &mut arcs);
        for a in arcs {
            let m = self.arc(a).low;
            if self.arc(a).label_head.is_some() || !self.node(m).finalized {
                continue;
            }
            if let Some(found) = self.find_less(m, start, tag) {
                if let Some(t) = tag {
                    self.attach_label(a, t);
                }
                return Some(found);
            }
        }
        None
    }

    /// Descends from `a` through single-path label-free arcs to the first
    /// node where paths merge from below, tagging the descent with `tag`.
    pub(crate) fn find_join_node(
        &mut self,
        a: ArcId,
        tag: LabelTag,
        one_path_only: bool,
    ) -> Option<NodeId> {
        let n = self.arc(a).high;
        if self.arc(a).label_head.is_some() || !self.node(n).finalized {
            return None;
        }
        if one_path_only
            && (self.arc(a).low_links.prev.is_some() || self.arc(a).low_links.next.is_some())
        {
            return None;
        }
        // Siblings in the high node's down-list mean paths join here.
        if self.arc(a).high_links.prev.is_some() || self.arc(a).high_links.next.is_some() {
            self.attach_label(a, tag);
            return Some(n);
        }
        let mut up = Vec::new();
        self.node_up_arcs(n, &mut up);
        for c in up {
            if let Some(found) = self.find_join_node(c, tag, one_path_only) {
                self.attach_label(a, tag);
                return Some(found);
            }
        }
        None
    }

    /// Mirror of [`find_join_node`](ReebGraph::find_join_node): ascends to
    /// the first node where paths split.
    pub(crate) fn find_split_node(
        &mut self,
        a: ArcId,
        tag: LabelTag,
        one_path_only: bool,
    ) -> Option<NodeId> {
        let n = self.arc(a).low;
        if self.arc(a).label_head.is_some() || !self.node(n).finalized {
            return None;
        }
        if one_path_only
            && (self.arc(a).high_links.prev.is_some() || self.arc(a).high_links.next.is_some())
        {
            return None;
        }
        if self.arc(a).low_links.prev.is_some() || self.arc(a).low_links.next.is_some() {
            self.attach_label(a, tag);
            return Some(n);
        }
        let mut down = Vec::new();
        self.node_down_arcs(n, &mut down);
        for c in down {
            if let Some(found) = self.find_split_node(c, tag, one_path_only) {
                self.attach_label(a, tag);
                return Some(found);
            }
        }
        None
    }

    fn push_candidates(
        &self,
        arcs: &[ArcId],
        threshold: f64,
        metric: Option<&dyn SimplificationMetric>,
        stack: &mut Vec<ArcId>,
    ) {
        for &a in arcs {
            if self.arc_metric(a, metric) < threshold {
                stack.push(a);
            }
        }
    }

    /// Cancels leaf branches scoring under `threshold` until no candidate
    /// remains. Returns the number of cancellations.
    pub(crate) fn simplify_branches(
        &mut self,
        threshold: f64,
        metric: Option<&dyn SimplificationMetric>,
    ) -> usize {
        if threshold == 0.0 {
            return 0;
        }
        let mut nsimp = 0;
        let mut arcs = Vec::new();
        loop {
            let mut redo = false;
            let mut stack: Vec<ArcId> = Vec::new();

            // Seed with every arc hanging off an extremum; drop nodes that
            // lost all their arcs in an earlier round.
            for n in self.node_ids().collect::<Vec<_>>() {
                if !self.node_live(n) {
                    continue;
                }
                let (down, up) = {
                    let node = self.node(n);
                    (node.down_arcs, node.up_arcs)
                };
                if down.is_none() && up.is_none() {
                    self.release_node(n);
                } else if down.is_none() {
                    self.node_up_arcs(n, &mut arcs);
                    self.push_candidates(&arcs, threshold, metric, &mut stack);
                } else if up.is_none() {
                    self.node_down_arcs(n, &mut arcs);
                    self.push_candidates(&arcs, threshold, metric, &mut stack);
                }
            }

            while let Some(a) = stack.pop() {
                if !self.arc_live(a) {
                    continue;
                }
                let n = self.arc(a).low;
                let m = self.arc(a).high;
                // Only arcs still touching an extremum qualify.
                if self.node(n).down_arcs.is_some() && self.node(m).up_arcs.is_some() {
                    continue;
                }
                if self.arc_metric(a, metric) >= threshold {
                    continue;
                }

                let m_down = self.down_degree(m);
                let n_up = self.up_degree(n);
                let n_down = self.down_degree(n);
                let m_up = self.up_degree(m);

                // A free-floating arc just disappears.
                if n_down == 0 && n_up == 1 && m_down == 1 && m_up == 0 {
                    self.remove_up_arc(n, a);
                    self.remove_down_arc(m, a);
                    self.release_arc(a);
                    if self.node_live(n) && self.is_regular(n) {
                        self.end_vertex(n);
                    }
                    if self.node_live(m) && self.is_regular(m) {
                        self.end_vertex(m);
                    }
                    nsimp += 1;
                    redo = true;
                    continue;
                }

                let mut down = NodeId::NONE;
                let mut up = NodeId::NONE;
                let mut simplified = false;

                // Branch ending in a maximum: reroute it onto a path that
                // keeps climbing past it.
                if m_up == 0 {
                    if let Some(d) = self.find_split_node(a, LabelTag::RouteOld, false) {
                        down = d;
                        if let Some(u) = self.find_greater(d, m, Some(LabelTag::RouteNew)) {
                            up = u;
                            let bridge = self.add_arc(m, u);
                            self.attach_label(bridge, LabelTag::RouteOld);
                            self.collapse(d, u, LabelTag::RouteOld, LabelTag::RouteNew);
                            simplified = true;
                        } else {
                            self.simplify_labels(d, None, true, true);
                        }
                    }
                }

                // Branch ending in a minimum, symmetric.
                if !simplified && n_down == 0 {
                    if let Some(u) = self.find_join_node(a, LabelTag::RouteOld, false) {
                        up = u;
                        if let Some(d) = self.find_less(u, n, Some(LabelTag::RouteNew)) {
                            down = d;
                            let bridge = self.add_arc(d, n);
                            self.attach_label(bridge, LabelTag::RouteOld);
                            self.collapse(d, u, LabelTag::RouteOld, LabelTag::RouteNew);
                            simplified = true;
                        } else {
                            self.simplify_labels(u, None, true, true);
                        }
                    }
                }

                if simplified {
                    if self.node_live(down) {
                        self.simplify_labels(down, None, true, true);
                        if self.node_live(down) && self.node(down).down_arcs.is_none() {
                            self.node_up_arcs(down, &mut arcs);
                            self.push_candidates(&arcs, threshold, metric, &mut stack);
                        }
                    }
                    if self.node_live(up) {
                        self.simplify_labels(up, None, true, true);
                        if self.node_live(up) && self.node(up).up_arcs.is_none() {
                            self.node_down_arcs(up, &mut arcs);
                            self.push_candidates(&arcs, threshold, metric, &mut stack);
                        }
                    }
                    nsimp += 1;
                    redo = true;
                }
            }

            if !redo {
                break;
            }
        }
        nsimp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A main path with a short spur hanging off its middle.
    fn spur_graph() -> (ReebGraph, NodeId, NodeId) {
        let mut g = ReebGraph::new();
        let a = g.add_vertex(0, 0.0);
        let b = g.add_vertex(1, 0.5);
        let c = g.add_vertex(2, 0.55);
        let d = g.add_vertex(3, 1.0);
        g.add_path(&[a, b], None);
        g.add_path(&[b, c], None);
        g.add_path(&[b, d], None);
        for n in [a, b, c, d] {
            g.node_mut(n).finalized = true;
        }
        (g, a, d)
    }

    #[test]
    fn low_persistence_spur_is_cancelled() {
        let (mut g, a, d) = spur_graph();
        let removed = g.simplify_branches(0.1, None);
        assert_eq!(removed, 1);
        assert_eq!(g.num_nodes(), 2);
        assert_eq!(g.num_arcs(), 1);
        let arc = g.arc_ids().next().unwrap();
        assert_eq!(g.low_node(arc), Some(a));
        assert_eq!(g.high_node(arc), Some(d));
        g.debug_validate();
    }

    #[test]
    fn spur_above_threshold_survives() {
        let (mut g, _, _) = spur_graph();
        assert_eq!(g.simplify_branches(0.01, None), 0);
        assert_eq!(g.num_nodes(), 4);
        assert_eq!(g.num_arcs(), 3);
    }

    #[test]
    fn rejecting_metric_blocks_cancellation() {
        struct KeepAll;
        impl SimplificationMetric for KeepAll {
            fn persistence(&self, _: &ReebGraph, _: u64, _: u64, _: &[u64]) -> f64 {
                1.0
            }
        }
        let (mut g, _, _) = spur_graph();
        assert_eq!(g.simplify_branches(0.9, Some(&KeepAll)), 0);
        assert_eq!(g.num_arcs(), 3);
    }

    #[test]
    fn free_floating_arc_is_dropped() {
        let mut g = ReebGraph::new();
        let a = g.add_vertex(0, 0.0);
        let b = g.add_vertex(1, 0.01);
        let c = g.add_vertex(2, 0.0);
        let d = g.add_vertex(3, 1.0);
        g.add_path(&[a, b], None);
        g.add_path(&[c, d], None);
        for n in [a, b, c, d] {
            g.node_mut(n).finalized = true;
        }
        assert_eq!(g.simplify_branches(0.1, None), 1);
        // The tiny component is gone, arc first and orphan nodes on the
        // next seeding round.
        assert_eq!(g.num_arcs(), 1);
        assert_eq!(g.num_nodes(), 2);
        g.debug_validate();
    }
}

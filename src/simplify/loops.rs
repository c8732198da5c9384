//! Loop cancellation and the loop/component census.
//!
//! A spanning traversal marks one arc per independent cycle; those arcs are
//! the loop candidates. Cancelling a loop means checking that some alternate
//! path between the arc's endpoints is also cheap, then deleting the arc and
//! letting the cleanup pass absorb the regular nodes left behind.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::trace;

use crate::simplify::metric::SimplificationMetric;
use crate::topology::graph::ReebGraph;
use crate::topology::handles::{ArcId, NodeId};
use crate::topology::records::Cancellation;

/// Result of one spanning traversal: the arcs closing a cycle and the number
/// of connected components. Recomputed lazily after any structural change.
#[derive(Clone, Debug, Default)]
pub struct LoopCensus {
    pub loop_arcs: Vec<ArcId>,
    pub components: usize,
}

/// One frontier entry of the alternate-path search. Ordered so that the
/// binary heap pops the cheapest path first, shortest and lowest-terminal
/// on ties.
pub(crate) struct PathEntry {
    pub(crate) value: f64,
    pub(crate) arcs: Vec<ArcId>,
    pub(crate) nodes: Vec<NodeId>,
}

impl PartialEq for PathEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PathEntry {}

impl PartialOrd for PathEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .value
            .total_cmp(&self.value)
            .then(other.arcs.len().cmp(&self.arcs.len()))
            .then(other.nodes.last().cmp(&self.nodes.last()))
    }
}

impl ReebGraph {
    /// Walks every component, marking nodes and arcs; an arc reaching an
    /// already-visited node closes a cycle.
    pub(crate) fn compute_loop_census(&self) -> LoopCensus {
        let mut node_seen = vec![false; self.nodes.capacity()];
        let mut arc_seen = vec![false; self.arcs.capacity()];
        let mut census = LoopCensus::default();
        let mut incident = Vec::new();
        let mut stack = Vec::new();

        for root in self.node_ids() {
            if node_seen[root.get() as usize] {
                continue;
            }
            census.components += 1;
            node_seen[root.get() as usize] = true;
            stack.push(root);
            while let Some(n) = stack.pop() {
                for direction in 0..2 {
                    if direction == 0 {
                        self.node_down_arcs(n, &mut incident);
                    } else {
                        self.node_up_arcs(n, &mut incident);
                    }
                    for &a in &incident {
                        if arc_seen[a.get() as usize] {
                            continue;
                        }
                        arc_seen[a.get() as usize] = true;
                        let arc = self.arc(a);
                        let m = if direction == 0 { arc.low } else { arc.high };
                        if node_seen[m.get() as usize] {
                            census.loop_arcs.push(a);
                        } else {
                            node_seen[m.get() as usize] = true;
                            stack.push(m);
                        }
                    }
                }
            }
        }
        census
    }

    /// Cheapest path between the endpoints of `around` that avoids the arc
    /// itself, with the arc's own score folded in. `None` when every path
    /// exceeds `threshold`.
    pub(crate) fn find_path(
        &self,
        around: ArcId,
        threshold: f64,
        metric: Option<&dyn SimplificationMetric>,
    ) -> Option<PathEntry> {
        let n0 = self.arc(around).low;
        let n1 = self.arc(around).high;
        let start_value = self.arc_metric(around, metric);
        if threshold != 0.0 && start_value >= threshold {
            return None;
        }

        let mut node_seen = vec![false; self.nodes.capacity()];
        let mut arc_seen = vec![false; self.arcs.capacity()];
        node_seen[n0.get() as usize] = true;
        arc_seen[around.get() as usize] = true;

        let mut heap = BinaryHeap::new();
        heap.push(PathEntry {
            value: start_value,
            arcs: Vec::new(),
            nodes: vec![n0],
        });

        let mut incident = Vec::new();
        while let Some(entry) = heap.pop() {
            let n = *entry.nodes.last()?;
            for direction in 0..2 {
                if direction == 0 {
                    self.node_down_arcs(n, &mut incident);
                } else {
                    self.node_up_arcs(n, &mut incident);
                }
                for &a in &incident {
                    if arc_seen[a.get() as usize] {
                        continue;
                    }
                    arc_seen[a.get() as usize] = true;
                    let m = if direction == 0 {
                        self.arc(a).low
                    } else {
                        self.arc(a).high
                    };
                    if node_seen[m.get() as usize] {
                        continue;
                    }
                    node_seen[m.get() as usize] = true;

                    if m == n1 {
                        let mut nodes = entry.nodes.clone();
                        nodes.push(n1);
                        return Some(PathEntry {
                            value: entry.value,
                            arcs: entry.arcs.clone(),
                            nodes,
                        });
                    }

                    let value = entry.value + self.arc_metric(a, metric);
                    if threshold != 0.0 && value >= threshold {
                        continue;
                    }
                    let mut arcs = entry.arcs.clone();
                    arcs.push(a);
                    let mut nodes = entry.nodes.clone();
                    nodes.push(m);
                    heap.push(PathEntry { value, arcs, nodes });
                }
            }
        }
        None
    }

    /// Deletes a loop-closing arc, logging one cancellation per neighbor it
    /// shares an endpoint list with so the commit pass can redistribute the
    /// arc's segment.
    pub(crate) fn fast_arc_simplify(&mut self, a: ArcId) {
        let (low, high) = {
            let arc = self.arc(a);
            (arc.low, arc.high)
        };
        let lv = self.node(low).vertex;
        let hv = self.node(high).vertex;

        let sibling = |g: &ReebGraph, b: ArcId| {
            let arc = g.arc(b);
            (g.node(arc.low).vertex, g.node(arc.high).vertex)
        };

        let links = (self.arc(a).low_links, self.arc(a).high_links);
        if links.0.next.is_some() {
            let (blv, bhv) = sibling(self, links.0.next);
            self.cancellations.push(Cancellation {
                removed: vec![(lv, bhv)],
                inserted: vec![(blv, bhv)],
            });
        }
        if links.1.next.is_some() {
            let (blv, _) = sibling(self, links.1.next);
            self.cancellations.push(Cancellation {
                removed: vec![(lv, hv)],
                inserted: vec![(blv, hv)],
            });
        }
        if links.0.prev.is_some() {
            let (_, bhv) = sibling(self, links.0.prev);
            self.cancellations.push(Cancellation {
                removed: vec![(lv, hv)],
                inserted: vec![(lv, bhv)],
            });
        }
        if links.1.prev.is_some() {
            let (blv, bhv) = sibling(self, links.1.prev);
            self.cancellations.push(Cancellation {
                removed: vec![(blv, hv)],
                inserted: vec![(blv, bhv)],
            });
        }

        self.remove_up_arc(low, a);
        self.remove_down_arc(high, a);
        self.release_arc(a);
    }

    /// Cancels loops scoring under `threshold`, then absorbs the regular
    /// nodes the removals exposed. Returns the number of cancelled loops.
    pub(crate) fn simplify_loops(
        &mut self,
        threshold: f64,
        metric: Option<&dyn SimplificationMetric>,
    ) -> usize {
        if threshold == 0.0 {
            return 0;
        }
        self.invalidate_loops();
        let candidates = self.census().loop_arcs.clone();
        let mut removed = 0;

        for a in candidates {
            if !self.arc_live(a) {
                continue;
            }
            if self.arc_metric(a, metric) >= threshold {
                continue;
            }
            let Some(path) = self.find_path(a, threshold, metric) else {
                continue;
            };
            if path.value >= threshold {
                continue;
            }
            trace!(
                "cancelling loop arc {a} via an alternate path of {} arcs",
                path.arcs.len() + 1
            );
            self.fast_arc_simplify(a);
            removed += 1;
        }

        // Cleanup: drop stranded nodes, absorb the newly regular ones.
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
            } else if self.is_regular(n) {
                let d = self.node(self.arc(down).low).vertex;
                let middle = self.node(n).vertex;
                let u = self.node(self.arc(up).high).vertex;
                self.cancellations.push(Cancellation {
                    removed: vec![(d, middle), (middle, u)],
                    inserted: vec![(d, u)],
                });
                self.end_vertex(n);
            }
        }

        self.removed_loops += removed;
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A theta graph: two monotone strands between `a` and `d`, plus a tall
    /// mast above `d` that stretches the global scalar range.
    fn theta_graph() -> ReebGraph {
        let mut g = ReebGraph::new();
        let a = g.add_vertex(0, 0.0);
        let b = g.add_vertex(1, 1.0);
        let c = g.add_vertex(2, 1.5);
        let d = g.add_vertex(3, 3.0);
        let top = g.add_vertex(4, 30.0);
        g.add_path(&[a, b, d], None);
        g.add_path(&[a, c, d], None);
        g.add_path(&[d, top], None);
        for n in [a, b, c, d, top] {
            g.node_mut(n).finalized = true;
        }
        g
    }

    #[test]
    fn census_counts_loops_and_components() {
        let mut g = theta_graph();
        assert_eq!(g.num_loops(), 1);
        assert_eq!(g.num_connected_components(), 1);

        let e = g.add_vertex(10, 5.0);
        let f = g.add_vertex(11, 6.0);
        g.add_path(&[e, f], None);
        g.invalidate_loops();
        assert_eq!(g.num_loops(), 1);
        assert_eq!(g.num_connected_components(), 2);
    }

    #[test]
    fn find_path_routes_around_the_arc() {
        let g = theta_graph();
        let census = g.compute_loop_census();
        assert_eq!(census.loop_arcs.len(), 1);
        let around = census.loop_arcs[0];
        let path = g.find_path(around, 0.5, None).unwrap();
        // Alternate strand: own score plus the other side of the theta.
        assert!(path.value < 0.5);
        assert!(path.nodes.len() >= 3);
        assert_eq!(path.nodes.last().copied(), g.high_node(around));
    }

    #[test]
    fn find_path_gives_up_over_threshold() {
        let g = theta_graph();
        let census = g.compute_loop_census();
        let around = census.loop_arcs[0];
        assert!(g.find_path(around, 0.02, None).is_none());
    }

    #[test]
    fn cheap_loop_is_cancelled_and_cleaned_up() {
        let mut g = theta_graph();
        assert_eq!(g.simplify_loops(0.5, None), 1);
        assert_eq!(g.num_loops(), 0);
        assert_eq!(g.num_removed_loops(), 1);
        assert_eq!(g.num_connected_components(), 1);
        g.debug_validate();
    }

    #[test]
    fn expensive_loop_survives() {
        let mut g = theta_graph();
        assert_eq!(g.simplify_loops(0.01, None), 0);
        assert_eq!(g.num_loops(), 1);
        assert_eq!(g.num_removed_loops(), 0);
    }
}

//! Skeleton publication: `close_stream` and simplification commits.
//!
//! The published [`SkeletonGraph`] is the outward face of the engine: a
//! plain super-arc graph where each maximal run of regular nodes between two
//! critical nodes is one arc carrying the ordered interior vertex list.
//! `close_stream` publishes it the first time; `commit_simplification`
//! replays the cancellation log to remap every published super-arc onto its
//! surviving destination and republishes.

use std::collections::BTreeMap;
use std::fmt;

use hashbrown::{HashMap, HashSet};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::topology::graph::ReebGraph;

/// One published node, a critical or surviving mesh vertex.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkeletonNode {
    pub vertex: u64,
}

/// One super-arc: endpoints index into [`SkeletonGraph::nodes`], `interior`
/// lists the absorbed regular vertices in ascending scalar order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkeletonArc {
    pub low: usize,
    pub high: usize,
    pub interior: Vec<u64>,
}

/// The super-arc graph published by [`ReebGraph::close_stream`] and
/// refreshed by each simplification commit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkeletonGraph {
    pub nodes: Vec<SkeletonNode>,
    pub arcs: Vec<SkeletonArc>,
}

impl SkeletonGraph {
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Endpoint mesh vertices of a super-arc.
    pub fn arc_endpoints(&self, arc: &SkeletonArc) -> (u64, u64) {
        (self.nodes[arc.low].vertex, self.nodes[arc.high].vertex)
    }

    /// Interior vertex list of the super-arc running from `low_vertex` to
    /// `high_vertex`, if published.
    pub fn arc_interior(&self, low_vertex: u64, high_vertex: u64) -> Option<&[u64]> {
        self.arcs
            .iter()
            .find(|a| self.arc_endpoints(a) == (low_vertex, high_vertex))
            .map(|a| a.interior.as_slice())
    }
}

impl fmt::Display for SkeletonGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "skeleton: {} nodes, {} super-arcs",
            self.nodes.len(),
            self.arcs.len()
        )?;
        for arc in &self.arcs {
            let (low, high) = self.arc_endpoints(arc);
            write!(f, "  {low} -> {high}")?;
            if !arc.interior.is_empty() {
                write!(f, " via {:?}", arc.interior)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl ReebGraph {
    /// Declares the stream complete: finalizes every remaining node, drops
    /// the transient labels, and publishes the first skeleton. Streaming
    /// afterwards fails with
    /// [`StreamClosed`](crate::ReebGraphError::StreamClosed).
    ///
    /// Idempotent.
    pub fn close_stream(&mut self) {
        if self.closed {
            return;
        }

        // vertex -> (down neighbors, up neighbors), one entry per arc side
        let mut adjacency: BTreeMap<u64, (Vec<u64>, Vec<u64>)> = BTreeMap::new();
        for n in self.node_ids() {
            adjacency.entry(self.node(n).vertex).or_default();
        }
        for a in self.arc_ids() {
            let arc = self.arc(a);
            let low = self.node(arc.low).vertex;
            let high = self.node(arc.high).vertex;
            adjacency.entry(low).or_default().1.push(high);
            adjacency.entry(high).or_default().0.push(low);
        }

        // Finalize without removing regular nodes: the published graph keeps
        // every vertex that survived streaming, and the super-arc walk below
        // lists the regular ones as interiors.
        for n in self.node_ids().collect::<Vec<_>>() {
            if !self.node(n).finalized {
                self.node_mut(n).finalized = true;
                self.simplify_labels(n, None, true, true);
            }
        }
        self.flush_labels();
        self.cancellations.clear();

        let mut nodes = Vec::new();
        let mut vmap: HashMap<u64, usize> = HashMap::new();
        for n in self.node_ids() {
            let v = self.node(n).vertex;
            vmap.insert(v, nodes.len());
            nodes.push(SkeletonNode { vertex: v });
        }

        let mut arcs = Vec::new();
        for (&v, (downs, ups)) in &adjacency {
            if downs.len() == 1 && ups.len() == 1 {
                continue;
            }
            for &first in ups {
                let mut interior = Vec::new();
                let mut cur = first;
                loop {
                    let (d, u) = &adjacency[&cur];
                    if d.len() == 1 && u.len() == 1 {
                        interior.push(cur);
                        cur = u[0];
                    } else {
                        break;
                    }
                }
                arcs.push(SkeletonArc {
                    low: vmap[&v],
                    high: vmap[&cur],
                    interior,
                });
            }
        }

        self.skeleton = SkeletonGraph { nodes, arcs };
        self.closed = true;
        self.invalidate_loops();
        debug!(
            "stream closed: {} nodes, {} arcs, {} super-arcs published",
            self.num_nodes(),
            self.num_arcs(),
            self.skeleton.num_arcs()
        );
    }

    /// Replays the cancellation log over the published skeleton: every
    /// previous super-arc is chased through the removed/inserted endpoint
    /// rewrites to its surviving destination, interior lists are merged with
    /// the vertices the cancellations freed, and the skeleton is rebuilt
    /// from the live graph. Clears the log.
    pub(crate) fn commit_simplification(&mut self) {
        let before: Vec<((u64, u64), Vec<u64>)> = self
            .skeleton
            .arcs
            .iter()
            .map(|a| (self.skeleton.arc_endpoints(a), a.interior.clone()))
            .collect();

        let mut after: Vec<((u64, u64), Vec<u64>)> = self
            .arc_ids()
            .map(|a| {
                let arc = self.arc(a);
                (
                    (self.node(arc.low).vertex, self.node(arc.high).vertex),
                    Vec::new(),
                )
            })
            .collect();

        let mut segmented: HashSet<u64> = HashSet::new();
        let mut wholesale: HashSet<usize> = HashSet::new();

        for (source, interior) in &before {
            let mut destination = *source;
            let mut freed_critical: Vec<u64> = Vec::new();

            for c in &self.cancellations {
                for pair in &c.removed {
                    if destination != *pair {
                        continue;
                    }
                    destination = c.inserted[0];
                    if c.removed.len() > 1 {
                        // A two-for-one cancellation spanning the new arc
                        // demotes the middle critical vertices to interiors.
                        let spanning = (c.removed[0].0 == destination.0
                            && c.removed[1].1 == destination.1)
                            || (c.removed[1].0 == destination.0
                                && c.removed[0].1 == destination.1);
                        if spanning {
                            for r in &c.removed {
                                if r.0 != destination.0 && r.0 != destination.1 {
                                    freed_critical.push(r.0);
                                }
                                if r.1 != destination.0 && r.1 != destination.1 {
                                    freed_critical.push(r.1);
                                }
                            }
                        }
                    }
                }
            }

            for (j, (pair, segment)) in after.iter_mut().enumerate() {
                if *pair != destination || wholesale.contains(&j) {
                    continue;
                }
                if *source == destination {
                    wholesale.insert(j);
                    *segment = interior.clone();
                } else {
                    for &v in interior {
                        if segmented.insert(v) {
                            segment.push(v);
                        }
                    }
                }
                for &v in &freed_critical {
                    if segmented.insert(v) {
                        segment.push(v);
                    }
                }
                break;
            }
        }

        for (_, segment) in &mut after {
            segment.sort_by(|&x, &y| {
                let fx = self.scalar_field.get(&x).copied().unwrap_or_default();
                let fy = self.scalar_field.get(&y).copied().unwrap_or_default();
                fx.total_cmp(&fy).then(x.cmp(&y))
            });
        }

        let mut nodes = Vec::new();
        let mut vmap: HashMap<u64, usize> = HashMap::new();
        for n in self.node_ids() {
            let v = self.node(n).vertex;
            vmap.insert(v, nodes.len());
            nodes.push(SkeletonNode { vertex: v });
        }
        let mut arcs = Vec::new();
        for (pair, segment) in after {
            if let (Some(&low), Some(&high)) = (vmap.get(&pair.0), vmap.get(&pair.1)) {
                arcs.push(SkeletonArc {
                    low,
                    high,
                    interior: segment,
                });
            }
        }

        self.skeleton = SkeletonGraph { nodes, arcs };
        self.cancellations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_publishes_super_arcs() {
        let mut g = ReebGraph::new();
        g.stream_triangle(0, 0.0, 1, 1.0, 2, 2.0).unwrap();
        g.close_stream();

        let skeleton = g.skeleton();
        assert_eq!(skeleton.num_nodes(), 3);
        assert_eq!(skeleton.num_arcs(), 1);
        assert_eq!(skeleton.arc_endpoints(&skeleton.arcs[0]), (0, 2));
        assert_eq!(skeleton.arcs[0].interior, vec![1]);
    }

    #[test]
    fn close_is_idempotent() {
        let mut g = ReebGraph::new();
        g.stream_triangle(0, 0.0, 1, 1.0, 2, 2.0).unwrap();
        g.close_stream();
        let published = g.skeleton().clone();
        g.close_stream();
        assert_eq!(*g.skeleton(), published);
    }

    #[test]
    fn commit_merges_interiors_of_collapsed_runs() {
        // Close, then absorb every regular node and commit: the single
        // surviving arc must list all interior vertices in scalar order.
        let mut g = ReebGraph::new();
        g.stream_triangle(0, 0.0, 1, 1.0, 2, 2.0).unwrap();
        g.stream_triangle(1, 1.0, 2, 2.0, 3, 3.0).unwrap();
        g.close_stream();
        assert_eq!(g.skeleton().num_arcs(), 1);
        assert_eq!(g.skeleton().arcs[0].interior, vec![1, 2]);

        g.simplify(1.0, None);
        let skeleton = g.skeleton();
        assert_eq!(skeleton.num_arcs(), 1);
        assert_eq!(skeleton.arc_endpoints(&skeleton.arcs[0]), (0, 3));
        assert_eq!(skeleton.arcs[0].interior, vec![1, 2]);
    }

    #[test]
    fn skeleton_serde_round_trip() {
        let mut g = ReebGraph::new();
        g.stream_triangle(0, 0.0, 1, 1.0, 2, 2.0).unwrap();
        g.close_stream();
        let json = serde_json::to_string(g.skeleton()).unwrap();
        let back: SkeletonGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, *g.skeleton());
    }

    #[test]
    fn display_lists_super_arcs() {
        let mut g = ReebGraph::new();
        g.stream_triangle(0, 0.0, 1, 1.0, 2, 2.0).unwrap();
        g.close_stream();
        let dump = g.skeleton().to_string();
        assert!(dump.contains("3 nodes"));
        assert!(dump.contains("0 -> 2"));
        assert!(dump.contains("via [1]"));
    }
}

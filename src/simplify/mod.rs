//! Persistence-driven simplification.
//!
//! Features scoring below a caller-chosen threshold are cancelled in three
//! passes: leaf branches, then loops, then the branches freed by loop
//! removal. The rewrites are accumulated in the cancellation log and folded
//! into the published skeleton by a single commit at the end.

pub(crate) mod branches;
pub(crate) mod loops;
pub mod metric;

pub use metric::SimplificationMetric;

use log::debug;

use crate::topology::graph::ReebGraph;

impl ReebGraph {
    /// Cancels every branch and loop whose score under `metric` (scalar
    /// persistence when `None`) falls below `threshold`, then republishes
    /// the skeleton. Returns the number of cancelled features.
    ///
    /// The meaningful threshold domain is `[0, 1]`; values outside are
    /// clamped. A threshold of zero leaves the graph untouched.
    pub fn simplify(
        &mut self,
        threshold: f64,
        metric: Option<&dyn SimplificationMetric>,
    ) -> usize {
        let threshold = threshold.clamp(0.0, 1.0);
        if threshold == 0.0 {
            return 0;
        }
        self.cancellations.clear();
        let mut removed = self.simplify_branches(threshold, metric);
        removed += self.simplify_loops(threshold, metric);
        removed += self.simplify_branches(threshold, metric);
        self.commit_simplification();
        debug!(
            "simplification at threshold {threshold} cancelled {removed} features, \
             {} nodes and {} arcs remain",
            self.num_nodes(),
            self.num_arcs()
        );
        removed
    }
}

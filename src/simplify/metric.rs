//! Pluggable arc importance for simplification.

use crate::topology::graph::ReebGraph;
use crate::topology::handles::ArcId;

/// Scores an arc for simplification; arcs scoring below the caller's
/// threshold are candidates for removal.
///
/// The built-in score is scalar persistence, the arc's value span over the
/// global scalar range. A custom metric sees the arc's endpoint mesh
/// vertices plus the interior vertices of the published super-arc between
/// them (empty when the skeleton holds no such super-arc), so it can weigh
/// geometry the scalar span cannot see, such as hyper-volume or arc length.
///
/// Scores are expected in `[0, 1]`.
pub trait SimplificationMetric {
    fn persistence(
        &self,
        graph: &ReebGraph,
        low_vertex: u64,
        high_vertex: u64,
        interior: &[u64],
    ) -> f64;
}

impl ReebGraph {
    /// Importance of `a` under an optional custom metric; plain scalar
    /// persistence when none is given.
    pub(crate) fn arc_metric(&self, a: ArcId, metric: Option<&dyn SimplificationMetric>) -> f64 {
        let Some(metric) = metric else {
            return self.arc_persistence(a);
        };
        let arc = self.arc(a);
        let low = self.node(arc.low).vertex;
        let high = self.node(arc.high).vertex;
        let interior = self
            .skeleton
            .arc_interior(low, high)
            .unwrap_or(&[]);
        metric.persistence(self, low, high, interior)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Everything;
    impl SimplificationMetric for Everything {
        fn persistence(&self, _: &ReebGraph, _: u64, _: u64, _: &[u64]) -> f64 {
            0.0
        }
    }

    struct Nothing;
    impl SimplificationMetric for Nothing {
        fn persistence(&self, _: &ReebGraph, _: u64, _: u64, _: &[u64]) -> f64 {
            1.0
        }
    }

    #[test]
    fn default_metric_is_scalar_persistence() {
        let mut g = ReebGraph::new();
        let a = g.add_vertex(0, 0.0);
        let b = g.add_vertex(1, 1.0);
        let c = g.add_vertex(2, 4.0);
        g.add_path(&[a, b, c], None);
        let first = g.node(a).up_arcs;
        assert_eq!(g.arc_metric(first, None), 0.25);
    }

    #[test]
    fn custom_metric_overrides_persistence() {
        let mut g = ReebGraph::new();
        let a = g.add_vertex(0, 0.0);
        let b = g.add_vertex(1, 1.0);
        g.add_path(&[a, b], None);
        let arc = g.node(a).up_arcs;
        assert_eq!(g.arc_metric(arc, Some(&Everything)), 0.0);
        assert_eq!(g.arc_metric(arc, Some(&Nothing)), 1.0);
    }
}

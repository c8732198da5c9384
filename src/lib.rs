//! # reeb-graph
//!
//! reeb-graph is a streaming Reeb-graph construction and topological-simplification
//! engine for simplicial meshes (triangles and tetrahedra). Cells are streamed one at
//! a time together with a scalar field; the engine incrementally builds a combinatorial
//! graph summarizing how the field's level sets connect and split, then simplifies it
//! by removing features below a persistence threshold.
//!
//! ## Features
//! - Pooled, free-list-backed storage for nodes, arcs and labels with stable handles
//! - Incremental construction: correctness never requires seeing the whole mesh at once
//! - Branch decimation and loop removal driven by normalized persistence or a
//!   caller-supplied metric
//! - A published [`SkeletonGraph`](commit::SkeletonGraph) whose super-arcs carry the
//!   ordered list of absorbed mesh vertices, kept consistent across simplification
//!
//! ## Usage
//! ```rust
//! use reeb_graph::prelude::*;
//!
//! let mut graph = ReebGraph::new();
//! graph.stream_triangle(0, 0.0, 1, 1.0, 2, 2.0).unwrap();
//! graph.close_stream();
//! assert_eq!(graph.num_nodes(), 3);
//! assert_eq!(graph.num_arcs(), 2);
//! ```
//!
//! The engine is single-threaded and fully synchronous; every operation runs to
//! completion before returning. One instance exclusively owns its storage.

pub mod arena;
pub mod commit;
pub mod error;
pub mod mesh;
pub mod simplify;
pub mod topology;

pub use error::ReebGraphError;
pub use topology::graph::ReebGraph;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::commit::{SkeletonArc, SkeletonGraph, SkeletonNode};
    pub use crate::error::ReebGraphError;
    pub use crate::mesh::{
        FieldSet, NamedFields, ScalarField, SimplicialMesh, TetrahedralMesh, TriangleMesh,
        VertexScalars,
    };
    pub use crate::simplify::metric::SimplificationMetric;
    pub use crate::topology::graph::ReebGraph;
    pub use crate::topology::handles::{ArcId, LabelId, NodeId};
}

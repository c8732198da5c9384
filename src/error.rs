//! ReebGraphError: Unified error type for reeb-graph public APIs
//!
//! This error type is used throughout the library to provide robust,
//! non-panicking error handling for all public entry points. Internal
//! invariant violations are not defensively checked in release builds;
//! the construction algorithm assumes a consistent simplicial stream
//! produced in a single pass.

use thiserror::Error;

/// Unified error type for reeb-graph operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReebGraphError {
    /// A cell with a point count other than 3 (triangle) or 4 (tetrahedron)
    /// was encountered while building from a mesh.
    #[error("cell {cell} has {points} points; expected a simplicial mesh (3 or 4 points per cell)")]
    NotASimplicialMesh { cell: usize, points: usize },
    /// The requested scalar field is absent from the field set.
    #[error("no scalar field named `{0}`")]
    NoSuchField(String),
    /// A mesh vertex has no value in the supplied scalar field.
    #[error("scalar field has no value for mesh vertex {0}")]
    MissingScalarValue(u64),
    /// Cells were streamed after `close_stream` published the graph.
    #[error("stream already closed; no further cells can be added")]
    StreamClosed,
}

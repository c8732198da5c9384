//! Mesh ingestion: traits over cell connectivity and scalar fields, plus
//! `Vec`-backed implementations for tests and small programs.
//!
//! The traits exist so the engine never holds the mesh: `build` walks the
//! cells once to count per-vertex incidences, then streams them. Knowing the
//! incidences up front lets every vertex finalize the moment its last cell
//! passes, so interior vertices are absorbed while streaming instead of
//! lingering until `close_stream`.

use hashbrown::HashMap;
use log::info;

use crate::error::ReebGraphError;
use crate::topology::graph::ReebGraph;

/// Read-only view of a simplicial mesh: a list of cells, each a slice of
/// mesh vertex ids. Only 3-point and 4-point cells are accepted.
pub trait SimplicialMesh {
    fn num_cells(&self) -> usize;
    fn cell(&self, i: usize) -> &[u64];
}

/// Scalar value per mesh vertex.
pub trait ScalarField {
    fn value(&self, vertex: u64) -> Option<f64>;
}

/// Lookup of scalar fields by name, for meshes carrying several attributes.
pub trait FieldSet {
    fn field(&self, name: &str) -> Option<&dyn ScalarField>;
}

/// A triangle soup.
#[derive(Clone, Debug, Default)]
pub struct TriangleMesh {
    cells: Vec<[u64; 3]>,
}

impl TriangleMesh {
    pub fn new() -> Self {
        TriangleMesh::default()
    }

    pub fn push(&mut self, v0: u64, v1: u64, v2: u64) {
        self.cells.push([v0, v1, v2]);
    }
}

impl From<Vec<[u64; 3]>> for TriangleMesh {
    fn from(cells: Vec<[u64; 3]>) -> Self {
        TriangleMesh { cells }
    }
}

impl SimplicialMesh for TriangleMesh {
    fn num_cells(&self) -> usize {
        self.cells.len()
    }

    fn cell(&self, i: usize) -> &[u64] {
        &self.cells[i]
    }
}

/// A tetrahedron soup.
#[derive(Clone, Debug, Default)]
pub struct TetrahedralMesh {
    cells: Vec<[u64; 4]>,
}

impl TetrahedralMesh {
    pub fn new() -> Self {
        TetrahedralMesh::default()
    }

    pub fn push(&mut self, v0: u64, v1: u64, v2: u64, v3: u64) {
        self.cells.push([v0, v1, v2, v3]);
    }
}

impl From<Vec<[u64; 4]>> for TetrahedralMesh {
    fn from(cells: Vec<[u64; 4]>) -> Self {
        TetrahedralMesh { cells }
    }
}

impl SimplicialMesh for TetrahedralMesh {
    fn num_cells(&self) -> usize {
        self.cells.len()
    }

    fn cell(&self, i: usize) -> &[u64] {
        &self.cells[i]
    }
}

/// Scalar values indexed densely by vertex id.
#[derive(Clone, Debug, Default)]
pub struct VertexScalars(pub Vec<f64>);

impl ScalarField for VertexScalars {
    fn value(&self, vertex: u64) -> Option<f64> {
        self.0.get(vertex as usize).copied()
    }
}

/// Named scalar fields over one mesh.
#[derive(Clone, Debug, Default)]
pub struct NamedFields {
    fields: HashMap<String, VertexScalars>,
}

impl NamedFields {
    pub fn new() -> Self {
        NamedFields::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.fields.insert(name.into(), VertexScalars(values));
    }
}

impl FieldSet for NamedFields {
    fn field(&self, name: &str) -> Option<&dyn ScalarField> {
        self.fields.get(name).map(|f| f as &dyn ScalarField)
    }
}

impl ReebGraph {
    /// Builds the graph from a whole mesh and one scalar field, then closes
    /// the stream.
    ///
    /// Because the full mesh is visible, per-vertex incidences are counted
    /// first and every vertex is finalized as soon as its last incident cell
    /// streams, keeping the working set to the active sweep front.
    pub fn build<M, F>(&mut self, mesh: &M, field: &F) -> Result<(), ReebGraphError>
    where
        M: SimplicialMesh + ?Sized,
        F: ScalarField + ?Sized,
    {
        if self.closed {
            return Err(ReebGraphError::StreamClosed);
        }

        let mut counts: HashMap<u64, i64> = HashMap::new();
        for i in 0..mesh.num_cells() {
            let cell = mesh.cell(i);
            if cell.len() != 3 && cell.len() != 4 {
                return Err(ReebGraphError::NotASimplicialMesh {
                    cell: i,
                    points: cell.len(),
                });
            }
            for &v in cell {
                if field.value(v).is_none() {
                    return Err(ReebGraphError::MissingScalarValue(v));
                }
                *counts.entry(v).or_insert(0) += 1;
            }
        }

        info!(
            "building from {} cells over {} vertices",
            mesh.num_cells(),
            counts.len()
        );
        self.pending = counts;
        self.track_pending = true;

        let result = self.stream_all(mesh, field);
        self.track_pending = false;
        self.pending.clear();
        result?;

        self.close_stream();
        Ok(())
    }

    fn stream_all<M, F>(&mut self, mesh: &M, field: &F) -> Result<(), ReebGraphError>
    where
        M: SimplicialMesh + ?Sized,
        F: ScalarField + ?Sized,
    {
        let value = |v: u64| {
            field
                .value(v)
                .ok_or(ReebGraphError::MissingScalarValue(v))
        };
        for i in 0..mesh.num_cells() {
            let cell = mesh.cell(i);
            match *cell {
                [v0, v1, v2] => {
                    self.stream_triangle(v0, value(v0)?, v1, value(v1)?, v2, value(v2)?)?;
                }
                [v0, v1, v2, v3] => {
                    self.stream_tetrahedron(
                        v0,
                        value(v0)?,
                        v1,
                        value(v1)?,
                        v2,
                        value(v2)?,
                        v3,
                        value(v3)?,
                    )?;
                }
                _ => {
                    return Err(ReebGraphError::NotASimplicialMesh {
                        cell: i,
                        points: cell.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Like [`build`](ReebGraph::build), resolving the scalar field by name.
    pub fn build_named<M>(
        &mut self,
        mesh: &M,
        fields: &dyn FieldSet,
        name: &str,
    ) -> Result<(), ReebGraphError>
    where
        M: SimplicialMesh + ?Sized,
    {
        let field = fields
            .field(name)
            .ok_or_else(|| ReebGraphError::NoSuchField(name.to_string()))?;
        self.build(mesh, field)
    }
}

//! Error types for mesh construction.

use thiserror::Error;

/// Errors raised when vertex/index buffers handed to [`Mesh::new`](crate::Mesh::new)
/// do not describe a valid triangle mesh.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// The index buffer does not hold whole triangles.
    #[error("index buffer length {0} is not a multiple of 3")]
    IndexCount(usize),

    /// A face references a vertex that does not exist.
    #[error("face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        /// Triangle (face) number.
        face: usize,
        /// Offending vertex index.
        index: u32,
        /// Number of vertices in the vertex buffer.
        vertex_count: usize,
    },

    /// Triangle ids are `u32`; the mesh has more triangles than that.
    #[error("mesh has {0} triangles, more than a u32 id can address")]
    TooManyTriangles(usize),
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;

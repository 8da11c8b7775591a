#![warn(missing_docs)]

//! Triangle meshes for meshpick.
//!
//! A [`Mesh`] owns a vertex buffer and a flat index buffer and derives, once,
//! everything the picking code needs per triangle: a stable id, the offset
//! of its indices and its centroid. It also carries the bounding box, the
//! mean vertex position and a model matrix used when rendering and when
//! mapping the cursor back into object space.
//!
//! - [`Aabb`] - Axis-aligned bounding box
//! - [`Mesh`] / [`Triangle`] / [`Vertex`] - Indexed mesh and its parts
//! - [`primitives`] - Procedural grid, sphere and cube
//! - Overlays: [`Mesh::highlight_triangle`] and [`Mesh::bounding_box_mesh`]

mod aabb;
mod error;
mod mesh;
mod overlay;
pub mod primitives;

pub use aabb::Aabb;
pub use error::{MeshError, Result};
pub use mesh::{Mesh, Triangle, Vertex, DEFAULT_VERTEX_COLOR, FIT_EXTENT};
pub use overlay::{BOUNDING_BOX_COLOR, HIGHLIGHT_COLOR};

//! Mesh buffers for the graphics engine.
//!
//! - [`GpuMesh`] - Vertex/index buffers uploaded from a [`CpuMesh`]
//! - [`MeshCache`] - Build-on-first-use owner of the sphere, cube and quad

mod cache;
mod data;

pub use cache::MeshCache;
pub use data::{CpuMesh, GpuMesh, IndexFormat, MeshVertex, PrimitiveTopology, VertexLayout};
pub use prism_core::mesh::MeshKind;

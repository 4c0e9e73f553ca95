//! CPU-side mesh types and generators.
//!
//! - [`VertexLayout`] - Describes vertex attributes across buffers
//! - [`CpuMesh`] - CPU-side mesh data (vertex bytes, index bytes, layout)
//! - [`MeshKind`] - The sphere, cube and quad generated by [`generators`]

mod data;
pub mod generators;
mod layout;

pub use data::{CpuMesh, IndexFormat, MeshVertex, PrimitiveTopology};
pub use generators::MeshKind;
pub use layout::{
    VertexAttribute, VertexAttributeFormat, VertexAttributeSemantic, VertexBufferLayout,
    VertexLayout, VertexStepMode,
};

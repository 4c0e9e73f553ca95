//! CPU-side mesh data structures.
//!
//! This module provides:
//! - [`PrimitiveTopology`] - How vertices are assembled into primitives
//! - [`IndexFormat`] - Index data format
//! - [`MeshVertex`] - The interleaved vertex shared by every generator
//! - [`CpuMesh`] - CPU-side mesh holding raw vertex and index data

use std::sync::Arc;

use super::layout::VertexLayout;

/// Primitive topology describing how vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Vertices form a connected strip of triangles.
    TriangleStrip,
}

impl PrimitiveTopology {
    /// Number of triangles produced by `count` vertices (or indices).
    pub fn triangle_count(&self, count: u32) -> u32 {
        match self {
            Self::TriangleList => count / 3,
            Self::TriangleStrip => count.saturating_sub(2),
        }
    }
}

/// Index format for indexed drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    /// 32-bit unsigned integers (max ~4 billion vertices).
    #[default]
    Uint32,
}

impl IndexFormat {
    /// Get the size in bytes of each index.
    pub fn size(&self) -> usize {
        match self {
            Self::Uint32 => 4,
        }
    }
}

/// Interleaved vertex: position, normal, texcoord (32 bytes).
///
/// Matches [`VertexLayout::position_normal_uv`].
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// A CPU-side mesh holding raw vertex and index data.
///
/// This is the GPU-agnostic representation of a mesh. Generators produce it
/// and the graphics crate uploads it once per mesh kind.
#[derive(Clone)]
pub struct CpuMesh {
    layout: Arc<VertexLayout>,
    topology: PrimitiveTopology,
    vertex_data: Vec<u8>,
    vertex_count: u32,
    index_data: Option<Vec<u8>>,
    index_format: Option<IndexFormat>,
    index_count: u32,
    label: Option<String>,
}

impl CpuMesh {
    /// Create a new empty CpuMesh with the given layout.
    pub fn new(layout: Arc<VertexLayout>) -> Self {
        Self {
            layout,
            topology: PrimitiveTopology::TriangleList,
            vertex_data: Vec::new(),
            vertex_count: 0,
            index_data: None,
            index_format: None,
            index_count: 0,
            label: None,
        }
    }

    /// Set the interleaved vertex data.
    pub fn with_vertices(mut self, vertices: &[MeshVertex]) -> Self {
        self.vertex_data = bytemuck::cast_slice(vertices).to_vec();
        self.vertex_count = vertices.len() as u32;
        self
    }

    /// Set index data as u32 indices.
    pub fn with_indices_u32(mut self, indices: &[u32]) -> Self {
        self.index_data = Some(bytemuck::cast_slice(indices).to_vec());
        self.index_format = Some(IndexFormat::Uint32);
        self.index_count = indices.len() as u32;
        self
    }

    /// Set the primitive topology.
    pub fn with_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the vertex layout.
    pub fn layout(&self) -> &Arc<VertexLayout> {
        &self.layout
    }

    /// Get the primitive topology.
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Raw interleaved vertex bytes.
    pub fn vertex_data(&self) -> &[u8] {
        &self.vertex_data
    }

    /// Vertex data reinterpreted as [`MeshVertex`] values.
    pub fn vertices(&self) -> &[MeshVertex] {
        bytemuck::cast_slice(&self.vertex_data)
    }

    /// Get the number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Get the raw index data.
    pub fn index_data(&self) -> Option<&[u8]> {
        self.index_data.as_deref()
    }

    /// Index data reinterpreted as u32 values (empty for non-indexed meshes).
    pub fn indices_u32(&self) -> &[u32] {
        match (&self.index_data, self.index_format) {
            (Some(data), Some(IndexFormat::Uint32)) => bytemuck::cast_slice(data),
            _ => &[],
        }
    }

    /// Get the index format.
    pub fn index_format(&self) -> Option<IndexFormat> {
        self.index_format
    }

    /// Get the number of indices.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Check if this mesh uses indexed drawing.
    pub fn is_indexed(&self) -> bool {
        self.index_data.is_some()
    }

    /// Number of elements a draw call consumes: indices when indexed, vertices otherwise.
    pub fn draw_count(&self) -> u32 {
        if self.is_indexed() {
            self.index_count
        } else {
            self.vertex_count
        }
    }

    /// Get the debug label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl std::fmt::Debug for CpuMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuMesh")
            .field("label", &self.label)
            .field("topology", &self.topology)
            .field("vertex_count", &self.vertex_count)
            .field("index_count", &self.index_count)
            .field("layout", &self.layout.label)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_counts() {
        assert_eq!(PrimitiveTopology::TriangleList.triangle_count(36), 12);
        assert_eq!(PrimitiveTopology::TriangleStrip.triangle_count(4), 2);
        assert_eq!(PrimitiveTopology::TriangleStrip.triangle_count(1), 0);
    }

    #[test]
    fn test_index_data_is_u32() {
        let vertices = [MeshVertex::new([0.0; 3], [0.0; 3], [0.0; 2]); 3];
        let mesh = CpuMesh::new(VertexLayout::position_normal_uv())
            .with_vertices(&vertices)
            .with_indices_u32(&[0, 1, 2]);

        let format = mesh.index_format().unwrap();
        assert_eq!(format, IndexFormat::Uint32);
        assert_eq!(mesh.index_data().unwrap().len(), 3 * format.size());
    }

    #[test]
    fn test_cpu_mesh_non_indexed() {
        let vertices = [MeshVertex::new([0.0; 3], [0.0, 0.0, 1.0], [0.0; 2]); 3];
        let mesh = CpuMesh::new(VertexLayout::position_normal_uv())
            .with_vertices(&vertices)
            .with_label("test");

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.vertex_data().len(), 3 * 32);
        assert!(!mesh.is_indexed());
        assert_eq!(mesh.draw_count(), 3);
        assert!(mesh.indices_u32().is_empty());
        assert_eq!(mesh.label(), Some("test"));
    }

    #[test]
    fn test_cpu_mesh_indexed() {
        let vertices = [MeshVertex::new([0.0; 3], [0.0; 3], [0.0; 2]); 4];
        let indices: [u32; 6] = [0, 1, 2, 2, 3, 0];
        let mesh = CpuMesh::new(VertexLayout::position_normal_uv())
            .with_vertices(&vertices)
            .with_indices_u32(&indices);

        assert_eq!(mesh.vertex_count(), 4);
        assert!(mesh.is_indexed());
        assert_eq!(mesh.index_count(), 6);
        assert_eq!(mesh.draw_count(), 6);
        assert_eq!(mesh.index_format(), Some(IndexFormat::Uint32));
        assert_eq!(mesh.indices_u32(), &indices);
    }

    #[test]
    fn test_vertices_view_matches_input() {
        let v = MeshVertex::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.5, 0.25]);
        let mesh = CpuMesh::new(VertexLayout::position_normal_uv()).with_vertices(&[v]);
        assert_eq!(mesh.vertices(), &[v]);
    }
}

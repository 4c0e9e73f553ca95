//! Uploaded mesh buffers.
//!
//! A [`GpuMesh`] is the backend-side counterpart of a
//! [`CpuMesh`]: one interleaved vertex buffer, an optional `u32` index
//! buffer, a topology and the number of elements a draw consumes.

use std::sync::Arc;

use crate::backend::{BakeBackend, BufferId};
use crate::error::GraphicsError;
use crate::types::{BufferDescriptor, BufferUsage};

pub use prism_core::mesh::{CpuMesh, IndexFormat, MeshVertex, PrimitiveTopology, VertexLayout};

/// A mesh whose vertex and index data live in backend buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuMesh {
    layout: Arc<VertexLayout>,
    topology: PrimitiveTopology,
    vertex_buffer: BufferId,
    vertex_count: u32,
    index_buffer: Option<BufferId>,
    index_format: Option<IndexFormat>,
    index_count: u32,
    label: Option<String>,
}

impl GpuMesh {
    /// Upload `mesh` into newly created buffers.
    ///
    /// Buffer creation failures are reported as
    /// [`GraphicsError::ResourceExhaustion`].
    pub fn upload<B: BakeBackend + ?Sized>(
        mesh: &CpuMesh,
        backend: &mut B,
    ) -> Result<Self, GraphicsError> {
        let label = mesh.label().unwrap_or("mesh");
        let vertex_data = mesh.vertex_data();
        let vertex_desc = BufferDescriptor::new(
            vertex_data.len() as u64,
            BufferUsage::VERTEX | BufferUsage::COPY_DST,
        )
        .with_label(format!("{label}_vertices"));
        let vertex_buffer = backend
            .create_buffer(&vertex_desc, vertex_data)
            .map_err(|e| exhausted(label, e))?;

        let index_buffer = match mesh.index_data() {
            Some(index_data) => {
                let index_desc = BufferDescriptor::new(
                    index_data.len() as u64,
                    BufferUsage::INDEX | BufferUsage::COPY_DST,
                )
                .with_label(format!("{label}_indices"));
                Some(
                    backend
                        .create_buffer(&index_desc, index_data)
                        .map_err(|e| exhausted(label, e))?,
                )
            }
            None => None,
        };

        log::debug!(
            "Uploaded mesh {label}: {} vertices, {} indices",
            mesh.vertex_count(),
            mesh.index_count()
        );

        Ok(Self {
            layout: mesh.layout().clone(),
            topology: mesh.topology(),
            vertex_buffer,
            vertex_count: mesh.vertex_count(),
            index_buffer,
            index_format: mesh.index_format(),
            index_count: mesh.index_count(),
            label: mesh.label().map(str::to_string),
        })
    }

    pub fn layout(&self) -> &Arc<VertexLayout> {
        &self.layout
    }

    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    pub fn vertex_buffer(&self) -> BufferId {
        self.vertex_buffer
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_buffer(&self) -> Option<BufferId> {
        self.index_buffer
    }

    pub fn index_format(&self) -> Option<IndexFormat> {
        self.index_format
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn is_indexed(&self) -> bool {
        self.index_buffer.is_some()
    }

    /// Indices for indexed meshes, vertices otherwise.
    pub fn draw_count(&self) -> u32 {
        if self.is_indexed() {
            self.index_count
        } else {
            self.vertex_count
        }
    }

    /// Number of triangles one draw produces.
    pub fn primitive_count(&self) -> u32 {
        self.topology.triangle_count(self.draw_count())
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

fn exhausted(label: &str, err: GraphicsError) -> GraphicsError {
    match err {
        GraphicsError::ResourceExhaustion(_) => err,
        other => GraphicsError::ResourceExhaustion(format!("mesh {label}: {other}")),
    }
}

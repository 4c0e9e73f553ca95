//! Lazily uploaded meshes, one per [`MeshKind`].

use std::sync::Arc;

use parking_lot::Mutex;
use prism_core::mesh::MeshKind;

use super::GpuMesh;
use crate::backend::{BackendId, BakeBackend};
use crate::error::GraphicsError;

/// Owns the uploaded sphere, cube and quad.
///
/// Each kind is generated and uploaded on its first request and shared by
/// every later request. The slots sit behind one lock, so concurrent first
/// requests still upload once.
///
/// A cache is bound to the backend of its first upload; requests through
/// any other backend fail.
#[derive(Debug, Default)]
pub struct MeshCache {
    slots: Mutex<Slots>,
}

#[derive(Debug, Default)]
struct Slots {
    owner: Option<BackendId>,
    meshes: [Option<Arc<GpuMesh>>; 3],
}

impl MeshCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the mesh for `kind`, uploading it through `backend` on first use.
    pub fn get<B: BakeBackend + ?Sized>(
        &self,
        kind: MeshKind,
        backend: &mut B,
    ) -> Result<Arc<GpuMesh>, GraphicsError> {
        let mut slots = self.slots.lock();
        let id = backend.id();
        match slots.owner {
            Some(owner) if owner != id => {
                return Err(GraphicsError::InvariantViolation(format!(
                    "mesh cache belongs to backend {}, requested through backend {}",
                    owner.raw(),
                    id.raw()
                )));
            }
            _ => {}
        }
        if let Some(mesh) = &slots.meshes[kind.index()] {
            return Ok(mesh.clone());
        }

        log::debug!("MeshCache: building {kind}");
        let mesh = Arc::new(GpuMesh::upload(&kind.generate(), backend)?);
        slots.owner = Some(id);
        slots.meshes[kind.index()] = Some(mesh.clone());
        Ok(mesh)
    }

    /// The mesh for `kind` if it was already uploaded.
    pub fn cached(&self, kind: MeshKind) -> Option<Arc<GpuMesh>> {
        self.slots.lock().meshes[kind.index()].clone()
    }

    /// Number of kinds uploaded so far.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .meshes
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

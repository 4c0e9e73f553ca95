//! # Prism Graphics
//!
//! Image-based lighting precomputation and the data contract of the live
//! shading pass.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`BakeBackend`] - Trait for bake backend implementations
//! - [`IblPipeline`] - Four declarative bake stages producing [`IblAssets`]
//! - [`RenderTargetManager`] - Scratch color/depth target retargeting
//! - [`MeshCache`] - Once-per-kind upload of the generated meshes
//! - [`ShaderLibrary`] - WGSL programs validated with naga
//! - Multiple backend support: wgpu, Cpu (reference) and Dummy (for testing)
//!
//! ## Example
//!
//! ```ignore
//! use prism_graphics::{IblPipeline, IblSettings, MeshCache, RenderTargetManager, ShaderLibrary};
//!
//! let shaders = ShaderLibrary::build()?;
//! let mut target = RenderTargetManager::new(create_backend(BackendKind::Auto)?);
//! let pipeline = IblPipeline::new(IblSettings::default())?;
//! let assets = pipeline.run(&mut target, &MeshCache::new(), &shaders, &environment)?;
//! ```

pub mod backend;
pub mod error;
pub mod ibl;
pub mod mesh;
pub mod render_target;
pub mod shader;
pub mod shading;
pub mod types;

// Re-export main types for convenience
pub use backend::{BackendId, BackendKind, BakeBackend, create_backend};
pub use error::{GraphicsError, ShaderStage};
pub use ibl::{BakeStage, IblAssets, IblPipeline, IblSettings};
pub use mesh::{GpuMesh, MeshCache, MeshKind};
pub use render_target::RenderTargetManager;
pub use shader::{ShaderLibrary, ShaderProgram};
pub use shading::{FrameUniforms, LightingToggles, MaterialTextures, SamplerSlot, ShadingBindings};
pub use types::{CubeFace, Extent2d, Texture, TextureDescriptor, TextureFormat, TextureUsage};

#[cfg(feature = "cpu")]
pub use backend::cpu::CpuBackend;
#[cfg(feature = "dummy")]
pub use backend::dummy::DummyBackend;
#[cfg(feature = "wgpu-backend")]
pub use backend::wgpu_backend::WgpuBackend;

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// This should be called before using any graphics functionality.
pub fn init() {
    prism_core::init();
    log::info!("Prism Graphics v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

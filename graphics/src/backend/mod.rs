//! Bake backend abstraction layer.
//!
//! The precomputation pipeline only talks to a backend through the
//! [`BakeBackend`] trait. A backend owns textures and buffers, keeps one
//! scratch depth target, and renders draws into whatever color attachment
//! is currently bound.
//!
//! # Available Backends
//!
//! - `dummy`: records commands without doing any work
//! - `cpu`: reference software evaluator of the bake programs
//! - `wgpu-backend`: real GPU implementation using wgpu

#[cfg(feature = "cpu")]
pub mod cpu;
#[cfg(feature = "dummy")]
pub mod dummy;
#[cfg(feature = "wgpu-backend")]
pub mod wgpu_backend;

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::{Pod, Zeroable};

use crate::error::GraphicsError;
use crate::mesh::GpuMesh;
use crate::shader::ShaderProgram;
use crate::types::{BufferDescriptor, Extent2d, TextureDescriptor};

/// Identity of one backend instance.
///
/// Texture and buffer handles are only meaningful on the backend that
/// issued them; caches use this to tell backends apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendId(u64);

impl BackendId {
    /// A fresh identity, distinct from every other in this process.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for BackendId {
    fn default() -> Self {
        Self::next()
    }
}

/// Backend handle of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(u64);

impl TextureId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

/// Backend handle of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

/// Texel data for one layer and mip of a texture, row 0 first.
#[derive(Debug, Clone, Copy)]
pub enum TexelData<'a> {
    /// Four `f32` channels per texel.
    Rgba32Float(&'a [f32]),
    /// Four `u8` channels per texel.
    Rgba8(&'a [u8]),
}

impl TexelData<'_> {
    /// Number of texels described.
    pub fn texel_count(&self) -> usize {
        match self {
            Self::Rgba32Float(data) => data.len() / 4,
            Self::Rgba8(data) => data.len() / 4,
        }
    }

    /// Convert to normalized RGBA `f32`.
    pub fn to_rgba_f32(&self) -> Vec<[f32; 4]> {
        match self {
            Self::Rgba32Float(data) => data
                .chunks_exact(4)
                .map(|c| [c[0], c[1], c[2], c[3]])
                .collect(),
            Self::Rgba8(data) => data
                .chunks_exact(4)
                .map(|c| [c[0], c[1], c[2], c[3]].map(|v| v as f32 / 255.0))
                .collect(),
        }
    }
}

/// One 2D slice of a texture bound as the render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorAttachment {
    pub texture: TextureId,
    /// Array layer (cube face index for cubemaps, 0 for 2D).
    pub layer: u32,
    pub mip: u32,
}

/// A texture bound as a shader input at `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureBinding {
    pub slot: u32,
    pub texture: TextureId,
}

impl TextureBinding {
    pub fn new(slot: u32, texture: TextureId) -> Self {
        Self { slot, texture }
    }
}

/// Uniform block shared by all bake programs.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BakeUniforms {
    /// Column-major capture view-projection.
    pub view_proj: [[f32; 4]; 4],
    /// Roughness of the prefilter mip being rendered.
    pub roughness: f32,
    /// Angular step of the irradiance convolution, in radians.
    pub sample_delta: f32,
    /// Importance sample count of the prefilter and BRDF programs.
    pub sample_count: u32,
    /// Face resolution of the sampled source cubemap.
    pub source_resolution: f32,
}

impl Default for BakeUniforms {
    fn default() -> Self {
        Self {
            view_proj: prism_core::math::mat4_to_cols_array_2d(&prism_core::math::Mat4::identity()),
            roughness: 0.0,
            sample_delta: 0.0,
            sample_count: 0,
            source_resolution: 0.0,
        }
    }
}

static_assertions::const_assert_eq!(std::mem::size_of::<BakeUniforms>(), 80);

/// A single draw into the bound color attachment.
#[derive(Debug, Clone, Copy)]
pub struct DrawCommand<'a> {
    pub program: ShaderProgram,
    pub mesh: &'a GpuMesh,
    pub inputs: &'a [TextureBinding],
    pub uniforms: BakeUniforms,
}

/// Backend trait for executing bake passes.
///
/// All calls happen from a single thread; the render-target manager holds
/// the backend exclusively while a stage runs.
pub trait BakeBackend {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Identity of this backend instance.
    fn id(&self) -> BackendId;

    /// Allocate a texture with every layer and mip of `descriptor`.
    fn create_texture(&mut self, descriptor: &TextureDescriptor)
    -> Result<TextureId, GraphicsError>;

    /// Free the storage of a texture. The handle is invalid afterwards.
    fn destroy_texture(&mut self, texture: TextureId) -> Result<(), GraphicsError>;

    /// Upload one layer and mip of a texture.
    fn write_texture(
        &mut self,
        texture: TextureId,
        layer: u32,
        mip: u32,
        data: TexelData<'_>,
    ) -> Result<(), GraphicsError>;

    /// Create a buffer initialised with `contents`.
    fn create_buffer(
        &mut self,
        descriptor: &BufferDescriptor,
        contents: &[u8],
    ) -> Result<BufferId, GraphicsError>;

    /// Resize the scratch depth target.
    fn resize_depth(&mut self, extent: Extent2d) -> Result<(), GraphicsError>;

    /// Bind the sole color attachment, or restore the default target with `None`.
    fn set_color_attachment(
        &mut self,
        attachment: Option<ColorAttachment>,
    ) -> Result<(), GraphicsError>;

    /// Clear the bound color attachment and the depth target.
    fn clear_color_attachment(&mut self, color: [f32; 4]) -> Result<(), GraphicsError>;

    /// Draw into the bound color attachment.
    fn draw(&mut self, command: &DrawCommand<'_>) -> Result<(), GraphicsError>;

    /// Fill mips 1.. of every layer from mip 0.
    fn generate_mipmaps(&mut self, texture: TextureId) -> Result<(), GraphicsError>;

    /// Read back one layer and mip as RGBA `f32`, row 0 first.
    ///
    /// Blocks until all prior work has finished.
    fn read_texture(
        &mut self,
        texture: TextureId,
        layer: u32,
        mip: u32,
    ) -> Result<Vec<[f32; 4]>, GraphicsError>;

    /// Submit outstanding work and wait for it.
    fn flush(&mut self) -> Result<(), GraphicsError>;
}

impl<B: BakeBackend + ?Sized> BakeBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn id(&self) -> BackendId {
        (**self).id()
    }

    fn destroy_texture(&mut self, texture: TextureId) -> Result<(), GraphicsError> {
        (**self).destroy_texture(texture)
    }

    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
    ) -> Result<TextureId, GraphicsError> {
        (**self).create_texture(descriptor)
    }

    fn write_texture(
        &mut self,
        texture: TextureId,
        layer: u32,
        mip: u32,
        data: TexelData<'_>,
    ) -> Result<(), GraphicsError> {
        (**self).write_texture(texture, layer, mip, data)
    }

    fn create_buffer(
        &mut self,
        descriptor: &BufferDescriptor,
        contents: &[u8],
    ) -> Result<BufferId, GraphicsError> {
        (**self).create_buffer(descriptor, contents)
    }

    fn resize_depth(&mut self, extent: Extent2d) -> Result<(), GraphicsError> {
        (**self).resize_depth(extent)
    }

    fn set_color_attachment(
        &mut self,
        attachment: Option<ColorAttachment>,
    ) -> Result<(), GraphicsError> {
        (**self).set_color_attachment(attachment)
    }

    fn clear_color_attachment(&mut self, color: [f32; 4]) -> Result<(), GraphicsError> {
        (**self).clear_color_attachment(color)
    }

    fn draw(&mut self, command: &DrawCommand<'_>) -> Result<(), GraphicsError> {
        (**self).draw(command)
    }

    fn generate_mipmaps(&mut self, texture: TextureId) -> Result<(), GraphicsError> {
        (**self).generate_mipmaps(texture)
    }

    fn read_texture(
        &mut self,
        texture: TextureId,
        layer: u32,
        mip: u32,
    ) -> Result<Vec<[f32; 4]>, GraphicsError> {
        (**self).read_texture(texture, layer, mip)
    }

    fn flush(&mut self) -> Result<(), GraphicsError> {
        (**self).flush()
    }
}

/// Which backend to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendKind {
    /// Best available: wgpu, then the CPU evaluator.
    #[default]
    Auto,
    Wgpu,
    Cpu,
    Dummy,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Wgpu => "wgpu",
            Self::Cpu => "cpu",
            Self::Dummy => "dummy",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = GraphicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "wgpu" => Ok(Self::Wgpu),
            "cpu" => Ok(Self::Cpu),
            "dummy" => Ok(Self::Dummy),
            other => Err(GraphicsError::BackendUnavailable(format!(
                "unknown backend `{other}`"
            ))),
        }
    }
}

/// Create the requested backend.
///
/// [`BackendKind::Auto`] tries wgpu first and falls back to the CPU
/// evaluator when no adapter is available.
pub fn create_backend(kind: BackendKind) -> Result<Box<dyn BakeBackend>, GraphicsError> {
    match kind {
        BackendKind::Auto => {
            #[cfg(feature = "wgpu-backend")]
            {
                match wgpu_backend::WgpuBackend::new() {
                    Ok(backend) => {
                        log::info!("Using wgpu backend");
                        return Ok(Box::new(backend));
                    }
                    Err(e) => {
                        log::warn!("Failed to create wgpu backend: {}", e);
                    }
                }
            }
            create_backend(BackendKind::Cpu)
        }
        BackendKind::Wgpu => {
            #[cfg(feature = "wgpu-backend")]
            {
                let backend = wgpu_backend::WgpuBackend::new()?;
                log::info!("Using wgpu backend");
                Ok(Box::new(backend))
            }
            #[cfg(not(feature = "wgpu-backend"))]
            Err(GraphicsError::BackendUnavailable(
                "built without the `wgpu-backend` feature".to_string(),
            ))
        }
        BackendKind::Cpu => {
            #[cfg(feature = "cpu")]
            {
                log::info!("Using CPU backend");
                Ok(Box::new(cpu::CpuBackend::new()))
            }
            #[cfg(not(feature = "cpu"))]
            Err(GraphicsError::BackendUnavailable(
                "built without the `cpu` feature".to_string(),
            ))
        }
        BackendKind::Dummy => {
            #[cfg(feature = "dummy")]
            {
                log::info!("Using dummy backend");
                Ok(Box::new(dummy::DummyBackend::new()))
            }
            #[cfg(not(feature = "dummy"))]
            Err(GraphicsError::BackendUnavailable(
                "built without the `dummy` feature".to_string(),
            ))
        }
    }
}

/// Check if a real GPU backend is compiled in.
pub fn has_gpu_backend() -> bool {
    cfg!(feature = "wgpu-backend")
}

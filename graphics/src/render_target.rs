//! Scratch render-target management for bake passes.
//!
//! The [`RenderTargetManager`] owns the backend and tracks one scratch depth
//! target plus the single color attachment the next draw writes to:
//!
//! ```text
//! Idle --begin_bake--> Baking { extent, attachment: None }
//! Baking --attach_*--> Baking { extent, attachment: Some }
//! Baking --begin_bake--> Baking { new extent, attachment: None }
//! Baking --end_bake--> Idle
//! ```
//!
//! The depth extent always equals the bound attachment's mip extent.

use std::sync::Arc;

use crate::backend::{
    BakeBackend, BakeUniforms, BufferId, ColorAttachment, DrawCommand, TexelData,
    TextureBinding,
};
use crate::error::GraphicsError;
use crate::mesh::GpuMesh;
use crate::shader::ShaderProgram;
use crate::types::{BufferDescriptor, CubeFace, Extent2d, Texture, TextureDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetState {
    Idle,
    Baking {
        extent: Extent2d,
        attachment: Option<ColorAttachment>,
    },
}

/// Drives the scratch depth target and color attachment of a backend.
#[derive(Debug)]
pub struct RenderTargetManager<B: BakeBackend> {
    backend: B,
    state: TargetState,
    depth: Option<Extent2d>,
}

impl<B: BakeBackend> RenderTargetManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: TargetState::Idle,
            depth: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn is_baking(&self) -> bool {
        matches!(self.state, TargetState::Baking { .. })
    }

    /// Extent of the scratch depth target, once allocated.
    pub fn depth_extent(&self) -> Option<Extent2d> {
        self.depth
    }

    /// The bound color attachment, if any.
    pub fn attachment(&self) -> Option<ColorAttachment> {
        match self.state {
            TargetState::Baking { attachment, .. } => attachment,
            TargetState::Idle => None,
        }
    }

    /// Start a bake at `width` x `height`, resizing the depth target.
    ///
    /// Also legal while a bake is active, which is how per-mip passes resize.
    /// Any bound attachment is released.
    pub fn begin_bake(&mut self, width: u32, height: u32) -> Result<(), GraphicsError> {
        if width == 0 || height == 0 {
            return Err(GraphicsError::InvariantViolation(format!(
                "bake extent {width}x{height} is empty"
            )));
        }
        let extent = Extent2d::new(width, height);

        if self.attachment().is_some() {
            self.backend.set_color_attachment(None)?;
        }
        if self.depth != Some(extent) {
            self.backend.resize_depth(extent)?;
            self.depth = Some(extent);
        }

        log::trace!(
            "RenderTargetManager: {} bake at {extent}",
            if self.is_baking() { "resizing" } else { "starting" }
        );
        self.state = TargetState::Baking {
            extent,
            attachment: None,
        };
        Ok(())
    }

    /// Bind one face of a cubemap mip as the color attachment.
    pub fn attach_cube_face(
        &mut self,
        texture: &Texture,
        face: CubeFace,
        mip: u32,
    ) -> Result<(), GraphicsError> {
        if !texture.is_cube() {
            return Err(GraphicsError::InvariantViolation(format!(
                "{} is not a cubemap",
                describe(texture)
            )));
        }
        self.attach(texture, face.layer(), mip)
    }

    /// Bind a mip of a 2D texture as the color attachment.
    pub fn attach_texture_2d(&mut self, texture: &Texture, mip: u32) -> Result<(), GraphicsError> {
        if texture.is_cube() {
            return Err(GraphicsError::InvariantViolation(format!(
                "{} is a cubemap, attach a face instead",
                describe(texture)
            )));
        }
        self.attach(texture, 0, mip)
    }

    fn attach(&mut self, texture: &Texture, layer: u32, mip: u32) -> Result<(), GraphicsError> {
        let TargetState::Baking { extent, .. } = self.state else {
            return Err(GraphicsError::InvariantViolation(format!(
                "attaching {} with no bake in progress",
                describe(texture)
            )));
        };
        if mip >= texture.mip_level_count() {
            return Err(GraphicsError::InvariantViolation(format!(
                "mip {mip} out of range for {} with {} levels",
                describe(texture),
                texture.mip_level_count()
            )));
        }
        let mip_extent = texture.mip_extent(mip);
        if mip_extent != extent {
            return Err(GraphicsError::InvariantViolation(format!(
                "attachment {} mip {mip} is {mip_extent} but depth is {extent}",
                describe(texture)
            )));
        }

        let attachment = ColorAttachment {
            texture: texture.id(),
            layer,
            mip,
        };
        self.backend.set_color_attachment(Some(attachment))?;
        log::trace!(
            "RenderTargetManager: attached {} layer={layer} mip={mip}",
            describe(texture)
        );
        self.state = TargetState::Baking {
            extent,
            attachment: Some(attachment),
        };
        Ok(())
    }

    /// Clear the bound attachment and depth.
    pub fn clear(&mut self, color: [f32; 4]) -> Result<(), GraphicsError> {
        self.require_attachment("clear")?;
        self.backend.clear_color_attachment(color)
    }

    /// Draw `mesh` with `program` into the bound attachment.
    pub fn draw(
        &mut self,
        program: ShaderProgram,
        mesh: &GpuMesh,
        inputs: &[TextureBinding],
        uniforms: BakeUniforms,
    ) -> Result<(), GraphicsError> {
        self.require_attachment("draw")?;
        self.backend.draw(&DrawCommand {
            program,
            mesh,
            inputs,
            uniforms,
        })
    }

    /// Finish the bake and restore the default target.
    pub fn end_bake(&mut self) -> Result<(), GraphicsError> {
        if !self.is_baking() {
            return Err(GraphicsError::InvariantViolation(
                "end_bake with no bake in progress".to_string(),
            ));
        }
        self.backend.set_color_attachment(None)?;
        self.backend.flush()?;
        self.state = TargetState::Idle;
        log::trace!("RenderTargetManager: bake finished, default target restored");
        Ok(())
    }

    /// Allocate a texture on the backend.
    pub fn create_texture(
        &mut self,
        descriptor: TextureDescriptor,
    ) -> Result<Arc<Texture>, GraphicsError> {
        let id = self.backend.create_texture(&descriptor)?;
        Ok(Arc::new(Texture::new(id, descriptor)))
    }

    /// Allocate a single-mip texture and upload `data` into layer 0.
    pub fn upload_texture(
        &mut self,
        descriptor: TextureDescriptor,
        data: TexelData<'_>,
    ) -> Result<Arc<Texture>, GraphicsError> {
        let texture = self.create_texture(descriptor)?;
        self.backend.write_texture(texture.id(), 0, 0, data)?;
        Ok(texture)
    }

    /// Free a texture's backend storage.
    ///
    /// Takes the last handle to the texture; a texture still shared
    /// elsewhere or bound as the attachment is left alone.
    pub fn destroy_texture(&mut self, texture: Arc<Texture>) -> Result<(), GraphicsError> {
        if self.attachment().map(|a| a.texture) == Some(texture.id()) {
            return Err(GraphicsError::InvariantViolation(format!(
                "destroying the bound attachment {}",
                describe(&texture)
            )));
        }
        let texture = Arc::try_unwrap(texture).map_err(|shared| {
            GraphicsError::InvariantViolation(format!(
                "{} is still referenced elsewhere",
                describe(&shared)
            ))
        })?;
        log::trace!("RenderTargetManager: destroying {}", describe(&texture));
        self.backend.destroy_texture(texture.id())
    }

    pub fn create_buffer(
        &mut self,
        descriptor: &BufferDescriptor,
        contents: &[u8],
    ) -> Result<BufferId, GraphicsError> {
        self.backend.create_buffer(descriptor, contents)
    }

    /// Fill mips 1.. of `texture` from its mip 0.
    pub fn generate_mipmaps(&mut self, texture: &Texture) -> Result<(), GraphicsError> {
        if texture.mip_level_count() <= 1 {
            return Ok(());
        }
        if self.attachment().map(|a| a.texture) == Some(texture.id()) {
            return Err(GraphicsError::InvariantViolation(format!(
                "generating mipmaps of the bound attachment {}",
                describe(texture)
            )));
        }
        log::trace!(
            "RenderTargetManager: generating {} mips for {}",
            texture.mip_level_count(),
            describe(texture)
        );
        self.backend.generate_mipmaps(texture.id())
    }

    /// Read one layer and mip back as RGBA `f32`.
    pub fn read_texture(
        &mut self,
        texture: &Texture,
        layer: u32,
        mip: u32,
    ) -> Result<Vec<[f32; 4]>, GraphicsError> {
        if layer >= texture.descriptor().layer_count() || mip >= texture.mip_level_count() {
            return Err(GraphicsError::InvariantViolation(format!(
                "layer {layer} mip {mip} out of range for {}",
                describe(texture)
            )));
        }
        self.backend.read_texture(texture.id(), layer, mip)
    }

    fn require_attachment(&self, operation: &str) -> Result<(), GraphicsError> {
        if self.attachment().is_none() {
            return Err(GraphicsError::InvariantViolation(format!(
                "{operation} without a bound color attachment"
            )));
        }
        Ok(())
    }
}

fn describe(texture: &Texture) -> String {
    match texture.label() {
        Some(label) => format!("texture `{label}`"),
        None => format!("texture #{}", texture.id().raw()),
    }
}

//! Dummy bake backend for testing and development.
//!
//! This backend doesn't render anything. It allocates handles, keeps the
//! descriptors it was given, and records every command so tests can assert
//! on the exact sequence a stage produced.

use std::collections::HashMap;

use crate::error::GraphicsError;
use crate::shader::ShaderProgram;
use crate::types::{BufferDescriptor, Extent2d, TextureDescriptor};

use super::{
    BackendId, BakeBackend, BakeUniforms, BufferId, ColorAttachment, DrawCommand, TexelData, TextureBinding,
    TextureId,
};

/// A command received by the [`DummyBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    CreateTexture {
        id: TextureId,
        descriptor: TextureDescriptor,
    },
    DestroyTexture(TextureId),
    WriteTexture {
        texture: TextureId,
        layer: u32,
        mip: u32,
        texels: usize,
    },
    CreateBuffer {
        id: BufferId,
        size: u64,
    },
    ResizeDepth(Extent2d),
    SetColorAttachment(Option<ColorAttachment>),
    Clear([f32; 4]),
    Draw {
        program: ShaderProgram,
        target: ColorAttachment,
        inputs: Vec<TextureBinding>,
        uniforms: BakeUniforms,
        draw_count: u32,
    },
    GenerateMipmaps(TextureId),
    ReadTexture {
        texture: TextureId,
        layer: u32,
        mip: u32,
    },
    Flush,
}

/// Dummy bake backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    id: BackendId,
    next_id: u64,
    textures: HashMap<TextureId, TextureDescriptor>,
    attachment: Option<ColorAttachment>,
    depth: Option<Extent2d>,
    commands: Vec<BackendCommand>,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded so far.
    pub fn commands(&self) -> &[BackendCommand] {
        &self.commands
    }

    /// Drain the recorded commands.
    pub fn take_commands(&mut self) -> Vec<BackendCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Descriptor of a texture created on this backend.
    pub fn texture_descriptor(&self, texture: TextureId) -> Option<&TextureDescriptor> {
        self.textures.get(&texture)
    }

    /// Number of live textures.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Current depth target extent.
    pub fn depth_extent(&self) -> Option<Extent2d> {
        self.depth
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn descriptor(&self, texture: TextureId) -> Result<&TextureDescriptor, GraphicsError> {
        self.textures.get(&texture).ok_or_else(|| {
            GraphicsError::InvariantViolation(format!("unknown texture {}", texture.raw()))
        })
    }
}

impl BakeBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    fn id(&self) -> BackendId {
        self.id
    }

    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
    ) -> Result<TextureId, GraphicsError> {
        log::trace!(
            "DummyBackend: creating texture {:?} ({})",
            descriptor.label,
            descriptor.size
        );
        let id = TextureId::new(self.allocate_id());
        self.textures.insert(id, descriptor.clone());
        self.commands.push(BackendCommand::CreateTexture {
            id,
            descriptor: descriptor.clone(),
        });
        Ok(id)
    }

    fn destroy_texture(&mut self, texture: TextureId) -> Result<(), GraphicsError> {
        if self.textures.remove(&texture).is_none() {
            return Err(GraphicsError::InvariantViolation(format!(
                "destroying unknown texture {}",
                texture.raw()
            )));
        }
        log::trace!("DummyBackend: destroyed texture {}", texture.raw());
        self.commands.push(BackendCommand::DestroyTexture(texture));
        Ok(())
    }

    fn write_texture(
        &mut self,
        texture: TextureId,
        layer: u32,
        mip: u32,
        data: TexelData<'_>,
    ) -> Result<(), GraphicsError> {
        self.descriptor(texture)?;
        log::trace!(
            "DummyBackend: write_texture {} layer={} mip={}",
            texture.raw(),
            layer,
            mip
        );
        self.commands.push(BackendCommand::WriteTexture {
            texture,
            layer,
            mip,
            texels: data.texel_count(),
        });
        Ok(())
    }

    fn create_buffer(
        &mut self,
        descriptor: &BufferDescriptor,
        contents: &[u8],
    ) -> Result<BufferId, GraphicsError> {
        log::trace!(
            "DummyBackend: creating buffer {:?} (size: {})",
            descriptor.label,
            descriptor.size
        );
        let id = BufferId::new(self.allocate_id());
        self.commands.push(BackendCommand::CreateBuffer {
            id,
            size: contents.len() as u64,
        });
        Ok(id)
    }

    fn resize_depth(&mut self, extent: Extent2d) -> Result<(), GraphicsError> {
        self.depth = Some(extent);
        self.commands.push(BackendCommand::ResizeDepth(extent));
        Ok(())
    }

    fn set_color_attachment(
        &mut self,
        attachment: Option<ColorAttachment>,
    ) -> Result<(), GraphicsError> {
        if let Some(attachment) = &attachment {
            self.descriptor(attachment.texture)?;
        }
        self.attachment = attachment;
        self.commands
            .push(BackendCommand::SetColorAttachment(attachment));
        Ok(())
    }

    fn clear_color_attachment(&mut self, color: [f32; 4]) -> Result<(), GraphicsError> {
        if self.attachment.is_none() {
            return Err(GraphicsError::InvariantViolation(
                "clear without a color attachment".to_string(),
            ));
        }
        self.commands.push(BackendCommand::Clear(color));
        Ok(())
    }

    fn draw(&mut self, command: &DrawCommand<'_>) -> Result<(), GraphicsError> {
        let target = self.attachment.ok_or_else(|| {
            GraphicsError::InvariantViolation("draw without a color attachment".to_string())
        })?;
        log::trace!(
            "DummyBackend: draw {} into {} layer={} mip={}",
            command.program,
            target.texture.raw(),
            target.layer,
            target.mip
        );
        self.commands.push(BackendCommand::Draw {
            program: command.program,
            target,
            inputs: command.inputs.to_vec(),
            uniforms: command.uniforms,
            draw_count: command.mesh.draw_count(),
        });
        Ok(())
    }

    fn generate_mipmaps(&mut self, texture: TextureId) -> Result<(), GraphicsError> {
        self.descriptor(texture)?;
        self.commands.push(BackendCommand::GenerateMipmaps(texture));
        Ok(())
    }

    fn read_texture(
        &mut self,
        texture: TextureId,
        layer: u32,
        mip: u32,
    ) -> Result<Vec<[f32; 4]>, GraphicsError> {
        let area = self.descriptor(texture)?.mip_extent(mip).area();
        self.commands.push(BackendCommand::ReadTexture {
            texture,
            layer,
            mip,
        });
        Ok(vec![[0.0; 4]; area])
    }

    fn flush(&mut self) -> Result<(), GraphicsError> {
        self.commands.push(BackendCommand::Flush);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TextureFormat, TextureUsage};

    #[test]
    fn records_commands_in_order() {
        let mut backend = DummyBackend::new();
        let desc =
            TextureDescriptor::new_2d(4, 4, TextureFormat::Rg16Float, TextureUsage::bake_target());
        let id = backend.create_texture(&desc).unwrap();
        backend.resize_depth(Extent2d::square(4)).unwrap();
        backend
            .set_color_attachment(Some(ColorAttachment {
                texture: id,
                layer: 0,
                mip: 0,
            }))
            .unwrap();
        backend.clear_color_attachment([0.0; 4]).unwrap();
        backend.flush().unwrap();

        let commands = backend.take_commands();
        assert_eq!(commands.len(), 5);
        assert!(matches!(commands[0], BackendCommand::CreateTexture { .. }));
        assert_eq!(commands[1], BackendCommand::ResizeDepth(Extent2d::square(4)));
        assert_eq!(commands[4], BackendCommand::Flush);
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn clear_requires_attachment() {
        let mut backend = DummyBackend::new();
        assert!(matches!(
            backend.clear_color_attachment([0.0; 4]),
            Err(GraphicsError::InvariantViolation(_))
        ));
    }

    #[test]
    fn readback_has_mip_area() {
        let mut backend = DummyBackend::new();
        let desc = TextureDescriptor::new_cube(8, TextureFormat::Rgba16Float, TextureUsage::bake_target())
            .with_mip_levels(4);
        let id = backend.create_texture(&desc).unwrap();
        assert_eq!(backend.read_texture(id, 3, 2).unwrap().len(), 4);
    }

    #[test]
    fn destroyed_texture_is_forgotten() {
        let mut backend = DummyBackend::new();
        let desc =
            TextureDescriptor::new_2d(2, 2, TextureFormat::Rgba8Unorm, TextureUsage::sampled_upload());
        let id = backend.create_texture(&desc).unwrap();
        backend.destroy_texture(id).unwrap();

        assert_eq!(backend.texture_count(), 0);
        assert_eq!(backend.commands()[1], BackendCommand::DestroyTexture(id));
        assert!(backend.read_texture(id, 0, 0).is_err());
        assert!(matches!(
            backend.destroy_texture(id),
            Err(GraphicsError::InvariantViolation(_))
        ));
    }
}

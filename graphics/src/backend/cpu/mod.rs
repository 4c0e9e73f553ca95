//! Reference software backend.
//!
//! The CPU backend evaluates each bake program once per texel of the bound
//! attachment instead of rasterizing. Bake draws are either the capture
//! cube seen from its center or the full-screen quad, and both cover every
//! texel, so the draw reduces to:
//!
//! - cube programs: unproject the texel center through the inverse
//!   view-projection and evaluate the program along that direction
//! - [`ShaderProgram::BrdfIntegration`]: evaluate at the texel's quad
//!   texcoord
//!
//! Textures are kept as `f32` texels and rounded to their format on write.

mod image;
mod programs;

use std::collections::HashMap;

use prism_core::math::{Mat4, Vec3, Vec4};
use prism_core::profile_scope;

use self::image::{CpuImage, Texel};
use super::{
    BackendId, BakeBackend, BufferId, ColorAttachment, DrawCommand, TexelData, TextureBinding, TextureId,
};
use crate::error::GraphicsError;
use crate::shader::ShaderProgram;
use crate::types::{BufferDescriptor, Extent2d, TextureDescriptor, TextureDimension};

/// CPU reference backend.
#[derive(Debug, Default)]
pub struct CpuBackend {
    id: BackendId,
    next_id: u64,
    textures: HashMap<TextureId, CpuImage>,
    buffers: HashMap<BufferId, Vec<u8>>,
    attachment: Option<ColorAttachment>,
    depth: Option<Extent2d>,
}

impl CpuBackend {
    /// Create a new CPU backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live textures.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Contents of a buffer created on this backend.
    pub fn buffer_contents(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn image(&self, texture: TextureId) -> Result<&CpuImage, GraphicsError> {
        self.textures.get(&texture).ok_or_else(|| {
            GraphicsError::InvariantViolation(format!("unknown texture {}", texture.raw()))
        })
    }

    fn image_mut(&mut self, texture: TextureId) -> Result<&mut CpuImage, GraphicsError> {
        self.textures.get_mut(&texture).ok_or_else(|| {
            GraphicsError::InvariantViolation(format!("unknown texture {}", texture.raw()))
        })
    }

    fn bound_target(&self) -> Result<(ColorAttachment, Extent2d), GraphicsError> {
        let attachment = self.attachment.ok_or_else(|| {
            GraphicsError::InvariantViolation("no color attachment bound".to_string())
        })?;
        let extent = self.image(attachment.texture)?.extent(attachment.mip);
        if self.depth != Some(extent) {
            return Err(GraphicsError::InvariantViolation(format!(
                "depth target {:?} does not match attachment {extent}",
                self.depth
            )));
        }
        Ok((attachment, extent))
    }

    fn input(
        &self,
        inputs: &[TextureBinding],
        program: ShaderProgram,
        dimension: TextureDimension,
    ) -> Result<&CpuImage, GraphicsError> {
        let binding = inputs.iter().find(|b| b.slot == 0).ok_or_else(|| {
            GraphicsError::InvariantViolation(format!("{program} needs a source texture"))
        })?;
        let image = self.image(binding.texture)?;
        if image.descriptor().dimension != dimension {
            return Err(GraphicsError::InvariantViolation(format!(
                "{program} expects a {dimension:?} source"
            )));
        }
        Ok(image)
    }
}

/// Unproject every texel center of an `extent` render into a direction.
fn texel_directions(view_proj: &Mat4, extent: Extent2d) -> Result<Vec<Vec3>, GraphicsError> {
    let inverse = view_proj.try_inverse().ok_or_else(|| {
        GraphicsError::InvariantViolation("capture view-projection is singular".to_string())
    })?;
    let mut dirs = Vec::with_capacity(extent.area());
    for y in 0..extent.height {
        for x in 0..extent.width {
            let ndc_x = (x as f32 + 0.5) / extent.width as f32 * 2.0 - 1.0;
            let ndc_y = (y as f32 + 0.5) / extent.height as f32 * 2.0 - 1.0;
            let world = inverse * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
            dirs.push(Vec3::new(world.x, world.y, world.z) / world.w);
        }
    }
    Ok(dirs)
}

fn view_proj_matrix(cols: &[[f32; 4]; 4]) -> Mat4 {
    Mat4::from_fn(|row, col| cols[col][row])
}

impl BakeBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "CPU Backend"
    }

    fn id(&self) -> BackendId {
        self.id
    }

    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
    ) -> Result<TextureId, GraphicsError> {
        if descriptor.size.area() == 0 {
            return Err(GraphicsError::ResourceExhaustion(format!(
                "texture {:?} has an empty extent",
                descriptor.label
            )));
        }
        if descriptor.mip_level_count == 0
            || descriptor.mip_level_count > descriptor.size.max_mip_levels()
        {
            return Err(GraphicsError::ResourceExhaustion(format!(
                "texture {:?} cannot hold {} mips at {}",
                descriptor.label, descriptor.mip_level_count, descriptor.size
            )));
        }
        log::trace!(
            "CpuBackend: creating texture {:?} ({}, {} mips)",
            descriptor.label,
            descriptor.size,
            descriptor.mip_level_count
        );
        let id = TextureId::new(self.allocate_id());
        self.textures.insert(id, CpuImage::new(descriptor));
        Ok(id)
    }

    fn destroy_texture(&mut self, texture: TextureId) -> Result<(), GraphicsError> {
        if self.attachment.is_some_and(|a| a.texture == texture) {
            self.attachment = None;
        }
        self.textures.remove(&texture).map(|_| ()).ok_or_else(|| {
            GraphicsError::InvariantViolation(format!("unknown texture {}", texture.raw()))
        })
    }

    fn write_texture(
        &mut self,
        texture: TextureId,
        layer: u32,
        mip: u32,
        data: TexelData<'_>,
    ) -> Result<(), GraphicsError> {
        let image = self.image_mut(texture)?;
        if !image.contains(layer, mip) {
            return Err(GraphicsError::InvariantViolation(format!(
                "layer {layer} mip {mip} out of range"
            )));
        }
        let expected = image.extent(mip).area();
        if data.texel_count() != expected {
            return Err(GraphicsError::InvariantViolation(format!(
                "expected {expected} texels, got {}",
                data.texel_count()
            )));
        }
        image.store(layer, mip, data.to_rgba_f32());
        Ok(())
    }

    fn create_buffer(
        &mut self,
        descriptor: &BufferDescriptor,
        contents: &[u8],
    ) -> Result<BufferId, GraphicsError> {
        log::trace!(
            "CpuBackend: creating buffer {:?} (size: {})",
            descriptor.label,
            descriptor.size
        );
        let id = BufferId::new(self.allocate_id());
        self.buffers.insert(id, contents.to_vec());
        Ok(id)
    }

    fn resize_depth(&mut self, extent: Extent2d) -> Result<(), GraphicsError> {
        self.depth = Some(extent);
        Ok(())
    }

    fn set_color_attachment(
        &mut self,
        attachment: Option<ColorAttachment>,
    ) -> Result<(), GraphicsError> {
        if let Some(attachment) = &attachment {
            let image = self.image(attachment.texture)?;
            if !image.contains(attachment.layer, attachment.mip) {
                return Err(GraphicsError::InvariantViolation(format!(
                    "attachment layer {} mip {} out of range",
                    attachment.layer, attachment.mip
                )));
            }
        }
        self.attachment = attachment;
        Ok(())
    }

    fn clear_color_attachment(&mut self, color: [f32; 4]) -> Result<(), GraphicsError> {
        let (attachment, extent) = self.bound_target()?;
        let image = self.image_mut(attachment.texture)?;
        image.store(
            attachment.layer,
            attachment.mip,
            vec![color; extent.area()],
        );
        Ok(())
    }

    fn draw(&mut self, command: &DrawCommand<'_>) -> Result<(), GraphicsError> {
        profile_scope!("cpu_draw");
        let (attachment, extent) = self.bound_target()?;
        if command.mesh.draw_count() == 0 {
            return Ok(());
        }
        let program = command.program;
        let uniforms = &command.uniforms;
        let view_proj = view_proj_matrix(&uniforms.view_proj);

        let texels: Vec<Texel> = match program {
            ShaderProgram::EquirectToCube => {
                let source = self.input(command.inputs, program, TextureDimension::D2)?;
                texel_directions(&view_proj, extent)?
                    .iter()
                    .map(|dir| programs::equirect_to_cube(source, dir))
                    .collect()
            }
            ShaderProgram::Irradiance => {
                let source = self.input(command.inputs, program, TextureDimension::Cube)?;
                texel_directions(&view_proj, extent)?
                    .iter()
                    .map(|dir| programs::irradiance(source, dir, uniforms))
                    .collect()
            }
            ShaderProgram::Prefilter => {
                let source = self.input(command.inputs, program, TextureDimension::Cube)?;
                texel_directions(&view_proj, extent)?
                    .iter()
                    .map(|dir| programs::prefilter(source, dir, uniforms))
                    .collect()
            }
            ShaderProgram::BrdfIntegration => {
                let mut texels = Vec::with_capacity(extent.area());
                for y in 0..extent.height {
                    for x in 0..extent.width {
                        let u = (x as f32 + 0.5) / extent.width as f32;
                        let v = (y as f32 + 0.5) / extent.height as f32;
                        texels.push(programs::integrate_brdf(u, v, uniforms.sample_count));
                    }
                }
                texels
            }
            ShaderProgram::Downsample | ShaderProgram::Background | ShaderProgram::Pbr => {
                return Err(GraphicsError::Unsupported(format!(
                    "CPU backend cannot draw {program}"
                )));
            }
        };

        log::trace!(
            "CpuBackend: {program} wrote {} texels to layer {} mip {}",
            texels.len(),
            attachment.layer,
            attachment.mip
        );
        self.image_mut(attachment.texture)?
            .store(attachment.layer, attachment.mip, texels);
        Ok(())
    }

    fn generate_mipmaps(&mut self, texture: TextureId) -> Result<(), GraphicsError> {
        profile_scope!("cpu_generate_mipmaps");
        self.image_mut(texture)?.generate_mipmaps();
        Ok(())
    }

    fn read_texture(
        &mut self,
        texture: TextureId,
        layer: u32,
        mip: u32,
    ) -> Result<Vec<[f32; 4]>, GraphicsError> {
        let image = self.image(texture)?;
        if !image.contains(layer, mip) {
            return Err(GraphicsError::InvariantViolation(format!(
                "layer {layer} mip {mip} out of range"
            )));
        }
        Ok(image.level(layer, mip).to_vec())
    }

    fn flush(&mut self) -> Result<(), GraphicsError> {
        Ok(())
    }
}

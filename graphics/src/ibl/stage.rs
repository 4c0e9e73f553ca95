//! Declarative bake stages and the routine that executes them.

use std::sync::Arc;
use std::time::Instant;

use prism_core::mesh::MeshKind;
use prism_core::profile_scope;

use super::settings::IblSettings;
use super::views::capture_view_projections;
use crate::backend::{BakeBackend, BakeUniforms, TextureBinding};
use crate::error::GraphicsError;
use crate::mesh::MeshCache;
use crate::render_target::RenderTargetManager;
use crate::shader::{ShaderLibrary, ShaderProgram};
use crate::types::{Extent2d, Texture, TextureDescriptor, TextureFormat, TextureUsage};

const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Where a stage renders from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureViews {
    /// Six capture cameras, one per cubemap face.
    CubeFaces,
    /// A single full-target draw with no camera.
    Fullscreen,
}

/// The texture a stage samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageInput {
    /// Nothing bound.
    None,
    /// The uploaded equirectangular environment.
    Environment,
    /// The radiance cubemap produced by the first stage.
    Radiance,
}

/// Everything [`execute_stage`] needs to know about one bake.
#[derive(Debug, Clone, PartialEq)]
pub struct BakeStage {
    pub name: &'static str,
    pub program: ShaderProgram,
    pub format: TextureFormat,
    /// Face (or table) size of mip 0.
    pub resolution: u32,
    /// Mip levels allocated for the output.
    pub mip_levels: u32,
    /// Mip levels rendered by draws, starting at 0.
    pub rendered_mips: u32,
    pub views: CaptureViews,
    pub mesh: MeshKind,
    pub input: StageInput,
    /// Fill the remaining mips from mip 0 after rendering.
    pub generate_mipmaps: bool,
    pub sample_delta: f32,
    pub sample_count: u32,
}

impl BakeStage {
    /// Equirect to cube, full mip chain filled by mip generation.
    pub fn radiance(settings: &IblSettings) -> Self {
        Self {
            name: "radiance",
            program: ShaderProgram::EquirectToCube,
            format: TextureFormat::Rgba16Float,
            resolution: settings.radiance_size,
            mip_levels: Extent2d::square(settings.radiance_size).max_mip_levels(),
            rendered_mips: 1,
            views: CaptureViews::CubeFaces,
            mesh: MeshKind::Cube,
            input: StageInput::Environment,
            generate_mipmaps: true,
            sample_delta: 0.0,
            sample_count: 0,
        }
    }

    /// Cosine-weighted convolution of the radiance cubemap.
    pub fn irradiance(settings: &IblSettings) -> Self {
        Self {
            name: "irradiance",
            program: ShaderProgram::Irradiance,
            format: TextureFormat::Rgba16Float,
            resolution: settings.irradiance_size,
            mip_levels: 1,
            rendered_mips: 1,
            views: CaptureViews::CubeFaces,
            mesh: MeshKind::Cube,
            input: StageInput::Radiance,
            generate_mipmaps: false,
            sample_delta: settings.irradiance_sample_delta,
            sample_count: 0,
        }
    }

    /// GGX prefilter, one roughness level per mip.
    pub fn prefilter(settings: &IblSettings) -> Self {
        Self {
            name: "prefilter",
            program: ShaderProgram::Prefilter,
            format: TextureFormat::Rgba16Float,
            resolution: settings.prefilter_size,
            mip_levels: settings.prefilter_mip_levels,
            rendered_mips: settings.prefilter_mip_levels,
            views: CaptureViews::CubeFaces,
            mesh: MeshKind::Cube,
            input: StageInput::Radiance,
            generate_mipmaps: false,
            sample_delta: 0.0,
            sample_count: settings.prefilter_sample_count,
        }
    }

    /// Split-sum BRDF integration table.
    pub fn brdf_lut(settings: &IblSettings) -> Self {
        Self {
            name: "brdf_lut",
            program: ShaderProgram::BrdfIntegration,
            format: TextureFormat::Rg16Float,
            resolution: settings.brdf_lut_size,
            mip_levels: 1,
            rendered_mips: 1,
            views: CaptureViews::Fullscreen,
            mesh: MeshKind::Quad,
            input: StageInput::None,
            generate_mipmaps: false,
            sample_delta: 0.0,
            sample_count: settings.brdf_sample_count,
        }
    }

    /// Roughness rendered into `mip`: `mip / (levels - 1)`, 0 for single-level stages.
    pub fn roughness(&self, mip: u32) -> f32 {
        if self.rendered_mips <= 1 {
            0.0
        } else {
            mip as f32 / (self.rendered_mips - 1) as f32
        }
    }

    /// Descriptor of the texture this stage writes.
    pub fn descriptor(&self) -> TextureDescriptor {
        let descriptor = match self.views {
            CaptureViews::CubeFaces => {
                TextureDescriptor::new_cube(self.resolution, self.format, TextureUsage::bake_target())
            }
            CaptureViews::Fullscreen => TextureDescriptor::new_2d(
                self.resolution,
                self.resolution,
                self.format,
                TextureUsage::bake_target(),
            ),
        };
        descriptor
            .with_label(self.name)
            .with_mip_levels(self.mip_levels)
    }
}

/// Run one stage and return the texture it produced.
///
/// Storage for every mip is allocated before the first draw. Each rendered
/// mip resizes the depth target to the mip extent and writes all of its
/// faces before the next mip starts.
pub fn execute_stage<B: BakeBackend>(
    target: &mut RenderTargetManager<B>,
    meshes: &MeshCache,
    shaders: &ShaderLibrary,
    stage: &BakeStage,
    source: Option<&Texture>,
) -> Result<Arc<Texture>, GraphicsError> {
    profile_scope!("execute_stage");
    let start = Instant::now();

    shaders.program(stage.program)?;
    if stage.input != StageInput::None && source.is_none() {
        return Err(GraphicsError::InvariantViolation(format!(
            "stage `{}` needs a {:?} input",
            stage.name, stage.input
        )));
    }
    if stage.rendered_mips == 0 || stage.rendered_mips > stage.mip_levels {
        return Err(GraphicsError::InvariantViolation(format!(
            "stage `{}` renders {} of {} mips",
            stage.name, stage.rendered_mips, stage.mip_levels
        )));
    }

    let output = target.create_texture(stage.descriptor())?;
    let mesh = meshes.get(stage.mesh, target.backend_mut())?;
    let inputs: Vec<TextureBinding> = source
        .map(|texture| TextureBinding::new(0, texture.id()))
        .into_iter()
        .collect();
    let source_resolution = source.map_or(0.0, |texture| texture.size().width as f32);

    for mip in 0..stage.rendered_mips {
        let extent = output.mip_extent(mip);
        target.begin_bake(extent.width, extent.height)?;

        let uniforms = BakeUniforms {
            roughness: stage.roughness(mip),
            sample_delta: stage.sample_delta,
            sample_count: stage.sample_count,
            source_resolution,
            ..BakeUniforms::default()
        };

        match stage.views {
            CaptureViews::CubeFaces => {
                for (face, view_proj) in capture_view_projections() {
                    target.attach_cube_face(&output, face, mip)?;
                    target.clear(CLEAR_COLOR)?;
                    target.draw(
                        stage.program,
                        &mesh,
                        &inputs,
                        BakeUniforms {
                            view_proj,
                            ..uniforms
                        },
                    )?;
                }
            }
            CaptureViews::Fullscreen => {
                target.attach_texture_2d(&output, mip)?;
                target.clear(CLEAR_COLOR)?;
                target.draw(stage.program, &mesh, &inputs, uniforms)?;
            }
        }
        log::debug!(
            "{}: mip {mip} ({extent}) roughness {:.2}",
            stage.name,
            uniforms.roughness
        );
    }
    target.end_bake()?;

    if stage.generate_mipmaps {
        target.generate_mipmaps(&output)?;
    }

    log::info!(
        "Baked {} ({}, {} mips) in {:.2?}",
        stage.name,
        output.size(),
        output.mip_level_count(),
        start.elapsed()
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stage_shapes() {
        let settings = IblSettings::default();
        let radiance = BakeStage::radiance(&settings);
        assert_eq!(radiance.mip_levels, 10);
        assert_eq!(radiance.rendered_mips, 1);
        assert!(radiance.generate_mipmaps);

        let brdf = BakeStage::brdf_lut(&settings);
        assert_eq!(brdf.format, TextureFormat::Rg16Float);
        assert_eq!(brdf.views, CaptureViews::Fullscreen);
        assert_eq!(brdf.mesh, MeshKind::Quad);
    }

    #[test]
    fn prefilter_roughness_spans_unit_range() {
        let stage = BakeStage::prefilter(&IblSettings::default());
        let schedule: Vec<f32> = (0..stage.rendered_mips).map(|m| stage.roughness(m)).collect();
        assert_eq!(schedule, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(BakeStage::irradiance(&IblSettings::default()).roughness(0), 0.0);
    }

    #[test]
    fn descriptor_matches_views() {
        let settings = IblSettings::default();
        assert!(BakeStage::prefilter(&settings).descriptor().dimension.layer_count() == 6);
        let brdf = BakeStage::brdf_lut(&settings).descriptor();
        assert_eq!(brdf.layer_count(), 1);
        assert_eq!(brdf.label.as_deref(), Some("brdf_lut"));
    }
}

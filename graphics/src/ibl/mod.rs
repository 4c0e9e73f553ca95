//! Image-based lighting precomputation.
//!
//! The pipeline turns one equirectangular HDR environment into the four
//! textures the live shading pass samples:
//!
//! | Stage | Output | Input |
//! |-------|--------|-------|
//! | radiance | `Rgba16Float` cube, full mip chain | environment |
//! | irradiance | `Rgba16Float` cube, 1 mip | radiance |
//! | prefilter | `Rgba16Float` cube, one mip per roughness | radiance |
//! | brdf_lut | `Rg16Float` 2D table | none |
//!
//! Stages are plain [`BakeStage`] values; [`execute_stage`] knows how to run
//! any of them.

mod settings;
mod stage;
mod views;

use std::sync::Arc;
use std::time::Instant;

use prism_core::profile_function;
use prism_core::texture::EnvironmentMap;

pub use settings::IblSettings;
pub use stage::{BakeStage, CaptureViews, StageInput, execute_stage};
pub use views::{capture_projection, capture_view_projections};

use crate::backend::{BakeBackend, TexelData};
use crate::error::GraphicsError;
use crate::mesh::MeshCache;
use crate::render_target::RenderTargetManager;
use crate::shader::ShaderLibrary;
use crate::types::{Texture, TextureDescriptor, TextureFormat, TextureUsage};

/// The baked lighting textures, shared read-only with the live pass.
///
/// The textures stay allocated on the backend until [`IblAssets::release`]
/// is called or the backend itself is dropped.
#[derive(Debug, Clone)]
pub struct IblAssets {
    pub radiance: Arc<Texture>,
    pub irradiance: Arc<Texture>,
    pub prefilter: Arc<Texture>,
    pub brdf_lut: Arc<Texture>,
}

impl IblAssets {
    /// Free all four textures. Every other clone must be dropped first.
    pub fn release<B: BakeBackend>(
        self,
        target: &mut RenderTargetManager<B>,
    ) -> Result<(), GraphicsError> {
        for texture in [self.radiance, self.irradiance, self.prefilter, self.brdf_lut] {
            target.destroy_texture(texture)?;
        }
        Ok(())
    }
}

/// Runs the four bake stages in order.
#[derive(Debug, Clone)]
pub struct IblPipeline {
    settings: IblSettings,
}

impl IblPipeline {
    /// Create a pipeline, rejecting unusable settings.
    pub fn new(settings: IblSettings) -> Result<Self, GraphicsError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &IblSettings {
        &self.settings
    }

    /// Stage descriptors in execution order.
    pub fn stages(&self) -> [BakeStage; 4] {
        [
            BakeStage::radiance(&self.settings),
            BakeStage::irradiance(&self.settings),
            BakeStage::prefilter(&self.settings),
            BakeStage::brdf_lut(&self.settings),
        ]
    }

    /// Upload `environment` and bake every asset from it.
    ///
    /// Any failure aborts the run.
    pub fn run<B: BakeBackend>(
        &self,
        target: &mut RenderTargetManager<B>,
        meshes: &MeshCache,
        shaders: &ShaderLibrary,
        environment: &EnvironmentMap,
    ) -> Result<IblAssets, GraphicsError> {
        profile_function!();
        let start = Instant::now();
        log::info!(
            "Precomputing IBL from {}x{} environment on {}",
            environment.width(),
            environment.height(),
            target.backend().name()
        );

        let texels = environment.to_rgba_f32();
        let equirect = target.upload_texture(
            TextureDescriptor::new_2d(
                environment.width(),
                environment.height(),
                TextureFormat::Rgba32Float,
                TextureUsage::sampled_upload(),
            )
            .with_label("environment"),
            TexelData::Rgba32Float(&texels),
        )?;

        let [radiance_stage, irradiance_stage, prefilter_stage, brdf_stage] = self.stages();
        let radiance = execute_stage(target, meshes, shaders, &radiance_stage, Some(&equirect))?;
        // Only the radiance stage samples the environment.
        target.destroy_texture(equirect)?;
        let irradiance =
            execute_stage(target, meshes, shaders, &irradiance_stage, Some(&radiance))?;
        let prefilter = execute_stage(target, meshes, shaders, &prefilter_stage, Some(&radiance))?;
        let brdf_lut = execute_stage(target, meshes, shaders, &brdf_stage, None)?;

        log::info!("IBL precomputation finished in {:.2?}", start.elapsed());
        Ok(IblAssets {
            radiance,
            irradiance,
            prefilter,
            brdf_lut,
        })
    }
}

//! Startup orchestration: bake the lighting, load materials, drive the session.

use std::fmt;
use std::time::{Duration, Instant};

use prism_graphics::{
    BakeBackend, IblPipeline, MeshCache, RenderTargetManager, ShaderLibrary, create_backend,
};

use crate::assets;
use crate::config::Config;
use crate::error::AppError;
use crate::session::Session;

/// Outcome of a [`App::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub backend: &'static str,
    pub environment: (u32, u32),
    pub radiance_size: u32,
    pub irradiance_size: u32,
    pub prefilter_size: u32,
    pub prefilter_mips: u32,
    pub brdf_lut_size: u32,
    pub materials: Vec<String>,
    pub selected_material: String,
    pub frames: u64,
    pub bake_time: Duration,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "backend:     {}", self.backend)?;
        writeln!(
            f,
            "environment: {}x{}",
            self.environment.0, self.environment.1
        )?;
        writeln!(
            f,
            "baked in {:.2?}: radiance {}², irradiance {}², prefilter {}² x {} mips, brdf {}²",
            self.bake_time,
            self.radiance_size,
            self.irradiance_size,
            self.prefilter_size,
            self.prefilter_mips,
            self.brdf_lut_size
        )?;
        writeln!(
            f,
            "materials:   {} (selected `{}`)",
            self.materials.join(", "),
            self.selected_material
        )?;
        write!(f, "frames:      {}", self.frames)
    }
}

/// The application, configured and ready to run.
#[derive(Debug, Clone)]
pub struct App {
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Bake the lighting textures and simulate the configured number of frames.
    ///
    /// Any failure aborts the run.
    pub fn run(&self) -> Result<RunSummary, AppError> {
        let settings = self.config.ibl_settings()?;
        let pipeline = IblPipeline::new(settings)?;
        let environment = assets::load_environment(self.config.hdr_path()?)?;

        let backend = create_backend(self.config.backend_kind()?)?;
        let backend_name = backend.name();
        let mut target = RenderTargetManager::new(backend);
        let shaders = ShaderLibrary::build()?;
        let meshes = MeshCache::new();

        let start = Instant::now();
        let assets = pipeline.run(&mut target, &meshes, &shaders, &environment)?;
        let bake_time = start.elapsed();

        let materials = match &self.config.materials {
            Some(dir) => assets::load_materials(dir, &mut target)?,
            None => {
                log::warn!("No materials directory given, using a flat default material");
                vec![assets::default_material(&mut target)?]
            }
        };

        let mut session = Session::new(
            assets.clone(),
            materials,
            meshes,
            self.config.material.as_deref(),
        )?;

        let frames = self.config.frames();
        let mut last = Instant::now();
        for _ in 0..frames {
            let now = Instant::now();
            session.advance((now - last).as_secs_f32());
            last = now;

            let frame = session.frame();
            let mesh = session.mesh(target.backend_mut())?;
            log::trace!(
                "Frame {}: {} ({} vertices), background {}",
                session.frame_count(),
                frame.mesh,
                mesh.vertex_count(),
                frame.draw_background
            );
        }
        target.backend_mut().flush()?;
        log::info!("Simulated {frames} frames in {:.2}s", session.elapsed());

        Ok(RunSummary {
            backend: backend_name,
            environment: (environment.width(), environment.height()),
            radiance_size: assets.radiance.size().width,
            irradiance_size: assets.irradiance.size().width,
            prefilter_size: assets.prefilter.size().width,
            prefilter_mips: assets.prefilter.mip_level_count(),
            brdf_lut_size: assets.brdf_lut.size().width,
            materials: session.material_names().map(str::to_string).collect(),
            selected_material: session.material().name.clone(),
            frames: session.frame_count(),
            bake_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_every_asset() {
        let summary = RunSummary {
            backend: "dummy",
            environment: (64, 32),
            radiance_size: 512,
            irradiance_size: 32,
            prefilter_size: 128,
            prefilter_mips: 5,
            brdf_lut_size: 512,
            materials: vec!["gold".to_string(), "wall".to_string()],
            selected_material: "gold".to_string(),
            frames: 3,
            bake_time: Duration::from_millis(12),
        };
        let text = summary.to_string();
        assert!(text.contains("backend:     dummy"));
        assert!(text.contains("prefilter 128² x 5 mips"));
        assert!(text.contains("gold, wall (selected `gold`)"));
        assert!(text.ends_with("frames:      3"));
    }

    #[test]
    fn missing_hdr_fails_before_any_backend_work() {
        let app = App::new(Config::default());
        assert!(matches!(app.run(), Err(AppError::Config(_))));
    }
}

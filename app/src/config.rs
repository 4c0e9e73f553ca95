//! Configuration loaded from an optional TOML file.
//!
//! Every key is optional:
//!
//! ```toml
//! hdr = "resource/hdr/apartment.hdr"
//! materials = "resource/pbr"
//! material = "gold"
//! backend = "wgpu"
//! frames = 120
//!
//! [ibl]
//! radiance_size = 256
//! prefilter_sample_count = 512
//! ```
//!
//! Command line flags override file values.

use std::path::{Path, PathBuf};

use prism_graphics::{BackendKind, IblSettings};
use serde::Deserialize;

use crate::args::Args;
use crate::error::AppError;

/// Frames simulated when neither the file nor the flags say otherwise.
pub const DEFAULT_FRAMES: u64 = 1;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub hdr: Option<PathBuf>,
    pub materials: Option<PathBuf>,
    pub material: Option<String>,
    /// `"auto"`, `"wgpu"`, `"cpu"` or `"dummy"`.
    pub backend: Option<String>,
    pub frames: Option<u64>,
    pub ibl: IblConfig,
}

/// Overrides of [`IblSettings`]; unset keys keep the defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IblConfig {
    pub radiance_size: Option<u32>,
    pub irradiance_size: Option<u32>,
    pub irradiance_sample_delta: Option<f32>,
    pub prefilter_size: Option<u32>,
    pub prefilter_mip_levels: Option<u32>,
    pub prefilter_sample_count: Option<u32>,
    pub brdf_lut_size: Option<u32>,
    pub brdf_sample_count: Option<u32>,
}

impl IblConfig {
    /// Apply the overrides on top of the default settings.
    pub fn settings(&self) -> IblSettings {
        let defaults = IblSettings::default();
        IblSettings {
            radiance_size: self.radiance_size.unwrap_or(defaults.radiance_size),
            irradiance_size: self.irradiance_size.unwrap_or(defaults.irradiance_size),
            irradiance_sample_delta: self
                .irradiance_sample_delta
                .unwrap_or(defaults.irradiance_sample_delta),
            prefilter_size: self.prefilter_size.unwrap_or(defaults.prefilter_size),
            prefilter_mip_levels: self
                .prefilter_mip_levels
                .unwrap_or(defaults.prefilter_mip_levels),
            prefilter_sample_count: self
                .prefilter_sample_count
                .unwrap_or(defaults.prefilter_sample_count),
            brdf_lut_size: self.brdf_lut_size.unwrap_or(defaults.brdf_lut_size),
            brdf_sample_count: self
                .brdf_sample_count
                .unwrap_or(defaults.brdf_sample_count),
        }
    }
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path).map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Build the effective config: the `--config` file if given, then the flags on top.
    pub fn resolve(args: &Args) -> Result<Self, AppError> {
        let mut config = match &args.config {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::load(path)?
            }
            None => Self::default(),
        };
        config.apply_args(args);
        Ok(config)
    }

    /// Override file values with the flags that were given.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(hdr) = &args.hdr {
            self.hdr = Some(hdr.clone());
        }
        if let Some(materials) = &args.materials {
            self.materials = Some(materials.clone());
        }
        if let Some(material) = &args.material {
            self.material = Some(material.clone());
        }
        if let Some(backend) = args.backend {
            self.backend = Some(BackendKind::from(backend).name().to_string());
        }
        if let Some(frames) = args.frames {
            self.frames = Some(frames);
        }
    }

    pub fn backend_kind(&self) -> Result<BackendKind, AppError> {
        match &self.backend {
            Some(name) => Ok(name.parse()?),
            None => Ok(BackendKind::Auto),
        }
    }

    pub fn ibl_settings(&self) -> Result<IblSettings, AppError> {
        let settings = self.ibl.settings();
        settings.validate()?;
        Ok(settings)
    }

    pub fn frames(&self) -> u64 {
        self.frames.unwrap_or(DEFAULT_FRAMES)
    }

    /// The HDR path, which is the one required input.
    pub fn hdr_path(&self) -> Result<&Path, AppError> {
        self.hdr.as_deref().ok_or_else(|| {
            AppError::Config("no HDR environment given (use --hdr or `hdr = ...`)".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::CliBackend;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            hdr = "sky.hdr"

            [ibl]
            prefilter_sample_count = 64
            "#,
        )
        .unwrap();
        let settings = config.ibl_settings().unwrap();
        assert_eq!(settings.prefilter_sample_count, 64);
        assert_eq!(settings.radiance_size, 512);
        assert_eq!(config.hdr_path().unwrap(), Path::new("sky.hdr"));
        assert_eq!(config.frames(), DEFAULT_FRAMES);
        assert_eq!(config.backend_kind().unwrap(), BackendKind::Auto);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            Config::from_toml_str("radiance = 3"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn flags_override_file_values() {
        let mut config = Config::from_toml_str(
            r#"
            hdr = "file.hdr"
            backend = "cpu"
            frames = 10
            "#,
        )
        .unwrap();
        let args = Args {
            hdr: Some(PathBuf::from("flag.hdr")),
            backend: Some(CliBackend::Dummy),
            ..Args::default()
        };
        config.apply_args(&args);

        assert_eq!(config.hdr_path().unwrap(), Path::new("flag.hdr"));
        assert_eq!(config.backend_kind().unwrap(), BackendKind::Dummy);
        assert_eq!(config.frames(), 10);
    }

    #[test]
    fn invalid_values_surface_as_errors() {
        let config = Config::from_toml_str("backend = \"metal\"").unwrap();
        assert!(matches!(config.backend_kind(), Err(AppError::Graphics(_))));

        let config = Config::from_toml_str("[ibl]\nprefilter_size = 4\nprefilter_mip_levels = 9")
            .unwrap();
        assert!(config.ibl_settings().is_err());
        assert!(Config::default().hdr_path().is_err());
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prism.toml");
        std::fs::write(&path, "material = \"gold\"\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.material.as_deref(), Some("gold"));

        assert!(matches!(
            Config::load(&dir.path().join("missing.toml")),
            Err(AppError::Io { .. })
        ));
    }
}

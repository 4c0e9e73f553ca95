//! Command line arguments.
//!
//! Uses clap for CLI parsing with:
//! - Help text (`--help`)
//! - Validation and clear error messages
//!
//! Every flag is optional; unset flags fall back to the configuration file
//! and then to the built-in defaults.

use std::path::PathBuf;

use clap::Parser;
use prism_graphics::BackendKind;

/// Bake backend selection for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CliBackend {
    /// Use the GPU when available, otherwise the CPU evaluator.
    #[default]
    Auto,
    /// GPU via wgpu.
    Wgpu,
    /// Software reference evaluator (slow at default sizes).
    Cpu,
    /// No-op backend for testing and CI environments.
    Dummy,
}

impl From<CliBackend> for BackendKind {
    fn from(cli: CliBackend) -> Self {
        match cli {
            CliBackend::Auto => BackendKind::Auto,
            CliBackend::Wgpu => BackendKind::Wgpu,
            CliBackend::Cpu => BackendKind::Cpu,
            CliBackend::Dummy => BackendKind::Dummy,
        }
    }
}

/// Prism application arguments.
#[derive(Parser, Debug, Clone, Default, PartialEq)]
#[command(
    name = "prism",
    about = "Image-based lighting precomputation and PBR viewer",
    long_about = "Bakes the radiance, irradiance, prefiltered and BRDF lookup textures \
        from an equirectangular HDR photograph, then drives the viewer session.\n\n\
        EXAMPLES:\n\
          # Bake on the GPU and simulate 120 frames\n\
          prism --hdr resource/hdr/apartment.hdr --materials resource/pbr --frames 120\n\
        \n\
          # Headless check of the pipeline order\n\
          prism --hdr sky.hdr --backend dummy --frames 1",
    version
)]
pub struct Args {
    /// Equirectangular Radiance HDR environment.
    #[arg(long)]
    pub hdr: Option<PathBuf>,

    /// Directory with one subdirectory per PBR material.
    #[arg(long)]
    pub materials: Option<PathBuf>,

    /// Material selected at startup.
    #[arg(long)]
    pub material: Option<String>,

    /// TOML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Bake backend to use.
    #[arg(long, value_enum)]
    pub backend: Option<CliBackend>,

    /// Exit after simulating N frames.
    #[arg(long)]
    pub frames: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_flag() {
        let args = Args::try_parse_from([
            "prism",
            "--hdr",
            "sky.hdr",
            "--materials",
            "pbr",
            "--material",
            "gold",
            "--backend",
            "cpu",
            "--frames",
            "3",
        ])
        .unwrap();
        assert_eq!(args.hdr, Some(PathBuf::from("sky.hdr")));
        assert_eq!(args.material.as_deref(), Some("gold"));
        assert_eq!(args.backend, Some(CliBackend::Cpu));
        assert_eq!(args.frames, Some(3));
        assert_eq!(args.config, None);
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(Args::try_parse_from(["prism", "--backend", "vulkan"]).is_err());
    }

    #[test]
    fn cli_backend_maps_to_kind() {
        assert_eq!(BackendKind::from(CliBackend::Dummy), BackendKind::Dummy);
        assert_eq!(BackendKind::from(CliBackend::default()), BackendKind::Auto);
    }
}

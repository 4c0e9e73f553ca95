//! Shader programs and their WGSL sources.
//!
//! Every program ships as a `.wgsl` file in `graphics/shaders/` with a
//! `vs_main` vertex entry point and an `fs_main` fragment entry point.
//!
//! | Program | Bind group 0 | Used by |
//! |---------|--------------|---------|
//! | [`ShaderProgram::EquirectToCube`] | bake uniforms, equirect 2D | radiance stage |
//! | [`ShaderProgram::Irradiance`] | bake uniforms, radiance cube | irradiance stage |
//! | [`ShaderProgram::Prefilter`] | bake uniforms, radiance cube | prefilter stage |
//! | [`ShaderProgram::BrdfIntegration`] | bake uniforms | BRDF LUT stage |
//! | [`ShaderProgram::Downsample`] | source 2D | GPU mip generation |
//! | [`ShaderProgram::Background`] | frame uniforms | live pass |
//! | [`ShaderProgram::Pbr`] | frame uniforms | live pass |

mod library;

pub use library::{CompiledProgram, ShaderLibrary};

/// Vertex entry point every program must export.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Fragment entry point every program must export.
pub const FRAGMENT_ENTRY: &str = "fs_main";

const EQUIRECT_TO_CUBE_SOURCE: &str = include_str!("../../shaders/equirect_to_cube.wgsl");
const IRRADIANCE_SOURCE: &str = include_str!("../../shaders/irradiance.wgsl");
const PREFILTER_SOURCE: &str = include_str!("../../shaders/prefilter.wgsl");
const BRDF_INTEGRATION_SOURCE: &str = include_str!("../../shaders/brdf_integration.wgsl");
const DOWNSAMPLE_SOURCE: &str = include_str!("../../shaders/downsample.wgsl");
const BACKGROUND_SOURCE: &str = include_str!("../../shaders/background.wgsl");
const PBR_SOURCE: &str = include_str!("../../shaders/pbr.wgsl");

/// The shader programs Prism builds at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderProgram {
    EquirectToCube,
    Irradiance,
    Prefilter,
    BrdfIntegration,
    Downsample,
    Background,
    Pbr,
}

impl ShaderProgram {
    /// All programs, in build order.
    pub const ALL: [ShaderProgram; 7] = [
        ShaderProgram::EquirectToCube,
        ShaderProgram::Irradiance,
        ShaderProgram::Prefilter,
        ShaderProgram::BrdfIntegration,
        ShaderProgram::Downsample,
        ShaderProgram::Background,
        ShaderProgram::Pbr,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::EquirectToCube => "equirect_to_cube",
            Self::Irradiance => "irradiance",
            Self::Prefilter => "prefilter",
            Self::BrdfIntegration => "brdf_integration",
            Self::Downsample => "downsample",
            Self::Background => "background",
            Self::Pbr => "pbr",
        }
    }

    /// WGSL source.
    pub fn source(&self) -> &'static str {
        match self {
            Self::EquirectToCube => EQUIRECT_TO_CUBE_SOURCE,
            Self::Irradiance => IRRADIANCE_SOURCE,
            Self::Prefilter => PREFILTER_SOURCE,
            Self::BrdfIntegration => BRDF_INTEGRATION_SOURCE,
            Self::Downsample => DOWNSAMPLE_SOURCE,
            Self::Background => BACKGROUND_SOURCE,
            Self::Pbr => PBR_SOURCE,
        }
    }

    /// Whether this program renders into a bake target.
    pub fn is_bake_program(&self) -> bool {
        matches!(
            self,
            Self::EquirectToCube | Self::Irradiance | Self::Prefilter | Self::BrdfIntegration
        )
    }
}

impl std::fmt::Display for ShaderProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

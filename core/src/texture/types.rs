use std::fmt;

/// Pixel formats understood by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8-bit RGBA, linear.
    Rgba8Unorm,
    /// 8-bit RGBA, sRGB encoded.
    Rgba8UnormSrgb,
    /// Half-float RGBA. Used for every HDR cubemap.
    Rgba16Float,
    /// Half-float RG. Used for the BRDF integration table.
    Rg16Float,
    /// Full-float RGBA. CPU-side staging for HDR data.
    Rgba32Float,
    /// Depth attachment.
    Depth24Plus,
}

/// Texture dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureDimension {
    /// Single 2D image (optionally mipmapped).
    #[default]
    D2,
    /// Six square faces in +X, -X, +Y, -Y, +Z, -Z order.
    Cube,
}

impl TextureDimension {
    /// Number of array layers.
    pub fn layer_count(&self) -> u32 {
        match self {
            Self::D2 => 1,
            Self::Cube => 6,
        }
    }
}

/// Error constructing CPU texture data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureError {
    /// Width or height is zero.
    ZeroExtent { width: u32, height: u32 },
    /// Data length does not match the extent.
    SizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroExtent { width, height } => {
                write!(f, "texture extent {width}x{height} has a zero dimension")
            }
            Self::SizeMismatch { expected, actual } => {
                write!(f, "texture data has {actual} elements, expected {expected}")
            }
        }
    }
}

impl std::error::Error for TextureError {}

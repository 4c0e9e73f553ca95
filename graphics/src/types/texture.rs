//! Texture types and descriptors.

use bitflags::bitflags;

use super::Extent2d;
use crate::backend::TextureId;
use prism_core::math::{Mat4, Vec3, look_at_rh};
use prism_core::texture::{TextureDimension, TextureFormat};

bitflags! {
    /// Usage flags for textures.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Texture can be copied from.
        const COPY_SRC = 1 << 0;
        /// Texture can be copied to.
        const COPY_DST = 1 << 1;
        /// Texture can be sampled in a shader.
        const TEXTURE_BINDING = 1 << 2;
        /// Texture can be used as a render attachment.
        const RENDER_ATTACHMENT = 1 << 3;
    }
}

impl TextureUsage {
    /// Usage for a texture written by a bake and sampled afterwards.
    pub fn bake_target() -> Self {
        Self::RENDER_ATTACHMENT | Self::TEXTURE_BINDING | Self::COPY_SRC
    }

    /// Usage for a texture uploaded from the CPU and sampled.
    pub fn sampled_upload() -> Self {
        Self::TEXTURE_BINDING | Self::COPY_DST | Self::COPY_SRC
    }
}

/// Descriptor for creating a texture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    /// Debug label.
    pub label: Option<String>,
    /// Size of mip 0 (of each face for cubemaps).
    pub size: Extent2d,
    /// Texel format.
    pub format: TextureFormat,
    /// 2D or cube.
    pub dimension: TextureDimension,
    /// Number of mip levels allocated up front.
    pub mip_level_count: u32,
    /// Usage flags.
    pub usage: TextureUsage,
}

impl TextureDescriptor {
    /// Create a descriptor for a single-mip 2D texture.
    pub fn new_2d(width: u32, height: u32, format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            label: None,
            size: Extent2d::new(width, height),
            format,
            dimension: TextureDimension::D2,
            mip_level_count: 1,
            usage,
        }
    }

    /// Create a descriptor for a cubemap with square faces.
    pub fn new_cube(size: u32, format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            label: None,
            size: Extent2d::square(size),
            format,
            dimension: TextureDimension::Cube,
            mip_level_count: 1,
            usage,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the number of mip levels.
    pub fn with_mip_levels(mut self, count: u32) -> Self {
        self.mip_level_count = count;
        self
    }

    /// Number of array layers (6 for cubemaps).
    pub fn layer_count(&self) -> u32 {
        self.dimension.layer_count()
    }

    /// Extent of mip `level`.
    pub fn mip_extent(&self, level: u32) -> Extent2d {
        self.size.mip(level)
    }
}

/// One face of a cubemap, in canonical layer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    /// All faces in layer order +X, -X, +Y, -Y, +Z, -Z.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Array layer of this face.
    pub fn layer(&self) -> u32 {
        match self {
            Self::PositiveX => 0,
            Self::NegativeX => 1,
            Self::PositiveY => 2,
            Self::NegativeY => 3,
            Self::PositiveZ => 4,
            Self::NegativeZ => 5,
        }
    }

    /// Face for an array layer.
    pub fn from_layer(layer: u32) -> Option<Self> {
        Self::ALL.get(layer as usize).copied()
    }

    /// Direction the capture camera looks along for this face.
    pub fn forward(&self) -> Vec3 {
        match self {
            Self::PositiveX => Vec3::new(1.0, 0.0, 0.0),
            Self::NegativeX => Vec3::new(-1.0, 0.0, 0.0),
            Self::PositiveY => Vec3::new(0.0, 1.0, 0.0),
            Self::NegativeY => Vec3::new(0.0, -1.0, 0.0),
            Self::PositiveZ => Vec3::new(0.0, 0.0, 1.0),
            Self::NegativeZ => Vec3::new(0.0, 0.0, -1.0),
        }
    }

    /// Up vector of the capture camera for this face.
    pub fn up(&self) -> Vec3 {
        match self {
            Self::PositiveY => Vec3::new(0.0, 0.0, 1.0),
            Self::NegativeY => Vec3::new(0.0, 0.0, -1.0),
            _ => Vec3::new(0.0, -1.0, 0.0),
        }
    }

    /// View matrix of the capture camera at the origin looking at this face.
    pub fn view_matrix(&self) -> Mat4 {
        look_at_rh(&Vec3::zeros(), &self.forward(), &self.up())
    }

    /// Face whose major axis contains `dir`.
    pub fn from_direction(dir: &Vec3) -> Self {
        let (ax, ay, az) = (dir.x.abs(), dir.y.abs(), dir.z.abs());
        if ax >= ay && ax >= az {
            if dir.x >= 0.0 {
                Self::PositiveX
            } else {
                Self::NegativeX
            }
        } else if ay >= az {
            if dir.y >= 0.0 {
                Self::PositiveY
            } else {
                Self::NegativeY
            }
        } else if dir.z >= 0.0 {
            Self::PositiveZ
        } else {
            Self::NegativeZ
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PositiveX => "+X",
            Self::NegativeX => "-X",
            Self::PositiveY => "+Y",
            Self::NegativeY => "-Y",
            Self::PositiveZ => "+Z",
            Self::NegativeZ => "-Z",
        }
    }
}

/// A backend texture together with the descriptor it was created from.
///
/// Baked assets are handed out as `Arc<Texture>` and never mutated again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Texture {
    id: TextureId,
    descriptor: TextureDescriptor,
}

impl Texture {
    pub fn new(id: TextureId, descriptor: TextureDescriptor) -> Self {
        Self { id, descriptor }
    }

    /// Backend handle.
    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }

    pub fn format(&self) -> TextureFormat {
        self.descriptor.format
    }

    pub fn dimension(&self) -> TextureDimension {
        self.descriptor.dimension
    }

    pub fn is_cube(&self) -> bool {
        self.descriptor.dimension == TextureDimension::Cube
    }

    pub fn mip_level_count(&self) -> u32 {
        self.descriptor.mip_level_count
    }

    /// Extent of mip 0.
    pub fn size(&self) -> Extent2d {
        self.descriptor.size
    }

    /// Extent of mip `level`.
    pub fn mip_extent(&self, level: u32) -> Extent2d {
        self.descriptor.mip_extent(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_layers_round_trip() {
        for (i, face) in CubeFace::ALL.iter().enumerate() {
            assert_eq!(face.layer() as usize, i);
            assert_eq!(CubeFace::from_layer(i as u32), Some(*face));
            assert_eq!(CubeFace::from_direction(&face.forward()), *face);
        }
        assert_eq!(CubeFace::from_layer(6), None);
    }

    #[test]
    fn capture_up_vectors_are_perpendicular() {
        for face in CubeFace::ALL {
            assert_eq!(face.forward().dot(&face.up()), 0.0);
        }
    }

    #[test]
    fn cube_descriptor_layers() {
        let desc = TextureDescriptor::new_cube(128, TextureFormat::Rgba16Float, TextureUsage::bake_target())
            .with_mip_levels(5)
            .with_label("prefilter");
        assert_eq!(desc.layer_count(), 6);
        assert_eq!(desc.mip_extent(4), Extent2d::square(8));
        assert_eq!(desc.label.as_deref(), Some("prefilter"));
    }
}

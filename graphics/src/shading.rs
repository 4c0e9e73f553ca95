//! Contract between the baked assets and the live shading pass.
//!
//! The PBR program reads its material and lighting textures from fixed
//! slots in bind group 1. The background program reuses slot 0 for the
//! radiance cubemap. Both read [`FrameUniforms`] from group 0.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use prism_core::camera::FlyCamera;
use prism_core::math::{Mat4, mat4_to_cols_array_2d};

use crate::backend::TextureBinding;
use crate::error::GraphicsError;
use crate::ibl::IblAssets;
use crate::types::{Texture, TextureDimension};

/// Texture slots of the live programs.
pub struct SamplerSlot;

impl SamplerSlot {
    pub const NORMAL: u32 = 0;
    pub const ALBEDO: u32 = 1;
    pub const METALLIC: u32 = 2;
    pub const ROUGHNESS: u32 = 3;
    pub const AO: u32 = 4;
    pub const IRRADIANCE: u32 = 5;
    pub const PREFILTER: u32 = 6;
    pub const BRDF_LUT: u32 = 7;
    /// Radiance cubemap slot of the background program.
    pub const BACKGROUND_ENVIRONMENT: u32 = 0;
    /// Binding of the shared sampler in group 1.
    pub const SAMPLER_BINDING: u32 = 8;
}

/// Near plane of the live projection.
pub const NEAR_PLANE: f32 = 0.1;
/// Far plane of the live projection.
pub const FAR_PLANE: f32 = 100.0;

/// World positions of the four punctual lights.
pub const LIGHT_POSITIONS: [[f32; 3]; 4] = [
    [-10.0, 10.0, 10.0],
    [10.0, 10.0, 10.0],
    [-10.0, -10.0, 10.0],
    [10.0, -10.0, 10.0],
];

/// Radiant intensity shared by every punctual light.
pub const LIGHT_COLOR: [f32; 3] = [300.0, 300.0, 300.0];

/// Which lighting terms the PBR program evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightingToggles {
    pub punctual_light: bool,
    pub image_based_light: bool,
}

impl Default for LightingToggles {
    fn default() -> Self {
        Self {
            punctual_light: true,
            image_based_light: true,
        }
    }
}

/// Uniform block of the PBR and background programs.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub light_positions: [[f32; 4]; 4],
    pub light_colors: [[f32; 4]; 4],
    pub camera_position: [f32; 3],
    pub punctual_light: u32,
    pub image_based_light: u32,
    pub _padding: [u32; 3],
}

static_assertions::const_assert_eq!(std::mem::size_of::<FrameUniforms>(), 352);

impl FrameUniforms {
    /// Assemble the per-frame block from the camera and the drawn model.
    pub fn from_camera(
        camera: &FlyCamera,
        model: &Mat4,
        aspect: f32,
        toggles: &LightingToggles,
    ) -> Self {
        let position = camera.position();
        Self {
            model: mat4_to_cols_array_2d(model),
            view: mat4_to_cols_array_2d(&camera.view_matrix()),
            projection: mat4_to_cols_array_2d(&camera.projection_matrix(
                aspect,
                NEAR_PLANE,
                FAR_PLANE,
            )),
            light_positions: LIGHT_POSITIONS.map(|[x, y, z]| [x, y, z, 1.0]),
            light_colors: [[LIGHT_COLOR[0], LIGHT_COLOR[1], LIGHT_COLOR[2], 1.0]; 4],
            camera_position: [position.x, position.y, position.z],
            punctual_light: toggles.punctual_light as u32,
            image_based_light: toggles.image_based_light as u32,
            _padding: [0; 3],
        }
    }

    pub fn toggles(&self) -> LightingToggles {
        LightingToggles {
            punctual_light: self.punctual_light != 0,
            image_based_light: self.image_based_light != 0,
        }
    }
}

/// The five textures of one material.
#[derive(Debug, Clone)]
pub struct MaterialTextures {
    pub name: String,
    pub normal: Arc<Texture>,
    pub albedo: Arc<Texture>,
    pub metallic: Arc<Texture>,
    pub roughness: Arc<Texture>,
    pub ao: Arc<Texture>,
}

/// Baked assets paired with the selected material.
#[derive(Debug, Clone)]
pub struct ShadingBindings {
    assets: IblAssets,
    material: MaterialTextures,
}

impl ShadingBindings {
    /// Pair `assets` with `material`, checking each texture has the kind its slot expects.
    pub fn new(assets: IblAssets, material: MaterialTextures) -> Result<Self, GraphicsError> {
        let expected = [
            ("radiance", &assets.radiance, TextureDimension::Cube),
            ("irradiance", &assets.irradiance, TextureDimension::Cube),
            ("prefilter", &assets.prefilter, TextureDimension::Cube),
            ("brdf_lut", &assets.brdf_lut, TextureDimension::D2),
            ("normal", &material.normal, TextureDimension::D2),
            ("albedo", &material.albedo, TextureDimension::D2),
            ("metallic", &material.metallic, TextureDimension::D2),
            ("roughness", &material.roughness, TextureDimension::D2),
            ("ao", &material.ao, TextureDimension::D2),
        ];
        for (name, texture, dimension) in expected {
            if texture.dimension() != dimension {
                return Err(GraphicsError::InvariantViolation(format!(
                    "{name} texture must be {dimension:?}, got {:?}",
                    texture.dimension()
                )));
            }
        }
        Ok(Self { assets, material })
    }

    pub fn assets(&self) -> &IblAssets {
        &self.assets
    }

    pub fn material(&self) -> &MaterialTextures {
        &self.material
    }

    /// Swap in another material, keeping the baked assets.
    pub fn with_material(self, material: MaterialTextures) -> Result<Self, GraphicsError> {
        Self::new(self.assets, material)
    }

    /// Bindings of the PBR program, ordered by slot.
    pub fn pbr_bindings(&self) -> [TextureBinding; 8] {
        let m = &self.material;
        let a = &self.assets;
        [
            TextureBinding::new(SamplerSlot::NORMAL, m.normal.id()),
            TextureBinding::new(SamplerSlot::ALBEDO, m.albedo.id()),
            TextureBinding::new(SamplerSlot::METALLIC, m.metallic.id()),
            TextureBinding::new(SamplerSlot::ROUGHNESS, m.roughness.id()),
            TextureBinding::new(SamplerSlot::AO, m.ao.id()),
            TextureBinding::new(SamplerSlot::IRRADIANCE, a.irradiance.id()),
            TextureBinding::new(SamplerSlot::PREFILTER, a.prefilter.id()),
            TextureBinding::new(SamplerSlot::BRDF_LUT, a.brdf_lut.id()),
        ]
    }

    /// Bindings of the background program.
    pub fn background_bindings(&self) -> [TextureBinding; 1] {
        [TextureBinding::new(
            SamplerSlot::BACKGROUND_ENVIRONMENT,
            self.assets.radiance.id(),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TextureId;
    use crate::shader::{ShaderLibrary, ShaderProgram};
    use crate::types::{TextureDescriptor, TextureFormat, TextureUsage};
    use prism_core::math::{Vec3, mat4_from_translation};

    fn texture(id: u64, cube: bool) -> Arc<Texture> {
        let descriptor = if cube {
            TextureDescriptor::new_cube(4, TextureFormat::Rgba16Float, TextureUsage::bake_target())
        } else {
            TextureDescriptor::new_2d(4, 4, TextureFormat::Rgba8Unorm, TextureUsage::sampled_upload())
        };
        Arc::new(Texture::new(TextureId::new(id), descriptor))
    }

    fn assets() -> IblAssets {
        IblAssets {
            radiance: texture(1, true),
            irradiance: texture(2, true),
            prefilter: texture(3, true),
            brdf_lut: texture(4, false),
        }
    }

    fn material() -> MaterialTextures {
        MaterialTextures {
            name: "gold".to_string(),
            normal: texture(10, false),
            albedo: texture(11, false),
            metallic: texture(12, false),
            roughness: texture(13, false),
            ao: texture(14, false),
        }
    }

    #[test]
    fn frame_uniforms_follow_the_camera() {
        let camera = FlyCamera::default();
        let model = mat4_from_translation(Vec3::new(1.0, 0.0, 0.0));
        let toggles = LightingToggles {
            punctual_light: false,
            image_based_light: true,
        };
        let uniforms = FrameUniforms::from_camera(&camera, &model, 16.0 / 9.0, &toggles);

        assert_eq!(uniforms.camera_position, [0.0, 0.0, 10.0]);
        assert_eq!(uniforms.model[3][0], 1.0);
        assert_eq!(uniforms.light_positions[1], [10.0, 10.0, 10.0, 1.0]);
        assert_eq!(uniforms.light_colors[0][0], 300.0);
        assert_eq!(uniforms.toggles(), toggles);
    }

    #[test]
    fn pbr_bindings_follow_slot_order() {
        let bindings = ShadingBindings::new(assets(), material()).unwrap();
        let pbr = bindings.pbr_bindings();
        for (slot, binding) in pbr.iter().enumerate() {
            assert_eq!(binding.slot, slot as u32);
        }
        assert_eq!(pbr[SamplerSlot::IRRADIANCE as usize].texture, TextureId::new(2));
        assert_eq!(bindings.background_bindings()[0].texture, TextureId::new(1));
    }

    #[test]
    fn rejects_slot_kind_mismatch() {
        let mut wrong = assets();
        wrong.brdf_lut = texture(4, true);
        assert!(matches!(
            ShadingBindings::new(wrong, material()),
            Err(GraphicsError::InvariantViolation(_))
        ));
    }

    #[test]
    fn live_programs_bind_the_declared_slots() {
        let library =
            ShaderLibrary::build_programs(&[ShaderProgram::Pbr, ShaderProgram::Background])
                .unwrap();
        let pbr = library.program(ShaderProgram::Pbr).unwrap().bindings();
        for slot in 0..=SamplerSlot::SAMPLER_BINDING {
            assert!(pbr.contains(&(1, slot)), "missing pbr binding {slot}");
        }
        let background = library.program(ShaderProgram::Background).unwrap().bindings();
        assert!(background.contains(&(1, SamplerSlot::BACKGROUND_ENVIRONMENT)));
        assert!(background.contains(&(1, SamplerSlot::SAMPLER_BINDING)));
    }
}

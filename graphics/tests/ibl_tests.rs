//! Bake integration tests.
//!
//! Each test runs against every backend with `rstest`. Backends that are not
//! available (no GPU adapter, feature disabled) are skipped.
//!
//! ```bash
//! cargo test -p prism-graphics --test ibl_tests
//! ```

mod common;

use rstest::rstest;

use common::{Backend, TestContext, assert_texels_near, small_settings, split_environment};
use prism_core::texture::EnvironmentMap;
use prism_graphics::{CubeFace, IblPipeline, TextureFormat};

const RADIANCE: [f32; 3] = [0.5, 0.25, 1.0];

fn bake_constant(ctx: &mut TestContext) -> prism_graphics::IblAssets {
    let environment = EnvironmentMap::uniform(2, 1, RADIANCE).unwrap();
    let pipeline = IblPipeline::new(small_settings()).unwrap();
    pipeline
        .run(&mut ctx.target, &ctx.meshes, &ctx.shaders, &environment)
        .unwrap()
}

// ============================================================================
// Constant environment
// ============================================================================

/// A constant environment stays constant through every stage.
#[rstest]
#[case::cpu(Backend::Cpu)]
#[case::wgpu(Backend::Wgpu)]
fn test_constant_environment_bakes_constant_lighting(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    let assets = bake_constant(&mut ctx);

    assert_eq!(assets.radiance.mip_level_count(), 4);
    assert_eq!(assets.prefilter.mip_level_count(), 3);
    assert_eq!(assets.brdf_lut.format(), TextureFormat::Rg16Float);

    for face in CubeFace::ALL {
        for mip in [0, 3] {
            let texels = ctx.target.read_texture(&assets.radiance, face.layer(), mip).unwrap();
            assert_texels_near(&texels, RADIANCE, 0.01, "radiance");
        }

        // Discrete hemisphere sums stay within a few percent of the integral.
        let texels = ctx.target.read_texture(&assets.irradiance, face.layer(), 0).unwrap();
        assert_texels_near(&texels, RADIANCE, 0.05, "irradiance");

        for mip in 0..3 {
            let texels = ctx.target.read_texture(&assets.prefilter, face.layer(), mip).unwrap();
            assert_eq!(texels.len(), (8usize >> mip).pow(2));
            assert_texels_near(&texels, RADIANCE, 0.02, "prefilter");
        }
    }
}

// ============================================================================
// Orientation
// ============================================================================

/// The bright upper hemisphere lands on +Y, and on the bottom rows of the
/// side faces whose capture up vector is -Y.
#[rstest]
#[case::cpu(Backend::Cpu)]
#[case::wgpu(Backend::Wgpu)]
fn test_radiance_faces_follow_capture_orientation(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    let environment = split_environment(8, 4, 1.0, 0.0);
    let pipeline = IblPipeline::new(small_settings()).unwrap();
    let assets = pipeline
        .run(&mut ctx.target, &ctx.meshes, &ctx.shaders, &environment)
        .unwrap();

    let top = ctx
        .target
        .read_texture(&assets.radiance, CubeFace::PositiveY.layer(), 0)
        .unwrap();
    assert_texels_near(&top, [1.0; 3], 0.01, "+Y");
    let bottom = ctx
        .target
        .read_texture(&assets.radiance, CubeFace::NegativeY.layer(), 0)
        .unwrap();
    assert_texels_near(&bottom, [0.0; 3], 0.01, "-Y");

    let side = ctx
        .target
        .read_texture(&assets.radiance, CubeFace::PositiveX.layer(), 0)
        .unwrap();
    assert_texels_near(&side[..8], [1.0; 3], 0.01, "+X first row");
    assert_texels_near(&side[56..], [0.0; 3], 0.01, "+X last row");
}

// ============================================================================
// BRDF table
// ============================================================================

#[rstest]
#[case::cpu(Backend::Cpu)]
#[case::wgpu(Backend::Wgpu)]
fn test_brdf_lut_is_environment_independent(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    let first = bake_constant(&mut ctx);
    let first_lut = ctx.target.read_texture(&first.brdf_lut, 0, 0).unwrap();

    let pipeline = IblPipeline::new(small_settings()).unwrap();
    let second = pipeline
        .run(
            &mut ctx.target,
            &ctx.meshes,
            &ctx.shaders,
            &split_environment(8, 4, 4.0, 0.5),
        )
        .unwrap();
    let second_lut = ctx.target.read_texture(&second.brdf_lut, 0, 0).unwrap();
    assert_eq!(first_lut, second_lut);

    for texel in &first_lut {
        assert!((0.0..=1.05).contains(&texel[0]), "scale {}", texel[0]);
        assert!((0.0..=1.0).contains(&texel[1]), "bias {}", texel[1]);
    }

    // Row 0 is the smoothest roughness; grazing-free views reflect nearly all light.
    let smooth_head_on = first_lut[7];
    assert!((smooth_head_on[0] + smooth_head_on[1] - 1.0).abs() < 0.1);
}

// ============================================================================
// Texture lifetime
// ============================================================================

/// Only the four outputs outlive a run; releasing them frees everything.
#[cfg(feature = "cpu")]
#[test]
fn test_run_keeps_only_the_baked_outputs() {
    use prism_graphics::{CpuBackend, MeshCache, RenderTargetManager, ShaderLibrary};

    let mut target = RenderTargetManager::new(CpuBackend::new());
    let meshes = MeshCache::new();
    let shaders = ShaderLibrary::build().unwrap();
    let pipeline = IblPipeline::new(small_settings()).unwrap();
    let environment = EnvironmentMap::uniform(2, 1, RADIANCE).unwrap();

    let assets = pipeline
        .run(&mut target, &meshes, &shaders, &environment)
        .unwrap();
    assert_eq!(target.backend().texture_count(), 4);

    assets.release(&mut target).unwrap();
    assert_eq!(target.backend().texture_count(), 0);

    let _again = pipeline
        .run(&mut target, &meshes, &shaders, &environment)
        .unwrap();
    assert_eq!(target.backend().texture_count(), 4);
}

// ============================================================================
// Failures
// ============================================================================

#[rstest]
#[case::cpu(Backend::Cpu)]
#[case::wgpu(Backend::Wgpu)]
fn test_oversized_target_is_resource_exhaustion(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    let descriptor = prism_graphics::TextureDescriptor::new_cube(
        8,
        TextureFormat::Rgba16Float,
        prism_graphics::TextureUsage::bake_target(),
    )
    .with_mip_levels(16);
    assert!(matches!(
        ctx.target.create_texture(descriptor),
        Err(prism_graphics::GraphicsError::ResourceExhaustion(_))
    ));
}

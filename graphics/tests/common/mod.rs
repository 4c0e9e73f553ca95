//! Common utilities for bake integration tests.
//!
//! This module provides shared test infrastructure that can be reused
//! across different backend implementations.

use prism_core::texture::EnvironmentMap;
use prism_graphics::{
    BackendKind, BakeBackend, IblSettings, MeshCache, RenderTargetManager, ShaderLibrary,
    create_backend,
};

// ============================================================================
// Backend Enumeration
// ============================================================================

/// Backends the integration tests run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// CPU reference evaluator.
    Cpu,
    /// GPU via wgpu.
    Wgpu,
}

impl Backend {
    /// Check if this backend is compiled in.
    pub fn is_available(&self) -> bool {
        match self {
            #[cfg(feature = "cpu")]
            Backend::Cpu => true,
            #[cfg(not(feature = "cpu"))]
            Backend::Cpu => false,
            #[cfg(feature = "wgpu-backend")]
            Backend::Wgpu => true,
            #[cfg(not(feature = "wgpu-backend"))]
            Backend::Wgpu => false,
        }
    }

    pub fn kind(self) -> BackendKind {
        match self {
            Backend::Cpu => BackendKind::Cpu,
            Backend::Wgpu => BackendKind::Wgpu,
        }
    }
}

// ============================================================================
// Test Context
// ============================================================================

/// Everything a bake needs, on one backend.
pub struct TestContext {
    #[allow(dead_code)]
    pub backend: Backend,
    pub target: RenderTargetManager<Box<dyn BakeBackend>>,
    pub meshes: MeshCache,
    pub shaders: ShaderLibrary,
}

impl TestContext {
    /// Create a new test context for the given backend.
    ///
    /// Returns `None` if the backend is not available (no adapter, or the
    /// feature is disabled).
    pub fn new(backend: Backend) -> Option<Self> {
        if !backend.is_available() {
            return None;
        }
        let _ = env_logger::builder().is_test(true).try_init();

        let bake_backend = create_backend(backend.kind()).ok()?;
        let shaders = ShaderLibrary::build().expect("shipped shaders must build");
        Some(Self {
            backend,
            target: RenderTargetManager::new(bake_backend),
            meshes: MeshCache::new(),
            shaders,
        })
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Bake sizes small enough for the CPU evaluator.
pub fn small_settings() -> IblSettings {
    IblSettings {
        radiance_size: 8,
        irradiance_size: 4,
        irradiance_sample_delta: 0.1,
        prefilter_size: 8,
        prefilter_mip_levels: 3,
        prefilter_sample_count: 32,
        brdf_lut_size: 8,
        brdf_sample_count: 64,
    }
}

/// An environment whose upper half is `top` and lower half is `bottom`.
pub fn split_environment(width: u32, height: u32, top: f32, bottom: f32) -> EnvironmentMap {
    let data = (0..height)
        .flat_map(|y| {
            let value = if y >= height / 2 { top } else { bottom };
            std::iter::repeat_n(value, width as usize * 3)
        })
        .collect();
    EnvironmentMap::new(width, height, data).expect("valid environment")
}

/// Assert every texel's color channels are within `tolerance` of `expected`.
pub fn assert_texels_near(texels: &[[f32; 4]], expected: [f32; 3], tolerance: f32, what: &str) {
    for (i, texel) in texels.iter().enumerate() {
        for c in 0..3 {
            assert!(
                (texel[c] - expected[c]).abs() <= tolerance,
                "{what}: texel {i} channel {c} is {}, expected {} ± {tolerance}",
                texel[c],
                expected[c]
            );
        }
    }
}

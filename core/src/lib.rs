//! # Prism Core
//!
//! GPU-agnostic building blocks for Prism: math helpers, procedural meshes,
//! the free-fly camera and CPU-side texture data.

pub mod camera;
pub mod math;
pub mod mesh;
pub mod profiling;
pub mod texture;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the core version and start the profiler if enabled.
pub fn init() {
    profiling::start();
    log::info!("Prism Core v{} initialized", VERSION);
}

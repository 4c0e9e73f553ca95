//! CPU-side texture types.
//!
//! Provides [`EnvironmentMap`] for the equirectangular HDR source, along
//! with the [`TextureFormat`] and [`TextureDimension`] enums shared between
//! CPU and GPU code.

mod environment;
mod types;

pub use environment::{EnvironmentMap, direction_to_equirect_uv};
pub use types::{TextureDimension, TextureError, TextureFormat};

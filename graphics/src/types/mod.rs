//! Common types and descriptors for graphics resources.
//!
//! This module contains usage flags, extents and descriptor structs used by
//! every backend. Pixel formats and texture dimensions are shared with
//! `prism-core`.

mod buffer;
mod common;
mod texture;

pub use buffer::{BufferDescriptor, BufferUsage};
pub use common::Extent2d;
pub use prism_core::texture::{TextureDimension, TextureFormat};
pub use texture::{CubeFace, Texture, TextureDescriptor, TextureUsage};

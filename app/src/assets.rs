//! Loading the HDR environment and the PBR material maps from disk.

use std::path::Path;
use std::sync::Arc;

use prism_core::texture::EnvironmentMap;
use prism_graphics::backend::TexelData;
use prism_graphics::{
    BakeBackend, MaterialTextures, RenderTargetManager, Texture, TextureDescriptor, TextureFormat,
    TextureUsage,
};

use crate::error::AppError;

/// Image files every material directory must contain, in binding order.
pub const MATERIAL_MAPS: [&str; 5] = ["normal", "albedo", "metallic", "roughness", "ao"];

/// Material selected when none is requested and it is available.
pub const DEFAULT_MATERIAL: &str = "rusted_iron";

/// Load an equirectangular Radiance HDR file.
///
/// Decoders return the top row first; the map is flipped so row 0 is the
/// bottom of the photograph.
pub fn load_environment(path: &Path) -> Result<EnvironmentMap, AppError> {
    let image = image::ImageReader::open(path)
        .map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .with_guessed_format()
        .map_err(|e| AppError::asset(path, e))?
        .decode()
        .map_err(|e| AppError::asset(path, e))?;

    let rgb = image.to_rgb32f();
    let (width, height) = rgb.dimensions();
    let environment = EnvironmentMap::from_top_down(width, height, rgb.into_raw())
        .map_err(|e| AppError::asset(path, e))?;
    log::info!("Loaded environment {} ({width}x{height})", path.display());
    Ok(environment)
}

/// Names of the material subdirectories of `dir`, sorted.
pub fn discover_materials(dir: &Path) -> Result<Vec<String>, AppError> {
    let io_error = |source| AppError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        if entry.file_type().map_err(io_error)?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Load and upload the five maps of `dir/name`.
pub fn load_material<B: BakeBackend>(
    dir: &Path,
    name: &str,
    target: &mut RenderTargetManager<B>,
) -> Result<MaterialTextures, AppError> {
    let root = dir.join(name);
    let mut maps = Vec::with_capacity(MATERIAL_MAPS.len());
    for map in MATERIAL_MAPS {
        let path = root.join(format!("{map}.png"));
        let image = image::open(&path).map_err(|e| AppError::asset(&path, e))?;
        // Texture coordinates put v = 0 at the first uploaded row.
        let rgba = image.flipv().to_rgba8();
        let (width, height) = rgba.dimensions();
        let descriptor = TextureDescriptor::new_2d(
            width,
            height,
            TextureFormat::Rgba8Unorm,
            TextureUsage::sampled_upload(),
        )
        .with_label(format!("{name}/{map}"));
        maps.push(target.upload_texture(descriptor, TexelData::Rgba8(rgba.as_raw()))?);
    }
    log::debug!("Loaded material `{name}`");
    into_material(name, maps)
}

/// Load every material under `dir`.
pub fn load_materials<B: BakeBackend>(
    dir: &Path,
    target: &mut RenderTargetManager<B>,
) -> Result<Vec<MaterialTextures>, AppError> {
    let names = discover_materials(dir)?;
    if names.is_empty() {
        return Err(AppError::asset(dir, "no material directories found"));
    }
    let materials = names
        .iter()
        .map(|name| load_material(dir, name, target))
        .collect::<Result<Vec<_>, _>>()?;
    log::info!("Loaded {} materials from {}", materials.len(), dir.display());
    Ok(materials)
}

/// A flat, mid-rough dielectric built from 1x1 maps.
pub fn default_material<B: BakeBackend>(
    target: &mut RenderTargetManager<B>,
) -> Result<MaterialTextures, AppError> {
    const TEXELS: [[u8; 4]; 5] = [
        [128, 128, 255, 255],
        [200, 200, 200, 255],
        [0, 0, 0, 255],
        [128, 128, 128, 255],
        [255, 255, 255, 255],
    ];
    let mut maps = Vec::with_capacity(TEXELS.len());
    for (map, texel) in MATERIAL_MAPS.iter().zip(TEXELS) {
        let descriptor =
            TextureDescriptor::new_2d(1, 1, TextureFormat::Rgba8Unorm, TextureUsage::sampled_upload())
                .with_label(format!("default/{map}"));
        maps.push(target.upload_texture(descriptor, TexelData::Rgba8(&texel))?);
    }
    into_material("default", maps)
}

fn into_material(name: &str, maps: Vec<Arc<Texture>>) -> Result<MaterialTextures, AppError> {
    let [normal, albedo, metallic, roughness, ao]: [Arc<Texture>; 5] = maps
        .try_into()
        .map_err(|_| AppError::Config(format!("material `{name}` is missing maps")))?;
    Ok(MaterialTextures {
        name: name.to_string(),
        normal,
        albedo,
        metallic,
        roughness,
        ao,
    })
}

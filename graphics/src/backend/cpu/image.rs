//! Texel storage and filtering for the CPU backend.
//!
//! Rows are stored bottom-up: row 0 holds NDC `y = -1` of a render and
//! `v = 0` of a sampled texture. Cubemap faces use the capture cameras of
//! [`CubeFace`], which makes the layout identical to the one GPU cube
//! sampling expects.

use half::f16;
use prism_core::math::{Vec3, Vec4};

use crate::types::{CubeFace, Extent2d, TextureDescriptor, TextureFormat};

pub(super) type Texel = [f32; 4];

/// Every layer and mip of one texture.
#[derive(Debug, Clone)]
pub(super) struct CpuImage {
    descriptor: TextureDescriptor,
    // levels[layer][mip]
    levels: Vec<Vec<Vec<Texel>>>,
}

impl CpuImage {
    pub fn new(descriptor: &TextureDescriptor) -> Self {
        let levels = (0..descriptor.layer_count())
            .map(|_| {
                (0..descriptor.mip_level_count)
                    .map(|mip| vec![[0.0; 4]; descriptor.mip_extent(mip).area()])
                    .collect()
            })
            .collect();
        Self {
            descriptor: descriptor.clone(),
            levels,
        }
    }

    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    pub fn extent(&self, mip: u32) -> Extent2d {
        self.descriptor.mip_extent(mip)
    }

    pub fn mip_count(&self) -> u32 {
        self.descriptor.mip_level_count
    }

    pub fn contains(&self, layer: u32, mip: u32) -> bool {
        layer < self.descriptor.layer_count() && mip < self.descriptor.mip_level_count
    }

    pub fn level(&self, layer: u32, mip: u32) -> &[Texel] {
        &self.levels[layer as usize][mip as usize]
    }

    /// Replace one level, quantizing to the texture format.
    pub fn store(&mut self, layer: u32, mip: u32, texels: Vec<Texel>) {
        let format = self.descriptor.format;
        self.levels[layer as usize][mip as usize] =
            texels.into_iter().map(|t| quantize(format, t)).collect();
    }

    fn texel(&self, layer: u32, mip: u32, x: u32, y: u32) -> Texel {
        let width = self.extent(mip).width;
        self.levels[layer as usize][mip as usize][(y * width + x) as usize]
    }

    /// Fill mips 1.. of every layer with a 2x2 box filter of the level above.
    pub fn generate_mipmaps(&mut self) {
        for layer in 0..self.descriptor.layer_count() {
            for mip in 1..self.mip_count() {
                let src = self.extent(mip - 1);
                let dst = self.extent(mip);
                let mut texels = Vec::with_capacity(dst.area());
                for y in 0..dst.height {
                    for x in 0..dst.width {
                        let x0 = (2 * x).min(src.width - 1);
                        let y0 = (2 * y).min(src.height - 1);
                        let x1 = (x0 + 1).min(src.width - 1);
                        let y1 = (y0 + 1).min(src.height - 1);
                        let taps = [
                            self.texel(layer, mip - 1, x0, y0),
                            self.texel(layer, mip - 1, x1, y0),
                            self.texel(layer, mip - 1, x0, y1),
                            self.texel(layer, mip - 1, x1, y1),
                        ];
                        texels.push(average(&taps));
                    }
                }
                self.store(layer, mip, texels);
            }
        }
    }

    /// Bilinear sample of a 2D level. `u` repeats when `wrap_u` is set,
    /// everything else clamps to the edge.
    pub fn sample_2d(&self, layer: u32, mip: u32, uv: [f32; 2], wrap_u: bool) -> Texel {
        let extent = self.extent(mip);
        let fx = uv[0] * extent.width as f32 - 0.5;
        let fy = uv[1] * extent.height as f32 - 0.5;
        self.bilinear(layer, mip, fx, fy, wrap_u)
    }

    /// Bilinear sample of one cubemap level along `dir`.
    pub fn sample_cube_level(&self, dir: &Vec3, mip: u32) -> Texel {
        let face = CubeFace::from_direction(dir);
        let view = face.view_matrix() * Vec4::new(dir.x, dir.y, dir.z, 0.0);
        // 90 degree capture: NDC is the view-space slope
        let depth = (-view.z).max(f32::EPSILON);
        let ndc = [view.x / depth, view.y / depth];
        let extent = self.extent(mip);
        let fx = (ndc[0] + 1.0) * 0.5 * extent.width as f32 - 0.5;
        let fy = (ndc[1] + 1.0) * 0.5 * extent.height as f32 - 0.5;
        self.bilinear(face.layer(), mip, fx, fy, false)
    }

    /// Trilinear sample of a cubemap along `dir` at fractional `lod`.
    pub fn sample_cube(&self, dir: &Vec3, lod: f32) -> Texel {
        let max_lod = (self.mip_count() - 1) as f32;
        let lod = lod.clamp(0.0, max_lod);
        let lower = lod.floor();
        let t = lod - lower;
        let a = self.sample_cube_level(dir, lower as u32);
        if t <= 0.0 {
            return a;
        }
        let b = self.sample_cube_level(dir, (lower as u32 + 1).min(self.mip_count() - 1));
        lerp(a, b, t)
    }

    fn bilinear(&self, layer: u32, mip: u32, fx: f32, fy: f32, wrap_u: bool) -> Texel {
        let extent = self.extent(mip);
        let max_x = (extent.width - 1) as f32;
        let max_y = (extent.height - 1) as f32;
        let fx = if wrap_u { fx } else { fx.clamp(0.0, max_x) };
        let fy = fy.clamp(0.0, max_y);

        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;

        let wrap = |x: i64| -> u32 {
            if wrap_u {
                x.rem_euclid(extent.width as i64) as u32
            } else {
                x.clamp(0, extent.width as i64 - 1) as u32
            }
        };
        let xa = wrap(x0 as i64);
        let xb = wrap(x0 as i64 + 1);
        let ya = y0 as u32;
        let yb = (ya + 1).min(extent.height - 1);

        let bottom = lerp(
            self.texel(layer, mip, xa, ya),
            self.texel(layer, mip, xb, ya),
            tx,
        );
        let top = lerp(
            self.texel(layer, mip, xa, yb),
            self.texel(layer, mip, xb, yb),
            tx,
        );
        lerp(bottom, top, ty)
    }
}

fn lerp(a: Texel, b: Texel, t: f32) -> Texel {
    [0usize, 1, 2, 3].map(|c| a[c] + (b[c] - a[c]) * t)
}

fn average(taps: &[Texel]) -> Texel {
    let n = taps.len() as f32;
    [0usize, 1, 2, 3].map(|c| taps.iter().map(|t| t[c]).sum::<f32>() / n)
}

/// Round a texel to what `format` can hold.
fn quantize(format: TextureFormat, texel: Texel) -> Texel {
    let half = |v: f32| f16::from_f32(v).to_f32();
    let unorm = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() / 255.0;
    match format {
        TextureFormat::Rgba16Float => texel.map(half),
        TextureFormat::Rg16Float => [half(texel[0]), half(texel[1]), 0.0, 1.0],
        TextureFormat::Rgba8Unorm | TextureFormat::Rgba8UnormSrgb => texel.map(unorm),
        TextureFormat::Rgba32Float | TextureFormat::Depth24Plus => texel,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextureUsage;

    fn cube_image(size: u32, mips: u32) -> CpuImage {
        let desc = TextureDescriptor::new_cube(size, TextureFormat::Rgba32Float, TextureUsage::bake_target())
            .with_mip_levels(mips);
        CpuImage::new(&desc)
    }

    #[test]
    fn box_filter_averages_blocks() {
        let desc = TextureDescriptor::new_2d(2, 2, TextureFormat::Rgba32Float, TextureUsage::bake_target())
            .with_mip_levels(2);
        let mut image = CpuImage::new(&desc);
        image.store(
            0,
            0,
            vec![[0.0; 4], [1.0; 4], [2.0; 4], [3.0; 4]],
        );
        image.generate_mipmaps();
        assert_eq!(image.level(0, 1), &[[1.5; 4]]);
    }

    #[test]
    fn cube_lookup_hits_the_major_axis_face() {
        let mut image = cube_image(2, 1);
        for face in CubeFace::ALL {
            let value = face.layer() as f32;
            image.store(face.layer(), 0, vec![[value; 4]; 4]);
        }
        for face in CubeFace::ALL {
            let sampled = image.sample_cube_level(&face.forward(), 0);
            assert_eq!(sampled[0], face.layer() as f32);
        }
    }

    #[test]
    fn cube_rows_follow_the_capture_up_vector() {
        // Bottom row of +X is NDC y = -1, which looks along -up = +Y.
        let mut image = cube_image(2, 1);
        image.store(0, 0, vec![[1.0; 4], [1.0; 4], [0.0; 4], [0.0; 4]]);
        let toward_plus_y = image.sample_cube_level(&Vec3::new(1.0, 0.9, 0.0), 0);
        let toward_minus_y = image.sample_cube_level(&Vec3::new(1.0, -0.9, 0.0), 0);
        assert!(toward_plus_y[0] > 0.9);
        assert!(toward_minus_y[0] < 0.1);
    }

    #[test]
    fn trilinear_blends_neighbouring_mips() {
        let mut image = cube_image(2, 2);
        for layer in 0..6 {
            image.store(layer, 0, vec![[0.0; 4]; 4]);
            image.store(layer, 1, vec![[1.0; 4]]);
        }
        let sampled = image.sample_cube(&Vec3::z(), 0.25);
        assert!((sampled[0] - 0.25).abs() < 1e-6);
        assert_eq!(image.sample_cube(&Vec3::z(), 9.0)[0], 1.0);
    }

    #[test]
    fn half_formats_are_quantized() {
        assert_eq!(
            quantize(TextureFormat::Rg16Float, [0.1, 0.2, 0.3, 0.4]),
            [f16::from_f32(0.1).to_f32(), f16::from_f32(0.2).to_f32(), 0.0, 1.0]
        );
    }
}

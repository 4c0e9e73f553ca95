use std::f32::consts::PI;

use super::types::TextureError;
use crate::math::Vec3;

/// Map a world direction onto equirectangular texture coordinates.
///
/// `u` follows longitude (`atan2(z, x)`), `v` follows latitude with `v = 0`
/// at the -Y pole.
pub fn direction_to_equirect_uv(dir: &Vec3) -> [f32; 2] {
    let d = dir.normalize();
    [
        d.z.atan2(d.x) / (2.0 * PI) + 0.5,
        d.y.clamp(-1.0, 1.0).asin() / PI + 0.5,
    ]
}

/// Equirectangular HDR photograph of the surroundings.
///
/// Pixels are linear RGB `f32`, tightly packed. Row 0 is the bottom row of
/// the photograph, so `v = 0` addresses the -Y pole.
#[derive(Clone, PartialEq)]
pub struct EnvironmentMap {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl EnvironmentMap {
    /// Wrap RGB pixel data whose row 0 is already the bottom row.
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::ZeroExtent { width, height });
        }
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap RGB pixel data stored top row first, as image decoders return it.
    pub fn from_top_down(width: u32, height: u32, data: Vec<f32>) -> Result<Self, TextureError> {
        let map = Self::new(width, height, data)?;
        Ok(map.flipped_vertically())
    }

    /// A map filled with a single color.
    pub fn uniform(width: u32, height: u32, rgb: [f32; 3]) -> Result<Self, TextureError> {
        let count = width as usize * height as usize;
        Self::new(width, height, rgb.repeat(count))
    }

    /// Return a copy with the row order reversed.
    pub fn flipped_vertically(&self) -> Self {
        let row = self.width as usize * 3;
        let data = self
            .data
            .chunks_exact(row)
            .rev()
            .flatten()
            .copied()
            .collect();
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGB data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Texel at column `x`, row `y` (row 0 = bottom).
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Bilinear sample: `u` wraps, `v` clamps.
    pub fn sample(&self, uv: [f32; 2]) -> [f32; 3] {
        let fx = uv[0] * self.width as f32 - 0.5;
        let fy = (uv[1] * self.height as f32 - 0.5).clamp(0.0, (self.height - 1) as f32);
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;

        let w = self.width as i64;
        let wrap = |x: i64| x.rem_euclid(w) as u32;
        let xa = wrap(x0 as i64);
        let xb = wrap(x0 as i64 + 1);
        let ya = y0 as u32;
        let yb = (ya + 1).min(self.height - 1);

        let (p00, p10) = (self.pixel(xa, ya), self.pixel(xb, ya));
        let (p01, p11) = (self.pixel(xa, yb), self.pixel(xb, yb));
        let mut out = [0.0; 3];
        for c in 0..3 {
            let bottom = p00[c] + (p10[c] - p00[c]) * tx;
            let top = p01[c] + (p11[c] - p01[c]) * tx;
            out[c] = bottom + (top - bottom) * ty;
        }
        out
    }

    /// Sample the radiance arriving from `dir`.
    pub fn sample_direction(&self, dir: &Vec3) -> [f32; 3] {
        self.sample(direction_to_equirect_uv(dir))
    }

    /// Expand to RGBA `f32` (alpha 1) for upload.
    pub fn to_rgba_f32(&self) -> Vec<f32> {
        self.data
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 1.0])
            .collect()
    }
}

impl std::fmt::Debug for EnvironmentMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentMap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_data() {
        assert_eq!(
            EnvironmentMap::new(2, 2, vec![0.0; 11]),
            Err(TextureError::SizeMismatch {
                expected: 12,
                actual: 11
            })
        );
        assert_eq!(
            EnvironmentMap::new(0, 1, vec![]),
            Err(TextureError::ZeroExtent {
                width: 0,
                height: 1
            })
        );
    }

    #[test]
    fn top_down_rows_are_flipped() {
        // top row red, bottom row blue
        let data = vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        let map = EnvironmentMap::from_top_down(1, 2, data).unwrap();
        assert_eq!(map.pixel(0, 0), [0.0, 0.0, 1.0]);
        assert_eq!(map.pixel(0, 1), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn poles_map_to_v_extremes() {
        let down = direction_to_equirect_uv(&Vec3::new(0.0, -1.0, 0.0));
        let up = direction_to_equirect_uv(&Vec3::new(0.0, 1.0, 0.0));
        assert!(down[1].abs() < 1e-6);
        assert!((up[1] - 1.0).abs() < 1e-6);
        let plus_x = direction_to_equirect_uv(&Vec3::new(1.0, 0.0, 0.0));
        assert!((plus_x[0] - 0.5).abs() < 1e-6);
        assert!((plus_x[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn uniform_map_samples_constant() {
        let map = EnvironmentMap::uniform(4, 2, [0.5, 1.0, 2.0]).unwrap();
        for dir in [Vec3::x(), -Vec3::y(), Vec3::new(0.3, 0.7, -0.2)] {
            assert_eq!(map.sample_direction(&dir), [0.5, 1.0, 2.0]);
        }
    }

    #[test]
    fn sampling_wraps_horizontally() {
        let data = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let map = EnvironmentMap::new(2, 1, data).unwrap();
        // u = 0 sits halfway between the last and first column
        let seam = map.sample([0.0, 0.5]);
        assert!((seam[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn rgba_expansion() {
        let map = EnvironmentMap::uniform(1, 1, [0.1, 0.2, 0.3]).unwrap();
        assert_eq!(map.to_rgba_f32(), vec![0.1, 0.2, 0.3, 1.0]);
    }
}

//! Bake resolutions and sample counts.

use crate::error::GraphicsError;
use crate::types::Extent2d;

/// Sizes and sample counts of the four bake stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IblSettings {
    /// Face size of the radiance cubemap. Its mip chain is always complete.
    pub radiance_size: u32,
    /// Face size of the irradiance cubemap.
    pub irradiance_size: u32,
    /// Angular step of the irradiance convolution, in radians.
    pub irradiance_sample_delta: f32,
    /// Face size of mip 0 of the prefiltered cubemap.
    pub prefilter_size: u32,
    /// Roughness levels of the prefiltered cubemap.
    pub prefilter_mip_levels: u32,
    /// GGX importance samples per prefiltered texel.
    pub prefilter_sample_count: u32,
    /// Size of the square BRDF integration table.
    pub brdf_lut_size: u32,
    /// GGX importance samples per BRDF table texel.
    pub brdf_sample_count: u32,
}

impl Default for IblSettings {
    fn default() -> Self {
        Self {
            radiance_size: 512,
            irradiance_size: 32,
            irradiance_sample_delta: 0.025,
            prefilter_size: 128,
            prefilter_mip_levels: 5,
            prefilter_sample_count: 1024,
            brdf_lut_size: 512,
            brdf_sample_count: 1024,
        }
    }
}

impl IblSettings {
    /// Check every size and count is usable.
    pub fn validate(&self) -> Result<(), GraphicsError> {
        let sizes = [
            ("radiance_size", self.radiance_size),
            ("irradiance_size", self.irradiance_size),
            ("prefilter_size", self.prefilter_size),
            ("brdf_lut_size", self.brdf_lut_size),
        ];
        for (name, size) in sizes {
            if size == 0 {
                return Err(GraphicsError::InvariantViolation(format!(
                    "{name} must be non-zero"
                )));
            }
        }

        if !(self.irradiance_sample_delta > 0.0) {
            return Err(GraphicsError::InvariantViolation(format!(
                "irradiance_sample_delta must be positive, got {}",
                self.irradiance_sample_delta
            )));
        }
        if self.prefilter_sample_count == 0 || self.brdf_sample_count == 0 {
            return Err(GraphicsError::InvariantViolation(
                "sample counts must be non-zero".to_string(),
            ));
        }

        let max_mips = Extent2d::square(self.prefilter_size).max_mip_levels();
        if self.prefilter_mip_levels == 0 || self.prefilter_mip_levels > max_mips {
            return Err(GraphicsError::InvariantViolation(format!(
                "prefilter_mip_levels must be in 1..={max_mips}, got {}",
                self.prefilter_mip_levels
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = IblSettings::default();
        settings.validate().unwrap();
        assert_eq!(settings.radiance_size, 512);
        assert_eq!(settings.prefilter_mip_levels, 5);
    }

    #[test]
    fn rejects_too_many_prefilter_mips() {
        let settings = IblSettings {
            prefilter_size: 8,
            prefilter_mip_levels: 5,
            ..IblSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(GraphicsError::InvariantViolation(_))
        ));
    }

    #[test]
    fn rejects_degenerate_values() {
        let zero_size = IblSettings {
            irradiance_size: 0,
            ..IblSettings::default()
        };
        assert!(zero_size.validate().is_err());

        let nan_delta = IblSettings {
            irradiance_sample_delta: f32::NAN,
            ..IblSettings::default()
        };
        assert!(nan_delta.validate().is_err());
    }
}

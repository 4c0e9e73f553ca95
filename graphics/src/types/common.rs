//! Common types shared across the graphics system.

/// Size of a 2D surface (a texture mip, a cube face or the depth target).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent2d {
    pub width: u32,
    pub height: u32,
}

impl Extent2d {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Square extent.
    pub const fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    /// Extent of mip `level`: each dimension halves and never drops below 1.
    pub fn mip(&self, level: u32) -> Self {
        Self::new(
            self.width.checked_shr(level).unwrap_or(0).max(1),
            self.height.checked_shr(level).unwrap_or(0).max(1),
        )
    }

    /// Length of the full mip chain down to 1x1.
    pub fn max_mip_levels(&self) -> u32 {
        32 - self.width.max(self.height).max(1).leading_zeros()
    }

    /// Number of texels.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl std::fmt::Display for Extent2d {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

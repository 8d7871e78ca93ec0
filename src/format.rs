/// Indexed texture layout the index buffer is materialized into.
///
/// Both formats store indices in fixed-size tiles (see [`crate::swizzle`]);
/// they differ in index depth and tile geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 4-bit indices in 8x8 tiles, two pixels per byte (high nibble first).
    C4,
    /// 8-bit indices in 8x4 tiles, one pixel per byte.
    C8,
}

impl Default for PixelFormat {
    fn default() -> Self {
        Self::C8
    }
}

impl PixelFormat {
    /// Tile size in pixels as `(width, height)`.
    pub const fn tile_size(self) -> (usize, usize) {
        match self {
            Self::C4 => (8, 8),
            Self::C8 => (8, 4),
        }
    }

    /// Bits per stored index.
    pub const fn bits_per_index(self) -> u32 {
        match self {
            Self::C4 => 4,
            Self::C8 => 8,
        }
    }

    /// Largest palette this format can address.
    pub const fn max_palette_len(self) -> u32 {
        1 << self.bits_per_index()
    }

    /// Dimensions after padding up to whole tiles.
    pub fn padded_size(self, width: usize, height: usize) -> (usize, usize) {
        let (tw, th) = self.tile_size();
        (width.div_ceil(tw) * tw, height.div_ceil(th) * th)
    }

    /// Size in bytes of the swizzled image data for a `width` x `height` texture.
    pub fn data_len(self, width: usize, height: usize) -> usize {
        let (pw, ph) = self.padded_size(width, height);
        pw * ph * self.bits_per_index() as usize / 8
    }
}

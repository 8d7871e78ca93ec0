use thiserror::Error;

use crate::format::PixelFormat;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantizeError {
    #[error("at least one source image is required")]
    NoImages,

    #[error("image dimensions cannot be zero")]
    ZeroDimension,

    #[error("image {index} is {width}x{height}, expected {expected_width}x{expected_height}")]
    DimensionMismatch {
        index: usize,
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },

    #[error("max_colors must be between 1 and 256, got {0}")]
    InvalidMaxColors(u32),

    #[error("{0} palette entries in use, at most 256 fit in an index byte")]
    TooManyCenters(usize),

    #[error("max_colors {max_colors} exceeds the {limit} entries addressable by {format:?}")]
    PaletteTooLarge {
        max_colors: u32,
        format: PixelFormat,
        limit: u32,
    },
}

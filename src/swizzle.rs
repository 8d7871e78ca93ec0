//! Tile reordering between linear index buffers and texture memory layout.
//!
//! The padded grid is split into tiles of the pixel format's tile size. Tiles
//! are emitted row-major, and pixels inside a tile row-by-row, left to right.
//! Cells outside the source image are written as index 0.

use crate::format::PixelFormat;

/// Reorder a row-major index buffer into tiled texture data.
///
/// `indices.len()` must equal `width * height`. For [`PixelFormat::C4`] each
/// index is truncated to its low nibble and two consecutive tiled indices share
/// a byte, first one in the high nibble.
pub fn swizzle(indices: &[u8], width: usize, height: usize, format: PixelFormat) -> Vec<u8> {
    debug_assert_eq!(indices.len(), width * height);

    let tiled: Vec<u8> = tile_order(width, height, format)
        .map(|cell| cell.map_or(0, |i| indices[i]))
        .collect();

    match format {
        PixelFormat::C8 => tiled,
        PixelFormat::C4 => tiled
            .chunks_exact(2)
            .map(|pair| (pair[0] & 0x0F) << 4 | (pair[1] & 0x0F))
            .collect(),
    }
}

/// Inverse of [`swizzle`]: recover the row-major index buffer, dropping padding.
///
/// Returns `None` if `data` is shorter than the format requires for the
/// given dimensions.
pub fn unswizzle(
    data: &[u8],
    width: usize,
    height: usize,
    format: PixelFormat,
) -> Option<Vec<u8>> {
    if data.len() < format.data_len(width, height) {
        return None;
    }

    let tiled: Vec<u8> = match format {
        PixelFormat::C8 => data.to_vec(),
        PixelFormat::C4 => data.iter().flat_map(|&b| [b >> 4, b & 0x0F]).collect(),
    };

    let mut indices = vec![0u8; width * height];
    for (cell, &value) in tile_order(width, height, format).zip(&tiled) {
        if let Some(i) = cell {
            indices[i] = value;
        }
    }
    Some(indices)
}

/// Walk the padded grid in tile order, yielding the linear source index of each
/// cell or `None` for padding.
fn tile_order(
    width: usize,
    height: usize,
    format: PixelFormat,
) -> impl Iterator<Item = Option<usize>> {
    let (tw, th) = format.tile_size();
    let (pw, ph) = format.padded_size(width, height);

    (0..ph).step_by(th).flat_map(move |ty| {
        (0..pw).step_by(tw).flat_map(move |tx| {
            (ty..ty + th).flat_map(move |y| {
                (tx..tx + tw).map(move |x| (x < width && y < height).then(|| y * width + x))
            })
        })
    })
}

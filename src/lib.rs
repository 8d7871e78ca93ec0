//! Shared-palette color quantization for indexed texture sets.
//!
//! Several same-sized images that are drawn with one index buffer (and one
//! palette per image) are quantized together: every pixel position gets a single
//! index, and each image gets its own TLUT holding its colors for those indices.

#![forbid(unsafe_code)]

pub mod error;
pub mod format;
pub mod histogram;
pub mod kmeans;
pub mod palette;
pub mod swizzle;
pub mod tlut;

pub use error::QuantizeError;
pub use format::PixelFormat;
pub use histogram::Combo;
pub use imgref::{ImgRef, ImgVec};
pub use palette::SharedPalette;
pub use rgb::RGBA8;
pub use tlut::PaletteFormat;

use tracing::debug;

/// An image taking part in a shared-palette texture set.
///
/// Implement this for whatever container holds decoded pixels; the quantizer
/// only reads from it.
pub trait TextureSource {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    /// Color at column `x`, row `y`.
    fn pixel(&self, x: usize, y: usize) -> RGBA8;
    /// Layout the index data is written in.
    fn pixel_format(&self) -> PixelFormat;
    /// Encoding of this image's palette entries.
    fn palette_format(&self) -> PaletteFormat;
}

/// Decoded RGBA pixels plus the texture formats they should be written as.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub pixels: ImgVec<RGBA8>,
    pub pixel_format: PixelFormat,
    pub palette_format: PaletteFormat,
}

impl SourceImage {
    pub fn new(
        pixels: ImgVec<RGBA8>,
        pixel_format: PixelFormat,
        palette_format: PaletteFormat,
    ) -> Self {
        Self {
            pixels,
            pixel_format,
            palette_format,
        }
    }
}

impl TextureSource for SourceImage {
    fn width(&self) -> usize {
        self.pixels.width()
    }

    fn height(&self) -> usize {
        self.pixels.height()
    }

    fn pixel(&self, x: usize, y: usize) -> RGBA8 {
        self.pixels[(x, y)]
    }

    fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    fn palette_format(&self) -> PaletteFormat {
        self.palette_format
    }
}

/// Configuration for shared-palette quantization.
#[derive(Debug, Clone)]
pub struct QuantizeConfig {
    /// Maximum number of palette entries (1..=256, and within every image's
    /// pixel format).
    pub max_colors: u32,
    /// Upper bound on k-means refinement steps.
    pub max_iterations: usize,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            max_colors: 256,
            max_iterations: 256,
        }
    }
}

impl QuantizeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_colors(mut self, n: u32) -> Self {
        self.max_colors = n;
        self
    }

    pub fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }
}

/// Texture data for one source image, ready to be stored on its container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedTexture {
    pub width: usize,
    pub height: usize,
    pub pixel_format: PixelFormat,
    pub palette_format: PaletteFormat,
    /// Swizzled index data, padded to whole tiles.
    pub image_data: Vec<u8>,
    /// Big-endian TLUT entries, one per palette index.
    pub palette_data: Vec<u8>,
}

impl EncodedTexture {
    /// Number of entries in the encoded palette.
    pub fn palette_len(&self) -> usize {
        self.palette_data.len() / tlut::ENTRY_SIZE
    }

    /// Render the texture back to RGBA through its encoded palette.
    ///
    /// Returns `None` if the image data is truncated or references an index
    /// past the end of the palette.
    pub fn to_rgba(&self) -> Option<ImgVec<RGBA8>> {
        let indices =
            swizzle::unswizzle(&self.image_data, self.width, self.height, self.pixel_format)?;
        let colors = self.palette_format.decode_palette(&self.palette_data);
        let pixels = indices
            .iter()
            .map(|&i| colors.get(i as usize).copied())
            .collect::<Option<Vec<_>>>()?;
        Some(ImgVec::new(pixels, self.width, self.height))
    }
}

/// Quantization result.
#[derive(Debug)]
pub struct QuantizeResult {
    palette: SharedPalette,
    indices: Vec<u8>,
    textures: Vec<EncodedTexture>,
    distinct_combos: usize,
    iterations: usize,
}

impl QuantizeResult {
    /// The shared palette in canonical order.
    pub fn palette(&self) -> &SharedPalette {
        &self.palette
    }

    /// Number of colors in the palette.
    pub fn palette_len(&self) -> usize {
        self.palette.len()
    }

    /// Row-major palette index of each pixel, shared by every image.
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    /// Encoded textures, in input order.
    pub fn textures(&self) -> &[EncodedTexture] {
        &self.textures
    }

    pub fn into_textures(self) -> Vec<EncodedTexture> {
        self.textures
    }

    /// Number of distinct combos found in the input.
    pub fn distinct_combos(&self) -> usize {
        self.distinct_combos
    }

    /// Number of k-means refinement steps that ran.
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

/// Quantize a set of same-sized images to one shared palette.
///
/// Every pixel position receives one index, chosen from the colors of all
/// images at that position together. Each image gets its own TLUT holding
/// its color for every index.
pub fn quantize_shared<S: TextureSource>(
    images: &[S],
    config: &QuantizeConfig,
) -> Result<QuantizeResult, QuantizeError> {
    let (width, height) = validate_inputs(images, config)?;

    // 1-2. Combos per pixel, then weighted by frequency
    let combos = histogram::collect_combos(images);
    let points = histogram::group_combos(&combos);

    // 3. Weighted k-means
    let clustering = kmeans::cluster(&points, config.max_colors as usize, config.max_iterations);

    // 4-5. Canonical palette order and combo -> index lookup
    let palette = SharedPalette::from_clustering(&points, &clustering)?;

    debug!(
        images = images.len(),
        width,
        height,
        distinct_combos = points.len(),
        palette_len = palette.len(),
        iterations = clustering.iterations,
        "quantized shared palette"
    );

    // 6. Materialize index data and palettes per image
    let indices = palette.map_indices(&combos);

    let textures = images
        .iter()
        .enumerate()
        .map(|(i, img)| EncodedTexture {
            width,
            height,
            pixel_format: img.pixel_format(),
            palette_format: img.palette_format(),
            image_data: swizzle::swizzle(&indices, width, height, img.pixel_format()),
            palette_data: palette.encode(i, img.palette_format()),
        })
        .collect();

    Ok(QuantizeResult {
        distinct_combos: points.len(),
        iterations: clustering.iterations,
        palette,
        indices,
        textures,
    })
}

fn validate_inputs<S: TextureSource>(
    images: &[S],
    config: &QuantizeConfig,
) -> Result<(usize, usize), QuantizeError> {
    let Some(first) = images.first() else {
        return Err(QuantizeError::NoImages);
    };
    if config.max_colors == 0 || config.max_colors > 256 {
        return Err(QuantizeError::InvalidMaxColors(config.max_colors));
    }

    let (width, height) = (first.width(), first.height());
    if width == 0 || height == 0 {
        return Err(QuantizeError::ZeroDimension);
    }

    for (index, img) in images.iter().enumerate() {
        if img.width() != width || img.height() != height {
            return Err(QuantizeError::DimensionMismatch {
                index,
                expected_width: width,
                expected_height: height,
                width: img.width(),
                height: img.height(),
            });
        }
        let format = img.pixel_format();
        if config.max_colors > format.max_palette_len() {
            return Err(QuantizeError::PaletteTooLarge {
                max_colors: config.max_colors,
                format,
                limit: format.max_palette_len(),
            });
        }
    }

    Ok((width, height))
}

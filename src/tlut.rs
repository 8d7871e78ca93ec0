//! Hardware palette (TLUT) entry encodings.
//!
//! Every entry is a 16-bit code stored big-endian.

use rgb::RGBA8;

/// Palette entry format of a texture look-up table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaletteFormat {
    /// 8-bit alpha in the high byte, 8-bit intensity in the low byte.
    IA8,
    /// 5/6/5 bit RGB, no alpha.
    RGB565,
    /// `1RRRRRGGGGGBBBBB` when opaque, `0AAARRRRGGGGBBBB` otherwise.
    RGB5A3,
}

impl Default for PaletteFormat {
    fn default() -> Self {
        Self::RGB5A3
    }
}

/// Alpha at or above this value selects the opaque RGB5A3 layout.
const RGB5A3_OPAQUE_THRESHOLD: u8 = 0xE0;

/// Bytes per encoded palette entry.
pub const ENTRY_SIZE: usize = 2;

impl PaletteFormat {
    /// Encode one color as a 16-bit code.
    pub fn encode(self, color: RGBA8) -> u16 {
        match self {
            Self::IA8 => encode_ia8(color),
            Self::RGB565 => encode_rgb565(color),
            Self::RGB5A3 => encode_rgb5a3(color),
        }
    }

    /// Expand a 16-bit code back to RGBA by bit replication.
    pub fn decode(self, code: u16) -> RGBA8 {
        match self {
            Self::IA8 => decode_ia8(code),
            Self::RGB565 => decode_rgb565(code),
            Self::RGB5A3 => decode_rgb5a3(code),
        }
    }

    /// Encode a sequence of colors into a big-endian palette blob.
    pub fn encode_palette(self, colors: impl IntoIterator<Item = RGBA8>) -> Vec<u8> {
        colors
            .into_iter()
            .flat_map(|c| self.encode(c).to_be_bytes())
            .collect()
    }

    /// Decode a big-endian palette blob. A trailing odd byte is ignored.
    pub fn decode_palette(self, data: &[u8]) -> Vec<RGBA8> {
        data.chunks_exact(ENTRY_SIZE)
            .map(|c| self.decode(u16::from_be_bytes([c[0], c[1]])))
            .collect()
    }
}

/// Rec. 601 luma, rounded, in integer arithmetic.
fn intensity(color: RGBA8) -> u8 {
    let y = 299 * color.r as u32 + 587 * color.g as u32 + 114 * color.b as u32;
    ((y + 500) / 1000) as u8
}

fn encode_ia8(color: RGBA8) -> u16 {
    (color.a as u16) << 8 | intensity(color) as u16
}

fn decode_ia8(code: u16) -> RGBA8 {
    let i = code as u8;
    RGBA8::new(i, i, i, (code >> 8) as u8)
}

fn encode_rgb565(color: RGBA8) -> u16 {
    (color.r as u16 >> 3) << 11 | (color.g as u16 >> 2) << 5 | color.b as u16 >> 3
}

fn decode_rgb565(code: u16) -> RGBA8 {
    RGBA8::new(
        expand5((code >> 11) as u8 & 0x1F),
        expand6((code >> 5) as u8 & 0x3F),
        expand5(code as u8 & 0x1F),
        0xFF,
    )
}

fn encode_rgb5a3(color: RGBA8) -> u16 {
    if color.a >= RGB5A3_OPAQUE_THRESHOLD {
        0x8000
            | (color.r as u16 >> 3) << 10
            | (color.g as u16 >> 3) << 5
            | color.b as u16 >> 3
    } else {
        (color.a as u16 >> 5) << 12
            | (color.r as u16 >> 4) << 8
            | (color.g as u16 >> 4) << 4
            | color.b as u16 >> 4
    }
}

fn decode_rgb5a3(code: u16) -> RGBA8 {
    if code & 0x8000 != 0 {
        RGBA8::new(
            expand5((code >> 10) as u8 & 0x1F),
            expand5((code >> 5) as u8 & 0x1F),
            expand5(code as u8 & 0x1F),
            0xFF,
        )
    } else {
        RGBA8::new(
            expand4((code >> 8) as u8 & 0x0F),
            expand4((code >> 4) as u8 & 0x0F),
            expand4(code as u8 & 0x0F),
            expand3((code >> 12) as u8 & 0x07),
        )
    }
}

#[inline]
fn expand3(v: u8) -> u8 {
    v << 5 | v << 2 | v >> 1
}

#[inline]
fn expand4(v: u8) -> u8 {
    v << 4 | v
}

#[inline]
fn expand5(v: u8) -> u8 {
    v << 3 | v >> 2
}

#[inline]
fn expand6(v: u8) -> u8 {
    v << 2 | v >> 4
}

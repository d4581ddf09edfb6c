use std::fmt;

use crate::error::{Error, Result};

/// Identifier of an image item inside a container.
pub type ItemId = u32;

/// Four-character type code attached to an ICC profile when it is written out.
pub const RAW_PROFILE_TAG: &[u8; 4] = b"rICC";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colorspace {
    Rgb,
}

/// Interleaved sample layouts understood by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chroma {
    /// R,G,B bytes.
    InterleavedRgb,
    /// R,G,B,A bytes.
    InterleavedRgba,
    /// R,G,B,A as big-endian 16-bit samples; the codec's layout for premultiplied alpha.
    InterleavedRrggbbaaBe,
}

impl Chroma {
    pub fn channels(self) -> usize {
        match self {
            Chroma::InterleavedRgb => 3,
            Chroma::InterleavedRgba | Chroma::InterleavedRrggbbaaBe => 4,
        }
    }

    pub fn bytes_per_sample(self) -> usize {
        match self {
            Chroma::InterleavedRgb | Chroma::InterleavedRgba => 1,
            Chroma::InterleavedRrggbbaaBe => 2,
        }
    }

    /// 8-bit layout used when writing `channels`-channel pixels.
    pub fn packed_for(channels: usize) -> Self {
        if channels == 4 {
            Chroma::InterleavedRgba
        } else {
            Chroma::InterleavedRgb
        }
    }
}

/// Compression family requested from the codec when encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Hevc,
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::Hevc => f.write_str("HEVC"),
        }
    }
}

/// Alpha attributes of a decoded image handle and the layout they call for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelConfiguration {
    pub has_alpha: bool,
    pub is_premultiplied: bool,
}

impl PixelConfiguration {
    /// A premultiplied flag without an alpha channel has nothing to apply to and is dropped.
    pub fn new(has_alpha: bool, is_premultiplied: bool) -> Self {
        Self {
            has_alpha,
            is_premultiplied: has_alpha && is_premultiplied,
        }
    }

    /// Layout to request from the decoder. Premultiplied alpha wins over plain alpha.
    pub fn chroma(&self) -> Chroma {
        if self.is_premultiplied {
            Chroma::InterleavedRrggbbaaBe
        } else if self.has_alpha {
            Chroma::InterleavedRgba
        } else {
            Chroma::InterleavedRgb
        }
    }

    pub fn channels(&self) -> usize {
        if self.has_alpha { 4 } else { 3 }
    }
}

/// Tightly packed 8-bit RGB or RGBA pixels, row-major, top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    width: u32,
    height: u32,
    channels: usize,
    pixels: Vec<u8>,
}

impl RawImage {
    /// Wraps `pixels`, which must hold exactly `width * height * channels` bytes.
    pub fn new(width: u32, height: u32, channels: usize, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidImage(format!(
                "dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        if channels != 3 && channels != 4 {
            return Err(Error::InvalidImage(format!(
                "channel count must be 3 or 4, got {}",
                channels
            )));
        }
        let expected = packed_len(width, height, channels)?;
        if pixels.len() != expected {
            return Err(Error::InvalidImage(format!(
                "expected {} bytes for {}x{}x{}, got {}",
                expected,
                width,
                height,
                channels,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn geometry(&self) -> PlaneGeometry {
        PlaneGeometry {
            width: self.width as usize,
            height: self.height as usize,
            channels: self.channels,
        }
    }
}

pub(crate) fn packed_len(width: u32, height: u32, channels: usize) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(channels))
        .ok_or_else(|| Error::InvalidImage("buffer size overflow".to_string()))
}

/// Embedded ICC profile, carried opaquely. Absence is `Option::None`, not an empty profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorProfile {
    bytes: Vec<u8>,
}

impl ColorProfile {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Output of the decode stage, consumed by the encode stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub image: RawImage,
    pub color_profile: Option<ColorProfile>,
}

/// Logical extent of an interleaved plane, independent of its stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneGeometry {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl PlaneGeometry {
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
        }
    }

    /// Bytes in one packed row of 8-bit samples.
    pub fn row_bytes(&self) -> usize {
        self.width * self.channels
    }
}

/// Read-only view of a codec plane.
#[derive(Debug, Clone, Copy)]
pub struct Plane<'a> {
    pub data: &'a [u8],
    /// Bytes from the start of one row to the start of the next.
    pub stride: usize,
}

/// Writable view of a codec plane.
#[derive(Debug)]
pub struct PlaneMut<'a> {
    pub data: &'a mut [u8],
    pub stride: usize,
}

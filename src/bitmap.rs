//! Decoded bitmap resources referenced by bitmap fills.
//!
//! Images arrive already decoded as RGB or RGBA rows with an explicit stride.
//! RGBA data is expected to be premultiplied, though samplers tolerate color
//! channels above alpha.

use crate::color::Rgba8;
use crate::error::{RenderError, Result};

/// Handle to an image registered with a [`BitmapStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BitmapId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgb,
    Rgba,
}

impl PixelFormat {
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

// ============================================================================
// DecodedImage
// ============================================================================

/// A decoded image buffer with validated dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl DecodedImage {
    /// Wrap a decoded buffer, checking that every row fits in `data`.
    pub fn new(
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidBitmap(format!(
                "empty image {width}x{height}"
            )));
        }
        let row_bytes = (width as usize)
            .checked_mul(format.bytes_per_pixel())
            .ok_or_else(|| RenderError::InvalidBitmap("row size overflows".into()))?;
        if stride < row_bytes {
            return Err(RenderError::InvalidBitmap(format!(
                "stride {stride} shorter than row of {row_bytes} bytes"
            )));
        }
        let needed = stride
            .checked_mul(height as usize - 1)
            .and_then(|n| n.checked_add(row_bytes))
            .ok_or_else(|| RenderError::InvalidBitmap("image size overflows".into()))?;
        if data.len() < needed {
            return Err(RenderError::InvalidBitmap(format!(
                "{} bytes given, {needed} needed",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            stride,
            format,
            data,
        })
    }

    /// Tightly packed RGBA rows.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        Self::new(width, height, width as usize * 4, PixelFormat::Rgba, data)
    }

    /// Tightly packed RGB rows.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        Self::new(width, height, width as usize * 3, PixelFormat::Rgb, data)
    }

    /// An image filled with one color.
    pub fn filled(width: u32, height: u32, color: Rgba8) -> Result<Self> {
        let pixels = (width as usize).saturating_mul(height as usize);
        let data = [color.r, color.g, color.b, color.a].repeat(pixels);
        Self::from_rgba(width, height, data)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Raw pixel at `(x, y)`; RGB images report full alpha.
    ///
    /// Coordinates must be inside the image.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba8 {
        let off = y as usize * self.stride + x as usize * self.format.bytes_per_pixel();
        let p = &self.data[off..off + self.format.bytes_per_pixel()];
        match self.format {
            PixelFormat::Rgb => Rgba8::new_opaque(p[0], p[1], p[2]),
            PixelFormat::Rgba => Rgba8::new(p[0], p[1], p[2], p[3]),
        }
    }
}

// ============================================================================
// BitmapStore
// ============================================================================

/// Lookup of images by handle, as seen by paint generators.
pub trait BitmapSource {
    fn bitmap(&self, id: BitmapId) -> Option<&DecodedImage>;
}

/// Owns the images registered with a render session.
#[derive(Debug, Default)]
pub struct BitmapStore {
    images: Vec<DecodedImage>,
}

impl BitmapStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, image: DecodedImage) -> BitmapId {
        self.images.push(image);
        BitmapId(self.images.len() as u32 - 1)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl BitmapSource for BitmapStore {
    fn bitmap(&self, id: BitmapId) -> Option<&DecodedImage> {
        self.images.get(id.0 as usize)
    }
}

// ============================================================================
// Tests
// ============================================================================

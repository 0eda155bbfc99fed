//! Converted textures and the keys they are cached under.
//!
//! A [`CachedTexture`] is a tightly packed 8-bit pixel buffer that a renderer can
//! upload as-is: either four interleaved channels ([`PixelFormat::Rgba8`]) or a
//! single channel ([`PixelFormat::R8`]).

use std::fmt;

use image::{DynamicImage, GrayImage, RgbaImage};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    R8,
    Rgba8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::R8 => 1,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// The kind of conversion a source image goes through before it is cached.
///
/// Base color and emissive textures share the RGBA family, so both resolve to
/// the same cached texture when they point at the same image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureFamily {
    Rgba,
    Occlusion,
    Metallic,
    Roughness,
}

impl TextureFamily {
    fn prefix(&self) -> &'static str {
        match self {
            TextureFamily::Rgba => "RGBA",
            TextureFamily::Occlusion => "Occlusion",
            TextureFamily::Metallic => "Metallic",
            TextureFamily::Roughness => "Roughness",
        }
    }
}

/// Composite cache key `"{family}_{source image index}"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(String);

impl TextureId {
    pub fn new(family: TextureFamily, image_index: usize) -> Self {
        Self(format!("{}_{}", family.prefix(), image_index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedTexture {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl CachedTexture {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            data,
            width,
            height,
            format,
        }
    }

    /// Check if the buffer length matches the dimensions and format.
    pub fn is_valid(&self) -> bool {
        let expected = self.width as usize * self.height as usize * self.format.bytes_per_pixel();
        self.data.len() == expected && self.width > 0 && self.height > 0
    }

    /// Wraps a copy of the pixels in an `image` buffer, e.g. for writing it to disk.
    /// `None` if the buffer doesn't match the dimensions exactly.
    pub fn to_image(&self) -> Option<DynamicImage> {
        if !self.is_valid() {
            return None;
        }
        match self.format {
            PixelFormat::R8 => GrayImage::from_raw(self.width, self.height, self.data.clone())
                .map(DynamicImage::ImageLuma8),
            PixelFormat::Rgba8 => RgbaImage::from_raw(self.width, self.height, self.data.clone())
                .map(DynamicImage::ImageRgba8),
        }
    }
}

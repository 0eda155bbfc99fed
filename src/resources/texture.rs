//! Texture baking: channel conversions and the per-load texture cache.
//!
//! glTF images come in whatever layout the encoder chose, while the renderer
//! wants a small set of fixed layouts. The converters in this module remap
//! 8-bit images into those layouts:
//!
//! - base color and emissive become RGBA8 (RGB gets an opaque alpha)
//! - occlusion becomes R8 from the red channel
//! - the packed metallic-roughness image is split into two R8 images,
//!   roughness from green and metallic from blue
//!
//! Conversions never fail loudly. An image that doesn't satisfy the layout
//! preconditions simply produces no texture.

use std::collections::HashMap;

use crate::data_structures::{
    source::{Image, SourceModel, get_safe},
    texture::{CachedTexture, PixelFormat, TextureFamily, TextureId},
};

/// Width, height and channel count of an image that passes the common
/// preconditions: 8-bit channels, positive dimensions and a pixel buffer of
/// exactly `width * height * channels` bytes.
fn checked_layout(image: &Image) -> Option<(u32, u32, usize)> {
    if image.bytes_per_channel != 1 || image.width <= 0 || image.height <= 0 || image.channels < 1 {
        return None;
    }
    let width = u32::try_from(image.width).ok()?;
    let height = u32::try_from(image.height).ok()?;
    let channels = image.channels as usize;
    let expected = (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(channels)?;
    if image.pixels.len() != expected {
        return None;
    }
    Some((width, height, channels))
}

/// RGBA8 copy of a 3 or 4 channel image.
pub fn extract_rgba(image: &Image) -> Option<CachedTexture> {
    let (width, height, channels) = checked_layout(image)?;
    let data = match channels {
        4 => image.pixels.clone(),
        3 => {
            let mut rgba = Vec::with_capacity(image.pixels.len() / 3 * 4);
            for rgb in image.pixels.chunks_exact(3) {
                rgba.extend_from_slice(rgb);
                rgba.push(255);
            }
            rgba
        }
        _ => return None,
    };
    Some(CachedTexture::new(data, width, height, PixelFormat::Rgba8))
}

/// Single channel copy holding the first (red) channel of every pixel.
pub fn extract_occlusion(image: &Image) -> Option<CachedTexture> {
    let (width, height, channels) = checked_layout(image)?;
    let data = if channels == 1 {
        image.pixels.clone()
    } else {
        image.pixels.chunks_exact(channels).map(|pixel| pixel[0]).collect()
    };
    Some(CachedTexture::new(data, width, height, PixelFormat::R8))
}

/// The two halves of a packed metallic-roughness image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetallicRoughness {
    pub metallic: CachedTexture,
    pub roughness: CachedTexture,
}

/// Splits a 3 or 4 channel image into roughness (green) and metallic (blue).
pub fn split_metallic_roughness(image: &Image) -> Option<MetallicRoughness> {
    let (width, height, channels) = checked_layout(image)?;
    if !(3..=4).contains(&channels) {
        return None;
    }
    let pixel_count = width as usize * height as usize;
    let mut metallic = Vec::with_capacity(pixel_count);
    let mut roughness = Vec::with_capacity(pixel_count);
    for pixel in image.pixels.chunks_exact(channels) {
        roughness.push(pixel[1]);
        metallic.push(pixel[2]);
    }
    Some(MetallicRoughness {
        metallic: CachedTexture::new(metallic, width, height, PixelFormat::R8),
        roughness: CachedTexture::new(roughness, width, height, PixelFormat::R8),
    })
}

/// Deduplicates converted textures by `(family, source image)` for one load.
///
/// The cache borrows the model it resolves texture references against, so it
/// can't outlive the load that created it; the converted textures are moved
/// out with [`into_textures`](Self::into_textures) when the load finishes.
pub struct TextureCache<'a> {
    model: &'a SourceModel,
    textures: HashMap<TextureId, CachedTexture>,
    conversions: usize,
}

impl<'a> TextureCache<'a> {
    pub fn new(model: &'a SourceModel) -> Self {
        Self {
            model,
            textures: HashMap::new(),
            conversions: 0,
        }
    }

    /// Id of the converted texture for `texture` (an index into the model's
    /// texture table) in the given family, converting on first use.
    ///
    /// Requesting either half of the metallic-roughness split creates both
    /// cache entries at once.
    pub fn get_or_create(&mut self, family: TextureFamily, texture: i32) -> Option<TextureId> {
        let (image_index, image) = self.source_image(texture)?;
        let id = TextureId::new(family, image_index);

        match family {
            TextureFamily::Metallic | TextureFamily::Roughness => {
                let metallic_id = TextureId::new(TextureFamily::Metallic, image_index);
                let roughness_id = TextureId::new(TextureFamily::Roughness, image_index);
                if self.textures.contains_key(&metallic_id) && self.textures.contains_key(&roughness_id) {
                    log::debug!("texture cache hit for {}", id);
                    return Some(id);
                }
                let Some(split) = split_metallic_roughness(image) else {
                    log::warn!(
                        "image {} can't be split into metallic/roughness ({} channels, {} bytes per channel)",
                        image_index,
                        image.channels,
                        image.bytes_per_channel
                    );
                    return None;
                };
                self.conversions += 1;
                log::debug!("converted image {} into {} and {}", image_index, metallic_id, roughness_id);
                self.textures.insert(metallic_id, split.metallic);
                self.textures.insert(roughness_id, split.roughness);
            }
            TextureFamily::Rgba | TextureFamily::Occlusion => {
                if self.textures.contains_key(&id) {
                    log::debug!("texture cache hit for {}", id);
                    return Some(id);
                }
                let converted = match family {
                    TextureFamily::Rgba => extract_rgba(image),
                    _ => extract_occlusion(image),
                };
                let Some(converted) = converted else {
                    log::warn!(
                        "image {} has an unsupported layout for {} ({} channels, {} bytes per channel)",
                        image_index,
                        id,
                        image.channels,
                        image.bytes_per_channel
                    );
                    return None;
                };
                self.conversions += 1;
                log::debug!("converted image {} into {}", image_index, id);
                self.textures.insert(id.clone(), converted);
            }
        }
        Some(id)
    }

    fn source_image(&self, texture: i32) -> Option<(usize, &'a Image)> {
        let Some(texture_def) = get_safe(&self.model.textures, texture) else {
            log::warn!("material references missing texture {}", texture);
            return None;
        };
        let Some(image) = get_safe(&self.model.images, texture_def.source) else {
            log::warn!("texture {} references missing image {}", texture, texture_def.source);
            return None;
        };
        if image.pixels.is_empty() || image.width <= 0 || image.height <= 0 {
            log::warn!("image {} has no pixel data", texture_def.source);
            return None;
        }
        Some((texture_def.source as usize, image))
    }

    pub fn get(&self, id: &TextureId) -> Option<&CachedTexture> {
        self.textures.get(id)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Number of conversions performed; a metallic-roughness split counts once.
    pub fn conversions(&self) -> usize {
        self.conversions
    }

    pub fn into_textures(self) -> HashMap<TextureId, CachedTexture> {
        self.textures
    }
}

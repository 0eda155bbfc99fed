//! Maps glTF metallic-roughness materials onto [`Material`] descriptors.

use crate::{
    data_structures::{
        model::{ALPHA_MODE_BLEND, ALPHA_MODE_MASK, ALPHA_MODE_OPAQUE, Alpha, Material, TextureBinding, TextureSlot},
        source::{self, AlphaMode},
    },
    resources::texture::TextureCache,
};

pub struct MaterialResolver {
    max_tex_coord_sets: u32,
}

impl MaterialResolver {
    /// `max_tex_coord_sets` is the number of UV sets the renderer can sample.
    pub fn new(max_tex_coord_sets: u32) -> Self {
        Self { max_tex_coord_sets }
    }

    pub fn resolve(&self, material: &source::Material, cache: &mut TextureCache<'_>) -> Material {
        let mut result = Material {
            name: material.name.clone(),
            ..Material::default()
        };
        self.configure_pbr_metallic_roughness(material, cache, &mut result);
        self.configure_occlusion(material, cache, &mut result);
        self.configure_emissive(material, cache, &mut result);
        configure_opacity(material, &mut result);
        result
    }

    fn usable_tex_coord(&self, tex_coord: i64) -> Option<u32> {
        if tex_coord >= 0 && tex_coord < i64::from(self.max_tex_coord_sets) {
            Some(tex_coord as u32)
        } else {
            None
        }
    }

    /// Converts and binds the texture for `slot`. Nothing is bound if the UV
    /// set can't be sampled or the texture can't be converted.
    fn bind(
        &self,
        slot: TextureSlot,
        texture: i32,
        tex_coord: i64,
        cache: &mut TextureCache<'_>,
        result: &mut Material,
    ) -> bool {
        let Some(tex_coord) = self.usable_tex_coord(tex_coord) else {
            log::warn!(
                "dropping {} texture {} of material {:?}: texCoord {} is not supported",
                slot.name(),
                texture,
                result.name,
                tex_coord
            );
            return false;
        };
        let Some(id) = cache.get_or_create(slot.family(), texture) else {
            return false;
        };
        result.textures.push(TextureBinding {
            slot,
            texture: id,
            tex_coord,
        });
        true
    }

    fn configure_pbr_metallic_roughness(
        &self,
        material: &source::Material,
        cache: &mut TextureCache<'_>,
        result: &mut Material,
    ) {
        let Some(pbr) = &material.pbr_metallic_roughness else {
            return;
        };

        if let [r, g, b, a] = pbr.base_color_factor.as_slice() {
            result.base_color = Some([*r as f32, *g as f32, *b as f32, *a as f32]);
        }
        if let Some(info) = &pbr.base_color_texture {
            self.bind(TextureSlot::BaseColor, info.index, info.tex_coord, cache, result);
        }

        result.metallic_factor = Some(pbr.metallic_factor as f32);
        result.roughness_factor = Some(pbr.roughness_factor as f32);
        if let Some(info) = &pbr.metallic_roughness_texture {
            self.bind(TextureSlot::Metallic, info.index, info.tex_coord, cache, result);
            self.bind(TextureSlot::Roughness, info.index, info.tex_coord, cache, result);
        }
    }

    fn configure_emissive(&self, material: &source::Material, cache: &mut TextureCache<'_>, result: &mut Material) {
        if let [r, g, b] = material.emissive_factor.as_slice() {
            if [r, g, b].iter().any(|c| **c != 0.0) {
                result.emissive_enabled = true;
                result.emissive_color = Some([*r as f32, *g as f32, *b as f32, 1.0]);
            }
        }
        if let Some(info) = &material.emissive_texture {
            if self.bind(TextureSlot::Emissive, info.index, info.tex_coord, cache, result) {
                result.emissive_enabled = true;
            }
        }
    }

    /// Occlusion strength only means something with a texture, so it is only
    /// written together with the binding.
    fn configure_occlusion(&self, material: &source::Material, cache: &mut TextureCache<'_>, result: &mut Material) {
        if let Some(info) = &material.occlusion_texture {
            if self.bind(TextureSlot::Occlusion, info.index, info.tex_coord, cache, result) {
                result.occlusion_strength = Some(info.strength as f32);
            }
        }
    }
}

fn configure_opacity(material: &source::Material, result: &mut Material) {
    result.alpha = match material.alpha_mode {
        AlphaMode::Opaque => Alpha {
            mode: ALPHA_MODE_OPAQUE,
            factor: None,
        },
        AlphaMode::Mask => Alpha {
            mode: ALPHA_MODE_MASK,
            factor: Some((1.0 - material.alpha_cutoff) as f32),
        },
        AlphaMode::Blend => Alpha {
            mode: ALPHA_MODE_BLEND,
            factor: None,
        },
    };
    if material.double_sided {
        result.double_sided = true;
    }
}

//! Conversion from the `gltf` crate's document model into a [`SourceModel`].
//!
//! `gltf::import` resolves buffer and image URIs and decodes images for files.
//! In-memory documents have no base path, so [`from_slice`] loads the buffers
//! itself and decodes embedded images (data URIs and buffer views) with the
//! `image` crate. Either way the pipeline only deals with bytes in memory
//! afterwards.

use std::path::Path;

use anyhow::Context;
use base64::{Engine, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat};

use crate::data_structures::source::{
    AlphaMode, Image, Material, Mesh, Node, OcclusionTextureInfo, PbrMetallicRoughness, Primitive,
    PrimitiveMode, Scene, SourceModel, Texture, TextureInfo, VertexAttributes,
};

/// Reads a `.gltf` or `.glb` file together with its external resources.
pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<SourceModel> {
    let path = path.as_ref();
    let (document, buffers, images) =
        gltf::import(path).with_context(|| format!("failed to import glTF {}", path.display()))?;
    Ok(from_document(&document, &buffers, &images))
}

/// Reads a glTF or GLB from memory.
///
/// Buffers may live in the GLB chunk or in data URIs. Images may be data URIs
/// or buffer views; an image that references an external file or can't be
/// decoded is left empty with a warning, and textures using it are skipped
/// later.
pub fn from_slice(bytes: &[u8]) -> anyhow::Result<SourceModel> {
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes).context("failed to parse glTF from memory")?;
    let buffers = gltf::import_buffers(&document, None, blob).context("failed to load glTF buffers from memory")?;
    let images = document
        .images()
        .map(|image| decode_embedded_image(&image, &buffers).unwrap_or_default())
        .collect();
    Ok(to_source_model(&document, &buffers, images))
}

pub fn from_document(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
) -> SourceModel {
    to_source_model(document, buffers, images.iter().map(to_image).collect())
}

fn to_source_model(document: &gltf::Document, buffers: &[gltf::buffer::Data], mut images: Vec<Image>) -> SourceModel {
    images.resize_with(document.images().count(), Image::default);
    for (image, converted) in document.images().zip(images.iter_mut()) {
        converted.name = image.name().map(str::to_owned);
    }
    SourceModel {
        scene: document.default_scene().map_or(-1, |scene| scene.index() as i32),
        scenes: document
            .scenes()
            .map(|scene| Scene {
                name: scene.name().map(str::to_owned),
                nodes: scene.nodes().map(|node| node.index() as i32).collect(),
            })
            .collect(),
        nodes: document.nodes().map(|node| to_node(&node)).collect(),
        meshes: document.meshes().map(|mesh| to_mesh(&mesh, buffers)).collect(),
        materials: document.materials().map(|material| to_material(&material)).collect(),
        textures: document
            .textures()
            .map(|texture| Texture {
                source: texture.source().index() as i32,
            })
            .collect(),
        images,
    }
}

fn to_f64<const N: usize>(values: [f32; N]) -> Vec<f64> {
    values.iter().map(|v| f64::from(*v)).collect()
}

fn to_node(node: &gltf::Node) -> Node {
    let mut result = Node {
        name: node.name().map(str::to_owned),
        mesh: node.mesh().map_or(-1, |mesh| mesh.index() as i32),
        children: node.children().map(|child| child.index() as i32).collect(),
        ..Node::default()
    };
    match node.transform() {
        gltf::scene::Transform::Matrix { matrix } => {
            result.matrix = matrix.iter().flatten().map(|v| f64::from(*v)).collect();
        }
        gltf::scene::Transform::Decomposed {
            translation,
            rotation,
            scale,
        } => {
            result.translation = to_f64(translation);
            result.rotation = to_f64(rotation);
            result.scale = to_f64(scale);
        }
    }
    result
}

fn to_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> Mesh {
    let primitives = mesh
        .primitives()
        .map(|primitive| {
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
            let attributes = VertexAttributes {
                positions: reader
                    .read_positions()
                    .map(|positions| positions.collect())
                    .unwrap_or_default(),
                normals: reader.read_normals().map(|normals| normals.collect()),
                tex_coords_0: reader.read_tex_coords(0).map(|uv| uv.into_f32().collect()),
                tex_coords_1: reader.read_tex_coords(1).map(|uv| uv.into_f32().collect()),
            };
            Primitive {
                mode: to_mode(primitive.mode()),
                attributes,
                indices: reader.read_indices().map(|indices| indices.into_u32().collect()),
                material: primitive.material().index().map_or(-1, |idx| idx as i32),
            }
        })
        .collect();
    Mesh {
        name: mesh.name().map(str::to_owned),
        primitives,
    }
}

fn to_mode(mode: gltf::mesh::Mode) -> PrimitiveMode {
    match mode {
        gltf::mesh::Mode::Points => PrimitiveMode::Points,
        gltf::mesh::Mode::Lines => PrimitiveMode::Lines,
        gltf::mesh::Mode::LineLoop => PrimitiveMode::LineLoop,
        gltf::mesh::Mode::LineStrip => PrimitiveMode::LineStrip,
        gltf::mesh::Mode::Triangles => PrimitiveMode::Triangles,
        gltf::mesh::Mode::TriangleStrip => PrimitiveMode::TriangleStrip,
        gltf::mesh::Mode::TriangleFan => PrimitiveMode::TriangleFan,
    }
}

fn to_texture_info(info: &gltf::texture::Info) -> TextureInfo {
    TextureInfo {
        index: info.texture().index() as i32,
        tex_coord: i64::from(info.tex_coord()),
    }
}

fn to_material(material: &gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();
    Material {
        name: material.name().map(str::to_owned),
        pbr_metallic_roughness: Some(PbrMetallicRoughness {
            base_color_factor: to_f64(pbr.base_color_factor()),
            base_color_texture: pbr.base_color_texture().map(|info| to_texture_info(&info)),
            metallic_factor: f64::from(pbr.metallic_factor()),
            roughness_factor: f64::from(pbr.roughness_factor()),
            metallic_roughness_texture: pbr.metallic_roughness_texture().map(|info| to_texture_info(&info)),
        }),
        emissive_factor: to_f64(material.emissive_factor()),
        emissive_texture: material.emissive_texture().map(|info| to_texture_info(&info)),
        occlusion_texture: material.occlusion_texture().map(|occlusion| OcclusionTextureInfo {
            index: occlusion.texture().index() as i32,
            tex_coord: i64::from(occlusion.tex_coord()),
            strength: f64::from(occlusion.strength()),
        }),
        alpha_mode: match material.alpha_mode() {
            gltf::material::AlphaMode::Opaque => AlphaMode::Opaque,
            gltf::material::AlphaMode::Mask => AlphaMode::Mask,
            gltf::material::AlphaMode::Blend => AlphaMode::Blend,
        },
        alpha_cutoff: f64::from(material.alpha_cutoff().unwrap_or(0.5)),
        double_sided: material.double_sided(),
    }
}

/// Channel count and bytes per channel of a decoded image format.
fn layout(format: gltf::image::Format) -> (i32, i32) {
    use gltf::image::Format;
    #[allow(unreachable_patterns)]
    match format {
        Format::R8 => (1, 1),
        Format::R8G8 => (2, 1),
        Format::R8G8B8 => (3, 1),
        Format::R8G8B8A8 => (4, 1),
        Format::R16 => (1, 2),
        Format::R16G16 => (2, 2),
        Format::R16G16B16 => (3, 2),
        Format::R16G16B16A16 => (4, 2),
        Format::R32G32B32FLOAT => (3, 4),
        Format::R32G32B32A32FLOAT => (4, 4),
        _ => (0, 0),
    }
}

fn to_image(data: &gltf::image::Data) -> Image {
    let (channels, bytes_per_channel) = layout(data.format);
    Image {
        name: None,
        pixels: data.pixels.clone(),
        width: i32::try_from(data.width).unwrap_or(-1),
        height: i32::try_from(data.height).unwrap_or(-1),
        channels,
        bytes_per_channel,
    }
}

/// Base64 payload of a `data:<mime>;base64,<payload>` URI.
fn data_uri_payload(uri: &str) -> Option<&str> {
    let (_, payload) = uri.strip_prefix("data:")?.split_once(";base64,")?;
    Some(payload)
}

fn decode_embedded_image(gltf_image: &gltf::Image, buffers: &[gltf::buffer::Data]) -> Option<Image> {
    let (encoded, mime_type) = match gltf_image.source() {
        gltf::image::Source::View { view, mime_type } => {
            let Some(bytes) = buffers
                .get(view.buffer().index())
                .and_then(|buffer| buffer.0.get(view.offset()..view.offset() + view.length()))
            else {
                log::warn!("image {} points outside of buffer {}", gltf_image.index(), view.buffer().index());
                return None;
            };
            (bytes.to_vec(), Some(mime_type))
        }
        gltf::image::Source::Uri { uri, mime_type } => {
            let Some(payload) = data_uri_payload(uri) else {
                log::warn!("image {} references external file {}, which can't be loaded from memory", gltf_image.index(), uri);
                return None;
            };
            match STANDARD.decode(payload) {
                Ok(bytes) => (bytes, mime_type),
                Err(e) => {
                    log::warn!("image {} has a malformed data URI: {}", gltf_image.index(), e);
                    return None;
                }
            }
        }
    };

    let decoded = match mime_type.and_then(ImageFormat::from_mime_type) {
        Some(format) => image::load_from_memory_with_format(&encoded, format),
        None => image::load_from_memory(&encoded),
    };
    match decoded {
        Ok(decoded) => Some(from_decoded(decoded)),
        Err(e) => {
            log::warn!("failed to decode image {}: {}", gltf_image.index(), e);
            None
        }
    }
}

fn from_decoded(decoded: DynamicImage) -> Image {
    let color = decoded.color();
    let channels = i32::from(color.channel_count());
    Image {
        name: None,
        width: i32::try_from(decoded.width()).unwrap_or(-1),
        height: i32::try_from(decoded.height()).unwrap_or(-1),
        channels,
        bytes_per_channel: i32::from(color.bytes_per_pixel()) / channels.max(1),
        pixels: decoded.into_bytes(),
    }
}

//! In-memory glTF object graph consumed by the load pipeline.
//!
//! These types mirror the glTF JSON layout closely: every cross reference is a
//! signed index and every fixed-size array is a plain `Vec<f64>`, so a model
//! produced by any parser (or by hand in tests) can carry malformed data. The
//! pipeline checks every index and array length before using it; a negative or
//! out-of-range index means "absent".
//!
//! External payloads (buffers, images) are expected to be resolved already.
//! [`crate::resources::import`] builds a [`SourceModel`] from the `gltf` crate.

/// Looks up `items[index]`, treating negative and out-of-range indices as absent.
pub fn get_safe<T>(items: &[T], index: i32) -> Option<&T> {
    usize::try_from(index).ok().and_then(|idx| items.get(idx))
}

#[derive(Clone, Debug)]
pub struct SourceModel {
    /// Default scene. Negative when the asset doesn't declare one.
    pub scene: i32,
    pub scenes: Vec<Scene>,
    pub nodes: Vec<Node>,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    pub images: Vec<Image>,
}

impl Default for SourceModel {
    fn default() -> Self {
        Self {
            scene: -1,
            scenes: Vec::new(),
            nodes: Vec::new(),
            meshes: Vec::new(),
            materials: Vec::new(),
            textures: Vec::new(),
            images: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub name: Option<String>,
    /// Root node indices.
    pub nodes: Vec<i32>,
}

/// A scene graph node.
///
/// `matrix` is column-major and only honoured when it holds exactly 16 values.
/// `translation`, `rotation` (x, y, z, w) and `scale` are each only honoured
/// with 3, 4 and 3 values respectively.
#[derive(Clone, Debug)]
pub struct Node {
    pub name: Option<String>,
    pub matrix: Vec<f64>,
    pub translation: Vec<f64>,
    pub rotation: Vec<f64>,
    pub scale: Vec<f64>,
    pub mesh: i32,
    pub children: Vec<i32>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: None,
            matrix: Vec::new(),
            translation: Vec::new(),
            rotation: Vec::new(),
            scale: Vec::new(),
            mesh: -1,
            children: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// Vertex streams already decoded from their accessors.
#[derive(Clone, Debug, Default)]
pub struct VertexAttributes {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tex_coords_0: Option<Vec<[f32; 2]>>,
    pub tex_coords_1: Option<Vec<[f32; 2]>>,
}

#[derive(Clone, Debug)]
pub struct Primitive {
    pub mode: PrimitiveMode,
    pub attributes: VertexAttributes,
    pub indices: Option<Vec<u32>>,
    /// Index into [`SourceModel::materials`]; negative selects the default material.
    pub material: i32,
}

impl Default for Primitive {
    fn default() -> Self {
        Self {
            mode: PrimitiveMode::Triangles,
            attributes: VertexAttributes::default(),
            indices: None,
            material: -1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

/// Reference from a material to a texture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureInfo {
    pub index: i32,
    pub tex_coord: i64,
}

impl TextureInfo {
    pub fn new(index: i32) -> Self {
        Self { index, tex_coord: 0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OcclusionTextureInfo {
    pub index: i32,
    pub tex_coord: i64,
    pub strength: f64,
}

impl OcclusionTextureInfo {
    pub fn new(index: i32) -> Self {
        Self {
            index,
            tex_coord: 0,
            strength: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PbrMetallicRoughness {
    pub base_color_factor: Vec<f64>,
    pub base_color_texture: Option<TextureInfo>,
    pub metallic_factor: f64,
    pub roughness_factor: f64,
    pub metallic_roughness_texture: Option<TextureInfo>,
}

impl Default for PbrMetallicRoughness {
    fn default() -> Self {
        Self {
            base_color_factor: vec![1.0, 1.0, 1.0, 1.0],
            base_color_texture: None,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            metallic_roughness_texture: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Material {
    pub name: Option<String>,
    pub pbr_metallic_roughness: Option<PbrMetallicRoughness>,
    pub emissive_factor: Vec<f64>,
    pub emissive_texture: Option<TextureInfo>,
    pub occlusion_texture: Option<OcclusionTextureInfo>,
    pub alpha_mode: AlphaMode,
    pub alpha_cutoff: f64,
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            pbr_metallic_roughness: Some(PbrMetallicRoughness::default()),
            emissive_factor: vec![0.0, 0.0, 0.0],
            emissive_texture: None,
            occlusion_texture: None,
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: 0.5,
            double_sided: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Texture {
    /// Index into [`SourceModel::images`].
    pub source: i32,
}

/// Decoded pixel data of one image.
///
/// Dimensions and channel layout are signed so that a broken decoder result can
/// be represented and rejected later.
#[derive(Clone, Debug, Default)]
pub struct Image {
    pub name: Option<String>,
    pub pixels: Vec<u8>,
    pub width: i32,
    pub height: i32,
    pub channels: i32,
    pub bytes_per_channel: i32,
}

impl Image {
    /// An 8-bit image with `channels` interleaved channels.
    pub fn new_u8(width: i32, height: i32, channels: i32, pixels: Vec<u8>) -> Self {
        Self {
            name: None,
            pixels,
            width,
            height,
            channels,
            bytes_per_channel: 1,
        }
    }
}

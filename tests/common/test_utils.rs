#![allow(dead_code)]

use gltf_bake::{
    data_structures::{
        instance::Instance,
        model::Geometry,
        source::{
            Image, Material, Mesh, Node, OcclusionTextureInfo, PbrMetallicRoughness, Primitive, Scene, SourceModel,
            Texture, TextureInfo, VertexAttributes,
        },
    },
    render::{HeadlessRenderer, MaterialInstance, MeshHandle, RenderBackend},
};

/// One backend call, as seen by [`RecordingRenderer`].
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Acquire(MeshHandle),
    Transform(MeshHandle, Instance),
    Visible(MeshHandle, bool),
    Release(MeshHandle),
}

/// Headless renderer that also records every call in order.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub inner: HeadlessRenderer,
    pub calls: Vec<Call>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl RenderBackend for RecordingRenderer {
    fn acquire_mesh(&mut self, geometry: Geometry, material: &MaterialInstance<'_>) -> Option<MeshHandle> {
        let handle = self.inner.acquire_mesh(geometry, material)?;
        self.calls.push(Call::Acquire(handle));
        Some(handle)
    }

    fn set_transform(&mut self, handle: MeshHandle, transform: &Instance) {
        self.calls.push(Call::Transform(handle, *transform));
        self.inner.set_transform(handle, transform);
    }

    fn set_visible(&mut self, handle: MeshHandle, visible: bool) {
        self.calls.push(Call::Visible(handle, visible));
        self.inner.set_visible(handle, visible);
    }

    fn release_mesh(&mut self, handle: MeshHandle) {
        self.calls.push(Call::Release(handle));
        self.inner.release_mesh(handle);
    }
}

pub fn triangle(material: i32) -> Primitive {
    Primitive {
        attributes: VertexAttributes {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: Some(vec![[0.0, 0.0, 1.0]; 3]),
            tex_coords_0: Some(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]),
            tex_coords_1: None,
        },
        indices: Some(vec![0, 1, 2]),
        material,
        ..Primitive::default()
    }
}

/// A primitive the default geometry builder rejects.
pub fn broken_primitive(material: i32) -> Primitive {
    Primitive {
        indices: Some(vec![0, 1, 7]),
        ..triangle(material)
    }
}

pub fn mesh(primitives: Vec<Primitive>) -> Mesh {
    Mesh {
        name: None,
        primitives,
    }
}

pub fn node(mesh: i32, children: Vec<i32>) -> Node {
    Node {
        mesh,
        children,
        ..Node::default()
    }
}

/// 2x2 RGB image with distinct values per channel and pixel.
pub fn rgb_image() -> Image {
    Image::new_u8(
        2,
        2,
        3,
        vec![
            10, 11, 12, //
            20, 21, 22, //
            30, 31, 32, //
            40, 41, 42,
        ],
    )
}

/// 2x1 RGBA image packing roughness in green and metallic in blue.
pub fn packed_metallic_roughness() -> Image {
    Image::new_u8(2, 1, 4, vec![0, 100, 200, 255, 0, 110, 210, 255])
}

pub fn textured_material(name: &str) -> Material {
    Material {
        name: Some(name.to_owned()),
        pbr_metallic_roughness: Some(PbrMetallicRoughness {
            base_color_factor: vec![1.0, 1.0, 1.0, 1.0],
            base_color_texture: Some(TextureInfo::new(0)),
            metallic_factor: 0.5,
            roughness_factor: 0.5,
            metallic_roughness_texture: Some(TextureInfo::new(2)),
        }),
        occlusion_texture: Some(OcclusionTextureInfo::new(1)),
        ..Material::default()
    }
}

/// Two materials sharing textures, a small node tree and one default-material
/// primitive.
///
/// Textures 0 and 1 both point at image 0, texture 2 at image 1.
pub fn textured_scene() -> SourceModel {
    SourceModel {
        scene: 0,
        scenes: vec![Scene {
            name: Some("main".to_owned()),
            nodes: vec![0, 2],
        }],
        nodes: vec![
            Node {
                translation: vec![1.0, 2.0, 3.0],
                ..node(0, vec![1])
            },
            Node {
                scale: vec![2.0, 2.0, 2.0],
                ..node(1, vec![])
            },
            node(2, vec![]),
        ],
        meshes: vec![
            mesh(vec![triangle(0)]),
            mesh(vec![triangle(1), triangle(-1)]),
            mesh(vec![triangle(1)]),
        ],
        materials: vec![textured_material("first"), textured_material("second")],
        textures: vec![Texture { source: 0 }, Texture { source: 0 }, Texture { source: 1 }],
        images: vec![rgb_image(), packed_metallic_roughness()],
    }
}

/// Single triangle with an embedded 2x1 RGB PNG used as base color,
/// metallic-roughness and (with texCoord 2) occlusion texture.
pub const EMBEDDED_TRIANGLE_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [ { "nodes": [0] }, { "nodes": [2] } ],
  "nodes": [
    { "name": "root", "translation": [1.0, 2.0, 3.0], "children": [1] },
    { "name": "child", "mesh": 0, "scale": [2.0, 2.0, 2.0] },
    { "name": "other", "mesh": 0 }
  ],
  "meshes": [
    {
      "name": "triangle",
      "primitives": [
        { "attributes": { "POSITION": 0, "TEXCOORD_0": 1 }, "indices": 2, "material": 0 }
      ]
    }
  ],
  "materials": [
    {
      "name": "painted",
      "pbrMetallicRoughness": {
        "baseColorFactor": [1.0, 0.5, 0.5, 1.0],
        "baseColorTexture": { "index": 0 },
        "metallicFactor": 0.25,
        "roughnessFactor": 0.75,
        "metallicRoughnessTexture": { "index": 0 }
      },
      "occlusionTexture": { "index": 0, "texCoord": 2, "strength": 0.5 },
      "alphaMode": "MASK",
      "alphaCutoff": 0.25,
      "doubleSided": true
    }
  ],
  "textures": [ { "source": 0 } ],
  "images": [
    { "uri": "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAIAAAABCAIAAAB7QOjdAAAAD0lEQVR4nGPgEpHTMLIBAAI3ANNbVlHYAAAAAElFTkSuQmCC" }
  ],
  "buffers": [
    {
      "byteLength": 68,
      "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAABAAIAAAA="
    }
  ],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
    { "buffer": 0, "byteOffset": 36, "byteLength": 24 },
    { "buffer": 0, "byteOffset": 60, "byteLength": 6 }
  ],
  "accessors": [
    { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
    { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2" },
    { "bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR" }
  ]
}"#;

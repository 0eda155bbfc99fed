//! Resolved models: geometry, material descriptors and the model that owns
//! every renderer resource created for one glTF asset.
//!
//! [`Model::load`] runs the whole pipeline in one synchronous call:
//!
//! 1. every source material is resolved into a [`Material`] descriptor, with
//!    its textures converted through a [`TextureCache`] scoped to the load
//! 2. the active scene is flattened into world-space meshes
//! 3. each primitive gets geometry from a [`GeometryBuilder`] and is registered
//!    with the [`RenderBackend`]
//!
//! The glTF default material is resolved in step 1 as well, whether or not a
//! primitive ends up using it. It binds no textures, so it never costs a
//! conversion, and [`Model::default_material`] is always available.
//!
//! A primitive that fails at any step is skipped; the rest of the model still
//! loads. Dropping the model releases everything it acquired.

use std::collections::HashMap;

use cgmath::{Matrix4, SquareMatrix};

use crate::{
    context::LoadOptions,
    data_structures::{
        instance::Instance,
        scene_graph::SceneGraphTraverser,
        source::{self, SourceModel, get_safe},
        texture::{CachedTexture, TextureFamily, TextureId},
    },
    events::{Event, SubscriptionToken},
    render::{GeometryBuilder, MaterialInstance, MeshHandle, RenderBackend},
    resources::{material::MaterialResolver, mesh::TriangleGeometryBuilder, texture::TextureCache},
};

/// Vertex layout produced by the default geometry builder.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords_0: [f32; 2],
    pub tex_coords_1: [f32; 2],
}

/// Indexed triangle list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Material slot a texture is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureSlot {
    BaseColor,
    Metallic,
    Roughness,
    Emissive,
    Occlusion,
}

impl TextureSlot {
    pub fn name(&self) -> &'static str {
        match self {
            TextureSlot::BaseColor => "baseColor",
            TextureSlot::Metallic => "metallic",
            TextureSlot::Roughness => "roughness",
            TextureSlot::Emissive => "emissive",
            TextureSlot::Occlusion => "occlusion",
        }
    }

    /// The conversion family textures in this slot are cached under.
    pub fn family(&self) -> TextureFamily {
        match self {
            TextureSlot::BaseColor | TextureSlot::Emissive => TextureFamily::Rgba,
            TextureSlot::Metallic => TextureFamily::Metallic,
            TextureSlot::Roughness => TextureFamily::Roughness,
            TextureSlot::Occlusion => TextureFamily::Occlusion,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureBinding {
    pub slot: TextureSlot,
    pub texture: TextureId,
    pub tex_coord: u32,
}

pub const ALPHA_MODE_OPAQUE: u32 = 0;
pub const ALPHA_MODE_MASK: u32 = 1;
pub const ALPHA_MODE_BLEND: u32 = 2;

/// Opacity settings. `factor` is only set for masked materials, where it is
/// `1 - alphaCutoff`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Alpha {
    pub mode: u32,
    pub factor: Option<f32>,
}

/// Renderer-agnostic PBR material.
///
/// Optional factors are `None` when the source material didn't provide them;
/// a renderer should fall back to its own defaults.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    pub name: Option<String>,
    /// Linear RGBA.
    pub base_color: Option<[f32; 4]>,
    pub metallic_factor: Option<f32>,
    pub roughness_factor: Option<f32>,
    pub emissive_enabled: bool,
    pub emissive_color: Option<[f32; 4]>,
    pub occlusion_strength: Option<f32>,
    pub alpha: Alpha,
    pub double_sided: bool,
    pub textures: Vec<TextureBinding>,
}

impl Material {
    pub fn texture(&self, slot: TextureSlot) -> Option<&TextureBinding> {
        self.textures.iter().find(|binding| binding.slot == slot)
    }
}

/// Physics collider registered for a primitive by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColliderHandle(pub u64);

#[derive(Clone, Debug, PartialEq)]
pub struct Primitive {
    pub mesh_handle: MeshHandle,
    pub colliders: Vec<ColliderHandle>,
    /// Index into [`Model::materials`]; `None` for the default material.
    pub material: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    /// World transform baked from the scene graph.
    pub transform: Matrix4<f64>,
    pub primitives: Vec<Primitive>,
}

pub struct Model<B: RenderBackend> {
    backend: B,
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
    default_material: Material,
    textures: HashMap<TextureId, CachedTexture>,
    transform: Matrix4<f64>,
    visible: bool,
    transform_changed: Event<Matrix4<f64>>,
}

impl<B: RenderBackend> Model<B> {
    /// Loads `source` with the default triangle geometry builder.
    pub fn load(source: &SourceModel, backend: B, options: &LoadOptions) -> Self {
        let geometry = TriangleGeometryBuilder::from(options);
        Self::load_with(source, backend, &geometry, options)
    }

    pub fn load_with(
        source: &SourceModel,
        backend: B,
        geometry: &dyn GeometryBuilder,
        options: &LoadOptions,
    ) -> Self {
        let resolver = MaterialResolver::new(options.max_tex_coord_sets);
        let mut cache = TextureCache::new(source);
        let materials: Vec<Material> = source
            .materials
            .iter()
            .map(|material| resolver.resolve(material, &mut cache))
            .collect();
        let default_material = resolver.resolve(&source::Material::default(), &mut cache);
        log::debug!(
            "resolved {} materials, {} textures from {} conversions",
            materials.len(),
            cache.len(),
            cache.conversions()
        );

        let mut model = Self {
            backend,
            meshes: Vec::new(),
            materials,
            default_material,
            textures: cache.into_textures(),
            transform: Matrix4::identity(),
            visible: options.visible,
            transform_changed: Event::new(),
        };

        let visits = SceneGraphTraverser::new(source, options.root_transform).visit_meshes();
        for visit in visits {
            let source_mesh = &source.meshes[visit.mesh];
            let primitives: Vec<Primitive> = source_mesh
                .primitives
                .iter()
                .enumerate()
                .filter_map(|(idx, primitive)| {
                    let loaded = model.load_primitive(source, primitive, geometry, &visit.transform);
                    if loaded.is_none() {
                        log::warn!(
                            "primitive {} of mesh {} ({:?}) could not be loaded and is skipped",
                            idx,
                            visit.mesh,
                            source_mesh.name
                        );
                    }
                    loaded
                })
                .collect();
            if !primitives.is_empty() {
                model.meshes.push(Mesh {
                    transform: visit.transform,
                    primitives,
                });
            }
        }
        log::info!(
            "loaded model with {} meshes, {} primitives",
            model.meshes.len(),
            model.primitive_count()
        );
        model
    }

    fn load_primitive(
        &mut self,
        source: &SourceModel,
        primitive: &source::Primitive,
        geometry: &dyn GeometryBuilder,
        mesh_transform: &Matrix4<f64>,
    ) -> Option<Primitive> {
        let material_index = if primitive.material < 0 {
            None
        } else if get_safe(&source.materials, primitive.material).is_some() {
            Some(primitive.material as usize)
        } else {
            log::warn!("primitive references missing material {}", primitive.material);
            return None;
        };

        let geometry = geometry.build_geometry(source, primitive)?;
        let material = match material_index {
            Some(idx) => &self.materials[idx],
            None => &self.default_material,
        };
        let instance = MaterialInstance::new(material, &self.textures);
        let mesh_handle = self.backend.acquire_mesh(geometry, &instance)?;

        let placement = Instance::from_matrix(&(self.transform * mesh_transform));
        self.backend.set_transform(mesh_handle, &placement);
        self.backend.set_visible(mesh_handle, self.visible);

        Some(Primitive {
            mesh_handle,
            colliders: Vec::new(),
            material: material_index,
        })
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Material used by primitives without a material index.
    pub fn default_material(&self) -> &Material {
        &self.default_material
    }

    pub fn textures(&self) -> &HashMap<TextureId, CachedTexture> {
        &self.textures
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn primitive_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.primitives.len()).sum()
    }

    /// The material of `primitive` bound to this model's textures, e.g. for
    /// re-applying it after the renderer rebuilt a mesh.
    pub fn material_instance(&self, primitive: &Primitive) -> MaterialInstance<'_> {
        let material = primitive
            .material
            .and_then(|idx| self.materials.get(idx))
            .unwrap_or(&self.default_material);
        MaterialInstance::new(material, &self.textures)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        for primitive in self.meshes.iter().flat_map(|mesh| &mesh.primitives) {
            self.backend.set_visible(primitive.mesh_handle, visible);
        }
        self.visible = visible;
    }

    pub fn transform(&self) -> &Matrix4<f64> {
        &self.transform
    }

    /// Places the whole model. Every primitive ends up at
    /// `transform * mesh.transform`.
    pub fn set_transform(&mut self, transform: Matrix4<f64>) {
        self.transform = transform;
        for mesh in &self.meshes {
            let placement = Instance::from_matrix(&(transform * mesh.transform));
            for primitive in &mesh.primitives {
                self.backend.set_transform(primitive.mesh_handle, &placement);
            }
        }
        self.transform_changed.emit(&transform);
    }

    /// Replaces the baked transform of one mesh. Returns false if there is no
    /// such mesh.
    pub fn set_mesh_transform(&mut self, mesh: usize, transform: Matrix4<f64>) -> bool {
        let Some(target) = self.meshes.get_mut(mesh) else {
            return false;
        };
        target.transform = transform;
        let placement = Instance::from_matrix(&(self.transform * transform));
        for primitive in &target.primitives {
            self.backend.set_transform(primitive.mesh_handle, &placement);
        }
        true
    }

    pub fn on_transform_changed(&mut self, handler: impl FnMut(&Matrix4<f64>) + 'static) -> SubscriptionToken {
        self.transform_changed.subscribe(handler)
    }

    pub fn unsubscribe_transform_changed(&mut self, token: SubscriptionToken) -> bool {
        self.transform_changed.unsubscribe(token)
    }

    /// Releases every mesh handle and forgets all primitives. Safe to call
    /// more than once.
    pub fn destroy(&mut self) {
        for mesh in self.meshes.drain(..) {
            for primitive in mesh.primitives {
                self.backend.release_mesh(primitive.mesh_handle);
            }
        }
    }
}

impl<B: RenderBackend> Drop for Model<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<B: RenderBackend> std::fmt::Debug for Model<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("meshes", &self.meshes)
            .field("materials", &self.materials)
            .field("textures", &self.textures.len())
            .field("transform", &self.transform)
            .field("visible", &self.visible)
            .finish()
    }
}

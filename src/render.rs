//! Renderer seam: the operations the load pipeline needs from a render backend.
//!
//! The pipeline never talks to a GPU directly. It builds CPU-side geometry through
//! a [`GeometryBuilder`] and registers the result with a [`RenderBackend`], which
//! owns whatever GPU objects it creates and hands back an opaque [`MeshHandle`].
//!
//! # Key types
//!
//! - [`RenderBackend`] acquires, transforms, shows/hides and releases meshes
//! - [`GeometryBuilder`] turns one source primitive into [`Geometry`]
//! - [`MaterialInstance`] is a resolved material with its textures looked up
//! - [`HeadlessRenderer`] keeps everything in memory (tools, tests, servers)
//!

use std::collections::HashMap;

use crate::data_structures::{
    instance::Instance,
    model::{Geometry, Material, TextureSlot},
    source::{self, SourceModel},
    texture::{CachedTexture, TextureId},
};

/// Opaque id of a mesh registered with a [`RenderBackend`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshHandle(pub u64);

/// A texture bound to one slot of a material, with its pixels.
#[derive(Clone, Copy, Debug)]
pub struct BoundTexture<'a> {
    pub slot: TextureSlot,
    pub id: &'a TextureId,
    pub tex_coord: u32,
    pub texture: &'a CachedTexture,
}

/// What a backend receives when a mesh is acquired: the material descriptor
/// and every texture it binds.
#[derive(Clone, Debug)]
pub struct MaterialInstance<'a> {
    pub material: &'a Material,
    pub textures: Vec<BoundTexture<'a>>,
}

impl<'a> MaterialInstance<'a> {
    /// Binds `material` against `textures`. Bindings whose texture is missing
    /// are left out.
    pub fn new(material: &'a Material, textures: &'a HashMap<TextureId, CachedTexture>) -> Self {
        let textures = material
            .textures
            .iter()
            .filter_map(|binding| {
                let texture = textures.get(&binding.texture)?;
                Some(BoundTexture {
                    slot: binding.slot,
                    id: &binding.texture,
                    tex_coord: binding.tex_coord,
                    texture,
                })
            })
            .collect();
        Self { material, textures }
    }

    pub fn texture(&self, slot: TextureSlot) -> Option<&BoundTexture<'a>> {
        self.textures.iter().find(|bound| bound.slot == slot)
    }
}

/// Builds renderer-agnostic geometry for one primitive. `None` means the
/// primitive can't be rendered and is skipped.
pub trait GeometryBuilder {
    fn build_geometry(&self, model: &SourceModel, primitive: &source::Primitive) -> Option<Geometry>;
}

/// The four operations the pipeline performs on a renderer.
///
/// Failures are reported as `None` from [`acquire_mesh`](Self::acquire_mesh);
/// the other calls are infallible from the pipeline's point of view.
pub trait RenderBackend {
    fn acquire_mesh(&mut self, geometry: Geometry, material: &MaterialInstance<'_>) -> Option<MeshHandle>;

    /// Places a mesh. `transform.scale` may be non-uniform and negative on X.
    fn set_transform(&mut self, handle: MeshHandle, transform: &Instance);

    fn set_visible(&mut self, handle: MeshHandle, visible: bool);

    fn release_mesh(&mut self, handle: MeshHandle);
}

impl<B: RenderBackend + ?Sized> RenderBackend for &mut B {
    fn acquire_mesh(&mut self, geometry: Geometry, material: &MaterialInstance<'_>) -> Option<MeshHandle> {
        (**self).acquire_mesh(geometry, material)
    }

    fn set_transform(&mut self, handle: MeshHandle, transform: &Instance) {
        (**self).set_transform(handle, transform)
    }

    fn set_visible(&mut self, handle: MeshHandle, visible: bool) {
        (**self).set_visible(handle, visible)
    }

    fn release_mesh(&mut self, handle: MeshHandle) {
        (**self).release_mesh(handle)
    }
}

impl<B: RenderBackend + ?Sized> RenderBackend for Box<B> {
    fn acquire_mesh(&mut self, geometry: Geometry, material: &MaterialInstance<'_>) -> Option<MeshHandle> {
        (**self).acquire_mesh(geometry, material)
    }

    fn set_transform(&mut self, handle: MeshHandle, transform: &Instance) {
        (**self).set_transform(handle, transform)
    }

    fn set_visible(&mut self, handle: MeshHandle, visible: bool) {
        (**self).set_visible(handle, visible)
    }

    fn release_mesh(&mut self, handle: MeshHandle) {
        (**self).release_mesh(handle)
    }
}

/// A mesh as stored by the [`HeadlessRenderer`].
#[derive(Clone, Debug)]
pub struct HeadlessMesh {
    pub geometry: Geometry,
    pub material: Material,
    pub textures: Vec<(TextureSlot, TextureId)>,
    pub transform: Instance,
    pub visible: bool,
}

/// In-memory backend. Keeps copies of everything it is given so the result of
/// a load can be inspected without a GPU.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    meshes: HashMap<MeshHandle, HeadlessMesh>,
    next_id: u64,
    released: usize,
    capacity: Option<usize>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A renderer that refuses to hold more than `capacity` live meshes.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&HeadlessMesh> {
        self.meshes.get(&handle)
    }

    /// Live meshes in acquisition order.
    pub fn meshes(&self) -> Vec<(MeshHandle, &HeadlessMesh)> {
        let mut meshes: Vec<_> = self.meshes.iter().map(|(h, m)| (*h, m)).collect();
        meshes.sort_by_key(|(handle, _)| *handle);
        meshes
    }

    pub fn live_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn released_count(&self) -> usize {
        self.released
    }
}

impl RenderBackend for HeadlessRenderer {
    fn acquire_mesh(&mut self, geometry: Geometry, material: &MaterialInstance<'_>) -> Option<MeshHandle> {
        if self.capacity.is_some_and(|capacity| self.meshes.len() >= capacity) {
            log::warn!("headless renderer is full, refusing mesh with {} vertices", geometry.vertices.len());
            return None;
        }
        let handle = MeshHandle(self.next_id);
        self.next_id += 1;
        self.meshes.insert(
            handle,
            HeadlessMesh {
                geometry,
                material: material.material.clone(),
                textures: material
                    .textures
                    .iter()
                    .map(|bound| (bound.slot, bound.id.clone()))
                    .collect(),
                transform: Instance::new(),
                visible: true,
            },
        );
        Some(handle)
    }

    fn set_transform(&mut self, handle: MeshHandle, transform: &Instance) {
        match self.meshes.get_mut(&handle) {
            Some(mesh) => mesh.transform = *transform,
            None => log::warn!("set_transform on unknown mesh {:?}", handle),
        }
    }

    fn set_visible(&mut self, handle: MeshHandle, visible: bool) {
        match self.meshes.get_mut(&handle) {
            Some(mesh) => mesh.visible = visible,
            None => log::warn!("set_visible on unknown mesh {:?}", handle),
        }
    }

    fn release_mesh(&mut self, handle: MeshHandle) {
        if self.meshes.remove(&handle).is_some() {
            self.released += 1;
        } else {
            log::warn!("release of unknown mesh {:?}", handle);
        }
    }
}

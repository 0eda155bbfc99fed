use std::path::Path;

use crate::{
    context::LoadOptions,
    data_structures::model::Model,
    render::RenderBackend,
};

/**
 * This module contains all logic that turns glTF data into renderer resources:
 * file import, texture baking, material resolution and geometry building.
 */
pub mod import;
pub mod material;
pub mod mesh;
pub mod texture;

/// Imports a glTF file and loads it into `backend`.
pub fn load_model_gltf<B: RenderBackend>(
    path: impl AsRef<Path>,
    backend: B,
    options: &LoadOptions,
) -> anyhow::Result<Model<B>> {
    let path = path.as_ref();
    let source = import::from_path(path)?;
    log::info!(
        "imported {}: {} scenes, {} nodes, {} meshes, {} materials, {} images",
        path.display(),
        source.scenes.len(),
        source.nodes.len(),
        source.meshes.len(),
        source.materials.len(),
        source.images.len()
    );
    Ok(Model::load(&source, backend, options))
}

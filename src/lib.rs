//! gltf-bake
//!
//! Turns a parsed glTF asset into renderer-ready resources: the scene graph is
//! flattened into world-space meshes, materials are mapped onto a
//! renderer-agnostic PBR descriptor, and textures are baked into the channel
//! layouts a renderer samples (RGBA, single-channel occlusion, and split
//! metallic/roughness). Loading is synchronous and best-effort: anything broken
//! in the asset is skipped with a warning, never turned into an error.
//!
//! High-level modules
//! - `context`: load options
//! - `data_structures`: source glTF graph, resolved model types, scene traversal
//! - `events`: subscription interface for model notifications
//! - `render`: the backend traits the pipeline drives and a headless backend
//! - `resources`: glTF import, texture baking, material and geometry resolution
//!

pub mod context;
pub mod data_structures;
pub mod events;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::{Matrix4, Quaternion, Vector3};
pub use context::LoadOptions;
pub use data_structures::model::{Material, Mesh, Model, Primitive};
pub use data_structures::source::SourceModel;
pub use render::{GeometryBuilder, HeadlessRenderer, RenderBackend};
pub use resources::load_model_gltf;

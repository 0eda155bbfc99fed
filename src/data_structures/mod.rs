//! Engine-side data structures for loaded glTF models.
//!
//! - `source` is the in-memory glTF object graph the pipeline reads
//! - `scene_graph` flattens the node hierarchy into world-space meshes
//! - `instance` holds decomposed translation/rotation/scale transforms
//! - `texture` contains converted pixel buffers and their cache keys
//! - `model` contains resolved meshes, materials and the owning model

pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod source;
pub mod texture;

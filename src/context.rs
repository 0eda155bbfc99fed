//! Load configuration.

use cgmath::Matrix4;

use crate::data_structures::scene_graph::mirror_x;

/// Settings for [`Model::load`](crate::data_structures::model::Model::load).
///
/// The defaults target a renderer that samples two UV sets and uses a
/// left-handed variant of glTF's axes (X mirrored).
#[derive(Clone, Debug, PartialEq)]
pub struct LoadOptions {
    /// Coordinate correction applied once to every scene root.
    pub root_transform: Matrix4<f64>,
    /// Number of UV sets the renderer samples. Texture bindings that use a
    /// higher texCoord set are dropped.
    pub max_tex_coord_sets: u32,
    /// Initial visibility of every acquired mesh.
    pub visible: bool,
    /// Compute flat normals for primitives that don't provide any.
    pub generate_flat_normals: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            root_transform: mirror_x(),
            max_tex_coord_sets: 2,
            visible: true,
            generate_flat_normals: true,
        }
    }
}

impl LoadOptions {
    pub fn with_root_transform(mut self, root_transform: Matrix4<f64>) -> Self {
        self.root_transform = root_transform;
        self
    }

    pub fn with_max_tex_coord_sets(mut self, sets: u32) -> Self {
        self.max_tex_coord_sets = sets;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_flat_normals(mut self, generate: bool) -> Self {
        self.generate_flat_normals = generate;
        self
    }
}

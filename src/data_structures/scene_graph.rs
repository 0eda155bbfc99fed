//! Scene graph traversal.
//!
//! Walks the active scene of a [`SourceModel`] depth-first, composing each
//! node's local transform onto its parent's, and flattens the hierarchy into a
//! list of meshes placed in world space. Broken references (negative or
//! out-of-range node, mesh and child indices, cycles) are skipped with a
//! warning; they never stop the rest of the traversal.

use cgmath::{Matrix4, Quaternion, SquareMatrix, Vector3};

use crate::data_structures::source::{self, Node, SourceModel, get_safe};

/// A mesh reached through the scene graph, with its composed world transform.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshVisit {
    pub mesh: usize,
    pub transform: Matrix4<f64>,
}

/// X-axis mirror applied to scene roots by default.
pub fn mirror_x() -> Matrix4<f64> {
    Matrix4::from_nonuniform_scale(-1.0, 1.0, 1.0)
}

/// True if all 16 values are exactly those of the identity matrix.
pub fn is_identity(matrix: &[f64]) -> bool {
    const IDENTITY: [f64; 16] = [
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
    ];
    matrix == &IDENTITY[..]
}

/// Composes a node's local transform onto `parent`.
///
/// A full 16-value matrix wins unless it is the identity; otherwise the result
/// is `parent * T * R * S` using whichever of translation, rotation (x, y, z, w)
/// and scale are well-formed. A node without any of them inherits `parent`.
pub fn compose_transform(parent: &Matrix4<f64>, node: &Node) -> Matrix4<f64> {
    if node.matrix.len() == 16 && !is_identity(&node.matrix) {
        let m = &node.matrix;
        #[rustfmt::skip]
        let local = Matrix4::new(
            m[0], m[1], m[2], m[3],
            m[4], m[5], m[6], m[7],
            m[8], m[9], m[10], m[11],
            m[12], m[13], m[14], m[15],
        );
        return parent * local;
    }

    let mut current = *parent;
    if let [x, y, z] = node.translation.as_slice() {
        current = current * Matrix4::from_translation(Vector3::new(*x, *y, *z));
    }
    if let [x, y, z, w] = node.rotation.as_slice() {
        current = current * Matrix4::from(Quaternion::new(*w, *x, *y, *z));
    }
    if let [x, y, z] = node.scale.as_slice() {
        current = current * Matrix4::from_nonuniform_scale(*x, *y, *z);
    }
    current
}

pub struct SceneGraphTraverser<'a> {
    model: &'a SourceModel,
    root_transform: Matrix4<f64>,
}

impl<'a> SceneGraphTraverser<'a> {
    pub fn new(model: &'a SourceModel, root_transform: Matrix4<f64>) -> Self {
        Self {
            model,
            root_transform,
        }
    }

    /// The scene that gets displayed: the declared default scene if it is valid,
    /// else the first scene, else none.
    pub fn active_scene(&self) -> Option<&'a source::Scene> {
        get_safe(&self.model.scenes, self.model.scene).or_else(|| self.model.scenes.first())
    }

    /// Every mesh reachable from the active scene, in depth-first pre-order.
    ///
    /// Without any scene, each mesh of the model is visited once with an
    /// identity transform and no root correction.
    pub fn visit_meshes(&self) -> Vec<MeshVisit> {
        let mut visits = Vec::new();
        match self.active_scene() {
            Some(scene) => {
                let mut path = Vec::new();
                for &root in &scene.nodes {
                    self.visit_node(root, &self.root_transform, &mut path, &mut visits);
                }
            }
            None => {
                log::debug!("model has no scene, visiting all {} meshes", self.model.meshes.len());
                visits.extend((0..self.model.meshes.len()).map(|mesh| MeshVisit {
                    mesh,
                    transform: Matrix4::identity(),
                }));
            }
        }
        visits
    }

    /// Flattened `(world transform, primitive)` pairs of the active scene.
    pub fn primitives(&self) -> Vec<(Matrix4<f64>, &'a source::Primitive)> {
        self.visit_meshes()
            .into_iter()
            .flat_map(|visit| {
                self.model.meshes[visit.mesh]
                    .primitives
                    .iter()
                    .map(move |primitive| (visit.transform, primitive))
            })
            .collect()
    }

    fn visit_node(
        &self,
        index: i32,
        parent: &Matrix4<f64>,
        path: &mut Vec<usize>,
        visits: &mut Vec<MeshVisit>,
    ) {
        let Some(node) = get_safe(&self.model.nodes, index) else {
            log::warn!("skipping invalid node index {}", index);
            return;
        };
        let node_index = index as usize;
        if path.contains(&node_index) {
            log::warn!("node {} is its own ancestor, skipping cycle", node_index);
            return;
        }

        let transform = compose_transform(parent, node);
        log::debug!("visiting node {} ({:?})", node_index, node.name);

        if node.mesh >= 0 {
            if get_safe(&self.model.meshes, node.mesh).is_some() {
                visits.push(MeshVisit {
                    mesh: node.mesh as usize,
                    transform,
                });
            } else {
                log::warn!("node {} references invalid mesh {}", node_index, node.mesh);
            }
        }

        path.push(node_index);
        for &child in &node.children {
            self.visit_node(child, &transform, path, visits);
        }
        path.pop();
    }
}

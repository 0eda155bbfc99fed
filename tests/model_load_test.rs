mod common;

use std::{cell::RefCell, rc::Rc};

use cgmath::{InnerSpace, Matrix4, SquareMatrix, Vector3};
use gltf_bake::{
    HeadlessRenderer, LoadOptions, Model,
    data_structures::{
        model::TextureSlot,
        source::{Scene, SourceModel},
    },
};

use crate::common::test_utils::{
    Call, RecordingRenderer, broken_primitive, mesh, node, textured_scene, triangle,
};

fn assert_vec_close(actual: Vector3<f64>, expected: Vector3<f64>) {
    assert!(
        (actual - expected).magnitude() < 1e-9,
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}

#[test]
fn loads_every_primitive_and_shares_textures() {
    let source = textured_scene();
    let mut renderer = HeadlessRenderer::new();
    let model = Model::load(&source, &mut renderer, &LoadOptions::default());

    assert_eq!(model.meshes().len(), 3);
    assert_eq!(model.primitive_count(), 4);
    assert_eq!(model.materials().len(), 2);

    let mut ids: Vec<&str> = model.textures().keys().map(|id| id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["Metallic_1", "Occlusion_0", "RGBA_0", "Roughness_1"]);

    let first = &model.materials()[0];
    let second = &model.materials()[1];
    for slot in [
        TextureSlot::BaseColor,
        TextureSlot::Metallic,
        TextureSlot::Roughness,
        TextureSlot::Occlusion,
    ] {
        assert_eq!(
            first.texture(slot).map(|b| &b.texture),
            second.texture(slot).map(|b| &b.texture),
            "{} differs",
            slot.name()
        );
    }

    let rgba = &model.textures()[&first.texture(TextureSlot::BaseColor).unwrap().texture];
    assert_eq!(&rgba.data[..8], &[10, 11, 12, 255, 20, 21, 22, 255]);
    let roughness = &model.textures()[&first.texture(TextureSlot::Roughness).unwrap().texture];
    assert_eq!(roughness.data, vec![100, 110]);
    let metallic = &model.textures()[&first.texture(TextureSlot::Metallic).unwrap().texture];
    assert_eq!(metallic.data, vec![200, 210]);
    let occlusion = &model.textures()[&first.texture(TextureSlot::Occlusion).unwrap().texture];
    assert_eq!(occlusion.data, vec![10, 20, 30, 40]);
}

#[test]
fn primitives_are_placed_with_decomposed_world_transforms() {
    let source = textured_scene();
    let mut renderer = HeadlessRenderer::new();
    let model = Model::load(&source, &mut renderer, &LoadOptions::default());

    let root = &model.meshes()[0];
    let placed = model.backend().mesh(root.primitives[0].mesh_handle).unwrap();
    // the default root correction mirrors X
    assert_vec_close(placed.transform.position, Vector3::new(-1.0, 2.0, 3.0));
    assert_vec_close(placed.transform.scale, Vector3::new(-1.0, 1.0, 1.0));

    let child = &model.meshes()[1];
    let placed = model.backend().mesh(child.primitives[0].mesh_handle).unwrap();
    assert_vec_close(placed.transform.position, Vector3::new(-1.0, 2.0, 3.0));
    assert_vec_close(placed.transform.scale, Vector3::new(-2.0, 2.0, 2.0));
    assert!((placed.transform.rotation.s.abs() - 1.0).abs() < 1e-9);
}

#[test]
fn negative_material_index_uses_default_material() {
    let source = textured_scene();
    let mut renderer = HeadlessRenderer::new();
    let model = Model::load(&source, &mut renderer, &LoadOptions::default());

    let primitive = &model.meshes()[1].primitives[1];
    assert_eq!(primitive.material, None);
    let instance = model.material_instance(primitive);
    assert_eq!(instance.material.base_color, Some([1.0, 1.0, 1.0, 1.0]));
    assert_eq!(instance.material.metallic_factor, Some(1.0));
    assert!(instance.textures.is_empty());

    let bound = model.material_instance(&model.meshes()[0].primitives[0]);
    assert_eq!(bound.textures.len(), 4);
    assert!(bound.texture(TextureSlot::Occlusion).is_some());
}

#[test]
fn default_material_is_resolved_without_users() {
    let mut source = textured_scene();
    source.meshes[1] = mesh(vec![triangle(1)]);
    let mut renderer = HeadlessRenderer::new();
    let model = Model::load(&source, &mut renderer, &LoadOptions::default());

    let primitives: Vec<_> = model.meshes().iter().flat_map(|m| &m.primitives).collect();
    assert!(primitives.iter().all(|p| p.material.is_some()));

    let default = model.default_material();
    assert_eq!(default.base_color, Some([1.0, 1.0, 1.0, 1.0]));
    assert_eq!(default.roughness_factor, Some(1.0));
    assert!(default.textures.is_empty());
    assert_eq!(model.textures().len(), 4);
}

#[test]
fn broken_primitives_are_skipped_and_siblings_still_load() {
    let mut source = textured_scene();
    source.meshes[0] = mesh(vec![broken_primitive(0), triangle(0), triangle(9)]);
    let mut renderer = HeadlessRenderer::new();
    let model = Model::load(&source, &mut renderer, &LoadOptions::default());

    assert_eq!(model.meshes()[0].primitives.len(), 1);
    assert_eq!(model.meshes()[0].primitives[0].material, Some(0));
    assert_eq!(model.primitive_count(), 4);
}

#[test]
fn meshes_without_loadable_primitives_are_dropped() {
    let mut source = textured_scene();
    source.meshes[2] = mesh(vec![broken_primitive(0)]);
    let mut renderer = HeadlessRenderer::new();
    let model = Model::load(&source, &mut renderer, &LoadOptions::default());

    assert_eq!(model.meshes().len(), 2);
    assert_eq!(model.primitive_count(), 3);
}

#[test]
fn refused_meshes_are_skipped() {
    let source = textured_scene();
    let mut renderer = HeadlessRenderer::with_capacity_limit(2);
    let model = Model::load(&source, &mut renderer, &LoadOptions::default());

    assert_eq!(model.primitive_count(), 2);
    assert_eq!(model.backend().live_count(), 2);
}

#[test]
fn model_without_scenes_loads_every_mesh_unmirrored() {
    let source = SourceModel {
        meshes: vec![mesh(vec![triangle(-1)]), mesh(vec![triangle(-1)])],
        ..SourceModel::default()
    };
    let mut renderer = HeadlessRenderer::new();
    let model = Model::load(&source, &mut renderer, &LoadOptions::default());

    assert_eq!(model.meshes().len(), 2);
    for mesh in model.meshes() {
        assert_eq!(mesh.transform, Matrix4::identity());
        let placed = model.backend().mesh(mesh.primitives[0].mesh_handle).unwrap();
        assert_vec_close(placed.transform.scale, Vector3::new(1.0, 1.0, 1.0));
    }
}

#[test]
fn invalid_root_and_mesh_references_do_not_stop_the_load() {
    let source = SourceModel {
        scene: 0,
        scenes: vec![Scene {
            name: None,
            nodes: vec![5, 0, -1, 1, 2],
        }],
        nodes: vec![node(1, vec![]), node(-2, vec![42]), node(0, vec![])],
        meshes: vec![mesh(vec![triangle(-1)])],
        ..SourceModel::default()
    };
    let mut renderer = HeadlessRenderer::new();
    let model = Model::load(&source, &mut renderer, &LoadOptions::default());

    assert_eq!(model.meshes().len(), 1);
}

#[test]
fn set_visible_reaches_every_primitive_once() {
    let source = textured_scene();
    let mut renderer = RecordingRenderer::new();
    {
        let mut model = Model::load(&source, &mut renderer, &LoadOptions::default());
        assert!(model.is_visible());

        model.set_visible(true);
        model.set_visible(false);
        assert!(!model.is_visible());
        model.set_visible(false);
    }
    let hidden = renderer.count(|call| matches!(call, Call::Visible(_, false)));
    assert_eq!(hidden, 4);
    assert!(renderer.inner.meshes().is_empty());
}

#[test]
fn hidden_models_start_hidden() {
    let source = textured_scene();
    let mut renderer = HeadlessRenderer::new();
    let model = Model::load(&source, &mut renderer, &LoadOptions::default().with_visible(false));

    assert!(!model.is_visible());
    assert!(model.backend().meshes().iter().all(|(_, mesh)| !mesh.visible));
}

#[test]
fn set_transform_replaces_placement_and_notifies() {
    let source = textured_scene();
    let mut renderer = HeadlessRenderer::new();
    let options = LoadOptions::default().with_root_transform(Matrix4::identity());
    let mut model = Model::load(&source, &mut renderer, &options);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let token = {
        let seen = seen.clone();
        model.on_transform_changed(move |transform| seen.borrow_mut().push(*transform))
    };

    let shift = Matrix4::from_translation(Vector3::new(0.0, 0.0, 10.0));
    model.set_transform(shift);
    assert_eq!(*model.transform(), shift);

    let child = &model.meshes()[1];
    let placed = model.backend().mesh(child.primitives[0].mesh_handle).unwrap();
    assert_vec_close(placed.transform.position, Vector3::new(1.0, 2.0, 13.0));
    assert_vec_close(placed.transform.scale, Vector3::new(2.0, 2.0, 2.0));

    assert!(model.unsubscribe_transform_changed(token));
    model.set_transform(Matrix4::identity());
    assert_eq!(*seen.borrow(), vec![shift]);
}

#[test]
fn set_mesh_transform_moves_only_that_mesh() {
    let source = textured_scene();
    let mut renderer = HeadlessRenderer::new();
    let mut model = Model::load(&source, &mut renderer, &LoadOptions::default());

    let target = Matrix4::from_translation(Vector3::new(5.0, 0.0, 0.0));
    assert!(model.set_mesh_transform(2, target));
    assert!(!model.set_mesh_transform(3, target));

    let moved = model.backend().mesh(model.meshes()[2].primitives[0].mesh_handle).unwrap();
    assert_vec_close(moved.transform.position, Vector3::new(5.0, 0.0, 0.0));
    let untouched = model.backend().mesh(model.meshes()[0].primitives[0].mesh_handle).unwrap();
    assert_vec_close(untouched.transform.position, Vector3::new(-1.0, 2.0, 3.0));
}

#[test]
fn destroy_releases_everything_once() {
    let source = textured_scene();
    let mut renderer = RecordingRenderer::new();
    {
        let mut model = Model::load(&source, &mut renderer, &LoadOptions::default());
        model.destroy();
        assert!(model.meshes().is_empty());
        assert_eq!(model.primitive_count(), 0);
        model.destroy();
    }
    assert_eq!(renderer.count(|call| matches!(call, Call::Release(_))), 4);
    assert_eq!(renderer.inner.released_count(), 4);
    assert_eq!(renderer.inner.live_count(), 0);
}

#[test]
fn dropping_the_model_releases_meshes() {
    let source = textured_scene();
    let mut renderer = HeadlessRenderer::new();
    {
        let model = Model::load(&source, &mut renderer, &LoadOptions::default());
        assert_eq!(model.backend().live_count(), 4);
    }
    assert_eq!(renderer.live_count(), 0);
    assert_eq!(renderer.released_count(), 4);
}

//! Loads a glTF file into the headless renderer and prints what came out.
//!
//! Usage: `gltf-bake <model.gltf|model.glb> [--dump-textures <dir>]`

use std::path::PathBuf;

use anyhow::{Context, bail};
use gltf_bake::{HeadlessRenderer, LoadOptions, load_model_gltf};

fn main() -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: gltf-bake <model.gltf|model.glb> [--dump-textures <dir>]");
    };
    let mut dump_dir: Option<PathBuf> = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dump-textures" => {
                let dir = args.next().context("--dump-textures needs a directory")?;
                dump_dir = Some(PathBuf::from(dir));
            }
            other => bail!("unknown argument {other}"),
        }
    }

    let mut renderer = HeadlessRenderer::new();
    let model = load_model_gltf(&path, &mut renderer, &LoadOptions::default())?;

    println!("{path}");
    for (idx, mesh) in model.meshes().iter().enumerate() {
        let origin = mesh.transform.w;
        println!(
            "mesh {idx}: {} primitives at ({:.3}, {:.3}, {:.3})",
            mesh.primitives.len(),
            origin.x,
            origin.y,
            origin.z
        );
        for primitive in &mesh.primitives {
            let triangles = model
                .backend()
                .mesh(primitive.mesh_handle)
                .map_or(0, |m| m.geometry.triangle_count());
            println!(
                "  {:?}: {triangles} triangles, material {:?}",
                primitive.mesh_handle, primitive.material
            );
        }
    }
    for (idx, material) in model.materials().iter().enumerate() {
        let slots: Vec<String> = material
            .textures
            .iter()
            .map(|binding| format!("{}={}@uv{}", binding.slot.name(), binding.texture, binding.tex_coord))
            .collect();
        println!(
            "material {idx} {:?}: alpha mode {}, textures [{}]",
            material.name.as_deref().unwrap_or("unnamed"),
            material.alpha.mode,
            slots.join(", ")
        );
    }

    let mut textures: Vec<_> = model.textures().iter().collect();
    textures.sort_by(|a, b| a.0.cmp(b.0));
    for (id, texture) in &textures {
        println!("texture {id}: {}x{} {:?}", texture.width, texture.height, texture.format);
    }

    if let Some(dir) = dump_dir {
        std::fs::create_dir_all(&dir).with_context(|| format!("can't create {}", dir.display()))?;
        for (id, texture) in &textures {
            let Some(image) = texture.to_image() else {
                log::warn!("texture {} has an inconsistent buffer, not written", id);
                continue;
            };
            let file = dir.join(format!("{id}.png"));
            image
                .save(&file)
                .with_context(|| format!("failed to write {}", file.display()))?;
        }
        println!("wrote {} textures to {}", textures.len(), dir.display());
    }

    Ok(())
}

use cgmath::{InnerSpace, Vector3, Zero};

use crate::{
    context::LoadOptions,
    data_structures::{
        model::{Geometry, ModelVertex},
        source::{Primitive, PrimitiveMode, SourceModel},
    },
    render::GeometryBuilder,
};

/**
 * Builds indexed triangle lists from decoded vertex streams.
 *
 * Only `Triangles` primitives are supported. Attribute streams whose length
 * doesn't match the positions are ignored rather than trusted. glTF asks for
 * flat shading when NORMAL is missing, which needs one vertex per corner, so
 * such primitives are de-indexed before normals are computed.
 */
#[derive(Clone, Copy, Debug)]
pub struct TriangleGeometryBuilder {
    pub generate_flat_normals: bool,
}

impl Default for TriangleGeometryBuilder {
    fn default() -> Self {
        Self {
            generate_flat_normals: true,
        }
    }
}

impl From<&LoadOptions> for TriangleGeometryBuilder {
    fn from(options: &LoadOptions) -> Self {
        Self {
            generate_flat_normals: options.generate_flat_normals,
        }
    }
}

impl GeometryBuilder for TriangleGeometryBuilder {
    fn build_geometry(&self, _model: &SourceModel, primitive: &Primitive) -> Option<Geometry> {
        if primitive.mode != PrimitiveMode::Triangles {
            log::warn!("primitive mode {:?} is not supported, only triangles", primitive.mode);
            return None;
        }
        let attributes = &primitive.attributes;
        let vertex_count = attributes.positions.len();
        if vertex_count == 0 {
            log::warn!("primitive has no positions");
            return None;
        }

        let indices: Vec<u32> = match &primitive.indices {
            Some(indices) => indices.clone(),
            None => (0..vertex_count as u32).collect(),
        };
        if indices.is_empty() || indices.len() % 3 != 0 {
            log::warn!("primitive has {} indices, not a triangle list", indices.len());
            return None;
        }
        if let Some(bad) = indices.iter().find(|&&idx| idx as usize >= vertex_count) {
            log::warn!("index {} is out of range for {} vertices", bad, vertex_count);
            return None;
        }

        let normals = matching(&attributes.normals, vertex_count, "NORMAL");
        let tex_coords_0 = matching(&attributes.tex_coords_0, vertex_count, "TEXCOORD_0");
        let tex_coords_1 = matching(&attributes.tex_coords_1, vertex_count, "TEXCOORD_1");

        let vertices: Vec<ModelVertex> = (0..vertex_count)
            .map(|i| ModelVertex {
                position: attributes.positions[i],
                normal: normals.map_or([0.0; 3], |n| n[i]),
                tex_coords_0: tex_coords_0.map_or([0.0; 2], |t| t[i]),
                tex_coords_1: tex_coords_1.map_or([0.0; 2], |t| t[i]),
            })
            .collect();

        if normals.is_none() && self.generate_flat_normals {
            return Some(flat_shaded(&vertices, &indices));
        }
        Some(Geometry { vertices, indices })
    }
}

fn matching<'a, T>(stream: &'a Option<Vec<T>>, vertex_count: usize, name: &str) -> Option<&'a [T]> {
    let stream = stream.as_deref()?;
    if stream.len() != vertex_count {
        log::warn!(
            "{} has {} entries for {} vertices, ignoring it",
            name,
            stream.len(),
            vertex_count
        );
        return None;
    }
    Some(stream)
}

fn flat_shaded(vertices: &[ModelVertex], indices: &[u32]) -> Geometry {
    let mut expanded = Vec::with_capacity(indices.len());
    for triangle in indices.chunks_exact(3) {
        let corners = [
            vertices[triangle[0] as usize],
            vertices[triangle[1] as usize],
            vertices[triangle[2] as usize],
        ];
        let p0: Vector3<f32> = corners[0].position.into();
        let p1: Vector3<f32> = corners[1].position.into();
        let p2: Vector3<f32> = corners[2].position.into();
        let face = (p1 - p0).cross(p2 - p0);
        // degenerate triangles keep a zero normal
        let normal = if face.magnitude2() > 0.0 {
            face.normalize()
        } else {
            Vector3::zero()
        };
        for mut corner in corners {
            corner.normal = normal.into();
            expanded.push(corner);
        }
    }
    let indices = (0..expanded.len() as u32).collect();
    Geometry {
        vertices: expanded,
        indices,
    }
}

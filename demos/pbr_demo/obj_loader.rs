//! Convenience `.obj` loading for the demo driver. Not part of the
//! core library's contract — OBJ files carry no tangent/bitangent
//! data, so this wraps `tobj` and derives them the same way
//! `softgpu::mesh`'s own buffer loader does, per-triangle, from
//! position and UV deltas.

use std::collections::HashMap;
use std::io::BufReader;
use std::path::Path;

use glam::{Vec2, Vec3, Vec4};
use softgpu::{Mesh, Triangle, Vertex};

fn triangle_tangent(a: &Vertex, b: &Vertex, c: &Vertex) -> Vec3 {
    let p1 = a.position.truncate();
    let p2 = b.position.truncate();
    let p3 = c.position.truncate();
    let e1 = p2 - p1;
    let e2 = p3 - p2;

    let duv1 = b.uv - a.uv;
    let duv2 = c.uv - b.uv;

    let det = duv1.x * duv2.y - duv1.y * duv2.x;
    if det.abs() < f32::EPSILON {
        return Vec3::X;
    }
    let f = 1.0 / det;
    e1 * (f * duv2.y) - e2 * (f * duv1.y)
}

fn remove_parallel_component(a: Vec3, b: Vec3) -> Vec3 {
    let coeff = a.dot(b) / b.dot(b);
    a - b * coeff
}

fn orthogonal_tangent_bitangent(shared_tangent: Vec3, normal: Vec3) -> (Vec4, Vec4) {
    let tangent = remove_parallel_component(shared_tangent, normal).normalize_or_zero();
    let bitangent = tangent.cross(normal).normalize_or_zero();
    (tangent.extend(0.0), bitangent.extend(0.0))
}

fn with_basis(mut tris: Triangle) -> Triangle {
    let shared_tangent = triangle_tangent(&tris.a, &tris.b, &tris.c);
    let (ta, _) = orthogonal_tangent_bitangent(shared_tangent, tris.a.normal.truncate());
    let (tb, _) = orthogonal_tangent_bitangent(shared_tangent, tris.b.normal.truncate());
    let (tc, _) = orthogonal_tangent_bitangent(shared_tangent, tris.c.normal.truncate());
    tris.a.tangent = ta;
    tris.b.tangent = tb;
    tris.c.tangent = tc;
    tris
}

/// A hashable stand-in for a `Vertex` keyed on its bit patterns, so
/// positionally-identical corners shared by adjacent faces collapse
/// to the same entry — the same deduplication `Epsylene-caliban`'s
/// `load_model` does for its GPU vertex buffer.
#[derive(PartialEq, Eq, Hash)]
struct VertexKey([u32; 8]);

fn key_of(position: Vec3, normal: Vec3, uv: Vec2) -> VertexKey {
    VertexKey([
        position.x.to_bits(),
        position.y.to_bits(),
        position.z.to_bits(),
        normal.x.to_bits(),
        normal.y.to_bits(),
        normal.z.to_bits(),
        uv.x.to_bits(),
        uv.y.to_bits(),
    ])
}

/// Loads a triangulated OBJ mesh into a `Mesh`, deduplicating vertices
/// by position/normal/uv and computing a per-triangle tangent basis
/// (OBJ carries none). Missing normals fall back to `+Z`; missing
/// texcoords fall back to `(0,0)`.
pub fn load_obj<P: AsRef<Path>>(path: P) -> anyhow::Result<Mesh> {
    let file = std::fs::File::open(path.as_ref())?;
    let mut reader = BufReader::new(file);

    let (models, _) = tobj::load_obj_buf(&mut reader, &tobj::GPU_LOAD_OPTIONS, |_| {
        Ok(Default::default())
    })?;

    let mut unique: HashMap<VertexKey, Vertex> = HashMap::new();
    let mut triangles = Vec::new();

    for model in &models {
        let mesh = &model.mesh;
        let has_normals = !mesh.normals.is_empty();
        let has_uvs = !mesh.texcoords.is_empty();

        let vertex_at = |i: u32| -> Vertex {
            let idx = i as usize;
            let position = Vec3::new(
                mesh.positions[3 * idx],
                mesh.positions[3 * idx + 1],
                mesh.positions[3 * idx + 2],
            );
            let normal = if has_normals {
                Vec3::new(mesh.normals[3 * idx], mesh.normals[3 * idx + 1], mesh.normals[3 * idx + 2])
            } else {
                Vec3::Z
            };
            // OBJ texture coordinates are bottom-to-top; this crate's
            // convention (matching its image-loaded textures) is
            // top-to-bottom, so the V axis is flipped on the way in.
            let uv = if has_uvs {
                Vec2::new(mesh.texcoords[2 * idx], 1.0 - mesh.texcoords[2 * idx + 1])
            } else {
                Vec2::ZERO
            };
            let key = key_of(position, normal, uv);
            unique
                .entry(key)
                .or_insert_with(|| Vertex::new(position.extend(1.0), normal.extend(0.0), uv, Vec4::ONE))
                .clone()
        };

        for tri in mesh.indices.chunks_exact(3) {
            let a = vertex_at(tri[0]);
            let b = vertex_at(tri[1]);
            let c = vertex_at(tri[2]);
            triangles.push(with_basis(Triangle { a, b, c }));
        }
    }

    Ok(Mesh::new(triangles))
}

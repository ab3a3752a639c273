//! Mesh data: the `Vertex`/`Triangle`/`Mesh` wire format and the two
//! ways to get one — a binary `.buff` file, or the built-in unit cube
//! used by tests and demos when no asset is at hand.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use glam::{Vec2, Vec3, Vec4};
use log::info;

use crate::vertex::{Mesh, Triangle, Vertex};

const BYTES_PER_VERTEX: usize = 60;
const BYTES_PER_TRIANGLE: usize = BYTES_PER_VERTEX * 3;

/// Computes the per-triangle tangent from position and UV deltas
/// across its three vertices. The UV matrix is assumed invertible; a
/// degenerate UV mapping (zero determinant) is a malformed asset, not
/// a case this function tries to paper over.
fn triangle_tangent(a: &Vertex, b: &Vertex, c: &Vertex) -> Vec3 {
    let p1 = a.position.truncate();
    let p2 = b.position.truncate();
    let p3 = c.position.truncate();
    let e1 = p2 - p1;
    let e2 = p3 - p2;

    let duv1 = b.uv - a.uv;
    let duv2 = c.uv - b.uv;

    let det = duv1.x * duv2.y - duv1.y * duv2.x;
    let f = 1.0 / det;
    e1 * (f * duv2.y) - e2 * (f * duv1.y)
}

/// Subtracts from `a` whatever component of it points along `b`,
/// leaving the part of `a` orthogonal to `b`.
fn remove_parallel_component(a: Vec3, b: Vec3) -> Vec3 {
    let coeff = a.dot(b) / b.dot(b);
    a - b * coeff
}

/// Derives a tangent/bitangent for `vertex` (one of the triangle's own
/// three corners) from the triangle's shared tangent direction,
/// orthogonalized against that vertex's own normal.
fn orthogonal_tangent_bitangent(shared_tangent: Vec3, normal: Vec3) -> (Vec4, Vec4) {
    let tangent = remove_parallel_component(shared_tangent, normal).normalize();
    let bitangent = tangent.cross(normal).normalize();
    (tangent.extend(0.0), bitangent.extend(0.0))
}

/// Fills in `tangent`/`bitangent` on all three vertices of `tris` from
/// their positions, normals and UVs.
fn compute_triangle_basis(tris: &mut Triangle) {
    let shared_tangent = triangle_tangent(&tris.a, &tris.b, &tris.c);
    let (ta, ba) = orthogonal_tangent_bitangent(shared_tangent, tris.a.normal.truncate());
    let (tb, bb) = orthogonal_tangent_bitangent(shared_tangent, tris.b.normal.truncate());
    let (tc, bc) = orthogonal_tangent_bitangent(shared_tangent, tris.c.normal.truncate());
    tris.a.tangent = ta;
    tris.a.bitangent = ba;
    tris.b.tangent = tb;
    tris.b.bitangent = bb;
    tris.c.tangent = tc;
    tris.c.bitangent = bc;
}

fn read_vertex(bytes: &[u8]) -> Vertex {
    let f = |i: usize| f32::from_le_bytes(bytes[i * 4..i * 4 + 4].try_into().unwrap());
    let position = Vec4::new(f(0), f(1), f(2), 1.0);
    let color = Vec4::new(
        bytes[12] as f32 / 255.0,
        bytes[13] as f32 / 255.0,
        bytes[14] as f32 / 255.0,
        bytes[15] as f32 / 255.0,
    );
    // past the 16-byte position+color header, the remaining 11 floats
    // are normal(3)/uv(2)/tangent(3)/bitangent(3)
    let base = 16;
    let g = |i: usize| f32::from_le_bytes(bytes[base + i * 4..base + i * 4 + 4].try_into().unwrap());
    let normal = Vec4::new(g(0), g(1), g(2), 0.0);
    let uv = Vec2::new(g(3), g(4));
    let tangent = Vec4::new(g(5), g(6), g(7), 0.0);
    let bitangent = Vec4::new(g(8), g(9), g(10), 0.0);

    Vertex { position, normal, tangent, bitangent, color, uv }
}

/// Loads a mesh from the headerless binary triangle format: repeating
/// 180-byte records, each three 60-byte vertices (12B position + 4B
/// rgba8 color + 12B normal + 8B uv + 12B tangent + 12B bitangent, all
/// little-endian). Any trailing bytes short of a full triangle are
/// ignored, matching the integer-division framing of the format this
/// was modeled on.
pub fn load_buffer<P: AsRef<Path>>(path: P) -> anyhow::Result<Mesh> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let triangle_count = bytes.len() / BYTES_PER_TRIANGLE;
    let mut triangles = Vec::with_capacity(triangle_count);
    for i in 0..triangle_count {
        let base = i * BYTES_PER_TRIANGLE;
        let a = read_vertex(&bytes[base..base + BYTES_PER_VERTEX]);
        let b = read_vertex(&bytes[base + BYTES_PER_VERTEX..base + 2 * BYTES_PER_VERTEX]);
        let c = read_vertex(&bytes[base + 2 * BYTES_PER_VERTEX..base + 3 * BYTES_PER_VERTEX]);
        triangles.push(Triangle { a, b, c });
    }
    info!("loaded mesh buffer {:?}: {} triangles", path, triangle_count);
    Ok(Mesh::new(triangles))
}

fn face_vertex(position: Vec3, normal: Vec3, uv: Vec2, color: Vec4) -> Vertex {
    Vertex::new(position.extend(1.0), normal.extend(0.0), uv, color)
}

fn push_face(mesh: &mut Vec<Triangle>, verts: [(Vec3, Vec2); 3], normal: Vec3, color: Vec4) {
    let [a, b, c] = verts;
    let mut tris = Triangle {
        a: face_vertex(a.0, normal, a.1, color),
        b: face_vertex(b.0, normal, b.1, color),
        c: face_vertex(c.0, normal, c.1, color),
    };
    compute_triangle_basis(&mut tris);
    mesh.push(tris);
}

/// Builds a unit cube centered at the origin, one distinct flat color
/// per face, with tangents/bitangents already computed — handy for
/// tests and as a no-asset-required demo subject.
pub fn cube() -> Mesh {
    let mut triangles = Vec::with_capacity(12);

    // +Z (front), red
    let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
    push_face(
        &mut triangles,
        [
            (Vec3::new(-0.5, 0.5, 0.5), Vec2::new(0.0, 0.0)),
            (Vec3::new(0.5, 0.5, 0.5), Vec2::new(1.0, 0.0)),
            (Vec3::new(-0.5, -0.5, 0.5), Vec2::new(0.0, 1.0)),
        ],
        Vec3::Z,
        red,
    );
    push_face(
        &mut triangles,
        [
            (Vec3::new(-0.5, -0.5, 0.5), Vec2::new(0.0, 1.0)),
            (Vec3::new(0.5, 0.5, 0.5), Vec2::new(1.0, 0.0)),
            (Vec3::new(0.5, -0.5, 0.5), Vec2::new(1.0, 1.0)),
        ],
        Vec3::Z,
        red,
    );

    // -Z (back), yellow
    let yellow = Vec4::new(1.0, 1.0, 0.0, 1.0);
    push_face(
        &mut triangles,
        [
            (Vec3::new(-0.5, 0.5, -0.5), Vec2::new(0.0, 0.0)),
            (Vec3::new(-0.5, -0.5, -0.5), Vec2::new(0.0, 1.0)),
            (Vec3::new(0.5, -0.5, -0.5), Vec2::new(1.0, 1.0)),
        ],
        -Vec3::Z,
        yellow,
    );
    push_face(
        &mut triangles,
        [
            (Vec3::new(0.5, -0.5, -0.5), Vec2::new(1.0, 1.0)),
            (Vec3::new(0.5, 0.5, -0.5), Vec2::new(1.0, 0.0)),
            (Vec3::new(-0.5, 0.5, -0.5), Vec2::new(0.0, 0.0)),
        ],
        -Vec3::Z,
        yellow,
    );

    // -Y (bottom), white
    let white = Vec4::ONE;
    push_face(
        &mut triangles,
        [
            (Vec3::new(-0.5, -0.5, 0.5), Vec2::new(0.0, 0.0)),
            (Vec3::new(0.5, -0.5, 0.5), Vec2::new(1.0, 0.0)),
            (Vec3::new(-0.5, -0.5, -0.5), Vec2::new(0.0, 1.0)),
        ],
        -Vec3::Y,
        white,
    );
    push_face(
        &mut triangles,
        [
            (Vec3::new(-0.5, -0.5, -0.5), Vec2::new(0.0, 1.0)),
            (Vec3::new(0.5, -0.5, 0.5), Vec2::new(1.0, 0.0)),
            (Vec3::new(0.5, -0.5, -0.5), Vec2::new(1.0, 1.0)),
        ],
        -Vec3::Y,
        white,
    );

    // -X (left), magenta
    let magenta = Vec4::new(1.0, 0.0, 1.0, 1.0);
    push_face(
        &mut triangles,
        [
            (Vec3::new(-0.5, 0.5, 0.5), Vec2::new(0.0, 0.0)),
            (Vec3::new(-0.5, -0.5, 0.5), Vec2::new(1.0, 0.0)),
            (Vec3::new(-0.5, -0.5, -0.5), Vec2::new(1.0, 1.0)),
        ],
        -Vec3::X,
        magenta,
    );
    push_face(
        &mut triangles,
        [
            (Vec3::new(-0.5, -0.5, -0.5), Vec2::new(1.0, 1.0)),
            (Vec3::new(-0.5, 0.5, -0.5), Vec2::new(0.0, 1.0)),
            (Vec3::new(-0.5, 0.5, 0.5), Vec2::new(0.0, 0.0)),
        ],
        -Vec3::X,
        magenta,
    );

    // +Y (top), cyan
    let cyan = Vec4::new(0.0, 1.0, 1.0, 1.0);
    push_face(
        &mut triangles,
        [
            (Vec3::new(0.5, 0.5, 0.5), Vec2::new(0.0, 0.0)),
            (Vec3::new(-0.5, 0.5, 0.5), Vec2::new(1.0, 0.0)),
            (Vec3::new(-0.5, 0.5, -0.5), Vec2::new(1.0, 1.0)),
        ],
        Vec3::Y,
        cyan,
    );
    push_face(
        &mut triangles,
        [
            (Vec3::new(-0.5, 0.5, -0.5), Vec2::new(1.0, 1.0)),
            (Vec3::new(0.5, 0.5, -0.5), Vec2::new(0.0, 1.0)),
            (Vec3::new(0.5, 0.5, 0.5), Vec2::new(0.0, 0.0)),
        ],
        Vec3::Y,
        cyan,
    );

    // +X (right), green
    let green = Vec4::new(0.0, 1.0, 0.0, 1.0);
    push_face(
        &mut triangles,
        [
            (Vec3::new(0.5, -0.5, 0.5), Vec2::new(0.0, 0.0)),
            (Vec3::new(0.5, 0.5, 0.5), Vec2::new(1.0, 0.0)),
            (Vec3::new(0.5, 0.5, -0.5), Vec2::new(1.0, 1.0)),
        ],
        Vec3::X,
        green,
    );
    push_face(
        &mut triangles,
        [
            (Vec3::new(0.5, 0.5, -0.5), Vec2::new(1.0, 1.0)),
            (Vec3::new(0.5, -0.5, -0.5), Vec2::new(0.0, 1.0)),
            (Vec3::new(0.5, -0.5, 0.5), Vec2::new(0.0, 0.0)),
        ],
        Vec3::X,
        green,
    );

    Mesh::new(triangles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn cube_has_twelve_triangles() {
        assert_eq!(cube().triangles.len(), 12);
    }

    #[test]
    fn cube_tangents_are_orthogonal_to_normals() {
        for tris in cube().triangles {
            for v in [tris.a, tris.b, tris.c] {
                let n = v.normal.truncate();
                let t = v.tangent.truncate();
                assert_approx_eq!(n.dot(t), 0.0, 1e-4);
            }
        }
    }

    #[test]
    fn cube_bitangent_is_cross_of_tangent_and_normal() {
        let tris = &cube().triangles[0];
        let n = tris.a.normal.truncate();
        let t = tris.a.tangent.truncate();
        let expected = t.cross(n).normalize();
        let actual = tris.a.bitangent.truncate();
        assert_approx_eq!(expected.x, actual.x, 1e-4);
        assert_approx_eq!(expected.y, actual.y, 1e-4);
        assert_approx_eq!(expected.z, actual.z, 1e-4);
    }

    #[test]
    fn load_buffer_reads_one_triangle_with_correct_fields() {
        let dir = std::env::temp_dir();
        let path = dir.join("softgpu_mesh_test.buff");
        let mut bytes = Vec::new();
        let push_vertex = |bytes: &mut Vec<u8>, pos: [f32; 3], rgba: [u8; 4], normal: [f32; 3], uv: [f32; 2]| {
            for v in pos {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
            bytes.extend_from_slice(&rgba);
            for v in normal {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
            for v in uv {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
            for _ in 0..6 {
                bytes.extend_from_slice(&0.0f32.to_le_bytes());
            }
        };
        push_vertex(&mut bytes, [1.0, 2.0, 3.0], [255, 0, 0, 255], [0.0, 0.0, 1.0], [0.0, 0.0]);
        push_vertex(&mut bytes, [4.0, 5.0, 6.0], [0, 255, 0, 255], [0.0, 0.0, 1.0], [1.0, 0.0]);
        push_vertex(&mut bytes, [7.0, 8.0, 9.0], [0, 0, 255, 255], [0.0, 0.0, 1.0], [0.0, 1.0]);
        std::fs::write(&path, &bytes).unwrap();

        let mesh = load_buffer(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(mesh.triangles.len(), 1);
        let a = mesh.triangles[0].a;
        assert_eq!(a.position, Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(a.color, Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(a.uv, Vec2::new(0.0, 0.0));
    }

    #[test]
    fn load_buffer_ignores_trailing_partial_triangle() {
        let dir = std::env::temp_dir();
        let path = dir.join("softgpu_mesh_test_partial.buff");
        std::fs::write(&path, vec![0u8; BYTES_PER_TRIANGLE + 10]).unwrap();
        let mesh = load_buffer(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(mesh.triangles.len(), 1);
    }
}

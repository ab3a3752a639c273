//! The triangle rasterizer: bounding-box scan, edge-function
//! barycentric coefficients, perspective-correct interpolation, depth
//! test, fragment dispatch.
//!
//! The original keeps this rasterizer alongside two scanline variants
//! (`horizontalRasterTriangle`/`verticalRasterTriangle`) that its own
//! `rasterizeTriangle` entry point never calls — it always takes the
//! bounding-box path and returns before reaching the scanline code.
//! Those variants are dead weight and have no counterpart here.

use glam::{Vec2, Vec4};

use crate::depth::DepthBuffer;
use crate::shader::ShaderProgram;
use crate::texture::Texture;
use crate::vertex::FsInput;
use crate::vertex::VsOutput;

fn edge_function(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}

/// Un-normalized barycentric coordinates of `p` with respect to
/// `(p1, p2, p3)`, divided by the triangle's signed `area`.
fn barycentric(p1: Vec2, p2: Vec2, p3: Vec2, p: Vec2, area: f32) -> Vec4 {
    Vec4::new(
        edge_function(p2, p3, p) / area,
        edge_function(p3, p1, p) / area,
        edge_function(p1, p2, p) / area,
        0.0,
    )
}

/// Converts screen-space barycentric weights into perspective-correct
/// ones, given each vertex's clip-space `w`.
fn correct_barycentric(bary: Vec4, w1: f32, w2: f32, w3: f32) -> Vec4 {
    let den = bary.x / w1 + bary.y / w2 + bary.z / w3;
    Vec4::new(bary.x / (w1 * den), bary.y / (w2 * den), bary.z / (w3 * den), 0.0)
}

fn lerp3(bary: Vec4, a: Vec2, b: Vec2, c: Vec2) -> Vec2 {
    bary.x * a + bary.y * b + bary.z * c
}

fn lerp3_v4(bary: Vec4, a: Vec4, b: Vec4, c: Vec4) -> Vec4 {
    bary.x * a + bary.y * b + bary.z * c
}

/// Rasterizes one already-viewport-mapped triangle: scans its screen
/// bounding box, keeps pixels whose barycentric weights are all `>= 0`
/// (the non-strict edge rule the original uses — a pixel that lands
/// exactly on a shared edge is shaded by both neighboring triangles,
/// and that's left as-is rather than switched to a top-left fill
/// rule), depth-tests, and dispatches to the fragment shader.
///
/// `o1`/`o2`/`o3` must already have had `perspective_divide` and
/// `to_viewport` applied.
pub fn rasterize_triangle(
    backbuffer: &mut Texture,
    depth_buffer: &mut DepthBuffer,
    o1: &VsOutput,
    o2: &VsOutput,
    o3: &VsOutput,
    shader: &dyn ShaderProgram,
) {
    let tw = backbuffer.width() as i32;
    let th = backbuffer.height() as i32;
    let buffer_size = Vec2::new(tw as f32, th as f32);

    let p1 = o1.position.truncate().truncate();
    let p2 = o2.position.truncate().truncate();
    let p3 = o3.position.truncate().truncate();

    let minx = (p1.x.min(p2.x).min(p3.x).floor() as i32 - 1).max(0);
    let miny = (p1.y.min(p2.y).min(p3.y).floor() as i32 - 1).max(0);
    let maxx = (p1.x.max(p2.x).max(p3.x).ceil() as i32 + 1).min(tw - 1);
    let maxy = (p1.y.max(p2.y).max(p3.y).ceil() as i32 + 1).min(th - 1);
    if maxx < 0 || minx >= tw || maxy < 0 || miny >= th {
        return;
    }

    let area = edge_function(p1, p2, p3);
    if area.abs() < f32::EPSILON {
        return;
    }

    let w1 = o1.position.w;
    let w2 = o2.position.w;
    let w3 = o3.position.w;

    for j in miny..=maxy {
        for i in minx..=maxx {
            let p = Vec2::new(i as f32 + 0.5, j as f32 + 0.5);
            let bary = barycentric(p1, p2, p3, p, area);
            if bary.x < 0.0 || bary.y < 0.0 || bary.z < 0.0 {
                continue;
            }

            let z = bary.x * o1.position.z + bary.y * o2.position.z + bary.z * o3.position.z;
            if depth_buffer.read(i as u32, j as u32) <= z {
                continue;
            }
            depth_buffer.write(i as u32, j as u32, z);

            let p_bary = correct_barycentric(bary, w1, w2, w3);
            let bary0 = barycentric(p1, p2, p3, p - Vec2::ONE, area);
            let p_bary0 = correct_barycentric(bary0, w1, w2, w3);
            let bary1 = barycentric(p1, p2, p3, p + Vec2::ONE, area);
            let p_bary1 = correct_barycentric(bary1, w1, w2, w3);

            let uv0 = lerp3(p_bary0, o1.uv, o2.uv, o3.uv);
            let uv1 = lerp3(p_bary1, o1.uv, o2.uv, o3.uv);
            let puvac = ((uv1.x - uv0.x) * (uv1.y - uv0.y)).abs() * 0.25;

            let input = FsInput {
                world_position: lerp3_v4(bary, o1.world_position, o2.world_position, o3.world_position).truncate(),
                world_normal: lerp3_v4(bary, o1.normal, o2.normal, o3.normal).truncate(),
                world_tangent: lerp3_v4(bary, o1.tangent, o2.tangent, o3.tangent).truncate(),
                screen_position: p / buffer_size * 2.0 - Vec2::ONE,
                uv: lerp3(p_bary, o1.uv, o2.uv, o3.uv),
                color: lerp3_v4(p_bary, o1.color, o2.color, o3.color),
                puvac,
            };

            if let Some(color) = shader.fragment(&input) {
                backbuffer.write(i as u32, j as u32, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::UnlitVertexColor;
    use glam::{Vec2 as V2, Vec4 as V4};

    fn flat_vso(x: f32, y: f32, z: f32, color: V4) -> VsOutput {
        VsOutput {
            position: V4::new(x, y, z, 1.0),
            world_position: V4::ZERO,
            normal: V4::Z,
            tangent: V4::X,
            color,
            uv: V2::ZERO,
        }
    }

    #[test]
    fn fills_interior_pixel_of_a_simple_triangle() {
        let mut backbuffer = Texture::create_solid(8, 8, V4::new(0.0, 0.0, 0.0, 1.0));
        let mut depth = DepthBuffer::new(8, 8);
        let o1 = flat_vso(1.0, 1.0, 0.5, V4::new(1.0, 0.0, 0.0, 1.0));
        let o2 = flat_vso(6.0, 1.0, 0.5, V4::new(1.0, 0.0, 0.0, 1.0));
        let o3 = flat_vso(1.0, 6.0, 0.5, V4::new(1.0, 0.0, 0.0, 1.0));
        rasterize_triangle(&mut backbuffer, &mut depth, &o1, &o2, &o3, &UnlitVertexColor);
        assert_eq!(backbuffer.read(2, 2), V4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn skips_pixel_outside_triangle() {
        let mut backbuffer = Texture::create_solid(8, 8, V4::new(0.0, 0.0, 0.0, 1.0));
        let mut depth = DepthBuffer::new(8, 8);
        let o1 = flat_vso(1.0, 1.0, 0.5, V4::new(1.0, 0.0, 0.0, 1.0));
        let o2 = flat_vso(3.0, 1.0, 0.5, V4::new(1.0, 0.0, 0.0, 1.0));
        let o3 = flat_vso(1.0, 3.0, 0.5, V4::new(1.0, 0.0, 0.0, 1.0));
        rasterize_triangle(&mut backbuffer, &mut depth, &o1, &o2, &o3, &UnlitVertexColor);
        assert_eq!(backbuffer.read(7, 7), V4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn nearer_triangle_wins_depth_test() {
        let mut backbuffer = Texture::create_solid(8, 8, V4::ZERO);
        let mut depth = DepthBuffer::new(8, 8);
        let far = (
            flat_vso(1.0, 1.0, 0.9, V4::new(1.0, 0.0, 0.0, 1.0)),
            flat_vso(6.0, 1.0, 0.9, V4::new(1.0, 0.0, 0.0, 1.0)),
            flat_vso(1.0, 6.0, 0.9, V4::new(1.0, 0.0, 0.0, 1.0)),
        );
        let near = (
            flat_vso(1.0, 1.0, 0.1, V4::new(0.0, 1.0, 0.0, 1.0)),
            flat_vso(6.0, 1.0, 0.1, V4::new(0.0, 1.0, 0.0, 1.0)),
            flat_vso(1.0, 6.0, 0.1, V4::new(0.0, 1.0, 0.0, 1.0)),
        );
        rasterize_triangle(&mut backbuffer, &mut depth, &far.0, &far.1, &far.2, &UnlitVertexColor);
        rasterize_triangle(&mut backbuffer, &mut depth, &near.0, &near.1, &near.2, &UnlitVertexColor);
        assert_eq!(backbuffer.read(2, 2), V4::new(0.0, 1.0, 0.0, 1.0));

        // drawing the far triangle again after the near one must not overwrite it
        rasterize_triangle(&mut backbuffer, &mut depth, &far.0, &far.1, &far.2, &UnlitVertexColor);
        assert_eq!(backbuffer.read(2, 2), V4::new(0.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn shared_edge_is_filled_by_both_triangles() {
        // Two triangles sharing the edge (1,1)-(6,6) should both claim
        // a pixel exactly on that edge, per the non-strict >= 0 rule.
        let mut backbuffer = Texture::create_solid(8, 8, V4::ZERO);
        let mut depth = DepthBuffer::new(8, 8);
        let t1 = (
            flat_vso(1.0, 1.0, 0.5, V4::new(1.0, 0.0, 0.0, 1.0)),
            flat_vso(6.0, 6.0, 0.5, V4::new(1.0, 0.0, 0.0, 1.0)),
            flat_vso(1.0, 6.0, 0.5, V4::new(1.0, 0.0, 0.0, 1.0)),
        );
        rasterize_triangle(&mut backbuffer, &mut depth, &t1.0, &t1.1, &t1.2, &UnlitVertexColor);
        assert_eq!(backbuffer.read(3, 3), V4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn degenerate_triangle_is_skipped_without_panicking() {
        let mut backbuffer = Texture::create_solid(4, 4, V4::ZERO);
        let mut depth = DepthBuffer::new(4, 4);
        let o1 = flat_vso(1.0, 1.0, 0.5, V4::ONE);
        let o2 = flat_vso(2.0, 2.0, 0.5, V4::ONE);
        let o3 = flat_vso(3.0, 3.0, 0.5, V4::ONE);
        rasterize_triangle(&mut backbuffer, &mut depth, &o1, &o2, &o3, &UnlitVertexColor);
        assert_eq!(backbuffer.read(1, 1), V4::ZERO);
    }
}

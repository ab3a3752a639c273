//! The `Pipeline`: owns the backbuffer and depth buffer for a given
//! viewport size, and drives meshes through vertex shading, clipping
//! culling, viewport mapping and rasterization.

use glam::{Vec3, Vec4};
use log::info;

use crate::depth::DepthBuffer;
use crate::error::SoftGpuError;
use crate::rasterizer::rasterize_triangle;
use crate::shader::{ShaderProgram, Uniforms};
use crate::texture::Texture;
use crate::vertex::{CullMode, Mesh, VsOutput};

/// Owns the backbuffer (color) and depth attachment for one viewport
/// size, and runs meshes through them. Unlike the original's `SrGPU`,
/// there is no bound vertex/fragment function pointer pair and no
/// mutable sampler list living on this struct — every draw call
/// receives the shader and the textures it needs explicitly.
pub struct Pipeline {
    backbuffer: Texture,
    depth_buffer: DepthBuffer,
}

impl Pipeline {
    /// Allocates a backbuffer and depth buffer sized to `width` by
    /// `height`, the backbuffer cleared to opaque black.
    pub fn new(width: u32, height: u32) -> Result<Self, SoftGpuError> {
        if width == 0 || height == 0 {
            return Err(SoftGpuError::EmptyViewport { width, height });
        }
        info!("allocating pipeline for {}x{} viewport", width, height);
        Ok(Pipeline {
            backbuffer: Texture::create_solid(width, height, Vec4::new(0.0, 0.0, 0.0, 1.0)),
            depth_buffer: DepthBuffer::new(width, height),
        })
    }

    pub fn width(&self) -> u32 {
        self.backbuffer.width()
    }

    pub fn height(&self) -> u32 {
        self.backbuffer.height()
    }

    pub fn backbuffer(&self) -> &Texture {
        &self.backbuffer
    }

    /// Clears the backbuffer to `color` and the depth buffer to its
    /// far sentinel, starting a fresh frame.
    pub fn clear(&mut self, color: Vec4) {
        self.backbuffer.clear(color);
        self.depth_buffer.clear();
    }

    /// Submits a mesh for rendering: every triangle is run through
    /// `shader`'s vertex program, perspective-divided, optionally
    /// culled by winding, mapped into viewport space and rasterized.
    pub fn submit_mesh(&mut self, mesh: &Mesh, uniforms: &Uniforms, cull: CullMode, shader: &dyn ShaderProgram) {
        let width = self.backbuffer.width() as f32;
        let height = self.backbuffer.height() as f32;

        for tris in &mesh.triangles {
            let mut o1 = shader.vertex(&tris.a, uniforms);
            let mut o2 = shader.vertex(&tris.b, uniforms);
            let mut o3 = shader.vertex(&tris.c, uniforms);

            o1.perspective_divide();
            o2.perspective_divide();
            o3.perspective_divide();

            if cull != CullMode::None && is_culled(&o1, &o2, &o3, cull) {
                continue;
            }

            o1.to_viewport(width, height);
            o2.to_viewport(width, height);
            o3.to_viewport(width, height);

            rasterize_triangle(&mut self.backbuffer, &mut self.depth_buffer, &o1, &o2, &o3, shader);
        }
    }

    /// Shades every pixel of the viewport with `shader`'s fragment
    /// program, ignoring depth entirely — a full-screen pass useful
    /// for skyboxes or post effects driven purely by screen position.
    pub fn draw_fill_quad(&mut self, shader: &dyn ShaderProgram) {
        let w = self.backbuffer.width();
        let h = self.backbuffer.height();
        for y in 0..h {
            for x in 0..w {
                let input = crate::vertex::FsInput {
                    world_position: Vec3::ZERO,
                    world_normal: Vec3::ZERO,
                    world_tangent: Vec3::ZERO,
                    screen_position: glam::Vec2::new(
                        x as f32 / w as f32 * 2.0 - 1.0,
                        y as f32 / h as f32 * 2.0 - 1.0,
                    ),
                    uv: glam::Vec2::new(x as f32 / w as f32, y as f32 / h as f32),
                    color: Vec4::ONE,
                    puvac: 0.0,
                };
                if let Some(color) = shader.fragment(&input) {
                    self.backbuffer.write(x, y, color);
                }
            }
        }
    }
}

/// A triangle is culled when the requested winding's signed area,
/// viewed down the camera's forward axis, faces away from the viewer.
fn is_culled(o1: &VsOutput, o2: &VsOutput, o3: &VsOutput, cull: CullMode) -> bool {
    let view_ray = Vec3::new(0.0, 0.0, if cull == CullMode::Clockwise { 1.0 } else { -1.0 });
    let e1 = (o3.position - o1.position).truncate();
    let e2 = (o2.position - o1.position).truncate();
    let normal = e1.cross(e2);
    view_ray.dot(normal) < 0.0
}

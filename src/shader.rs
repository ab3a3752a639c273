//! Programmable shading.
//!
//! The original source selects vertex/fragment behavior through a
//! pair of function pointers stored on the GPU object and swapped out
//! between draws. That works in C++ but has no clean equivalent once
//! the pipeline needs to be `Send`-able or shared across draws without
//! a mutable global. Instead, a draw call takes a `&dyn ShaderProgram`
//! and nothing about which shader ran last persists anywhere.

use glam::{Mat4, Vec4};

use crate::vertex::{FsInput, VsOutput, Vertex};

/// Per-draw uniform inputs every built-in demo shader needs. Shaders
/// that need more can wrap this in their own struct instead of
/// extending it — the trait only ever hands the shader a `&Uniforms`
/// it owns itself (see `ShaderProgram::vertex`'s `uniforms` parameter
/// in the implementing type, not this struct, for that pattern).
#[derive(Clone, Copy, Debug)]
pub struct Uniforms {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

impl Uniforms {
    pub fn model_view_projection(&self) -> Mat4 {
        self.projection * self.view * self.model
    }
}

/// The programmable pair a draw call needs: a vertex transform and a
/// fragment color. Implementors own whatever uniform/texture state
/// they need; the rasterizer only ever calls through this trait.
pub trait ShaderProgram {
    /// Transforms one model-space vertex into clip space plus varyings.
    fn vertex(&self, vertex: &Vertex, uniforms: &Uniforms) -> VsOutput;

    /// Shades one interpolated fragment, returning an RGBA color.
    /// Returning `None` discards the fragment (no color or depth
    /// write), mirroring alpha-tested cutouts.
    fn fragment(&self, input: &FsInput) -> Option<Vec4>;
}

/// The simplest possible shader: transforms by MVP, passes world-space
/// varyings through, and emits the vertex color unlit. Useful for
/// tests and as a fallback when no material is bound.
pub struct UnlitVertexColor;

impl ShaderProgram for UnlitVertexColor {
    fn vertex(&self, vertex: &Vertex, uniforms: &Uniforms) -> VsOutput {
        let world_position = uniforms.model * vertex.position;
        let world_normal = (uniforms.model * vertex.normal).normalize_or_zero();
        let world_tangent = (uniforms.model * vertex.tangent).normalize_or_zero();
        VsOutput {
            position: uniforms.model_view_projection() * vertex.position,
            world_position,
            normal: world_normal,
            tangent: world_tangent,
            color: vertex.color,
            uv: vertex.uv,
        }
    }

    fn fragment(&self, input: &FsInput) -> Option<Vec4> {
        Some(input.color)
    }
}

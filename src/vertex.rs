use glam::{Vec2, Vec4};

/// A single mesh vertex, in model space. Matches the field layout of
/// the original `SrVertex`: position/normal/tangent/bitangent as
/// homogeneous 4-vectors (normals and tangents carry `w = 0`), plus a
/// per-vertex color and a single UV set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec4,
    pub normal: Vec4,
    pub tangent: Vec4,
    pub bitangent: Vec4,
    pub color: Vec4,
    pub uv: Vec2,
}

impl Vertex {
    pub fn new(position: Vec4, normal: Vec4, uv: Vec2, color: Vec4) -> Self {
        Vertex {
            position,
            normal,
            tangent: Vec4::ZERO,
            bitangent: Vec4::ZERO,
            color,
            uv,
        }
    }
}

/// Three vertices, wound in whatever order the mesh was authored in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub a: Vertex,
    pub b: Vertex,
    pub c: Vertex,
}

/// An ordered list of triangles. Insertion order is the order the
/// pipeline draws them in.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Mesh { triangles }
    }

    pub fn empty() -> Self {
        Mesh { triangles: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Output of the vertex program: clip-space position plus the varyings
/// the rasterizer will interpolate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VsOutput {
    /// Clip-space position. Before `perspective_divide` this is the
    /// raw vertex-program output; after it, xyz has been divided by w
    /// while w itself is retained for perspective-correct interpolation.
    pub position: Vec4,
    pub world_position: Vec4,
    pub normal: Vec4,
    pub tangent: Vec4,
    pub color: Vec4,
    pub uv: Vec2,
}

impl VsOutput {
    /// Divides `position.xyz` by `position.w`, leaving `w` untouched.
    ///
    /// This is a dedicated step rather than an inline assignment at
    /// each call site so that a future edit cannot accidentally reset
    /// `w` to 1 and break perspective-correct interpolation.
    pub fn perspective_divide(&mut self) {
        let w = self.position.w;
        let divided = self.position.truncate() * (1.0 / w);
        self.position = divided.extend(w);
    }

    /// Maps `position.xy` from NDC `[-1,1]` to pixel space `[0,W]x[0,H]`.
    pub fn to_viewport(&mut self, width: f32, height: f32) {
        self.position.x = (self.position.x + 1.0) * 0.5 * width;
        self.position.y = (self.position.y + 1.0) * 0.5 * height;
    }
}

/// Input to the fragment program: world-space varyings plus the
/// screen position re-expressed in NDC.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FsInput {
    pub world_position: glam::Vec3,
    pub world_normal: glam::Vec3,
    pub world_tangent: glam::Vec3,
    /// Screen-space position mapped back to NDC, in `[-1,1]^2`.
    pub screen_position: Vec2,
    pub uv: Vec2,
    pub color: Vec4,
    /// Estimated UV area this fragment covers on screen. Feed this
    /// into a sampled texture's `mip_coefficient_for` to get the mip
    /// level to pass to `sample_trilinear`/`sample_cubemap_trilinear` —
    /// the rasterizer computes this once per fragment but never picks
    /// a mip level itself, since that depends on which texture's chain
    /// is being sampled.
    pub puvac: f32,
}

/// Which winding order to discard when culling back faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CullMode {
    /// Draw every triangle regardless of winding.
    None,
    /// Discard triangles wound clockwise as seen from the camera.
    Clockwise,
    /// Discard triangles wound counter-clockwise as seen from the camera.
    CounterClockwise,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perspective_divide_keeps_w() {
        let mut vso = VsOutput {
            position: Vec4::new(4.0, 8.0, 2.0, 2.0),
            world_position: Vec4::ZERO,
            normal: Vec4::ZERO,
            tangent: Vec4::ZERO,
            color: Vec4::ZERO,
            uv: Vec2::ZERO,
        };
        vso.perspective_divide();
        assert_eq!(vso.position, Vec4::new(2.0, 4.0, 1.0, 2.0));
    }

    #[test]
    fn to_viewport_maps_ndc_corners() {
        let mut vso = VsOutput {
            position: Vec4::new(-1.0, -1.0, 0.0, 1.0),
            world_position: Vec4::ZERO,
            normal: Vec4::ZERO,
            tangent: Vec4::ZERO,
            color: Vec4::ZERO,
            uv: Vec2::ZERO,
        };
        vso.to_viewport(800.0, 600.0);
        assert_eq!(vso.position.x, 0.0);
        assert_eq!(vso.position.y, 0.0);

        let mut vso2 = VsOutput { position: Vec4::new(1.0, 1.0, 0.0, 1.0), ..vso };
        vso2.to_viewport(800.0, 600.0);
        assert_eq!(vso2.position.x, 800.0);
        assert_eq!(vso2.position.y, 600.0);
    }
}

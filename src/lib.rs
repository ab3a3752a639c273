//! A CPU software rasterizer: vertex/fragment programs, perspective-correct
//! barycentric interpolation, mip-chained 2D and cubemap texture sampling,
//! and a small mesh pipeline tying it all together.

pub mod depth;
pub mod error;
pub mod mesh;
pub mod pipeline;
pub mod rasterizer;
pub mod shader;
pub mod texture;
pub mod vertex;

pub use depth::DepthBuffer;
pub use error::SoftGpuError;
pub use pipeline::Pipeline;
pub use shader::{ShaderProgram, Uniforms};
pub use texture::{CubeFace, Texture};
pub use vertex::{CullMode, FsInput, Mesh, Triangle, Vertex, VsOutput};

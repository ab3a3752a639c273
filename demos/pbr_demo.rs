//! Renders a short turntable sequence of a PBR-lit mesh against an
//! environment-mapped background, writing one PNG per frame.
//!
//! This is the crate's worked example rather than part of its public
//! API: it loads an asset set (mesh, albedo/normal/MRO textures,
//! radiance/irradiance cubemaps, a BRDF lookup table), builds a
//! camera rig, and drives `softgpu::Pipeline` through both a
//! full-screen background pass and the mesh draw for each frame.

use std::f32::consts::PI;
use std::path::Path;

use anyhow::Result;
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use log::{info, warn};

use softgpu::{CullMode, FsInput, Mesh, Pipeline, ShaderProgram, Texture, Uniforms, Vertex};

mod obj_loader;

const RESOLUTION: u32 = 1024;
const FRAME_COUNT: u32 = 48;
const ASSET_DIR: &str = "demos/assets";

/// Loads a gamma-corrected (albedo) or linear (everything else) image
/// texture, falling back to a flat mid-gray placeholder and logging a
/// warning if the asset is missing — per the soft-failure contract,
/// a missing optional asset must never abort the run.
fn load_or_placeholder(path: &str, gamma_correct: bool, fallback: Vec4) -> Texture {
    let mut tex = Texture::create_solid(4, 4, fallback);
    match tex.load_image(Path::new(ASSET_DIR).join(path), gamma_correct) {
        Ok(()) => tex,
        Err(err) => {
            warn!("could not load {}: {} — using placeholder", path, err);
            tex
        }
    }
}

fn load_cubemap(prefix: &str, base_size: u32, mip_count: u32) -> Texture {
    const FACE_NAMES: [&str; 6] = ["front", "back", "right", "left", "top", "bottom"];
    let mut tex = Texture::create_solid(1, 1, Vec4::new(0.05, 0.05, 0.08, 1.0));
    let mut any_loaded = false;
    let mut size = base_size;
    for mip in 0..mip_count {
        for (face, name) in FACE_NAMES.iter().enumerate() {
            let filename = format!("{}-{}-{}.buff", prefix, mip, name);
            match tex.load_cubemap_face(Path::new(ASSET_DIR).join(&filename), size, size, face, mip as usize) {
                Ok(()) => any_loaded = true,
                Err(err) => warn!("could not load cubemap face {}: {}", filename, err),
            }
        }
        size = (size / 2).max(1);
    }
    if !any_loaded {
        warn!("no faces loaded for cubemap {:?}, rendering with a flat placeholder", prefix);
    }
    tex
}

struct PbrMaterial {
    albedo: Texture,
    normal: Texture,
    mro: Texture,
    radiance: Texture,
    irradiance: Texture,
    brdf_lut: Texture,
}

impl PbrMaterial {
    fn load() -> Self {
        let mut albedo = load_or_placeholder("cerberus-albedo.png", true, Vec4::new(0.6, 0.6, 0.6, 1.0));
        let mut normal = load_or_placeholder("cerberus-normal.png", false, Vec4::new(0.5, 0.5, 1.0, 1.0));
        let mut mro = load_or_placeholder("cerberus-mro.png", false, Vec4::new(0.0, 0.5, 1.0, 1.0));
        albedo.generate_mipmaps();
        normal.generate_mipmaps();
        mro.generate_mipmaps();

        let mut brdf_lut = Texture::create_solid(512, 512, Vec4::new(0.5, 0.5, 0.0, 1.0));
        if let Err(err) = brdf_lut.load_raw(Path::new(ASSET_DIR).join("brdf.buff"), 512, 512, 2) {
            warn!("could not load brdf.buff: {} — using placeholder BRDF LUT", err);
        }

        let radiance = load_cubemap("emap/radiance", 512, 8);
        let irradiance = load_cubemap("emap/irradiance", 32, 1);

        PbrMaterial { albedo, normal, mro, radiance, irradiance, brdf_lut }
    }
}

/// A small perspective camera rig matching the original's fixed
/// field-of-view convention (`fovx == fovy`, both 90 degrees) and its
/// non-standard "up vector with the forward component removed"
/// orientation scheme.
struct Camera {
    eye: Vec3,
    forward: Vec3,
    up: Vec3,
    right: Vec3,
    znear: f32,
    zfar: f32,
    fovx: f32,
    fovy: f32,
}

impl Camera {
    fn at(eye: Vec3, target: Vec3) -> Self {
        let forward = (target - eye).normalize();
        let mut up = Vec3::Z;
        up = (up - forward * up.dot(forward)).normalize();
        let right = forward.cross(up).normalize();
        Camera { eye, forward, up, right, znear: 0.005, zfar: 200.0, fovx: 90f32.to_radians(), fovy: 90f32.to_radians() }
    }

    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.eye + self.forward, self.up)
    }

    fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(110f32.to_radians(), aspect, self.znear, self.zfar)
    }

    /// Reconstructs a world-space view ray for a fragment at NDC
    /// `screen_position`, the same closed-form the original derives
    /// from `fovx`/`fovy` instead of inverting the projection matrix.
    fn view_ray(&self, screen_position: Vec2) -> Vec3 {
        let x = self.znear / (self.fovx * 0.5).cos();
        let y = self.znear / (self.fovy * 0.5).cos();
        let w = (self.fovx * 0.5).sin() * x;
        let h = (self.fovy * 0.5).sin() * y;
        (-self.forward * self.znear + self.up * screen_position.y * h + self.right * screen_position.x * w).normalize()
    }
}

fn tonemap(color: Vec3) -> Vec3 {
    Vec3::new(1.0 - (-color.x).exp(), 1.0 - (-color.y).exp(), 1.0 - (-color.z).exp())
}

fn linear_to_srgb(color: Vec3) -> Vec3 {
    let gamma = 1.0 / 2.2;
    Vec3::new(color.x.powf(gamma), color.y.powf(gamma), color.z.powf(gamma))
}

fn fresnel_schlick_roughness(cos_theta: f32, f0: Vec3, roughness: f32) -> Vec3 {
    let one_minus_r = Vec3::splat(1.0 - roughness);
    f0 + (one_minus_r.max(f0) - f0) * (1.0 - cos_theta).powf(5.0)
}

struct PbrShader<'a> {
    camera: &'a Camera,
    material: &'a PbrMaterial,
    drawing_background: bool,
}

impl<'a> ShaderProgram for PbrShader<'a> {
    fn vertex(&self, vertex: &Vertex, uniforms: &Uniforms) -> softgpu::VsOutput {
        let world_position = uniforms.model * vertex.position;
        softgpu::VsOutput {
            position: uniforms.model_view_projection() * vertex.position,
            world_position,
            normal: uniforms.model * vertex.normal,
            tangent: uniforms.model * vertex.tangent,
            color: vertex.color,
            uv: vertex.uv,
        }
    }

    fn fragment(&self, input: &FsInput) -> Option<Vec4> {
        let view_ray = self.camera.view_ray(input.screen_position);

        if self.drawing_background {
            let background = self.material.radiance.sample_cubemap(view_ray, true, 0);
            return Some(linear_to_srgb(tonemap(background.truncate())).extend(1.0));
        }

        let albedo_coeff = self.material.albedo.mip_coefficient_for(input.puvac);
        let albedo = self.material.albedo.sample_trilinear(input.uv, true, true, albedo_coeff).truncate();

        let mro_coeff = self.material.mro.mip_coefficient_for(input.puvac);
        let mro = self.material.mro.sample_trilinear(input.uv, true, true, mro_coeff).truncate();
        let metallic = mro.x;
        let roughness = mro.y;
        let occlusion = mro.z;

        let normal_coeff = self.material.normal.mip_coefficient_for(input.puvac);
        let tangent_normal_raw = self.material.normal.sample_trilinear(input.uv, true, true, normal_coeff).truncate();
        let mut tangent_normal = tangent_normal_raw * 2.0 - Vec3::ONE;
        tangent_normal *= Vec3::new(1.0, -1.0, 1.0);

        let n = input.world_normal.normalize();
        let t = (input.world_tangent - n * input.world_tangent.dot(n)).normalize();
        let b = t.cross(n).normalize();
        let tbn = Mat3::from_cols(t, b, n);
        let n = (tbn * tangent_normal).normalize();
        let r = reflect(view_ray, n);

        let f0 = Vec3::splat(0.04).lerp(albedo, metallic);
        let n_dot_v = n.dot(view_ray).max(0.0);
        let ks = fresnel_schlick_roughness(n_dot_v, f0, roughness);
        let kd = (Vec3::ONE - ks) * (1.0 - metallic);

        let irradiance = self.material.irradiance.sample_cubemap(-n, true, 0).truncate();
        let diffuse = irradiance * albedo;

        let radiance_coeff = (self.material.radiance.mip_count() as f32 - 1.0) * roughness;
        let radiance = self.material.radiance.sample_cubemap_trilinear(r, true, radiance_coeff).truncate();

        let brdf_lo = self.material.brdf_lut.sample(Vec2::new(1.0 - n_dot_v, 1.0 - roughness), false, true, 0);
        let brdf_hi = self.material.brdf_lut.sample(Vec2::new(n_dot_v, roughness), false, true, 0);
        let specular = radiance * (ks * brdf_lo.x + brdf_hi.y);

        let ambient = (kd * diffuse + specular) * occlusion;
        Some(linear_to_srgb(tonemap(ambient)).extend(1.0))
    }
}

fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - normal * 2.0 * incident.dot(normal)
}

/// Picks a mesh to render: an `.obj` asset if one is present (the
/// convenience path most hand-authored demo assets arrive as), else
/// the raw `.buff` vertex buffer, else the built-in cube so the demo
/// always has something to draw.
fn load_mesh() -> Mesh {
    let obj_path = Path::new(ASSET_DIR).join("cerberus.obj");
    if obj_path.exists() {
        match obj_loader::load_obj(&obj_path) {
            Ok(mesh) if !mesh.is_empty() => return mesh,
            Ok(_) => warn!("{:?} contained no triangles, falling back", obj_path),
            Err(err) => warn!("could not load {:?}: {} — falling back", obj_path, err),
        }
    }

    let buffer_path = Path::new(ASSET_DIR).join("cerberus-mesh.buff");
    match softgpu::mesh::load_buffer(&buffer_path) {
        Ok(mesh) if !mesh.is_empty() => mesh,
        Ok(_) => {
            warn!("{:?} contained no triangles, drawing the built-in cube instead", buffer_path);
            softgpu::mesh::cube()
        }
        Err(err) => {
            warn!("could not load {:?}: {} — drawing the built-in cube instead", buffer_path, err);
            softgpu::mesh::cube()
        }
    }
}

fn main() -> Result<()> {
    std::env::set_var("RUST_LOG", "info");
    pretty_env_logger::init();

    info!("loading assets from {}", ASSET_DIR);
    let material = PbrMaterial::load();
    let mesh = load_mesh();

    let mut pipeline = Pipeline::new(RESOLUTION, RESOLUTION)?;
    let aspect = 1.0;

    for frame in 0..FRAME_COUNT {
        let t = frame as f32;
        let angle = t * 2.0 * PI / FRAME_COUNT as f32;
        let dist = 0.5 + 1.2 * angle.cos().powi(2) * ((angle.cos() + 1.0) * 0.25 + 0.5) * 1.2;
        let eye = Vec3::new(angle.cos(), angle.sin(), angle.cos() * 0.3).normalize() * dist;
        let camera = Camera::at(eye, Vec3::ZERO);

        let view = camera.view_matrix();
        let projection = camera.projection_matrix(aspect);
        let uniforms = Uniforms { model: Mat4::IDENTITY, view, projection };

        pipeline.clear(Vec4::new(0.0, 0.0, 0.0, 1.0));

        let background_shader = PbrShader { camera: &camera, material: &material, drawing_background: true };
        pipeline.draw_fill_quad(&background_shader);

        let mesh_shader = PbrShader { camera: &camera, material: &material, drawing_background: false };
        pipeline.submit_mesh(&mesh, &uniforms, CullMode::CounterClockwise, &mesh_shader);

        let out_path = format!("output-frame-{}.png", frame);
        pipeline.backbuffer().to_image(&out_path)?;
        info!("wrote {}", out_path);
    }

    Ok(())
}

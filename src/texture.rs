//! Textures: mip-chained 2D images and cubemaps, sampled with
//! nearest/bilinear/trilinear filtering, plus the mip-level selector
//! that turns a per-pixel UV-area estimate into a continuous mip index.
//!
//! The original source keeps a mutable `trilinearCoefficient` field on
//! each texture and has the rasterizer poke it before every fragment.
//! That coefficient is never stored here: every trilinear sample
//! takes it as a plain argument, computed by the caller (see
//! `rasterizer.rs`) from `mip_coefficient_for`.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use glam::{IVec2, Vec2, Vec3, Vec4};
use log::info;

use crate::error::SoftGpuError;

/// One level of a mip chain: a width x height grid of RGBA float
/// pixels, row-major, origin at the top-left.
#[derive(Clone, Debug)]
pub struct MipLevel {
    width: u32,
    height: u32,
    data: Vec<Vec4>,
}

impl MipLevel {
    fn solid(width: u32, height: u32, color: Vec4) -> Self {
        MipLevel {
            width,
            height,
            data: vec![color; (width * height) as usize],
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn read(&self, x: u32, y: u32) -> Vec4 {
        self.data[self.index(x, y)]
    }

    pub fn write(&mut self, x: u32, y: u32, value: Vec4) {
        let i = self.index(x, y);
        self.data[i] = value;
    }

    /// Builds the next-coarser level by averaging 2x2 blocks of this
    /// level (a box filter, per channel including alpha).
    fn downsample(&self) -> MipLevel {
        let new_width = self.width >> 1;
        let new_height = self.height >> 1;
        let mut data = Vec::with_capacity((new_width * new_height) as usize);
        for y in 0..new_height {
            for x in 0..new_width {
                let sum = self.read(x * 2, y * 2)
                    + self.read(x * 2 + 1, y * 2)
                    + self.read(x * 2, y * 2 + 1)
                    + self.read(x * 2 + 1, y * 2 + 1);
                data.push(sum * 0.25);
            }
        }
        MipLevel { width: new_width, height: new_height, data }
    }

    /// Nearest/bilinear sampling of this single level. `uv` has
    /// already had wrap/clamp applied by the caller.
    fn sample(&self, uv: Vec2, bilinear: bool) -> Vec4 {
        let size = Vec2::new(self.width as f32, self.height as f32);
        let max_coord = IVec2::new(self.width as i32 - 1, self.height as i32 - 1);

        if !bilinear {
            let p = (size * uv).round();
            let x = (p.x as i32).clamp(0, max_coord.x) as u32;
            let y = (p.y as i32).clamp(0, max_coord.y) as u32;
            return self.read(x, y);
        }

        let p = size * uv;
        let clamp_xy = |v: IVec2| IVec2::new(v.x.clamp(0, max_coord.x), v.y.clamp(0, max_coord.y));
        let q11 = clamp_xy(IVec2::new(p.x.floor() as i32, p.y.floor() as i32));
        let q21 = clamp_xy(q11 + IVec2::new(1, 0));
        let q12 = clamp_xy(q11 + IVec2::new(0, 1));
        let q22 = clamp_xy(q11 + IVec2::new(1, 1));

        let frac = Vec2::new(p.x - p.x.floor(), p.y - p.y.floor());
        let d11 = self.read(q11.x as u32, q11.y as u32);
        let d21 = self.read(q21.x as u32, q21.y as u32);
        let d12 = self.read(q12.x as u32, q12.y as u32);
        let d22 = self.read(q22.x as u32, q22.y as u32);

        let top = d11.lerp(d21, frac.x);
        let bottom = d12.lerp(d22, frac.x);
        top.lerp(bottom, frac.y)
    }
}

/// Cubemap face indices, in the order the original assigns them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CubeFace {
    Front = 0,
    Back = 1,
    Right = 2,
    Left = 3,
    Top = 4,
    Bottom = 5,
}

impl CubeFace {
    fn from_index(i: usize) -> Self {
        match i {
            0 => CubeFace::Front,
            1 => CubeFace::Back,
            2 => CubeFace::Right,
            3 => CubeFace::Left,
            4 => CubeFace::Top,
            5 => CubeFace::Bottom,
            _ => unreachable!("cubemap face index out of range"),
        }
    }
}

enum Storage {
    Flat(Vec<MipLevel>),
    Cube(Vec<[Option<MipLevel>; 6]>),
}

/// A mip-chained image, usable either as a flat 2D texture or as a
/// cubemap. The two storage kinds are mutually exclusive; a fresh
/// `Texture` starts out flat and only becomes a cubemap once a face is
/// loaded into it.
pub struct Texture {
    storage: Storage,
}

/// Raises each of the first `channel_count` channels of `c` to the
/// 2.2 power when `gamma_correct` is set; channels beyond that (the
/// ones the source image didn't provide, already zero-filled by the
/// caller) are left untouched.
fn apply_gamma(c: [f32; 4], channel_count: usize, gamma_correct: bool) -> Vec4 {
    if !gamma_correct {
        return Vec4::from(c);
    }
    let mut out = c;
    for v in out.iter_mut().take(channel_count) {
        *v = v.powf(2.2);
    }
    Vec4::from(out)
}

impl Texture {
    /// Allocates a level-0 `width x height` buffer filled with `color`.
    pub fn create_solid(width: u32, height: u32, color: Vec4) -> Self {
        Texture { storage: Storage::Flat(vec![MipLevel::solid(width, height, color)]) }
    }

    fn flat_mips(&self) -> &[MipLevel] {
        match &self.storage {
            Storage::Flat(mips) => mips,
            Storage::Cube(_) => panic!("texture is a cubemap, not a flat 2D texture"),
        }
    }

    fn flat_mips_mut(&mut self) -> &mut Vec<MipLevel> {
        match &mut self.storage {
            Storage::Flat(mips) => mips,
            Storage::Cube(_) => panic!("texture is a cubemap, not a flat 2D texture"),
        }
    }

    pub fn width(&self) -> u32 {
        self.flat_mips()[0].width()
    }

    pub fn height(&self) -> u32 {
        self.flat_mips()[0].height()
    }

    pub fn mip_count(&self) -> usize {
        match &self.storage {
            Storage::Flat(mips) => mips.len(),
            Storage::Cube(mips) => mips.len(),
        }
    }

    /// Raw level-0 read. Out-of-range coordinates panic; the caller
    /// is responsible for clipping.
    pub fn read(&self, x: u32, y: u32) -> Vec4 {
        self.flat_mips()[0].read(x, y)
    }

    pub fn write(&mut self, x: u32, y: u32, value: Vec4) {
        self.flat_mips_mut()[0].write(x, y, value);
    }

    /// Overwrites every level-0 pixel with `color`. Mip levels, if
    /// already generated, are left stale — the design does not
    /// auto-regenerate them.
    pub fn clear(&mut self, color: Vec4) {
        let level0 = &mut self.flat_mips_mut()[0];
        level0.data.fill(color);
    }

    /// Decodes an 8-bit image (any format the `image` crate covers)
    /// into level-0 float4 pixels. Channels beyond what the source
    /// actually provides (e.g. alpha on a 3-channel PNG) are left at
    /// zero rather than synthesized, matching `SrTexture::loadImage`'s
    /// zero-fill of `n..4`; gamma correction, when requested, is only
    /// applied to the channels the source provided. Leaves the texture
    /// untouched on failure.
    pub fn load_image<P: AsRef<Path>>(&mut self, path: P, gamma_correct: bool) -> anyhow::Result<()> {
        let path = path.as_ref();
        let decoded = image::open(path)?;
        let channel_count = source_channel_count(decoded.color());
        let img = decoded.to_rgba8();
        let (width, height) = img.dimensions();
        let mut data = Vec::with_capacity((width * height) as usize);
        for pixel in img.pixels() {
            let mut c = [0.0f32; 4];
            for (ch, v) in c.iter_mut().enumerate().take(channel_count) {
                *v = pixel[ch] as f32 / 255.0;
            }
            data.push(apply_gamma(c, channel_count, gamma_correct));
        }
        self.storage = Storage::Flat(vec![MipLevel { width, height, data }]);
        info!("loaded texture image {:?} ({}x{}, {} channels)", path, width, height, channel_count);
        Ok(())
    }

    /// Reads `channels` little-endian floats per pixel from a flat
    /// `.buff` file, row-major, filling unused channels with zero.
    pub fn load_raw<P: AsRef<Path>>(&mut self, path: P, width: u32, height: u32, channels: u32) -> anyhow::Result<()> {
        let path = path.as_ref();
        let level = read_raw_level(path, width, height, channels)?;
        self.storage = Storage::Flat(vec![level]);
        info!("loaded raw texture buffer {:?} ({}x{}, {} channels)", path, width, height, channels);
        Ok(())
    }

    /// Populates one face of one mip level of a cubemap from a
    /// 3-channel `.buff` file. Growing the mip vector as needed; faces
    /// of different mip levels may be loaded independently and out of
    /// order.
    pub fn load_cubemap_face<P: AsRef<Path>>(
        &mut self,
        path: P,
        width: u32,
        height: u32,
        face: usize,
        mip: usize,
    ) -> anyhow::Result<()> {
        if face > 5 {
            return Err(SoftGpuError::BadCubemapFace(face).into());
        }
        let path = path.as_ref();
        let level = read_raw_level(path, width, height, 3)?;

        if !matches!(self.storage, Storage::Cube(_)) {
            self.storage = Storage::Cube(Vec::new());
        }
        let mips = match &mut self.storage {
            Storage::Cube(mips) => mips,
            Storage::Flat(_) => unreachable!(),
        };
        while mips.len() <= mip {
            mips.push(Default::default());
        }
        mips[mip][face] = Some(level);
        info!(
            "loaded cubemap face {:?} mip {} from {:?} ({}x{})",
            CubeFace::from_index(face),
            mip,
            path,
            width,
            height
        );
        Ok(())
    }

    /// Generates the mip chain down to 1x1 (or as close as integer
    /// halving allows) from the current level 0, by 2x2 box filtering.
    /// No-op if more than one level already exists.
    pub fn generate_mipmaps(&mut self) {
        let mips = self.flat_mips_mut();
        if mips.len() != 1 {
            return;
        }
        loop {
            let finest = mips.last().unwrap();
            if finest.width() < 2 || finest.height() < 2 {
                break;
            }
            let next = finest.downsample();
            mips.push(next);
        }
    }

    /// Nearest/bilinear sampling of a single flat mip level, with
    /// wrap (`repeat`) or clamp addressing.
    pub fn sample(&self, uv: Vec2, repeat: bool, bilinear: bool, mip_level: usize) -> Vec4 {
        let mips = self.flat_mips();
        let level = mip_level.min(mips.len() - 1);
        mips[level].sample(addr(uv, repeat), bilinear)
    }

    /// Trilinear sampling: blends the two mip levels adjacent to
    /// `coefficient` (clamped to the valid mip range).
    pub fn sample_trilinear(&self, uv: Vec2, repeat: bool, bilinear: bool, coefficient: f32) -> Vec4 {
        let mips = self.flat_mips();
        let c = coefficient.clamp(0.0, (mips.len() - 1) as f32);
        let low = c.floor() as usize;
        let high = (low + 1).min(mips.len() - 1);
        let lo = mips[low].sample(addr(uv, repeat), bilinear);
        let hi = mips[high].sample(addr(uv, repeat), bilinear);
        lo.lerp(hi, c.fract())
    }

    /// Given the estimated UV-area a single screen pixel covers,
    /// returns the continuous mip index to sample at. This is the
    /// pure function the original mutates `trilinearCoefficient` with;
    /// here it is read-only and the caller decides what to do with
    /// the result.
    pub fn mip_coefficient_for(&self, puvac: f32) -> f32 {
        let dims: Vec<(u32, u32)> = match &self.storage {
            Storage::Flat(mips) => mips.iter().map(|m| (m.width(), m.height())).collect(),
            Storage::Cube(mips) => mips
                .iter()
                .map(|faces| {
                    faces
                        .iter()
                        .find_map(|f| f.as_ref())
                        .map(|m| (m.width(), m.height()))
                        .unwrap_or((1, 1))
                })
                .collect(),
        };
        mip_coefficient_for_dims(&dims, puvac)
    }

    fn cube_level(&self, mip: usize, face: CubeFace) -> &MipLevel {
        match &self.storage {
            Storage::Cube(mips) => {
                let clamped = mip.min(mips.len() - 1);
                mips[clamped][face as usize]
                    .as_ref()
                    .expect("sampled cubemap face was never loaded")
            }
            Storage::Flat(_) => panic!("texture is a flat 2D texture, not a cubemap"),
        }
    }

    fn cube_mip_count(&self) -> usize {
        match &self.storage {
            Storage::Cube(mips) => mips.len(),
            Storage::Flat(_) => panic!("texture is a flat 2D texture, not a cubemap"),
        }
    }

    /// Selects the cubemap face and face-local UV for direction `d`,
    /// reproducing the original's axis-dominance branches and its
    /// TOP/BOTTOM swap + UV rotation fixup verbatim, preserving the
    /// convention existing assets were authored against.
    pub fn cubemap_face_uv(d: Vec3) -> (CubeFace, Vec2) {
        let a = d.abs();
        let (mut face, mut uv) = if a.x >= a.y && a.x >= a.z {
            if d.x > 0.0 {
                (CubeFace::Left, Vec2::new(0.5 - d.y / d.x, 0.5 - d.z / d.x))
            } else {
                (CubeFace::Right, Vec2::new(0.5 - d.y / d.x, 0.5 + d.z / d.x))
            }
        } else if a.y > a.x && a.y >= a.z {
            if d.y > 0.0 {
                (CubeFace::Back, Vec2::new(0.5 + d.x / d.y, 0.5 - d.z / d.y))
            } else {
                (CubeFace::Front, Vec2::new(0.5 + d.x / d.y, 0.5 + d.z / d.y))
            }
        } else if d.z > 0.0 {
            (CubeFace::Top, Vec2::new(0.5 - d.x / d.z, 0.5 - d.y / d.z))
        } else {
            (CubeFace::Bottom, Vec2::new(0.5 + d.x / d.z, 0.5 - d.y / d.z))
        };

        uv = (uv + Vec2::splat(0.5)) * 0.5;

        face = match face {
            CubeFace::Bottom => CubeFace::Top,
            CubeFace::Top => CubeFace::Bottom,
            other => other,
        };
        if face != CubeFace::Bottom && face != CubeFace::Top {
            uv = Vec2::new(1.0 - uv.y, uv.x);
        }
        if face == CubeFace::Top {
            uv = Vec2::new(1.0 - uv.x, 1.0 - uv.y);
        }
        (face, uv)
    }

    /// Samples a single cubemap mip level along direction `d`.
    pub fn sample_cubemap(&self, d: Vec3, bilinear: bool, mip: usize) -> Vec4 {
        let (face, uv) = Self::cubemap_face_uv(d);
        let clamped = mip.min(self.cube_mip_count() - 1);
        self.cube_level(clamped, face).sample(uv, bilinear)
    }

    /// Trilinear cubemap sampling: `coefficient` is supplied by the
    /// caller and overrides any texture-local state (there is none,
    /// per the redesign).
    pub fn sample_cubemap_trilinear(&self, d: Vec3, bilinear: bool, coefficient: f32) -> Vec4 {
        let mip_count = self.cube_mip_count();
        let c = coefficient.clamp(0.0, (mip_count - 1) as f32);
        let low = c.floor() as usize;
        let high = (low + 1).min(mip_count - 1);
        let lo = self.sample_cubemap(d, bilinear, low);
        let hi = self.sample_cubemap(d, bilinear, high);
        lo.lerp(hi, c.fract())
    }

    /// Writes level 0 to an image file. `.bmp` (case-insensitive)
    /// writes 3 channels; any other extension writes 4-channel PNG.
    /// Each float channel is clamped to `[0,1]` then scaled to `[0,255]`.
    pub fn to_image<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let level = &self.flat_mips()[0];
        let is_bmp = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("bmp"))
            .unwrap_or(false);

        if is_bmp {
            let mut buf = image::ImageBuffer::<image::Rgb<u8>, Vec<u8>>::new(level.width(), level.height());
            for y in 0..level.height() {
                for x in 0..level.width() {
                    let c = level.read(x, y).clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
                    buf.put_pixel(x, y, image::Rgb([c.x as u8, c.y as u8, c.z as u8]));
                }
            }
            buf.save(path)?;
        } else {
            let mut buf = image::ImageBuffer::<image::Rgba<u8>, Vec<u8>>::new(level.width(), level.height());
            for y in 0..level.height() {
                for x in 0..level.width() {
                    let c = level.read(x, y).clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
                    buf.put_pixel(x, y, image::Rgba([c.x as u8, c.y as u8, c.z as u8, c.w as u8]));
                }
            }
            buf.save(path)?;
        }
        info!("wrote texture image {:?}", path);
        Ok(())
    }
}

/// Number of color channels the source image actually stored, so
/// `load_image` can zero-fill the rest instead of letting
/// `to_rgba8()` synthesize an opaque alpha.
fn source_channel_count(color: image::ColorType) -> usize {
    use image::ColorType;
    match color {
        ColorType::L8 | ColorType::L16 => 1,
        ColorType::La8 | ColorType::La16 => 2,
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => 3,
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => 4,
        _ => 4,
    }
}

/// Applies wrap (`repeat`) or clamp addressing to a UV coordinate.
fn addr(uv: Vec2, repeat: bool) -> Vec2 {
    if repeat {
        Vec2::new(uv.x.rem_euclid(1.0), uv.y.rem_euclid(1.0))
    } else {
        uv.clamp(Vec2::ZERO, Vec2::ONE)
    }
}

fn mip_coefficient_for_dims(dims: &[(u32, u32)], puvac: f32) -> f32 {
    if dims.len() <= 1 {
        return 0.0;
    }
    let mut prev_puvac = 0.0f32;
    for (level, &(w, h)) in dims.iter().enumerate() {
        let level_puvac = 1.0 / (w as f32 * h as f32);
        if puvac <= level_puvac {
            if level == 0 {
                return 0.0;
            }
            return (level - 1) as f32 + (puvac - prev_puvac) / (level_puvac - prev_puvac);
        }
        prev_puvac = level_puvac;
    }
    (dims.len() - 1) as f32
}

fn read_raw_level(path: &Path, width: u32, height: u32, channels: u32) -> anyhow::Result<MipLevel> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let pixel_count = (width * height) as usize;
    let expected = pixel_count * channels as usize * 4;
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    if bytes.len() < expected {
        return Err(SoftGpuError::ShortRawBuffer {
            path: path.display().to_string(),
            expected,
            found: bytes.len(),
        }
        .into());
    }

    let mut data = Vec::with_capacity(pixel_count);
    for px in 0..pixel_count {
        let mut c = [0.0f32; 4];
        for ch in 0..channels.min(4) as usize {
            let offset = (px * channels as usize + ch) * 4;
            c[ch] = f32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap());
        }
        data.push(Vec4::from(c));
    }
    Ok(MipLevel { width, height, data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn mip_dimensions_halve_and_stop_below_two() {
        let mut tex = Texture::create_solid(8, 4, Vec4::ONE);
        tex.generate_mipmaps();
        let mips = tex.flat_mips();
        assert_eq!((mips[0].width(), mips[0].height()), (8, 4));
        assert_eq!((mips[1].width(), mips[1].height()), (4, 2));
        assert_eq!((mips[2].width(), mips[2].height()), (2, 1));
        assert_eq!(mips.len(), 3);
    }

    #[test]
    fn box_filter_averages_2x2_blocks() {
        let mut tex = Texture::create_solid(2, 2, Vec4::ZERO);
        tex.write(0, 0, Vec4::new(1.0, 0.0, 0.0, 1.0));
        tex.write(1, 0, Vec4::new(0.0, 1.0, 0.0, 1.0));
        tex.write(0, 1, Vec4::new(0.0, 0.0, 1.0, 1.0));
        tex.write(1, 1, Vec4::new(1.0, 1.0, 1.0, 1.0));
        tex.generate_mipmaps();
        let top = tex.flat_mips()[1].read(0, 0);
        assert_approx_eq!(top.x, 0.5);
        assert_approx_eq!(top.y, 0.5);
        assert_approx_eq!(top.z, 0.5);
        assert_approx_eq!(top.w, 1.0);
    }

    #[test]
    fn bilinear_at_integer_uv_returns_exact_texel() {
        let mut tex = Texture::create_solid(4, 4, Vec4::ZERO);
        for y in 0..4u32 {
            for x in 0..4u32 {
                tex.write(x, y, Vec4::new(x as f32, y as f32, 0.0, 1.0));
            }
        }
        for y in 0..4u32 {
            for x in 0..4u32 {
                let uv = Vec2::new((x as f32 + 0.5) / 4.0, (y as f32 + 0.5) / 4.0);
                let sampled = tex.sample(uv, false, true, 0);
                assert_approx_eq!(sampled.x, x as f32);
                assert_approx_eq!(sampled.y, y as f32);
            }
        }
    }

    #[test]
    fn constant_texture_samples_exactly() {
        let tex = Texture::create_solid(16, 16, Vec4::new(0.25, 0.5, 0.75, 1.0));
        for &bilinear in &[false, true] {
            let sampled = tex.sample(Vec2::new(0.37, 0.81), true, bilinear, 0);
            assert_eq!(sampled, Vec4::new(0.25, 0.5, 0.75, 1.0));
        }
    }

    #[test]
    fn mip_selector_is_monotonic() {
        let mut tex = Texture::create_solid(256, 256, Vec4::ONE);
        tex.generate_mipmaps();
        let mut prev = tex.mip_coefficient_for(0.0);
        for i in 1..64 {
            let puvac = i as f32 / 64.0;
            let next = tex.mip_coefficient_for(puvac);
            assert!(next >= prev, "selector must be monotonic: {} then {}", prev, next);
            prev = next;
        }
    }

    #[test]
    fn mip_selector_clamps_to_finest_and_coarsest() {
        let mut tex = Texture::create_solid(4, 4, Vec4::ONE);
        tex.generate_mipmaps();
        assert_eq!(tex.mip_coefficient_for(0.0), 0.0);
        let coarsest = (tex.mip_count() - 1) as f32;
        assert_eq!(tex.mip_coefficient_for(1.0), coarsest);
    }

    #[test]
    fn single_mip_level_selector_is_always_zero() {
        let tex = Texture::create_solid(4, 4, Vec4::ONE);
        assert_eq!(tex.mip_coefficient_for(10.0), 0.0);
    }

    #[test]
    fn cubemap_canonical_axes_hit_expected_faces() {
        let colors = [
            Vec4::new(1.0, 0.0, 0.0, 1.0), // front
            Vec4::new(0.0, 1.0, 0.0, 1.0), // back
            Vec4::new(0.0, 0.0, 1.0, 1.0), // right
            Vec4::new(1.0, 1.0, 0.0, 1.0), // left
            Vec4::new(0.0, 1.0, 1.0, 1.0), // top
            Vec4::new(1.0, 0.0, 1.0, 1.0), // bottom
        ];
        let mut tex = Texture { storage: Storage::Cube(vec![Default::default()]) };
        for (face, color) in colors.iter().enumerate() {
            if let Storage::Cube(mips) = &mut tex.storage {
                mips[0][face] = Some(MipLevel::solid(2, 2, *color));
            }
        }

        let (face, _) = Texture::cubemap_face_uv(Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(tex.sample_cubemap(Vec3::new(0.0, -1.0, 0.0), false, 0), colors[face as usize]);
        let (face, _) = Texture::cubemap_face_uv(Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(tex.sample_cubemap(Vec3::new(0.0, 1.0, 0.0), false, 0), colors[face as usize]);
        let (face, _) = Texture::cubemap_face_uv(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(tex.sample_cubemap(Vec3::new(1.0, 0.0, 0.0), false, 0), colors[face as usize]);
        let (face, _) = Texture::cubemap_face_uv(Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(tex.sample_cubemap(Vec3::new(-1.0, 0.0, 0.0), false, 0), colors[face as usize]);
        let (face, _) = Texture::cubemap_face_uv(Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(tex.sample_cubemap(Vec3::new(0.0, 0.0, 1.0), false, 0), colors[face as usize]);
        let (face, _) = Texture::cubemap_face_uv(Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(tex.sample_cubemap(Vec3::new(0.0, 0.0, -1.0), false, 0), colors[face as usize]);
    }

    #[test]
    fn load_image_zero_fills_channels_the_source_does_not_provide() {
        let dir = std::env::temp_dir();
        let path = dir.join("softgpu_texture_test_rgb.png");
        let mut buf = image::ImageBuffer::<image::Rgb<u8>, Vec<u8>>::new(2, 2);
        buf.put_pixel(0, 0, image::Rgb([128, 64, 32]));
        buf.save(&path).unwrap();

        let mut tex = Texture::create_solid(1, 1, Vec4::ONE);
        tex.load_image(&path, false).unwrap();
        std::fs::remove_file(&path).ok();

        let sampled = tex.read(0, 0);
        assert_approx_eq!(sampled.x, 128.0 / 255.0);
        assert_approx_eq!(sampled.y, 64.0 / 255.0);
        assert_approx_eq!(sampled.z, 32.0 / 255.0);
        assert_eq!(sampled.w, 0.0, "alpha must be zero-filled, not synthesized as opaque");
    }

    #[test]
    fn load_image_gamma_correct_applies_only_to_provided_channels() {
        let dir = std::env::temp_dir();
        let path = dir.join("softgpu_texture_test_rgb_gamma.png");
        let mut buf = image::ImageBuffer::<image::Rgb<u8>, Vec<u8>>::new(1, 1);
        buf.put_pixel(0, 0, image::Rgb([128, 128, 128]));
        buf.save(&path).unwrap();

        let mut tex = Texture::create_solid(1, 1, Vec4::ONE);
        tex.load_image(&path, true).unwrap();
        std::fs::remove_file(&path).ok();

        let sampled = tex.read(0, 0);
        let expected = (128.0f32 / 255.0).powf(2.2);
        assert_approx_eq!(sampled.x, expected);
        assert_approx_eq!(sampled.y, expected);
        assert_approx_eq!(sampled.z, expected);
        assert_eq!(sampled.w, 0.0, "missing alpha is zero regardless of gamma_correct");
    }

    #[test]
    fn trilinear_blends_adjacent_levels() {
        let mut tex = Texture::create_solid(4, 4, Vec4::ONE);
        tex.generate_mipmaps();
        // overwrite level 1 with a distinct constant so blending is observable
        if let Storage::Flat(mips) = &mut tex.storage {
            mips[1] = MipLevel::solid(2, 2, Vec4::ZERO);
        }
        let blended = tex.sample_trilinear(Vec2::splat(0.5), false, false, 0.5);
        assert_approx_eq!(blended.x, 0.5);
    }
}

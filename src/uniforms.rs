//! Named shader uniforms and their byte layout.
//!
//! Each uniform pairs a name with an accessor evaluated against the current
//! [`FrameContext`] at every draw. A [`UniformBlock`] lays its uniforms out
//! with WGSL uniform-buffer rules so the packed bytes can be written straight
//! into a `var<uniform>` struct:
//!
//! - scalars align to 4, `vec3`/`vec4`/`mat4x4` align to 16
//! - array elements sit on a 16-byte stride (one `vec4` slot per element)
//! - the struct size rounds up to 16

use glam::{Mat4, Vec3, Vec4};

use crate::ocean::WAVE_COUNT;
use crate::world::FrameContext;

/// Shape of a uniform as declared in the shader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Int,
    Float,
    Vec3,
    Vec4,
    Mat4,
    /// `array<vec4<f32>, N>`, one float in `.x` of each element
    FloatArray(usize),
    /// `array<vec4<f32>, N>`, one vector in `.xyz` of each element
    Vec3Array(usize),
}

impl UniformKind {
    fn align(self) -> usize {
        match self {
            Self::Int | Self::Float => 4,
            _ => 16,
        }
    }

    fn size(self) -> usize {
        match self {
            Self::Int | Self::Float => 4,
            Self::Vec3 => 12,
            Self::Vec4 => 16,
            Self::Mat4 => 64,
            Self::FloatArray(n) | Self::Vec3Array(n) => 16 * n,
        }
    }
}

/// Value produced by a uniform accessor
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    FloatArray(Vec<f32>),
    Vec3Array(Vec<Vec3>),
}

/// A named uniform and the accessor that reads it from the frame
#[derive(Clone, Copy)]
pub struct ShaderUniform {
    pub name: &'static str,
    pub kind: UniformKind,
    pub fetch: fn(&FrameContext<'_>) -> UniformValue,
}

impl ShaderUniform {
    pub fn new(
        name: &'static str,
        kind: UniformKind,
        fetch: fn(&FrameContext<'_>) -> UniformValue,
    ) -> Self {
        Self { name, kind, fetch }
    }
}

impl std::fmt::Debug for ShaderUniform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderUniform")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// An ordered set of uniforms backing one uniform buffer
#[derive(Debug, Clone)]
pub struct UniformBlock {
    label: &'static str,
    uniforms: Vec<ShaderUniform>,
    offsets: Vec<usize>,
    size: usize,
}

impl UniformBlock {
    pub fn new(label: &'static str, uniforms: Vec<ShaderUniform>) -> Self {
        let mut offsets = Vec::with_capacity(uniforms.len());
        let mut cursor = 0;
        for uniform in &uniforms {
            cursor = align_up(cursor, uniform.kind.align());
            offsets.push(cursor);
            cursor += uniform.kind.size();
        }

        Self {
            label,
            uniforms,
            offsets,
            size: align_up(cursor, 16),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Buffer size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Byte offset of the uniform called `name`
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.uniforms
            .iter()
            .position(|u| u.name == name)
            .map(|i| self.offsets[i])
    }

    pub fn uniforms(&self) -> &[ShaderUniform] {
        &self.uniforms
    }

    /// Evaluate every accessor against `frame` and lay the results out
    pub fn pack(&self, frame: &FrameContext<'_>) -> Vec<u8> {
        let mut bytes = vec![0u8; self.size];
        for (uniform, &offset) in self.uniforms.iter().zip(&self.offsets) {
            let value = (uniform.fetch)(frame);
            write_value(&mut bytes[offset..offset + uniform.kind.size()], &value);
        }
        bytes
    }
}

fn align_up(offset: usize, align: usize) -> usize {
    offset.div_ceil(align) * align
}

/// Copy as much of `src` as fits; a short value leaves the rest of the slot zeroed
fn write_bytes(slot: &mut [u8], src: &[u8]) {
    let len = src.len().min(slot.len());
    slot[..len].copy_from_slice(&src[..len]);
}

fn write_floats(slot: &mut [u8], values: &[f32]) {
    write_bytes(slot, bytemuck::cast_slice(values));
}

/// Write `value` into its slot; arrays longer than the slot are cut off
fn write_value(slot: &mut [u8], value: &UniformValue) {
    match value {
        UniformValue::Int(v) => write_bytes(slot, bytemuck::bytes_of(v)),
        UniformValue::Float(v) => write_bytes(slot, bytemuck::bytes_of(v)),
        UniformValue::Vec3(v) => write_floats(slot, &v.to_array()),
        UniformValue::Vec4(v) => write_floats(slot, &v.to_array()),
        UniformValue::Mat4(m) => write_floats(slot, &m.to_cols_array()),
        UniformValue::FloatArray(values) => {
            for (element, v) in slot.chunks_exact_mut(16).zip(values) {
                write_floats(element, &[*v]);
            }
        }
        UniformValue::Vec3Array(values) => {
            for (element, v) in slot.chunks_exact_mut(16).zip(values) {
                write_floats(element, &v.to_array());
            }
        }
    }
}

/// Camera, lighting and clock uniforms shared by every pass
pub fn scene_uniforms() -> UniformBlock {
    use UniformKind as K;
    UniformBlock::new(
        "Scene Uniforms",
        vec![
            ShaderUniform::new("model", K::Mat4, |f| UniformValue::Mat4(f.model)),
            ShaderUniform::new("view", K::Mat4, |f| UniformValue::Mat4(f.view)),
            ShaderUniform::new("projection", K::Mat4, |f| UniformValue::Mat4(f.projection)),
            ShaderUniform::new("inverse_projection_view", K::Mat4, |f| {
                UniformValue::Mat4(f.inv_proj_view)
            }),
            ShaderUniform::new("light_position", K::Vec4, |f| {
                UniformValue::Vec4(f.light_position)
            }),
            ShaderUniform::new("camera_position", K::Vec3, |f| {
                UniformValue::Vec3(f.camera_position)
            }),
            ShaderUniform::new("center_position", K::Vec3, |f| {
                UniformValue::Vec3(f.center_position)
            }),
            ShaderUniform::new("prev_move", K::Vec3, |f| UniformValue::Vec3(f.prev_move)),
            ShaderUniform::new("boat_pos_normal", K::Vec3, |f| {
                UniformValue::Vec3(f.boat_normal)
            }),
            ShaderUniform::new("time", K::Float, |f| UniformValue::Float(f.time_s)),
            ShaderUniform::new("time_of_day", K::Float, |f| UniformValue::Float(f.time_of_day)),
            ShaderUniform::new("is_raining", K::Int, |f| {
                UniformValue::Int(i32::from(f.is_raining))
            }),
        ],
    )
}

/// Wave parameters for Gerstner displacement in the ocean shader
pub fn wave_uniforms() -> UniformBlock {
    use UniformKind as K;
    UniformBlock::new(
        "Wave Uniforms",
        vec![
            ShaderUniform::new("amp", K::FloatArray(WAVE_COUNT), |f| {
                UniformValue::FloatArray(f.waves.amplitudes().to_vec())
            }),
            ShaderUniform::new("freq", K::FloatArray(WAVE_COUNT), |f| {
                UniformValue::FloatArray(f.waves.frequencies().to_vec())
            }),
            ShaderUniform::new("phi", K::FloatArray(WAVE_COUNT), |f| {
                UniformValue::FloatArray(f.waves.phases().to_vec())
            }),
            ShaderUniform::new("dir", K::Vec3Array(WAVE_COUNT), |f| {
                UniformValue::Vec3Array(f.waves.directions().to_vec())
            }),
            ShaderUniform::new("steepness", K::Float, |f| {
                UniformValue::Float(f.waves.steepness())
            }),
            ShaderUniform::new("num_waves", K::Int, |_| UniformValue::Int(WAVE_COUNT as i32)),
        ],
    )
}

/// Placement of the boat mesh
pub fn boat_uniforms() -> UniformBlock {
    UniformBlock::new(
        "Boat Uniforms",
        vec![ShaderUniform::new("boat_model", UniformKind::Mat4, |f| {
            UniformValue::Mat4(f.boat_model)
        })],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{OceanPhysics, RainParams, TerrainParams};
    use crate::world::{World, WorldConfig};

    fn small_world() -> World {
        World::new(WorldConfig {
            terrain: TerrainParams {
                rows: 12,
                cols: 12,
                ..TerrainParams::default()
            },
            ocean: OceanPhysics {
                seed: Some(9),
                ..OceanPhysics::default()
            },
            rain: RainParams {
                seed: Some(9),
                ..RainParams::default()
            },
            ..WorldConfig::default()
        })
    }

    fn read_f32(bytes: &[u8], offset: usize) -> f32 {
        bytemuck::pod_read_unaligned(&bytes[offset..offset + 4])
    }

    fn read_i32(bytes: &[u8], offset: usize) -> i32 {
        bytemuck::pod_read_unaligned(&bytes[offset..offset + 4])
    }

    #[test]
    fn test_scene_layout() {
        let block = scene_uniforms();
        assert_eq!(block.offset_of("model"), Some(0));
        assert_eq!(block.offset_of("inverse_projection_view"), Some(192));
        assert_eq!(block.offset_of("light_position"), Some(256));
        assert_eq!(block.offset_of("camera_position"), Some(272));
        assert_eq!(block.offset_of("boat_pos_normal"), Some(320));
        // Scalars pack into the tail of the last vec3
        assert_eq!(block.offset_of("time"), Some(332));
        assert_eq!(block.offset_of("time_of_day"), Some(336));
        assert_eq!(block.offset_of("is_raining"), Some(340));
        assert_eq!(block.size(), 352);
        assert_eq!(block.offset_of("missing"), None);
    }

    #[test]
    fn test_wave_layout() {
        let block = wave_uniforms();
        assert_eq!(block.offset_of("amp"), Some(0));
        assert_eq!(block.offset_of("freq"), Some(160));
        assert_eq!(block.offset_of("dir"), Some(480));
        assert_eq!(block.offset_of("steepness"), Some(640));
        assert_eq!(block.offset_of("num_waves"), Some(644));
        assert_eq!(block.size(), 656);
    }

    #[test]
    fn test_pack_scene_values() {
        let mut world = small_world();
        world.tick(0.25);
        let frame = world.frame();
        let block = scene_uniforms();
        let bytes = block.pack(&frame);
        assert_eq!(bytes.len(), 352);

        let eye = frame.camera_position;
        assert_eq!(read_f32(&bytes, 272), eye.x);
        assert_eq!(read_f32(&bytes, 280), eye.z);
        assert_eq!(read_f32(&bytes, 332), 0.25);
        assert_eq!(read_i32(&bytes, 340), 0);
        // model is identity: first column starts with 1.0
        assert_eq!(read_f32(&bytes, 0), 1.0);
        assert_eq!(read_f32(&bytes, 4), 0.0);
    }

    #[test]
    fn test_pack_wave_arrays_on_vec4_stride() {
        let world = small_world();
        let frame = world.frame();
        let bytes = wave_uniforms().pack(&frame);

        let waves = world.waves();
        for i in 0..WAVE_COUNT {
            assert_eq!(read_f32(&bytes, 16 * i), waves.amplitudes()[i]);
            assert_eq!(read_f32(&bytes, 160 + 16 * i), waves.frequencies()[i]);
            assert_eq!(read_f32(&bytes, 480 + 16 * i + 4), waves.directions()[i].y);
            // Padding lanes stay zero
            assert_eq!(read_f32(&bytes, 16 * i + 4), 0.0);
        }
        assert_eq!(read_f32(&bytes, 640), waves.steepness());
        assert_eq!(read_i32(&bytes, 644), WAVE_COUNT as i32);
    }

    #[test]
    fn test_boat_block() {
        let world = small_world();
        let frame = world.frame();
        let block = boat_uniforms();
        assert_eq!(block.size(), 64);
        let bytes = block.pack(&frame);
        let translation = frame.boat_model.w_axis;
        assert_eq!(read_f32(&bytes, 48), translation.x);
        assert_eq!(read_f32(&bytes, 60), 1.0);
    }

    #[test]
    fn test_mismatched_kind_is_clamped() {
        let world = small_world();
        let frame = world.frame();
        let block = UniformBlock::new(
            "Mismatched",
            vec![
                ShaderUniform::new("wide", UniformKind::Vec3, |_| UniformValue::Float(2.5)),
                ShaderUniform::new("narrow", UniformKind::Float, |_| {
                    UniformValue::Mat4(Mat4::from_scale(Vec3::splat(3.0)))
                }),
                ShaderUniform::new("flag", UniformKind::Int, |_| UniformValue::Int(7)),
            ],
        );
        assert_eq!(block.offset_of("narrow"), Some(12));
        assert_eq!(block.offset_of("flag"), Some(16));

        let bytes = block.pack(&frame);
        assert_eq!(bytes.len(), 32);
        assert_eq!(read_f32(&bytes, 0), 2.5);
        assert_eq!(read_f32(&bytes, 4), 0.0);
        assert_eq!(read_f32(&bytes, 8), 0.0);
        // Only the first matrix element fits the scalar slot
        assert_eq!(read_f32(&bytes, 12), 3.0);
        assert_eq!(read_i32(&bytes, 16), 7);
    }
}

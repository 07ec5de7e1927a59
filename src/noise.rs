//! Noise generation for the terrain height field.
//!
//! The base layer is gradient noise on a unit lattice whose gradients come
//! from a stateless hash of the lattice coordinate, so the field needs no
//! permutation table and is identical on every run. [`HeightField`] stacks
//! three octaves of it and shapes the sum into world heights.

use std::f32::consts::TAU;

use glam::Vec2;
use noise::NoiseFn;

use crate::params::TerrainParams;

/// Salt vector dotted with the lattice coordinate before hashing
const HASH_SALT: Vec2 = Vec2::new(12.9898, 78.233);

/// Multiplier that spreads `sin` output across many integer periods
const HASH_SCALE: f32 = 43758.5453;

/// Quintic fade curve `6t^5 - 15t^4 + 10t^3` (zero first and second derivative at 0 and 1)
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Pseudo-random value in [0, 1) for a lattice coordinate
fn lattice_hash(ix: i32, iz: i32) -> f32 {
    let s = Vec2::new(ix as f32, iz as f32).dot(HASH_SALT).sin() * HASH_SCALE;
    s - s.floor()
}

/// Unit gradient at a lattice point
fn lattice_gradient(ix: i32, iz: i32) -> Vec2 {
    Vec2::from_angle(lattice_hash(ix, iz) * TAU)
}

fn dot_grid_gradient(ix: i32, iz: i32, x: f32, z: f32) -> f32 {
    let offset = Vec2::new(x - ix as f32, z - iz as f32);
    lattice_gradient(ix, iz).dot(offset)
}

/// Hashed-gradient ("Perlin") noise on a unit lattice
///
/// Returns values in roughly [-0.71, 0.71]; exactly zero on lattice points.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatticeNoise;

impl LatticeNoise {
    /// Sample the noise at `(x, z)`
    pub fn sample(&self, x: f32, z: f32) -> f32 {
        let x0 = x.floor() as i32;
        let z0 = z.floor() as i32;
        let x1 = x0 + 1;
        let z1 = z0 + 1;

        let wt_x = fade(x - x0 as f32);
        let wt_z = fade(z - z0 as f32);

        let near = lerp(
            dot_grid_gradient(x0, z0, x, z),
            dot_grid_gradient(x1, z0, x, z),
            wt_x,
        );
        let far = lerp(
            dot_grid_gradient(x0, z1, x, z),
            dot_grid_gradient(x1, z1, x, z),
            wt_x,
        );
        lerp(near, far, wt_z)
    }
}

impl NoiseFn<f64, 2> for LatticeNoise {
    fn get(&self, point: [f64; 2]) -> f64 {
        self.sample(point[0] as f32, point[1] as f32) as f64
    }
}

/// Fractal terrain height field over the ground plane
///
/// Generic over the base noise so other `noise` sources can be swapped in;
/// the default is [`LatticeNoise`].
#[derive(Debug, Clone)]
pub struct HeightField<N = LatticeNoise> {
    source: N,
    octaves: usize,
    base_amplitude: f32,
    block_size: f32,
    scale_divisor: f32,
    max_height: f32,
    vertical_offset: f32,
}

impl HeightField<LatticeNoise> {
    /// Create a height field over the hashed lattice noise
    pub fn new(params: &TerrainParams) -> Self {
        Self::with_source(LatticeNoise, params)
    }
}

impl<N: NoiseFn<f64, 2>> HeightField<N> {
    /// Create a height field over an arbitrary 2D noise source
    pub fn with_source(source: N, params: &TerrainParams) -> Self {
        Self {
            source,
            octaves: params.octaves,
            base_amplitude: params.base_amplitude,
            block_size: params.block_size,
            scale_divisor: params.scale_divisor,
            max_height: params.max_height,
            vertical_offset: params.vertical_offset,
        }
    }

    /// Octave sum in lattice space: frequency doubles and amplitude halves each pass
    pub fn fractal(&self, x: f32, z: f32) -> f32 {
        let mut sum = 0.0;
        let mut amp = self.base_amplitude;
        let mut freq = 1.0;
        for _ in 0..self.octaves {
            let sample = self.source.get([(x * freq) as f64, (z * freq) as f64]) as f32;
            sum += sample * amp;
            freq *= 2.0;
            amp /= 2.0;
        }
        sum
    }

    /// Terrain height at world position `(x, z)`
    pub fn height(&self, x: f32, z: f32) -> f32 {
        let lattice_x = x / self.block_size / self.scale_divisor;
        let lattice_z = z / self.block_size / self.scale_divisor;
        self.fractal(lattice_x, lattice_z) * self.max_height * self.block_size + self.vertical_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noise::Perlin;

    #[test]
    fn test_height_is_deterministic() {
        let field = HeightField::new(&TerrainParams::default());
        for &(x, z) in &[(0.3, -7.1), (123.4, 56.7), (-999.5, 12.25)] {
            let a = field.height(x, z);
            let b = field.height(x, z);
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_lattice_points_are_zero() {
        let noise = LatticeNoise;
        for ix in -3..3 {
            for iz in -3..3 {
                assert_eq!(noise.sample(ix as f32, iz as f32), 0.0);
            }
        }
    }

    #[test]
    fn test_off_lattice_value_from_hash() {
        // (0,0): sin(0) = 0, so the hash is 0 and the gradient points along +x
        assert_eq!(lattice_hash(0, 0), 0.0);
        assert_eq!(lattice_gradient(0, 0), Vec2::X);

        // (0,1): sin(78.233) * 43758.5453 = 13216.1123, fractional part 0.1123047
        let hash = 0.112_304_7_f32;
        assert!((lattice_hash(0, 1) - hash).abs() < 3e-3);
        let angle = hash * TAU;
        let g01 = Vec2::new(angle.cos(), angle.sin());

        // At (0, 0.5) the x weight is fade(0) = 0, so only the x0 column counts
        let near = Vec2::X.dot(Vec2::new(0.0, 0.5));
        let far = g01.dot(Vec2::new(0.0, -0.5));
        let wt_z = 0.5 * 0.5 * 0.5 * (0.5 * (0.5 * 6.0 - 15.0) + 10.0);
        let expected = near + (far - near) * wt_z;
        assert!((expected - -0.162_128_6).abs() < 1e-5);

        let sampled = LatticeNoise.sample(0.0, 0.5);
        assert!((sampled - expected).abs() < 5e-3, "{sampled} vs {expected}");
    }

    #[test]
    fn test_continuous_across_lattice_boundary() {
        let noise = LatticeNoise;
        let eps = 1e-4;
        for &(x, z) in &[(3.0, 0.4), (-2.0, 5.7), (10.0, 10.5)] {
            let left = noise.sample(x - eps, z);
            let right = noise.sample(x + eps, z);
            assert!((left - right).abs() < 1e-3, "jump at x={x}: {left} vs {right}");

            let below = noise.sample(z, x - eps);
            let above = noise.sample(z, x + eps);
            assert!((below - above).abs() < 1e-3, "jump at z={x}: {below} vs {above}");
        }
    }

    #[test]
    fn test_world_origin_sits_at_offset() {
        // Origin is a lattice point for every octave, so the fractal sum vanishes
        let params = TerrainParams::default();
        let field = HeightField::new(&params);
        assert_eq!(field.height(0.0, 0.0), params.vertical_offset);
    }

    #[test]
    fn test_height_bounded_by_shaping() {
        let params = TerrainParams::default();
        let field = HeightField::new(&params);
        for i in 0..200 {
            let x = i as f32 * 3.7 - 300.0;
            let z = i as f32 * -1.3 + 40.0;
            let h = field.height(x, z);
            assert!(h.is_finite());
            assert!((h - params.vertical_offset).abs() <= params.max_height);
        }
    }

    #[test]
    fn test_fade_endpoints() {
        assert_eq!(fade(0.0), 0.0);
        assert_eq!(fade(1.0), 1.0);
        assert!((fade(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_alternate_noise_source() {
        let params = TerrainParams::default();
        let field = HeightField::with_source(Perlin::new(7), &params);
        let h = field.height(17.5, -4.25);
        assert!(h.is_finite());
        assert!((h - params.vertical_offset).abs() <= params.max_height);
    }
}

//! Wave parameter set and its height/normal evaluator.

use std::f32::consts::{PI, TAU};

use glam::{Mat3, Vec2, Vec3};
use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::params::{OceanPhysics, SeaState};

/// Number of summed waves
pub const WAVE_COUNT: usize = 10;

/// Parallel arrays of per-wave parameters plus the envelope they were drawn from
#[derive(Debug, Clone)]
pub struct WaveSet {
    amplitude: [f32; WAVE_COUNT],
    frequency: [f32; WAVE_COUNT],
    phase: [f32; WAVE_COUNT],
    direction: [Vec3; WAVE_COUNT],
    state: SeaState,
    gravity: f32,
    median_direction: Vec3,
    calibration_offset: f32,
    rng: ChaCha8Rng,
}

impl WaveSet {
    /// Create a wave set and draw its first sample
    pub fn new(physics: &OceanPhysics) -> Self {
        let rng = match physics.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let mut waves = Self {
            amplitude: [0.0; WAVE_COUNT],
            frequency: [0.0; WAVE_COUNT],
            phase: [0.0; WAVE_COUNT],
            direction: [Vec3::ZERO; WAVE_COUNT],
            state: physics.initial_state,
            gravity: physics.gravity,
            median_direction: physics.median_direction,
            calibration_offset: physics.calibration_offset,
            rng,
        };
        waves.resample();
        waves
    }

    /// Replace every wave with a fresh draw from the current envelope
    pub fn resample(&mut self) {
        let state = self.state;

        // Deep-water dispersion: ω = sqrt(g k), k = 2π / λ
        let wavelengths = Uniform::new(state.median_wavelength / 2.0, state.median_wavelength * 2.0);
        for freq in &mut self.frequency {
            let wavelength = wavelengths.sample(&mut self.rng);
            *freq = (self.gravity * TAU / wavelength).sqrt();
        }

        let amplitudes = Uniform::new(state.median_amplitude / 2.0, state.median_amplitude * 2.0);
        for amp in &mut self.amplitude {
            *amp = amplitudes.sample(&mut self.rng);
        }

        let angles = Uniform::new(-state.angle_range / 2.0, state.angle_range / 2.0);
        for dir in &mut self.direction {
            *dir = Mat3::from_rotation_y(angles.sample(&mut self.rng)) * self.median_direction;
        }

        let phases = Uniform::new(-PI, PI);
        for phase in &mut self.phase {
            *phase = phases.sample(&mut self.rng);
        }
    }

    /// Switch between the storm and calm envelopes and resample
    pub fn toggle_storm(&mut self, enabled: bool) {
        self.state = if enabled {
            SeaState::STORM
        } else {
            SeaState::CALM
        };
        log::info!(
            "Sea state: {} (median wavelength {}, steepness {})",
            if enabled { "storm" } else { "calm" },
            self.state.median_wavelength,
            self.state.steepness
        );
        self.resample();
    }

    /// Surface height at `(x, z)` after `time_s` seconds
    ///
    /// Each wave's phase multiplies time rather than offsetting it, so waves
    /// with larger phase also run faster.
    pub fn height_at(&self, x: f32, z: f32, time_s: f32) -> f32 {
        let pos = Vec2::new(x, z);
        let mut height = 0.0;
        for i in 0..WAVE_COUNT {
            let dir_xz = Vec2::new(self.direction[i].x, self.direction[i].z);
            let theta = (self.frequency[i] * dir_xz).dot(pos) + self.phase[i] * time_s;
            height += self.amplitude[i] * theta.sin();
        }
        height + self.calibration_offset
    }

    /// Gerstner surface normal at `(x, z)` after `time_s` seconds
    pub fn normal_at(&self, x: f32, z: f32, time_s: f32) -> Vec3 {
        let pos = Vec3::new(x, self.height_at(x, z, time_s), z);
        // q * W with q = steepness / (W * N) reduces to steepness / N
        let crest = self.state.steepness / WAVE_COUNT as f32;

        let mut normal = Vec3::Y;
        for i in 0..WAVE_COUNT {
            let dir = self.direction[i];
            let wa = self.frequency[i] * self.amplitude[i];
            let theta = (self.frequency[i] * dir).dot(pos) + self.phase[i] * time_s;
            let (s, c) = theta.sin_cos();
            normal += Vec3::new(-(dir.x * wa * c), -(crest * s), -(dir.z * wa * c));
        }
        normal.normalize()
    }

    /// Envelope the current waves were drawn from
    pub fn sea_state(&self) -> SeaState {
        self.state
    }

    pub fn steepness(&self) -> f32 {
        self.state.steepness
    }

    pub fn amplitudes(&self) -> &[f32; WAVE_COUNT] {
        &self.amplitude
    }

    pub fn frequencies(&self) -> &[f32; WAVE_COUNT] {
        &self.frequency
    }

    pub fn phases(&self) -> &[f32; WAVE_COUNT] {
        &self.phase
    }

    pub fn directions(&self) -> &[Vec3; WAVE_COUNT] {
        &self.direction
    }
}

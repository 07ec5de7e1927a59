//! Ocean wave sampling envelope and physical constants.

use std::f32::consts::PI;

use glam::Vec3;

/// Sampling envelope for the wave set (one per weather preset)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeaState {
    /// Median wavelength (world units). Wavelengths are drawn from
    /// `[median / 2, median * 2]`.
    pub median_wavelength: f32,

    /// Median amplitude (world units). Amplitudes are drawn from
    /// `[median / 2, median * 2]`.
    pub median_amplitude: f32,

    /// Crest sharpness in [0, 1]
    pub steepness: f32,

    /// Full angular spread of wave directions around the median (radians)
    pub angle_range: f32,
}

impl SeaState {
    /// Fair weather: short, low, sharp waves from a narrow fan of directions
    pub const CALM: Self = Self {
        median_wavelength: 30.0,
        median_amplitude: 0.10,
        steepness: 0.3,
        angle_range: PI / 3.0,
    };

    /// Storm: long, tall swell from a wide fan of directions
    pub const STORM: Self = Self {
        median_wavelength: 150.0,
        median_amplitude: 0.5,
        steepness: 0.2,
        angle_range: PI / 2.0,
    };
}

impl Default for SeaState {
    fn default() -> Self {
        Self::CALM
    }
}

/// Ocean simulation physics parameters
#[derive(Debug, Clone)]
pub struct OceanPhysics {
    /// Gravitational acceleration used by the deep-water dispersion relation (m/s²)
    pub gravity: f32,

    /// Median travel direction. Sampled directions are this vector rotated
    /// about +Y; it is not normalized.
    pub median_direction: Vec3,

    /// Constant added to the summed wave height so the mean surface sits on
    /// the terrain's zero-height reference (world units)
    pub calibration_offset: f32,

    /// Envelope in effect at startup
    pub initial_state: SeaState,

    /// Seed for the wave sampler. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for OceanPhysics {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            median_direction: Vec3::new(0.5, 0.1, 0.5),
            calibration_offset: 0.1875,
            initial_state: SeaState::CALM,
            seed: None,
        }
    }
}

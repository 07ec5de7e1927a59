//! Rain particles and the rain/storm toggle.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::ocean::WaveSet;
use crate::params::RainParams;

/// Per-instance vertex data for one rain streak
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct RainInstance {
    pub offset: [f32; 3],
}

/// Falling drops laid out over the terrain grid, relative to the focus point
#[derive(Debug, Clone)]
pub struct RainField {
    drops: Vec<Vec3>,
    params: RainParams,
}

impl RainField {
    /// Scatter drops over a `rows x cols` grid, each column kept with the spawn probability
    pub fn new(rows: usize, cols: usize, params: RainParams) -> Self {
        let mut rng = match params.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let probability = params.spawn_probability.clamp(0.0, 1.0);

        let mut drops = Vec::new();
        for i in 0..rows {
            for j in 0..cols {
                if !rng.gen_bool(probability) {
                    continue;
                }
                let height = rng.gen_range(params.reset_threshold..params.reset_height);
                drops.push(Vec3::new(
                    i as f32 - rows as f32 / 2.0,
                    height,
                    j as f32 - cols as f32 / 2.0,
                ));
            }
        }

        Self { drops, params }
    }

    /// Let every drop fall for `dt_s` seconds, lifting those below the floor
    pub fn advance(&mut self, dt_s: f32) {
        let lift = self.params.reset_height - self.params.reset_threshold;
        for drop in &mut self.drops {
            if drop.y < self.params.reset_threshold {
                drop.y += lift;
            } else {
                drop.y -= self.params.fall_speed * dt_s;
            }
        }
    }

    pub fn drops(&self) -> &[Vec3] {
        &self.drops
    }

    pub fn drop_length(&self) -> f32 {
        self.params.drop_length
    }

    /// Line segment drawn for each drop, rising from the drop position
    pub fn streak(&self) -> [[f32; 3]; 2] {
        [[0.0, 0.0, 0.0], [0.0, self.params.drop_length, 0.0]]
    }

    /// GPU instance data for every drop
    pub fn instances(&self) -> Vec<RainInstance> {
        self.drops
            .iter()
            .map(|d| RainInstance {
                offset: d.to_array(),
            })
            .collect()
    }
}

/// Weather state: the rain flag and its particles
#[derive(Debug, Clone)]
pub struct Weather {
    raining: bool,
    rain: RainField,
}

impl Weather {
    pub fn new(rain: RainField, raining: bool) -> Self {
        Self { raining, rain }
    }

    /// Flip rain on/off and switch the sea to match
    pub fn toggle_rain(&mut self, waves: &mut WaveSet) {
        self.raining = !self.raining;
        log::info!("Rain: {}", if self.raining { "on" } else { "off" });
        waves.toggle_storm(self.raining);
    }

    /// Drops keep falling while hidden so rain resumes mid-fall
    pub fn advance(&mut self, dt_s: f32) {
        self.rain.advance(dt_s);
    }

    pub fn is_raining(&self) -> bool {
        self.raining
    }

    pub fn rain(&self) -> &RainField {
        &self.rain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::OceanPhysics;

    fn seeded_params() -> RainParams {
        RainParams {
            seed: Some(11),
            ..RainParams::default()
        }
    }

    #[test]
    fn test_spawn_probability_bounds() {
        let all = RainField::new(10, 10, RainParams {
            spawn_probability: 1.0,
            ..seeded_params()
        });
        assert_eq!(all.drops().len(), 100);

        let none = RainField::new(10, 10, RainParams {
            spawn_probability: 0.0,
            ..seeded_params()
        });
        assert!(none.drops().is_empty());

        let half = RainField::new(40, 40, seeded_params());
        let n = half.drops().len();
        assert!(n > 600 && n < 1000, "{n} drops for p=0.5 over 1600 columns");
    }

    #[test]
    fn test_drops_start_in_band() {
        let field = RainField::new(20, 20, seeded_params());
        for d in field.drops() {
            assert!(d.y >= 0.0 && d.y < 100.0);
            assert!(d.x >= -10.0 && d.x < 10.0);
            assert!(d.z >= -10.0 && d.z < 10.0);
        }
    }

    #[test]
    fn test_streak_rises_from_drop() {
        let field = RainField::new(1, 1, seeded_params());
        let [base, tip] = field.streak();
        assert_eq!(base, [0.0, 0.0, 0.0]);
        assert_eq!(tip, [0.0, field.drop_length(), 0.0]);
        assert!(tip[1] > 0.0);
    }

    #[test]
    fn test_drops_fall_then_wrap() {
        let mut field = RainField::new(1, 1, RainParams {
            spawn_probability: 1.0,
            ..seeded_params()
        });
        field.drops[0].y = 1.0;

        field.advance(0.01);
        assert!((field.drops()[0].y - 0.5).abs() < 1e-5);

        field.advance(0.02);
        assert!((field.drops()[0].y + 0.5).abs() < 1e-5);

        // Below the floor: lifted by the reset height instead of falling
        field.advance(0.02);
        assert!((field.drops()[0].y - 99.5).abs() < 1e-4);
    }

    #[test]
    fn test_toggle_rain_switches_sea_state() {
        let mut waves = WaveSet::new(&OceanPhysics {
            seed: Some(3),
            ..OceanPhysics::default()
        });
        let mut weather = Weather::new(RainField::new(2, 2, seeded_params()), false);

        weather.toggle_rain(&mut waves);
        assert!(weather.is_raining());
        assert_eq!(waves.sea_state().median_wavelength, 150.0);

        weather.toggle_rain(&mut waves);
        assert!(!weather.is_raining());
        assert_eq!(waves.sea_state().median_wavelength, 30.0);
    }
}

//! Day/night cycle and rain parameters.

/// Day/night clock. Time of day is measured in minutes.
#[derive(Debug, Clone)]
pub struct DayCycle {
    /// Time of day at startup (minutes after midnight)
    pub start_minutes: f32,

    /// Length of one day (minutes)
    pub day_length_minutes: f32,

    /// In-game minutes that pass per real second
    pub minutes_per_second: f32,

    /// Minutes skipped by the time-skip key
    pub skip_minutes: f32,

    /// Radius of the sun's orbit around the focus point (world units)
    pub sun_radius: f32,
}

impl Default for DayCycle {
    fn default() -> Self {
        Self {
            start_minutes: 9.0 * 60.0,
            day_length_minutes: 1440.0,
            minutes_per_second: 1.0,
            skip_minutes: 60.0,
            sun_radius: 100.0,
        }
    }
}

/// Rain particle field parameters
#[derive(Debug, Clone)]
pub struct RainParams {
    /// Fall speed (world units per second)
    pub fall_speed: f32,

    /// Length of one drawn streak (world units)
    pub drop_length: f32,

    /// Height a drop is lifted by when it falls below the floor (world units)
    pub reset_height: f32,

    /// Height below which a drop wraps back up (world units)
    pub reset_threshold: f32,

    /// Probability that a grid column carries a drop, in [0, 1]
    pub spawn_probability: f64,

    /// Seed for drop placement. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for RainParams {
    fn default() -> Self {
        Self {
            fall_speed: 50.0,
            drop_length: 0.5,
            reset_height: 100.0,
            reset_threshold: 0.0,
            spawn_probability: 0.5,
            seed: None,
        }
    }
}

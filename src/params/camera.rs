//! Camera motion and player physics parameters.

use glam::Vec3;

/// Camera/controller tuning. Distances are world units, rates are per tick.
#[derive(Debug, Clone)]
pub struct CameraParams {
    /// Initial eye position
    pub initial_eye: Vec3,

    /// Distance between eye and focus point
    pub camera_distance: f32,

    /// Strafe and free-fly speed (units per tick)
    pub pan_speed: f32,

    /// Forward/back speed (units per tick)
    pub zoom_speed: f32,

    /// Mouse-look rotation per cursor event (radians)
    pub rotation_speed: f32,

    /// Vertical velocity lost per tick while gravity is on
    pub gravity_per_tick: f32,

    /// Upward velocity set by a jump
    pub jump_impulse: f32,

    /// Jumps are accepted only while |vertical velocity| is below this
    pub jump_epsilon: f32,

    /// Planar step length while gravity is on (units per tick)
    pub grounded_step: f32,

    /// Start in first-person mode instead of orbit
    pub start_in_fps: bool,

    /// Start with gravity enabled
    pub start_with_gravity: bool,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            initial_eye: Vec3::new(0.0, 10.0, 10.0),
            camera_distance: 10.0,
            pan_speed: 0.1,
            zoom_speed: 0.1,
            rotation_speed: 0.02,
            gravity_per_tick: 0.008,
            jump_impulse: 0.2,
            jump_epsilon: 1e-7,
            grounded_step: 0.2,
            start_in_fps: false,
            start_with_gravity: true,
        }
    }
}

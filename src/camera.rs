//! Player camera: position, orientation basis and derived matrices.
//!
//! Two modes share one orientation. In FPS mode the eye is the player and
//! collides with terrain. In orbit mode a focus point (the boat) drifts over
//! the water and the eye trails it at a fixed distance.

mod controller;
mod input;

use glam::{Mat3, Mat4, Vec2, Vec3};

use crate::params::{CameraParams, RenderConfig};

pub use controller::CollisionField;
pub use input::{Command, HeldKeys, InputState, Key, KeyAction, Modifiers};

/// Camera mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// First-person: the eye moves and collides
    Fps,
    /// Focus point moves over the water, eye follows
    Orbit,
}

impl CameraMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Fps => Self::Orbit,
            Self::Orbit => Self::Fps,
        }
    }
}

/// Camera state and its matrices
#[derive(Debug, Clone)]
pub struct Camera {
    params: CameraParams,
    mode: CameraMode,
    eye: Vec3,
    center: Vec3,
    look: Vec3,
    up: Vec3,
    tangent: Vec3,
    /// Columns: tangent, up, look
    orientation: Mat3,
    y_velocity: f32,
    gravity_enabled: bool,
    /// Last non-zero planar move of the focus point (orbit mode)
    previous_move: Vec3,
    view: Mat4,
    projection: Mat4,
    inv_proj_view: Mat4,
}

impl Camera {
    /// Create a camera looking along +Z
    pub fn new(params: CameraParams) -> Self {
        let look = Vec3::Z;
        let up = Vec3::Y;
        let tangent = look.cross(up);
        let eye = params.initial_eye;
        let center = eye - params.camera_distance * look;
        let view = Mat4::look_at_rh(eye, center, up);

        Self {
            mode: if params.start_in_fps {
                CameraMode::Fps
            } else {
                CameraMode::Orbit
            },
            gravity_enabled: params.start_with_gravity,
            params,
            eye,
            center,
            look,
            up,
            tangent,
            orientation: Mat3::from_cols(tangent, up, look),
            y_velocity: 0.0,
            previous_move: Vec3::ZERO,
            view,
            projection: Mat4::IDENTITY,
            inv_proj_view: view.inverse(),
        }
    }

    /// Recompute eye/center for the current mode, then view and projection
    pub fn update_matrices(&mut self, config: &RenderConfig) {
        match self.mode {
            CameraMode::Fps => {
                self.center = self.eye + self.params.camera_distance * self.look;
                self.view = Mat4::look_at_rh(self.eye, self.center, self.up);
            }
            CameraMode::Orbit => {
                let stabilized = Vec3::new(self.center.x, 0.0, self.center.z);
                self.eye = stabilized - self.params.camera_distance * self.look;
                self.view = Mat4::look_at_rh(self.eye, stabilized, self.up);
            }
        }

        self.projection = Mat4::perspective_rh(
            config.fov_degrees.to_radians(),
            config.aspect_ratio(),
            config.near_plane,
            config.far_plane,
        );
        self.inv_proj_view = (self.projection * self.view).inverse();
    }

    /// Rotate the view by one mouse-look step in the direction of `delta`
    ///
    /// `delta` is in screen space with +y up. The rotation axis is built
    /// from a basis whose up column is pinned to world +Y, which keeps the
    /// horizon level.
    pub fn rotate_by_cursor(&mut self, delta: Vec2) {
        if delta.length() < 1e-15 {
            return;
        }
        let direction = delta.normalize();

        let mut stabilized = self.orientation;
        stabilized.y_axis = Vec3::Y;
        let axis = (stabilized * Vec3::new(direction.y, -direction.x, 0.0)).normalize_or_zero();
        if axis == Vec3::ZERO {
            return;
        }

        self.orientation = Mat3::from_axis_angle(axis, self.params.rotation_speed) * self.orientation;
        self.orthonormalize();
    }

    /// Gram-Schmidt on the orientation columns, keeping the look axis
    fn orthonormalize(&mut self) {
        let look = self.orientation.z_axis.normalize();
        let tangent = (self.orientation.x_axis - look * self.orientation.x_axis.dot(look)).normalize();
        let up = tangent.cross(look);

        self.orientation = Mat3::from_cols(tangent, up, look);
        self.tangent = tangent;
        self.up = up;
        self.look = look;
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        log::info!("Camera mode: {:?}", self.mode);
    }

    pub fn toggle_gravity(&mut self) {
        self.gravity_enabled = !self.gravity_enabled;
        log::info!(
            "Gravity is: {}",
            if self.gravity_enabled { "on" } else { "off" }
        );
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn gravity_enabled(&self) -> bool {
        self.gravity_enabled
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn look(&self) -> Vec3 {
        self.look
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn tangent(&self) -> Vec3 {
        self.tangent
    }

    pub fn y_velocity(&self) -> f32 {
        self.y_velocity
    }

    pub fn previous_move(&self) -> Vec3 {
        self.previous_move
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Inverse of `projection * view`, used to cast sky rays
    pub fn inv_proj_view(&self) -> Mat4 {
        self.inv_proj_view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_orthonormal(camera: &Camera) {
        let (t, u, l) = (camera.tangent(), camera.up(), camera.look());
        for v in [t, u, l] {
            assert!((v.length() - 1.0).abs() < 1e-5);
        }
        assert!(t.dot(u).abs() < 1e-5);
        assert!(t.dot(l).abs() < 1e-5);
        assert!(u.dot(l).abs() < 1e-5);
        assert!(t.cross(l).abs_diff_eq(u, 1e-5));
    }

    #[test]
    fn test_initial_basis() {
        let camera = Camera::new(CameraParams::default());
        assert_eq!(camera.look(), Vec3::Z);
        assert_eq!(camera.up(), Vec3::Y);
        assert_eq!(camera.tangent(), Vec3::NEG_X);
        assert_eq!(camera.center(), Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(camera.mode(), CameraMode::Orbit);
        assert!(camera.gravity_enabled());
    }

    #[test]
    fn test_fps_center_tracks_look() {
        let mut camera = Camera::new(CameraParams {
            start_in_fps: true,
            ..CameraParams::default()
        });
        camera.update_matrices(&RenderConfig::default());
        assert_eq!(camera.center(), camera.eye() + 10.0 * Vec3::Z);
    }

    #[test]
    fn test_orbit_eye_trails_stabilized_center() {
        let mut camera = Camera::new(CameraParams::default());
        camera.update_matrices(&RenderConfig::default());
        let center = camera.center();
        let expected = Vec3::new(center.x, 0.0, center.z) - 10.0 * camera.look();
        assert!(camera.eye().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn test_inverse_projection_view() {
        let mut camera = Camera::new(CameraParams::default());
        camera.update_matrices(&RenderConfig::default());
        let point = Vec3::new(3.0, -1.0, 25.0);
        let clip = camera.projection() * camera.view() * point.extend(1.0);
        let back = camera.inv_proj_view() * clip;
        assert!((back.truncate() / back.w).abs_diff_eq(point, 1e-2));
    }

    #[test]
    fn test_horizontal_drag_yaws_about_world_up() {
        let mut camera = Camera::new(CameraParams::default());
        camera.rotate_by_cursor(Vec2::new(5.0, 0.0));
        // Pure yaw keeps the look vector level and up untouched
        assert!(camera.look().y.abs() < 1e-6);
        assert!(camera.up().abs_diff_eq(Vec3::Y, 1e-6));
        assert!(camera.look().x.abs() > 0.0);
    }

    #[test]
    fn test_vertical_drag_pitches() {
        let mut camera = Camera::new(CameraParams::default());
        camera.rotate_by_cursor(Vec2::new(0.0, -3.0));
        assert!(camera.look().y.abs() > 1e-3);
        assert!(camera.tangent().abs_diff_eq(Vec3::NEG_X, 1e-6));
    }

    #[test]
    fn test_basis_stays_orthonormal_over_long_sessions() {
        let mut camera = Camera::new(CameraParams::default());
        for i in 0..20_000 {
            let angle = i as f32 * 0.37;
            camera.rotate_by_cursor(Vec2::new(angle.cos(), angle.sin() * 0.7));
        }
        assert_orthonormal(&camera);
    }

    #[test]
    fn test_zero_delta_is_ignored() {
        let mut camera = Camera::new(CameraParams::default());
        camera.rotate_by_cursor(Vec2::ZERO);
        assert_eq!(camera.look(), Vec3::Z);
    }
}

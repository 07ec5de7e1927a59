//! Per-tick movement: gravity, jumping, collision and buoyancy.

use glam::Vec3;

use super::{Camera, CameraMode, HeldKeys};

/// What the controller needs to know about the world around the player
pub trait CollisionField {
    /// Whether the player collider may occupy `position`
    fn is_legal(&self, position: Vec3) -> bool;

    /// Water surface height at `(x, z)` right now
    fn wave_height(&self, x: f32, z: f32) -> f32;
}

impl Camera {
    /// Advance the player one tick using the keys held since the last frame
    pub fn update_position(&mut self, keys: &HeldKeys, field: &impl CollisionField) {
        match self.mode {
            CameraMode::Fps => self.update_fps(keys, field),
            CameraMode::Orbit => self.update_orbit(keys, field),
        }
    }

    /// Start a jump if standing still vertically
    ///
    /// Only applies in FPS mode with gravity on. Returns `true` if the
    /// impulse was applied.
    pub fn jump(&mut self) -> bool {
        if self.mode != CameraMode::Fps || !self.gravity_enabled {
            return false;
        }
        if self.y_velocity.abs() >= self.params.jump_epsilon {
            return false;
        }
        self.y_velocity = self.params.jump_impulse;
        true
    }

    fn update_fps(&mut self, keys: &HeldKeys, field: &impl CollisionField) {
        if self.gravity_enabled {
            self.y_velocity -= self.params.gravity_per_tick;
            let new_pos = self.eye + Vec3::new(0.0, self.y_velocity, 0.0);
            if field.is_legal(new_pos) {
                self.eye = new_pos;
            } else {
                // Ground contact
                self.y_velocity = 0.0;
            }
        }

        // Each direction is checked on its own so a blocked move still lets
        // the others slide along the obstacle
        let forward = self.move_vec(self.params.zoom_speed * self.look);
        let strafe = self.move_vec(self.params.pan_speed * self.tangent);
        let lift = self.params.pan_speed * self.up;
        let free_fly = !self.gravity_enabled;

        let steps = [
            (keys.forward, forward),
            (keys.back, -forward),
            (keys.left, -strafe),
            (keys.right, strafe),
            (keys.up && free_fly, lift),
            (keys.down && free_fly, -lift),
        ];
        for (held, step) in steps {
            if held && field.is_legal(self.eye + step) {
                self.eye += step;
            }
        }
    }

    fn update_orbit(&mut self, keys: &HeldKeys, field: &impl CollisionField) {
        let mut move_vec = Vec3::ZERO;
        if self.gravity_enabled {
            self.y_velocity -= self.params.gravity_per_tick;
            let fall = Vec3::new(0.0, self.y_velocity, 0.0);
            if field.is_legal(self.center + fall) {
                move_vec = fall;
            } else {
                self.y_velocity = 0.0;
            }
        }

        let forward = self.move_vec(self.params.zoom_speed * self.look);
        let strafe = self.move_vec(self.params.pan_speed * self.tangent);
        if keys.forward {
            move_vec += forward;
        }
        if keys.back {
            move_vec -= forward;
        }
        if keys.left {
            move_vec -= strafe;
        }
        if keys.right {
            move_vec += strafe;
        }

        let new_center = self.center + move_vec;
        if field.is_legal(new_center) {
            self.center = new_center;
        }

        // Buoyancy: the focus never sinks below the surface
        let wave_height = field.wave_height(new_center.x, new_center.z);
        if self.center.y < wave_height {
            self.center.y = wave_height;
            self.y_velocity = 0.0;
        }

        if move_vec.x != 0.0 || move_vec.z != 0.0 {
            self.previous_move = move_vec;
        }
    }

    /// With gravity on, movement is flattened to the ground plane at a fixed step
    fn move_vec(&self, input: Vec3) -> Vec3 {
        if self.gravity_enabled {
            Vec3::new(input.x, 0.0, input.z).normalize_or_zero() * self.params.grounded_step
        } else {
            input
        }
    }
}

//! World state and the per-frame simulation tick.
//!
//! One thread owns everything here. Input callbacks flip flags through
//! [`World::handle_key`] / [`World::handle_cursor`]; [`World::tick`] then runs
//! position update, matrix update and the retile check strictly in order.

use std::f32::consts::TAU;

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::camera::{Camera, CollisionField, Command, InputState, Key, KeyAction, Modifiers};
use crate::ocean::WaveSet;
use crate::params::{CameraParams, DayCycle, OceanPhysics, RainParams, RenderConfig, TerrainParams};
use crate::terrain::TerrainGrid;
use crate::weather::{RainField, Weather};

/// Everything needed to build a world
#[derive(Debug, Clone, Default)]
pub struct WorldConfig {
    pub terrain: TerrainParams,
    pub ocean: OceanPhysics,
    pub camera: CameraParams,
    pub render: RenderConfig,
    pub day: DayCycle,
    pub rain: RainParams,
    pub start_raining: bool,
}

/// Time of day in minutes, wrapping once per day
#[derive(Debug, Clone)]
pub struct DayClock {
    minutes: f32,
    params: DayCycle,
}

impl DayClock {
    pub fn new(params: DayCycle) -> Self {
        Self {
            minutes: params.start_minutes.rem_euclid(params.day_length_minutes),
            params,
        }
    }

    /// Advance by `dt_s` real seconds
    pub fn advance(&mut self, dt_s: f32) {
        self.add_minutes(dt_s * self.params.minutes_per_second);
    }

    /// Jump ahead by the configured skip
    pub fn skip(&mut self) {
        self.add_minutes(self.params.skip_minutes);
    }

    fn add_minutes(&mut self, minutes: f32) {
        self.minutes = (self.minutes + minutes).rem_euclid(self.params.day_length_minutes);
    }

    pub fn minutes(&self) -> f32 {
        self.minutes
    }

    /// Sun position orbiting `center`: below at midnight, overhead at noon
    pub fn sun_position(&self, center: Vec3) -> Vec3 {
        let angle = self.minutes / self.params.day_length_minutes * TAU;
        center + self.params.sun_radius * Vec3::new(0.0, -angle.cos(), angle.sin())
    }
}

/// Model matrix placing the boat at `center`, upright along `normal`, heading along `heading`
pub fn boat_transform(center: Vec3, normal: Vec3, heading: Vec3) -> Mat4 {
    let up = normal.normalize_or_zero();
    let up = if up == Vec3::ZERO { Vec3::Y } else { up };

    let planar = Vec3::new(heading.x, 0.0, heading.z).normalize_or_zero();
    let forward = if planar == Vec3::ZERO { Vec3::Z } else { planar };

    let right = up.cross(forward).normalize_or_zero();
    let right = if right == Vec3::ZERO { Vec3::X } else { right };
    let forward = right.cross(up);

    Mat4::from_cols(
        right.extend(0.0),
        up.extend(0.0),
        forward.extend(0.0),
        center.extend(1.0),
    )
}

/// Read-only snapshot handed to uniform accessors each draw
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub inv_proj_view: Mat4,
    pub light_position: Vec4,
    pub camera_position: Vec3,
    pub center_position: Vec3,
    pub prev_move: Vec3,
    pub boat_normal: Vec3,
    pub boat_model: Mat4,
    pub time_s: f32,
    pub time_of_day: f32,
    pub is_raining: bool,
    pub waves: &'a WaveSet,
}

/// Collision view of the world at one instant
struct Surroundings<'a> {
    terrain: &'a TerrainGrid,
    waves: &'a WaveSet,
    time_s: f32,
}

impl CollisionField for Surroundings<'_> {
    fn is_legal(&self, position: Vec3) -> bool {
        self.terrain.is_legal(position)
    }

    fn wave_height(&self, x: f32, z: f32) -> f32 {
        self.waves.height_at(x, z, self.time_s)
    }
}

/// The simulated world: terrain, ocean, weather, clock and player
pub struct World {
    terrain: TerrainGrid,
    waves: WaveSet,
    camera: Camera,
    input: InputState,
    clock: DayClock,
    weather: Weather,
    render_config: RenderConfig,
    elapsed_s: f32,
    boat_normal: Vec3,
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        let terrain = TerrainGrid::new(config.terrain.clone());
        let mut waves = WaveSet::new(&config.ocean);
        if config.start_raining {
            waves.toggle_storm(true);
        }
        let rain = RainField::new(config.terrain.rows, config.terrain.cols, config.rain);
        let mut camera = Camera::new(config.camera);
        camera.update_matrices(&config.render);

        log::info!(
            "World ready: {}x{} terrain tile, {} rain drops",
            config.terrain.rows,
            config.terrain.cols,
            rain.drops().len()
        );

        Self {
            terrain,
            waves,
            camera,
            input: InputState::default(),
            clock: DayClock::new(config.day),
            weather: Weather::new(rain, config.start_raining),
            render_config: config.render,
            elapsed_s: 0.0,
            boat_normal: Vec3::Y,
        }
    }

    /// Apply a key transition; returns the command it triggered, if any
    pub fn handle_key(&mut self, key: Key, action: KeyAction, mods: Modifiers) -> Option<Command> {
        let command = self.input.handle_key(key, action, mods)?;
        match command {
            Command::Quit => {}
            Command::ToggleGravity => self.camera.toggle_gravity(),
            Command::ToggleCameraMode => self.camera.toggle_mode(),
            Command::SkipTime => self.clock.skip(),
            Command::ToggleRain => self.weather.toggle_rain(&mut self.waves),
            Command::Jump => {
                self.camera.jump();
            }
        }
        Some(command)
    }

    /// Mouse-look by a cursor delta in screen space (+y up)
    pub fn handle_cursor(&mut self, delta: Vec2) {
        self.camera.rotate_by_cursor(delta);
    }

    /// Forget held keys, e.g. when the window loses focus
    pub fn release_keys(&mut self) {
        self.input.release_all();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.render_config.window_width = width.max(1);
        self.render_config.window_height = height.max(1);
    }

    /// Run one frame of simulation after `dt_s` seconds
    pub fn tick(&mut self, dt_s: f32) {
        self.elapsed_s += dt_s;
        self.clock.advance(dt_s);
        self.weather.advance(dt_s);

        let center = self.camera.center();
        self.boat_normal = self.waves.normal_at(center.x, center.z, self.elapsed_s);

        let keys = *self.input.held();
        let surroundings = Surroundings {
            terrain: &self.terrain,
            waves: &self.waves,
            time_s: self.elapsed_s,
        };
        self.camera.update_position(&keys, &surroundings);
        self.camera.update_matrices(&self.render_config);

        self.terrain.follow(self.camera.eye());
    }

    /// Snapshot of everything the shaders read this frame
    pub fn frame(&self) -> FrameContext<'_> {
        let center = self.camera.center();
        FrameContext {
            model: Mat4::IDENTITY,
            view: self.camera.view(),
            projection: self.camera.projection(),
            inv_proj_view: self.camera.inv_proj_view(),
            light_position: self.clock.sun_position(center).extend(1.0),
            camera_position: self.camera.eye(),
            center_position: center,
            prev_move: self.camera.previous_move(),
            boat_normal: self.boat_normal,
            boat_model: boat_transform(center, self.boat_normal, self.camera.previous_move()),
            time_s: self.elapsed_s,
            time_of_day: self.clock.minutes(),
            is_raining: self.weather.is_raining(),
            waves: &self.waves,
        }
    }

    pub fn terrain(&self) -> &TerrainGrid {
        &self.terrain
    }

    pub fn waves(&self) -> &WaveSet {
        &self.waves
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn weather(&self) -> &Weather {
        &self.weather
    }

    pub fn clock(&self) -> &DayClock {
        &self.clock
    }

    pub fn render_config(&self) -> &RenderConfig {
        &self.render_config
    }

    pub fn elapsed_s(&self) -> f32 {
        self.elapsed_s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraMode;

    const NONE: Modifiers = Modifiers {
        control: false,
        shift: false,
        alt: false,
    };

    fn test_world() -> World {
        World::new(WorldConfig {
            terrain: TerrainParams {
                rows: 40,
                cols: 40,
                ..TerrainParams::default()
            },
            ocean: OceanPhysics {
                seed: Some(5),
                ..OceanPhysics::default()
            },
            rain: RainParams {
                seed: Some(5),
                ..RainParams::default()
            },
            ..WorldConfig::default()
        })
    }

    #[test]
    fn test_clock_wraps_at_day_length() {
        let mut clock = DayClock::new(DayCycle::default());
        assert_eq!(clock.minutes(), 540.0);
        for _ in 0..15 {
            clock.skip();
        }
        assert_eq!(clock.minutes(), 0.0);
        clock.advance(30.0);
        assert_eq!(clock.minutes(), 30.0);
        clock.advance(1440.0);
        assert!((clock.minutes() - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_sun_orbit() {
        let params = DayCycle {
            start_minutes: 720.0,
            ..DayCycle::default()
        };
        let noon = DayClock::new(params.clone());
        let center = Vec3::new(3.0, 1.0, -2.0);
        let sun = noon.sun_position(center);
        assert!(sun.abs_diff_eq(center + Vec3::new(0.0, 100.0, 0.0), 1e-3));

        let midnight = DayClock::new(DayCycle {
            start_minutes: 0.0,
            ..params
        });
        assert!(midnight
            .sun_position(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(0.0, -100.0, 0.0), 1e-3));
    }

    #[test]
    fn test_boat_transform_level_sea() {
        let m = boat_transform(Vec3::new(1.0, 2.0, 3.0), Vec3::Y, Vec3::ZERO);
        let expected = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert!(m.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn test_boat_transform_follows_heading_and_normal() {
        let normal = Vec3::new(0.2, 1.0, 0.0).normalize();
        let m = boat_transform(Vec3::ZERO, normal, Vec3::new(1.0, -0.3, 0.0));
        let up = m.y_axis.truncate();
        let forward = m.z_axis.truncate();
        assert!(up.abs_diff_eq(normal, 1e-6));
        assert!(forward.dot(up).abs() < 1e-6);
        assert!(forward.x > 0.9);
    }

    #[test]
    fn test_rain_key_toggles_storm() {
        let mut world = test_world();
        assert_eq!(
            world.handle_key(Key::Digit1, KeyAction::Release, NONE),
            Some(Command::ToggleRain)
        );
        assert!(world.weather().is_raining());
        assert_eq!(world.waves().steepness(), 0.2);
        assert!(world.frame().is_raining);
    }

    #[test]
    fn test_mode_key_switches_camera() {
        let mut world = test_world();
        assert_eq!(world.camera().mode(), CameraMode::Orbit);
        world.handle_key(Key::C, KeyAction::Press, NONE);
        assert_eq!(world.camera().mode(), CameraMode::Fps);
    }

    #[test]
    fn test_orbit_focus_settles_on_water() {
        let mut world = test_world();
        for _ in 0..2000 {
            world.tick(1.0 / 60.0);
        }
        let center = world.camera().center();
        let surface = world.waves().height_at(center.x, center.z, world.elapsed_s());
        // Focus never sinks more than one tick of fall below the surface
        assert!(center.y >= surface - 0.5);
    }

    #[test]
    fn test_walking_forward_retiles() {
        let mut world = World::new(WorldConfig {
            terrain: TerrainParams {
                rows: 40,
                cols: 40,
                ..TerrainParams::default()
            },
            camera: CameraParams {
                initial_eye: Vec3::new(0.0, 60.0, 10.0),
                start_in_fps: true,
                ..CameraParams::default()
            },
            ocean: OceanPhysics {
                seed: Some(5),
                ..OceanPhysics::default()
            },
            rain: RainParams {
                seed: Some(5),
                ..RainParams::default()
            },
            ..WorldConfig::default()
        });
        world.handle_key(Key::F, KeyAction::Release, Modifiers {
            control: true,
            ..NONE
        });
        assert!(!world.camera().gravity_enabled());

        world.handle_key(Key::W, KeyAction::Press, NONE);
        // Well above any terrain; look is +Z at 0.1 per tick
        for _ in 0..200 {
            world.tick(1.0 / 60.0);
        }
        let eye = world.camera().eye();
        assert!(eye.z > 25.0);
        let (_, anchor_z) = world.terrain().tile().anchor();
        assert_eq!(anchor_z / 5, (eye.z.floor() as i32) / 5);
    }

    #[test]
    fn test_narrow_grid_never_blocks_walking() {
        let mut world = World::new(WorldConfig {
            terrain: TerrainParams {
                rows: 10,
                cols: 10,
                ..TerrainParams::default()
            },
            camera: CameraParams {
                initial_eye: Vec3::new(0.5, 60.0, 0.5),
                start_in_fps: true,
                start_with_gravity: false,
                ..CameraParams::default()
            },
            ocean: OceanPhysics {
                seed: Some(8),
                ..OceanPhysics::default()
            },
            rain: RainParams {
                seed: Some(8),
                ..RainParams::default()
            },
            ..WorldConfig::default()
        });
        world.handle_key(Key::W, KeyAction::Press, NONE);
        for _ in 0..1000 {
            world.tick(1.0 / 60.0);
        }
        let eye = world.camera().eye();
        assert!(eye.z > 99.0, "stuck at z = {}", eye.z);
        assert!(world.terrain().tile().covers_neighborhood(0, eye.z.floor() as i32));
    }

    #[test]
    fn test_frame_snapshot() {
        let mut world = test_world();
        world.tick(0.5);
        let frame = world.frame();
        assert_eq!(frame.time_s, 0.5);
        assert_eq!(frame.time_of_day, 540.5);
        assert_eq!(frame.model, Mat4::IDENTITY);
        assert_eq!(frame.camera_position, world.camera().eye());
        assert!((frame.boat_normal.length() - 1.0).abs() < 1e-5);
    }
}

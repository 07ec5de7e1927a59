//! Seafarer - procedural islands on an endless Gerstner ocean
//!
//! Walk the terrain in first person, or drift a boat over the waves and
//! watch the day pass.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalPosition,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

use seafarer::assets::{load_obj, Mesh};
use seafarer::camera::{Command, Key, KeyAction, Modifiers};
use seafarer::cli::Args;
use seafarer::rendering::RenderSystem;
use seafarer::world::World;

/// Frame-rate report once per second
struct FpsCounter {
    frames: u32,
    last_report: Instant,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            frames: 0,
            last_report: Instant::now(),
        }
    }

    fn record_frame(&mut self) {
        self.frames += 1;
        let elapsed = self.last_report.elapsed();
        if elapsed >= Duration::from_secs(1) {
            log::debug!("FPS: {:.1}", self.frames as f32 / elapsed.as_secs_f32());
            self.frames = 0;
            self.last_report = Instant::now();
        }
    }
}

/// Main application state
struct App {
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    world: World,
    boat_mesh: Option<Mesh>,

    modifiers: Modifiers,
    last_cursor: Option<PhysicalPosition<f64>>,
    last_frame: Instant,
    fps: FpsCounter,
}

impl App {
    fn new(world: World, boat_mesh: Option<Mesh>) -> Self {
        Self {
            window: None,
            render_system: None,
            world,
            boat_mesh,
            modifiers: Modifiers::default(),
            last_cursor: None,
            last_frame: Instant::now(),
            fps: FpsCounter::new(),
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let config = self.world.render_config();
        let window_attributes = Window::default_attributes()
            .with_title("Seafarer")
            .with_inner_size(winit::dpi::LogicalSize::new(
                config.window_width,
                config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let render_system = match pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &self.world,
            self.boat_mesh.as_ref(),
        )) {
            Ok(render_system) => render_system,
            Err(e) => {
                log::error!("Failed to initialize rendering: {}", e);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.world.resize(size.width, size.height);

        log::info!("Seafarer is running. Press ESC to quit");

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.last_frame = Instant::now();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                self.world.resize(size.width, size.height);
                if let Some(render_system) = &mut self.render_system {
                    render_system.resize(size.width, size.height);
                }
            }
            WindowEvent::Focused(false) => self.world.release_keys(),
            WindowEvent::ModifiersChanged(mods) => {
                let state = mods.state();
                self.modifiers = Modifiers {
                    control: state.control_key(),
                    shift: state.shift_key(),
                    alt: state.alt_key(),
                };
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                let Some(key) = Key::from_key_code(code) else {
                    return;
                };
                let action = match (event.state, event.repeat) {
                    (ElementState::Released, _) => KeyAction::Release,
                    (ElementState::Pressed, true) => KeyAction::Repeat,
                    (ElementState::Pressed, false) => KeyAction::Press,
                };
                if self.world.handle_key(key, action, self.modifiers) == Some(Command::Quit) {
                    event_loop.exit();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(last) = self.last_cursor {
                    // Screen y grows downward; the camera expects +y up
                    let delta = Vec2::new(
                        (position.x - last.x) as f32,
                        (last.y - position.y) as f32,
                    );
                    self.world.handle_cursor(delta);
                }
                self.last_cursor = Some(position);
            }
            WindowEvent::RedrawRequested => self.render_frame(event_loop),
            _ => {}
        }
    }
}

impl App {
    /// Advance the world and draw it
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.world.tick(dt);

        let Some(render_system) = &mut self.render_system else {
            return;
        };
        render_system.update(&self.world);

        match render_system.render() {
            Ok(()) => self.fps.record_frame(),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                render_system.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory, exiting");
                event_loop.exit();
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let boat_mesh = match &args.boat {
        Some(path) => match load_obj(path) {
            Ok(mesh) => Some(mesh),
            Err(e) => {
                log::error!("Failed to load boat mesh {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => None,
    };

    log::info!("Generating terrain...");
    let world = World::new(args.world_config());
    let mut app = App::new(world, boat_mesh);

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", e);
    }
}

//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::world::WorldConfig;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Seafarer")]
#[command(about = "Procedural island and ocean explorer", long_about = None)]
pub struct Args {
    /// Terrain tile size in cells along each axis
    #[arg(long, value_name = "CELLS", default_value_t = 150)]
    pub grid: usize,

    /// Seed for wave and rain sampling (random if omitted)
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Start in first-person mode instead of following the boat
    #[arg(long)]
    pub fps: bool,

    /// Start with rain and a stormy sea
    #[arg(long)]
    pub rain: bool,

    /// Start with gravity disabled (free flight)
    #[arg(long)]
    pub no_gravity: bool,

    /// Wavefront OBJ mesh drawn at the orbit focus
    #[arg(long, value_name = "PATH")]
    pub boat: Option<PathBuf>,

    /// Window width in pixels
    #[arg(long, value_name = "PIXELS", default_value_t = 1280)]
    pub width: u32,

    /// Window height in pixels
    #[arg(long, value_name = "PIXELS", default_value_t = 720)]
    pub height: u32,
}

impl Args {
    /// Apply the overrides on top of the default world configuration
    pub fn world_config(&self) -> WorldConfig {
        let mut config = WorldConfig::default();

        // The tile must reach past the widest retile bucket plus the orbit
        // distance, or the player meets the edge before a retile fires
        let half_width = 2.0 * config.terrain.update_step as f32 + config.camera.camera_distance + 1.0;
        let min_grid = 2 * half_width.ceil() as usize;
        let grid = self.grid.max(min_grid);
        if grid != self.grid {
            log::warn!("Grid size {} too small, using {}", self.grid, grid);
        }
        config.terrain.rows = grid;
        config.terrain.cols = grid;

        config.ocean.seed = self.seed;
        config.rain.seed = self.seed;

        config.camera.start_in_fps = self.fps;
        config.camera.start_with_gravity = !self.no_gravity;
        config.start_raining = self.rain;

        config.render.window_width = self.width.max(1);
        config.render.window_height = self.height.max(1);

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_world_defaults() {
        let args = Args::parse_from(["seafarer"]);
        let config = args.world_config();
        assert_eq!(config.terrain.rows, 150);
        assert_eq!(config.terrain.cols, 150);
        assert_eq!(config.render.window_width, 1280);
        assert!(config.camera.start_with_gravity);
        assert!(!config.camera.start_in_fps);
        assert!(!config.start_raining);
        assert!(args.boat.is_none());
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "seafarer",
            "--grid",
            "64",
            "--seed",
            "42",
            "--fps",
            "--rain",
            "--no-gravity",
            "--boat",
            "assets/rowboat.obj",
        ]);
        let config = args.world_config();
        assert_eq!(config.terrain.rows, 64);
        assert_eq!(config.ocean.seed, Some(42));
        assert_eq!(config.rain.seed, Some(42));
        assert!(config.camera.start_in_fps);
        assert!(!config.camera.start_with_gravity);
        assert!(config.start_raining);
        assert_eq!(args.boat, Some(PathBuf::from("assets/rowboat.obj")));
    }

    #[test]
    fn test_tiny_grid_is_clamped() {
        let args = Args::parse_from(["seafarer", "--grid", "10"]);
        let config = args.world_config();
        assert_eq!(config.terrain.rows, 42);
        assert_eq!(config.terrain.cols, 42);

        let args = Args::parse_from(["seafarer", "--grid", "42"]);
        assert_eq!(args.world_config().terrain.rows, 42);
    }
}

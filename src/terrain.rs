//! Windowed terrain tile grid that follows the camera.
//!
//! The grid holds one immutable [`TerrainTile`] behind an `Arc`. Retiling
//! builds a complete replacement tile and swaps it in, so anything holding
//! a snapshot (the renderer, a physics query) always sees one coherent
//! generation of offsets, heights and normals.

mod collision;
mod tile;

use std::sync::Arc;

use glam::Vec3;
use thiserror::Error;

use crate::noise::HeightField;
use crate::params::TerrainParams;

pub use tile::{TerrainCell, TerrainInstance, TerrainTile};

/// Terrain query errors
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum TerrainError {
    #[error("position ({x}, {z}) lies outside the current terrain tile")]
    OutOfTile { x: f32, z: f32 },
}

/// Terrain tile grid centered on the camera's block coordinate
pub struct TerrainGrid {
    params: TerrainParams,
    field: HeightField,
    tile: Arc<TerrainTile>,
}

impl TerrainGrid {
    /// Create a grid and build its first tile around the world origin
    pub fn new(params: TerrainParams) -> Self {
        let field = HeightField::new(&params);
        let tile = Arc::new(TerrainTile::build(&field, &params, 0, 0));
        Self {
            params,
            field,
            tile,
        }
    }

    /// Rebuild the whole tile centered on block `(anchor_x, anchor_z)`
    pub fn retile(&mut self, anchor_x: i32, anchor_z: i32) {
        let tile = TerrainTile::build(&self.field, &self.params, anchor_x, anchor_z);
        self.tile = Arc::new(tile);
        log::debug!("Retiled terrain around block ({}, {})", anchor_x, anchor_z);
    }

    /// Block coordinate containing world coordinate `v`
    pub fn block_coord(&self, v: f32) -> i32 {
        (v / self.params.block_size).floor() as i32
    }

    /// Retile if `eye` has left the current update step
    ///
    /// Also retiles early when the eye's block or one of its neighbors is
    /// missing from the tile, which happens on grids narrower than the step
    /// bucket. Returns `true` when a new tile was built.
    pub fn follow(&mut self, eye: Vec3) -> bool {
        let x = self.block_coord(eye.x);
        let z = self.block_coord(eye.z);
        let (cached_x, cached_z) = self.tile.anchor();
        let step = self.params.update_step;

        let crossed = x / step != cached_x / step || z / step != cached_z / step;
        if crossed || !self.tile.covers_neighborhood(x, z) {
            self.retile(x, z);
            true
        } else {
            false
        }
    }

    /// Current tile
    pub fn tile(&self) -> &TerrainTile {
        &self.tile
    }

    /// Shared handle to the current tile generation
    pub fn snapshot(&self) -> Arc<TerrainTile> {
        Arc::clone(&self.tile)
    }

    /// Cell containing world position `(x, z)`
    pub fn cell_at(&self, x: f32, z: f32) -> Result<&TerrainCell, TerrainError> {
        self.tile.cell_at(x, z)
    }

    /// Whether the player collider may occupy `position`
    pub fn is_legal(&self, position: Vec3) -> bool {
        self.tile
            .is_position_legal(position, self.params.collider_radius)
    }

    /// Noise-backed height field the tiles are sampled from
    pub fn height_field(&self) -> &HeightField {
        &self.field
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> TerrainParams {
        TerrainParams {
            rows: 20,
            cols: 20,
            ..TerrainParams::default()
        }
    }

    #[test]
    fn test_follow_only_retiles_across_update_step() {
        let mut grid = TerrainGrid::new(small_params());
        assert_eq!(grid.tile().anchor(), (0, 0));

        // Same quotient (0 / 5 == 4 / 5)
        assert!(!grid.follow(Vec3::new(4.5, 0.0, 3.2)));
        assert_eq!(grid.tile().anchor(), (0, 0));

        // Crossing into the next step rebuilds around the exact block
        assert!(grid.follow(Vec3::new(6.5, 0.0, 3.2)));
        assert_eq!(grid.tile().anchor(), (6, 3));
    }

    #[test]
    fn test_follow_truncates_toward_zero() {
        let mut grid = TerrainGrid::new(small_params());
        // Block -1 has quotient 0 under truncating division, same as block 0
        assert!(!grid.follow(Vec3::new(-0.5, 0.0, -3.9)));
        assert!(grid.follow(Vec3::new(-5.5, 0.0, 0.0)));
        assert_eq!(grid.tile().anchor(), (-6, 0));
    }

    #[test]
    fn test_narrow_grid_retiles_before_edge() {
        let mut grid = TerrainGrid::new(TerrainParams {
            rows: 10,
            cols: 10,
            ..TerrainParams::default()
        });
        // Blocks -5..=4 are present; block 4 shares the step bucket with 0
        // but its +Z neighbor is missing
        assert!(!grid.follow(Vec3::new(0.5, 0.0, 3.5)));
        assert!(grid.follow(Vec3::new(0.5, 0.0, 4.5)));
        assert_eq!(grid.tile().anchor(), (0, 4));
        assert!(grid.tile().covers_neighborhood(0, 4));
    }

    #[test]
    fn test_snapshot_survives_retile() {
        let mut grid = TerrainGrid::new(small_params());
        let before = grid.snapshot();
        grid.retile(40, -40);
        let after = grid.snapshot();

        assert_eq!(before.anchor(), (0, 0));
        assert_eq!(after.anchor(), (40, -40));
        assert_eq!(before.cells().len(), after.cells().len());
    }

    #[test]
    fn test_cell_at_outside_tile_is_error() {
        let grid = TerrainGrid::new(small_params());
        assert!(grid.cell_at(0.5, 0.5).is_ok());
        assert_eq!(
            grid.cell_at(500.0, 0.5),
            Err(TerrainError::OutOfTile { x: 500.0, z: 0.5 })
        );
    }
}

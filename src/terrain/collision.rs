//! Player collider against terrain blocks.
//!
//! The player is a vertical cylinder of small radius; terrain cells are
//! axis-aligned unit columns. Cells below zero height are water and never
//! block.

use glam::{Vec2, Vec3};

use super::TerrainTile;

/// The eight planar neighbors of a block
const NEIGHBORS: [(i32, i32); 8] = [
    (-1, 0),
    (1, 0),
    (0, 1),
    (0, -1),
    (-1, 1),
    (1, 1),
    (-1, -1),
    (1, -1),
];

/// Solid block of `height` contains a point at `y`
fn blocks(height: f32, y: f32) -> bool {
    height >= 0.0 && y < height
}

impl TerrainTile {
    /// Whether block `(bx, bz)` and all eight of its neighbors are in the tile
    pub fn covers_neighborhood(&self, bx: i32, bz: i32) -> bool {
        self.cell_by_block(bx, bz).is_some()
            && NEIGHBORS
                .iter()
                .all(|&(dx, dz)| self.cell_by_block(bx + dx, bz + dz).is_some())
    }

    /// Whether a collider of `radius` centered at `loc` is free of terrain
    ///
    /// Positions whose own cell, or a neighbor cell the collider reaches
    /// into, lie outside the tile are rejected.
    pub fn is_position_legal(&self, loc: Vec3, radius: f32) -> bool {
        let block = self.block_size();
        let bx = (loc.x / block).floor() as i32;
        let bz = (loc.z / block).floor() as i32;

        let Some(current) = self.cell_by_block(bx, bz) else {
            return false;
        };
        if blocks(current.height(), loc.y) {
            return false;
        }

        let planar = Vec2::new(loc.x, loc.z);
        for (dx, dz) in NEIGHBORS {
            let (nx, nz) = (bx + dx, bz + dz);
            let min = Vec2::new(nx as f32, nz as f32) * block;
            let max = min + Vec2::splat(block);
            let closest = planar.clamp(min, max);
            if closest.distance(planar) >= radius {
                continue;
            }

            match self.cell_by_block(nx, nz) {
                Some(neighbor) if blocks(neighbor.height(), loc.y) => return false,
                Some(_) => {}
                None => return false,
            }
        }

        true
    }
}

//! One generation of terrain cells: offsets, corner heights, corner normals.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4};
use noise::NoiseFn;

use super::TerrainError;
use crate::noise::HeightField;
use crate::params::TerrainParams;

/// One terrain cell
///
/// Corner order is self, +row (+X), +col (+Z), +row+col. Corners past the
/// last row/column reuse the cell's own height and normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainCell {
    /// World position of the cell's bottom-left corner, y = height
    pub offset: Vec3,
    pub corner_heights: Vec4,
    pub corner_normals: [Vec3; 4],
}

impl TerrainCell {
    pub fn height(&self) -> f32 {
        self.offset.y
    }
}

/// Per-instance vertex data for the terrain pipeline
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct TerrainInstance {
    pub offset: [f32; 3],
    pub corner_heights: [f32; 4],
    pub corner_normals: [[f32; 3]; 4],
}

impl From<&TerrainCell> for TerrainInstance {
    fn from(cell: &TerrainCell) -> Self {
        Self {
            offset: cell.offset.to_array(),
            corner_heights: cell.corner_heights.to_array(),
            corner_normals: cell.corner_normals.map(|n| n.to_array()),
        }
    }
}

/// Immutable grid of `rows * cols` cells around an anchor block (row-major)
#[derive(Debug, Clone)]
pub struct TerrainTile {
    anchor: (i32, i32),
    rows: usize,
    cols: usize,
    block_size: f32,
    cells: Vec<TerrainCell>,
    sorted_offsets: Vec<Vec3>,
}

impl TerrainTile {
    /// Sample `field` for every cell of the window centered on `(anchor_x, anchor_z)`
    pub fn build<N: NoiseFn<f64, 2>>(
        field: &HeightField<N>,
        params: &TerrainParams,
        anchor_x: i32,
        anchor_z: i32,
    ) -> Self {
        let (rows, cols) = (params.rows, params.cols);
        let mut heights = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                let (x, z) = cell_origin(params, anchor_x, anchor_z, i, j);
                heights.push(field.height(x, z));
            }
        }
        Self::from_heights(params, anchor_x, anchor_z, heights)
    }

    /// Assemble a tile from precomputed row-major heights
    ///
    /// # Panics
    /// If `heights.len() != rows * cols`.
    pub fn from_heights(
        params: &TerrainParams,
        anchor_x: i32,
        anchor_z: i32,
        heights: Vec<f32>,
    ) -> Self {
        let (rows, cols) = (params.rows, params.cols);
        assert_eq!(heights.len(), rows * cols, "height count must match grid");
        let block = params.block_size;

        // Face normal at each cell's bottom-left corner
        let mut normals = Vec::with_capacity(rows * cols);
        let mut corner_heights = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                let index = i * cols + j;
                let bot_left = heights[index];
                let mut local = Vec4::splat(bot_left);
                if i < rows - 1 {
                    local.y = heights[index + cols];
                }
                if j < cols - 1 {
                    local.z = heights[index + 1];
                }
                if i < rows - 1 && j < cols - 1 {
                    local.w = heights[index + cols + 1];
                }
                let normal = -Vec3::new(block, local.y - bot_left, 0.0)
                    .cross(Vec3::new(0.0, local.z - bot_left, block))
                    .normalize();
                normals.push(normal);
                corner_heights.push(local);
            }
        }

        let mut cells = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                let index = i * cols + j;
                let up = if i < rows - 1 { index + cols } else { index };
                let right = if j < cols - 1 { index + 1 } else { index };
                let diag = if i < rows - 1 && j < cols - 1 {
                    index + cols + 1
                } else {
                    index
                };
                let (x, z) = cell_origin(params, anchor_x, anchor_z, i, j);
                cells.push(TerrainCell {
                    offset: Vec3::new(x, heights[index], z),
                    corner_heights: corner_heights[index],
                    corner_normals: [normals[index], normals[up], normals[right], normals[diag]],
                });
            }
        }

        // Painter's order for the translucent ocean: nearest the anchor first
        let center = Vec2::new(anchor_x as f32, anchor_z as f32) * block;
        let mut sorted_offsets: Vec<Vec3> = cells.iter().map(|c| c.offset).collect();
        sorted_offsets.sort_by(|a, b| {
            let da = center.distance_squared(Vec2::new(a.x, a.z));
            let db = center.distance_squared(Vec2::new(b.x, b.z));
            da.total_cmp(&db)
        });

        Self {
            anchor: (anchor_x, anchor_z),
            rows,
            cols,
            block_size: block,
            cells,
            sorted_offsets,
        }
    }

    /// Block coordinate the tile is centered on
    pub fn anchor(&self) -> (i32, i32) {
        self.anchor
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn block_size(&self) -> f32 {
        self.block_size
    }

    /// All cells, row-major (`index = i * cols + j`)
    pub fn cells(&self) -> &[TerrainCell] {
        &self.cells
    }

    /// Cell offsets sorted by planar distance to the anchor
    pub fn sorted_offsets(&self) -> &[Vec3] {
        &self.sorted_offsets
    }

    /// GPU instance data for every cell
    pub fn instances(&self) -> Vec<TerrainInstance> {
        self.cells.iter().map(TerrainInstance::from).collect()
    }

    /// Cell at grid position `(i, j)`
    pub fn cell(&self, i: usize, j: usize) -> Option<&TerrainCell> {
        if i < self.rows && j < self.cols {
            self.cells.get(i * self.cols + j)
        } else {
            None
        }
    }

    /// Cell for world block `(bx, bz)`, if materialized
    pub fn cell_by_block(&self, bx: i32, bz: i32) -> Option<&TerrainCell> {
        let i = bx as i64 - self.anchor.0 as i64 + (self.rows / 2) as i64;
        let j = bz as i64 - self.anchor.1 as i64 + (self.cols / 2) as i64;
        if i < 0 || j < 0 {
            return None;
        }
        self.cell(i as usize, j as usize)
    }

    /// Cell containing world position `(x, z)`
    pub fn cell_at(&self, x: f32, z: f32) -> Result<&TerrainCell, TerrainError> {
        let bx = (x / self.block_size).floor() as i32;
        let bz = (z / self.block_size).floor() as i32;
        self.cell_by_block(bx, bz)
            .ok_or(TerrainError::OutOfTile { x, z })
    }
}

/// World-space origin of cell `(i, j)` for a tile anchored at `(anchor_x, anchor_z)`
fn cell_origin(params: &TerrainParams, anchor_x: i32, anchor_z: i32, i: usize, j: usize) -> (f32, f32) {
    let x = (i as f32 - (params.rows / 2) as f32 + anchor_x as f32) * params.block_size;
    let z = (j as f32 - (params.cols / 2) as f32 + anchor_z as f32) * params.block_size;
    (x, z)
}

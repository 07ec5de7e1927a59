//! Terrain tile grid and height field shaping parameters.

/// Terrain generation and tiling parameters
#[derive(Debug, Clone)]
pub struct TerrainParams {
    /// Grid rows (cells along world X)
    pub rows: usize,

    /// Grid columns (cells along world Z)
    pub cols: usize,

    /// Edge length of one terrain block (world units)
    pub block_size: f32,

    /// Retile granularity (blocks). The tile is rebuilt when the camera's
    /// block coordinate divided by this step changes.
    pub update_step: i32,

    /// Peak height of the fractal sum before offset (world units)
    pub max_height: f32,

    /// Ground-plane division factor (blocks per unit of noise lattice)
    pub scale_divisor: f32,

    /// Constant vertical offset (world units, negative sinks terrain below sea level)
    pub vertical_offset: f32,

    /// Number of fractal octaves (frequency doubles, amplitude halves)
    pub octaves: usize,

    /// Amplitude of the first octave (dimensionless)
    /// 8/15 makes the three-octave weights sum to 1
    pub base_amplitude: f32,

    /// Player collider radius in the xz-plane (world units)
    pub collider_radius: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            rows: 150,
            cols: 150,
            block_size: 1.0,
            update_step: 5,
            max_height: 50.0,
            scale_divisor: 20.0,
            vertical_offset: -8.0, // Keeps most of the visible terrain submerged
            octaves: 3,
            base_amplitude: 8.0 / 15.0,
            collider_radius: 0.25,
        }
    }
}

impl TerrainParams {
    /// Total number of cells in one tile
    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }
}

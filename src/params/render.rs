//! Rendering configuration.

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Vertical field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane (world units)
    pub near_plane: f32,

    /// Far clipping plane (world units)
    /// Covers the diagonal of a 150x150 tile plus the sun orbit
    pub far_plane: f32,

    /// Ocean surface opacity used when compositing back-to-front
    pub ocean_alpha: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_degrees: 45.0,
            near_plane: 0.1,
            far_plane: 1000.0,
            ocean_alpha: 0.75,
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height.max(1) as f32
    }
}

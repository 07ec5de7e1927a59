//! Parameter definitions with physical units and documented semantics.
//!
//! Every tunable constant of the world lives here with:
//! - Units (world blocks, seconds, minutes of day, etc.)
//! - Documented ranges and meanings
//! - A `Default` matching the shipped look of the scene

mod camera;
mod ocean;
mod render;
mod terrain;
mod world;

// Re-export all types
pub use camera::CameraParams;
pub use ocean::{OceanPhysics, SeaState};
pub use render::RenderConfig;
pub use terrain::TerrainParams;
pub use world::{DayCycle, RainParams};

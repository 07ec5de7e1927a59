//! Seafarer library - procedural terrain, ocean waves and a walking/boating camera

pub mod assets;
pub mod camera;
pub mod cli;
pub mod noise;
pub mod ocean;
pub mod params;
pub mod rendering;
pub mod terrain;
pub mod uniforms;
pub mod weather;
pub mod world;

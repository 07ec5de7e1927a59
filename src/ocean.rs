//! Ocean surface: a sum of trochoidal waves shared by rendering and physics.
//!
//! One [`WaveSet`] is owned by the world and lent to both the renderer (as
//! uniform arrays) and the camera controller (height and normal queries).
//! Only [`WaveSet::resample`] and [`WaveSet::toggle_storm`] change it.

mod waves;

pub use waves::{WaveSet, WAVE_COUNT};

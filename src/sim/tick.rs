//! Fixed timestep simulation tick
//!
//! The per-frame constants (spin, smoothing) were tuned for 60 fps, so they
//! are applied once per 60 Hz step rather than once per rendered frame.

use super::gesture::HandData;
use super::state::SceneState;
use crate::tuning::Tuning;

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Latest hand sample, if the feed has produced one
    pub hand: Option<HandData>,
}

/// Advance the scene by one fixed timestep
pub fn tick(scene: &mut SceneState, input: &TickInput, tuning: &Tuning) {
    scene.time_ticks += 1;
    scene.rotation.step(input.hand.as_ref(), &tuning.gesture);
}

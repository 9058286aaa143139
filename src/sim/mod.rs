//! Deterministic choreography module
//!
//! All scene logic lives here. This module must be pure and deterministic:
//! - Time comes in as an argument, never read from a clock
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod burst;
pub mod gesture;
pub mod particle;
pub mod sequencer;
pub mod state;
pub mod tick;
pub mod timeline;
pub mod tree;
pub mod wish;

pub use burst::{BurstPhase, ChristmasBurst};
pub use gesture::{GestureSource, HandData, MockGestureSource, SceneRotation, interaction_scale};
pub use particle::{Layer, ParticleBuffers, ParticleInstance};
pub use sequencer::{Cue, WishSequencer};
pub use state::{AnimationPhase, RngState, SceneEvent, SceneState, local_secs};
pub use tick::{TickInput, tick};
pub use timeline::{TaskId, Timeline};
pub use tree::MagicTree;
pub use wish::{CompletionLatch, WishParticles};

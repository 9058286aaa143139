//! Scene state and core simulation types
//!
//! A scene is everything that gets thrown away and regenerated on reset:
//! the tree, any live wish or burst animators, and the group rotation.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::burst::ChristmasBurst;
use super::gesture::SceneRotation;
use super::tree::MagicTree;
use super::wish::WishParticles;
use crate::tuning::Tuning;

/// Current phase of the wish sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AnimationPhase {
    /// Waiting for a wish, camera auto-rotates
    #[default]
    Idle,
    /// Wish particles are converging on the tree
    Wishing,
    /// Spiral and dash burst is playing
    Bursting,
    /// Punchline overlay is showing
    Punchline,
}

impl AnimationPhase {
    /// Derive the phase from the sequencer flags (latest stage wins)
    pub fn from_flags(has_wish: bool, bursting: bool, punchline: bool) -> Self {
        if punchline {
            AnimationPhase::Punchline
        } else if bursting {
            AnimationPhase::Bursting
        } else if has_wish {
            AnimationPhase::Wishing
        } else {
            AnimationPhase::Idle
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationPhase::Idle => "Idle",
            AnimationPhase::Wishing => "Wishing",
            AnimationPhase::Bursting => "Bursting",
            AnimationPhase::Punchline => "Punchline",
        }
    }
}

/// Things that happened during an update, in order
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// A wish was accepted
    WishSubmitted { at_ms: f64 },
    /// The burst began (at its scheduled time, not the frame that noticed it)
    BurstStarted { at_ms: f64 },
    /// The punchline became visible
    PunchlineShown { at_ms: f64 },
    /// The wish particles reached the tree (reported once per wish)
    WishConverged,
    /// Everything was cleared and the scene remounted under a new key
    Reset { scene_key: u64 },
}

/// RNG state wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    /// Independent stream for the scene mounted under `scene_key`
    pub fn for_scene(seed: u64, scene_key: u64) -> Self {
        Self {
            seed,
            stream: scene_key,
        }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::new(self.seed, self.stream)
    }
}

/// The mounted scene
#[derive(Debug)]
pub struct SceneState {
    /// Identity of this mount; changes on every reset
    pub scene_key: u64,
    /// Origin of the tree clock (ms). Set when the show first mounts and
    /// carried across remounts, so the bloom plays once.
    pub clock_origin_ms: f64,
    pub tree: MagicTree,
    /// Live wish particles and the time they were spawned (ms)
    pub wish: Option<(WishParticles, f64)>,
    /// Live burst and the time it started (ms)
    pub burst: Option<(ChristmasBurst, f64)>,
    /// Group rotation driven by the gesture feed
    pub rotation: SceneRotation,
    /// Simulation step counter
    pub time_ticks: u64,
    rng: Pcg32,
}

impl SceneState {
    /// Mount a fresh scene. `density` scales the tree's particle counts and
    /// the tree clock runs from `clock_origin_ms`.
    pub fn new(
        rng_state: &RngState,
        scene_key: u64,
        tuning: &Tuning,
        density: f32,
        clock_origin_ms: f64,
    ) -> Self {
        let mut rng = rng_state.to_rng();
        let tree = MagicTree::generate(&mut rng, &tuning.tree, density);
        log::debug!(
            "Mounted scene {} ({} tree particles)",
            scene_key,
            tree.particle_count()
        );
        Self {
            scene_key,
            clock_origin_ms,
            tree,
            wish: None,
            burst: None,
            rotation: SceneRotation::default(),
            time_ticks: 0,
            rng,
        }
    }

    /// Spawn wish particles starting at `at_ms`
    pub fn spawn_wish(&mut self, tuning: &Tuning, at_ms: f64) {
        let wish = WishParticles::new(&mut self.rng, &tuning.wish);
        self.wish = Some((wish, at_ms));
    }

    /// Start the burst at `at_ms`
    pub fn spawn_burst(&mut self, tuning: &Tuning, at_ms: f64) {
        let burst = ChristmasBurst::new(&mut self.rng, &tuning.burst);
        self.burst = Some((burst, at_ms));
    }

    /// Seconds on the tree clock
    pub fn elapsed_secs(&self, now_ms: f64) -> f32 {
        local_secs(self.clock_origin_ms, now_ms)
    }
}

/// Seconds elapsed from `start_ms` to `now_ms`, never negative
#[inline]
pub fn local_secs(start_ms: f64, now_ms: f64) -> f32 {
    ((now_ms - start_ms) / 1000.0).max(0.0) as f32
}

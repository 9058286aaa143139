//! Data-driven timings and particle counts
//!
//! Every constant the choreography depends on lives here so it can be
//! overridden from JSON without a rebuild. Missing fields fall back to the
//! defaults, which reproduce the shipped show.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Wish sequence timings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceTuning {
    /// Delay from wish submission to the burst (ms)
    pub burst_delay_ms: f64,
    /// Delay from the burst to the punchline (ms)
    pub punchline_delay_ms: f64,
}

impl Default for SequenceTuning {
    fn default() -> Self {
        Self {
            burst_delay_ms: 2000.0,
            // Spiral (3.0s) + dash (1.5s)
            punchline_delay_ms: 4500.0,
        }
    }
}

/// Wish particle convergence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WishTuning {
    pub particle_count: usize,
    /// Time to travel from the start cloud to the origin (s)
    pub travel_secs: f32,
    /// Completion is reported once local time passes this (s)
    pub complete_after_secs: f32,
    /// Peak amplitude of the sinusoidal jitter
    pub jitter: f32,
}

impl Default for WishTuning {
    fn default() -> Self {
        Self {
            particle_count: 900,
            travel_secs: 2.5,
            complete_after_secs: 3.0,
            jitter: 2.0,
        }
    }
}

/// Two-phase burst
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstTuning {
    pub particle_count: usize,
    /// Duration of the helical spiral phase (s)
    pub spiral_secs: f32,
    /// Angular speed along the helix (rad/s)
    pub spiral_speed: f32,
    /// Number of helix turns the particles are spread over
    pub spiral_turns: f32,
    /// Vertical extent of the fully expanded helix
    pub spiral_height: f32,
    /// Duration of the dash toward the camera (s)
    pub dash_secs: f32,
    /// Pink to white blend rate during the dash (per second)
    pub whiten_rate: f32,
}

impl Default for BurstTuning {
    fn default() -> Self {
        Self {
            particle_count: 1600,
            spiral_secs: 3.0,
            spiral_speed: 6.0,
            spiral_turns: 3.2,
            spiral_height: 14.0,
            dash_secs: 1.5,
            whiten_rate: 2.5,
        }
    }
}

/// Hand gesture feed and its effect on the tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureTuning {
    /// Interval between synthetic hand samples (ms)
    pub sample_interval_ms: f64,
    /// Fraction of the remaining rotation covered each step
    pub rotation_smoothing: f32,
    /// Rotation (rad) per unit of palm offset from center
    pub rotation_range: f32,
    /// Constant spin added each step (rad)
    pub idle_spin: f32,
    /// Scale applied while gripping or pinching
    pub shrink: f32,
    /// Scale applied while the hand is open
    pub expand: f32,
}

impl Default for GestureTuning {
    fn default() -> Self {
        Self {
            sample_interval_ms: 100.0,
            rotation_smoothing: 0.05,
            rotation_range: 0.5,
            idle_spin: 0.002,
            shrink: 0.65,
            expand: 1.35,
        }
    }
}

/// Ambient tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeTuning {
    pub leaf_count: usize,
    pub cube_count: usize,
    pub icosahedron_count: usize,
    pub ribbon_count: usize,
    pub height: f32,
    pub base_radius: f32,
    pub ribbon_loops: f32,
    /// Time for the tree to grow in after mounting (s)
    pub bloom_secs: f32,
}

impl Default for TreeTuning {
    fn default() -> Self {
        Self {
            leaf_count: 12_000,
            cube_count: 250,
            icosahedron_count: 250,
            ribbon_count: 850,
            height: 11.0,
            base_radius: 4.8,
            ribbon_loops: 3.0,
            bloom_secs: 3.2,
        }
    }
}

/// Complete tuning set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub sequence: SequenceTuning,
    pub wish: WishTuning,
    pub burst: BurstTuning,
    pub gesture: GestureTuning,
    pub tree: TreeTuning,
}

/// Upper bound on any single particle layer
pub const MAX_LAYER_PARTICLES: usize = 65_536;

impl Tuning {
    /// LocalStorage key for an optional override
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "wishing_tree_tuning";

    /// Parse and validate a tuning document
    pub fn from_json(json: &str) -> Result<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the animators cannot work with
    pub fn validate(&self) -> Result<()> {
        let delays = [
            ("sequence.burst_delay_ms", self.sequence.burst_delay_ms),
            ("sequence.punchline_delay_ms", self.sequence.punchline_delay_ms),
        ];
        for (name, value) in delays {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidTuning(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if !(self.gesture.sample_interval_ms.is_finite() && self.gesture.sample_interval_ms > 0.0)
        {
            return Err(Error::InvalidTuning(format!(
                "gesture.sample_interval_ms must be positive, got {}",
                self.gesture.sample_interval_ms
            )));
        }

        let durations = [
            ("wish.travel_secs", self.wish.travel_secs),
            ("burst.spiral_secs", self.burst.spiral_secs),
            ("burst.dash_secs", self.burst.dash_secs),
            ("tree.bloom_secs", self.tree.bloom_secs),
            ("tree.height", self.tree.height),
        ];
        for (name, value) in durations {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidTuning(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        let magnitudes = [
            ("wish.complete_after_secs", self.wish.complete_after_secs),
            ("wish.jitter", self.wish.jitter),
            ("burst.spiral_speed", self.burst.spiral_speed),
            ("burst.spiral_turns", self.burst.spiral_turns),
            ("burst.spiral_height", self.burst.spiral_height),
            ("burst.whiten_rate", self.burst.whiten_rate),
            ("gesture.rotation_range", self.gesture.rotation_range),
            ("gesture.idle_spin", self.gesture.idle_spin),
            ("gesture.shrink", self.gesture.shrink),
            ("gesture.expand", self.gesture.expand),
            ("tree.base_radius", self.tree.base_radius),
            ("tree.ribbon_loops", self.tree.ribbon_loops),
        ];
        for (name, value) in magnitudes {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::InvalidTuning(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.gesture.rotation_smoothing) {
            return Err(Error::InvalidTuning(format!(
                "gesture.rotation_smoothing must be within 0..=1, got {}",
                self.gesture.rotation_smoothing
            )));
        }

        let counts = [
            ("wish.particle_count", self.wish.particle_count),
            ("burst.particle_count", self.burst.particle_count),
            ("tree.leaf_count", self.tree.leaf_count),
            ("tree.cube_count", self.tree.cube_count),
            ("tree.icosahedron_count", self.tree.icosahedron_count),
            ("tree.ribbon_count", self.tree.ribbon_count),
        ];
        for (name, value) in counts {
            if value > MAX_LAYER_PARTICLES {
                return Err(Error::InvalidTuning(format!(
                    "{name} exceeds {MAX_LAYER_PARTICLES} (got {value})"
                )));
            }
        }

        Ok(())
    }

    /// Load a tuning override from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(tuning) => {
                        log::info!("Loaded tuning override from LocalStorage");
                        return tuning;
                    }
                    Err(e) => log::warn!("Ignoring tuning override: {}", e),
                }
            }
        }

        Self::default()
    }

    /// Load a tuning file named by `WISHING_TREE_TUNING` (native)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Ok(path) = std::env::var("WISHING_TREE_TUNING") else {
            return Self::default();
        };
        match Self::from_path(&path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring tuning file {}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Read and validate a tuning file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

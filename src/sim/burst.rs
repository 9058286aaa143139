//! Two-phase Christmas burst: an expanding helix, then a dash at the camera
//!
//! The phase is a pure function of local time. There is no event and no
//! hysteresis: anything at or before `spiral_secs` is spiral, anything after
//! is dash.

use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;

use super::particle::{Layer, ParticleBuffers, ParticleInstance};
use crate::consts::{PINK, WHITE};
use crate::tuning::BurstTuning;
use crate::{ease_in_cubic, srgb_hex};

/// Particle scale while spiralling
const SPIRAL_SCALE: f32 = 0.06;
/// Fraction of the full radius the helix starts at
const SPIRAL_START_EXPAND: f32 = 0.2;
/// Depth of the dash target (toward and past the camera)
const DASH_TARGET_Z: f32 = 35.0;
/// Lateral spread of the dash targets
const DASH_SPREAD: f32 = 20.0;

/// Which half of the burst is playing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BurstPhase {
    Spiral,
    /// `elapsed` is seconds since the dash began
    Dash { elapsed: f32 },
}

impl BurstPhase {
    /// Phase at local time `t`
    pub fn at(t: f32, spiral_secs: f32) -> Self {
        if t > spiral_secs {
            BurstPhase::Dash {
                elapsed: t - spiral_secs,
            }
        } else {
            BurstPhase::Spiral
        }
    }
}

/// Seed parameters for one burst particle
#[derive(Debug, Clone, Copy)]
struct BurstSeed {
    phase: f32,
    y_offset: f32,
    radius: f32,
    dash_target: Vec3,
}

/// The burst animator
#[derive(Debug, Clone)]
pub struct ChristmasBurst {
    seeds: Vec<BurstSeed>,
    tuning: BurstTuning,
}

impl ChristmasBurst {
    pub fn new(rng: &mut impl Rng, tuning: &BurstTuning) -> Self {
        let count = tuning.particle_count;
        let seeds = (0..count)
            .map(|i| {
                let frac = i as f32 / count as f32;
                BurstSeed {
                    phase: frac * TAU * tuning.spiral_turns,
                    y_offset: frac * tuning.spiral_height - tuning.spiral_height / 2.0,
                    radius: 3.5 + rng.random::<f32>() * 2.5,
                    dash_target: Vec3::new(
                        (rng.random::<f32>() - 0.5) * DASH_SPREAD,
                        (rng.random::<f32>() - 0.5) * DASH_SPREAD,
                        DASH_TARGET_Z,
                    ),
                }
            })
            .collect();

        Self {
            seeds,
            tuning: tuning.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    pub fn phase(&self, t: f32) -> BurstPhase {
        BurstPhase::at(t, self.tuning.spiral_secs)
    }

    /// Total running time (spiral + dash)
    pub fn duration_secs(&self) -> f32 {
        self.tuning.spiral_secs + self.tuning.dash_secs
    }

    pub fn is_finished(&self, t: f32) -> bool {
        t >= self.duration_secs()
    }

    /// Position of a particle on the helix at local time `t`
    fn spiral_position(&self, seed: &BurstSeed, t: f32) -> (Vec3, f32) {
        let along = t / self.tuning.spiral_secs;
        let angle = seed.phase + t * self.tuning.spiral_speed;
        let expand = SPIRAL_START_EXPAND + along * (1.0 - SPIRAL_START_EXPAND);
        let radius = seed.radius * expand;
        let pos = Vec3::new(angle.cos() * radius, seed.y_offset * along, angle.sin() * radius);
        (pos, angle)
    }

    /// Append every particle at local time `t` to the burst layer
    pub fn sample(&self, t: f32, out: &mut ParticleBuffers) {
        let pink = srgb_hex(PINK);
        let layer = out.layer_mut(Layer::Burst);

        match self.phase(t) {
            BurstPhase::Spiral => {
                layer.extend(self.seeds.iter().map(|seed| {
                    let (pos, angle) = self.spiral_position(seed, t);
                    ParticleInstance::new(pos, SPIRAL_SCALE, Vec3::new(angle, t, 0.0), pink)
                }));
            }
            BurstPhase::Dash { elapsed } => {
                let progress = (elapsed / self.tuning.dash_secs).min(1.0);
                let eased = ease_in_cubic(progress);
                let whiten = (elapsed * self.tuning.whiten_rate).min(1.0);
                let color = pink.lerp(srgb_hex(WHITE), whiten);
                let spiral_end = self.tuning.spiral_secs;

                layer.extend(self.seeds.iter().map(|seed| {
                    let (start, _) = self.spiral_position(seed, spiral_end);
                    let pos = start.lerp(seed.dash_target, eased);
                    let euler = Vec3::new(elapsed * 12.0, elapsed * 6.0, 0.0);
                    ParticleInstance::new(pos, 0.1 + eased * 2.0, euler, color)
                }));
            }
        }
    }
}

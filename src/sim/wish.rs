//! Wish particles converging on the tree
//!
//! The particles start in a loose cloud behind the camera and fall into the
//! origin with an ease-out, shaking less the closer they get.

use glam::Vec3;
use rand::Rng;

use super::particle::{Layer, ParticleBuffers, ParticleInstance};
use crate::consts::{GOLD, PINK};
use crate::tuning::WishTuning;
use crate::{ease_out_cubic, srgb_hex};

/// Seed parameters for one wish particle
#[derive(Debug, Clone, Copy)]
struct WishSeed {
    start: Vec3,
    noise_seed: f32,
    scale: f32,
}

/// Reports completion exactly once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionLatch {
    fired: bool,
}

impl CompletionLatch {
    /// Returns true on the first call where `elapsed > threshold`, false forever after
    pub fn check(&mut self, elapsed: f32, threshold: f32) -> bool {
        if self.fired || elapsed <= threshold {
            return false;
        }
        self.fired = true;
        true
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

/// The converging wish cloud
#[derive(Debug, Clone)]
pub struct WishParticles {
    seeds: Vec<WishSeed>,
    travel_secs: f32,
    complete_after_secs: f32,
    jitter: f32,
    latch: CompletionLatch,
}

impl WishParticles {
    pub fn new(rng: &mut impl Rng, tuning: &WishTuning) -> Self {
        let seeds = (0..tuning.particle_count)
            .map(|_| WishSeed {
                start: Vec3::new(
                    (rng.random::<f32>() - 0.5) * 30.0,
                    (rng.random::<f32>() - 0.5) * 25.0,
                    25.0 + rng.random::<f32>() * 5.0,
                ),
                noise_seed: rng.random::<f32>() * 100.0,
                scale: 0.04 + rng.random::<f32>() * 0.1,
            })
            .collect();

        Self {
            seeds,
            travel_secs: tuning.travel_secs,
            complete_after_secs: tuning.complete_after_secs,
            jitter: tuning.jitter,
            latch: CompletionLatch::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// Linear travel progress (0-1) at local time `t`
    pub fn progress(&self, t: f32) -> f32 {
        (t / self.travel_secs).min(1.0)
    }

    /// Poll for completion; true exactly once, after the completion threshold
    pub fn poll_complete(&mut self, t: f32) -> bool {
        self.latch.check(t, self.complete_after_secs)
    }

    pub fn is_complete(&self) -> bool {
        self.latch.has_fired()
    }

    /// Append every particle at local time `t` to the wish layer
    pub fn sample(&self, t: f32, out: &mut ParticleBuffers) {
        let progress = self.progress(t);
        let eased = ease_out_cubic(progress);
        let fade = 1.0 - progress;
        let color = srgb_hex(PINK).lerp(srgb_hex(GOLD), progress);
        let euler = Vec3::new(t * 3.0, t, 0.0);

        let layer = out.layer_mut(Layer::Wish);
        layer.extend(self.seeds.iter().map(|seed| {
            let mut pos = seed.start.lerp(Vec3::ZERO, eased);
            pos.x += (t * 2.0 + seed.noise_seed).sin() * fade * self.jitter;
            pos.y += (t * 1.8 + seed.noise_seed).cos() * fade * self.jitter;
            ParticleInstance::new(pos, seed.scale * (1.1 - eased), euler, color)
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn wish() -> WishParticles {
        let mut rng = Pcg32::seed_from_u64(42);
        WishParticles::new(&mut rng, &WishTuning::default())
    }

    #[test]
    fn test_particle_count() {
        let wish = wish();
        assert_eq!(wish.len(), 900);
        let mut out = ParticleBuffers::new();
        wish.sample(0.0, &mut out);
        assert_eq!(out.layer(Layer::Wish).len(), 900);
        assert_eq!(out.total(), 900);
    }

    #[test]
    fn test_starts_behind_camera() {
        let mut out = ParticleBuffers::new();
        wish().sample(0.0, &mut out);
        for p in out.layer(Layer::Wish) {
            assert!(p.pos.z >= 25.0 && p.pos.z <= 30.0);
        }
    }

    #[test]
    fn test_converges_to_origin() {
        let mut out = ParticleBuffers::new();
        wish().sample(2.5, &mut out);
        for p in out.layer(Layer::Wish) {
            // Jitter has decayed to zero at full progress
            assert!(p.pos.length() < 1e-4, "particle at {:?}", p.pos);
        }
    }

    #[test]
    fn test_color_blends_pink_to_gold() {
        let mut out = ParticleBuffers::new();
        let w = wish();
        w.sample(0.0, &mut out);
        assert!((out.layer(Layer::Wish)[0].color - srgb_hex(PINK)).length() < 1e-5);

        out.clear();
        w.sample(2.5, &mut out);
        assert!((out.layer(Layer::Wish)[0].color - srgb_hex(GOLD)).length() < 1e-5);
    }

    #[test]
    fn test_completion_fires_once() {
        let mut w = wish();
        assert!(!w.poll_complete(1.0));
        assert!(!w.poll_complete(3.0));
        assert!(w.poll_complete(3.01));
        assert!(!w.poll_complete(3.5));
        assert!(!w.poll_complete(10.0));
        assert!(w.is_complete());
    }

    #[test]
    fn test_latch_independent_of_frame_spacing() {
        let mut latch = CompletionLatch::default();
        let fires = (0..600)
            .map(|frame| frame as f32 / 60.0)
            .filter(|&t| latch.check(t, 3.0))
            .count();
        assert_eq!(fires, 1);
    }
}

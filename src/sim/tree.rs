//! The ambient particle tree
//!
//! A cone of leaves with two kinds of ornaments and a spiral ribbon. Layout is
//! generated once per mount; each frame only applies bloom, sway and the
//! gesture interaction scale on top of it.

use glam::Vec3;
use rand::Rng;
use std::f32::consts::{PI, TAU};

use super::particle::{Layer, ParticleBuffers, ParticleInstance};
use crate::tuning::TreeTuning;
use crate::{ease_out_quart, srgb_hex};

const LEAF_GREENS: [u32; 3] = [0x0B3D0B, 0x196619, 0x33CC33];
const LEAF_ACCENTS: [u32; 2] = [0xB7E778, 0xA0FFC0];
const ORNAMENT_COLORS: [u32; 3] = [0xFFD700, 0xFFFFFF, 0xDDA0DD];
const RIBBON_COLOR: u32 = 0xFFB6C1;

/// Ornaments stop short of the tip
const ORNAMENT_TOP_MARGIN: f32 = 0.8;
const ORNAMENT_RADIUS_FACTOR: f32 = 1.04;
const RIBBON_RADIUS_FACTOR: f32 = 1.12;

const CUBE_SIZE: f32 = 0.17;
const ICOSAHEDRON_SIZE: f32 = 0.19;
const RIBBON_SIZE: f32 = 0.04;

#[derive(Debug, Clone, Copy)]
struct Leaf {
    pos: Vec3,
    scale: f32,
    color: Vec3,
    phase: f32,
}

#[derive(Debug, Clone, Copy)]
struct Ornament {
    pos: Vec3,
    color: Vec3,
    phase: f32,
}

#[derive(Debug, Clone, Copy)]
struct RibbonBead {
    pos: Vec3,
    phase: f32,
}

/// Tree layout for one mount
#[derive(Debug, Clone)]
pub struct MagicTree {
    leaves: Vec<Leaf>,
    cubes: Vec<Ornament>,
    icosahedra: Vec<Ornament>,
    ribbon: Vec<RibbonBead>,
    bloom_secs: f32,
}

/// Scale a configured count by the quality density (never below one)
fn scaled(count: usize, density: f32) -> usize {
    if count == 0 {
        return 0;
    }
    ((count as f32 * density.clamp(0.0, 1.0)).round() as usize).max(1)
}

impl MagicTree {
    pub fn generate(rng: &mut impl Rng, tuning: &TreeTuning, density: f32) -> Self {
        let height = tuning.height;
        let base_radius = tuning.base_radius;
        let half = height / 2.0;

        let leaves = (0..scaled(tuning.leaf_count, density))
            .map(|_| {
                let y = rng.random::<f32>() * height;
                let ratio = 1.0 - y / height;
                // sqrt packs leaves toward the trunk, the floor keeps a visible core
                let radial = rng.random::<f32>().sqrt();
                let radius = ratio * base_radius * (0.45 + radial * 0.6);
                let angle = rng.random::<f32>() * TAU;

                let mut hex = LEAF_GREENS[rng.random_range(0..LEAF_GREENS.len())];
                if rng.random::<f32>() > 0.85 {
                    hex = LEAF_ACCENTS[0];
                }
                if rng.random::<f32>() > 0.94 {
                    hex = LEAF_ACCENTS[1];
                }

                Leaf {
                    pos: Vec3::new(angle.cos() * radius, y - half, angle.sin() * radius),
                    scale: 0.025 + rng.random::<f32>() * 0.075,
                    color: srgb_hex(hex),
                    phase: rng.random::<f32>() * TAU,
                }
            })
            .collect();

        let mut ornaments = |count: usize| -> Vec<Ornament> {
            (0..scaled(count, density))
                .map(|_| {
                    let y = rng.random::<f32>() * (height - ORNAMENT_TOP_MARGIN);
                    let ratio = 1.0 - y / height;
                    let radius = ratio * base_radius * ORNAMENT_RADIUS_FACTOR;
                    let angle = rng.random::<f32>() * TAU;
                    Ornament {
                        pos: Vec3::new(angle.cos() * radius, y - half, angle.sin() * radius),
                        color: srgb_hex(ORNAMENT_COLORS[rng.random_range(0..ORNAMENT_COLORS.len())]),
                        phase: rng.random::<f32>() * TAU,
                    }
                })
                .collect()
        };
        let cubes = ornaments(tuning.cube_count);
        let icosahedra = ornaments(tuning.icosahedron_count);

        let ribbon_count = scaled(tuning.ribbon_count, density);
        let ribbon = (0..ribbon_count)
            .map(|i| {
                let t = i as f32 / ribbon_count as f32;
                let angle = t * TAU * tuning.ribbon_loops;
                let y = t * height;
                let radius = (1.0 - y / height) * base_radius * RIBBON_RADIUS_FACTOR;
                RibbonBead {
                    pos: Vec3::new(angle.cos() * radius, y - half, angle.sin() * radius),
                    phase: t * PI * 35.0,
                }
            })
            .collect();

        Self {
            leaves,
            cubes,
            icosahedra,
            ribbon,
            bloom_secs: tuning.bloom_secs,
        }
    }

    pub fn particle_count(&self) -> usize {
        self.leaves.len() + self.cubes.len() + self.icosahedra.len() + self.ribbon.len()
    }

    /// Growth factor (0-1) at tree-clock time `t`
    pub fn bloom(&self, t: f32) -> f32 {
        ease_out_quart((t / self.bloom_secs).min(1.0))
    }

    /// Append the tree at scene time `t` to the leaf, ornament and ribbon layers
    pub fn sample(&self, t: f32, interaction_scale: f32, out: &mut ParticleBuffers) {
        let bloom = self.bloom(t);
        let spread = bloom * interaction_scale;

        out.layer_mut(Layer::Leaves).extend(self.leaves.iter().map(|leaf| {
            let sway_x = (t * 0.45 + leaf.phase).sin() * 0.09;
            let sway_z = (t * 0.45 + leaf.phase).cos() * 0.09;
            let pos = Vec3::new(
                (leaf.pos.x + sway_x) * spread,
                leaf.pos.y + (t * 0.3 + leaf.phase).sin() * 0.06,
                (leaf.pos.z + sway_z) * spread,
            );
            let euler = Vec3::new(t * 0.15 + leaf.phase, t * 0.1, leaf.phase * 0.2);
            ParticleInstance::new(pos, leaf.scale * bloom, euler, leaf.color)
        }));

        let ornament = |o: &Ornament, size: f32| {
            let pos = Vec3::new(
                o.pos.x * spread,
                o.pos.y + (t * 1.8 + o.phase).sin() * 0.12,
                o.pos.z * spread,
            );
            let pulse = 0.92 + (t * 1.2 + o.phase).sin() * 0.08;
            let euler = Vec3::new(0.0, t * 0.7 + o.phase, 0.0);
            ParticleInstance::new(pos, size * bloom * pulse, euler, o.color)
        };
        out.layer_mut(Layer::Cubes)
            .extend(self.cubes.iter().map(|o| ornament(o, CUBE_SIZE)));
        out.layer_mut(Layer::Icosahedra)
            .extend(self.icosahedra.iter().map(|o| ornament(o, ICOSAHEDRON_SIZE)));

        let ribbon_color = srgb_hex(RIBBON_COLOR);
        let ribbon_euler = Vec3::new(t * 3.5, t * 2.0, 0.0);
        out.layer_mut(Layer::Ribbon).extend(self.ribbon.iter().map(|bead| {
            let pulse = 1.0 + (t * 7.0 + bead.phase).sin() * 0.35;
            let pos = Vec3::new(bead.pos.x * spread, bead.pos.y, bead.pos.z * spread);
            ParticleInstance::new(pos, RIBBON_SIZE * pulse * bloom, ribbon_euler, ribbon_color)
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::f32::consts::FRAC_PI_2;

    fn tree(density: f32) -> MagicTree {
        let mut rng = Pcg32::seed_from_u64(3);
        MagicTree::generate(&mut rng, &TreeTuning::default(), density)
    }

    #[test]
    fn test_full_density_counts() {
        let tree = tree(1.0);
        assert_eq!(tree.particle_count(), 12_000 + 250 + 250 + 850);

        let mut out = ParticleBuffers::new();
        tree.sample(5.0, 1.0, &mut out);
        assert_eq!(out.layer(Layer::Leaves).len(), 12_000);
        assert_eq!(out.layer(Layer::Cubes).len(), 250);
        assert_eq!(out.layer(Layer::Icosahedra).len(), 250);
        assert_eq!(out.layer(Layer::Ribbon).len(), 850);
        assert!(out.layer(Layer::Wish).is_empty());
    }

    #[test]
    fn test_density_scales_counts() {
        let tree = tree(0.25);
        assert_eq!(tree.particle_count(), 3000 + 63 + 63 + 213);
        assert_eq!(scaled(10, 0.0), 1);
        assert_eq!(scaled(0, 1.0), 0);
    }

    #[test]
    fn test_bloom_grows_in() {
        let tree = tree(0.05);
        assert_eq!(tree.bloom(0.0), 0.0);
        assert!(tree.bloom(1.0) > 0.5);
        assert_eq!(tree.bloom(3.2), 1.0);
        assert_eq!(tree.bloom(60.0), 1.0);

        // Everything collapses to the trunk axis at mount
        let mut out = ParticleBuffers::new();
        tree.sample(0.0, 1.0, &mut out);
        for p in out.layer(Layer::Leaves) {
            assert_eq!(p.pos.x, 0.0);
            assert_eq!(p.pos.z, 0.0);
            assert_eq!(p.scale, 0.0);
        }
    }

    #[test]
    fn test_leaves_inside_cone() {
        let tree = tree(0.2);
        let mut out = ParticleBuffers::new();
        tree.sample(10.0, 1.0, &mut out);
        for p in out.layer(Layer::Leaves) {
            assert!(p.pos.y >= -5.5 - 0.07 && p.pos.y <= 5.5 + 0.07);
            let horizontal = Vec3::new(p.pos.x, 0.0, p.pos.z).length();
            assert!(horizontal <= 4.8 * 1.05 + 0.13);
        }
    }

    #[test]
    fn test_interaction_scale_spreads_tree() {
        let tree = tree(0.1);
        let spread = |scale: f32| {
            let mut out = ParticleBuffers::new();
            tree.sample(10.0, scale, &mut out);
            out.layer(Layer::Cubes)
                .iter()
                .map(|p| Vec3::new(p.pos.x, 0.0, p.pos.z).length())
                .sum::<f32>()
        };
        let relaxed = spread(1.0);
        assert!((spread(0.65) - relaxed * 0.65).abs() < relaxed * 1e-4);
        assert!((spread(1.35) - relaxed * 1.35).abs() < relaxed * 1e-4);
    }

    #[test]
    fn test_sample_motion_at_known_time() {
        // Leaf y-sway peaks here; ornament and ribbon phases are chosen to
        // land on their own extremes
        let t = FRAC_PI_2 / 0.3;
        let ornament = |phase: f32| Ornament {
            pos: Vec3::new(1.0, 1.0, 0.0),
            color: Vec3::ONE,
            phase,
        };
        let tree = MagicTree {
            leaves: vec![Leaf {
                pos: Vec3::new(1.0, 2.0, 3.0),
                scale: 0.1,
                color: Vec3::ONE,
                phase: 0.0,
            }],
            cubes: vec![ornament(FRAC_PI_2 - t * 1.8)],
            icosahedra: vec![ornament(-FRAC_PI_2 - t * 1.8)],
            ribbon: vec![
                RibbonBead {
                    pos: Vec3::X,
                    phase: FRAC_PI_2 - t * 7.0,
                },
                RibbonBead {
                    pos: Vec3::X,
                    phase: -FRAC_PI_2 - t * 7.0,
                },
            ],
            bloom_secs: 3.2,
        };

        let mut out = ParticleBuffers::new();
        tree.sample(t, 1.0, &mut out);
        let close = |a: f32, b: f32| (a - b).abs() < 1e-4;

        assert!(close(out.layer(Layer::Leaves)[0].pos.y, 2.06));
        assert!(close(out.layer(Layer::Cubes)[0].pos.y, 1.12));
        assert!(close(out.layer(Layer::Icosahedra)[0].pos.y, 0.88));
        let ribbon = out.layer(Layer::Ribbon);
        assert!(close(ribbon[0].scale, RIBBON_SIZE * 1.35));
        assert!(close(ribbon[1].scale, RIBBON_SIZE * 0.65));
    }

    #[test]
    fn test_same_seed_same_tree() {
        let a = tree(0.1);
        let b = tree(0.1);
        let (mut oa, mut ob) = (ParticleBuffers::new(), ParticleBuffers::new());
        a.sample(1.0, 1.0, &mut oa);
        b.sample(1.0, 1.0, &mut ob);
        assert_eq!(oa.layer(Layer::Leaves), ob.layer(Layer::Leaves));
    }
}

//! Per-frame particle output shared by all animators

use glam::{EulerRot, Quat, Vec3};

/// One rendered particle for a single frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleInstance {
    pub pos: Vec3,
    pub scale: f32,
    pub rotation: Quat,
    /// Linear RGB
    pub color: Vec3,
}

impl ParticleInstance {
    /// Build from an XYZ Euler rotation (radians)
    #[inline]
    pub fn new(pos: Vec3, scale: f32, euler: Vec3, color: Vec3) -> Self {
        Self {
            pos,
            scale,
            rotation: Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z),
            color,
        }
    }
}

/// Render layers, one instanced draw each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Leaves,
    Cubes,
    Icosahedra,
    Ribbon,
    Wish,
    Burst,
}

impl Layer {
    pub const COUNT: usize = 6;
    pub const ALL: [Layer; Layer::COUNT] = [
        Layer::Leaves,
        Layer::Cubes,
        Layer::Icosahedra,
        Layer::Ribbon,
        Layer::Wish,
        Layer::Burst,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Reusable per-layer instance lists (cleared, not reallocated, each frame)
#[derive(Debug, Default)]
pub struct ParticleBuffers {
    layers: [Vec<ParticleInstance>; Layer::COUNT],
}

impl ParticleBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        for layer in &mut self.layers {
            layer.clear();
        }
    }

    pub fn layer(&self, layer: Layer) -> &[ParticleInstance] {
        &self.layers[layer.index()]
    }

    pub fn layer_mut(&mut self, layer: Layer) -> &mut Vec<ParticleInstance> {
        &mut self.layers[layer.index()]
    }

    /// Total instances across all layers
    pub fn total(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_indices_are_dense() {
        for (i, layer) in Layer::ALL.iter().enumerate() {
            assert_eq!(layer.index(), i);
        }
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut buffers = ParticleBuffers::new();
        let p = ParticleInstance::new(Vec3::ZERO, 1.0, Vec3::ZERO, Vec3::ONE);
        buffers.layer_mut(Layer::Wish).extend([p; 10]);
        buffers.layer_mut(Layer::Burst).push(p);
        assert_eq!(buffers.total(), 11);

        buffers.clear();
        assert_eq!(buffers.total(), 0);
        assert!(buffers.layer_mut(Layer::Wish).capacity() >= 10);
    }
}

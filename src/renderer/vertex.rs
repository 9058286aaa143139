//! Vertex and instance types for instanced 3D rendering

use bytemuck::{Pod, Zeroable};

use crate::sim::ParticleInstance;

/// Mesh vertex with a flat face normal
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Per-instance data (must match particles.wgsl)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    /// xyz = position, w = uniform scale
    pub offset_scale: [f32; 4],
    /// Quaternion (x, y, z, w)
    pub rotation: [f32; 4],
    /// rgb = linear color, a = glow
    pub color: [f32; 4],
}

impl InstanceRaw {
    pub fn new(p: &ParticleInstance, glow: f32) -> Self {
        Self {
            offset_scale: [p.pos.x, p.pos.y, p.pos.z, p.scale],
            rotation: p.rotation.to_array(),
            color: [p.color.x, p.color.y, p.color.z, glow],
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn test_layout_sizes() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 48);
    }

    #[test]
    fn test_instance_packing() {
        let p = ParticleInstance {
            pos: Vec3::new(1.0, 2.0, 3.0),
            scale: 0.5,
            rotation: Quat::IDENTITY,
            color: Vec3::new(0.1, 0.2, 0.3),
        };
        let raw = InstanceRaw::new(&p, 7.0);
        assert_eq!(raw.offset_scale, [1.0, 2.0, 3.0, 0.5]);
        assert_eq!(raw.rotation, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(raw.color, [0.1, 0.2, 0.3, 7.0]);
    }
}

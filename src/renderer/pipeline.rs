//! WebGPU scene pipeline
//!
//! One render pass per frame: the fullscreen backdrop, then one instanced
//! draw per particle layer, blended additively.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use super::camera::OrbitCamera;
use super::shapes;
use super::vertex::{InstanceRaw, Vertex};
use crate::error::Result;
use crate::sim::{Layer, ParticleBuffers};

/// Instance capacity each layer starts with; buffers grow on demand
const INITIAL_CAPACITY: usize = 1024;

// ============================================================================
// GPU DATA STRUCTURES (must match shaders)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4], // offset 0
    model: [[f32; 4]; 4],     // offset 64
    resolution: [f32; 2],     // offset 128
    time: f32,                // offset 136
    grain: f32,               // offset 140
}

/// Glow multiplier per layer
pub fn layer_glow(layer: Layer) -> f32 {
    match layer {
        Layer::Leaves => 0.65,
        Layer::Cubes => 0.8,
        Layer::Icosahedra => 0.9,
        Layer::Ribbon => 3.5,
        Layer::Wish => 4.0,
        Layer::Burst => 6.0,
    }
}

/// Next buffer capacity that holds `needed` instances
fn grown_capacity(current: usize, needed: usize) -> usize {
    if needed <= current {
        current
    } else {
        needed.next_power_of_two()
    }
}

struct LayerMesh {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    instance_buffer: wgpu::Buffer,
    capacity: usize,
    instance_count: u32,
}

fn create_instance_buffer(device: &wgpu::Device, layer: Layer, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(&format!("{:?}_instances", layer)),
        size: (std::mem::size_of::<InstanceRaw>() * capacity) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

// ============================================================================
// SCENE RENDER STATE
// ============================================================================

pub struct SceneRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    backdrop_pipeline: wgpu::RenderPipeline,
    particle_pipeline: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    layers: Vec<LayerMesh>,
    /// Reused upload scratch
    staging: Vec<InstanceRaw>,
    pub size: (u32, u32),
}

impl SceneRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("wishing-tree-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let backdrop_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("backdrop_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("backdrop.wgsl").into()),
        });
        let particle_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("particle_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("particles.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                model: Mat4::IDENTITY.to_cols_array_2d(),
                resolution: [width as f32, height as f32],
                time: 0.0,
                grain: 0.0,
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let backdrop_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("backdrop_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &backdrop_shader,
                entry_point: Some("vs_main"),
                buffers: &[], // No vertex buffers - fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &backdrop_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let additive = wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        };

        let particle_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("particle_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &particle_shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc(), InstanceRaw::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &particle_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState {
                        color: additive,
                        alpha: additive,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let layers = Layer::ALL
            .iter()
            .map(|&layer| {
                let mesh = shapes::mesh_for(layer);
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?}_mesh", layer)),
                    contents: bytemuck::cast_slice(&mesh),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                LayerMesh {
                    vertex_buffer,
                    vertex_count: mesh.len() as u32,
                    instance_buffer: create_instance_buffer(&device, layer, INITIAL_CAPACITY),
                    capacity: INITIAL_CAPACITY,
                    instance_count: 0,
                }
            })
            .collect();

        log::info!("Scene pipelines created");

        Ok(Self {
            surface,
            device,
            queue,
            config,
            backdrop_pipeline,
            particle_pipeline,
            globals_buffer,
            bind_group,
            layers,
            staging: Vec::with_capacity(INITIAL_CAPACITY),
            size: (width, height),
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Upload this frame's instances, growing layer buffers when needed
    fn upload(&mut self, particles: &ParticleBuffers) {
        for layer in Layer::ALL {
            let instances = particles.layer(layer);
            let glow = layer_glow(layer);
            let mesh = &mut self.layers[layer.index()];

            let capacity = grown_capacity(mesh.capacity, instances.len());
            if capacity != mesh.capacity {
                log::debug!("Growing {:?} instance buffer to {}", layer, capacity);
                mesh.instance_buffer = create_instance_buffer(&self.device, layer, capacity);
                mesh.capacity = capacity;
            }

            mesh.instance_count = instances.len() as u32;
            if instances.is_empty() {
                continue;
            }

            self.staging.clear();
            self.staging
                .extend(instances.iter().map(|p| InstanceRaw::new(p, glow)));
            self.queue.write_buffer(
                &mesh.instance_buffer,
                0,
                bytemuck::cast_slice(&self.staging),
            );
        }
    }

    /// Update GPU buffers from the frame's particles and render.
    /// `rotation_y` spins the whole scene group; `time` is in seconds.
    pub fn render(
        &mut self,
        particles: &ParticleBuffers,
        camera: &OrbitCamera,
        rotation_y: f32,
        time: f32,
        grain: bool,
    ) -> std::result::Result<(), wgpu::SurfaceError> {
        let (w, h) = self.size;
        let globals = Globals {
            view_proj: camera.view_proj(w as f32 / h.max(1) as f32).to_cols_array_2d(),
            model: Mat4::from_rotation_y(rotation_y).to_cols_array_2d(),
            resolution: [w as f32, h as f32],
            time,
            grain: if grain { 1.0 } else { 0.0 },
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        self.upload(particles);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_bind_group(0, &self.bind_group, &[]);

            render_pass.set_pipeline(&self.backdrop_pipeline);
            render_pass.draw(0..3, 0..1);

            render_pass.set_pipeline(&self.particle_pipeline);
            for mesh in self.layers.iter().filter(|m| m.instance_count > 0) {
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, mesh.instance_buffer.slice(..));
                render_pass.draw(0..mesh.vertex_count, 0..mesh.instance_count);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_globals_layout() {
        assert_eq!(std::mem::size_of::<Globals>(), 144);
    }

    #[test]
    fn test_grown_capacity() {
        assert_eq!(grown_capacity(1024, 0), 1024);
        assert_eq!(grown_capacity(1024, 1024), 1024);
        assert_eq!(grown_capacity(1024, 1025), 2048);
        assert_eq!(grown_capacity(1024, 12_000), 16_384);
    }

    #[test]
    fn test_burst_glows_brightest() {
        let brightest = Layer::ALL
            .iter()
            .copied()
            .max_by(|a, b| layer_glow(*a).total_cmp(&layer_glow(*b)));
        assert_eq!(brightest, Some(Layer::Burst));
        assert!(layer_glow(Layer::Leaves) < layer_glow(Layer::Ribbon));
    }
}

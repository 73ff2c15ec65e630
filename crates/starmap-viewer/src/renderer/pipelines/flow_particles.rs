use super::{ADDITIVE, QUAD_CORNERS};
use crate::data::types::FlowUniforms;
use starmap::flow::FlowSprite;
use std::mem::{offset_of, size_of};
use wgpu::util::DeviceExt;

const INITIAL_CAPACITY: usize = 16 * 1024;

/// Sprites for the flow-field visualiser, rewritten every frame.
pub struct FlowParticlesPipeline {
    pipeline: wgpu::RenderPipeline,
    ubo: wgpu::Buffer,
    bind: wgpu::BindGroup,
    quad_vb: wgpu::Buffer,
    sprites_vb: wgpu::Buffer,
    capacity: usize,
    len: u32,
}

fn sprites_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Flow Sprites VB"),
        size: (capacity * size_of::<FlowSprite>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

impl FlowParticlesPipeline {
    pub fn new(device: &wgpu::Device, color_fmt: wgpu::TextureFormat) -> Self {
        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Flow UBO"),
            size: size_of::<FlowUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Flow UBO Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(size_of::<FlowUniforms>() as u64),
                },
                count: None,
            }],
        });

        let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Flow BindGroup"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shaders/flow_particles.wgsl"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../../../shaders/flow_particles.wgsl").into(),
            ),
        });

        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Flow Quad VB"),
            contents: bytemuck::cast_slice(&QUAD_CORNERS),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let vbuf_layouts = [
            wgpu::VertexBufferLayout {
                array_stride: size_of::<[f32; 2]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    shader_location: 0,
                    offset: 0,
                    format: wgpu::VertexFormat::Float32x2,
                }],
            },
            wgpu::VertexBufferLayout {
                array_stride: size_of::<FlowSprite>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[
                    wgpu::VertexAttribute {
                        shader_location: 1,
                        offset: offset_of!(FlowSprite, pos_ndc) as u64,
                        format: wgpu::VertexFormat::Float32x2,
                    },
                    wgpu::VertexAttribute {
                        shader_location: 2,
                        offset: offset_of!(FlowSprite, alpha) as u64,
                        format: wgpu::VertexFormat::Float32,
                    },
                    wgpu::VertexAttribute {
                        shader_location: 3,
                        offset: offset_of!(FlowSprite, size_px) as u64,
                        format: wgpu::VertexFormat::Float32,
                    },
                ],
            },
        ];

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Flow Particles PipelineLayout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Flow Particles Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &vbuf_layouts,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_fmt,
                    blend: Some(ADDITIVE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Self {
            pipeline,
            ubo,
            bind,
            quad_vb,
            sprites_vb: sprites_buffer(device, INITIAL_CAPACITY),
            capacity: INITIAL_CAPACITY,
            len: 0,
        }
    }

    /// Uploads this frame's sprites, growing the buffer when needed.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        uniforms: &FlowUniforms,
        sprites: &[FlowSprite],
    ) {
        if sprites.len() > self.capacity {
            self.capacity = sprites.len().next_power_of_two();
            self.sprites_vb = sprites_buffer(device, self.capacity);
            log::debug!("Flow sprite buffer grown to {} sprites.", self.capacity);
        }
        queue.write_buffer(&self.ubo, 0, bytemuck::bytes_of(uniforms));
        if !sprites.is_empty() {
            queue.write_buffer(&self.sprites_vb, 0, bytemuck::cast_slice(sprites));
        }
        self.len = sprites.len() as u32;
    }

    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        if self.len == 0 {
            return;
        }
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind, &[]);
        rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
        rpass.set_vertex_buffer(1, self.sprites_vb.slice(..));
        rpass.draw(0..6, 0..self.len);
    }
}

use super::{ADDITIVE, QUAD_CORNERS};
use crate::data::types::StarCloudGpu;
use starmap::{FrameUniforms, StarInstance};
use std::mem::{offset_of, size_of};
use wgpu::util::DeviceExt;

/// Instanced point program: one quad per star, four layout positions per
/// instance blended in the vertex stage.
pub struct StarPointsPipeline {
    pipeline: wgpu::RenderPipeline,
    frame_ubo: wgpu::Buffer,
    frame_bind: wgpu::BindGroup,
    quad_vb: wgpu::Buffer,
}

/// Instance attributes at shader locations 1..=8.
fn instance_attributes() -> [wgpu::VertexAttribute; 8] {
    let pos = offset_of!(StarInstance, positions) as u64;
    let vec2 = size_of::<[f32; 2]>() as u64;
    let attr = |shader_location, offset, format| wgpu::VertexAttribute {
        shader_location,
        offset,
        format,
    };
    [
        attr(1, pos, wgpu::VertexFormat::Float32x2),
        attr(2, pos + vec2, wgpu::VertexFormat::Float32x2),
        attr(3, pos + 2 * vec2, wgpu::VertexFormat::Float32x2),
        attr(4, pos + 3 * vec2, wgpu::VertexFormat::Float32x2),
        attr(
            5,
            offset_of!(StarInstance, color_natural) as u64,
            wgpu::VertexFormat::Float32x3,
        ),
        attr(
            6,
            offset_of!(StarInstance, color_observer) as u64,
            wgpu::VertexFormat::Float32x3,
        ),
        attr(
            7,
            offset_of!(StarInstance, sizes) as u64,
            wgpu::VertexFormat::Float32x3,
        ),
        attr(
            8,
            offset_of!(StarInstance, alpha) as u64,
            wgpu::VertexFormat::Float32,
        ),
    ]
}

impl StarPointsPipeline {
    pub fn new(device: &wgpu::Device, color_fmt: wgpu::TextureFormat) -> Self {
        let frame_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Star Frame UBO"),
            size: size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Star Frame UBO Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(size_of::<FrameUniforms>() as u64),
                },
                count: None,
            }],
        });

        let frame_bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Star Frame BindGroup"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_ubo.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shaders/star_points.wgsl"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../../../shaders/star_points.wgsl").into(),
            ),
        });

        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Star Quad VB"),
            contents: bytemuck::cast_slice(&QUAD_CORNERS),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let instance_attrs = instance_attributes();
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
                array_stride: size_of::<StarInstance>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &instance_attrs,
            },
        ];

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Star Points PipelineLayout"),
            bind_group_layouts: &[&frame_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Star Points Pipeline"),
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
            frame_ubo,
            frame_bind,
            quad_vb,
        }
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue, uniforms: &FrameUniforms) {
        queue.write_buffer(&self.frame_ubo, 0, bytemuck::bytes_of(uniforms));
    }

    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>, cloud: &'a StarCloudGpu) {
        if cloud.instances_len == 0 {
            return;
        }
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.frame_bind, &[]);
        rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
        rpass.set_vertex_buffer(1, cloud.vtx.slice(..));
        rpass.draw(0..6, 0..cloud.instances_len);
    }
}

//! GPU resource handles and the small uniform blocks owned by the viewer.

/// Uniforms of `flow_particles.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FlowUniforms {
    /// Physical pixels.
    pub viewport_px: [f32; 2],
    pub device_pixel_ratio: f32,
    pub _pad0: f32,
}

const _: [(); 16] = [(); std::mem::size_of::<FlowUniforms>()];

impl FlowUniforms {
    pub fn new(viewport_px: [f32; 2], device_pixel_ratio: f32) -> Self {
        Self {
            viewport_px: [viewport_px[0].max(1.0), viewport_px[1].max(1.0)],
            device_pixel_ratio: device_pixel_ratio.max(f32::EPSILON),
            _pad0: 0.0,
        }
    }
}

/// The uploaded star catalogue. Written once per dataset; resizes and
/// transitions never touch it.
#[derive(Debug)]
pub struct StarCloudGpu {
    pub instances_len: u32,
    /// Vertex buffer of `starmap::StarInstance`.
    pub vtx: wgpu::Buffer,
}

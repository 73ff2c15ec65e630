use crate::data::types::StarCloudGpu;
use starmap::RenderBuffers;
use wgpu::util::DeviceExt;

/// Packs the render buffers into one instance buffer and uploads it.
///
/// Returns `None` for an empty catalogue; the draw is skipped in that case.
pub fn upload_star_cloud(device: &wgpu::Device, buffers: &RenderBuffers) -> Option<StarCloudGpu> {
    if buffers.is_empty() {
        log::warn!("No points to upload; star pass disabled.");
        return None;
    }

    let instances = buffers.instances();
    let vtx = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Star Instances"),
        contents: bytemuck::cast_slice(&instances),
        usage: wgpu::BufferUsages::VERTEX,
    });

    log::debug!(
        "Uploaded {} star instances ({} KiB).",
        instances.len(),
        std::mem::size_of_val(instances.as_slice()) / 1024
    );

    Some(StarCloudGpu {
        instances_len: instances.len() as u32,
        vtx,
    })
}

//! Owns the GPU context, the point programs and the egui renderer.

pub mod context;
pub mod pipelines;

use self::{
    context::GfxContext,
    pipelines::{flow_particles::FlowParticlesPipeline, star_points::StarPointsPipeline},
};
use crate::data::types::StarCloudGpu;
use std::sync::Arc;
use winit::window::Window;

/// Near-black, so additive points read as light on the night sky.
const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.004,
    g: 0.006,
    b: 0.016,
    a: 1.0,
};

/// What the scene pass draws this frame.
pub enum Scene<'a> {
    Stars(Option<&'a StarCloudGpu>),
    Flow,
}

pub struct Renderer {
    pub gfx: GfxContext,
    pub stars: StarPointsPipeline,
    pub flow: FlowParticlesPipeline,
    pub egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let gfx = GfxContext::new(window).await?;
        let fmt = gfx.config.format;

        let stars = StarPointsPipeline::new(&gfx.device, fmt);
        let flow = FlowParticlesPipeline::new(&gfx.device, fmt);
        let egui_renderer = egui_wgpu::Renderer::new(&gfx.device, fmt, None, 1);

        Ok(Self {
            gfx,
            stars,
            flow,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.gfx.resize(new_size);
    }

    /// Clears the frame and draws the scene. Uniforms must already be written.
    pub fn render_scene(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView, scene: Scene<'_>) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        match scene {
            Scene::Stars(Some(cloud)) => self.stars.draw(&mut pass, cloud),
            Scene::Stars(None) => {}
            Scene::Flow => self.flow.draw(&mut pass),
        }
    }
}

use crate::{
    camera::PointerInput,
    config::{Config, Visualiser},
    data::{star_cloud::upload_star_cloud, types::StarCloudGpu, FlowUniforms},
    renderer::{Renderer, Scene},
    ui,
};
use anyhow::Result;
use glam::Vec2;
use starmap::flow::{FlowField, FlowParams};
use starmap::loader::{load, Dataset, Provenance};
use starmap::{AnimationState, ControlMode, LayoutKind, PhaseSchedule, RenderBuffers};
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

/// Resizes are applied once the window has been still this long.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);
/// Manual transition step of one arrow-key press.
pub const NUDGE_STEP: f32 = 0.05;
/// Weight of the newest frame in the smoothed fps readout.
const FPS_SMOOTHING: f32 = 0.05;

/// A user request from the keyboard or the controls window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    TogglePlay,
    TriggerTransition,
    Nudge(f32),
    SetManualValue(f32),
    SetTarget(LayoutKind),
    SetMode(ControlMode),
    CycleMode,
    ToggleObserverColors,
    ResetCamera,
    ToggleControls,
    Reload,
}

impl Action {
    /// Applies the action to the animation state. Returns `false` for the
    /// actions the app itself has to handle.
    pub fn apply_to(self, state: &mut AnimationState) -> bool {
        match self {
            Action::TogglePlay => state.toggle_play(),
            Action::TriggerTransition => state.trigger_transition(),
            Action::Nudge(d) => state.nudge_manual_value(d),
            Action::SetManualValue(v) => state.set_manual_value(v),
            Action::SetTarget(kind) => state.set_manual_target(kind),
            Action::SetMode(mode) => state.set_mode(mode),
            Action::CycleMode => state.cycle_mode(),
            Action::ToggleObserverColors => state.toggle_observer_colors(),
            Action::ResetCamera => state.reset_camera(),
            Action::ToggleControls | Action::Reload => return false,
        }
        true
    }
}

/// Keyboard bindings. Space plays/pauses a demo and animates the manual
/// transition when interactive.
pub fn action_for_key(key: KeyCode, mode: ControlMode) -> Option<Action> {
    let action = match key {
        KeyCode::Space if mode == ControlMode::Interactive => Action::TriggerTransition,
        KeyCode::Space => Action::TogglePlay,
        KeyCode::ArrowLeft => Action::Nudge(-NUDGE_STEP),
        KeyCode::ArrowRight => Action::Nudge(NUDGE_STEP),
        KeyCode::Digit1 => Action::SetTarget(LayoutKind::Sky),
        KeyCode::Digit2 => Action::SetTarget(LayoutKind::Scatter),
        KeyCode::Digit3 => Action::SetTarget(LayoutKind::Galactic),
        KeyCode::Digit4 => Action::SetTarget(LayoutKind::Histogram),
        KeyCode::KeyM => Action::CycleMode,
        KeyCode::KeyO => Action::ToggleObserverColors,
        KeyCode::KeyH => Action::ToggleControls,
        KeyCode::KeyR => Action::ResetCamera,
        KeyCode::KeyL => Action::Reload,
        _ => return None,
    };
    Some(action)
}

/// Holds the latest requested size until the window stops changing.
#[derive(Debug, Default)]
pub struct ResizeDebounce {
    pending: Option<(PhysicalSize<u32>, Instant)>,
}

impl ResizeDebounce {
    pub fn request(&mut self, size: PhysicalSize<u32>, now: Instant) {
        self.pending = Some((size, now));
    }

    /// The pending size, once it has been stable for [`RESIZE_DEBOUNCE`].
    pub fn take_due(&mut self, now: Instant) -> Option<PhysicalSize<u32>> {
        match self.pending {
            Some((size, at)) if now.duration_since(at) >= RESIZE_DEBOUNCE => {
                self.pending = None;
                Some(size)
            }
            _ => None,
        }
    }

    /// The pending size regardless of age.
    pub fn take_now(&mut self) -> Option<PhysicalSize<u32>> {
        self.pending.take().map(|(size, _)| size)
    }
}

fn viewport_of(size: PhysicalSize<u32>) -> Vec2 {
    Vec2::new(size.width.max(1) as f32, size.height.max(1) as f32)
}

/// Loads and resolves the configured catalogue. Never fails on an
/// unavailable source; only a malformed `--source` is an error.
pub fn load_dataset(config: &Config) -> Result<Dataset> {
    let source = config.data_source()?;
    let started = Instant::now();
    let dataset = load(&source, &config.load_options());
    log::debug!("Dataset load took {:.2?}.", started.elapsed());
    Ok(dataset)
}

pub struct App {
    pub config: Config,
    /// `None` when the GPU could not be initialised; the loop keeps running.
    pub renderer: Option<Renderer>,
    render_error: Option<String>,
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    pointer: PointerInput,
    pub animation: AnimationState,
    pub dataset: Dataset,
    stars: Option<StarCloudGpu>,
    flow: Option<FlowField>,
    resize: ResizeDebounce,
    size: PhysicalSize<u32>,
    show_controls: bool,
    started: Instant,
    last_frame: Instant,
    fps: f32,
}

impl App {
    pub async fn new(window: Arc<Window>, config: Config) -> Result<Self> {
        let size = window.inner_size();

        let (renderer, render_error) = match Renderer::new(window.clone()).await {
            Ok(r) => (Some(r), None),
            Err(e) => {
                log::error!("GPU unavailable, nothing will be drawn: {e:#}");
                (None, Some(format!("GPU unavailable: {e}")))
            }
        };

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        let viewport = viewport_of(size);
        let (dataset, flow) = match config.visualiser {
            Visualiser::Flow => {
                let field = FlowField::new(config.particles, viewport, FlowParams::default(), config.seed);
                let ds = Dataset::from_records(&[], Provenance::Source("curl-noise field".into()));
                (ds, Some(field))
            }
            Visualiser::Stellar | Visualiser::Exoplanet => (load_dataset(&config)?, None),
        };

        let schedule = PhaseSchedule::tour(&[], config.device_class.into());
        let animation = AnimationState::new(schedule, config.mode.into(), viewport);

        let mut app = Self {
            renderer,
            render_error,
            egui_ctx,
            egui_state,
            pointer: PointerInput::new(),
            animation,
            dataset,
            stars: None,
            flow,
            resize: ResizeDebounce::default(),
            size,
            show_controls: true,
            started: Instant::now(),
            last_frame: Instant::now(),
            fps: 0.0,
            config,
        };
        app.upload_dataset();
        Ok(app)
    }

    /// Projects the dataset and uploads it. The only write to the point buffer.
    fn upload_dataset(&mut self) {
        if self.flow.is_some() {
            return;
        }
        let buffers = RenderBuffers::from_dataset(&self.dataset.points, &self.config.layout_set());
        self.stars = self
            .renderer
            .as_ref()
            .and_then(|r| upload_star_cloud(&r.gfx.device, &buffers));
    }

    /// Blocking reload of the configured source.
    pub fn reload(&mut self) {
        if self.flow.is_some() {
            return;
        }
        match load_dataset(&self.config) {
            Ok(ds) => {
                self.dataset = ds;
                self.upload_dataset();
            }
            Err(e) => log::error!("Reload failed: {e:#}"),
        }
    }

    fn apply_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        if let Some(r) = self.renderer.as_mut() {
            r.resize(new_size);
        }
        let viewport = viewport_of(new_size);
        self.animation.set_viewport(viewport);
        if let Some(flow) = self.flow.as_mut() {
            flow.resize(viewport);
        }
        log::debug!("Resized to {}x{}.", new_size.width, new_size.height);
    }

    /// Applies a pending resize immediately, or reconfigures at the current
    /// size. Used after a lost or outdated surface.
    pub fn resize_now(&mut self) {
        let size = self.resize.take_now().unwrap_or(self.size);
        self.apply_resize(size);
    }

    /// Called once per loop iteration before the redraw request.
    pub fn about_to_wait(&mut self) {
        if let Some(size) = self.resize.take_due(Instant::now()) {
            self.apply_resize(size);
        }
    }

    fn apply(&mut self, action: Action) {
        if action.apply_to(&mut self.animation) {
            return;
        }
        match action {
            Action::ToggleControls => self.show_controls = !self.show_controls,
            Action::Reload => self.reload(),
            _ => {}
        }
    }

    /// Returns `true` when the event was consumed.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        if response.consumed {
            return true;
        }

        match event {
            WindowEvent::Resized(size) => {
                self.resize.request(*size, Instant::now());
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat,
                        ..
                    },
                ..
            } => {
                let repeatable = matches!(key, KeyCode::ArrowLeft | KeyCode::ArrowRight);
                if !*repeat || repeatable {
                    if let Some(action) = action_for_key(*key, self.animation.mode()) {
                        self.apply(action);
                        return true;
                    }
                }
            }
            _ => self.pointer.handle_event(event, &mut self.animation),
        }
        false
    }

    pub fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        if dt > 0.0 {
            self.fps += FPS_SMOOTHING * (1.0 / dt - self.fps);
        }

        let view = self.animation.update(dt);
        if view.playing {
            if let Some(flow) = self.flow.as_mut() {
                flow.step(dt);
            }
        }

        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(());
        };

        let frame = renderer.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let viewport = renderer.gfx.viewport_px();
        let dpr = window.scale_factor() as f32;
        let time_s = self.started.elapsed().as_secs_f32();

        let scene = match self.flow.as_ref() {
            Some(flow) => {
                let sprites = flow.sprites();
                renderer.flow.upload(
                    &renderer.gfx.device,
                    &renderer.gfx.queue,
                    &FlowUniforms::new(viewport, dpr),
                    &sprites,
                );
                Scene::Flow
            }
            None => {
                let uniforms = self.animation.uniforms(viewport, dpr, time_s);
                renderer.stars.write_uniforms(&renderer.gfx.queue, &uniforms);
                Scene::Stars(self.stars.as_ref())
            }
        };

        let mut encoder = renderer
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        renderer.render_scene(&mut encoder, &swap_view, scene);

        // HUD and controls.
        let egui_input = self.egui_state.take_egui_input(window);
        self.egui_ctx.begin_frame(egui_input);

        let phase_name = view
            .phase
            .and_then(|i| self.animation.schedule().phases().get(i))
            .map(|p| p.name.as_str());
        let points = match self.flow.as_ref() {
            Some(flow) => flow.particles().len(),
            None => self.dataset.len(),
        };
        ui::draw_hud(
            &self.egui_ctx,
            &ui::HudInfo {
                title: self.config.title(),
                points,
                provenance: &self.dataset.provenance,
                fps: self.fps,
                phase_name,
                render_error: self.render_error.as_deref(),
            },
            &view,
        );
        let actions = if self.show_controls {
            ui::draw_controls(&self.egui_ctx, &view)
        } else {
            Vec::new()
        };

        let egui_output = self.egui_ctx.end_frame();
        self.egui_state
            .handle_platform_output(window, egui_output.platform_output);
        let shapes = self
            .egui_ctx
            .tessellate(egui_output.shapes, self.egui_ctx.pixels_per_point());

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [renderer.gfx.config.width, renderer.gfx.config.height],
            pixels_per_point: self.egui_ctx.pixels_per_point(),
        };

        for (id, delta) in &egui_output.textures_delta.set {
            renderer
                .egui_renderer
                .update_texture(&renderer.gfx.device, &renderer.gfx.queue, *id, delta);
        }

        let callback_cmds = renderer.egui_renderer.update_buffers(
            &renderer.gfx.device,
            &renderer.gfx.queue,
            &mut encoder,
            &shapes,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("EGUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            renderer
                .egui_renderer
                .render(&mut render_pass, &shapes, &screen_descriptor);
        }

        for id in &egui_output.textures_delta.free {
            renderer.egui_renderer.free_texture(id);
        }

        renderer
            .gfx
            .queue
            .submit(callback_cmds.into_iter().chain(std::iter::once(encoder.finish())));
        frame.present();

        for action in actions {
            self.apply(action);
        }
        Ok(())
    }
}

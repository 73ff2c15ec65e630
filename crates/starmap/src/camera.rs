//! Pan/zoom camera over the canonical [-1, 1]² frame and the pointer-driven
//! interaction controller.

use glam::Vec2;

pub const ZOOM_MIN: f32 = 1.0;
pub const ZOOM_MAX: f32 = 20.0;
/// Zoom factor per wheel line.
pub const WHEEL_ZOOM_STEP: f32 = 1.1;

/// Per-axis scale that fits the canonical square inside a `viewport_px`
/// window: the long axis shrinks so the square stays square on screen.
#[inline]
pub fn aspect_fit(viewport_px: Vec2) -> Vec2 {
    let v = viewport_px.max(Vec2::ONE);
    Vec2::new((v.y / v.x).min(1.0), (v.x / v.y).min(1.0))
}

/// Camera over the canonical projection square.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    /// World-space point at the centre of the view.
    pub pan: Vec2,
    /// Magnification, in [`ZOOM_MIN`, `ZOOM_MAX`].
    pub zoom: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self::REST
    }
}

impl CameraState {
    /// Unzoomed, centred.
    pub const REST: CameraState = CameraState {
        pan: Vec2::ZERO,
        zoom: 1.0,
    };

    /// Largest |pan| per axis that keeps the view inside [-1, 1]².
    #[inline]
    pub fn pan_bound(zoom: f32) -> f32 {
        ((zoom - 1.0) / zoom).max(0.0)
    }

    /// Zoom clamped to its bounds, pan clamped to [`Self::pan_bound`].
    pub fn clamped(self) -> Self {
        let zoom = if self.zoom.is_finite() {
            self.zoom.clamp(ZOOM_MIN, ZOOM_MAX)
        } else {
            ZOOM_MIN
        };
        let bound = Self::pan_bound(zoom);
        let pan = if self.pan.is_finite() {
            self.pan.clamp(Vec2::splat(-bound), Vec2::splat(bound))
        } else {
            Vec2::ZERO
        };
        Self { pan, zoom }
    }

    /// World (canonical NDC) to view NDC.
    #[inline]
    pub fn world_to_view(&self, p: Vec2) -> Vec2 {
        (p - self.pan) * self.zoom
    }

    #[inline]
    pub fn view_to_world(&self, v: Vec2) -> Vec2 {
        v / self.zoom + self.pan
    }

    /// Multiplies zoom by `factor`, keeping the world point under `anchor_view`
    /// fixed on screen where the bounds allow.
    pub fn zoom_about(self, factor: f32, anchor_view: Vec2) -> Self {
        let world = self.view_to_world(anchor_view);
        let zoom = (self.zoom * factor).clamp(ZOOM_MIN, ZOOM_MAX);
        Self {
            pan: world - anchor_view / zoom,
            zoom,
        }
        .clamped()
    }
}

/// Who drives the camera and the transition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControlMode {
    /// User drives the camera and the manual transition.
    Interactive,
    /// The phase schedule drives everything; input is ignored.
    #[default]
    ScriptedDemo,
    /// Frozen first layout, no input, no animation.
    StaticPreview,
}

impl ControlMode {
    pub fn accepts_input(self) -> bool {
        matches!(self, ControlMode::Interactive)
    }

    pub fn next(self) -> Self {
        match self {
            ControlMode::Interactive => ControlMode::ScriptedDemo,
            ControlMode::ScriptedDemo => ControlMode::StaticPreview,
            ControlMode::StaticPreview => ControlMode::Interactive,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ControlMode::Interactive => "interactive",
            ControlMode::ScriptedDemo => "demo",
            ControlMode::StaticPreview => "preview",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DragState {
    Idle,
    Dragging {
        /// Pointer position at pointer-down, physical pixels.
        anchor_px: Vec2,
        pan_at_anchor: Vec2,
    },
}

/// Translates pointer input into camera changes. Every handler is a no-op
/// unless the mode is [`ControlMode::Interactive`].
#[derive(Clone, Debug)]
pub struct InteractionController {
    mode: ControlMode,
    drag: DragState,
    viewport_px: Vec2,
}

impl InteractionController {
    pub fn new(mode: ControlMode, viewport_px: Vec2) -> Self {
        Self {
            mode,
            drag: DragState::Idle,
            viewport_px: viewport_px.max(Vec2::ONE),
        }
    }

    #[inline]
    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    #[inline]
    pub fn drag(&self) -> DragState {
        self.drag
    }

    /// Switching mode always cancels an active drag.
    pub fn set_mode(&mut self, mode: ControlMode) {
        if mode != self.mode {
            log::debug!("control mode {} -> {}", self.mode.label(), mode.label());
        }
        self.mode = mode;
        self.drag = DragState::Idle;
    }

    pub fn set_viewport(&mut self, viewport_px: Vec2) {
        self.viewport_px = viewport_px.max(Vec2::ONE);
    }

    /// Pixel position (y down) to view NDC (y up), undoing the aspect fit
    /// the point program applies after the camera.
    pub fn px_to_view(&self, px: Vec2) -> Vec2 {
        let half = self.viewport_px * 0.5;
        let clip = Vec2::new((px.x - half.x) / half.x, (half.y - px.y) / half.y);
        clip / aspect_fit(self.viewport_px)
    }

    /// Pixel delta to view NDC delta.
    fn px_delta_to_view(&self, d: Vec2) -> Vec2 {
        let clip = Vec2::new(2.0 * d.x / self.viewport_px.x, -2.0 * d.y / self.viewport_px.y);
        clip / aspect_fit(self.viewport_px)
    }

    pub fn pointer_down(&mut self, pos_px: Vec2, camera: &CameraState) {
        if !self.mode.accepts_input() {
            return;
        }
        self.drag = DragState::Dragging {
            anchor_px: pos_px,
            pan_at_anchor: camera.pan,
        };
    }

    /// Pans by the pointer delta since pointer-down, scaled by 1/zoom.
    pub fn pointer_move(&mut self, pos_px: Vec2, camera: &mut CameraState) {
        if !self.mode.accepts_input() {
            return;
        }
        if let DragState::Dragging {
            anchor_px,
            pan_at_anchor,
        } = self.drag
        {
            let delta = self.px_delta_to_view(pos_px - anchor_px);
            camera.pan = pan_at_anchor - delta / camera.zoom;
            *camera = camera.clamped();
        }
    }

    pub fn pointer_up(&mut self) {
        self.drag = DragState::Idle;
    }

    pub fn pointer_leave(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Zooms by [`WHEEL_ZOOM_STEP`] per line about the cursor.
    pub fn wheel(&mut self, lines: f32, cursor_px: Vec2, camera: &mut CameraState) {
        if !self.mode.accepts_input() || !lines.is_finite() {
            return;
        }
        self.zoom_by(WHEEL_ZOOM_STEP.powf(lines), cursor_px, camera);
    }

    /// Multiplicative pinch zoom about the gesture centre.
    pub fn pinch(&mut self, scale: f32, centre_px: Vec2, camera: &mut CameraState) {
        if !self.mode.accepts_input() || !(scale.is_finite() && scale > 0.0) {
            return;
        }
        self.zoom_by(scale, centre_px, camera);
    }

    fn zoom_by(&mut self, factor: f32, at_px: Vec2, camera: &mut CameraState) {
        let anchor = self.px_to_view(at_px);
        *camera = camera.zoom_about(factor, anchor);
        // Re-anchor an active drag at the new zoom.
        if let DragState::Dragging {
            anchor_px,
            pan_at_anchor,
        } = &mut self.drag
        {
            *anchor_px = at_px;
            *pan_at_anchor = camera.pan;
        }
    }
}

//! The single owned per-frame state of a visualiser.
//!
//! [`AnimationState::update`] is the only per-frame writer. UI code reads the
//! returned [`FrameView`] and changes state only through the entry points
//! (`play`, `set_manual_value`, pointer forwarding, ...).

use crate::camera::{CameraState, ControlMode, InteractionController};
use crate::easing::Easing;
use crate::frame::FrameUniforms;
use crate::layout::LayoutKind;
use crate::scheduler::PhaseSchedule;
use crate::transition::TransitionState;
use glam::Vec2;

/// Duration of a triggered manual transition, seconds.
pub const MANUAL_TRANSITION_S: f32 = 1.2;
/// Sky layout rotation while playing, NDC units per second.
pub const SKY_ROTATION_SPEED: f32 = 0.02;
/// Galactic layout scroll while playing, NDC units per second.
pub const GALACTIC_SCROLL_SPEED: f32 = 0.012;
/// Longest frame step applied at once; larger gaps (a stalled window) are
/// clamped so the scene does not jump.
pub const MAX_FRAME_DT_S: f32 = 0.25;

/// Offsets wrap on this period: the full NDC width.
const SCROLL_PERIOD: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq)]
struct AutoAdvance {
    start_value: f32,
    elapsed_s: f32,
}

/// User-driven transition between two layouts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ManualTransition {
    pub from: LayoutKind,
    pub to: LayoutKind,
    /// Linear progress in [0, 1].
    pub value: f32,
    auto: Option<AutoAdvance>,
}

impl ManualTransition {
    fn settled(kind: LayoutKind) -> Self {
        Self {
            from: kind,
            to: kind,
            value: 0.0,
            auto: None,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.auto.is_some()
    }

    fn state(&self) -> TransitionState {
        TransitionState::between(self.from, self.to, self.value)
    }

    /// Collapses onto whichever end the value is closer to.
    fn settle(&mut self) {
        let kind = if self.value >= 0.5 { self.to } else { self.from };
        *self = Self::settled(kind);
    }

    fn advance(&mut self, dt_s: f32) {
        let Some(mut auto) = self.auto else {
            return;
        };
        auto.elapsed_s += dt_s;
        let p = (auto.elapsed_s / MANUAL_TRANSITION_S).min(1.0);
        self.value = auto.start_value + (1.0 - auto.start_value) * Easing::CubicInOut.apply(p);
        if p >= 1.0 {
            *self = Self::settled(self.to);
        } else {
            self.auto = Some(auto);
        }
    }
}

/// Sky rotation and galactic scroll, wrapped into [0, 2).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Offsets {
    pub sky_rotation: f32,
    pub galactic_scroll: f32,
}

impl Offsets {
    fn advance(&mut self, dt_s: f32) {
        self.sky_rotation = (self.sky_rotation + SKY_ROTATION_SPEED * dt_s).rem_euclid(SCROLL_PERIOD);
        self.galactic_scroll =
            (self.galactic_scroll + GALACTIC_SCROLL_SPEED * dt_s).rem_euclid(SCROLL_PERIOD);
    }
}

/// Read-only snapshot of one frame for UI bindings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameView {
    pub elapsed_s: f32,
    pub playing: bool,
    pub mode: ControlMode,
    pub transition: TransitionState,
    pub camera: CameraState,
    /// Active schedule phase in scripted mode.
    pub phase: Option<usize>,
    pub phase_progress: f32,
    pub manual: ManualTransition,
    pub offsets: Offsets,
    pub observer_colors: bool,
}

impl FrameView {
    pub fn dominant_layout(&self) -> LayoutKind {
        self.transition.effective_weights().dominant()
    }
}

pub struct AnimationState {
    schedule: PhaseSchedule,
    controller: InteractionController,
    elapsed_s: f32,
    playing: bool,
    /// Camera owned by the user; used in interactive mode.
    user_camera: CameraState,
    /// Camera of the last frame, whatever drove it.
    camera: CameraState,
    transition: TransitionState,
    manual: ManualTransition,
    offsets: Offsets,
    observer_colors: bool,
    phase: Option<usize>,
    phase_progress: f32,
}

impl AnimationState {
    pub fn new(schedule: PhaseSchedule, mode: ControlMode, viewport_px: Vec2) -> Self {
        let first = schedule.sample(0.0);
        let mut state = Self {
            controller: InteractionController::new(mode, viewport_px),
            elapsed_s: 0.0,
            playing: mode != ControlMode::StaticPreview,
            user_camera: CameraState::REST,
            camera: CameraState::REST,
            transition: first.transition,
            manual: ManualTransition::settled(first.transition.from.dominant()),
            offsets: Offsets::default(),
            observer_colors: false,
            phase: None,
            phase_progress: 0.0,
            schedule,
        };
        state.update(0.0);
        state
    }

    #[inline]
    pub fn mode(&self) -> ControlMode {
        self.controller.mode()
    }

    #[inline]
    pub fn schedule(&self) -> &PhaseSchedule {
        &self.schedule
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// The first layout of the schedule, shown by the static preview.
    fn first_layout(&self) -> LayoutKind {
        self.schedule
            .phases()
            .first()
            .map(|p| p.from.dominant())
            .unwrap_or(LayoutKind::Sky)
    }

    /// Advances the clock by `dt_s` and recomputes the frame.
    pub fn update(&mut self, dt_s: f32) -> FrameView {
        let dt = if dt_s.is_finite() {
            dt_s.clamp(0.0, MAX_FRAME_DT_S)
        } else {
            0.0
        };
        let mode = self.mode();

        if self.playing && mode != ControlMode::StaticPreview {
            // Kept inside one loop so f32 steps never round away.
            let loop_s = self.schedule.loop_duration();
            self.elapsed_s = if loop_s > 0.0 {
                (self.elapsed_s.rem_euclid(loop_s) + dt).rem_euclid(loop_s)
            } else {
                self.elapsed_s + dt
            };
            self.offsets.advance(dt);
        }

        match mode {
            ControlMode::ScriptedDemo => {
                let sample = self.schedule.sample(self.elapsed_s);
                self.transition = sample.transition;
                self.camera = sample.camera;
                self.phase = Some(sample.index);
                self.phase_progress = sample.progress;
            }
            ControlMode::Interactive => {
                self.manual.advance(dt);
                self.transition = self.manual.state();
                self.camera = self.user_camera;
                self.phase = None;
            }
            ControlMode::StaticPreview => {
                self.transition = TransitionState::settled(self.first_layout());
                self.camera = CameraState::REST;
                self.phase = None;
            }
        }
        self.view()
    }

    pub fn view(&self) -> FrameView {
        FrameView {
            elapsed_s: self.elapsed_s,
            playing: self.playing,
            mode: self.mode(),
            transition: self.transition,
            camera: self.camera,
            phase: self.phase,
            phase_progress: self.phase_progress,
            manual: self.manual,
            offsets: self.offsets,
            observer_colors: self.observer_colors,
        }
    }

    /// Uniform block for the frame last computed by [`Self::update`].
    pub fn uniforms(&self, viewport_px: [f32; 2], device_pixel_ratio: f32, time_s: f32) -> FrameUniforms {
        FrameUniforms::new(&self.transition, &self.camera, viewport_px, device_pixel_ratio)
            .with_color_mix(if self.observer_colors { 1.0 } else { 0.0 })
            .with_scroll(self.offsets.sky_rotation, self.offsets.galactic_scroll)
            .with_time(time_s)
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn toggle_play(&mut self) {
        self.playing = !self.playing;
    }

    pub fn reset_camera(&mut self) {
        self.controller.pointer_up();
        self.user_camera = CameraState::REST;
        if self.mode() == ControlMode::Interactive {
            self.camera = CameraState::REST;
        }
    }

    /// Switches mode. Entering interactive mode picks up the current layouts
    /// and camera so nothing jumps.
    pub fn set_mode(&mut self, mode: ControlMode) {
        let previous = self.mode();
        self.controller.set_mode(mode);
        if mode == previous {
            return;
        }
        match mode {
            ControlMode::Interactive => {
                self.manual = ManualTransition {
                    from: self.transition.from.dominant(),
                    to: self.transition.to.dominant(),
                    value: self.transition.factor,
                    auto: None,
                };
                self.user_camera = self.camera;
            }
            ControlMode::StaticPreview => self.playing = false,
            ControlMode::ScriptedDemo => self.playing = true,
        }
        self.update(0.0);
    }

    pub fn cycle_mode(&mut self) {
        self.set_mode(self.mode().next());
    }

    /// Sets the manual transition progress; cancels an auto-advance.
    pub fn set_manual_value(&mut self, value: f32) {
        if !value.is_finite() {
            return;
        }
        self.manual.auto = None;
        self.manual.value = value.clamp(0.0, 1.0);
    }

    pub fn nudge_manual_value(&mut self, delta: f32) {
        self.set_manual_value(self.manual.value + delta);
    }

    /// Aims the manual transition at `kind`, starting from the layout that
    /// currently dominates.
    pub fn set_manual_target(&mut self, kind: LayoutKind) {
        self.manual.settle();
        if self.manual.from != kind {
            self.manual.to = kind;
        }
    }

    /// Animates the manual transition to its target, then settles there.
    /// With no distinct target, the next layout in order is used. Interactive
    /// mode only.
    pub fn trigger_transition(&mut self) {
        if self.mode() != ControlMode::Interactive || self.manual.is_animating() {
            return;
        }
        if self.manual.value >= 1.0 {
            self.manual.settle();
        }
        if self.manual.from == self.manual.to {
            self.manual.to = self.manual.from.next();
        }
        self.manual.auto = Some(AutoAdvance {
            start_value: self.manual.value,
            elapsed_s: 0.0,
        });
    }

    pub fn toggle_observer_colors(&mut self) {
        self.observer_colors = !self.observer_colors;
    }

    pub fn set_viewport(&mut self, viewport_px: Vec2) {
        self.controller.set_viewport(viewport_px);
    }

    pub fn pointer_down(&mut self, pos_px: Vec2) {
        self.controller.pointer_down(pos_px, &self.user_camera);
    }

    pub fn pointer_move(&mut self, pos_px: Vec2) {
        self.controller.pointer_move(pos_px, &mut self.user_camera);
    }

    pub fn pointer_up(&mut self) {
        self.controller.pointer_up();
    }

    pub fn pointer_leave(&mut self) {
        self.controller.pointer_leave();
    }

    pub fn wheel(&mut self, lines: f32, cursor_px: Vec2) {
        self.controller.wheel(lines, cursor_px, &mut self.user_camera);
    }

    pub fn pinch(&mut self, scale: f32, centre_px: Vec2) {
        self.controller.pinch(scale, centre_px, &mut self.user_camera);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::DeviceClass;
    use crate::transition::LayoutWeights;
    use approx::assert_relative_eq;

    const VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);

    fn demo() -> AnimationState {
        AnimationState::new(
            PhaseSchedule::tour(&[], DeviceClass::Desktop),
            ControlMode::ScriptedDemo,
            VIEWPORT,
        )
    }

    fn run(state: &mut AnimationState, seconds: f32) -> FrameView {
        let mut view = state.view();
        let steps = (seconds * 60.0).round() as usize;
        for _ in 0..steps {
            view = state.update(1.0 / 60.0);
        }
        view
    }

    #[test]
    fn demo_follows_the_schedule() {
        let mut s = demo();
        let view = run(&mut s, 5.0);
        let expected = s.schedule().sample(view.elapsed_s);
        assert_eq!(view.transition, expected.transition);
        assert_eq!(view.camera, expected.camera);
        assert_eq!(view.phase, Some(expected.index));
    }

    #[test]
    fn pause_freezes_clock_and_offsets() {
        let mut s = demo();
        run(&mut s, 1.0);
        s.pause();
        let before = s.view();
        let after = run(&mut s, 2.0);
        assert_eq!(before.elapsed_s, after.elapsed_s);
        assert_eq!(before.offsets, after.offsets);
        assert_eq!(before.transition, after.transition);
        s.toggle_play();
        assert!(run(&mut s, 0.5).elapsed_s > before.elapsed_s);
    }

    #[test]
    fn huge_frame_gaps_are_clamped() {
        let mut s = demo();
        let v = s.update(30.0);
        assert_relative_eq!(v.elapsed_s, MAX_FRAME_DT_S);
        let v = s.update(f32::NAN);
        assert_relative_eq!(v.elapsed_s, MAX_FRAME_DT_S);
    }

    #[test]
    fn preview_is_frozen_on_first_layout() {
        let mut s = AnimationState::new(
            PhaseSchedule::tour(&[LayoutKind::Galactic, LayoutKind::Sky], DeviceClass::Mobile),
            ControlMode::StaticPreview,
            VIEWPORT,
        );
        let v = run(&mut s, 3.0);
        assert_eq!(v.elapsed_s, 0.0);
        assert_eq!(v.transition, TransitionState::settled(LayoutKind::Galactic));
        assert_eq!(v.camera, CameraState::REST);
        s.wheel(5.0, Vec2::new(10.0, 10.0));
        assert_eq!(s.update(0.1).camera, CameraState::REST);
    }

    #[test]
    fn demo_ignores_pointer_input() {
        let mut s = demo();
        s.wheel(10.0, Vec2::new(400.0, 300.0));
        s.pointer_down(Vec2::new(0.0, 0.0));
        s.pointer_move(Vec2::new(500.0, 500.0));
        let v = s.update(1.0 / 60.0);
        assert_eq!(v.camera, s.schedule().sample(v.elapsed_s).camera);
        // The user camera was never touched either.
        s.set_mode(ControlMode::Interactive);
        s.reset_camera();
        s.set_mode(ControlMode::ScriptedDemo);
        s.set_mode(ControlMode::Interactive);
        assert!(s.view().camera.zoom < 1.1);
    }

    #[test]
    fn entering_interactive_keeps_layout_and_camera() {
        let mut s = demo();
        // Land mid-way through the first transition.
        run(&mut s, crate::scheduler::TOUR_HOLD_S + 1.0);
        let before = s.view();
        s.set_mode(ControlMode::Interactive);
        let after = s.view();
        let p = [[-0.5, 0.2], [0.6, -0.4], [0.0, 0.9], [0.3, 0.3]];
        let a = before.transition.blend_position(p);
        let b = after.transition.blend_position(p);
        assert_relative_eq!(a[0], b[0], epsilon = 1e-5);
        assert_relative_eq!(a[1], b[1], epsilon = 1e-5);
        assert_eq!(before.camera, after.camera);
    }

    #[test]
    fn manual_value_drives_the_transition() {
        let mut s = demo();
        s.set_mode(ControlMode::Interactive);
        s.set_manual_target(LayoutKind::Histogram);
        s.set_manual_value(0.25);
        let v = s.update(0.016);
        assert_eq!(v.transition.to, LayoutWeights::pure(LayoutKind::Histogram));
        assert_relative_eq!(v.transition.factor, 0.25);
        s.nudge_manual_value(1.0);
        assert_eq!(s.update(0.0).transition.factor, 1.0);
        s.set_manual_value(f32::NAN);
        assert_eq!(s.update(0.0).transition.factor, 1.0);
    }

    #[test]
    fn triggered_transition_settles_on_target() {
        let mut s = demo();
        s.set_mode(ControlMode::Interactive);
        s.set_manual_target(LayoutKind::Scatter);
        s.trigger_transition();
        let mid = run(&mut s, MANUAL_TRANSITION_S * 0.5);
        assert!(mid.manual.is_animating());
        assert!(mid.transition.factor > 0.0 && mid.transition.factor < 1.0);
        let end = run(&mut s, MANUAL_TRANSITION_S);
        assert!(!end.manual.is_animating());
        assert_eq!(end.transition, TransitionState::settled(LayoutKind::Scatter));
        // A second trigger moves on to the next layout.
        s.trigger_transition();
        let next = run(&mut s, MANUAL_TRANSITION_S * 2.0);
        assert_eq!(next.transition, TransitionState::settled(LayoutKind::Galactic));
    }

    #[test]
    fn trigger_is_ignored_outside_interactive() {
        let mut s = demo();
        s.trigger_transition();
        assert!(!s.view().manual.is_animating());
    }

    #[test]
    fn interactive_zoom_and_reset() {
        let mut s = demo();
        s.set_mode(ControlMode::Interactive);
        s.reset_camera();
        s.wheel(3.0, Vec2::new(400.0, 300.0));
        let zoomed = s.update(0.016);
        assert!(zoomed.camera.zoom > 1.3);
        s.reset_camera();
        assert_eq!(s.update(0.016).camera, CameraState::REST);
    }

    #[test]
    fn offsets_wrap_and_reach_the_uniforms() {
        let mut s = demo();
        for _ in 0..2_000 {
            s.update(MAX_FRAME_DT_S);
        }
        let v = s.view();
        assert!((0.0..2.0).contains(&v.offsets.sky_rotation));
        assert!((0.0..2.0).contains(&v.offsets.galactic_scroll));
        s.toggle_observer_colors();
        let u = s.uniforms([800.0, 600.0], 2.0, 1.5);
        assert_eq!(u.color_mix, 1.0);
        assert_eq!(u.scroll, [v.offsets.sky_rotation, v.offsets.galactic_scroll]);
        assert_eq!(u.time_s, 1.5);
    }

    #[test]
    fn clock_keeps_running_after_a_week() {
        let mut s = demo();
        let loop_s = s.schedule().loop_duration();
        s.elapsed_s = 604_800.0;
        let start = 604_800.0_f32.rem_euclid(loop_s);
        let v = run(&mut s, 10.0);
        assert!(v.elapsed_s >= 0.0 && v.elapsed_s < loop_s);
        let advanced = (v.elapsed_s - start).rem_euclid(loop_s);
        assert_relative_eq!(advanced, 10.0, epsilon = 1e-2);
        assert_eq!(v.transition, s.schedule().sample(v.elapsed_s).transition);
    }

    #[test]
    fn clock_wraps_at_the_loop_length() {
        let mut s = demo();
        let loop_s = s.schedule().loop_duration();
        s.elapsed_s = loop_s - 0.1;
        let v = s.update(0.2);
        assert_relative_eq!(v.elapsed_s, 0.1, epsilon = 1e-3);
        assert_eq!(v.phase, Some(0));
    }

    #[test]
    fn same_elapsed_time_same_frame() {
        let mut a = demo();
        let mut b = demo();
        for _ in 0..100 {
            a.update(0.05);
        }
        for _ in 0..50 {
            b.update(0.1);
        }
        let (va, vb) = (a.view(), b.view());
        assert_relative_eq!(va.elapsed_s, vb.elapsed_s, epsilon = 1e-3);
        let p = [[0.1, 0.2], [0.3, 0.4], [0.5, 0.6], [0.7, 0.8]];
        let pa = va.transition.blend_position(p);
        let pb = vb.transition.blend_position(p);
        assert_relative_eq!(pa[0], pb[0], epsilon = 1e-3);
    }
}

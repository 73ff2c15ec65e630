//! Animation/Phase Scheduler.
//!
//! A schedule is an ordered list of [`Phase`] descriptors. Sampling is a pure
//! function of elapsed time: the time is wrapped modulo the loop length and
//! folded over the phases until it lands inside one. The same elapsed time
//! always yields the same [`PhaseSample`].

use crate::camera::CameraState;
use crate::easing::Easing;
use crate::error::ScheduleError;
use crate::layout::LayoutKind;
use crate::transition::{LayoutWeights, TransitionState};
use glam::Vec2;
use std::f32::consts::{PI, TAU};
use std::ops::ControlFlow;

/// Settled time on each layout in the default tour, seconds.
pub const TOUR_HOLD_S: f32 = 4.0;
/// Duration of each layout change in the default tour, seconds.
pub const TOUR_TRANSITION_S: f32 = 2.5;
/// Mobile loops run at this fraction of the desktop durations.
pub const MOBILE_TIME_SCALE: f32 = 0.6;

/// Weights closer than this compare equal in continuity checks.
const CONTINUITY_TOLERANCE: f32 = 1e-4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeviceClass {
    #[default]
    Desktop,
    Mobile,
}

impl DeviceClass {
    pub fn time_scale(self) -> f32 {
        match self {
            DeviceClass::Desktop => 1.0,
            DeviceClass::Mobile => MOBILE_TIME_SCALE,
        }
    }
}

/// Camera behaviour during a phase.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum CameraMotion {
    #[default]
    Still,
    /// Idle drift around the centre. The envelope `sin(pi * progress)` brings
    /// the camera back to rest at both ends of the phase.
    Drift {
        /// Peak pan offset, world units.
        amplitude: f32,
        /// Peak extra zoom.
        zoom_pulse: f32,
        /// Revolutions of the drift circle per phase.
        turns: f32,
    },
}

impl CameraMotion {
    pub fn camera_at(&self, progress: f32) -> CameraState {
        match *self {
            CameraMotion::Still => CameraState::REST,
            CameraMotion::Drift {
                amplitude,
                zoom_pulse,
                turns,
            } => {
                let p = progress.clamp(0.0, 1.0);
                let envelope = (PI * p).sin();
                let angle = TAU * turns * p;
                CameraState {
                    pan: Vec2::new(angle.cos(), angle.sin()) * amplitude * envelope,
                    zoom: 1.0 + zoom_pulse * envelope,
                }
                .clamped()
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Phase {
    pub name: String,
    pub duration_s: f32,
    pub from: LayoutWeights,
    pub to: LayoutWeights,
    pub easing: Easing,
    pub camera: CameraMotion,
}

impl Phase {
    /// A settled phase on `kind`.
    pub fn hold(name: impl Into<String>, duration_s: f32, kind: LayoutKind) -> Self {
        Self {
            name: name.into(),
            duration_s,
            from: kind.into(),
            to: kind.into(),
            easing: Easing::default(),
            camera: CameraMotion::Still,
        }
    }

    /// An eased change from one layout to another.
    pub fn transition(
        name: impl Into<String>,
        duration_s: f32,
        from: impl Into<LayoutWeights>,
        to: impl Into<LayoutWeights>,
    ) -> Self {
        Self {
            name: name.into(),
            duration_s,
            from: from.into(),
            to: to.into(),
            easing: Easing::CubicInOut,
            camera: CameraMotion::Still,
        }
    }

    pub fn with_camera(mut self, camera: CameraMotion) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    #[inline]
    pub fn is_hold(&self) -> bool {
        self.from == self.to
    }

    /// Transition state at local progress `p` in [0, 1].
    pub fn transition_at(&self, p: f32) -> TransitionState {
        let factor = if self.is_hold() {
            0.0
        } else {
            self.easing.apply(p)
        };
        TransitionState {
            from: self.from,
            to: self.to,
            factor,
        }
    }
}

/// What the schedule says at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseSample {
    pub index: usize,
    /// Linear local progress in [0, 1).
    pub progress: f32,
    pub transition: TransitionState,
    pub camera: CameraState,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PhaseSchedule {
    phases: Vec<Phase>,
    loop_s: f32,
}

fn weights_match(a: &LayoutWeights, b: &LayoutWeights) -> bool {
    a.0.iter()
        .zip(b.0.iter())
        .all(|(x, y)| (x - y).abs() <= CONTINUITY_TOLERANCE)
}

impl PhaseSchedule {
    /// Validates and builds a schedule.
    ///
    /// Rejects empty lists, negative or non-finite durations, a zero-length
    /// loop, weights that do not sum to one, and adjacent phases whose end
    /// and start weights differ. Wrap-around continuity is reported by
    /// [`Self::is_seamless`] rather than enforced.
    pub fn new(phases: Vec<Phase>) -> Result<Self, ScheduleError> {
        if phases.is_empty() {
            return Err(ScheduleError::NoPhases);
        }
        for (index, p) in phases.iter().enumerate() {
            if !p.duration_s.is_finite() || p.duration_s < 0.0 {
                return Err(ScheduleError::InvalidDuration {
                    index,
                    name: p.name.clone(),
                    duration_s: p.duration_s,
                });
            }
            if !p.from.is_normalized() || !p.to.is_normalized() {
                return Err(ScheduleError::UnnormalizedWeights {
                    index,
                    name: p.name.clone(),
                });
            }
        }
        for (index, pair) in phases.windows(2).enumerate() {
            if !weights_match(&pair[0].to, &pair[1].from) {
                return Err(ScheduleError::Discontinuity {
                    index,
                    next: index + 1,
                });
            }
        }

        let loop_s: f32 = phases.iter().map(|p| p.duration_s).sum();
        if loop_s <= 0.0 {
            return Err(ScheduleError::ZeroLength);
        }
        Ok(Self { phases, loop_s })
    }

    /// Looping tour over `kinds`: hold on each layout with an idle drift, then
    /// transition to the next. An empty slice tours all four layouts.
    pub fn tour(kinds: &[LayoutKind], device: DeviceClass) -> Self {
        let kinds = if kinds.is_empty() {
            &LayoutKind::ALL[..]
        } else {
            kinds
        };
        let scale = device.time_scale();
        let drift = CameraMotion::Drift {
            amplitude: 0.03,
            zoom_pulse: 0.08,
            turns: 0.5,
        };

        let mut phases = Vec::with_capacity(kinds.len() * 2);
        for (i, kind) in kinds.iter().enumerate() {
            phases.push(
                Phase::hold(format!("hold {}", kind.label()), TOUR_HOLD_S * scale, *kind)
                    .with_camera(drift),
            );
            let next = kinds[(i + 1) % kinds.len()];
            if next != *kind {
                phases.push(Phase::transition(
                    format!("{} to {}", kind.label(), next.label()),
                    TOUR_TRANSITION_S * scale,
                    *kind,
                    next,
                ));
            }
        }
        let loop_s = phases.iter().map(|p| p.duration_s).sum();
        log::debug!("tour of {} phases, loop {loop_s:.1}s ({device:?})", phases.len());
        Self { phases, loop_s }
    }

    #[inline]
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    #[inline]
    pub fn loop_duration(&self) -> f32 {
        self.loop_s
    }

    /// True when the last phase ends on the weights the first phase starts
    /// with, so the loop wraps without a jump.
    pub fn is_seamless(&self) -> bool {
        match (self.phases.last(), self.phases.first()) {
            (Some(last), Some(first)) => weights_match(&last.to, &first.from),
            _ => true,
        }
    }

    /// Samples the schedule at `elapsed_s` (wrapped modulo the loop length).
    pub fn sample(&self, elapsed_s: f32) -> PhaseSample {
        let t = if elapsed_s.is_finite() {
            elapsed_s.rem_euclid(self.loop_s)
        } else {
            0.0
        };

        let found = self
            .phases
            .iter()
            .enumerate()
            .filter(|(_, p)| p.duration_s > 0.0)
            .try_fold(t, |remaining, (i, p)| {
                if remaining < p.duration_s {
                    ControlFlow::Break((i, remaining / p.duration_s))
                } else {
                    ControlFlow::Continue(remaining - p.duration_s)
                }
            });

        let (index, progress) = match found {
            ControlFlow::Break(hit) => hit,
            // Rounding pushed t past the final phase; pin to its end.
            ControlFlow::Continue(_) => {
                let last = self
                    .phases
                    .iter()
                    .rposition(|p| p.duration_s > 0.0)
                    .unwrap_or(self.phases.len() - 1);
                (last, 1.0)
            }
        };

        let phase = &self.phases[index];
        PhaseSample {
            index,
            progress,
            transition: phase.transition_at(progress),
            camera: phase.camera.camera_at(progress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::layout::LayoutKind::*;

    fn three_phase() -> PhaseSchedule {
        PhaseSchedule::new(vec![
            Phase::hold("settle", 0.0, Sky),
            Phase::transition("sky to scatter", 2.0, Sky, Scatter),
            Phase::hold("hold scatter", 2.0, Scatter),
        ])
        .unwrap()
    }

    #[test]
    fn zero_duration_phase_is_skipped() {
        let s = three_phase();
        assert_eq!(s.loop_duration(), 4.0);
        let at0 = s.sample(0.0);
        assert_eq!(at0.index, 1);
        assert_eq!(at0.transition.factor, 0.0);
    }

    #[test]
    fn mid_transition_is_eased() {
        let s = three_phase();
        let at1 = s.sample(1.0);
        assert_eq!(at1.index, 1);
        assert_relative_eq!(at1.transition.factor, Easing::CubicInOut.apply(0.5));
    }

    #[test]
    fn hold_reports_pure_target_with_zero_factor() {
        let s = three_phase();
        let at3 = s.sample(3.0);
        assert_eq!(at3.index, 2);
        assert_eq!(at3.transition.factor, 0.0);
        assert_eq!(at3.transition.from, LayoutWeights::pure(Scatter));
        assert_eq!(at3.transition.effective_weights(), LayoutWeights::pure(Scatter));
    }

    #[test]
    fn elapsed_wraps_modulo_loop() {
        let s = three_phase();
        assert_eq!(s.sample(1.0), s.sample(5.0));
        assert_eq!(s.sample(1.0), s.sample(401.0));
        assert_eq!(s.sample(-3.0), s.sample(1.0));
        assert_eq!(s.sample(f32::NAN).index, 1);
    }

    #[test]
    fn validation_errors() {
        assert_eq!(PhaseSchedule::new(vec![]), Err(ScheduleError::NoPhases));
        assert_eq!(
            PhaseSchedule::new(vec![Phase::hold("a", 0.0, Sky)]),
            Err(ScheduleError::ZeroLength)
        );
        assert!(matches!(
            PhaseSchedule::new(vec![Phase::hold("a", -1.0, Sky)]),
            Err(ScheduleError::InvalidDuration { index: 0, .. })
        ));
        assert_eq!(
            PhaseSchedule::new(vec![
                Phase::hold("a", 1.0, Sky),
                Phase::hold("b", 1.0, Galactic),
            ]),
            Err(ScheduleError::Discontinuity { index: 0, next: 1 })
        );
        let mut bad = Phase::hold("c", 1.0, Sky);
        bad.to = LayoutWeights([0.5, 0.0, 0.0, 0.0]);
        assert!(matches!(
            PhaseSchedule::new(vec![bad]),
            Err(ScheduleError::UnnormalizedWeights { index: 0, .. })
        ));
    }

    #[test]
    fn tour_is_valid_and_seamless() {
        for device in [DeviceClass::Desktop, DeviceClass::Mobile] {
            let tour = PhaseSchedule::tour(&[], device);
            assert!(tour.is_seamless());
            assert_eq!(PhaseSchedule::new(tour.phases().to_vec()).as_ref(), Ok(&tour));
            assert_eq!(tour.phases().len(), 8);
        }
        let desktop = PhaseSchedule::tour(&[], DeviceClass::Desktop).loop_duration();
        let mobile = PhaseSchedule::tour(&[], DeviceClass::Mobile).loop_duration();
        assert!(mobile < desktop);
        assert_relative_eq!(mobile, desktop * MOBILE_TIME_SCALE, epsilon = 1e-4);
    }

    #[test]
    fn sampled_positions_are_continuous() {
        let tour = PhaseSchedule::tour(&[Sky, Scatter, Histogram], DeviceClass::Desktop);
        let p = [[-0.5, 0.3], [0.4, -0.7], [0.0, 0.0], [0.9, -0.1]];
        let dt = 1.0 / 240.0;
        let mut prev = tour.sample(0.0).transition.blend_position(p);
        let mut t = dt;
        while t < tour.loop_duration() * 2.0 {
            let cur = tour.sample(t).transition.blend_position(p);
            let jump = ((cur[0] - prev[0]).powi(2) + (cur[1] - prev[1]).powi(2)).sqrt();
            assert!(jump < 0.05, "jump of {jump} at t = {t}");
            prev = cur;
            t += dt;
        }
    }

    #[test]
    fn drift_rests_at_phase_edges() {
        let drift = CameraMotion::Drift {
            amplitude: 0.03,
            zoom_pulse: 0.08,
            turns: 0.5,
        };
        assert_eq!(drift.camera_at(0.0), CameraState::REST);
        let end = drift.camera_at(1.0);
        assert!(end.pan.length() < 1e-6 && (end.zoom - 1.0).abs() < 1e-6);
        let mid = drift.camera_at(0.5);
        assert!(mid.zoom > 1.0);
        assert!(mid.pan.x.abs() <= CameraState::pan_bound(mid.zoom) + 1e-6);
    }
}

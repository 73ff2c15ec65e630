//! Per-frame uniform block shared with `star_points.wgsl`.

use crate::camera::{self, CameraState};
use crate::transition::TransitionState;
use glam::Vec2;

/// Per-frame uniforms, std140-compatible.
/// Must match `FrameUniforms` in `star_points.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub from_weights: [f32; 4],
    pub to_weights: [f32; 4],
    pub pan: [f32; 2],
    pub zoom: f32,
    pub transition: f32,
    /// Physical pixels.
    pub viewport_px: [f32; 2],
    pub device_pixel_ratio: f32,
    /// 0 = natural colours, 1 = observer-friendly.
    pub color_mix: f32,
    /// Sky rotation and galactic scroll offsets, NDC units in [0, 2).
    pub scroll: [f32; 2],
    pub time_s: f32,
    pub _pad0: f32,
}

const _: [(); 80] = [(); std::mem::size_of::<FrameUniforms>()];

impl Default for FrameUniforms {
    fn default() -> Self {
        Self::new(
            &TransitionState::default(),
            &CameraState::REST,
            [1.0, 1.0],
            1.0,
        )
    }
}

impl FrameUniforms {
    pub fn new(
        transition: &TransitionState,
        camera: &CameraState,
        viewport_px: [f32; 2],
        device_pixel_ratio: f32,
    ) -> Self {
        Self {
            from_weights: transition.from.0,
            to_weights: transition.to.0,
            pan: camera.pan.to_array(),
            zoom: camera.zoom,
            transition: transition.factor,
            viewport_px: [viewport_px[0].max(1.0), viewport_px[1].max(1.0)],
            device_pixel_ratio: if device_pixel_ratio > 0.0 {
                device_pixel_ratio
            } else {
                1.0
            },
            color_mix: 0.0,
            scroll: [0.0, 0.0],
            time_s: 0.0,
            _pad0: 0.0,
        }
    }

    pub fn with_color_mix(mut self, mix: f32) -> Self {
        self.color_mix = mix.clamp(0.0, 1.0);
        self
    }

    pub fn with_scroll(mut self, sky: f32, galactic: f32) -> Self {
        self.scroll = [sky, galactic];
        self
    }

    pub fn with_time(mut self, time_s: f32) -> Self {
        self.time_s = time_s;
        self
    }

    /// Scale applied to the canonical square so it fits the viewport
    /// without stretching.
    pub fn aspect_fit(&self) -> [f32; 2] {
        camera::aspect_fit(Vec2::from(self.viewport_px)).to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutKind;

    #[test]
    fn carries_transition_and_camera() {
        let t = TransitionState::between(LayoutKind::Sky, LayoutKind::Galactic, 0.25);
        let cam = CameraState {
            pan: glam::Vec2::new(0.1, -0.2),
            zoom: 3.0,
        };
        let u = FrameUniforms::new(&t, &cam, [1920.0, 1080.0], 2.0).with_color_mix(4.0);
        assert_eq!(u.from_weights, [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(u.to_weights, [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(u.transition, 0.25);
        assert_eq!(u.pan, [0.1, -0.2]);
        assert_eq!(u.color_mix, 1.0);
        assert_eq!(bytemuck::bytes_of(&u).len(), 80);
    }

    #[test]
    fn aspect_fit_shrinks_the_long_axis() {
        let u = FrameUniforms::new(&TransitionState::default(), &CameraState::REST, [200.0, 100.0], 1.0);
        assert_eq!(u.aspect_fit(), [0.5, 1.0]);
        let u = FrameUniforms::new(&TransitionState::default(), &CameraState::REST, [100.0, 400.0], 0.0);
        assert_eq!(u.aspect_fit(), [1.0, 0.25]);
        assert_eq!(u.device_pixel_ratio, 1.0);
    }
}

//! Flow-field particles advected through the curl-noise field.

use crate::noise::Simplex3;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Reference frame rate the per-frame speeds are tuned for.
pub const REFERENCE_FPS: f32 = 60.0;
/// Longest step taken at once; a stalled frame advances no further.
pub const MAX_STEP_S: f32 = crate::animation::MAX_FRAME_DT_S;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowParams {
    /// World-to-noise scale.
    pub scale: f64,
    /// Pixels per reference frame at unit field velocity.
    pub speed: f32,
    /// Advance of the noise z coordinate per reference frame.
    pub z_speed: f64,
    /// Trail positions kept per particle.
    pub trail_len: usize,
    /// Distance outside the bounds, in pixels, before a particle respawns.
    pub margin: f32,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            scale: 0.0025,
            speed: 1.6,
            z_speed: 0.0015,
            trail_len: 12,
            margin: 8.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Particle {
    /// Position in pixels, y down.
    pub pos: Vec2,
    /// Per-particle speed variance, in [0.5, 1.5].
    pub speed_factor: f32,
    /// Previous positions, newest first.
    pub trail: VecDeque<Vec2>,
}

/// One sprite for the flow pipeline; matches `flow_particles.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FlowSprite {
    pub pos_ndc: [f32; 2],
    pub alpha: f32,
    pub size_px: f32,
}

pub const HEAD_SIZE_PX: f32 = 2.0;
pub const TRAIL_SIZE_PX: f32 = 1.4;
pub const TRAIL_ALPHA: f32 = 0.55;

pub struct FlowField {
    noise: Simplex3,
    rng: StdRng,
    params: FlowParams,
    bounds: Vec2,
    z: f64,
    particles: Vec<Particle>,
}

impl FlowField {
    /// `count` particles over a `bounds` pixel canvas, all seeded by `seed`.
    pub fn new(count: usize, bounds: Vec2, params: FlowParams, seed: u64) -> Self {
        let mut field = Self {
            noise: Simplex3::new(seed),
            rng: StdRng::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15),
            params,
            bounds: bounds.max(Vec2::ONE),
            z: 0.0,
            particles: Vec::with_capacity(count),
        };
        for _ in 0..count {
            let p = field.spawn();
            field.particles.push(p);
        }
        log::debug!("flow field: {count} particles over {}x{}", bounds.x, bounds.y);
        field
    }

    fn spawn(&mut self) -> Particle {
        Particle {
            pos: Vec2::new(
                self.rng.gen_range(0.0..self.bounds.x),
                self.rng.gen_range(0.0..self.bounds.y),
            ),
            speed_factor: self.rng.gen_range(0.5..=1.5),
            trail: VecDeque::with_capacity(self.params.trail_len),
        }
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[inline]
    pub fn params(&self) -> &FlowParams {
        &self.params
    }

    #[inline]
    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    /// Field velocity at a pixel position.
    pub fn velocity(&self, pos: Vec2) -> Vec2 {
        let (vx, vy) = self
            .noise
            .curl(pos.x as f64, pos.y as f64, self.z, self.params.scale);
        Vec2::new(vx as f32, vy as f32)
    }

    fn out_of_bounds(&self, pos: Vec2) -> bool {
        let m = self.params.margin;
        pos.x < -m || pos.y < -m || pos.x > self.bounds.x + m || pos.y > self.bounds.y + m
    }

    /// Advances every particle by `dt_s` seconds, at most [`MAX_STEP_S`].
    pub fn step(&mut self, dt_s: f32) {
        if !(dt_s.is_finite() && dt_s > 0.0) {
            return;
        }
        let frames = dt_s.min(MAX_STEP_S) * REFERENCE_FPS;

        let mut respawned = 0usize;
        for i in 0..self.particles.len() {
            let pos = self.particles[i].pos;
            let v = self.velocity(pos);
            let p = &mut self.particles[i];
            p.trail.push_front(pos);
            p.trail.truncate(self.params.trail_len);
            p.pos = pos + v * self.params.speed * p.speed_factor * frames;

            if self.out_of_bounds(self.particles[i].pos) {
                self.particles[i] = self.spawn();
                respawned += 1;
            }
        }
        self.z += self.params.z_speed * frames as f64;
        if respawned > 0 {
            log::trace!("respawned {respawned} flow particles");
        }
    }

    /// Changes the canvas size. Particles outside the new bounds respawn on
    /// the next step.
    pub fn resize(&mut self, bounds: Vec2) {
        self.bounds = bounds.max(Vec2::ONE);
    }

    #[inline]
    fn to_ndc(&self, p: Vec2) -> [f32; 2] {
        [2.0 * p.x / self.bounds.x - 1.0, 1.0 - 2.0 * p.y / self.bounds.y]
    }

    /// Head and trail sprites of every particle, trails fading with age.
    pub fn sprites(&self) -> Vec<FlowSprite> {
        let cap = self.params.trail_len.max(1) as f32;
        let mut out = Vec::with_capacity(self.particles.len() * (1 + self.params.trail_len));
        for p in &self.particles {
            out.push(FlowSprite {
                pos_ndc: self.to_ndc(p.pos),
                alpha: 1.0,
                size_px: HEAD_SIZE_PX,
            });
            for (age, t) in p.trail.iter().enumerate() {
                out.push(FlowSprite {
                    pos_ndc: self.to_ndc(*t),
                    alpha: TRAIL_ALPHA * (1.0 - (age as f32 + 1.0) / (cap + 1.0)),
                    size_px: TRAIL_SIZE_PX,
                });
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(count: usize) -> FlowField {
        FlowField::new(count, Vec2::new(640.0, 480.0), FlowParams::default(), 99)
    }

    #[test]
    fn spawn_respects_speed_variance() {
        let f = field(500);
        for p in f.particles() {
            assert!((0.5..=1.5).contains(&p.speed_factor));
            assert!(p.trail.is_empty());
        }
    }

    #[test]
    fn trails_are_capped() {
        let mut f = field(50);
        for _ in 0..40 {
            f.step(1.0 / 60.0);
        }
        for p in f.particles() {
            assert!(p.trail.len() <= f.params().trail_len);
        }
    }

    #[test]
    fn particles_stay_near_bounds() {
        let mut f = field(300);
        for _ in 0..600 {
            f.step(1.0 / 30.0);
            let m = f.params().margin;
            for p in f.particles() {
                assert!(p.pos.x >= -m && p.pos.x <= 640.0 + m);
                assert!(p.pos.y >= -m && p.pos.y <= 480.0 + m);
            }
        }
    }

    #[test]
    fn step_is_frame_rate_independent_in_direction() {
        let f = field(1);
        let v = f.velocity(Vec2::new(100.0, 100.0));
        assert!(v.is_finite());
        let mut a = field(1);
        let mut b = field(1);
        a.step(1.0 / 60.0);
        b.step(1.0 / 120.0);
        let da = a.particles()[0].pos - a.particles()[0].trail[0];
        let db = b.particles()[0].pos - b.particles()[0].trail[0];
        // Half the time step, half the displacement on the first step.
        assert!((da * 0.5 - db).length() < 1e-3);
    }

    #[test]
    fn stalled_frame_is_clamped() {
        let mut stalled = field(200);
        let mut clamped = field(200);
        stalled.step(10.0);
        clamped.step(MAX_STEP_S);
        for (a, b) in stalled.particles().iter().zip(clamped.particles()) {
            assert_eq!(a.pos, b.pos);
        }
        assert_eq!(stalled.z, clamped.z);
    }

    #[test]
    fn same_seed_is_reproducible() {
        let mut a = field(20);
        let mut b = field(20);
        for _ in 0..30 {
            a.step(0.016);
            b.step(0.016);
        }
        for (pa, pb) in a.particles().iter().zip(b.particles()) {
            assert_eq!(pa.pos, pb.pos);
        }
    }

    #[test]
    fn sprites_include_trails_with_fading_alpha() {
        let mut f = field(3);
        for _ in 0..5 {
            f.step(1.0 / 60.0);
        }
        let sprites = f.sprites();
        let trail_total: usize = f.particles().iter().map(|p| p.trail.len()).sum();
        assert_eq!(sprites.len(), 3 + trail_total);
        let p0 = &f.particles()[0];
        if p0.trail.len() >= 2 {
            assert!(sprites[1].alpha > sprites[2].alpha);
        }
    }

    #[test]
    fn zero_or_invalid_dt_is_ignored() {
        let mut f = field(5);
        let before: Vec<_> = f.particles().iter().map(|p| p.pos).collect();
        f.step(0.0);
        f.step(f32::NAN);
        let after: Vec<_> = f.particles().iter().map(|p| p.pos).collect();
        assert_eq!(before, after);
    }
}

//! Layout weights and the transition blend.
//!
//! The effective position of a point is
//! `mix(dot(from, P), dot(to, P), factor)` where `P` holds its four layout
//! positions. The same expression runs in the vertex shader; the functions
//! here are its CPU mirror.

use crate::layout::LayoutKind;

/// Tolerance for "weights sum to one".
pub const WEIGHT_SUM_TOLERANCE: f32 = 1e-4;

/// Per-layout weights, indexed by [`LayoutKind`].
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct LayoutWeights(pub [f32; 4]);

impl LayoutWeights {
    /// One-hot weights selecting a single layout.
    pub const fn pure(kind: LayoutKind) -> Self {
        match kind {
            LayoutKind::Sky => Self([1.0, 0.0, 0.0, 0.0]),
            LayoutKind::Scatter => Self([0.0, 1.0, 0.0, 0.0]),
            LayoutKind::Galactic => Self([0.0, 0.0, 1.0, 0.0]),
            LayoutKind::Histogram => Self([0.0, 0.0, 0.0, 1.0]),
        }
    }

    #[inline]
    pub fn sum(&self) -> f32 {
        self.0.iter().sum()
    }

    #[inline]
    pub fn is_normalized(&self) -> bool {
        self.0.iter().all(|w| *w >= 0.0) && (self.sum() - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
    }

    /// Rescales to sum 1. All-zero weights become a pure Sky layout.
    pub fn normalized(self) -> Self {
        let clipped = self.0.map(|w| w.max(0.0));
        let sum: f32 = clipped.iter().sum();
        if sum <= f32::EPSILON {
            return Self::pure(LayoutKind::Sky);
        }
        Self(clipped.map(|w| w / sum))
    }

    /// Component-wise interpolation; stays normalized when both ends are.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let mut out = [0.0; 4];
        for (o, (a, b)) in out.iter_mut().zip(self.0.iter().zip(other.0.iter())) {
            *o = a * (1.0 - t) + b * t;
        }
        Self(out)
    }

    #[inline]
    pub fn dot(&self, values: [f32; 4]) -> f32 {
        self.0
            .iter()
            .zip(values.iter())
            .map(|(w, v)| w * v)
            .sum()
    }

    /// The dominant layout, first one on ties.
    pub fn dominant(&self) -> LayoutKind {
        let mut best = 0;
        for i in 1..4 {
            if self.0[i] > self.0[best] {
                best = i;
            }
        }
        LayoutKind::ALL[best]
    }
}

impl From<LayoutKind> for LayoutWeights {
    fn from(kind: LayoutKind) -> Self {
        Self::pure(kind)
    }
}

/// Which two weighted layouts are active and how far between them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionState {
    pub from: LayoutWeights,
    pub to: LayoutWeights,
    /// In [0, 1].
    pub factor: f32,
}

impl TransitionState {
    /// Settled on a single layout.
    pub fn settled(kind: LayoutKind) -> Self {
        Self {
            from: LayoutWeights::pure(kind),
            to: LayoutWeights::pure(kind),
            factor: 0.0,
        }
    }

    pub fn between(from: impl Into<LayoutWeights>, to: impl Into<LayoutWeights>, factor: f32) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            factor: factor.clamp(0.0, 1.0),
        }
    }

    /// Weights the transition is currently equivalent to.
    pub fn effective_weights(&self) -> LayoutWeights {
        self.from.lerp(self.to, self.factor)
    }

    /// Blends one scalar attribute given its value in each layout.
    ///
    /// Uses the `a·(1−t) + b·t` form of WGSL `mix`, exact at both ends.
    #[inline]
    pub fn blend_scalar(&self, per_layout: [f32; 4]) -> f32 {
        let a = self.from.dot(per_layout);
        let b = self.to.dot(per_layout);
        a * (1.0 - self.factor) + b * self.factor
    }

    /// Blends a position given its NDC position in each layout.
    pub fn blend_position(&self, per_layout: [[f32; 2]; 4]) -> [f32; 2] {
        let xs = per_layout.map(|p| p[0]);
        let ys = per_layout.map(|p| p[1]);
        [self.blend_scalar(xs), self.blend_scalar(ys)]
    }
}

impl Default for TransitionState {
    fn default() -> Self {
        Self::settled(LayoutKind::Sky)
    }
}

/// Easing curves applied to local phase progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    Linear,
    #[default]
    CubicInOut,
}

impl Easing {
    /// Maps progress in [0, 1] to an eased factor in [0, 1]; input is clamped.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CubicInOut => cubic_in_out(t),
        }
    }
}

#[inline]
pub fn cubic_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cubic_endpoints_and_midpoint() {
        assert_eq!(cubic_in_out(0.0), 0.0);
        assert_eq!(cubic_in_out(1.0), 1.0);
        assert_relative_eq!(cubic_in_out(0.5), 0.5);
        assert_relative_eq!(cubic_in_out(0.25), 0.0625);
    }

    #[test]
    fn cubic_is_monotonic_and_symmetric() {
        let mut prev = 0.0;
        for i in 0..=100 {
            let t = i as f32 / 100.0;
            let v = cubic_in_out(t);
            assert!(v >= prev);
            assert_relative_eq!(v, 1.0 - cubic_in_out(1.0 - t), epsilon = 1e-6);
            prev = v;
        }
    }

    #[test]
    fn apply_clamps() {
        assert_eq!(Easing::CubicInOut.apply(-1.0), 0.0);
        assert_eq!(Easing::Linear.apply(2.0), 1.0);
    }
}

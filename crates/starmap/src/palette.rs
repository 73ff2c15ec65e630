//! Piecewise-linear size and colour ramps.
//!
//! Sizes are in logical pixels; the shader multiplies by the device pixel
//! ratio. Stop values may be recalibrated per platform, but size ramps must
//! stay monotonically decreasing with magnitude.

/// Apparent-magnitude size stops: brightest, mag 3, mag 5, mag 7, faintest.
pub const APPARENT_SIZE_STOPS: [(f64, f32); 5] = [
    (-1.5, 9.0),
    (3.0, 5.0),
    (5.0, 3.2),
    (7.0, 2.0),
    (12.0, 1.0),
];

/// Absolute-magnitude size stops for the property scatter.
pub const ABSOLUTE_SIZE_STOPS: [(f64, f32); 5] = [
    (-5.0, 8.0),
    (0.0, 5.0),
    (5.0, 3.0),
    (10.0, 1.8),
    (15.0, 1.0),
];

/// Size used by layouts where brightness is already encoded on an axis.
pub const UNIFORM_SIZE_PX: f32 = 2.0;

/// Colour-index stops, hot blue-white through solar to cool orange.
pub const COLOR_INDEX_STOPS: [(f64, [f32; 3]); 6] = [
    (-0.4, [0.61, 0.71, 1.00]), // O/B
    (0.0, [0.79, 0.85, 1.00]),  // A
    (0.65, [1.00, 0.96, 0.90]), // G (Sun)
    (1.2, [1.00, 0.84, 0.63]),  // K
    (2.0, [1.00, 0.68, 0.44]),  // M
    (3.0, [1.00, 0.52, 0.32]),  // late M
];

/// Saturation gain of the observer-friendly colour variant.
pub const OBSERVER_SATURATION: f32 = 1.6;

/// Linear interpolation between two values, generic over the ramp payload.
pub trait Lerp: Copy {
    fn lerp(self, other: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    #[inline]
    fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for [f32; 3] {
    #[inline]
    fn lerp(self, other: Self, t: f32) -> Self {
        [
            self[0].lerp(other[0], t),
            self[1].lerp(other[1], t),
            self[2].lerp(other[2], t),
        ]
    }
}

/// A ramp of `(input, value)` stops sorted by ascending input.
#[derive(Clone, Debug)]
pub struct Stops<T> {
    stops: Vec<(f64, T)>,
}

impl<T: Lerp> Stops<T> {
    /// Builds a ramp; stops are sorted by input.
    ///
    /// # Panics
    /// Panics when `stops` is empty.
    pub fn new(stops: &[(f64, T)]) -> Self {
        assert!(!stops.is_empty(), "a ramp needs at least one stop");
        let mut stops = stops.to_vec();
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { stops }
    }

    /// Samples the ramp; inputs outside the stops clamp to the end values.
    pub fn sample(&self, x: f64) -> T {
        let first = self.stops[0];
        let last = self.stops[self.stops.len() - 1];
        if !(x > first.0) {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }
        // First stop strictly above x; guaranteed to exist and be > 0 here.
        let hi = self.stops.partition_point(|s| s.0 <= x);
        let (x0, v0) = self.stops[hi - 1];
        let (x1, v1) = self.stops[hi];
        let t = ((x - x0) / (x1 - x0)) as f32;
        v0.lerp(v1, t)
    }
}

/// The three size ramps written into the render buffers.
#[derive(Clone, Debug)]
pub struct SizeStops {
    pub apparent: Stops<f32>,
    pub absolute: Stops<f32>,
    pub uniform_px: f32,
}

impl Default for SizeStops {
    fn default() -> Self {
        Self {
            apparent: Stops::new(&APPARENT_SIZE_STOPS),
            absolute: Stops::new(&ABSOLUTE_SIZE_STOPS),
            uniform_px: UNIFORM_SIZE_PX,
        }
    }
}

impl SizeStops {
    /// Scales every stop, e.g. for high-density displays that want larger
    /// logical sizes. The ramp shape is unchanged.
    pub fn scaled(&self, factor: f32) -> Self {
        let scale = |s: &Stops<f32>| Stops {
            stops: s.stops.iter().map(|&(x, v)| (x, v * factor)).collect(),
        };
        Self {
            apparent: scale(&self.apparent),
            absolute: scale(&self.absolute),
            uniform_px: self.uniform_px * factor,
        }
    }
}

/// Natural and observer-friendly colour ramps.
#[derive(Clone, Debug)]
pub struct ColorRamp {
    stops: Stops<[f32; 3]>,
    saturation: f32,
}

impl Default for ColorRamp {
    fn default() -> Self {
        Self {
            stops: Stops::new(&COLOR_INDEX_STOPS),
            saturation: OBSERVER_SATURATION,
        }
    }
}

impl ColorRamp {
    pub fn natural(&self, color_index: f64) -> [f32; 3] {
        self.stops.sample(color_index)
    }

    pub fn observer(&self, color_index: f64) -> [f32; 3] {
        saturate(self.natural(color_index), self.saturation)
    }
}

/// Pushes a colour away from its luma by `gain`, clamped to [0, 1].
pub fn saturate(rgb: [f32; 3], gain: f32) -> [f32; 3] {
    let luma = 0.2126 * rgb[0] + 0.7152 * rgb[1] + 0.0722 * rgb[2];
    rgb.map(|c| (luma + (c - luma) * gain).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ramp_hits_stops_and_midpoints() {
        let s = Stops::new(&APPARENT_SIZE_STOPS);
        assert_relative_eq!(s.sample(3.0), 5.0);
        assert_relative_eq!(s.sample(4.0), 4.1, epsilon = 1e-5);
        assert_relative_eq!(s.sample(-10.0), 9.0);
        assert_relative_eq!(s.sample(30.0), 1.0);
    }

    #[test]
    fn size_ramps_decrease_with_magnitude() {
        let sizes = SizeStops::default();
        for ramp in [&sizes.apparent, &sizes.absolute] {
            let mut prev = f32::INFINITY;
            let mut m = -8.0;
            while m < 20.0 {
                let v = ramp.sample(m);
                assert!(v <= prev, "size increased at mag {m}");
                prev = v;
                m += 0.25;
            }
        }
    }

    #[test]
    fn nan_input_clamps_to_first_stop() {
        let s = Stops::new(&ABSOLUTE_SIZE_STOPS);
        assert_eq!(s.sample(f64::NAN), 8.0);
    }

    #[test]
    fn observer_colours_are_more_saturated() {
        let ramp = ColorRamp::default();
        let spread = |c: [f32; 3]| {
            c.iter().cloned().fold(f32::MIN, f32::max) - c.iter().cloned().fold(f32::MAX, f32::min)
        };
        for ci in [-0.3, 0.4, 1.5, 2.5] {
            assert!(spread(ramp.observer(ci)) >= spread(ramp.natural(ci)));
        }
    }

    #[test]
    fn scaled_keeps_shape() {
        let s = SizeStops::default().scaled(2.0);
        assert_relative_eq!(s.apparent.sample(3.0), 10.0);
        assert_relative_eq!(s.uniform_px, 4.0);
    }
}

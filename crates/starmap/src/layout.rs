//! Layout Projector: pure mappings from resolved points into NDC.
//!
//! Every layout produces a flat `Vec<f32>` of `2 * n` floats (x, y per point)
//! clamped to [-1, 1]. Axis ranges come from the data itself, widened by
//! [`PADDING_RATIO`] so no point sits on the visible edge, unless a
//! [`RangeHints`] entry pins the axis.

use crate::galactic::{centered_longitude, equatorial_to_galactic};
use crate::record::ResolvedPoint;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Fraction of an axis span added on each side of dynamic ranges.
pub const PADDING_RATIO: f64 = 0.05;
/// Half-width used when every value on an axis is identical.
pub const DEGENERATE_HALF_SPAN: f64 = 0.5;
/// Number of histogram bins along the value axis.
pub const HISTOGRAM_BINS: usize = 48;
/// NDC height of the tallest histogram band.
pub const HISTOGRAM_SPAN: f32 = 1.7;
/// NDC y of the histogram baseline.
pub const HISTOGRAM_BASE: f32 = -0.85;

/// The four layout slots. The discriminant is the slot index used by the
/// weight vectors and the shader's per-layout attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    Sky = 0,
    Scatter = 1,
    Galactic = 2,
    Histogram = 3,
}

impl LayoutKind {
    pub const ALL: [LayoutKind; 4] = [
        LayoutKind::Sky,
        LayoutKind::Scatter,
        LayoutKind::Galactic,
        LayoutKind::Histogram,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Sky => "Sky",
            Self::Scatter => "Scatter",
            Self::Galactic => "Galactic",
            Self::Histogram => "Histogram",
        }
    }
}

/// A physical property used as a layout axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Longitude,
    Latitude,
    ColorIndex,
    /// Inverted when vertical: bright (small) magnitudes at the top.
    AbsoluteMagnitude,
    /// Inverted when vertical.
    ApparentMagnitude,
    LogPeriod,
    LogRadius,
    DiscoveryYear,
}

impl Axis {
    pub fn value(self, p: &ResolvedPoint) -> f64 {
        match self {
            Axis::Longitude => p.lon_deg,
            Axis::Latitude => p.lat_deg,
            Axis::ColorIndex => p.color_index,
            Axis::AbsoluteMagnitude => p.abs_mag,
            Axis::ApparentMagnitude => p.apparent_mag,
            Axis::LogPeriod => p.orbital_period_days.log10(),
            Axis::LogRadius => p.radius_earth.log10(),
            Axis::DiscoveryYear => p.discovery_year as f64,
        }
    }

    #[inline]
    pub fn inverted(self) -> bool {
        matches!(self, Axis::AbsoluteMagnitude | Axis::ApparentMagnitude)
    }

    pub fn label(self) -> &'static str {
        match self {
            Axis::Longitude => "longitude (deg)",
            Axis::Latitude => "latitude (deg)",
            Axis::ColorIndex => "colour index",
            Axis::AbsoluteMagnitude => "absolute magnitude",
            Axis::ApparentMagnitude => "apparent magnitude",
            Axis::LogPeriod => "log10 period (days)",
            Axis::LogRadius => "log10 radius (Earth)",
            Axis::DiscoveryYear => "discovery year",
        }
    }
}

/// A closed interval on one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Data range of `values`, padded by [`PADDING_RATIO`] of the span.
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let (lo, hi) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });

        if lo > hi {
            return Self::new(-DEGENERATE_HALF_SPAN, DEGENERATE_HALF_SPAN);
        }
        let span = hi - lo;
        if span <= f64::EPSILON * hi.abs().max(1.0) {
            return Self::new(lo - DEGENERATE_HALF_SPAN, hi + DEGENERATE_HALF_SPAN);
        }
        let pad = span * PADDING_RATIO;
        Self::new(lo - pad, hi + pad)
    }

    #[inline]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Maps `v` into [-1, 1]; values outside the range clamp.
    #[inline]
    pub fn to_ndc(&self, v: f64) -> f32 {
        let t = 2.0 * (v - self.min) / self.span() - 1.0;
        if t.is_nan() {
            return 0.0;
        }
        (t as f32).clamp(-1.0, 1.0)
    }

    #[inline]
    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

/// Optional fixed ranges that override the dynamic, padded ones.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RangeHints {
    pub x: Option<AxisRange>,
    pub y: Option<AxisRange>,
}

impl RangeHints {
    pub const NONE: RangeHints = RangeHints { x: None, y: None };

    /// Full celestial sphere: longitude [0, 360], latitude [-90, 90].
    pub const FULL_SKY: RangeHints = RangeHints {
        x: Some(AxisRange::new(0.0, 360.0)),
        y: Some(AxisRange::new(-90.0, 90.0)),
    };

    /// One full turn of right ascension on x, so a scrolled sky wraps
    /// seamlessly at the frame edge. Latitude keeps the data range.
    pub const SKY_LONGITUDE: RangeHints = RangeHints {
        x: Some(AxisRange::new(0.0, 360.0)),
        y: None,
    };

    /// One full turn of galactic longitude, centred on l = 0.
    pub const GALACTIC_LONGITUDE: RangeHints = RangeHints {
        x: Some(AxisRange::new(-180.0, 180.0)),
        y: None,
    };

    /// Default hints of a layout set: the scrolling layouts span a full turn.
    const fn scrolling() -> [RangeHints; 4] {
        [
            Self::SKY_LONGITUDE,
            Self::NONE,
            Self::GALACTIC_LONGITUDE,
            Self::NONE,
        ]
    }
}

/// A concrete layout mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Layout {
    /// Equirectangular longitude/latitude.
    Sky,
    Scatter { x: Axis, y: Axis },
    /// Galactic (l, b), l folded into (-180, 180].
    Galactic,
    /// Value along x, y jittered within a band whose height follows the bin
    /// count. `seed` makes the jitter reproducible.
    Histogram { axis: Axis, bins: usize, seed: u64 },
}

impl Layout {
    pub fn kind(&self) -> LayoutKind {
        match self {
            Layout::Sky => LayoutKind::Sky,
            Layout::Scatter { .. } => LayoutKind::Scatter,
            Layout::Galactic => LayoutKind::Galactic,
            Layout::Histogram { .. } => LayoutKind::Histogram,
        }
    }
}

/// The four layouts of one visualiser, indexed by [`LayoutKind`].
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutSet {
    pub layouts: [Layout; 4],
    pub hints: [RangeHints; 4],
}

impl LayoutSet {
    /// Stellar cartography: HR diagram scatter, apparent-magnitude histogram.
    pub fn stellar() -> Self {
        Self {
            layouts: [
                Layout::Sky,
                Layout::Scatter {
                    x: Axis::ColorIndex,
                    y: Axis::AbsoluteMagnitude,
                },
                Layout::Galactic,
                Layout::Histogram {
                    axis: Axis::ApparentMagnitude,
                    bins: HISTOGRAM_BINS,
                    seed: 0x5eed_0001,
                },
            ],
            hints: RangeHints::scrolling(),
        }
    }

    /// Exoplanet demo: period/radius scatter, discovery-year histogram.
    pub fn exoplanet() -> Self {
        Self {
            layouts: [
                Layout::Sky,
                Layout::Scatter {
                    x: Axis::LogPeriod,
                    y: Axis::LogRadius,
                },
                Layout::Galactic,
                Layout::Histogram {
                    axis: Axis::DiscoveryYear,
                    bins: 30,
                    seed: 0x5eed_0002,
                },
            ],
            hints: RangeHints::scrolling(),
        }
    }

    pub fn with_hints(mut self, kind: LayoutKind, hints: RangeHints) -> Self {
        self.hints[kind.index()] = hints;
        self
    }

    pub fn get(&self, kind: LayoutKind) -> &Layout {
        &self.layouts[kind.index()]
    }
}

/// Raw (unprojected) x/y values of a layout for one point.
fn raw_xy(layout: &Layout, p: &ResolvedPoint) -> (f64, f64) {
    match layout {
        Layout::Sky => (p.lon_deg, p.lat_deg),
        Layout::Scatter { x, y } => (x.value(p), y.value(p)),
        Layout::Galactic => {
            let (l, b) = equatorial_to_galactic(p.lon_deg, p.lat_deg);
            (centered_longitude(l), b)
        }
        Layout::Histogram { axis, .. } => (axis.value(p), 0.0),
    }
}

/// Vertical NDC for `axis`, flipped for magnitude-like axes.
fn vertical(range: AxisRange, axis: Axis, v: f64) -> f32 {
    let ndc = range.to_ndc(v);
    if axis.inverted() {
        -ndc
    } else {
        ndc
    }
}

/// Ranges actually used for a layout: hint if given, else padded data range.
pub fn axis_ranges(
    points: &[ResolvedPoint],
    layout: &Layout,
    hints: &RangeHints,
) -> (AxisRange, AxisRange) {
    let x = hints
        .x
        .unwrap_or_else(|| AxisRange::from_values(points.iter().map(|p| raw_xy(layout, p).0)));
    let y = match layout {
        // The histogram y axis is synthetic; its range is fixed NDC.
        Layout::Histogram { .. } => AxisRange::new(-1.0, 1.0),
        _ => hints
            .y
            .unwrap_or_else(|| AxisRange::from_values(points.iter().map(|p| raw_xy(layout, p).1))),
    };
    (x, y)
}

/// One histogram band: unjittered centre and the jitter half-height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Band {
    pub center: f32,
    pub half_height: f32,
}

/// Per-point histogram bands for `axis` over `bins` bins.
pub fn histogram_bands(points: &[ResolvedPoint], axis: Axis, bins: usize, x: AxisRange) -> Vec<Band> {
    let bins = bins.max(1);
    let bin_of = |p: &ResolvedPoint| {
        let t = (x.to_ndc(axis.value(p)) + 1.0) * 0.5;
        ((t * bins as f32) as usize).min(bins - 1)
    };

    let mut counts = vec![0usize; bins];
    for p in points {
        counts[bin_of(p)] += 1;
    }
    let tallest = counts.iter().copied().max().unwrap_or(0).max(1) as f32;

    points
        .iter()
        .map(|p| {
            let height = HISTOGRAM_SPAN * counts[bin_of(p)] as f32 / tallest;
            Band {
                center: HISTOGRAM_BASE + height * 0.5,
                half_height: height * 0.5,
            }
        })
        .collect()
}

/// Projects `points` through `layout`. Deterministic: identical inputs give
/// bitwise-identical outputs (histogram jitter is drawn from a seeded RNG).
pub fn project(points: &[ResolvedPoint], layout: &Layout, hints: &RangeHints) -> Vec<f32> {
    let (xr, yr) = axis_ranges(points, layout, hints);
    let mut out = Vec::with_capacity(points.len() * 2);

    match layout {
        Layout::Histogram { axis, bins, seed } => {
            let bands = histogram_bands(points, *axis, *bins, xr);
            let mut rng = StdRng::seed_from_u64(*seed);
            for (p, band) in points.iter().zip(&bands) {
                let jitter: f32 = rng.gen_range(-1.0..=1.0);
                out.push(xr.to_ndc(axis.value(p)));
                out.push((band.center + jitter * band.half_height).clamp(-1.0, 1.0));
            }
        }
        Layout::Scatter { x, y } => {
            for p in points {
                out.push(xr.to_ndc(x.value(p)));
                out.push(vertical(yr, *y, y.value(p)));
            }
        }
        Layout::Sky | Layout::Galactic => {
            for p in points {
                let (rx, ry) = raw_xy(layout, p);
                out.push(xr.to_ndc(rx));
                out.push(yr.to_ndc(ry));
            }
        }
    }

    out
}

/// Projects all four layouts of `set`, in parallel.
pub fn project_all(points: &[ResolvedPoint], set: &LayoutSet) -> [Vec<f32>; 4] {
    let projected: Vec<Vec<f32>> = LayoutKind::ALL
        .as_slice()
        .par_iter()
        .map(|kind| project(points, set.get(*kind), &set.hints[kind.index()]))
        .collect();

    let mut it = projected.into_iter();
    std::array::from_fn(|_| it.next().unwrap_or_default())
}

//! Attribute Buffer Builder: per-point, per-layout arrays for the GPU.

use crate::error::BufferError;
use crate::galactic::equatorial_to_galactic;
use crate::layout::{project_all, LayoutKind, LayoutSet};
use crate::palette::{ColorRamp, SizeStops};
use crate::record::ResolvedPoint;
use rayon::prelude::*;

/// Galactic latitude at which the alpha ramp saturates.
pub const ALPHA_FULL_LATITUDE_DEG: f64 = 30.0;
pub const ALPHA_FLOOR: f32 = 0.45;

/// Which size slot each layout reads, indexed by [`LayoutKind`].
pub const SIZE_SLOT: [SizeSlot; 4] = [
    SizeSlot::Apparent,
    SizeSlot::Absolute,
    SizeSlot::Apparent,
    SizeSlot::Uniform,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeSlot {
    Apparent = 0,
    Absolute = 1,
    Uniform = 2,
}

/// Per-instance record uploaded to the vertex buffer.
/// Must match the instance inputs in `star_points.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StarInstance {
    /// NDC position per layout slot.
    pub positions: [[f32; 2]; 4],
    pub color_natural: [f32; 3],
    pub color_observer: [f32; 3],
    /// Apparent, absolute and uniform sizes in logical px.
    pub sizes: [f32; 3],
    pub alpha: f32,
}

const _: [(); 72] = [(); std::mem::size_of::<StarInstance>()];

/// Immutable flat attribute arrays, all indexed by point index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderBuffers {
    /// `2 * len` floats per layout.
    pub positions: [Vec<f32>; 4],
    /// Natural and observer-friendly RGB, `3 * len` floats each.
    pub colors: [Vec<f32>; 2],
    /// Apparent, absolute, uniform; `len` floats each.
    pub sizes: [Vec<f32>; 3],
    pub alpha: Vec<f32>,
    len: usize,
}

/// Alpha from galactic latitude: dimmer in the crowded plane.
#[inline]
pub fn latitude_alpha(b_deg: f64) -> f32 {
    let t = (b_deg.abs() / ALPHA_FULL_LATITUDE_DEG).min(1.0) as f32;
    ALPHA_FLOOR + (1.0 - ALPHA_FLOOR) * t
}

struct PointAttributes {
    natural: [f32; 3],
    observer: [f32; 3],
    sizes: [f32; 3],
    alpha: f32,
}

impl RenderBuffers {
    /// Packs projected layouts and derived attributes. Fails only when a
    /// layout does not hold exactly two floats per point.
    pub fn build(
        points: &[ResolvedPoint],
        positions: &[Vec<f32>; 4],
        sizes: &SizeStops,
    ) -> Result<Self, BufferError> {
        let n = points.len();
        for (layout, p) in positions.iter().enumerate() {
            if p.len() != 2 * n {
                return Err(BufferError::LayoutLength {
                    layout,
                    got: p.len(),
                    expected: 2 * n,
                });
            }
        }

        let ramp = ColorRamp::default();
        let attrs: Vec<PointAttributes> = points
            .par_iter()
            .map(|p| {
                let (_, b) = equatorial_to_galactic(p.lon_deg, p.lat_deg);
                PointAttributes {
                    natural: ramp.natural(p.color_index),
                    observer: ramp.observer(p.color_index),
                    sizes: [
                        sizes.apparent.sample(p.apparent_mag),
                        sizes.absolute.sample(p.abs_mag),
                        sizes.uniform_px,
                    ],
                    alpha: latitude_alpha(b),
                }
            })
            .collect();

        let mut out = Self {
            positions: positions.clone(),
            colors: [Vec::with_capacity(3 * n), Vec::with_capacity(3 * n)],
            sizes: [Vec::with_capacity(n), Vec::with_capacity(n), Vec::with_capacity(n)],
            alpha: Vec::with_capacity(n),
            len: n,
        };
        for a in &attrs {
            out.colors[0].extend_from_slice(&a.natural);
            out.colors[1].extend_from_slice(&a.observer);
            for (slot, s) in out.sizes.iter_mut().zip(a.sizes) {
                slot.push(s);
            }
            out.alpha.push(a.alpha);
        }

        log::debug!("built render buffers for {n} points");
        Ok(out)
    }

    /// Projects every layout of `set` and builds with default size stops.
    pub fn from_dataset(points: &[ResolvedPoint], set: &LayoutSet) -> Self {
        let positions = project_all(points, set);
        // project_all always yields 2n floats per layout.
        Self::build(points, &positions, &SizeStops::default()).unwrap_or_default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// NDC position of point `i` in `layout`.
    pub fn position(&self, layout: LayoutKind, i: usize) -> [f32; 2] {
        let p = &self.positions[layout.index()];
        [p[2 * i], p[2 * i + 1]]
    }

    /// Logical size of point `i` as `layout` draws it.
    pub fn size(&self, layout: LayoutKind, i: usize) -> f32 {
        self.sizes[SIZE_SLOT[layout.index()] as usize][i]
    }

    /// Per-layout positions of point `i`, the input of the transition blend.
    pub fn positions_of(&self, i: usize) -> [[f32; 2]; 4] {
        LayoutKind::ALL.map(|k| self.position(k, i))
    }

    /// Interleaves the flat arrays into instance records.
    pub fn instances(&self) -> Vec<StarInstance> {
        (0..self.len)
            .into_par_iter()
            .map(|i| {
                let rgb = |c: &Vec<f32>| [c[3 * i], c[3 * i + 1], c[3 * i + 2]];
                StarInstance {
                    positions: self.positions_of(i),
                    color_natural: rgb(&self.colors[0]),
                    color_observer: rgb(&self.colors[1]),
                    sizes: [self.sizes[0][i], self.sizes[1][i], self.sizes[2][i]],
                    alpha: self.alpha[i],
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PointRecord;
    use approx::assert_relative_eq;

    fn pts() -> Vec<ResolvedPoint> {
        [(10.0, 5.0, 2.0), (200.0, -30.0, 8.0), (300.0, 70.0, 11.0)]
            .iter()
            .map(|&(lon, lat, mag)| {
                PointRecord {
                    lon_deg: Some(lon),
                    lat_deg: Some(lat),
                    apparent_mag: Some(mag),
                    ..Default::default()
                }
                .resolve()
            })
            .collect()
    }

    #[test]
    fn every_array_has_len_points() {
        let p = pts();
        let b = RenderBuffers::from_dataset(&p, &LayoutSet::stellar());
        assert_eq!(b.len(), 3);
        for pos in &b.positions {
            assert_eq!(pos.len(), 6);
        }
        for c in &b.colors {
            assert_eq!(c.len(), 9);
        }
        for s in &b.sizes {
            assert_eq!(s.len(), 3);
        }
        assert_eq!(b.alpha.len(), 3);
        assert_eq!(b.instances().len(), 3);
    }

    #[test]
    fn mismatched_layout_is_rejected() {
        let p = pts();
        let mut positions = project_all(&p, &LayoutSet::stellar());
        positions[2].pop();
        let err = RenderBuffers::build(&p, &positions, &SizeStops::default()).unwrap_err();
        assert_eq!(
            err,
            BufferError::LayoutLength {
                layout: 2,
                got: 5,
                expected: 6
            }
        );
    }

    #[test]
    fn brighter_points_are_larger() {
        let b = RenderBuffers::from_dataset(&pts(), &LayoutSet::stellar());
        assert!(b.size(LayoutKind::Sky, 0) > b.size(LayoutKind::Sky, 1));
        assert!(b.size(LayoutKind::Sky, 1) > b.size(LayoutKind::Sky, 2));
        assert_eq!(b.size(LayoutKind::Histogram, 0), b.size(LayoutKind::Histogram, 2));
    }

    #[test]
    fn latitude_alpha_ramp() {
        assert_relative_eq!(latitude_alpha(0.0), 0.45);
        assert_relative_eq!(latitude_alpha(-15.0), 0.725);
        assert_relative_eq!(latitude_alpha(60.0), 1.0);
    }

    #[test]
    fn instances_interleave_flat_arrays() {
        let b = RenderBuffers::from_dataset(&pts(), &LayoutSet::stellar());
        let inst = b.instances();
        assert_eq!(inst[1].positions[1], b.position(LayoutKind::Scatter, 1));
        assert_eq!(inst[1].color_natural[0], b.colors[0][3]);
        assert_eq!(inst[2].alpha, b.alpha[2]);
        let bytes: &[u8] = bytemuck::cast_slice(&inst);
        assert_eq!(bytes.len(), 3 * 72);
    }

    #[test]
    fn empty_dataset_builds_empty_buffers() {
        let b = RenderBuffers::from_dataset(&[], &LayoutSet::stellar());
        assert!(b.is_empty());
        assert!(b.instances().is_empty());
    }
}

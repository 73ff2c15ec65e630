//! Seeded 3D simplex noise, fractal sums and the curl field built on them.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

pub const FBM_OCTAVES: u32 = 4;
pub const FBM_LACUNARITY: f64 = 2.0;
pub const FBM_GAIN: f64 = 0.5;
/// Central-difference step, as a fraction of the sampling scale.
pub const CURL_EPSILON: f64 = 1e-2;

const F3: f64 = 1.0 / 3.0;
const G3: f64 = 1.0 / 6.0;

const GRAD3: [[f64; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

/// 3D simplex noise with a permutation table shuffled from `seed`.
#[derive(Clone)]
pub struct Simplex3 {
    perm: [u8; 512],
}

impl std::fmt::Debug for Simplex3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simplex3").finish_non_exhaustive()
    }
}

#[inline]
fn fast_floor(x: f64) -> i64 {
    x.floor() as i64
}

impl Simplex3 {
    pub fn new(seed: u64) -> Self {
        let mut base: Vec<u8> = (0..=255).collect();
        base.shuffle(&mut StdRng::seed_from_u64(seed));
        let mut perm = [0u8; 512];
        for (i, p) in perm.iter_mut().enumerate() {
            *p = base[i & 255];
        }
        Self { perm }
    }

    #[inline]
    fn hash(&self, i: i64, j: i64, k: i64) -> usize {
        let (i, j, k) = ((i & 255) as usize, (j & 255) as usize, (k & 255) as usize);
        self.perm[i + self.perm[j + self.perm[k] as usize] as usize] as usize % 12
    }

    /// Single-octave noise, roughly in [-1, 1].
    pub fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        // Skew into simplex cell space.
        let s = (x + y + z) * F3;
        let (i, j, k) = (fast_floor(x + s), fast_floor(y + s), fast_floor(z + s));
        let t = (i + j + k) as f64 * G3;
        let x0 = x - (i as f64 - t);
        let y0 = y - (j as f64 - t);
        let z0 = z - (k as f64 - t);

        // Which of the six tetrahedra we are in.
        let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
            if y0 >= z0 {
                (1, 0, 0, 1, 1, 0)
            } else if x0 >= z0 {
                (1, 0, 0, 1, 0, 1)
            } else {
                (0, 0, 1, 1, 0, 1)
            }
        } else if y0 < z0 {
            (0, 0, 1, 0, 1, 1)
        } else if x0 < z0 {
            (0, 1, 0, 0, 1, 1)
        } else {
            (0, 1, 0, 1, 1, 0)
        };

        let corners = [
            (x0, y0, z0, 0, 0, 0),
            (
                x0 - i1 as f64 + G3,
                y0 - j1 as f64 + G3,
                z0 - k1 as f64 + G3,
                i1,
                j1,
                k1,
            ),
            (
                x0 - i2 as f64 + 2.0 * G3,
                y0 - j2 as f64 + 2.0 * G3,
                z0 - k2 as f64 + 2.0 * G3,
                i2,
                j2,
                k2,
            ),
            (x0 - 1.0 + 3.0 * G3, y0 - 1.0 + 3.0 * G3, z0 - 1.0 + 3.0 * G3, 1, 1, 1),
        ];

        let sum: f64 = corners
            .iter()
            .map(|&(dx, dy, dz, oi, oj, ok)| {
                let falloff = 0.6 - dx * dx - dy * dy - dz * dz;
                if falloff <= 0.0 {
                    return 0.0;
                }
                let g = GRAD3[self.hash(i + oi, j + oj, k + ok)];
                let f2 = falloff * falloff;
                f2 * f2 * (g[0] * dx + g[1] * dy + g[2] * dz)
            })
            .sum();
        32.0 * sum
    }

    /// Fractal sum of [`FBM_OCTAVES`] octaves, normalized by total amplitude.
    pub fn fbm(&self, x: f64, y: f64, z: f64) -> f64 {
        let mut amp = 1.0;
        let mut freq = 1.0;
        let mut total = 0.0;
        let mut norm = 0.0;
        for _ in 0..FBM_OCTAVES {
            total += amp * self.noise(x * freq, y * freq, z * freq);
            norm += amp;
            amp *= FBM_GAIN;
            freq *= FBM_LACUNARITY;
        }
        total / norm
    }

    /// Curl of the scalar potential `psi(x, y) = fbm(x * scale, y * scale, z)`,
    /// returned as `(d psi/dy, -d psi/dx)`.
    ///
    /// Derivatives are central differences in noise space with step
    /// `CURL_EPSILON * scale`, so the velocity is in noise-space units and
    /// its magnitude does not depend on `scale`.
    pub fn curl(&self, x: f64, y: f64, z: f64, scale: f64) -> (f64, f64) {
        let (nx, ny) = (x * scale, y * scale);
        let e = CURL_EPSILON * scale;
        let dpsi_dx = (self.fbm(nx + e, ny, z) - self.fbm(nx - e, ny, z)) / (2.0 * e);
        let dpsi_dy = (self.fbm(nx, ny + e, z) - self.fbm(nx, ny - e, z)) / (2.0 * e);
        (dpsi_dy, -dpsi_dx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_field() {
        let a = Simplex3::new(42);
        let b = Simplex3::new(42);
        let c = Simplex3::new(43);
        let p = (1.3, -2.7, 0.4);
        assert_eq!(a.noise(p.0, p.1, p.2), b.noise(p.0, p.1, p.2));
        let differs = (0..32).any(|i| {
            let x = i as f64 * 0.37;
            a.noise(x, 0.5, 0.1) != c.noise(x, 0.5, 0.1)
        });
        assert!(differs);
    }

    #[test]
    fn noise_is_bounded() {
        let n = Simplex3::new(7);
        for i in 0..2_000 {
            let t = i as f64 * 0.173;
            let v = n.noise(t, t * 0.7 - 3.0, t * 0.31);
            assert!(v.abs() <= 1.05, "noise {v} out of range");
            assert!(n.fbm(t, -t, 0.5).abs() <= 1.05);
        }
    }

    #[test]
    fn noise_vanishes_on_lattice_points() {
        let n = Simplex3::new(1);
        assert!(n.noise(0.0, 0.0, 0.0).abs() < 1e-12);
        assert!(n.noise(3.0, -2.0, 5.0).abs() < 1e-12);
    }

    #[test]
    fn curl_is_divergence_free() {
        let n = Simplex3::new(2024);
        let scale = 0.004;
        let z = 0.75;
        // Finite-difference step in world units.
        let h = CURL_EPSILON;
        let mut worst: f64 = 0.0;
        let mut magnitude: f64 = 0.0;
        for gy in 0..24 {
            for gx in 0..24 {
                let (x, y) = (gx as f64 * 37.0, gy as f64 * 29.0);
                let (vx_p, _) = n.curl(x + h, y, z, scale);
                let (vx_m, _) = n.curl(x - h, y, z, scale);
                let (_, vy_p) = n.curl(x, y + h, z, scale);
                let (_, vy_m) = n.curl(x, y - h, z, scale);
                let div = (vx_p - vx_m) / (2.0 * h) + (vy_p - vy_m) / (2.0 * h);
                worst = worst.max(div.abs());
                magnitude = magnitude.max(n.curl(x, y, z, scale).0.abs());
            }
        }
        assert!(magnitude > 0.0);
        assert!(worst < 1e-3 * magnitude.max(1e-3), "divergence {worst} vs |v| {magnitude}");
    }
}

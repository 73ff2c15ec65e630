//! Seeded synthetic catalogues, used directly or as the loader's fallback.

use crate::galactic::galactic_to_equatorial;
use crate::record::{DiscoveryMethod, PointRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::str::FromStr;

/// Disc scale height of the synthetic star field, degrees of latitude.
pub const DISC_SCALE_DEG: f64 = 12.0;
/// Fraction of stars drawn isotropically instead of from the disc.
pub const HALO_FRACTION: f64 = 0.2;
pub const GIANT_FRACTION: f64 = 0.12;
/// Distance range in parsecs, sampled log-uniformly.
pub const DISTANCE_PC: (f64, f64) = (5.0, 2_000.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyntheticKind {
    Stars,
    Exoplanets,
}

impl fmt::Display for SyntheticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyntheticKind::Stars => "stars",
            SyntheticKind::Exoplanets => "exoplanets",
        })
    }
}

impl FromStr for SyntheticKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stars" | "star" | "gaia" => Ok(SyntheticKind::Stars),
            "exoplanets" | "exoplanet" | "planets" => Ok(SyntheticKind::Exoplanets),
            other => Err(format!("unknown synthetic catalogue '{other}'")),
        }
    }
}

pub fn generate(kind: SyntheticKind, count: usize, seed: u64) -> Vec<PointRecord> {
    match kind {
        SyntheticKind::Stars => stars(count, seed),
        SyntheticKind::Exoplanets => exoplanets(count, seed),
    }
}

/// Rough standard normal from the sum of four uniforms.
fn approx_normal(rng: &mut StdRng) -> f64 {
    let s: f64 = (0..4).map(|_| rng.gen::<f64>()).sum();
    (s - 2.0) * (3.0f64).sqrt()
}

fn log_uniform(rng: &mut StdRng, lo: f64, hi: f64) -> f64 {
    (rng.gen_range(lo.ln()..hi.ln())).exp()
}

/// Isotropic latitude in degrees.
fn isotropic_lat(rng: &mut StdRng) -> f64 {
    rng.gen_range(-1.0f64..1.0).asin().to_degrees()
}

/// Stars concentrated towards the galactic plane, with a main sequence and a
/// giant branch. Positions are equatorial; absolute magnitude is left for the
/// resolver to derive from parallax.
pub fn stars(count: usize, seed: u64) -> Vec<PointRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let l = rng.gen_range(0.0..360.0);
            let b = if rng.gen_bool(HALO_FRACTION) {
                isotropic_lat(&mut rng)
            } else {
                let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                let u: f64 = rng.gen_range(f64::EPSILON..1.0);
                (sign * -u.ln() * DISC_SCALE_DEG).clamp(-90.0, 90.0)
            };
            let (ra, dec) = galactic_to_equatorial(l, b);

            let (color_index, abs_mag) = if rng.gen_bool(GIANT_FRACTION) {
                let ci = rng.gen_range(0.8..1.9);
                (ci, 0.8 - 1.2 * (ci - 0.8) + 0.4 * approx_normal(&mut rng))
            } else {
                let ci = rng.gen_range(-0.3..2.8);
                (ci, 1.0 + 4.2 * ci + 0.35 * approx_normal(&mut rng))
            };
            let distance_pc = log_uniform(&mut rng, DISTANCE_PC.0, DISTANCE_PC.1);
            let apparent_mag = abs_mag + 5.0 * distance_pc.log10() - 5.0;

            PointRecord {
                lon_deg: Some(ra),
                lat_deg: Some(dec),
                color_index: Some(color_index),
                apparent_mag: Some(apparent_mag),
                parallax_mas: Some(1000.0 / distance_pc),
                ..Default::default()
            }
        })
        .collect()
}

const METHOD_WEIGHTS: [(DiscoveryMethod, f64); 6] = [
    (DiscoveryMethod::Transit, 0.74),
    (DiscoveryMethod::RadialVelocity, 0.19),
    (DiscoveryMethod::Microlensing, 0.04),
    (DiscoveryMethod::Imaging, 0.02),
    (DiscoveryMethod::TransitTiming, 0.006),
    (DiscoveryMethod::Astrometry, 0.004),
];

fn pick_method(rng: &mut StdRng) -> DiscoveryMethod {
    let total: f64 = METHOD_WEIGHTS.iter().map(|(_, w)| w).sum();
    let mut r = rng.gen_range(0.0..total);
    for (m, w) in METHOD_WEIGHTS {
        if r < w {
            return m;
        }
        r -= w;
    }
    DiscoveryMethod::Transit
}

/// Exoplanet host stars spread over the sky with log-uniform orbits and
/// radii, discoveries skewed towards recent years.
pub fn exoplanets(count: usize, seed: u64) -> Vec<PointRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let ra = rng.gen_range(0.0..360.0);
            let dec = isotropic_lat(&mut rng);
            let recent = rng.gen::<f64>().max(rng.gen::<f64>());
            let year = 1995 + (recent * 30.0).floor().min(29.0) as i32;
            PointRecord {
                lon_deg: Some(ra),
                lat_deg: Some(dec),
                color_index: Some(rng.gen_range(0.3..1.6)),
                apparent_mag: Some(rng.gen_range(6.0..16.0)),
                orbital_period_days: Some(log_uniform(&mut rng, 0.5, 1_000.0)),
                radius_earth: Some(log_uniform(&mut rng, 0.5, 20.0)),
                discovery_year: Some(year),
                discovery_method: Some(pick_method(&mut rng).label().to_string()),
                ..Default::default()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galactic::equatorial_to_galactic;
    use crate::record::{resolve_all, FallbackMask};

    #[test]
    fn generation_is_deterministic() {
        assert_eq!(stars(200, 5), stars(200, 5));
        assert_ne!(stars(200, 5), stars(200, 6));
        assert_eq!(exoplanets(50, 1), exoplanets(50, 1));
    }

    #[test]
    fn stars_crowd_the_galactic_plane() {
        let pts = stars(4_000, 3);
        let near_plane = pts
            .iter()
            .filter(|r| {
                let (_, b) = equatorial_to_galactic(r.lon_deg.unwrap_or(0.0), r.lat_deg.unwrap_or(0.0));
                b.abs() < 20.0
            })
            .count();
        // An isotropic sky would put about 34% within 20 degrees.
        assert!(near_plane as f64 / pts.len() as f64 > 0.55);
    }

    #[test]
    fn star_abs_mag_comes_from_parallax() {
        let resolved = resolve_all(&stars(100, 9));
        assert!(resolved
            .iter()
            .all(|p| !p.fallbacks.contains(FallbackMask::ABS_MAG)));
    }

    #[test]
    fn exoplanet_fields_are_in_range() {
        for p in resolve_all(&exoplanets(500, 4)) {
            assert!((1995..=2024).contains(&p.discovery_year));
            assert!((0.5..=1_000.0).contains(&p.orbital_period_days));
            assert!((0.5..=20.0).contains(&p.radius_earth));
            assert_ne!(p.discovery_method, DiscoveryMethod::Unknown);
        }
    }

    #[test]
    fn kind_parses() {
        assert_eq!("Stars".parse::<SyntheticKind>(), Ok(SyntheticKind::Stars));
        assert_eq!("planets".parse::<SyntheticKind>(), Ok(SyntheticKind::Exoplanets));
        assert!("comets".parse::<SyntheticKind>().is_err());
    }
}

//! Point records: the sparse catalogue input and its resolved form.
//!
//! Catalogues differ in which fields they carry (a Gaia extract has parallax
//! but no orbital period; an exoplanet table has periods but often no colour).
//! [`PointRecord`] mirrors the input exactly. [`ResolvedPoint`] is computed
//! once at load time with every field filled, so per-frame code never checks
//! for missing data.

use serde::{Deserialize, Serialize};

pub const DEFAULT_COLOR_INDEX: f64 = 0.65;
pub const DEFAULT_APPARENT_MAG: f64 = 12.0;
/// Absolute magnitude of the Sun, used when parallax is unusable.
pub const DEFAULT_ABS_MAG: f64 = 4.83;
pub const DEFAULT_PERIOD_DAYS: f64 = 10.0;
pub const DEFAULT_RADIUS_EARTH: f64 = 1.0;
pub const DEFAULT_DISCOVERY_YEAR: i32 = 2000;

/// One catalogue entry as found in the source document.
///
/// A field whose value has the wrong type (`"parallax": "n/a"`) reads as
/// missing, so it takes its fallback instead of failing the whole document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointRecord {
    /// Sky longitude (right ascension) in degrees.
    #[serde(alias = "ra", alias = "lon", deserialize_with = "lenient::number")]
    pub lon_deg: Option<f64>,
    /// Sky latitude (declination) in degrees.
    #[serde(alias = "dec", alias = "lat", deserialize_with = "lenient::number")]
    pub lat_deg: Option<f64>,
    /// BP-RP (or B-V) colour index.
    #[serde(alias = "bp_rp", alias = "ci", deserialize_with = "lenient::number")]
    pub color_index: Option<f64>,
    #[serde(alias = "phot_g_mean_mag", alias = "mag", deserialize_with = "lenient::number")]
    pub apparent_mag: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub abs_mag: Option<f64>,
    /// Parallax in milliarcseconds.
    #[serde(alias = "parallax", deserialize_with = "lenient::number")]
    pub parallax_mas: Option<f64>,
    #[serde(alias = "period", deserialize_with = "lenient::number")]
    pub orbital_period_days: Option<f64>,
    #[serde(alias = "radius", deserialize_with = "lenient::number")]
    pub radius_earth: Option<f64>,
    #[serde(alias = "year", deserialize_with = "lenient::year")]
    pub discovery_year: Option<i32>,
    #[serde(alias = "method", deserialize_with = "lenient::text")]
    pub discovery_method: Option<String>,
}

/// Field readers that map an unusable value to `None`.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn read<'de, D: Deserializer<'de>, T>(d: D, f: impl FnOnce(&Value) -> Option<T>) -> Result<Option<T>, D::Error> {
        let v = Value::deserialize(d)?;
        let out = f(&v);
        if out.is_none() && !v.is_null() {
            log::debug!("ignoring unusable field value {v}");
        }
        Ok(out)
    }

    /// Numbers, or strings that parse as one.
    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        read(d, |v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// Whole numbers, including `2014.0` and `"2014"`.
    pub fn year<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
        read(d, |v| {
            let x = match v {
                Value::Number(n) => n.as_f64()?,
                Value::String(s) => s.trim().parse::<f64>().ok()?,
                _ => return None,
            };
            (x.is_finite() && x.fract() == 0.0 && x.abs() <= i32::MAX as f64).then_some(x as i32)
        })
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        read(d, |v| v.as_str().map(str::to_owned))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscoveryMethod {
    Transit,
    RadialVelocity,
    Imaging,
    Microlensing,
    Astrometry,
    TransitTiming,
    Unknown,
}

impl DiscoveryMethod {
    /// Parses the free-text method names used by exoplanet archives.
    pub fn parse(s: &str) -> Self {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "transit" | "transits" => Self::Transit,
            "radialvelocity" | "rv" | "doppler" => Self::RadialVelocity,
            "imaging" | "directimaging" => Self::Imaging,
            "microlensing" => Self::Microlensing,
            "astrometry" => Self::Astrometry,
            "transittiming" | "transittimingvariations" | "ttv" => Self::TransitTiming,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Transit => "Transit",
            Self::RadialVelocity => "Radial Velocity",
            Self::Imaging => "Imaging",
            Self::Microlensing => "Microlensing",
            Self::Astrometry => "Astrometry",
            Self::TransitTiming => "Transit Timing",
            Self::Unknown => "Unknown",
        }
    }
}

/// Bitset of fields that were filled by a fallback rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FallbackMask(u16);

impl FallbackMask {
    pub const LON: Self = Self(1 << 0);
    pub const LAT: Self = Self(1 << 1);
    pub const COLOR_INDEX: Self = Self(1 << 2);
    pub const APPARENT_MAG: Self = Self(1 << 3);
    pub const ABS_MAG: Self = Self(1 << 4);
    pub const PERIOD: Self = Self(1 << 5);
    pub const RADIUS: Self = Self(1 << 6);
    pub const YEAR: Self = Self(1 << 7);
    pub const METHOD: Self = Self(1 << 8);

    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }
}

/// A record with every field resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedPoint {
    /// Longitude in [0, 360).
    pub lon_deg: f64,
    /// Latitude in [-90, 90].
    pub lat_deg: f64,
    pub color_index: f64,
    pub apparent_mag: f64,
    pub abs_mag: f64,
    pub orbital_period_days: f64,
    pub radius_earth: f64,
    pub discovery_year: i32,
    pub discovery_method: DiscoveryMethod,
    pub fallbacks: FallbackMask,
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

fn positive(v: Option<f64>) -> Option<f64> {
    finite(v).filter(|x| *x > 0.0)
}

/// Absolute magnitude from apparent magnitude and parallax (mas).
///
/// `M = m + 5·log10(p / 1000) + 5`. Returns `None` for non-positive parallax.
pub fn absolute_magnitude(apparent_mag: f64, parallax_mas: f64) -> Option<f64> {
    if parallax_mas > 0.0 && parallax_mas.is_finite() {
        Some(apparent_mag + 5.0 * parallax_mas.log10() - 10.0)
    } else {
        None
    }
}

impl PointRecord {
    /// Fills every missing field from the fallback table. Never fails.
    pub fn resolve(&self) -> ResolvedPoint {
        let mut fallbacks = FallbackMask::default();
        let mut or_default = |v: Option<f64>, default: f64, bit: FallbackMask| match v {
            Some(x) => x,
            None => {
                fallbacks.insert(bit);
                default
            }
        };

        let lon_deg = or_default(finite(self.lon_deg), 0.0, FallbackMask::LON).rem_euclid(360.0);
        let lat_deg = or_default(finite(self.lat_deg), 0.0, FallbackMask::LAT).clamp(-90.0, 90.0);
        let color_index = or_default(
            finite(self.color_index),
            DEFAULT_COLOR_INDEX,
            FallbackMask::COLOR_INDEX,
        );
        let apparent_mag = or_default(
            finite(self.apparent_mag),
            DEFAULT_APPARENT_MAG,
            FallbackMask::APPARENT_MAG,
        );
        let derived_abs = finite(self.parallax_mas)
            .and_then(|p| absolute_magnitude(apparent_mag, p));
        let abs_mag = or_default(
            finite(self.abs_mag).or(derived_abs),
            DEFAULT_ABS_MAG,
            FallbackMask::ABS_MAG,
        );
        let orbital_period_days = or_default(
            positive(self.orbital_period_days),
            DEFAULT_PERIOD_DAYS,
            FallbackMask::PERIOD,
        );
        let radius_earth = or_default(
            positive(self.radius_earth),
            DEFAULT_RADIUS_EARTH,
            FallbackMask::RADIUS,
        );

        let discovery_year = match self.discovery_year {
            Some(y) => y,
            None => {
                fallbacks.insert(FallbackMask::YEAR);
                DEFAULT_DISCOVERY_YEAR
            }
        };
        let discovery_method = match self.discovery_method.as_deref() {
            Some(m) => DiscoveryMethod::parse(m),
            None => {
                fallbacks.insert(FallbackMask::METHOD);
                DiscoveryMethod::Unknown
            }
        };

        ResolvedPoint {
            lon_deg,
            lat_deg,
            color_index,
            apparent_mag,
            abs_mag,
            orbital_period_days,
            radius_earth,
            discovery_year,
            discovery_method,
            fallbacks,
        }
    }
}

/// Resolves a whole catalogue, preserving order and count.
pub fn resolve_all(records: &[PointRecord]) -> Vec<ResolvedPoint> {
    records.iter().map(PointRecord::resolve).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_record_takes_every_fallback() {
        let p = PointRecord::default().resolve();
        assert_eq!(p.lon_deg, 0.0);
        assert_eq!(p.lat_deg, 0.0);
        assert_eq!(p.color_index, DEFAULT_COLOR_INDEX);
        assert_eq!(p.apparent_mag, DEFAULT_APPARENT_MAG);
        assert_eq!(p.abs_mag, DEFAULT_ABS_MAG);
        assert_eq!(p.discovery_method, DiscoveryMethod::Unknown);
        assert_eq!(p.fallbacks.count(), 9);
    }

    #[test]
    fn abs_mag_derived_from_parallax() {
        // 100 mas => 10 pc, so M == m.
        let rec = PointRecord {
            apparent_mag: Some(6.0),
            parallax_mas: Some(100.0),
            ..Default::default()
        };
        let p = rec.resolve();
        assert_relative_eq!(p.abs_mag, 6.0, epsilon = 1e-12);
        assert!(!p.fallbacks.contains(FallbackMask::ABS_MAG));
    }

    #[test]
    fn non_positive_parallax_defaults_abs_mag() {
        let rec = PointRecord {
            apparent_mag: Some(6.0),
            parallax_mas: Some(-0.3),
            ..Default::default()
        };
        let p = rec.resolve();
        assert_eq!(p.abs_mag, DEFAULT_ABS_MAG);
        assert!(p.fallbacks.contains(FallbackMask::ABS_MAG));
    }

    #[test]
    fn explicit_abs_mag_wins_over_parallax() {
        let rec = PointRecord {
            apparent_mag: Some(6.0),
            parallax_mas: Some(100.0),
            abs_mag: Some(-1.0),
            ..Default::default()
        };
        assert_eq!(rec.resolve().abs_mag, -1.0);
    }

    #[test]
    fn coordinates_are_normalized() {
        let rec = PointRecord {
            lon_deg: Some(-30.0),
            lat_deg: Some(97.0),
            ..Default::default()
        };
        let p = rec.resolve();
        assert_relative_eq!(p.lon_deg, 330.0);
        assert_eq!(p.lat_deg, 90.0);
    }

    #[test]
    fn nan_counts_as_missing() {
        let rec = PointRecord {
            color_index: Some(f64::NAN),
            ..Default::default()
        };
        let p = rec.resolve();
        assert_eq!(p.color_index, DEFAULT_COLOR_INDEX);
        assert!(p.fallbacks.contains(FallbackMask::COLOR_INDEX));
    }

    #[test]
    fn gaia_field_names_deserialize() {
        let json = r#"{"ra": 10.5, "dec": -3.0, "bp_rp": 1.2, "phot_g_mean_mag": 8.1, "parallax": 4.0}"#;
        let rec: PointRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.lon_deg, Some(10.5));
        assert_eq!(rec.lat_deg, Some(-3.0));
        assert_eq!(rec.color_index, Some(1.2));
        assert_eq!(rec.apparent_mag, Some(8.1));
        assert_eq!(rec.parallax_mas, Some(4.0));
    }

    #[test]
    fn wrong_typed_fields_read_as_missing() {
        let json = r#"{"ra": "12.5", "dec": true, "parallax": "n/a", "year": 2014.0,
                       "period": [1, 2], "method": 7, "radius": null}"#;
        let rec: PointRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.lon_deg, Some(12.5));
        assert_eq!(rec.lat_deg, None);
        assert_eq!(rec.parallax_mas, None);
        assert_eq!(rec.discovery_year, Some(2014));
        assert_eq!(rec.orbital_period_days, None);
        assert_eq!(rec.discovery_method, None);
        assert_eq!(rec.radius_earth, None);

        let p = rec.resolve();
        assert_eq!(p.discovery_year, 2014);
        assert!(!p.fallbacks.contains(FallbackMask::YEAR));
        assert!(p.fallbacks.contains(FallbackMask::ABS_MAG));
        assert!(p.fallbacks.contains(FallbackMask::PERIOD));
        assert!(p.fallbacks.contains(FallbackMask::METHOD));
    }

    #[test]
    fn fractional_year_is_not_truncated() {
        let rec: PointRecord = serde_json::from_str(r#"{"year": 2014.5}"#).unwrap();
        assert_eq!(rec.discovery_year, None);
        let rec: PointRecord = serde_json::from_str(r#"{"year": "1995"}"#).unwrap();
        assert_eq!(rec.discovery_year, Some(1995));
    }

    #[test]
    fn discovery_method_parsing() {
        assert_eq!(DiscoveryMethod::parse("Radial Velocity"), DiscoveryMethod::RadialVelocity);
        assert_eq!(DiscoveryMethod::parse("transit"), DiscoveryMethod::Transit);
        assert_eq!(
            DiscoveryMethod::parse("Transit Timing Variations"),
            DiscoveryMethod::TransitTiming
        );
        assert_eq!(DiscoveryMethod::parse("???"), DiscoveryMethod::Unknown);
    }
}

//! Equatorial (J2000) <-> galactic coordinate rotation.
//!
//! The pole and node constants are fixed J2000 values and are not tunable.

/// Right ascension of the north galactic pole, degrees.
pub const NGP_RA_DEG: f64 = 192.859_48;
/// Declination of the north galactic pole, degrees.
pub const NGP_DEC_DEG: f64 = 27.128_25;
/// Galactic longitude of the north celestial pole, degrees.
pub const NCP_L_DEG: f64 = 122.931_92;

/// Converts (RA, Dec) in degrees to galactic (l, b) in degrees, l in [0, 360).
pub fn equatorial_to_galactic(ra_deg: f64, dec_deg: f64) -> (f64, f64) {
    let (sin_dg, cos_dg) = NGP_DEC_DEG.to_radians().sin_cos();
    let (sin_d, cos_d) = dec_deg.to_radians().sin_cos();
    let (sin_da, cos_da) = (ra_deg - NGP_RA_DEG).to_radians().sin_cos();

    let sin_b = (sin_d * sin_dg + cos_d * cos_dg * cos_da).clamp(-1.0, 1.0);
    let b = sin_b.asin();

    let y = cos_d * sin_da;
    let x = sin_d * cos_dg - cos_d * sin_dg * cos_da;
    let l = NCP_L_DEG - y.atan2(x).to_degrees();

    (l.rem_euclid(360.0), b.to_degrees())
}

/// Inverse of [`equatorial_to_galactic`]; RA in [0, 360).
pub fn galactic_to_equatorial(l_deg: f64, b_deg: f64) -> (f64, f64) {
    let (sin_dg, cos_dg) = NGP_DEC_DEG.to_radians().sin_cos();
    let (sin_b, cos_b) = b_deg.to_radians().sin_cos();
    let (sin_dl, cos_dl) = (NCP_L_DEG - l_deg).to_radians().sin_cos();

    let sin_d = (sin_b * sin_dg + cos_b * cos_dg * cos_dl).clamp(-1.0, 1.0);
    let dec = sin_d.asin();

    let y = cos_b * sin_dl;
    let x = sin_b * cos_dg - cos_b * sin_dg * cos_dl;
    let ra = NGP_RA_DEG + y.atan2(x).to_degrees();

    (ra.rem_euclid(360.0), dec.to_degrees())
}

/// Galactic longitude folded into (-180, 180] so the centre sits mid-frame.
#[inline]
pub fn centered_longitude(l_deg: f64) -> f64 {
    let l = l_deg.rem_euclid(360.0);
    if l > 180.0 {
        l - 360.0
    } else {
        l
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn galactic_centre() {
        // J2000 direction of (l, b) = (0, 0).
        let (l, b) = equatorial_to_galactic(266.404_99, -28.936_17);
        assert_abs_diff_eq!(centered_longitude(l), 0.0, epsilon = 0.01);
        assert_abs_diff_eq!(b, 0.0, epsilon = 0.01);
    }

    #[test]
    fn north_galactic_pole() {
        let (_, b) = equatorial_to_galactic(NGP_RA_DEG, NGP_DEC_DEG);
        assert_abs_diff_eq!(b, 90.0, epsilon = 1e-6);
    }

    #[test]
    fn north_celestial_pole_longitude() {
        let (l, _) = equatorial_to_galactic(0.0, 90.0);
        assert_abs_diff_eq!(l, NCP_L_DEG, epsilon = 1e-6);
    }

    #[test]
    fn inverse_recovers_equatorial() {
        for &(ra, dec) in &[(10.0, 20.0), (200.0, -60.0), (359.0, 1.0)] {
            let (l, b) = equatorial_to_galactic(ra, dec);
            let (ra2, dec2) = galactic_to_equatorial(l, b);
            assert_abs_diff_eq!(ra2, ra, epsilon = 1e-8);
            assert_abs_diff_eq!(dec2, dec, epsilon = 1e-8);
        }
    }

    #[test]
    fn centered_longitude_folds() {
        assert_eq!(centered_longitude(350.0), -10.0);
        assert_eq!(centered_longitude(180.0), 180.0);
        assert_eq!(centered_longitude(-10.0), -10.0);
    }
}

//! IAU 1976 precession of equatorial coordinates.

use crate::constants::ARCSEC_PER_RADIAN;

/// Precess `(ra, dec)` in degrees from `equinox_in` to `equinox_out`
/// (Julian years).
///
/// Uses the Lieske (1977) angles ζ, z and θ. Proper motion is ignored.
/// The returned right ascension lies in `[0, 360)`.
pub fn precess(equinox_in: f64, ra: f64, dec: f64, equinox_out: f64) -> (f64, f64) {
    if equinox_in == equinox_out {
        return (ra, dec);
    }

    let big_t = (equinox_in - 2000.0) / 100.0;
    let t = (equinox_out - equinox_in) / 100.0;
    let t2 = t * t;
    let t3 = t2 * t;

    let base = 2306.2181 + 1.39656 * big_t - 0.000139 * big_t * big_t;
    let zeta = base * t + (0.30188 - 0.000344 * big_t) * t2 + 0.017998 * t3;
    let z = base * t + (1.09468 + 0.000066 * big_t) * t2 + 0.018203 * t3;
    let theta = (2004.3109 - 0.85330 * big_t - 0.000217 * big_t * big_t) * t
        - (0.42665 + 0.000217 * big_t) * t2
        - 0.041833 * t3;

    let zeta = zeta / ARCSEC_PER_RADIAN;
    let z = z / ARCSEC_PER_RADIAN;
    let theta = theta / ARCSEC_PER_RADIAN;

    let (sin_d, cos_d) = dec.to_radians().sin_cos();
    let (sin_a, cos_a) = (ra.to_radians() + zeta).sin_cos();
    let (sin_t, cos_t) = theta.sin_cos();

    let a = cos_d * sin_a;
    let b = cos_t * cos_d * cos_a - sin_t * sin_d;
    let c = sin_t * cos_d * cos_a + cos_t * sin_d;

    let ra_out = (a.atan2(b) + z).to_degrees().rem_euclid(360.0);
    // asin loses precision near the poles
    let dec_out = if c.abs() > 0.99 {
        (a * a + b * b).sqrt().acos().copysign(c)
    } else {
        c.asin()
    };

    (ra_out, dec_out.to_degrees())
}

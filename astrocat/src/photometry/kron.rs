//! Adaptive elliptical (Kron) photometry.

use super::{Accumulator, FluxMeasurement, Response};
use crate::config::Config;
use crate::geometry::{ellipse_half_extents, ellipse_radius2};
use crate::image::FieldImage;
use crate::object_list::ObjectRecord;

/// Pixel window covering the ellipse `r2 <= scale²` around the centroid.
fn window(object: &ObjectRecord, scale: f64) -> (i32, i32, i32, i32) {
    let (hx, hy) = ellipse_half_extents(object.cxx, object.cyy, object.cxy);
    let (hx, hy) = (hx * scale, hy * scale);
    (
        (object.mx - hx).floor() as i32,
        (object.mx + hx).ceil() as i32,
        (object.my - hy).floor() as i32,
        (object.my + hy).ceil() as i32,
    )
}

/// Measure the Kron factor of `object`.
///
/// The first moment `r1 = Σ r·I / Σ I` is taken inside the provisional
/// ellipse of scale `kron_sigma`, normalized by the geometric mean of the
/// semi-axes and multiplied by `kron_fact`. The result never falls below
/// `kron_min_sigma`. Returns `None` for a degenerate ellipse.
pub fn kron_factor(
    object: &ObjectRecord,
    image: &FieldImage,
    config: &Config,
    response: Response,
) -> Option<f64> {
    let ab = object.a * object.b;
    if ab <= 0.0 || !ab.is_finite() {
        return None;
    }

    let limit2 = config.kron_sigma * config.kron_sigma;
    let ((xmin, xmax, ymin, ymax), _) = image.clip_window(window(object, config.kron_sigma));
    let sky = response.intensity(object.bkg);

    let mut r1 = 0.0;
    let mut v1 = 0.0;
    for y in ymin..=ymax {
        let dy = y as f64 - object.my;
        for x in xmin..=xmax {
            let dx = x as f64 - object.mx;
            if ellipse_radius2(object.cxx, object.cyy, object.cxy, dx, dy) > limit2 {
                continue;
            }
            let Some(value) = image.get(x, y) else {
                continue;
            };
            let signal = response.intensity(value as f64) - sky;
            r1 += (dx * dx + dy * dy).sqrt() * signal;
            v1 += signal;
        }
    }

    let factor = if r1 > 0.0 && v1 > 0.0 {
        config.kron_fact * (r1 / v1) / ab.sqrt()
    } else {
        0.0
    };
    Some(factor.max(config.kron_min_sigma))
}

/// Integrate the flux inside the Kron ellipse.
///
/// Returns the Kron factor stored on the object along with the flux. Pixels
/// count whole when their centre falls inside the ellipse. A degenerate
/// ellipse or non-positive flux yields a Kron factor of 0, which the caller
/// turns into the magnitude sentinel.
pub fn auto_flux(
    object: &ObjectRecord,
    image: &FieldImage,
    config: &Config,
    response: Response,
) -> (f64, FluxMeasurement) {
    let Some(factor) = kron_factor(object, image, config, response) else {
        return (0.0, FluxMeasurement::default());
    };

    let limit2 = factor * factor;
    // The factor has no upper bound; the scan never leaves the image.
    let ((xmin, xmax, ymin, ymax), truncated) = image.clip_window(window(object, factor));

    let mut acc = Accumulator::default();
    for y in ymin..=ymax {
        let dy = y as f64 - object.my;
        for x in xmin..=xmax {
            let dx = x as f64 - object.mx;
            if ellipse_radius2(object.cxx, object.cyy, object.cxy, dx, dy) > limit2 {
                continue;
            }
            if let Some(value) = image.get(x, y) {
                acc.add(response, value as f64, 1.0);
            }
        }
    }

    let measurement = acc.finish(
        response,
        object.bkg,
        image.background_rms() as f64,
        config.gain,
        truncated,
    );
    if measurement.flux > 0.0 {
        (factor, measurement)
    } else {
        (0.0, measurement)
    }
}

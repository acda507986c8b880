//! Crowding diagnostic on Kron ellipses.
//!
//! An object is crowded when neighbours that overlap its Kron ellipse carry
//! more than [`POLLUTE_CONTRAST`] of its own flux. Overlap is approximated by
//! testing the neighbour's centroid against the object's ellipse, and the
//! object's ellipse perimeter (sampled every 10°) against the neighbour's
//! ellipse. The flag is informational and never feeds back into cleaning.

use std::sync::LazyLock;

use crate::constants::{CLEAN_ZONE, CROWD_ANGLES, MIN_AXIS, POLLUTE_CONTRAST};
use crate::geometry::ellipse_radius2;
use crate::object_list::{ObjectFlags, ObjectList, ObjectRecord};

/// `(cos, sin)` of the perimeter sampling angles.
static PERIMETER: LazyLock<[(f64, f64); CROWD_ANGLES]> = LazyLock::new(|| {
    let step = std::f64::consts::TAU / CROWD_ANGLES as f64;
    std::array::from_fn(|i| {
        let (s, c) = (i as f64 * step).sin_cos();
        (c, s)
    })
});

#[inline]
fn kron_scale(object: &ObjectRecord, kron_min_sigma: f64) -> f64 {
    if object.kronfactor > 0.0 {
        object.kronfactor
    } else {
        kron_min_sigma
    }
}

/// Whether `neighbours` pollute the Kron ellipse of `object`.
///
/// The entry at `skip` (the object itself, when it belongs to the same list)
/// is ignored.
pub fn is_crowded(
    object: &ObjectRecord,
    neighbours: &[ObjectRecord],
    skip: Option<usize>,
    kron_min_sigma: f64,
) -> bool {
    let scale = kron_scale(object, kron_min_sigma);
    let scale2 = scale * scale;
    let major = object.a.max(MIN_AXIS) * scale;
    let minor = object.b.max(MIN_AXIS) * scale;
    let (sin_t, cos_t) = object.theta.to_radians().sin_cos();

    let mut perimeter = [(0.0, 0.0); CROWD_ANGLES];
    for (point, &(c, s)) in perimeter.iter_mut().zip(PERIMETER.iter()) {
        let u = major * c;
        let v = minor * s;
        *point = (
            object.mx + u * cos_t - v * sin_t,
            object.my + u * sin_t + v * cos_t,
        );
    }

    let zone2 = CLEAN_ZONE * CLEAN_ZONE;
    let mut pollution = 0.0;
    for (j, other) in neighbours.iter().enumerate() {
        if Some(j) == skip {
            continue;
        }
        let dx = other.mx - object.mx;
        let dy = other.my - object.my;
        let rlim = object.a + other.a;
        if dx * dx + dy * dy >= rlim * rlim * zone2 {
            continue;
        }

        let centroid_inside = ellipse_radius2(object.cxx, object.cyy, object.cxy, dx, dy) <= scale2;
        let overlaps = centroid_inside || {
            let other_scale = kron_scale(other, kron_min_sigma);
            let other_scale2 = other_scale * other_scale;
            perimeter.iter().any(|&(px, py)| {
                ellipse_radius2(other.cxx, other.cyy, other.cxy, px - other.mx, py - other.my)
                    <= other_scale2
            })
        };
        if overlaps {
            pollution += other.rawvalue;
        }
    }

    pollution > POLLUTE_CONTRAST * object.rawvalue
}

/// Set or clear the crowded flag on every object of `list`.
///
/// Returns the number of crowded objects.
pub fn flag_crowded(list: &mut ObjectList, kron_min_sigma: f64) -> usize {
    let crowded: Vec<bool> = list
        .iter()
        .enumerate()
        .map(|(i, o)| is_crowded(o, list.objects(), Some(i), kron_min_sigma))
        .collect();

    for (object, &flag) in list.objects_mut().iter_mut().zip(&crowded) {
        object.flags.set(ObjectFlags::CROWDED, flag);
    }

    let count = crowded.iter().filter(|&&c| c).count();
    tracing::debug!("Flagged {} of {} objects as crowded", count, list.len());
    count
}

//! Pixel to world coordinate transforms.
//!
//! Two mutually exclusive coordinate systems are supported:
//!
//! - [`Projection::Linear`]: reference point, per-axis scale and rotation.
//! - [`Projection::Plate`]: a polynomial plate solution de-projected about
//!   the plate centre, then precessed to the output equinox.
//!
//! The transform is prepared once per field by [`Astrometry::new`] and then
//! applied to every object. Object shapes are mapped through the local
//! Jacobian of the transform.

mod linear;
mod plate;
mod precession;

#[cfg(test)]
mod tests;

pub use linear::{LinearHeader, LinearTransform};
pub use plate::{PlateHeader, PlateTransform};
pub use precession::precess;

use glam::{DMat2, DVec2};
use serde::{Deserialize, Serialize};

use crate::config::{Config, RequestedOutputs};
use crate::object_list::{ObjectList, ObjectRecord};

/// Coordinate system of a field, as read from its header.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Projection {
    Linear(LinearHeader),
    Plate(PlateHeader),
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Linear(LinearHeader::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Transform {
    Linear(LinearTransform),
    Plate(PlateTransform),
}

/// Step used for the numerical Jacobian of the plate solution (pixels).
const JACOBIAN_STEP: f64 = 0.5;

/// Prepared astrometric transform of one field.
#[derive(Debug, Clone)]
pub struct Astrometry {
    transform: Transform,
    outputs: RequestedOutputs,
    pixel_scale: f64,
    output_equinox: f64,
}

impl Astrometry {
    pub fn new(projection: &Projection, config: &Config) -> Self {
        let transform = match projection {
            Projection::Linear(header) => Transform::Linear(LinearTransform::new(header)),
            Projection::Plate(header) => Transform::Plate(PlateTransform::new(header)),
        };
        Self {
            transform,
            outputs: config.outputs,
            pixel_scale: config.pixel_scale,
            output_equinox: config.output_equinox,
        }
    }

    /// The linear rotation matrix was singular and replaced by the identity.
    pub fn is_singular(&self) -> bool {
        match &self.transform {
            Transform::Linear(linear) => linear.is_singular(),
            Transform::Plate(_) => false,
        }
    }

    pub fn transform_all(&self, list: &mut ObjectList) {
        if !self.outputs.any_astrometry() {
            return;
        }
        for object in list.objects_mut() {
            self.transform(object);
        }
        tracing::debug!("Computed world coordinates for {} objects", list.len());
    }

    /// Fill the requested world measurements of one object.
    ///
    /// For plate solutions `mxw`/`myw` hold the position at the plate
    /// equinox and `alpha`/`delta` the position precessed to the output
    /// equinox.
    pub fn transform(&self, object: &mut ObjectRecord) {
        let outputs = self.outputs;
        let pixel = DVec2::new(object.mx + 1.0, object.my + 1.0);

        let jacobian = match &self.transform {
            Transform::Linear(linear) => {
                if outputs.world_position {
                    let world = linear.pixel_to_world(pixel);
                    object.world.mxw = world.x;
                    object.world.myw = world.y;
                }
                linear.jacobian()
            }
            Transform::Plate(plate) => {
                let sky = plate.pixel_to_sky(pixel);
                if outputs.world_position {
                    object.world.mxw = sky.x;
                    object.world.myw = sky.y;
                    let (alpha, delta) = precess(plate.equinox(), sky.x, sky.y, self.output_equinox);
                    object.world.alpha = alpha;
                    object.world.delta = delta;
                }
                if outputs.world_shape {
                    plate_jacobian(plate, pixel, sky)
                } else {
                    DMat2::IDENTITY
                }
            }
        };

        if outputs.world_shape {
            let (aw, bw, thetaw) = world_shape(jacobian, object.a, object.b, object.theta);
            object.world.aw = aw;
            object.world.bw = bw;
            object.world.thetaw = thetaw;
            object.world.fwhm_world = object.fwhm * self.pixel_scale;
        }
        if outputs.world_area {
            object.world.area_world = object.pixnb as f64 * self.pixel_scale * self.pixel_scale;
        }
    }
}

/// Local derivative of the plate solution in degrees per pixel, with the
/// right ascension axis scaled by `cos(dec)`.
fn plate_jacobian(plate: &PlateTransform, pixel: DVec2, sky: DVec2) -> DMat2 {
    let cos_dec = sky.y.to_radians().cos();
    let derivative = |step: DVec2| {
        let ahead = plate.pixel_to_sky(pixel + step);
        let behind = plate.pixel_to_sky(pixel - step);
        let dra = (ahead.x - behind.x + 180.0).rem_euclid(360.0) - 180.0;
        DVec2::new(dra * cos_dec, ahead.y - behind.y) / (2.0 * JACOBIAN_STEP)
    };
    DMat2::from_cols(
        derivative(DVec2::new(JACOBIAN_STEP, 0.0)),
        derivative(DVec2::new(0.0, JACOBIAN_STEP)),
    )
}

/// Map an ellipse through a linear transform.
///
/// Returns the semi-axes and the position angle (degrees, in `(-90, 90]`)
/// of the image of the `a`/`b`/`theta` ellipse under `jacobian`.
pub fn world_shape(jacobian: DMat2, a: f64, b: f64, theta: f64) -> (f64, f64, f64) {
    let (s, c) = theta.to_radians().sin_cos();
    let rotation = DMat2::from_cols(DVec2::new(c, s), DVec2::new(-s, c));
    let covariance = rotation * DMat2::from_diagonal(DVec2::new(a * a, b * b)) * rotation.transpose();
    let world = jacobian * covariance * jacobian.transpose();

    let p = world.x_axis.x;
    let q = world.y_axis.x;
    let r = world.y_axis.y;
    let mean = 0.5 * (p + r);
    let half = (0.25 * (p - r) * (p - r) + q * q).sqrt();

    let aw = (mean + half).max(0.0).sqrt();
    let bw = (mean - half).max(0.0).sqrt();
    let thetaw = 0.5 * (2.0 * q).atan2(p - r).to_degrees();
    (aw, bw, thetaw)
}

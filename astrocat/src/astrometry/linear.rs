//! Linear pixel-to-world mapping from reference point, scale and rotation.

use glam::{DMat2, DVec2};
use serde::{Deserialize, Serialize};

/// Linear world coordinate header.
///
/// Pixel coordinates follow the FITS convention: the first pixel centre is
/// at `(1, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearHeader {
    /// World coordinates of the reference pixel.
    pub crval: [f64; 2],
    /// Reference pixel (1-based).
    pub crpix: [f64; 2],
    /// World units per pixel along each axis.
    pub cdelt: [f64; 2],
    /// Rotation of each axis in degrees.
    pub crota: [f64; 2],
}

impl Default for LinearHeader {
    fn default() -> Self {
        Self {
            crval: [0.0, 0.0],
            crpix: [1.0, 1.0],
            cdelt: [1.0, 1.0],
            crota: [0.0, 0.0],
        }
    }
}

/// Below this the rotation matrix is treated as singular.
const MIN_DETERMINANT: f64 = 1e-10;

/// Prepared linear transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTransform {
    crval: DVec2,
    crpix: DVec2,
    cdelt: DVec2,
    matrix: DMat2,
    singular: bool,
}

impl LinearTransform {
    /// Build the transform by inverting the header rotation matrix.
    ///
    /// A singular rotation falls back to the identity and logs a warning.
    pub fn new(header: &LinearHeader) -> Self {
        let (s1, c1) = header.crota[0].to_radians().sin_cos();
        let (s2, c2) = header.crota[1].to_radians().sin_cos();
        // Rows (c1, s2) and (-s1, c2)
        let rotation = DMat2::from_cols(DVec2::new(c1, -s1), DVec2::new(s2, c2));

        let det = rotation.determinant();
        let (matrix, singular) = if det.abs() < MIN_DETERMINANT {
            tracing::warn!(
                "Singular rotation matrix (crota = {:?}, det = {:.3e}), using identity",
                header.crota,
                det
            );
            (DMat2::IDENTITY, true)
        } else {
            (rotation.inverse(), false)
        };

        Self {
            crval: DVec2::from_array(header.crval),
            crpix: DVec2::from_array(header.crpix),
            cdelt: DVec2::from_array(header.cdelt),
            matrix,
            singular,
        }
    }

    /// The rotation matrix could not be inverted.
    pub fn is_singular(&self) -> bool {
        self.singular
    }

    /// World coordinates of a 1-based pixel position.
    #[inline]
    pub fn pixel_to_world(&self, pixel: DVec2) -> DVec2 {
        self.crval + self.cdelt * (self.matrix * (pixel - self.crpix))
    }

    /// Derivative of the world position with respect to the pixel position.
    #[inline]
    pub fn jacobian(&self) -> DMat2 {
        DMat2::from_diagonal(self.cdelt) * self.matrix
    }
}

//! Photographic plate solution in the style of the Digitized Sky Survey.
//!
//! Pixel positions are converted to plate millimetres, mapped through two
//! 13-term polynomials to standard coordinates (arcseconds) and de-projected
//! about the plate centre.

use std::f64::consts::TAU;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::constants::ARCSEC_PER_RADIAN;

/// Plate solution header.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlateHeader {
    /// Plate centre right ascension and declination (degrees).
    pub ra: f64,
    pub dec: f64,
    /// Equinox of the plate centre and solution (Julian years).
    pub equinox: f64,
    /// Scanner pixel sizes in microns.
    pub x_pixel_size: f64,
    pub y_pixel_size: f64,
    /// Plate centre offsets from the scan origin in microns.
    pub ppo3: f64,
    pub ppo6: f64,
    /// Position of the extracted sub-image on the full scan.
    pub x_offset: f64,
    pub y_offset: f64,
    /// Polynomial coefficients for ξ and η.
    pub amdx: [f64; 13],
    pub amdy: [f64; 13],
}

/// Prepared plate solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateTransform {
    header: PlateHeader,
    ra0: f64,
    tan_dec0: f64,
    cos_dec0: f64,
}

impl PlateTransform {
    pub fn new(header: &PlateHeader) -> Self {
        let dec0 = header.dec.to_radians();
        Self {
            header: *header,
            ra0: header.ra.to_radians(),
            tan_dec0: dec0.tan(),
            cos_dec0: dec0.cos(),
        }
    }

    pub fn equinox(&self) -> f64 {
        self.header.equinox
    }

    /// Standard coordinates (ξ, η) in arcseconds of a 1-based pixel position.
    pub fn standard_coordinates(&self, pixel: DVec2) -> DVec2 {
        let h = &self.header;
        let x = pixel.x + h.x_offset - 1.0 + 0.5;
        let y = pixel.y + h.y_offset - 1.0 + 0.5;
        let xmm = (h.ppo3 - x * h.x_pixel_size) / 1000.0;
        let ymm = (y * h.y_pixel_size - h.ppo6) / 1000.0;

        let xmm2 = xmm * xmm;
        let ymm2 = ymm * ymm;
        let r2 = xmm2 + ymm2;
        let a = &h.amdx;
        let b = &h.amdy;

        let xi = a[0] * xmm
            + a[1] * ymm
            + a[2]
            + a[3] * xmm2
            + a[4] * xmm * ymm
            + a[5] * ymm2
            + a[6] * r2
            + a[7] * xmm2 * xmm
            + a[8] * xmm2 * ymm
            + a[9] * xmm * ymm2
            + a[10] * ymm2 * ymm
            + a[11] * xmm * r2
            + a[12] * xmm * r2 * r2;
        let eta = b[0] * ymm
            + b[1] * xmm
            + b[2]
            + b[3] * ymm2
            + b[4] * xmm * ymm
            + b[5] * xmm2
            + b[6] * r2
            + b[7] * ymm2 * ymm
            + b[8] * ymm2 * xmm
            + b[9] * ymm * xmm2
            + b[10] * xmm2 * xmm
            + b[11] * ymm * r2
            + b[12] * ymm * r2 * r2;

        DVec2::new(xi, eta)
    }

    /// Right ascension and declination (degrees, plate equinox) of a 1-based
    /// pixel position.
    pub fn pixel_to_sky(&self, pixel: DVec2) -> DVec2 {
        let standard = self.standard_coordinates(pixel) / ARCSEC_PER_RADIAN;
        let (xi, eta) = (standard.x, standard.y);

        let denom = 1.0 - eta * self.tan_dec0;
        let ra_offset = (xi / self.cos_dec0).atan2(denom);
        let ra = (ra_offset + self.ra0).rem_euclid(TAU);
        let dec = (ra_offset.cos() * ((eta + self.tan_dec0) / denom)).atan();

        DVec2::new(ra.to_degrees(), dec.to_degrees())
    }
}

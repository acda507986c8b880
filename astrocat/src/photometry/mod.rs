//! Photometric estimators.
//!
//! Three independent estimators write magnitudes into each object:
//!
//! 1. **Aperture**: flux inside a fixed circle, with boundary pixels
//!    oversampled on a regular sub-pixel grid.
//! 2. **Auto (Kron)**: flux inside an ellipse scaled by the object's own
//!    first-moment radius (Kron 1980).
//! 3. **Isophotal**: flux accumulated over the detection footprint, with an
//!    optional correction for the wings lost below the threshold.
//!
//! All estimators share one error model: `mag = zp - 2.5·log10(flux)`,
//! `magerr = 1.0857·σ/flux`. Non-positive flux yields the 99.0 sentinel for
//! both, meaning "no measurement" rather than "zero brightness".

mod aperture;
mod isophotal;
mod kron;


pub use aperture::aperture_flux;
pub use isophotal::{IsophotalFlux, isophotal_flux, surface_brightness};
pub use kron::{auto_flux, kron_factor};

use crate::config::{Config, DetectType};
use crate::constants::{MAG_ERR_FACTOR, MAG_SENTINEL};
use crate::image::FieldImage;
use crate::object_list::{ObjectFlags, ObjectList, ObjectRecord};

/// Flux integrated over a region of the image.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FluxMeasurement {
    /// Background-subtracted flux.
    pub flux: f64,
    /// Flux standard deviation.
    pub fluxerr: f64,
    /// Integrated area in pixels (fractional for oversampled apertures).
    pub area: f64,
    /// The region extends beyond the image.
    pub truncated: bool,
}

/// Convert a flux and its error to a magnitude and magnitude error.
#[inline]
pub fn magnitude(flux: f64, fluxerr: f64, zeropoint: f64) -> (f64, f64) {
    if flux > 0.0 {
        (
            zeropoint - 2.5 * flux.log10(),
            MAG_ERR_FACTOR * fluxerr / flux,
        )
    } else {
        (MAG_SENTINEL, MAG_SENTINEL)
    }
}

/// Detector response applied to pixel values before integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Response {
    Linear,
    /// Photographic density with normalized gamma `ngamma`.
    Photographic { ngamma: f64 },
}

impl Response {
    pub fn from_config(config: &Config) -> Self {
        match config.detect_type {
            DetectType::Ccd => Response::Linear,
            DetectType::Photo => Response::Photographic {
                ngamma: config.ngamma(),
            },
        }
    }

    /// Pixel value in the integration domain.
    #[inline]
    pub fn intensity(&self, value: f64) -> f64 {
        match *self {
            Response::Linear => value,
            Response::Photographic { ngamma } => (value / ngamma).exp(),
        }
    }

    /// Derivative of the flux with respect to one pixel value.
    #[inline]
    pub fn slope(&self, value: f64) -> f64 {
        match *self {
            Response::Linear => 1.0,
            Response::Photographic { ngamma } => (value / ngamma).exp(),
        }
    }

    /// Background-subtracted flux from a sum of intensities over `area` pixels.
    #[inline]
    pub fn flux(&self, intensity_sum: f64, area: f64, background: f64) -> f64 {
        match *self {
            Response::Linear => intensity_sum - area * background,
            Response::Photographic { ngamma } => {
                ngamma * (intensity_sum - area * (background / ngamma).exp())
            }
        }
    }

    #[inline]
    pub fn is_linear(&self) -> bool {
        matches!(self, Response::Linear)
    }
}

/// Running sums shared by the image-based estimators.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Accumulator {
    intensity: f64,
    slope2: f64,
    area: f64,
}

impl Accumulator {
    #[inline]
    pub(crate) fn add(&mut self, response: Response, value: f64, weight: f64) {
        let slope = response.slope(value);
        self.intensity += weight * response.intensity(value);
        self.slope2 += weight * slope * slope;
        self.area += weight;
    }

    /// Close the sums into a flux and error.
    ///
    /// Variance combines the background noise over the covered area and,
    /// for linear detectors with a configured gain, the source shot noise.
    pub(crate) fn finish(
        &self,
        response: Response,
        background: f64,
        background_rms: f64,
        gain: f64,
        truncated: bool,
    ) -> FluxMeasurement {
        let flux = response.flux(self.intensity, self.area, background);
        let mut variance = self.slope2 * background_rms * background_rms;
        if response.is_linear() && gain > 0.0 && flux > 0.0 {
            variance += flux / gain;
        }
        FluxMeasurement {
            flux,
            fluxerr: variance.sqrt(),
            area: self.area,
            truncated,
        }
    }
}

/// Runs the requested estimators on objects of one field.
#[derive(Debug, Clone)]
pub struct Photometer {
    config: Config,
    response: Response,
}

impl Photometer {
    pub fn new(config: Config) -> Self {
        let response = Response::from_config(&config);
        Self { config, response }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Measure every object of `list`.
    pub fn measure_all(&self, list: &mut ObjectList, image: &FieldImage) {
        if !self.config.outputs.any_photometry() {
            return;
        }
        for object in list.objects_mut() {
            self.measure(object, image);
        }
        tracing::debug!("Measured photometry for {} objects", list.len());
    }

    /// Compute the requested magnitudes of one object.
    pub fn measure(&self, object: &mut ObjectRecord, image: &FieldImage) {
        let outputs = self.config.outputs;
        let zeropoint = self.config.mag_zeropoint;

        if outputs.mag_aperture {
            let m = aperture_flux(object, image, &self.config, self.response);
            let (mag, magerr) = magnitude(m.flux, m.fluxerr, zeropoint);
            let phot = &mut object.photometry;
            phot.flux_aper = m.flux;
            phot.fluxerr_aper = m.fluxerr;
            phot.mag_aper = mag;
            phot.magerr_aper = magerr;
            if m.truncated {
                object.flags.insert(ObjectFlags::APERTURE_TRUNCATED);
            }
        }

        if outputs.mag_auto {
            let (kronfactor, m) = auto_flux(object, image, &self.config, self.response);
            let (mag, magerr) = magnitude(m.flux, m.fluxerr, zeropoint);
            object.kronfactor = kronfactor;
            let phot = &mut object.photometry;
            phot.flux_auto = m.flux;
            phot.fluxerr_auto = m.fluxerr;
            phot.mag_auto = mag;
            phot.magerr_auto = magerr;
            if m.truncated {
                object.flags.insert(ObjectFlags::APERTURE_TRUNCATED);
            }
        }

        if outputs.mag_iso || outputs.mag_isocor {
            let iso = isophotal_flux(object, &self.config, self.response);
            let phot = &mut object.photometry;
            if outputs.mag_iso {
                let (mag, magerr) = magnitude(iso.flux, iso.fluxerr, zeropoint);
                phot.flux_iso = iso.flux;
                phot.fluxerr_iso = iso.fluxerr;
                phot.mag_iso = mag;
                phot.magerr_iso = magerr;
            }
            if outputs.mag_isocor {
                let (mag, magerr) = magnitude(iso.flux_corrected, iso.fluxerr_corrected, zeropoint);
                phot.flux_isocor = iso.flux_corrected;
                phot.fluxerr_isocor = iso.fluxerr_corrected;
                phot.mag_isocor = mag;
                phot.magerr_isocor = magerr;
            }
        }

        if outputs.surface_brightness {
            let scale = self.config.pixel_scale;
            object.photometry.maxmu = surface_brightness(object.maxflux, scale, zeropoint);
            object.photometry.threshmu = surface_brightness(object.thresh, scale, zeropoint);
        }
    }
}

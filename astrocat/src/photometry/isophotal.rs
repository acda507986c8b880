//! Isophotal photometry and surface brightness.

use super::Response;
use crate::config::Config;
use crate::constants::{ISOCOR_C1, ISOCOR_C2, MAG_SENTINEL};
use crate::object_list::ObjectRecord;

/// Isophotal flux and its corrected counterpart.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IsophotalFlux {
    pub flux: f64,
    pub fluxerr: f64,
    /// Flux corrected for the Gaussian wings lost below the threshold.
    pub flux_corrected: f64,
    pub fluxerr_corrected: f64,
}

/// Isophotal flux from the accumulators collected during detection.
///
/// For photographic data `totalvalue` holds the sum of `exp(p / ngamma)`
/// over the footprint and is converted back to intensity here.
///
/// The correction assumes a Gaussian profile: with `ati = pixnb·thresh/flux`
/// (clamped to `[0, 1]`) the corrected flux is
/// `flux / (1 - C1·ati - C2·ati²)`. Its error is the relative error of
/// the isophotal flux, combined with the propagated `ati` uncertainty, times
/// the corrected flux.
pub fn isophotal_flux(object: &ObjectRecord, config: &Config, response: Response) -> IsophotalFlux {
    let flux = match response {
        Response::Linear => object.totalvalue,
        Response::Photographic { .. } => {
            response.flux(object.totalvalue, object.pixnb as f64, object.bkg)
        }
    };

    let mut variance = object.totalvar;
    if response.is_linear() && config.gain > 0.0 && flux > 0.0 {
        variance += flux / config.gain;
    }
    let fluxerr = variance.max(0.0).sqrt();

    if flux <= 0.0 || flux.is_nan() {
        return IsophotalFlux {
            flux,
            fluxerr,
            flux_corrected: flux,
            fluxerr_corrected: fluxerr,
        };
    }

    let pixnb = object.pixnb as f64;
    let ati = if object.pixnb > 1 {
        (pixnb * object.thresh / flux).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let flux_corrected = flux / (1.0 - ISOCOR_C1 * ati - ISOCOR_C2 * ati * ati);

    let relvar = variance / (flux * flux);
    let mut dati = if object.pixnb > 0 {
        ati * (relvar + 1.0 / pixnb).sqrt()
    } else {
        0.0
    };
    dati = ISOCOR_C1 * dati + 2.0 * ISOCOR_C2 * ati * dati;
    let fluxerr_corrected = (relvar + dati * dati).sqrt() * flux_corrected;

    IsophotalFlux {
        flux,
        fluxerr,
        flux_corrected,
        fluxerr_corrected,
    }
}

/// Surface brightness in magnitudes per square world unit.
#[inline]
pub fn surface_brightness(value: f64, pixel_scale: f64, zeropoint: f64) -> f64 {
    let area = pixel_scale * pixel_scale;
    if value > 0.0 && area > 0.0 {
        zeropoint - 2.5 * (value / area).log10()
    } else {
        MAG_SENTINEL
    }
}

//! Configuration for the consolidation pipeline.
//!
//! A single flat [`Config`] holds every numeric knob consumed by the clean
//! pass, the photometric estimators and the astrometric transform. Values are
//! normally produced by an external preferences loader; [`Config::from_yaml`]
//! is provided for standalone use.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Enums
// ============================================================================

/// Detector response model.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum DetectType {
    /// Linear response (CCD and other digital sensors).
    #[default]
    #[strum(serialize = "CCD")]
    Ccd,
    /// Photographic density. Pixel values are mapped through
    /// `exp(p / ngamma)` before integration.
    #[strum(serialize = "PHOTO")]
    Photo,
}

// ============================================================================
// Requested outputs
// ============================================================================

/// Derived quantities to compute for each object.
///
/// Every field defaults to `true`. Estimators check this set once per object
/// and skip work for quantities nobody asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestedOutputs {
    pub mag_aperture: bool,
    pub mag_auto: bool,
    pub mag_iso: bool,
    pub mag_isocor: bool,
    pub surface_brightness: bool,
    pub world_position: bool,
    pub world_shape: bool,
    pub world_area: bool,
}

impl Default for RequestedOutputs {
    fn default() -> Self {
        Self {
            mag_aperture: true,
            mag_auto: true,
            mag_iso: true,
            mag_isocor: true,
            surface_brightness: true,
            world_position: true,
            world_shape: true,
            world_area: true,
        }
    }
}

impl RequestedOutputs {
    /// Nothing requested.
    pub fn none() -> Self {
        Self {
            mag_aperture: false,
            mag_auto: false,
            mag_iso: false,
            mag_isocor: false,
            surface_brightness: false,
            world_position: false,
            world_shape: false,
            world_area: false,
        }
    }

    pub fn any_photometry(&self) -> bool {
        self.mag_aperture
            || self.mag_auto
            || self.mag_iso
            || self.mag_isocor
            || self.surface_brightness
    }

    pub fn any_astrometry(&self) -> bool {
        self.world_position || self.world_shape || self.world_area
    }
}

// ============================================================================
// Main configuration
// ============================================================================

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // ------------------------------------------------------------------------
    // Clean
    // ------------------------------------------------------------------------
    /// Run the clean pass. When disabled every candidate is admitted as is.
    pub clean: bool,
    /// Width of the Gaussian wing model used to predict contamination,
    /// in units of the brighter object's ellipse. Larger values merge more.
    pub clean_param: f64,
    /// Maximum number of survivors kept in the clean set at once.
    pub clean_stack_size: usize,

    // ------------------------------------------------------------------------
    // Photometry
    // ------------------------------------------------------------------------
    /// Diameter of the fixed circular aperture in pixels.
    pub aperture_diameter: f64,
    /// Sub-samples per pixel side on the aperture boundary.
    pub aperture_oversampling: usize,
    /// Kron factor multiplier (2.5 captures ~90% of a galaxy's flux).
    pub kron_fact: f64,
    /// Size of the provisional ellipse used to measure the first moment,
    /// in units of the isophotal ellipse.
    pub kron_sigma: f64,
    /// Lower clamp on the Kron factor.
    pub kron_min_sigma: f64,
    /// Magnitude zero point.
    pub mag_zeropoint: f64,
    /// Emulsion gamma for photographic data.
    pub mag_gamma: f64,
    /// Detector gain in e-/ADU. Zero disables the Poisson noise term.
    pub gain: f64,
    /// Detector response model.
    pub detect_type: DetectType,

    // ------------------------------------------------------------------------
    // Astrometry
    // ------------------------------------------------------------------------
    /// Pixel scale (world units per pixel) for areas, FWHM and surface brightness.
    pub pixel_scale: f64,
    /// Equinox of output celestial coordinates for plate solutions.
    pub output_equinox: f64,

    // ------------------------------------------------------------------------
    // Outputs
    // ------------------------------------------------------------------------
    pub outputs: RequestedOutputs,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clean: true,
            clean_param: 1.0,
            clean_stack_size: 2000,
            aperture_diameter: 5.0,
            aperture_oversampling: 5,
            kron_fact: 2.5,
            kron_sigma: 6.0,
            kron_min_sigma: 3.5,
            mag_zeropoint: 0.0,
            mag_gamma: 4.0,
            gain: 0.0,
            detect_type: DetectType::Ccd,
            pixel_scale: 1.0,
            output_equinox: 2000.0,
            outputs: RequestedOutputs::default(),
        }
    }
}

impl Config {
    /// Parse a configuration from YAML. Missing keys take their defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Config = serde_yml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yml::to_string(self)?)
    }

    /// Normalized emulsion gamma, `mag_gamma / ln(10)`.
    #[inline]
    pub fn ngamma(&self) -> f64 {
        self.mag_gamma / std::f64::consts::LN_10
    }

    /// Validate all parameters.
    pub fn validate(&self) -> Result<()> {
        positive("clean_param", self.clean_param)?;
        if self.clean_stack_size == 0 {
            return Err(invalid("clean_stack_size", "must be at least 1, got 0"));
        }
        positive("aperture_diameter", self.aperture_diameter)?;
        if self.aperture_oversampling == 0 {
            return Err(invalid("aperture_oversampling", "must be at least 1, got 0"));
        }
        positive("kron_fact", self.kron_fact)?;
        positive("kron_sigma", self.kron_sigma)?;
        non_negative("kron_min_sigma", self.kron_min_sigma)?;
        finite("mag_zeropoint", self.mag_zeropoint)?;
        if self.detect_type == DetectType::Photo {
            positive("mag_gamma", self.mag_gamma)?;
        }
        non_negative("gain", self.gain)?;
        positive("pixel_scale", self.pixel_scale)?;
        finite("output_equinox", self.output_equinox)?;
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> Error {
    Error::InvalidConfig {
        field,
        reason: reason.into(),
    }
}

fn finite(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite, got {}", value)))
    }
}

fn positive(field: &'static str, value: f64) -> Result<()> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be positive, got {}", value)))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<()> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be non-negative, got {}", value)))
    }
}

//! Shared constants for catalogue consolidation.
//!
//! Calibration constants are observational values inherited from the
//! photographic-plate era of the extraction pipeline. They are kept exactly
//! as measured; changing them shifts every output magnitude.

/// Search radius of the clean pass, in units of the summed semi-major axes.
pub const CLEAN_ZONE: f64 = 10.0;

/// Correction applied to the ellipse area when turning total flux into a
/// Gaussian peak amplitude: `amp = flux / (2π·a·b·ELLIPSE_AREA_CORRECTION)`.
pub const ELLIPSE_AREA_CORRECTION: f64 = 1.0;

/// Smallest semi-axis length used for amplitude estimates (pixels).
///
/// This is the RMS extent of a single uniformly-filled pixel, 1/√12.
pub const MIN_AXIS: f64 = 0.288_675_134_594_812_9;

/// Fraction of an object's own flux that neighbouring survivors may
/// contribute inside its Kron ellipse before it is flagged crowded.
pub const POLLUTE_CONTRAST: f64 = 0.1;

/// Number of perimeter samples used to approximate a Kron ellipse.
pub const CROWD_ANGLES: usize = 36;

/// Linear coefficient of the isophotal flux correction polynomial.
pub const ISOCOR_C1: f64 = 0.196099;

/// Quadratic coefficient of the isophotal flux correction polynomial.
pub const ISOCOR_C2: f64 = 0.751208;

/// Magnitude error conversion factor, 2.5 / ln(10).
pub const MAG_ERR_FACTOR: f64 = 1.0857;

/// Magnitude and magnitude error reported when no measurement is possible.
pub const MAG_SENTINEL: f64 = 99.0;

/// Arcseconds per radian.
pub const ARCSEC_PER_RADIAN: f64 = 206_264.806_247_096_4;

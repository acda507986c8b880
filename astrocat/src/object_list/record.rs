//! Object and pixel record types.

use std::ops::{BitOr, BitOrAssign};

use crate::constants::{ELLIPSE_AREA_CORRECTION, MAG_SENTINEL, MIN_AXIS};
use crate::geometry::{BoundingBox, ellipse_coefficients};

/// One detected pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PixelSample {
    pub x: i32,
    pub y: i32,
    /// Background-subtracted raw value.
    pub value: f32,
    /// Value in the detection (filtered) image.
    pub convolved: f32,
}

impl PixelSample {
    #[inline]
    pub const fn new(x: i32, y: i32, value: f32, convolved: f32) -> Self {
        Self {
            x,
            y,
            value,
            convolved,
        }
    }
}

/// Contiguous run of an object's pixels inside its list's arena.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PixelRange {
    pub start: usize,
    pub len: usize,
}

impl PixelRange {
    #[inline]
    pub const fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Per-object flag set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ObjectFlags(u8);

impl ObjectFlags {
    pub const NONE: Self = Self(0);
    /// Object was produced by merging several deblended components.
    pub const MERGED: Self = Self(1);
    /// Neighbours contribute significant flux inside the Kron ellipse.
    pub const CROWDED: Self = Self(1 << 1);
    /// At least one pixel reached saturation.
    pub const SATURATED: Self = Self(1 << 2);
    /// Aperture or Kron ellipse extends beyond the image.
    pub const APERTURE_TRUNCATED: Self = Self(1 << 3);
    /// Isophotal footprint touches the image border.
    pub const ISO_TRUNCATED: Self = Self(1 << 4);

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    #[inline]
    pub fn set(&mut self, other: Self, value: bool) {
        if value {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }
}

impl BitOr for ObjectFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ObjectFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Photometric measurements. Magnitudes default to the 99.0 sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Photometry {
    pub flux_aper: f64,
    pub fluxerr_aper: f64,
    pub mag_aper: f64,
    pub magerr_aper: f64,
    pub flux_auto: f64,
    pub fluxerr_auto: f64,
    pub mag_auto: f64,
    pub magerr_auto: f64,
    pub flux_iso: f64,
    pub fluxerr_iso: f64,
    pub mag_iso: f64,
    pub magerr_iso: f64,
    pub flux_isocor: f64,
    pub fluxerr_isocor: f64,
    pub mag_isocor: f64,
    pub magerr_isocor: f64,
    /// Peak surface brightness (mag per square world unit).
    pub maxmu: f64,
    /// Surface brightness of the detection threshold.
    pub threshmu: f64,
}

impl Default for Photometry {
    fn default() -> Self {
        Self {
            flux_aper: 0.0,
            fluxerr_aper: 0.0,
            mag_aper: MAG_SENTINEL,
            magerr_aper: MAG_SENTINEL,
            flux_auto: 0.0,
            fluxerr_auto: 0.0,
            mag_auto: MAG_SENTINEL,
            magerr_auto: MAG_SENTINEL,
            flux_iso: 0.0,
            fluxerr_iso: 0.0,
            mag_iso: MAG_SENTINEL,
            magerr_iso: MAG_SENTINEL,
            flux_isocor: 0.0,
            fluxerr_isocor: 0.0,
            mag_isocor: MAG_SENTINEL,
            magerr_isocor: MAG_SENTINEL,
            maxmu: MAG_SENTINEL,
            threshmu: MAG_SENTINEL,
        }
    }
}

/// World-coordinate measurements.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorldMeasurements {
    /// Linear world position.
    pub mxw: f64,
    pub myw: f64,
    /// Celestial position from a plate solution (degrees).
    pub alpha: f64,
    pub delta: f64,
    /// World-scaled semi-axes and position angle (degrees).
    pub aw: f64,
    pub bw: f64,
    pub thetaw: f64,
    /// Isophotal area in squared world units.
    pub area_world: f64,
    pub fwhm_world: f64,
}

/// A detected object.
///
/// Positions follow the pixel convention of the scanner: pixel centres sit
/// on integer coordinates starting at 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectRecord {
    pub number: u32,
    /// Flux-weighted centroid.
    pub mx: f64,
    pub my: f64,
    /// Isophotal ellipse semi-axes (pixels) and position angle (degrees).
    pub a: f64,
    pub b: f64,
    pub theta: f64,
    /// Normalized ellipse quadratic form, 1 on the `a`/`b` ellipse.
    pub cxx: f64,
    pub cyy: f64,
    pub cxy: f64,
    /// Flux accumulated over detection pixels.
    pub rawvalue: f64,
    /// Background-subtracted isophotal flux and its variance.
    pub totalvalue: f64,
    pub totalvar: f64,
    pub maxflux: f64,
    pub pixnb: usize,
    pub scannb: usize,
    pub bbox: BoundingBox,
    pub height: u32,
    pub bkg: f64,
    pub thresh: f64,
    pub fwhm: f64,
    /// Kron factor of the adaptive aperture; 0 when no valid aperture exists.
    pub kronfactor: f64,
    pub flags: ObjectFlags,
    pub pixels: PixelRange,
    pub photometry: Photometry,
    pub world: WorldMeasurements,
}

impl ObjectRecord {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            ..Default::default()
        }
    }

    /// Set the ellipse and recompute the quadratic form coefficients.
    pub fn set_shape(&mut self, a: f64, b: f64, theta: f64) {
        self.a = a;
        self.b = b;
        self.theta = theta;
        let (cxx, cyy, cxy) = ellipse_coefficients(a.max(MIN_AXIS), b.max(MIN_AXIS), theta);
        self.cxx = cxx;
        self.cyy = cyy;
        self.cxy = cxy;
    }

    /// Gaussian peak amplitude implied by the raw flux and ellipse.
    #[inline]
    pub fn amplitude(&self) -> f64 {
        let area = self.a.max(MIN_AXIS) * self.b.max(MIN_AXIS) * ELLIPSE_AREA_CORRECTION;
        self.rawvalue / (2.0 * std::f64::consts::PI * area)
    }

    /// Fold `slave`'s accumulators, extent and flags into this record.
    ///
    /// Shape and centroid are left untouched. `MERGED` and `CROWDED` are not
    /// inherited from the slave.
    pub fn merge_from(&mut self, slave: &ObjectRecord) {
        self.pixnb += slave.pixnb;
        self.scannb += slave.scannb;
        self.rawvalue += slave.rawvalue;
        self.totalvalue += slave.totalvalue;
        self.totalvar += slave.totalvar;
        self.maxflux = self.maxflux.max(slave.maxflux);
        self.bbox = self.bbox.union(&slave.bbox);
        self.height = self.bbox.height();
        self.flags |= slave
            .flags
            .without(ObjectFlags::MERGED | ObjectFlags::CROWDED);
    }
}

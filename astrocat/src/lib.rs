//! Astrocat - consolidation of raw source detections into catalogue records.
//!
//! Takes the candidate objects produced by an image scanner and deblender
//! and turns them into final, calibrated records:
//! - Clean: merge spurious detections split off the wings of bright sources
//! - Photometry: aperture, adaptive (Kron) and isophotal magnitudes
//! - Astrometry: pixel to world positions and shapes, linear or plate solution
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use astrocat::{Config, FieldImage, ObjectList, Pipeline, Projection};
//!
//! let pipeline = Pipeline::new(Config::default(), &Projection::default())?;
//! let catalogue = pipeline.run(raw_candidates, &image, None)?;
//!
//! for object in catalogue.iter() {
//!     println!("{} {:.3}", object.number, object.photometry.mag_auto);
//! }
//! ```

pub mod astrometry;
pub mod clean;
mod config;
pub mod constants;
mod error;
pub mod geometry;
mod image;
pub mod object_list;
pub mod photometry;
mod pipeline;

#[cfg(test)]
pub mod testing;

// ============================================================================
// Configuration and errors
// ============================================================================

pub use config::{Config, DetectType, RequestedOutputs};
pub use error::{Error, Result};

// ============================================================================
// Data model
// ============================================================================

pub use geometry::BoundingBox;
pub use image::{FieldImage, SegmentationMap, SegmentationSink};
pub use object_list::{
    ObjectFlags, ObjectList, ObjectRecord, Photometry, PixelRange, PixelSample, WorldMeasurements,
    contains, copy_object,
};

// ============================================================================
// Processing stages
// ============================================================================

pub use astrometry::{Astrometry, LinearHeader, PlateHeader, Projection, precess};
pub use clean::{CleanOutcome, CleanStats, Cleaner};
pub use photometry::Photometer;
pub use pipeline::Pipeline;

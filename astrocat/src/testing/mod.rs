//! Testing utilities for astrocat.

#![allow(dead_code)]

use crate::image::FieldImage;
use crate::object_list::{ObjectList, ObjectRecord, PixelSample};

/// Initialize tracing subscriber for tests.
/// Safe to call multiple times - will only initialize once.
/// Respects RUST_LOG env var, defaults to "info".
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Description of a synthetic elliptical Gaussian source.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticSource {
    pub number: u32,
    pub x: f64,
    pub y: f64,
    pub a: f64,
    pub b: f64,
    pub theta: f64,
    pub flux: f64,
    pub thresh: f64,
}

impl SyntheticSource {
    pub fn round(number: u32, x: f64, y: f64, sigma: f64, flux: f64) -> Self {
        Self {
            number,
            x,
            y,
            a: sigma,
            b: sigma,
            theta: 0.0,
            flux,
            thresh: 5.0,
        }
    }

    pub fn with_thresh(self, thresh: f64) -> Self {
        Self { thresh, ..self }
    }

    /// Build the record and its footprint (pixels within 2σ of the centre).
    pub fn build(&self) -> (ObjectRecord, Vec<PixelSample>) {
        let mut record = ObjectRecord::new(self.number);
        record.mx = self.x;
        record.my = self.y;
        record.set_shape(self.a, self.b, self.theta);
        record.rawvalue = self.flux;
        record.totalvalue = self.flux;
        record.totalvar = self.flux / 100.0;
        record.maxflux = record.amplitude();
        record.thresh = self.thresh;
        record.scannb = 1;
        record.fwhm = 2.3548 * (self.a * self.b).sqrt();

        let radius = (2.0 * self.a).ceil().max(1.0) as i32;
        let (cx, cy) = (self.x.round() as i32, self.y.round() as i32);
        let amplitude = record.amplitude();
        let mut pixels = Vec::new();
        for y in cy - radius..=cy + radius {
            for x in cx - radius..=cx + radius {
                let r2 = crate::geometry::ellipse_radius2(
                    record.cxx,
                    record.cyy,
                    record.cxy,
                    x as f64 - self.x,
                    y as f64 - self.y,
                );
                if r2 <= 4.0 {
                    let value = (amplitude * (-0.5 * r2).exp()) as f32;
                    pixels.push(PixelSample::new(x, y, value, value));
                }
            }
        }
        (record, pixels)
    }
}

/// Push a list of sources into a fresh object list.
pub fn object_list(sources: &[SyntheticSource]) -> ObjectList {
    let mut list = ObjectList::new();
    for source in sources {
        let (record, pixels) = source.build();
        list.push(record, &pixels).unwrap();
    }
    list
}

/// Render sources onto a flat background.
pub fn render_image(
    width: usize,
    height: usize,
    background: f32,
    background_rms: f32,
    sources: &[SyntheticSource],
) -> FieldImage {
    let mut image = FieldImage::filled(width, height, background, background_rms);
    for source in sources {
        let (record, _) = source.build();
        let amplitude = record.amplitude();
        for y in 0..height {
            for x in 0..width {
                let r2 = crate::geometry::ellipse_radius2(
                    record.cxx,
                    record.cyy,
                    record.cxy,
                    x as f64 - source.x,
                    y as f64 - source.y,
                );
                if r2 < 100.0 {
                    image[(x, y)] += (amplitude * (-0.5 * r2).exp()) as f32;
                }
            }
        }
    }
    image
}

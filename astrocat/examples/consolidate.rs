//! Example: Consolidate a synthetic field
//!
//! Renders a handful of Gaussian sources on a flat background, builds the raw
//! candidate list a deblender would produce (including a spurious fragment
//! split off the brightest source), then runs clean, photometry and
//! astrometry and prints the resulting catalogue.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example consolidate
//! RUST_LOG=astrocat=trace cargo run --example consolidate
//! ```

use astrocat::geometry::ellipse_radius2;
use astrocat::{
    Config, FieldImage, ObjectList, ObjectRecord, Pipeline, PixelSample, Projection,
    SegmentationMap,
};
use tracing_subscriber::EnvFilter;

const WIDTH: usize = 256;
const HEIGHT: usize = 256;
const BACKGROUND: f32 = 1000.0;
const BACKGROUND_RMS: f32 = 5.0;

const CONFIG: &str = "
clean_param: 1.0
aperture_diameter: 8.0
mag_zeropoint: 26.5
gain: 1.5
pixel_scale: 1.2
";

const PROJECTION: &str = "
type: linear
crval: [150.0, 2.0]
crpix: [128.5, 128.5]
cdelt: [-0.000333, 0.000333]
crota: [0.0, 0.0]
";

/// (number, x, y, a, b, theta, flux)
const SOURCES: [(u32, f64, f64, f64, f64, f64, f64); 5] = [
    (1, 80.3, 90.7, 3.0, 2.2, 30.0, 250_000.0),
    (2, 83.1, 92.4, 1.0, 0.8, 0.0, 300.0),
    (3, 170.0, 60.2, 2.0, 2.0, 0.0, 40_000.0),
    (4, 140.6, 200.1, 4.5, 1.5, -60.0, 90_000.0),
    (5, 30.4, 220.8, 1.5, 1.4, 10.0, 8_000.0),
];

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_yaml(CONFIG)?;
    let projection: Projection = serde_yml::from_str(PROJECTION)?;
    let pipeline = Pipeline::new(config, &projection)?;

    let records: Vec<ObjectRecord> = SOURCES.iter().map(|&s| source_record(s)).collect();
    let image = render(&records);
    let (raw, mut segmentation) = candidates(&records, &image)?;
    tracing::info!(candidates = raw.len(), "Synthetic field ready");

    let catalogue = pipeline.run(raw, &image, Some(&mut segmentation))?;

    println!(
        "{:>4} {:>9} {:>9} {:>8} {:>8} {:>8} {:>8} {:>6} {:>11} {:>11}",
        "num", "x", "y", "mag_aper", "mag_auto", "mag_iso", "isocor", "kron", "world_x", "world_y"
    );
    for object in catalogue.iter() {
        let phot = &object.photometry;
        println!(
            "{:>4} {:>9.3} {:>9.3} {:>8.3} {:>8.3} {:>8.3} {:>8.3} {:>6.2} {:>11.6} {:>11.6}",
            object.number,
            object.mx,
            object.my,
            phot.mag_aper,
            phot.mag_auto,
            phot.mag_iso,
            phot.mag_isocor,
            object.kronfactor,
            object.world.mxw,
            object.world.myw,
        );
    }

    let labelled = segmentation.labels().iter().filter(|&&l| l != 0).count();
    tracing::info!(labelled, "Segmentation pixels after merging");
    Ok(())
}

fn source_record(
    (number, x, y, a, b, theta, flux): (u32, f64, f64, f64, f64, f64, f64),
) -> ObjectRecord {
    let mut record = ObjectRecord::new(number);
    record.mx = x;
    record.my = y;
    record.set_shape(a, b, theta);
    record.rawvalue = flux;
    record.fwhm = 2.3548 * (a * b).sqrt();
    record.bkg = BACKGROUND as f64;
    record.thresh = 3.0 * BACKGROUND_RMS as f64;
    record.scannb = 1;
    record
}

fn render(records: &[ObjectRecord]) -> FieldImage {
    let mut image = FieldImage::filled(WIDTH, HEIGHT, BACKGROUND, BACKGROUND_RMS);
    for record in records {
        let amplitude = record.amplitude();
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let dx = x as f64 - record.mx;
                let dy = y as f64 - record.my;
                let r2 = ellipse_radius2(record.cxx, record.cyy, record.cxy, dx, dy);
                if r2 < 100.0 {
                    image[(x, y)] += (amplitude * (-0.5 * r2).exp()) as f32;
                }
            }
        }
    }
    image
}

/// Candidate list and segmentation map from the pixels above threshold
/// inside each source's 3σ ellipse.
fn candidates(
    records: &[ObjectRecord],
    image: &FieldImage,
) -> anyhow::Result<(ObjectList, SegmentationMap)> {
    let mut list = ObjectList::new();
    let mut segmentation = SegmentationMap::new(WIDTH, HEIGHT);

    for record in records {
        let mut record = record.clone();
        let mut pixels = Vec::new();
        let mut total = 0.0;
        let mut peak = 0.0_f64;
        for y in 0..HEIGHT as i32 {
            for x in 0..WIDTH as i32 {
                let dx = x as f64 - record.mx;
                let dy = y as f64 - record.my;
                if ellipse_radius2(record.cxx, record.cyy, record.cxy, dx, dy) > 9.0 {
                    continue;
                }
                let Some(raw) = image.get(x, y) else {
                    continue;
                };
                let value = raw - BACKGROUND;
                if (value as f64) < record.thresh {
                    continue;
                }
                pixels.push(PixelSample::new(x, y, value, value));
                segmentation.set(x, y, record.number);
                total += value as f64;
                peak = peak.max(value as f64);
            }
        }

        record.totalvalue = total;
        record.totalvar = pixels.len() as f64 * (BACKGROUND_RMS as f64).powi(2);
        record.maxflux = peak;
        list.push(record, &pixels)?;
    }

    Ok((list, segmentation))
}

/// Initialize tracing subscriber with console output.
fn init_tracing() {
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

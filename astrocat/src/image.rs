//! Row-major pixel buffers read by the photometric estimators and written by
//! the segmentation side channel.

use std::ops::{Index, IndexMut};

use crate::geometry::BoundingBox;

/// Science image of one field.
///
/// Pixels hold raw values (the background is NOT subtracted); each object
/// carries its own local background estimate. `background_rms` is the
/// per-pixel noise of the background map.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldImage {
    pixels: Vec<f32>,
    width: usize,
    height: usize,
    background_rms: f32,
}

impl FieldImage {
    pub fn new(width: usize, height: usize, pixels: Vec<f32>, background_rms: f32) -> Self {
        assert_eq!(
            pixels.len(),
            width * height,
            "pixels length must equal width * height"
        );
        Self {
            pixels,
            width,
            height,
            background_rms,
        }
    }

    /// Image filled with a constant value.
    pub fn filled(width: usize, height: usize, value: f32, background_rms: f32) -> Self {
        Self::new(width, height, vec![value; width * height], background_rms)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn background_rms(&self) -> f32 {
        self.background_rms
    }

    #[inline]
    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    /// Pixel value at signed coordinates, `None` outside the image.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<f32> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.pixels[y as usize * self.width + x as usize])
    }

    /// Clip an inclusive pixel window `(xmin, xmax, ymin, ymax)` to the image.
    ///
    /// Returns the clipped window and whether anything was cut off. The
    /// window is empty (`xmin > xmax`) when it misses the image entirely.
    pub fn clip_window(&self, window: (i32, i32, i32, i32)) -> ((i32, i32, i32, i32), bool) {
        let (xmin, xmax, ymin, ymax) = window;
        let width = self.width.min(i32::MAX as usize) as i32;
        let height = self.height.min(i32::MAX as usize) as i32;
        let clipped = (
            xmin.max(0),
            xmax.min(width - 1),
            ymin.max(0),
            ymax.min(height - 1),
        );
        (clipped, clipped != window)
    }
}

impl Index<(usize, usize)> for FieldImage {
    type Output = f32;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &f32 {
        debug_assert!(x < self.width && y < self.height);
        &self.pixels[y * self.width + x]
    }
}

impl IndexMut<(usize, usize)> for FieldImage {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut f32 {
        debug_assert!(x < self.width && y < self.height);
        &mut self.pixels[y * self.width + x]
    }
}

/// Receiver of segmentation relabelling when two objects merge.
///
/// Implemented by whatever renders the segmentation check image; the clean
/// pass only reports which label inside which box now belongs to whom.
pub trait SegmentationSink {
    fn relabel(&mut self, bbox: &BoundingBox, from: u32, to: u32);
}

/// Segmentation raster: each pixel holds the number of the object it belongs
/// to, or 0 for sky.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationMap {
    labels: Vec<u32>,
    width: usize,
    height: usize,
}

impl SegmentationMap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            labels: vec![0; width * height],
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// Label at signed coordinates, `None` outside the raster.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<u32> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.labels[y as usize * self.width + x as usize])
    }

    /// Write a label, ignoring coordinates outside the raster.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, label: u32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        self.labels[y as usize * self.width + x as usize] = label;
    }
}

impl SegmentationSink for SegmentationMap {
    fn relabel(&mut self, bbox: &BoundingBox, from: u32, to: u32) {
        if bbox.is_empty() || self.width == 0 || self.height == 0 {
            return;
        }
        let x0 = bbox.xmin.max(0) as usize;
        let y0 = bbox.ymin.max(0) as usize;
        let x1 = (bbox.xmax.max(-1) + 1).min(self.width as i32) as usize;
        let y1 = (bbox.ymax.max(-1) + 1).min(self.height as i32) as usize;

        for y in y0..y1 {
            let row = &mut self.labels[y * self.width..(y + 1) * self.width];
            for label in &mut row[x0.min(x1)..x1] {
                if *label == from {
                    *label = to;
                }
            }
        }
    }
}

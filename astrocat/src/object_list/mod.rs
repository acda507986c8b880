//! Object records with a shared pixel arena.
//!
//! An [`ObjectList`] owns a sequence of [`ObjectRecord`]s and one arena of
//! [`PixelSample`]s. Every record owns a contiguous run of the arena,
//! described by its [`PixelRange`]; the run length always equals `pixnb`.
//!
//! Removal swaps the last record into the freed slot, so indices are not
//! stable across removals. Runs orphaned by removal or by merging stay in
//! the arena until [`ObjectList::compact`] is called at a phase boundary.

mod record;

#[cfg(test)]
mod tests;

pub use record::{
    ObjectFlags, ObjectRecord, Photometry, PixelRange, PixelSample, WorldMeasurements,
};

use crate::error::{Error, Result};
use crate::image::SegmentationSink;

#[derive(Debug, Clone, Default)]
pub struct ObjectList {
    objects: Vec<ObjectRecord>,
    pixels: Vec<PixelSample>,
}

impl ObjectList {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Total arena size, including runs orphaned since the last compaction.
    #[inline]
    pub fn arena_len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&ObjectRecord> {
        self.objects.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut ObjectRecord> {
        self.objects.get_mut(index)
    }

    #[inline]
    pub fn objects(&self) -> &[ObjectRecord] {
        &self.objects
    }

    #[inline]
    pub fn objects_mut(&mut self) -> &mut [ObjectRecord] {
        &mut self.objects
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, ObjectRecord> {
        self.objects.iter()
    }

    /// Pixel run of the object at `index`.
    pub fn pixels_of(&self, index: usize) -> Result<&[PixelSample]> {
        let record = self.record(index)?;
        Ok(&self.pixels[record.pixels.start..record.pixels.end()])
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.pixels = Vec::new();
    }

    /// Append a record together with its pixels.
    ///
    /// The record's pixel range and `pixnb` are set from `pixels`; an empty
    /// bounding box is derived from the pixel coordinates.
    pub fn push(&mut self, mut record: ObjectRecord, pixels: &[PixelSample]) -> Result<usize> {
        self.reserve(1, pixels.len())?;

        if record.bbox.is_empty() {
            for p in pixels {
                record.bbox.include(p.x, p.y);
            }
            record.height = record.bbox.height();
        }

        let start = self.pixels.len();
        self.pixels.extend_from_slice(pixels);
        record.pixels = PixelRange {
            start,
            len: pixels.len(),
        };
        record.pixnb = pixels.len();
        self.objects.push(record);
        Ok(self.objects.len() - 1)
    }

    /// Remove the record at `index`, moving the last record into its slot.
    ///
    /// Other records' pixel runs are not touched. The arena is released once
    /// the list becomes empty.
    pub fn remove(&mut self, index: usize) -> Result<ObjectRecord> {
        self.record(index)?;
        let removed = self.objects.swap_remove(index);
        if self.objects.is_empty() {
            self.pixels = Vec::new();
        }
        Ok(removed)
    }

    /// Merge an object from another list into the record at `master`.
    ///
    /// Accumulators, bounding box and flags are folded in (see
    /// [`ObjectRecord::merge_from`]) and the slave's pixels are appended to the
    /// master's run, relocating the run to the end of the arena if needed.
    /// The sink, when given, relabels the slave's segmentation pixels.
    pub fn absorb(
        &mut self,
        master: usize,
        slave: &ObjectRecord,
        slave_pixels: &[PixelSample],
        sink: Option<&mut dyn SegmentationSink>,
    ) -> Result<()> {
        let run = self.record(master)?.pixels;
        let at_end = run.end() == self.pixels.len();
        let extra = if at_end {
            slave_pixels.len()
        } else {
            run.len + slave_pixels.len()
        };
        self.reserve(0, extra)?;

        if let Some(sink) = sink {
            sink.relabel(&slave.bbox, slave.number, self.objects[master].number);
        }

        let start = if at_end {
            run.start
        } else {
            let start = self.pixels.len();
            self.pixels.extend_from_within(run.start..run.end());
            start
        };
        self.pixels.extend_from_slice(slave_pixels);

        let record = &mut self.objects[master];
        record.pixels = PixelRange {
            start,
            len: run.len + slave_pixels.len(),
        };
        record.merge_from(slave);
        Ok(())
    }

    /// Rebuild the arena so it holds only live runs, in record order.
    pub fn compact(&mut self) -> Result<()> {
        let live: usize = self.objects.iter().map(|o| o.pixels.len).sum();
        if live == self.pixels.len() {
            return Ok(());
        }

        let mut arena = Vec::new();
        arena.try_reserve_exact(live).map_err(|source| Error::Allocation {
            what: "pixel arena",
            requested: live,
            source,
        })?;
        for record in &mut self.objects {
            let start = arena.len();
            arena.extend_from_slice(&self.pixels[record.pixels.start..record.pixels.end()]);
            record.pixels.start = start;
        }

        tracing::trace!(
            "Compacted pixel arena from {} to {} samples",
            self.pixels.len(),
            live
        );
        self.pixels = arena;
        Ok(())
    }

    fn record(&self, index: usize) -> Result<&ObjectRecord> {
        self.objects.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.objects.len(),
        })
    }

    /// Reserve room for more records and samples.
    ///
    /// Lengths are only changed by callers after both reservations succeed,
    /// so a failure leaves the list exactly as it was.
    fn reserve(&mut self, objects: usize, pixels: usize) -> Result<()> {
        self.objects
            .try_reserve(objects)
            .map_err(|source| Error::Allocation {
                what: "object records",
                requested: self.objects.len().saturating_add(objects),
                source,
            })?;
        self.pixels
            .try_reserve(pixels)
            .map_err(|source| Error::Allocation {
                what: "pixel arena",
                requested: self.pixels.len().saturating_add(pixels),
                source,
            })?;
        Ok(())
    }
}

/// Deep-copy the object at `index` of `src` to the end of `dst`.
///
/// Returns the index of the copy in `dst`.
pub fn copy_object(index: usize, src: &ObjectList, dst: &mut ObjectList) -> Result<usize> {
    let record = src.record(index)?.clone();
    let pixels = src.pixels_of(index)?;
    dst.push(record, pixels)
}

/// Coarse containment test between two objects.
///
/// True when the first pixel of the core object appears anywhere in the
/// shell object's run. Objects without pixels contain nothing and are
/// contained by nothing.
pub fn contains(
    core_index: usize,
    core_list: &ObjectList,
    shell_index: usize,
    shell_list: &ObjectList,
) -> Result<bool> {
    let Some(first) = core_list.pixels_of(core_index)?.first() else {
        return Ok(false);
    };
    Ok(shell_list
        .pixels_of(shell_index)?
        .iter()
        .any(|p| p.x == first.x && p.y == first.y))
}

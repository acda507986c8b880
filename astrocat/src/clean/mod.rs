//! Suppression of duplicate detections produced by multi-threshold deblending.
//!
//! Deblending tends to split the wings of bright sources into spurious faint
//! objects. The clean pass models every object as a Gaussian with its own
//! isophotal ellipse and, for each pair of nearby candidates, asks whether
//! the fainter one would still exceed its detection threshold once the
//! brighter one's predicted wing is removed. If not, the fainter object is
//! merged into the brighter one.
//!
//! Candidates arrive one at a time, in the order the scanner finalizes them.
//! A candidate either gets absorbed by an existing survivor, or absorbs all
//! survivors it dominates and becomes a survivor itself.

mod crowding;


pub use crowding::{flag_crowded, is_crowded};

use smallvec::SmallVec;

use crate::config::Config;
use crate::constants::CLEAN_ZONE;
use crate::error::{Error, Result};
use crate::geometry::ellipse_radius2;
use crate::image::SegmentationSink;
use crate::object_list::{ObjectList, ObjectRecord, copy_object};

/// What happened to an incoming candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanOutcome {
    /// Merged into the survivor at `into`.
    Absorbed { into: usize },
    /// Admitted as survivor `index` after absorbing `victims` survivors.
    Admitted { index: usize, victims: usize },
}

/// Counters reported when the clean pass finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanStats {
    pub admitted: usize,
    pub absorbed: usize,
    pub victims: usize,
    pub flushed: usize,
}

/// Incremental clean pass over a stream of candidates.
#[derive(Debug)]
pub struct Cleaner {
    config: Config,
    survivors: ObjectList,
    finished: ObjectList,
    stats: CleanStats,
}

impl Cleaner {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            survivors: ObjectList::new(),
            finished: ObjectList::new(),
            stats: CleanStats::default(),
        }
    }

    /// Current survivor set.
    pub fn survivors(&self) -> &ObjectList {
        &self.survivors
    }

    pub fn stats(&self) -> CleanStats {
        self.stats
    }

    /// Process the candidate at `index` of `incoming`.
    ///
    /// Survivors absorbed by the candidate are merged into it in place, so
    /// `incoming` is modified even when the candidate is admitted.
    pub fn clean(
        &mut self,
        index: usize,
        incoming: &mut ObjectList,
        mut sink: Option<&mut dyn SegmentationSink>,
    ) -> Result<CleanOutcome> {
        let candidate = incoming.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: incoming.len(),
        })?;

        if !self.config.clean {
            let index = self.admit(index, incoming)?;
            return Ok(CleanOutcome::Admitted { index, victims: 0 });
        }

        let cp = 1.0 / (2.0 * self.config.clean_param * self.config.clean_param);
        // Pairs farther apart than clean_param zones never merge, however
        // faint the weaker one is.
        let zone2 = CLEAN_ZONE * CLEAN_ZONE * self.config.clean_param.powi(2).min(1.0);

        let mut victims: SmallVec<[usize; 16]> = SmallVec::new();
        let mut absorbed_into = None;

        for (i, survivor) in self.survivors.iter().enumerate() {
            let dx = candidate.mx - survivor.mx;
            let dy = candidate.my - survivor.my;
            let rlim = candidate.a + survivor.a;
            if dx * dx + dy * dy >= rlim * rlim * zone2 {
                continue;
            }

            if survivor.rawvalue < candidate.rawvalue {
                if is_duplicate(candidate, survivor, cp) {
                    victims.push(i);
                }
            } else if is_duplicate(survivor, candidate, cp) {
                absorbed_into = Some(i);
                break;
            }
        }

        if let Some(into) = absorbed_into {
            tracing::trace!(
                "Object {} absorbed by survivor {}",
                candidate.number,
                self.survivors.objects()[into].number
            );
            let pixels = incoming.pixels_of(index)?;
            self.survivors.absorb(into, candidate, pixels, sink)?;
            self.stats.absorbed += 1;
            return Ok(CleanOutcome::Absorbed { into });
        }

        // Victims were discovered in ascending order; removing them from the
        // back keeps the remaining indices valid under swap removal.
        for &victim in victims.iter().rev() {
            let record = &self.survivors.objects()[victim];
            tracing::trace!(
                "Survivor {} absorbed by object {}",
                record.number,
                incoming.objects()[index].number
            );
            incoming.absorb(
                index,
                record,
                self.survivors.pixels_of(victim)?,
                sink.as_mut()
                    .map(|s| &mut **s as &mut dyn SegmentationSink),
            )?;
            self.survivors.remove(victim)?;
        }
        self.stats.victims += victims.len();

        let admitted = self.admit(index, incoming)?;
        Ok(CleanOutcome::Admitted {
            index: admitted,
            victims: victims.len(),
        })
    }

    /// Consume the cleaner and return every object that left it, flushed
    /// objects first, followed by the remaining survivors.
    pub fn finish(self) -> Result<ObjectList> {
        let Self {
            survivors,
            mut finished,
            stats,
            ..
        } = self;

        for i in 0..survivors.len() {
            copy_object(i, &survivors, &mut finished)?;
        }
        finished.compact()?;

        tracing::debug!(
            "Clean finished: {} objects ({} admitted, {} absorbed, {} victims, {} flushed)",
            finished.len(),
            stats.admitted,
            stats.absorbed,
            stats.victims,
            stats.flushed
        );
        Ok(finished)
    }

    fn admit(&mut self, index: usize, incoming: &ObjectList) -> Result<usize> {
        if self.survivors.len() >= self.config.clean_stack_size {
            self.flush_oldest()?;
        }
        self.stats.admitted += 1;
        copy_object(index, incoming, &mut self.survivors)
    }

    /// Move the survivor whose footprint ended earliest out of the clean set.
    fn flush_oldest(&mut self) -> Result<()> {
        let Some(oldest) = self
            .survivors
            .iter()
            .enumerate()
            .min_by_key(|(_, o)| o.bbox.ymax)
            .map(|(i, _)| i)
        else {
            return Ok(());
        };

        if self.stats.flushed == 0 {
            tracing::warn!(
                "Clean stack full ({} objects), flushing oldest survivors; \
                 consider raising clean_stack_size",
                self.config.clean_stack_size
            );
        }

        copy_object(oldest, &self.survivors, &mut self.finished)?;
        self.survivors.remove(oldest)?;
        self.stats.flushed += 1;
        Ok(())
    }
}

/// Whether `weak` is explained by the wing of `bright`.
///
/// The bright object's flux density at the weak object's centroid is
/// predicted from a Gaussian on the bright object's ellipse, widened by the
/// clean parameter (`cp = 1 / (2·clean_param²)`).
pub fn is_duplicate(bright: &ObjectRecord, weak: &ObjectRecord, cp: f64) -> bool {
    let dx = weak.mx - bright.mx;
    let dy = weak.my - bright.my;
    let r = cp * ellipse_radius2(bright.cxx, bright.cyy, bright.cxy, dx, dy);
    let contamination = bright.amplitude() * (-r).exp();
    weak.amplitude() - contamination < weak.thresh
}

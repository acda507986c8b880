//! End-to-end consolidation of one field.

use crate::astrometry::{Astrometry, Projection};
use crate::clean::{Cleaner, flag_crowded};
use crate::config::Config;
use crate::error::Result;
use crate::image::{FieldImage, SegmentationSink};
use crate::object_list::ObjectList;
use crate::photometry::Photometer;

/// Clean, measure and place the raw detections of a field.
///
/// The configuration is validated and the astrometric transform prepared
/// once, at construction. A pipeline can then process any number of fields
/// sharing the same header.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
    photometer: Photometer,
    astrometry: Astrometry,
}

impl Pipeline {
    pub fn new(config: Config, projection: &Projection) -> Result<Self> {
        config.validate()?;
        let astrometry = Astrometry::new(projection, &config);
        let photometer = Photometer::new(config.clone());
        Ok(Self {
            config,
            photometer,
            astrometry,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn astrometry(&self) -> &Astrometry {
        &self.astrometry
    }

    /// Consolidate `raw` into the final object list.
    ///
    /// Candidates are cleaned in list order, then every surviving object is
    /// measured, checked for crowding and mapped to world coordinates. Any
    /// error aborts the whole run; no partial catalogue is returned.
    pub fn run(
        &self,
        mut raw: ObjectList,
        image: &FieldImage,
        mut sink: Option<&mut dyn SegmentationSink>,
    ) -> Result<ObjectList> {
        let candidates = raw.len();
        tracing::debug!("Consolidating {} candidates", candidates);

        let mut cleaner = Cleaner::new(self.config.clone());
        for index in 0..candidates {
            let sink = sink
                .as_mut()
                .map(|s| &mut **s as &mut dyn SegmentationSink);
            cleaner.clean(index, &mut raw, sink)?;
        }
        let mut objects = cleaner.finish()?;

        self.photometer.measure_all(&mut objects, image);
        let crowded = flag_crowded(&mut objects, self.config.kron_min_sigma);
        self.astrometry.transform_all(&mut objects);

        tracing::info!(
            "Consolidated {} candidates into {} objects ({} crowded)",
            candidates,
            objects.len(),
            crowded
        );
        Ok(objects)
    }
}

use log::debug;

use super::JobRegistry;
use crate::error::TrackerError;
use crate::notify::UpdateKind;
use crate::record::{StageErrorEntry, StageEvent, StageFailure};
use crate::stage::Stage;

impl<H: Clone> JobRegistry<H> {
    /// Attaches a failure to a stage.
    ///
    /// Overwrites whatever entry the stage had, so a stage that had completed
    /// loses its completion marker.
    pub fn add_error(&self, id: &str, failure: StageFailure) -> Result<(), TrackerError> {
        let stage = failure.stage;
        self.with_job(id, |job| {
            debug!("Job {}: {} failed: {}", id, stage, failure.message);
            job.write_event(stage, StageEvent::failed(failure));
            self.notify(id, UpdateKind::StageFailed { stage });
        })
    }

    /// Returns true if `stage` (or any stage, when `None`) carries an error.
    pub fn has_errors(&self, id: &str, stage: Option<Stage>) -> bool {
        self.read_job(id, |job| match stage {
            Some(stage) => job.events.get(&stage).is_some_and(StageEvent::has_error),
            None => job.has_errors(),
        })
        .unwrap_or(false)
    }

    /// Every stage carrying an error, in event order.
    pub fn step_errors(&self, id: &str) -> Vec<StageErrorEntry> {
        self.read_job(id, |job| job.step_errors()).unwrap_or_default()
    }

    pub fn last_error(&self, id: &str) -> Option<StageErrorEntry> {
        self.step_errors(id).pop()
    }
}

//! Per-job handle for pipeline code.

use std::sync::Arc;

use log::warn;
use tracing::debug_span;

use crate::error::TrackerError;
use crate::record::{JobStatus, StageFailure};
use crate::registry::JobRegistry;
use crate::stage::Stage;

/// Stage outcomes reported by a pipeline while it runs a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Started(Stage),
    Finished(Stage),
    Failed(StageFailure),
}

pub trait StageRecorder: Send + Sync {
    fn record(&self, outcome: StageOutcome);
}

/// No-op recorder for unit tests.
pub struct NoopRecorder;

impl StageRecorder for NoopRecorder {
    fn record(&self, _outcome: StageOutcome) {}
}

impl<H: Clone> JobRegistry<H> {
    /// Starts tracking a job and returns a tracker bound to it.
    pub fn start_job(self: &Arc<Self>, id: &str, original_name: &str) -> JobTracker<H> {
        let id = self.start_tracking(id, original_name);
        JobTracker {
            id,
            registry: Arc::clone(self),
        }
    }
}

/// Tracks progress for a single job.
pub struct JobTracker<H> {
    id: String,
    registry: Arc<JobRegistry<H>>,
}

impl<H: Clone> JobTracker<H> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Logs the start of `stage` and moves a queued job to processing.
    pub fn begin(&self, stage: Stage) -> Result<(), TrackerError> {
        let _span = debug_span!("stage_begin", job_id = %self.id, stage = %stage).entered();
        self.registry.add_action(&self.id, stage, false)?;
        self.registry.mark_processing(&self.id)
    }

    /// Marks `stage` as finished.
    ///
    /// Accepts either the start or the done variant of a paired stage.
    pub fn finish(&self, stage: Stage) -> Result<(), TrackerError> {
        let _span = debug_span!("stage_finish", job_id = %self.id, stage = %stage).entered();
        let done = stage.done_stage().unwrap_or(stage);
        self.registry.add_action(&self.id, done, true)?;
        Ok(())
    }

    /// Records a failure on `stage` and puts the job in the error state.
    pub fn fail(&self, stage: Stage, message: &str) -> Result<(), TrackerError> {
        self.fail_with(StageFailure::new(stage, message))
    }

    pub fn fail_with_stack(
        &self,
        stage: Stage,
        message: &str,
        stack: &str,
    ) -> Result<(), TrackerError> {
        self.fail_with(StageFailure::new(stage, message).with_stack(stack))
    }

    fn fail_with(&self, failure: StageFailure) -> Result<(), TrackerError> {
        let _span =
            debug_span!("stage_fail", job_id = %self.id, stage = %failure.stage).entered();
        self.registry.add_error(&self.id, failure)?;
        self.registry.set_status(&self.id, JobStatus::Error)
    }

    pub fn set_status(&self, status: JobStatus) -> Result<(), TrackerError> {
        self.registry.set_status(&self.id, status)
    }
}

impl<H: Clone + Send> StageRecorder for JobTracker<H> {
    fn record(&self, outcome: StageOutcome) {
        let result = match outcome {
            StageOutcome::Started(stage) => self.begin(stage),
            StageOutcome::Finished(stage) => self.finish(stage),
            StageOutcome::Failed(failure) => self.fail_with(failure),
        };
        if let Err(e) = result {
            warn!("Failed to record stage outcome: {}", e);
        }
    }
}

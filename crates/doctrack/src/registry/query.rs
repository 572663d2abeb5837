use serde::Serialize;

use super::{lock_job, JobRegistry};
use crate::record::{JobStatus, TrackedJob};
use crate::stage::Stage;

/// Number of tracked jobs per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    /// Jobs registered but not started.
    pub queued: usize,
    /// Jobs with a stage in flight.
    pub processing: usize,
    /// Jobs that finished successfully.
    pub completed: usize,
    /// Jobs that stopped on a failure.
    pub error: usize,
    /// Jobs passed through without processing.
    pub bypassed: usize,
}

impl StatusCounts {
    /// Number of jobs across all statuses.
    pub fn total(&self) -> usize {
        self.queued + self.processing + self.completed + self.error + self.bypassed
    }

    fn record(&mut self, status: JobStatus) {
        match status {
            JobStatus::Queued => self.queued += 1,
            JobStatus::Processing => self.processing += 1,
            JobStatus::Completed => self.completed += 1,
            JobStatus::Error => self.error += 1,
            JobStatus::Bypassed => self.bypassed += 1,
        }
    }
}

impl<H: Clone> JobRegistry<H> {
    /// Returns a snapshot of one job.
    pub fn get_record(&self, id: &str) -> Option<TrackedJob<H>> {
        self.read_job(id, TrackedJob::clone)
    }

    /// Snapshots of every job, in registration order.
    pub fn all_records(&self) -> Vec<TrackedJob<H>> {
        self.filter_records(|_| true)
    }

    /// Jobs with at least one stage carrying an error.
    pub fn records_with_errors(&self) -> Vec<TrackedJob<H>> {
        self.filter_records(TrackedJob::has_errors)
    }

    /// Jobs with an entry for `stage`, whatever its state.
    pub fn records_by_step(&self, stage: Stage) -> Vec<TrackedJob<H>> {
        self.filter_records(|job| job.has_stage(stage))
    }

    pub fn records_by_status(&self, status: JobStatus) -> Vec<TrackedJob<H>> {
        self.filter_records(|job| job.status == status)
    }

    /// The stage whose entry was written most recently, if any.
    ///
    /// Ordered by timestamp; entries from the same second are ordered by
    /// when they were written. Marking a start entry completed is not a write.
    pub fn last_step(&self, id: &str) -> Option<Stage> {
        self.read_job(id, TrackedJob::last_step).flatten()
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for entry in self.entries() {
            counts.record(lock_job(&entry).status);
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.read_jobs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_jobs().is_empty()
    }

    /// Clones every job matching `keep`. Each record is locked on its own,
    /// so the result is per-record consistent, not a global snapshot.
    fn filter_records(&self, keep: impl Fn(&TrackedJob<H>) -> bool) -> Vec<TrackedJob<H>> {
        self.entries()
            .iter()
            .filter_map(|entry| {
                let job = lock_job(entry);
                keep(&*job).then(|| job.clone())
            })
            .collect()
    }
}

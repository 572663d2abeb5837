//! In-memory job status registry.
//!
//! One `JobRegistry` is constructed per process and shared by reference
//! (typically `Arc<JobRegistry<H>>`). The top-level map is guarded by a
//! `RwLock`; every record has its own `Mutex`, so writers on different jobs
//! never contend and all mutations of one job are serialized.
//!
//! Change notifications are sent while the lock guarding the change is still
//! held, so subscribers see the updates of one job in the order the changes
//! were applied.

mod events;
mod failures;
mod query;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use log::{debug, warn};
use tokio::sync::broadcast;

use crate::config::{self, RegistryConfig};
use crate::error::TrackerError;
use crate::notify::{Field, RegistryUpdate, UpdateBroadcaster, UpdateKind};
use crate::record::{JobStatus, TrackedJob};
use crate::sanitize;

pub use query::StatusCounts;

type JobMap<H> = IndexMap<String, Arc<Mutex<TrackedJob<H>>>>;

/// Registry of every job tracked in this process.
///
/// `H` is the opaque resource handle stored with each job.
pub struct JobRegistry<H = PathBuf> {
    jobs: RwLock<JobMap<H>>,
    updates: UpdateBroadcaster,
    redact_names: bool,
}

impl<H: Clone> JobRegistry<H> {
    /// Creates a registry with default settings.
    pub fn new() -> Self {
        Self::with_config(&RegistryConfig::default())
    }

    /// Creates a registry from loaded settings.
    pub fn with_config(config: &RegistryConfig) -> Self {
        Self {
            jobs: RwLock::new(IndexMap::new()),
            updates: UpdateBroadcaster::new(config.notify_capacity.max(1)),
            redact_names: config.redact_names,
        }
    }

    /// Creates a registry from a JSON settings file.
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let loaded = config::load_config(path)?;
        Ok(Self::with_config(&loaded))
    }

    /// Subscribes to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryUpdate> {
        self.updates.subscribe()
    }

    /// Starts tracking a job. Does nothing if `id` is already tracked.
    ///
    /// Always returns `id`; concurrent calls with the same id produce exactly
    /// one record.
    pub fn start_tracking(&self, id: &str, original_name: &str) -> String {
        let mut jobs = self.write_jobs();
        if !jobs.contains_key(id) {
            jobs.insert(
                id.to_string(),
                Arc::new(Mutex::new(TrackedJob::new(id, original_name))),
            );
            debug!("Tracking job {} ({})", id, self.display_name(original_name));
            self.notify(id, UpdateKind::Registered);
        }

        id.to_string()
    }

    /// Stores the host's resource handle for the job.
    pub fn set_file(&self, id: &str, handle: H) -> Result<(), TrackerError> {
        self.set_field(id, Field::File, |job| job.file = Some(handle))
    }

    /// Sets the coarse status. Stage entries are left untouched.
    pub fn set_status(&self, id: &str, status: JobStatus) -> Result<(), TrackerError> {
        self.with_job(id, |job| {
            job.status = status;
            debug!("Job {} is now {}", id, status);
            self.notify(id, UpdateKind::StatusChanged { status });
        })
    }

    /// Adds a tag; adding one that is already present changes nothing.
    pub fn add_tag(&self, id: &str, tag: &str) -> Result<(), TrackerError> {
        self.with_job(id, |job| {
            if job.add_tag(tag) {
                self.notify(id, UpdateKind::FieldChanged { field: Field::Tags });
            }
        })
    }

    /// Replaces every tag on the job.
    pub fn set_tags<I, S>(&self, id: &str, tags: I) -> Result<(), TrackerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_field(id, Field::Tags, |job| job.replace_tags(tags))
    }

    /// Records the document class chosen for the job.
    pub fn set_classification(&self, id: &str, value: &str) -> Result<(), TrackerError> {
        self.set_field(id, Field::Classification, |job| {
            job.classification = Some(value.to_string())
        })
    }

    /// Marks whether formatted output exists for the job.
    pub fn set_formatted(&self, id: &str, formatted: bool) -> Result<(), TrackerError> {
        self.set_field(id, Field::Formatted, |job| job.formatted = formatted)
    }

    /// Records the destination directory chosen by the move stage.
    pub fn set_new_path(&self, id: &str, path: &str) -> Result<(), TrackerError> {
        self.set_field(id, Field::NewPath, |job| job.new_path = Some(path.to_string()))
    }

    /// Records the file name chosen by the naming stage.
    pub fn set_new_name(&self, id: &str, name: &str) -> Result<(), TrackerError> {
        self.set_field(id, Field::NewName, |job| job.new_name = Some(name.to_string()))
    }

    /// Moves a queued job to processing. Other statuses are left alone.
    pub(crate) fn mark_processing(&self, id: &str) -> Result<(), TrackerError> {
        self.with_job(id, |job| {
            if job.status == JobStatus::Queued {
                job.status = JobStatus::Processing;
                self.notify(
                    id,
                    UpdateKind::StatusChanged {
                        status: JobStatus::Processing,
                    },
                );
            }
        })
    }

    // ─── Internals ──────────────────────────────────────────────────────────

    fn read_jobs(&self) -> RwLockReadGuard<'_, JobMap<H>> {
        match self.jobs.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Job registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_jobs(&self) -> RwLockWriteGuard<'_, JobMap<H>> {
        match self.jobs.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Job registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn entry(&self, id: &str) -> Option<Arc<Mutex<TrackedJob<H>>>> {
        self.read_jobs().get(id).cloned()
    }

    /// Snapshot of every record handle, in registration order.
    fn entries(&self) -> Vec<Arc<Mutex<TrackedJob<H>>>> {
        self.read_jobs().values().cloned().collect()
    }

    /// Runs `f` on the job under its record lock.
    ///
    /// The map lock is released before the record lock is taken.
    fn with_job<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut TrackedJob<H>) -> R,
    ) -> Result<R, TrackerError> {
        let Some(entry) = self.entry(id) else {
            warn!("Ignoring update for unknown job {}", id);
            return Err(TrackerError::unknown(id));
        };
        let mut job = lock_job(&entry);
        Ok(f(&mut *job))
    }

    /// Applies a plain field change and announces it under the record lock.
    fn set_field(
        &self,
        id: &str,
        field: Field,
        f: impl FnOnce(&mut TrackedJob<H>),
    ) -> Result<(), TrackerError> {
        self.with_job(id, |job| {
            f(job);
            self.notify(id, UpdateKind::FieldChanged { field });
        })
    }

    /// Runs a read-only `f` on the job, or returns `None` if it is unknown.
    fn read_job<R>(&self, id: &str, f: impl FnOnce(&TrackedJob<H>) -> R) -> Option<R> {
        let entry = self.entry(id)?;
        let job = lock_job(&entry);
        Some(f(&*job))
    }

    /// Publishes an update. Callers hold the lock that guarded the change,
    /// so updates for one job arrive in the order they were applied.
    fn notify(&self, id: &str, kind: UpdateKind) {
        self.updates.send(RegistryUpdate::new(id, kind));
    }

    fn display_name(&self, name: &str) -> String {
        if self.redact_names {
            sanitize::redact_name(name)
        } else {
            name.to_string()
        }
    }
}

impl<H: Clone> Default for JobRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_job<H>(entry: &Mutex<TrackedJob<H>>) -> MutexGuard<'_, TrackedJob<H>> {
    match entry.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("Job record lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

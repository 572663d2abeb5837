//! Change notifications for registry consumers.
//!
//! Updates only say *what* changed on which job. Consumers re-read the
//! record through the registry queries to get the new state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::record::JobStatus;
use crate::stage::Stage;

/// Simple record field changed through a setter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    File,
    Tags,
    Classification,
    Formatted,
    NewPath,
    NewName,
}

/// What changed on a job. Serialized with a `type` tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum UpdateKind {
    /// A new record was created.
    Registered,
    /// The coarse status was set.
    StatusChanged { status: JobStatus },
    /// A plain field was set.
    FieldChanged { field: Field },
    /// A stage entry was written, or its start entry marked completed.
    /// `stage` is the key that holds the entry.
    StageLogged { stage: Stage, completed: bool },
    /// An error was attached to a stage.
    StageFailed { stage: Stage },
}

/// One change notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryUpdate {
    /// Id of the job that changed.
    pub job_id: String,
    pub kind: UpdateKind,
    /// When the update was sent.
    pub timestamp: DateTime<Utc>,
}

impl RegistryUpdate {
    /// Creates an update stamped with the current time.
    pub fn new(job_id: &str, kind: UpdateKind) -> Self {
        Self {
            job_id: job_id.to_string(),
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// Fan-out channel for registry updates.
#[derive(Clone)]
pub struct UpdateBroadcaster {
    sender: Arc<broadcast::Sender<RegistryUpdate>>,
}

impl UpdateBroadcaster {
    /// Creates a broadcaster buffering up to `capacity` updates per receiver.
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends an update to every current receiver.
    pub fn send(&self, update: RegistryUpdate) {
        // No active receivers is fine
        let _ = self.sender.send(update);
    }

    /// Returns a receiver for updates sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryUpdate> {
        self.sender.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for UpdateBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

//! Per-job record types held by the registry.

use chrono::{DateTime, SubsecRound, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::stage::Stage;

/// Coarse status of a job, independent of individual stage outcomes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
    Bypassed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 5] = [
        JobStatus::Queued,
        JobStatus::Processing,
        JobStatus::Completed,
        JobStatus::Error,
        JobStatus::Bypassed,
    ];

    /// Returns true if no further stages are expected for the job.
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Error | JobStatus::Bypassed
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Error => write!(f, "error"),
            JobStatus::Bypassed => write!(f, "bypassed"),
        }
    }
}

/// Failure details attached to a stage entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StepError {
    pub message: String,
    /// Diagnostic trace captured by the failing step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Stage the failure was reported for.
    pub stage: Stage,
}

/// Input for error capture: which stage failed and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: Stage,
    pub message: String,
    pub stack: Option<String>,
}

impl StageFailure {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

/// The single entry kept for one stage of one job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StageEvent {
    /// Wall-clock time the entry was written, whole seconds.
    pub timestamp: DateTime<Utc>,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StepError>,
    /// Per-job write counter, orders entries that share a timestamp.
    #[serde(skip)]
    pub(crate) seq: u64,
}

impl StageEvent {
    pub(crate) fn now(completed: bool) -> Self {
        Self {
            timestamp: now_seconds(),
            completed,
            error: None,
            seq: 0,
        }
    }

    pub(crate) fn failed(failure: StageFailure) -> Self {
        Self {
            timestamp: now_seconds(),
            completed: false,
            error: Some(StepError {
                message: failure.message,
                stack: failure.stack,
                stage: failure.stage,
            }),
            seq: 0,
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A stage that carries an error, as returned by error queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StageErrorEntry {
    pub stage: Stage,
    pub error: StepError,
}

/// Full state of one tracked job.
///
/// `H` is the host's resource handle. It is stored and handed back as-is and
/// never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound = "")]
pub struct TrackedJob<H> {
    /// Caller-supplied job id, unique within the registry.
    pub id: String,
    /// Name of the source document as first registered.
    pub original_name: String,
    /// Coarse status; only changed by explicit calls.
    pub status: JobStatus,
    /// Tags assigned so far, without duplicates, in insertion order.
    pub tags: Vec<String>,
    /// Document class chosen by the classifier, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    /// Whether the formatting stage has produced output.
    pub formatted: bool,
    /// Destination directory after the move stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_path: Option<String>,
    /// Final file name after the naming stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    /// Host resource handle, never serialized.
    #[serde(skip)]
    pub file: Option<H>,
    /// One entry per stage, in the order stages were first logged.
    pub events: IndexMap<Stage, StageEvent>,
    #[serde(skip)]
    write_seq: u64,
}

impl<H> TrackedJob<H> {
    pub(crate) fn new(id: &str, original_name: &str) -> Self {
        Self {
            id: id.to_string(),
            original_name: original_name.to_string(),
            status: JobStatus::Queued,
            tags: Vec::new(),
            classification: None,
            formatted: false,
            new_path: None,
            new_name: None,
            file: None,
            events: IndexMap::new(),
            write_seq: 0,
        }
    }

    /// Writes the entry for `stage`, replacing any previous one in place.
    pub(crate) fn write_event(&mut self, stage: Stage, mut event: StageEvent) {
        self.write_seq += 1;
        event.seq = self.write_seq;
        self.events.insert(stage, event);
    }

    /// Adds a tag unless it is already present. Returns true if added.
    pub(crate) fn add_tag(&mut self, tag: &str) -> bool {
        if self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Replaces all tags, keeping the first occurrence of any duplicate.
    pub(crate) fn replace_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.clear();
        for tag in tags {
            let tag = tag.into();
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
    }

    pub fn has_errors(&self) -> bool {
        self.events.values().any(StageEvent::has_error)
    }

    pub fn has_stage(&self, stage: Stage) -> bool {
        self.events.contains_key(&stage)
    }

    /// Every stage entry carrying an error, in event order.
    pub fn step_errors(&self) -> Vec<StageErrorEntry> {
        self.events
            .iter()
            .filter_map(|(stage, event)| {
                event.error.as_ref().map(|error| StageErrorEntry {
                    stage: *stage,
                    error: error.clone(),
                })
            })
            .collect()
    }

    /// Stage with the latest timestamp. Entries stamped in the same second
    /// resolve to the one written last, even if it kept an earlier position.
    pub fn last_step(&self) -> Option<Stage> {
        self.events
            .iter()
            .max_by_key(|(_, event)| (event.timestamp, event.seq))
            .map(|(stage, _)| *stage)
    }
}

fn now_seconds() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn job() -> TrackedJob<()> {
        TrackedJob::new("job-1", "scan.pdf")
    }

    #[test]
    fn test_new_job_defaults() {
        let job = job();
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.tags.is_empty());
        assert!(job.events.is_empty());
        assert!(job.file.is_none());
        assert!(!job.formatted);
    }

    #[test]
    fn test_finished_statuses() {
        let finished: Vec<JobStatus> = JobStatus::ALL
            .into_iter()
            .filter(|s| s.is_finished())
            .collect();
        assert_eq!(
            finished,
            vec![JobStatus::Completed, JobStatus::Error, JobStatus::Bypassed]
        );
        assert_eq!(JobStatus::Bypassed.to_string(), "bypassed");
    }

    #[test]
    fn test_add_tag_ignores_duplicates() {
        let mut job = job();
        assert!(job.add_tag("invoice"));
        assert!(!job.add_tag("invoice"));
        assert_eq!(job.tags, vec!["invoice"]);
    }

    #[test]
    fn test_replace_tags_collapses_duplicates() {
        let mut job = job();
        job.add_tag("old");
        job.replace_tags(["b", "a", "b"]);
        assert_eq!(job.tags, vec!["b", "a"]);
    }

    #[test]
    fn test_timestamps_have_second_precision() {
        let event = StageEvent::now(false);
        assert_eq!(event.timestamp.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn test_last_step_uses_timestamp_order() {
        let mut job = job();
        let base = now_seconds();
        let at = |offset: i64| StageEvent {
            timestamp: base + Duration::seconds(offset),
            completed: false,
            error: None,
            seq: 0,
        };
        job.write_event(Stage::Tagging, at(10));
        job.write_event(Stage::Classify, at(5));
        assert_eq!(job.last_step(), Some(Stage::Tagging));
    }

    #[test]
    fn test_last_step_tie_prefers_later_entry() {
        let mut job = job();
        let event = StageEvent::now(false);
        job.write_event(Stage::Extract, event.clone());
        job.write_event(Stage::Classify, event);
        assert_eq!(job.last_step(), Some(Stage::Classify));
    }

    #[test]
    fn test_last_step_tie_prefers_rewritten_entry() {
        let mut job = job();
        let event = StageEvent::now(false);
        job.write_event(Stage::Extract, event.clone());
        job.write_event(Stage::Classify, event.clone());
        job.write_event(Stage::Extract, event);

        assert_eq!(job.events.keys().next(), Some(&Stage::Extract));
        assert_eq!(job.last_step(), Some(Stage::Extract));
    }

    #[test]
    fn test_last_step_empty() {
        assert_eq!(job().last_step(), None);
    }

    #[test]
    fn test_serialize_skips_file_handle() {
        let mut job: TrackedJob<String> = TrackedJob::new("job-1", "scan.pdf");
        job.file = Some("/secret/handle".to_string());
        job.write_event(Stage::Classify, StageEvent::now(true));

        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["originalName"], "scan.pdf");
        assert_eq!(value["status"], "queued");
        assert!(value.get("file").is_none());
        assert_eq!(value["events"]["CLASSIFY"]["completed"], true);
        assert!(value["events"]["CLASSIFY"].get("seq").is_none());
        assert!(value.get("writeSeq").is_none());
    }
}

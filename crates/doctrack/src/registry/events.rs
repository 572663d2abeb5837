use log::debug;

use super::JobRegistry;
use crate::error::TrackerError;
use crate::notify::UpdateKind;
use crate::record::{StageEvent, TrackedJob};
use crate::stage::Stage;

impl<H: Clone> JobRegistry<H> {
    /// Logs that `stage` started (`completed = false`) or finished.
    ///
    /// When a "done" stage is logged as completed and its start stage already
    /// has an entry, that entry is marked completed in place and keeps its
    /// original timestamp. Otherwise a fresh entry is written under `stage`
    /// itself, replacing any previous one.
    ///
    /// Returns the stage key whose entry was written.
    pub fn add_action(
        &self,
        id: &str,
        stage: Stage,
        completed: bool,
    ) -> Result<Stage, TrackerError> {
        self.with_job(id, |job| {
            let key = pair_with_start(job, stage, completed).unwrap_or_else(|| {
                job.write_event(stage, StageEvent::now(completed));
                stage
            });

            if key != stage {
                debug!("Job {}: {} completed ({})", id, key, stage);
            } else {
                debug!("Job {}: logged {} (completed: {})", id, stage, completed);
            }
            self.notify(
                id,
                UpdateKind::StageLogged {
                    stage: key,
                    completed,
                },
            );
            key
        })
    }
}

/// Marks the start entry of a completed "done" stage, keeping its timestamp.
fn pair_with_start<H>(job: &mut TrackedJob<H>, stage: Stage, completed: bool) -> Option<Stage> {
    if !completed {
        return None;
    }
    let start = stage.start_stage()?;
    let event = job.events.get_mut(&start)?;
    event.completed = true;
    Some(start)
}

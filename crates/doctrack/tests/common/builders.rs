//! Builder for registering jobs with a stage history.

use doctrack::{JobRegistry, JobStatus, Stage, StageFailure};

enum Step {
    Action { stage: Stage, completed: bool },
    Error(StageFailure),
}

/// Registers a job and replays a list of stage events against it.
pub struct JobBuilder {
    id: String,
    name: String,
    status: Option<JobStatus>,
    tags: Vec<String>,
    steps: Vec<Step>,
}

impl JobBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: format!("{}.pdf", id),
            status: None,
            tags: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn started(mut self, stage: Stage) -> Self {
        self.steps.push(Step::Action {
            stage,
            completed: false,
        });
        self
    }

    /// Logs `stage` as started and then its done marker.
    pub fn completed(mut self, stage: Stage) -> Self {
        let done = stage.done_stage().unwrap_or(stage);
        self.steps.push(Step::Action {
            stage,
            completed: false,
        });
        self.steps.push(Step::Action {
            stage: done,
            completed: true,
        });
        self
    }

    pub fn failed(mut self, stage: Stage, message: &str) -> Self {
        self.steps.push(Step::Error(StageFailure::new(stage, message)));
        self
    }

    pub fn register(self, registry: &JobRegistry) -> String {
        let id = registry.start_tracking(&self.id, &self.name);
        for tag in &self.tags {
            registry.add_tag(&id, tag).expect("job was just registered");
        }
        if let Some(status) = self.status {
            registry.set_status(&id, status).expect("job was just registered");
        }
        for step in self.steps {
            match step {
                Step::Action { stage, completed } => {
                    registry.add_action(&id, stage, completed).expect("job was just registered");
                }
                Step::Error(failure) => {
                    registry.add_error(&id, failure).expect("job was just registered");
                }
            }
        }
        id
    }
}

pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod record;
pub mod registry;
pub mod sanitize;
pub mod stage;
pub mod tracker;

pub use config::{load_config, load_config_from_str, RegistryConfig};
pub use error::{ConfigError, DoctrackError, LoggingError, Result, TrackerError};
pub use logging::{init_logging, LogFormat};
pub use notify::{Field, RegistryUpdate, UpdateBroadcaster, UpdateKind};
pub use record::{JobStatus, StageErrorEntry, StageEvent, StageFailure, StepError, TrackedJob};
pub use registry::{JobRegistry, StatusCounts};
pub use stage::{ParseStageError, Stage, StagePair, STAGE_PAIRS};
pub use tracker::{JobTracker, NoopRecorder, StageOutcome, StageRecorder};

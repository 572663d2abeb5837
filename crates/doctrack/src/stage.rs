//! Catalog of pipeline stages and the start/done pairing table.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A pipeline stage a document can pass through.
///
/// The set is closed: adding a stage means adding a variant here, a
/// description, and (if it is paired) an entry in [`STAGE_PAIRS`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Container,
    Cleanup,
    CleanupDone,
    Extract,
    ExtractDone,
    Classify,
    ClassifyDone,
    Tagging,
    TaggingDone,
    Naming,
    NamingDone,
    Format,
    FormatDone,
    Move,
    MoveDone,
    ErrorExtract,
    ErrorClassify,
    ErrorTagging,
    ErrorNaming,
    ErrorFormat,
    ErrorMove,
}

/// A start stage together with the stage that marks its completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagePair {
    /// Stage logged when the step begins.
    pub start: Stage,
    /// Marker logged when the step finishes.
    pub done: Stage,
}

/// Static pairing table used by the event log to match a "done" marker
/// with the entry written when the stage started.
pub const STAGE_PAIRS: &[StagePair] = &[
    StagePair {
        start: Stage::Cleanup,
        done: Stage::CleanupDone,
    },
    StagePair {
        start: Stage::Extract,
        done: Stage::ExtractDone,
    },
    StagePair {
        start: Stage::Classify,
        done: Stage::ClassifyDone,
    },
    StagePair {
        start: Stage::Tagging,
        done: Stage::TaggingDone,
    },
    StagePair {
        start: Stage::Naming,
        done: Stage::NamingDone,
    },
    StagePair {
        start: Stage::Format,
        done: Stage::FormatDone,
    },
    StagePair {
        start: Stage::Move,
        done: Stage::MoveDone,
    },
];

impl Stage {
    /// Every stage, in pipeline order with error keys last.
    pub const ALL: [Stage; 21] = [
        Stage::Container,
        Stage::Cleanup,
        Stage::CleanupDone,
        Stage::Extract,
        Stage::ExtractDone,
        Stage::Classify,
        Stage::ClassifyDone,
        Stage::Tagging,
        Stage::TaggingDone,
        Stage::Naming,
        Stage::NamingDone,
        Stage::Format,
        Stage::FormatDone,
        Stage::Move,
        Stage::MoveDone,
        Stage::ErrorExtract,
        Stage::ErrorClassify,
        Stage::ErrorTagging,
        Stage::ErrorNaming,
        Stage::ErrorFormat,
        Stage::ErrorMove,
    ];

    /// Returns the start stage this stage completes, if it is a "done" stage.
    pub fn start_stage(self) -> Option<Stage> {
        STAGE_PAIRS
            .iter()
            .find(|pair| pair.done == self)
            .map(|pair| pair.start)
    }

    /// Returns the stage that marks completion of this one, if it is paired.
    pub fn done_stage(self) -> Option<Stage> {
        STAGE_PAIRS
            .iter()
            .find(|pair| pair.start == self)
            .map(|pair| pair.done)
    }

    /// Returns true for the dedicated `ERROR_*` keys.
    pub fn is_error_key(self) -> bool {
        matches!(
            self,
            Stage::ErrorExtract
                | Stage::ErrorClassify
                | Stage::ErrorTagging
                | Stage::ErrorNaming
                | Stage::ErrorFormat
                | Stage::ErrorMove
        )
    }

    /// Wire name used by presentation layers, e.g. `CLASSIFY_DONE`.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Container => "CONTAINER",
            Stage::Cleanup => "CLEANUP",
            Stage::CleanupDone => "CLEANUP_DONE",
            Stage::Extract => "EXTRACT",
            Stage::ExtractDone => "EXTRACT_DONE",
            Stage::Classify => "CLASSIFY",
            Stage::ClassifyDone => "CLASSIFY_DONE",
            Stage::Tagging => "TAGGING",
            Stage::TaggingDone => "TAGGING_DONE",
            Stage::Naming => "NAMING",
            Stage::NamingDone => "NAMING_DONE",
            Stage::Format => "FORMAT",
            Stage::FormatDone => "FORMAT_DONE",
            Stage::Move => "MOVE",
            Stage::MoveDone => "MOVE_DONE",
            Stage::ErrorExtract => "ERROR_EXTRACT",
            Stage::ErrorClassify => "ERROR_CLASSIFY",
            Stage::ErrorTagging => "ERROR_TAGGING",
            Stage::ErrorNaming => "ERROR_NAMING",
            Stage::ErrorFormat => "ERROR_FORMAT",
            Stage::ErrorMove => "ERROR_MOVE",
        }
    }

    /// Human-readable description of the stage.
    pub fn description(self) -> &'static str {
        match self {
            Stage::Container => "Creating document container",
            Stage::Cleanup => "Cleaning up document",
            Stage::CleanupDone => "Document cleaned up",
            Stage::Extract => "Extracting content",
            Stage::ExtractDone => "Content extracted",
            Stage::Classify => "Classifying document",
            Stage::ClassifyDone => "Document classified",
            Stage::Tagging => "Tagging document",
            Stage::TaggingDone => "Document tagged",
            Stage::Naming => "Generating file name",
            Stage::NamingDone => "File name generated",
            Stage::Format => "Formatting document",
            Stage::FormatDone => "Document formatted",
            Stage::Move => "Moving document",
            Stage::MoveDone => "Document moved",
            Stage::ErrorExtract => "Content extraction failed",
            Stage::ErrorClassify => "Classification failed",
            Stage::ErrorTagging => "Tagging failed",
            Stage::ErrorNaming => "Naming failed",
            Stage::ErrorFormat => "Formatting failed",
            Stage::ErrorMove => "Moving failed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown stage name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown stage '{0}'")]
pub struct ParseStageError(pub String);

impl FromStr for Stage {
    type Err = ParseStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| ParseStageError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_done_maps_to_start() {
        assert_eq!(Stage::ClassifyDone.start_stage(), Some(Stage::Classify));
        assert_eq!(Stage::MoveDone.start_stage(), Some(Stage::Move));
        assert_eq!(Stage::Classify.start_stage(), None);
    }

    #[test]
    fn test_start_maps_to_done() {
        assert_eq!(Stage::Tagging.done_stage(), Some(Stage::TaggingDone));
        assert_eq!(Stage::TaggingDone.done_stage(), None);
    }

    #[test]
    fn test_unpaired_stages() {
        for stage in [Stage::Container, Stage::ErrorTagging, Stage::ErrorMove] {
            assert_eq!(stage.start_stage(), None);
            assert_eq!(stage.done_stage(), None);
        }
    }

    #[test]
    fn test_pairing_table_is_consistent() {
        for pair in STAGE_PAIRS {
            assert_ne!(pair.start, pair.done);
            assert_eq!(pair.done.start_stage(), Some(pair.start));
            assert_eq!(pair.start.done_stage(), Some(pair.done));
            assert!(!pair.start.is_error_key());
            assert!(!pair.done.is_error_key());
        }
        // No stage appears in more than one pair.
        for stage in Stage::ALL {
            let uses = STAGE_PAIRS
                .iter()
                .filter(|p| p.start == stage || p.done == stage)
                .count();
            assert!(uses <= 1, "{} appears in {} pairs", stage, uses);
        }
    }

    #[test]
    fn test_wire_names_round_trip_through_serde() {
        let json = serde_json::to_string(&Stage::ClassifyDone).unwrap();
        assert_eq!(json, "\"CLASSIFY_DONE\"");

        for stage in Stage::ALL {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage.as_str()));
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("TAGGING".parse::<Stage>(), Ok(Stage::Tagging));
        assert_eq!(
            "tagging".parse::<Stage>(),
            Err(ParseStageError("tagging".to_string()))
        );
    }

    #[test]
    fn test_descriptions_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for stage in Stage::ALL {
            assert!(seen.insert(stage.description()));
        }
    }
}

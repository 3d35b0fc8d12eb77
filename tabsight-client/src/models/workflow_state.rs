//! Upload/analyze workflow state machine
//!
//! ```text
//! Idle → FilesSelected → Uploading → Uploaded → Analyzing → Complete
//!                                  ↘ UploadFailed          ↘ AnalysisFailed
//! ```
//!
//! `UploadFailed`, `AnalysisFailed` and `Complete` end the current attempt.
//! A new user action starts a new attempt rather than resuming the old one.

use crate::error::{AnalysisFailure, UploadError};
use crate::models::{DirectoryId, FileSelection, ValidatedAnalysis};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Data-less view of [`WorkflowState`] for rendering and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowPhase {
    Idle,
    FilesSelected,
    Uploading,
    Uploaded,
    UploadFailed,
    Analyzing,
    AnalysisFailed,
    Complete,
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkflowPhase::Idle => "idle",
            WorkflowPhase::FilesSelected => "files selected",
            WorkflowPhase::Uploading => "uploading",
            WorkflowPhase::Uploaded => "uploaded",
            WorkflowPhase::UploadFailed => "upload failed",
            WorkflowPhase::Analyzing => "analyzing",
            WorkflowPhase::AnalysisFailed => "analysis failed",
            WorkflowPhase::Complete => "complete",
        };
        f.write_str(label)
    }
}

/// What the user sees. Owned and mutated only by the workflow controller.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    FilesSelected {
        files: FileSelection,
    },
    Uploading {
        files: FileSelection,
    },
    Uploaded {
        directory: DirectoryId,
    },
    UploadFailed {
        files: FileSelection,
        error: UploadError,
    },
    Analyzing {
        directory: DirectoryId,
    },
    AnalysisFailed {
        directory: DirectoryId,
        error: AnalysisFailure,
    },
    Complete {
        directory: DirectoryId,
        analysis: ValidatedAnalysis,
    },
}

impl WorkflowState {
    pub fn phase(&self) -> WorkflowPhase {
        match self {
            WorkflowState::Idle => WorkflowPhase::Idle,
            WorkflowState::FilesSelected { .. } => WorkflowPhase::FilesSelected,
            WorkflowState::Uploading { .. } => WorkflowPhase::Uploading,
            WorkflowState::Uploaded { .. } => WorkflowPhase::Uploaded,
            WorkflowState::UploadFailed { .. } => WorkflowPhase::UploadFailed,
            WorkflowState::Analyzing { .. } => WorkflowPhase::Analyzing,
            WorkflowState::AnalysisFailed { .. } => WorkflowPhase::AnalysisFailed,
            WorkflowState::Complete { .. } => WorkflowPhase::Complete,
        }
    }

    /// A network operation is outstanding
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            WorkflowState::Uploading { .. } | WorkflowState::Analyzing { .. }
        )
    }

    /// The current attempt has ended
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowState::UploadFailed { .. }
                | WorkflowState::AnalysisFailed { .. }
                | WorkflowState::Complete { .. }
        )
    }

    /// Directory reference carried by this state, if any
    pub fn directory(&self) -> Option<&DirectoryId> {
        match self {
            WorkflowState::Uploaded { directory }
            | WorkflowState::Analyzing { directory }
            | WorkflowState::AnalysisFailed { directory, .. }
            | WorkflowState::Complete { directory, .. } => Some(directory),
            _ => None,
        }
    }

    pub fn analysis(&self) -> Option<&ValidatedAnalysis> {
        match self {
            WorkflowState::Complete { analysis, .. } => Some(analysis),
            _ => None,
        }
    }
}

/// State published to subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSnapshot {
    /// Workflow instance identifier
    pub instance_id: Uuid,
    /// Incremented whenever a new attempt starts or the workflow is reset
    pub attempt: u64,
    pub state: WorkflowState,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowSnapshot {
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            attempt: 0,
            state: WorkflowState::Idle,
            updated_at: Utc::now(),
        }
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.state.phase()
    }

    /// Replace the state, recording the transition
    pub fn transition_to(&mut self, new_state: WorkflowState) -> StateTransition {
        let transition = StateTransition {
            instance_id: self.instance_id,
            attempt: self.attempt,
            from: self.state.phase(),
            to: new_state.phase(),
            at: Utc::now(),
        };
        self.state = new_state;
        self.updated_at = transition.at;
        transition
    }
}

impl Default for WorkflowSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Applied state transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub instance_id: Uuid,
    pub attempt: u64,
    pub from: WorkflowPhase,
    pub to: WorkflowPhase,
    pub at: DateTime<Utc>,
}

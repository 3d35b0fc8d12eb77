//! Error types for tabsight-client
//!
//! Failure taxonomy shared by both network stages:
//! - `NetworkUnavailable`: no response received
//! - `HttpStatus`: the server answered with a failure status
//! - `Protocol`: success status, but the envelope is not what was expected
//!
//! Analysis responses that match no known result shape produce a
//! [`ValidationError`]. Every error is terminal for the current attempt.

use crate::models::WorkflowPhase;
use std::fmt;
use thiserror::Error;

/// Upload stage errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// Precondition: nothing to upload
    #[error("No files selected")]
    EmptySelection,

    /// Precondition: extension outside csv/xlsx/xls (only when enforced)
    #[error("Unsupported file type for {name}: '{extension}' (expected csv, xlsx or xls)")]
    UnsupportedFileType { name: String, extension: String },

    /// Precondition: file exceeds the configured size limit
    #[error("File {name} is {size} bytes, limit is {limit} bytes")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    /// File content could not be read while encoding the request
    #[error("Failed to read {name}: {reason}")]
    FileRead { name: String, reason: String },

    #[error("Upload service unreachable: {0}")]
    NetworkUnavailable(String),

    #[error("Upload failed with HTTP status {0}")]
    HttpStatus(u16),

    #[error("Upload protocol error: {0}")]
    Protocol(String),
}

/// Analysis request errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("Analysis service unreachable: {0}")]
    NetworkUnavailable(String),

    #[error("Analysis failed with HTTP status {0}")]
    HttpStatus(u16),

    #[error("Analysis protocol error: {0}")]
    Protocol(String),
}

/// Why a single field failed its check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultKind {
    Missing,
    WrongType { expected: &'static str },
    WrongValue { expected: &'static str },
}

/// One missing or mistyped field, addressed by dotted path (`result.best_model`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFault {
    pub path: String,
    pub kind: FaultKind,
}

impl FieldFault {
    pub fn missing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: FaultKind::Missing,
        }
    }

    pub fn wrong_type(path: impl Into<String>, expected: &'static str) -> Self {
        Self {
            path: path.into(),
            kind: FaultKind::WrongType { expected },
        }
    }

    pub fn wrong_value(path: impl Into<String>, expected: &'static str) -> Self {
        Self {
            path: path.into(),
            kind: FaultKind::WrongValue { expected },
        }
    }
}

impl fmt::Display for FieldFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FaultKind::Missing => write!(f, "{}: missing", self.path),
            FaultKind::WrongType { expected } => write!(f, "{}: expected {}", self.path, expected),
            FaultKind::WrongValue { expected } => write!(f, "{}: expected {}", self.path, expected),
        }
    }
}

/// Analysis response matched neither accepted shape.
///
/// Both failure sets are kept; neither is ever empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Response matches no known result shape (ranking: {}; overview: {})", join_faults(.ranking), join_faults(.overview))]
pub struct ValidationError {
    /// Faults found while reading the response as the ranking shape
    pub ranking: Vec<FieldFault>,
    /// Faults found while reading the response as the overview shape
    pub overview: Vec<FieldFault>,
}

fn join_faults(faults: &[FieldFault]) -> String {
    faults
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error detail stored in the `AnalysisFailed` state
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisFailure {
    #[error(transparent)]
    Request(#[from] AnalysisError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Controller-level errors returned to the caller of a workflow operation.
///
/// Stage failures are also recorded in the workflow state; these errors
/// mirror them for the caller that triggered the stage.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    /// Action not accepted in the current state
    #[error("Cannot {action} while {phase}")]
    InvalidTransition {
        phase: WorkflowPhase,
        action: &'static str,
    },

    /// A network operation is already outstanding for this workflow
    #[error("Workflow busy ({0})")]
    Busy(WorkflowPhase),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Analysis(#[from] AnalysisFailure),

    /// The in-flight operation was abandoned (reset or teardown)
    #[error("Operation abandoned")]
    Cancelled,

    #[error("Workflow has been torn down")]
    TornDown,
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

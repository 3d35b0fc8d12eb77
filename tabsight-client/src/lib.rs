//! tabsight-client library interface
//!
//! Client-side upload/analyze workflow for the remote model-training
//! service:
//! - `services::schema_validator`: typed validation of analysis responses
//! - `services::upload_client` / `services::analysis_client`: the two HTTP stages
//! - `workflow::WorkflowController`: state machine sequencing the stages

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::config::ClientSettings;
pub use crate::error::{
    AnalysisError, AnalysisFailure, FieldFault, UploadError, ValidationError, WorkflowError,
    WorkflowResult,
};
pub use crate::models::{
    DirectoryId, FileHandle, FileSelection, ValidatedAnalysis, WorkflowPhase, WorkflowSnapshot,
    WorkflowState,
};
pub use crate::workflow::WorkflowController;

//! Data models for tabsight-client
//!
//! - File selection and advisory upload checks
//! - Directory reference and analysis prompt
//! - Validated analysis results
//! - Workflow state machine

pub mod analysis;
pub mod directory;
pub mod file_selection;
pub mod workflow_state;

pub use analysis::{DatasetAnalysis, ModelPerformance, OverviewReport, RankingReport, ValidatedAnalysis};
pub use directory::{AnalysisPrompt, DirectoryId};
pub use file_selection::{FileHandle, FileSelection, FileSource, UploadPolicy, SUPPORTED_EXTENSIONS};
pub use workflow_state::{StateTransition, WorkflowPhase, WorkflowSnapshot, WorkflowState};

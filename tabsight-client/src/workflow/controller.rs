//! Upload/analyze workflow controller
//!
//! Sequences UploadClient → AnalysisClient → schema validation and owns the
//! single [`WorkflowState`] of one workflow instance.
//!
//! # Transitions
//! | From                          | Action            | To                         |
//! |-------------------------------|-------------------|----------------------------|
//! | any non-busy                  | `select_files`    | FilesSelected (new attempt)|
//! | FilesSelected                 | `confirm_upload`  | Uploading → Uploaded / UploadFailed |
//! | Uploaded                      | `start_analysis`  | Analyzing → Complete / AnalysisFailed |
//! | Complete / AnalysisFailed     | `start_analysis`  | Analyzing (new attempt)    |
//! | any non-busy                  | `enter_analysis`  | Analyzing (new attempt)    |
//! | any                           | `reset`           | Idle (new attempt)         |
//!
//! # Concurrency
//! At most one network operation is outstanding: `Uploading` and `Analyzing`
//! reject every action except `reset`. Each resolution is applied only if its
//! attempt is still current and the controller has not been torn down, so a
//! late response never overwrites a newer state.

use crate::config::ClientSettings;
use crate::error::{AnalysisFailure, UploadError, WorkflowError, WorkflowResult};
use crate::models::{
    AnalysisPrompt, DirectoryId, FileSelection, StateTransition, ValidatedAnalysis,
    WorkflowSnapshot, WorkflowState,
};
use crate::services::{schema_validator, AnalysisClient, UploadClient};
use std::future::Future;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Whether a transition starts a new attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Same,
    New,
}

/// Workflow controller for one workflow instance
pub struct WorkflowController {
    uploader: UploadClient,
    analyzer: AnalysisClient,
    prompt_template: String,
    state_tx: watch::Sender<WorkflowSnapshot>,
    shutdown: CancellationToken,
}

impl WorkflowController {
    /// Create a controller in the `Idle` state
    pub fn new(
        uploader: UploadClient,
        analyzer: AnalysisClient,
        prompt_template: impl Into<String>,
    ) -> Self {
        let (state_tx, _) = watch::channel(WorkflowSnapshot::new());

        let controller = Self {
            uploader,
            analyzer,
            prompt_template: prompt_template.into(),
            state_tx,
            shutdown: CancellationToken::new(),
        };

        debug!(instance = %controller.instance_id(), "Workflow instance created");
        controller
    }

    /// Build both clients from resolved settings, sharing one HTTP client
    pub fn from_settings(settings: &ClientSettings) -> tabsight_common::Result<Self> {
        let http_client = settings.http_client()?;
        Ok(Self::new(
            UploadClient::from_settings(http_client.clone(), settings),
            AnalysisClient::from_settings(http_client, settings),
            settings.prompt_template.clone(),
        ))
    }

    /// Receive every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<WorkflowSnapshot> {
        self.state_tx.subscribe()
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.state_tx.borrow().clone()
    }

    pub fn state(&self) -> WorkflowState {
        self.state_tx.borrow().state.clone()
    }

    pub fn instance_id(&self) -> Uuid {
        self.state_tx.borrow().instance_id
    }

    pub fn is_torn_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Store a new file selection, replacing any previous one.
    ///
    /// Starts a new attempt. An empty selection is rejected without touching
    /// state.
    pub fn select_files(&self, files: FileSelection) -> WorkflowResult<()> {
        let (_, ()) = self.begin("select files", |state| {
            if state.is_busy() {
                return Err(WorkflowError::Busy(state.phase()));
            }
            if files.is_empty() {
                return Err(UploadError::EmptySelection.into());
            }
            Ok((WorkflowState::FilesSelected { files }, Attempt::New, ()))
        })?;
        Ok(())
    }

    /// Upload the selected files
    ///
    /// FilesSelected → Uploading → Uploaded | UploadFailed
    pub async fn confirm_upload(&self) -> WorkflowResult<DirectoryId> {
        let (attempt, files) = self.begin("upload", |state| match state {
            WorkflowState::FilesSelected { files } => Ok((
                WorkflowState::Uploading {
                    files: files.clone(),
                },
                Attempt::Same,
                files.clone(),
            )),
            other => Err(reject(other, "upload")),
        })?;

        let outcome = self
            .until_abandoned(attempt, self.uploader.submit(&files))
            .await?;

        match outcome {
            Ok(directory) => {
                self.resolve(
                    attempt,
                    WorkflowState::Uploaded {
                        directory: directory.clone(),
                    },
                )?;
                Ok(directory)
            }
            Err(error) => {
                warn!(error = %error, "Upload failed");
                self.resolve(
                    attempt,
                    WorkflowState::UploadFailed {
                        files,
                        error: error.clone(),
                    },
                )?;
                Err(error.into())
            }
        }
    }

    /// Analyse the uploaded directory
    ///
    /// Uploaded → Analyzing → Complete | AnalysisFailed. From `Complete` or
    /// `AnalysisFailed` the same directory is analysed again as a new attempt.
    pub async fn start_analysis(&self) -> WorkflowResult<ValidatedAnalysis> {
        let (attempt, directory) = self.begin("start analysis", |state| match state {
            WorkflowState::Uploaded { directory } => Ok((
                WorkflowState::Analyzing {
                    directory: directory.clone(),
                },
                Attempt::Same,
                directory.clone(),
            )),
            WorkflowState::Complete { directory, .. }
            | WorkflowState::AnalysisFailed { directory, .. } => Ok((
                WorkflowState::Analyzing {
                    directory: directory.clone(),
                },
                Attempt::New,
                directory.clone(),
            )),
            other => Err(reject(other, "start analysis")),
        })?;

        self.analyze(attempt, directory).await
    }

    /// Direct entry: analyse a directory uploaded earlier, with no local
    /// file selection.
    pub async fn enter_analysis(&self, directory: DirectoryId) -> WorkflowResult<ValidatedAnalysis> {
        let (attempt, directory) = self.begin("enter analysis", |state| {
            if state.is_busy() {
                return Err(WorkflowError::Busy(state.phase()));
            }
            Ok((
                WorkflowState::Analyzing {
                    directory: directory.clone(),
                },
                Attempt::New,
                directory,
            ))
        })?;

        self.analyze(attempt, directory).await
    }

    /// Select, upload and analyse in one go
    pub async fn run(&self, files: FileSelection) -> WorkflowResult<ValidatedAnalysis> {
        self.select_files(files)?;
        self.confirm_upload().await?;
        self.start_analysis().await
    }

    /// Abandon any in-flight operation and return to `Idle`
    pub fn reset(&self) -> WorkflowResult<()> {
        let (_, ()) = self.begin("reset", |_| Ok((WorkflowState::Idle, Attempt::New, ())))?;
        Ok(())
    }

    /// Discard the workflow. In-flight requests are abandoned and their
    /// resolutions ignored; every later action fails with `TornDown`.
    pub fn teardown(&self) {
        // Cancel under the state lock so no transition is published after it
        let shutdown = &self.shutdown;
        let mut instance = None;
        self.state_tx.send_if_modified(|snapshot| {
            if !shutdown.is_cancelled() {
                shutdown.cancel();
                instance = Some(snapshot.instance_id);
            }
            false
        });

        if let Some(instance) = instance {
            info!(instance = %instance, "Workflow torn down");
        }
    }

    async fn analyze(
        &self,
        attempt: u64,
        directory: DirectoryId,
    ) -> WorkflowResult<ValidatedAnalysis> {
        let prompt = AnalysisPrompt::from_template(&self.prompt_template, &directory);

        let outcome = self
            .until_abandoned(attempt, self.analyzer.run(&prompt))
            .await?;

        let validated = outcome.map_err(AnalysisFailure::from).and_then(|raw| {
            schema_validator::validate(&raw).map_err(|error| {
                warn!(
                    directory = %directory,
                    error = %error,
                    body = %raw,
                    "Analysis response failed validation"
                );
                AnalysisFailure::from(error)
            })
        });

        match validated {
            Ok(analysis) => {
                info!(
                    directory = %directory,
                    shape = analysis.shape_name(),
                    best_model = analysis.best_model().unwrap_or("-"),
                    "Analysis complete"
                );
                self.resolve(
                    attempt,
                    WorkflowState::Complete {
                        directory,
                        analysis: analysis.clone(),
                    },
                )?;
                Ok(analysis)
            }
            Err(error) => {
                self.resolve(
                    attempt,
                    WorkflowState::AnalysisFailed {
                        directory,
                        error: error.clone(),
                    },
                )?;
                Err(error.into())
            }
        }
    }

    /// Apply a user-triggered transition atomically against the current state
    fn begin<T>(
        &self,
        action: &'static str,
        plan: impl FnOnce(&WorkflowState) -> WorkflowResult<(WorkflowState, Attempt, T)>,
    ) -> WorkflowResult<(u64, T)> {
        let shutdown = &self.shutdown;
        let mut outcome = Err(WorkflowError::TornDown);
        self.state_tx.send_if_modified(|snapshot| {
            if shutdown.is_cancelled() {
                return false;
            }
            match plan(&snapshot.state) {
                Ok((next, scope, value)) => {
                    if scope == Attempt::New {
                        snapshot.attempt += 1;
                    }
                    log_transition(&snapshot.transition_to(next), action);
                    outcome = Ok((snapshot.attempt, value));
                    true
                }
                Err(error) => {
                    debug!(action = action, error = %error, "Action rejected");
                    outcome = Err(error);
                    false
                }
            }
        });
        outcome
    }

    /// Apply a network resolution, unless its attempt is stale
    fn resolve(&self, attempt: u64, next: WorkflowState) -> WorkflowResult<()> {
        let shutdown = &self.shutdown;
        let applied = self.state_tx.send_if_modified(|snapshot| {
            if shutdown.is_cancelled() || snapshot.attempt != attempt {
                debug!(
                    attempt = attempt,
                    current_attempt = snapshot.attempt,
                    "Discarding stale resolution"
                );
                return false;
            }
            log_transition(&snapshot.transition_to(next), "resolve");
            true
        });

        if applied {
            Ok(())
        } else {
            Err(WorkflowError::Cancelled)
        }
    }

    /// Drive `operation` until it resolves, the attempt is superseded, or the
    /// controller is torn down. Abandoned operations are dropped mid-flight.
    async fn until_abandoned<F: Future>(&self, attempt: u64, operation: F) -> WorkflowResult<F::Output> {
        let mut state_rx = self.state_tx.subscribe();

        tokio::select! {
            _ = self.shutdown.cancelled() => {
                debug!(attempt = attempt, "In-flight request abandoned (teardown)");
                Err(WorkflowError::Cancelled)
            }
            _ = state_rx.wait_for(|snapshot| snapshot.attempt != attempt) => {
                debug!(attempt = attempt, "In-flight request abandoned (superseded)");
                Err(WorkflowError::Cancelled)
            }
            output = operation => Ok(output),
        }
    }
}

impl Drop for WorkflowController {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn reject(state: &WorkflowState, action: &'static str) -> WorkflowError {
    if state.is_busy() {
        WorkflowError::Busy(state.phase())
    } else {
        WorkflowError::InvalidTransition {
            phase: state.phase(),
            action,
        }
    }
}

fn log_transition(transition: &StateTransition, action: &'static str) {
    info!(
        instance = %transition.instance_id,
        attempt = transition.attempt,
        from = %transition.from,
        to = %transition.to,
        action = action,
        "Workflow state transition"
    );
}

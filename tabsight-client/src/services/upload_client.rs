//! Upload endpoint client
//!
//! Sends the whole file selection as one multipart request and returns the
//! directory id the server stored it under. One call per submission, no
//! automatic retry.

use crate::config::ClientSettings;
use crate::error::UploadError;
use crate::models::{DirectoryId, FileSelection, UploadPolicy};
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde_json::Value;

/// Multipart field name carrying each file
pub const UPLOAD_FIELD: &str = "files";

/// Upload endpoint client. Stateless apart from its configuration.
#[derive(Debug, Clone)]
pub struct UploadClient {
    http_client: reqwest::Client,
    endpoint: Url,
    policy: UploadPolicy,
}

impl UploadClient {
    pub fn new(http_client: reqwest::Client, endpoint: Url, policy: UploadPolicy) -> Self {
        Self {
            http_client,
            endpoint,
            policy,
        }
    }

    pub fn from_settings(http_client: reqwest::Client, settings: &ClientSettings) -> Self {
        Self::new(http_client, settings.upload_url.clone(), settings.upload_policy)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Submit `files` and return the server-side directory id
    ///
    /// Preconditions are checked before any I/O; an empty selection never
    /// reaches the network.
    pub async fn submit(&self, files: &FileSelection) -> Result<DirectoryId, UploadError> {
        files.check(&self.policy)?;

        let form = encode(files).await?;

        tracing::debug!(
            url = %self.endpoint,
            files = files.len(),
            bytes = files.total_bytes(),
            "Submitting upload"
        );

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::NetworkUnavailable(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                body = %error_text,
                "Upload rejected by server"
            );
            return Err(UploadError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| UploadError::Protocol(format!("response body unreadable: {}", e)))?;

        let directory = parse_directory(&body)?;

        tracing::info!(
            directory = %directory,
            files = files.len(),
            "Upload accepted"
        );

        Ok(directory)
    }
}

async fn encode(files: &FileSelection) -> Result<Form, UploadError> {
    let mut form = Form::new();

    for file in files.files() {
        let contents = file.read_contents().await?;
        let part = Part::bytes(contents)
            .file_name(file.name().to_string())
            .mime_str(file.content_type())
            .map_err(|e| UploadError::FileRead {
                name: file.name().to_string(),
                reason: e.to_string(),
            })?;
        form = form.part(UPLOAD_FIELD, part);
    }

    Ok(form)
}

/// Extract the directory id from a success body
fn parse_directory(body: &[u8]) -> Result<DirectoryId, UploadError> {
    let json: Value = serde_json::from_slice(body)
        .map_err(|e| UploadError::Protocol(format!("response is not JSON: {}", e)))?;

    match json.get("directory") {
        None | Some(Value::Null) => Err(UploadError::Protocol(
            "response has no directory field".to_string(),
        )),
        Some(Value::String(directory)) => DirectoryId::new(directory.as_str())
            .ok_or_else(|| UploadError::Protocol("directory field is empty".to_string())),
        Some(_) => Err(UploadError::Protocol(
            "directory field is not a string".to_string(),
        )),
    }
}

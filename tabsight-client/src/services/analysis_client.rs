//! Analysis endpoint client
//!
//! POSTs `{ "prompt": ... }` and hands back the raw JSON body. Validation is
//! the caller's job, so this client does not depend on any result shape.

use crate::config::ClientSettings;
use crate::error::AnalysisError;
use crate::models::AnalysisPrompt;
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
struct AnalysisRequest<'a> {
    prompt: &'a str,
}

/// Analysis endpoint client. Stateless apart from its configuration.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http_client: reqwest::Client,
    endpoint: Url,
}

impl AnalysisClient {
    pub fn new(http_client: reqwest::Client, endpoint: Url) -> Self {
        Self {
            http_client,
            endpoint,
        }
    }

    pub fn from_settings(http_client: reqwest::Client, settings: &ClientSettings) -> Self {
        Self::new(http_client, settings.analysis_url.clone())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Run the analysis and return the unvalidated response body
    pub async fn run(&self, prompt: &AnalysisPrompt) -> Result<Value, AnalysisError> {
        tracing::debug!(url = %self.endpoint, prompt = %prompt, "Requesting analysis");

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(&AnalysisRequest {
                prompt: prompt.as_str(),
            })
            .send()
            .await
            .map_err(|e| AnalysisError::NetworkUnavailable(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                body = %error_text,
                "Analysis rejected by server"
            );
            return Err(AnalysisError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AnalysisError::Protocol(format!("response body unreadable: {}", e)))?;

        let raw: Value = serde_json::from_slice(&body)
            .map_err(|e| AnalysisError::Protocol(format!("response is not JSON: {}", e)))?;

        tracing::info!(bytes = body.len(), "Analysis response received");

        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(AnalysisRequest { prompt: "train" }).unwrap();
        assert_eq!(body, serde_json::json!({"prompt": "train"}));
    }
}

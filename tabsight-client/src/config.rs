//! Resolved client settings
//!
//! Combines the bootstrap TOML with command-line and environment overrides
//! (see [`tabsight_common::config`] for the priority order).

use crate::models::UploadPolicy;
use reqwest::Url;
use std::time::Duration;
use tabsight_common::config::{resolve_service_url, TomlConfig};
use tabsight_common::{Error, Result};
use tracing::info;

pub const USER_AGENT: &str = concat!("tabsight/", env!("CARGO_PKG_VERSION"));

/// Everything the clients and controller need to talk to the remote service
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub upload_url: Url,
    pub analysis_url: Url,
    pub prompt_template: String,
    pub connect_timeout: Duration,
    /// Transport timeout; `None` waits for the transport to fail
    pub request_timeout: Option<Duration>,
    pub upload_policy: UploadPolicy,
}

impl ClientSettings {
    /// Resolve settings from TOML plus an optional command-line service address
    pub fn resolve(toml_config: &TomlConfig, cli_service_url: Option<&str>) -> Result<Self> {
        let base = resolve_service_url(cli_service_url, toml_config)?;
        let settings = Self::with_base(base, toml_config);

        info!(
            upload_url = %settings.upload_url,
            analysis_url = %settings.analysis_url,
            "Client settings resolved"
        );
        Ok(settings)
    }

    /// Settings for an explicit base address, other values from `toml_config`
    pub fn with_base(base: Url, toml_config: &TomlConfig) -> Self {
        Self {
            upload_url: endpoint(&base, &toml_config.upload_path),
            analysis_url: endpoint(&base, &toml_config.analysis_path),
            prompt_template: toml_config.prompt_template.clone(),
            connect_timeout: Duration::from_secs(toml_config.connect_timeout_secs),
            request_timeout: toml_config.request_timeout_secs.map(Duration::from_secs),
            upload_policy: UploadPolicy::from(&toml_config.upload),
        }
    }

    /// HTTP client shared by both network stages
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(self.connect_timeout);

        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }

        builder
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))
    }
}

/// Join an endpoint path onto the base address, keeping any base path prefix
fn endpoint(base: &Url, path: &str) -> Url {
    let mut joined = base.clone();
    let prefix = base.path().trim_end_matches('/');
    joined.set_path(&format!("{}{}", prefix, path));
    joined.set_query(None);
    joined
}

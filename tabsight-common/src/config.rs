//! Configuration loading and service address resolution
//!
//! Bootstrap configuration comes from a single TOML file. Every field has a
//! built-in default, so a missing file is never fatal.
//!
//! # Service address priority
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`TABSIGHT_SERVICE_URL`)
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "TABSIGHT_CONFIG";

/// Environment variable overriding the remote service base address
pub const SERVICE_URL_ENV: &str = "TABSIGHT_SERVICE_URL";

/// Placeholder substituted with the directory id when building a prompt
pub const DIRECTORY_PLACEHOLDER: &str = "{directory}";

const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";
const DEFAULT_MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Base address of the remote analysis service
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// Path of the upload endpoint, relative to `service_url`
    #[serde(default = "default_upload_path")]
    pub upload_path: String,

    /// Path of the analysis endpoint, relative to `service_url`
    #[serde(default = "default_analysis_path")]
    pub analysis_path: String,

    /// Prompt sent to the analysis endpoint; `{directory}` is substituted
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,

    /// Transport-level request timeout. Unset means wait for the transport.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Connection establishment timeout
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Advisory client-side upload checks
    #[serde(default)]
    pub upload: UploadConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Advisory upload checks
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct UploadConfig {
    /// Reject files whose extension is not csv/xlsx/xls before submitting
    #[serde(default)]
    pub enforce_file_types: bool,

    /// Reject files larger than this many bytes before submitting (0 disables)
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_upload_path() -> String {
    "/upload".to_string()
}

fn default_analysis_path() -> String {
    "/model".to_string()
}

fn default_prompt_template() -> String {
    "Train and evaluate models on the dataset uploaded to directory {directory} \
     using AUC as the evaluation metric"
        .to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_file_bytes() -> Option<u64> {
    Some(DEFAULT_MAX_FILE_BYTES)
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            upload_path: default_upload_path(),
            analysis_path: default_analysis_path(),
            prompt_template: default_prompt_template(),
            request_timeout_secs: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            upload: UploadConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            enforce_file_types: false,
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`.
    ///
    /// A missing file yields the built-in defaults. A file that exists but
    /// cannot be read or parsed is an error.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_source(path).map(|(config, _)| config)
    }

    /// Locate and load the configuration file (see [`config_file_path`]).
    ///
    /// Nothing is logged here: discovery runs before the subscriber is
    /// installed, so the caller reports the returned [`ConfigSource`].
    pub fn discover(cli_path: Option<&Path>) -> Result<(Self, ConfigSource)> {
        match config_file_path(cli_path) {
            Some(path) => Self::load_with_source(&path),
            None => Ok((Self::default(), ConfigSource::NoConfigDir)),
        }
    }

    fn load_with_source(path: &Path) -> Result<(Self, ConfigSource)> {
        if !path.exists() {
            return Ok((Self::default(), ConfigSource::Missing(path.to_path_buf())));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)?;
        Ok((config, ConfigSource::File(path.to_path_buf())))
    }

    fn validate(&self) -> Result<()> {
        if !self.prompt_template.contains(DIRECTORY_PLACEHOLDER) {
            return Err(Error::Config(format!(
                "prompt_template must contain the {} placeholder",
                DIRECTORY_PLACEHOLDER
            )));
        }
        if !self.upload_path.starts_with('/') || !self.analysis_path.starts_with('/') {
            return Err(Error::Config(
                "upload_path and analysis_path must start with '/'".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where [`TomlConfig::discover`] found its values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// No file at this path; built-in defaults
    Missing(PathBuf),
    /// Platform config directory unknown; built-in defaults
    NoConfigDir,
}

impl ConfigSource {
    pub fn uses_defaults(&self) -> bool {
        !matches!(self, ConfigSource::File(_))
    }

    /// Report the outcome of discovery at `info`/`warn`
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Configuration loaded from {}", path.display()),
            ConfigSource::Missing(path) => warn!(
                "Config file not found at {}, using built-in defaults",
                path.display()
            ),
            ConfigSource::NoConfigDir => {
                warn!("Could not determine config directory, using built-in defaults")
            }
        }
    }
}

/// Config file location, in priority order:
/// 1. Explicit path (command line)
/// 2. `TABSIGHT_CONFIG` environment variable
/// 3. `<platform config dir>/tabsight/config.toml`
pub fn config_file_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir().map(|d| d.join("tabsight").join("config.toml"))
}

/// Resolve the remote service base address
///
/// **Priority:** CLI → ENV → TOML → compiled default. The TOML value already
/// falls back to the compiled default when absent.
pub fn resolve_service_url(cli_arg: Option<&str>, toml_config: &TomlConfig) -> Result<Url> {
    let (raw, source) = if let Some(url) = cli_arg.filter(|u| !u.trim().is_empty()) {
        (url.to_string(), "command line")
    } else if let Some(url) = std::env::var(SERVICE_URL_ENV)
        .ok()
        .filter(|u| !u.trim().is_empty())
    {
        (url, "environment")
    } else {
        (toml_config.service_url.clone(), "TOML config")
    };

    let url = parse_service_url(&raw)?;
    debug!(service_url = %url, source = source, "Resolved service address");
    Ok(url)
}

/// Parse and check a service base address (http/https only)
pub fn parse_service_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| Error::Config(format!("Invalid service URL '{}': {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::Config(format!(
            "Unsupported service URL scheme '{}' (expected http or https)",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.service_url, "http://localhost:8000");
        assert_eq!(config.upload_path, "/upload");
        assert_eq!(config.analysis_path, "/model");
        assert!(config.prompt_template.contains(DIRECTORY_PLACEHOLDER));
        assert_eq!(config.request_timeout_secs, None);
        assert!(!config.upload.enforce_file_types);
        assert_eq!(config.upload.max_file_bytes, Some(100 * 1024 * 1024));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            service_url = "http://analysis.internal:9000"

            [upload]
            enforce_file_types = true
            "#,
        )
        .unwrap();

        assert_eq!(config.service_url, "http://analysis.internal:9000");
        assert_eq!(config.upload_path, "/upload");
        assert!(config.upload.enforce_file_types);
        assert_eq!(config.upload.max_file_bytes, Some(100 * 1024 * 1024));
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        let err = TomlConfig::from_toml_str(r#"prompt_template = "analyze it""#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_relative_endpoint_path_rejected() {
        let err = TomlConfig::from_toml_str(r#"upload_path = "upload""#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_parse_service_url() {
        assert!(parse_service_url("http://localhost:8000").is_ok());
        assert!(parse_service_url("https://example.org/api/").is_ok());
        assert!(parse_service_url("ftp://example.org").is_err());
        assert!(parse_service_url("not a url").is_err());
    }
}

//! Client configuration

use crate::error::{Result, StorageError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Base address of a locally running daemon's API
pub const DEFAULT_URL: &str = "http://localhost:5001/api/v0/";

/// Configuration of a [`crate::client::StorageClient`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClientConfig {
    /// Base address requests are resolved against (default: local daemon)
    pub url: String,

    /// Default request timeout in milliseconds (default: none)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Headers sent with every request
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            timeout_ms: None,
            headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base address
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the default timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Add a header sent with every request
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Parse and check the base address
    ///
    /// Relative resources only resolve below the base when its path ends
    /// with `/`, so a missing trailing slash is rejected.
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(StorageError::config_error(format!(
                "Unsupported scheme \"{}\" in {}",
                url.scheme(),
                self.url
            )));
        }
        if !url.path().ends_with('/') {
            return Err(StorageError::config_error(format!(
                "Base URL {} must end with '/'",
                self.url
            )));
        }
        Ok(url)
    }

    pub fn validate(&self) -> Result<()> {
        self.base_url()?;

        if self.timeout_ms == Some(0) {
            return Err(StorageError::invalid_parameter(
                "timeout_ms",
                "Timeout must be greater than 0",
            ));
        }

        if let Some(name) = self.headers.keys().find(|name| name.trim().is_empty()) {
            return Err(StorageError::invalid_parameter(
                "headers",
                format!("Header name {:?} is blank", name),
            ));
        }

        Ok(())
    }

    /// Convert the configuration to a JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(StorageError::from)
    }

    /// Create a configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(StorageError::from)
    }
}

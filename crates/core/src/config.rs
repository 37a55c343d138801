use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use reqwest::{Method as HttpMethod, Url};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TeaserError},
    request::DEFAULT_MAX_UPLOAD_BYTES,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// HTTP verb for the profile endpoint. Deployments have exposed it under both.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileMethod {
    #[default]
    Get,
    Post,
}

impl ProfileMethod {
    pub fn as_http(&self) -> HttpMethod {
        match self {
            ProfileMethod::Get => HttpMethod::GET,
            ProfileMethod::Post => HttpMethod::POST,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_upload_bytes: u64,
    pub profile_method: ProfileMethod,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            profile_method: ProfileMethod::default(),
        }
    }
}

pub fn get_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("teaser")
        .join("config.toml")
}

impl ClientConfig {
    /// Read `path`; a missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(TeaserError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_toml(&raw, path)
    }

    pub fn from_toml(raw: &str, origin: &Path) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| TeaserError::Config {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.base_url()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parsed base URL, always ending in `/` so endpoint joins keep any path prefix.
    pub fn base_url(&self) -> Result<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let invalid = |reason: String| TeaserError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };
        let url = Url::parse(&raw).map_err(|e| invalid(e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(invalid("not a hierarchical URL".to_string()));
        }
        Ok(url)
    }
}

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use reqwest::header::{HeaderMap, SET_COOKIE};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{Result, TeaserError};

/// Opaque credential the service hands out on login. Sent back verbatim as a `Cookie` header.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    cookie: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("cookie", &"<redacted>").finish()
    }
}

impl Session {
    pub fn new(cookie: impl Into<String>) -> Self {
        Self {
            cookie: cookie.into(),
        }
    }

    /// Collect the `name=value` pairs of every `Set-Cookie` header, dropping attributes.
    pub fn from_set_cookie(headers: &HeaderMap) -> Option<Self> {
        let pairs: Vec<&str> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .map(str::trim)
            .filter(|pair| pair.contains('='))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(Self::new(pairs.join("; ")))
        }
    }

    pub fn cookie_header(&self) -> &str {
        &self.cookie
    }
}

pub fn get_root_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("teaser")
}

/// Default location of the saved session
pub fn get_session_path() -> PathBuf {
    get_root_data_dir().join("session.json")
}

/// Keeps the login session between CLI runs.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Option<Session>> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw).map_err(|e| {
                TeaserError::Config {
                    path: self.path.clone(),
                    reason: e.to_string(),
                }
            })?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(self.io_error(source)),
        }
    }

    pub async fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json)
            .await
            .map_err(|e| self.io_error(e))
    }

    /// Returns whether a session was actually removed.
    pub async fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> TeaserError {
        TeaserError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(get_session_path())
    }
}

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong between building a request and reading its answer.
#[derive(Error, Debug)]
pub enum TeaserError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Request rejected ({status}): {detail}")]
    RequestRejected { status: u16, detail: String },

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config error in {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("Invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Problems found in the caller's input before anything touches the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("a YouTube URL is required for a YouTube source")]
    MissingYoutubeUrl,

    #[error("a video file is required for an upload source")]
    MissingVideoFile,

    #[error("provide either a YouTube URL or a video file, not both")]
    ConflictingSources,

    #[error("invalid YouTube URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("video file {file_name} is {size} bytes, limit is {limit}")]
    FileTooLarge {
        file_name: String,
        size: u64,
        limit: u64,
    },

    #[error("max_length must be within {min}..={max} seconds, got {value}")]
    MaxLengthOutOfRange { value: u32, min: u32, max: u32 },

    #[error("min_length must be within {min}..={max} seconds, got {value}")]
    MinLengthOutOfRange { value: u32, min: u32, max: u32 },

    #[error("min_length ({min_length}) exceeds max_length ({max_length})")]
    MinExceedsMax { min_length: u32, max_length: u32 },

    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("invalid email address {0:?}")]
    InvalidEmail(String),
}

/// The call could not complete, or its answer could not be understood.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("login succeeded but no session cookie was set")]
    MissingSessionCookie,
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err)
        } else {
            TransportError::Http(err)
        }
    }
}

impl From<reqwest::Error> for TeaserError {
    fn from(err: reqwest::Error) -> Self {
        TeaserError::Transport(err.into())
    }
}

impl From<serde_json::Error> for TeaserError {
    fn from(err: serde_json::Error) -> Self {
        TeaserError::Transport(err.into())
    }
}

impl TeaserError {
    pub fn is_validation(&self) -> bool {
        matches!(self, TeaserError::Validation(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, TeaserError::Transport(_))
    }

    /// The server's `detail` message, if the service refused the request.
    pub fn rejection_detail(&self) -> Option<&str> {
        match self {
            TeaserError::RequestRejected { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TeaserError>;

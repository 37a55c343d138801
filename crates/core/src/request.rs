use std::{ops::RangeInclusive, path::Path};

use reqwest::{
    Url,
    multipart::{Form, Part},
};
use tokio::fs;

use crate::{
    error::{Result, TeaserError, ValidationError},
    method::Method,
};

pub const MAX_LENGTH_RANGE: RangeInclusive<u32> = 10..=300;
pub const MIN_LENGTH_RANGE: RangeInclusive<u32> = 5..=120;
pub const DEFAULT_MAX_LENGTH: u32 = 70;
pub const DEFAULT_MIN_LENGTH: u32 = 60;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// Which of the two payload fields the request is meant to carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Youtube,
    Upload,
}

/// An uploaded video held in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl VideoFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a video from disk, refusing anything above `limit` bytes before reading it.
    pub async fn from_path(path: &Path, limit: u64) -> Result<Self> {
        let io_err = |source: std::io::Error| TeaserError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());

        let size = fs::metadata(path).await.map_err(io_err)?.len();
        if size > limit {
            return Err(ValidationError::FileTooLarge {
                file_name,
                size,
                limit,
            }
            .into());
        }

        let bytes = fs::read(path).await.map_err(io_err)?;
        Ok(Self {
            content_type: content_type_for(path).to_string(),
            file_name,
            bytes,
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Guess a video MIME type from the file extension
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

/// What the user filled in. Nothing here is trusted until [`GenerationRequest::validate`].
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    pub source: SourceKind,
    pub youtube_url: Option<String>,
    pub video_file: Option<VideoFile>,
    pub method: Method,
    pub max_length: u32,
    pub min_length: u32,
}

impl GenerationRequest {
    pub fn youtube(url: impl Into<String>, method: Method) -> Self {
        Self {
            source: SourceKind::Youtube,
            youtube_url: Some(url.into()),
            video_file: None,
            method,
            max_length: DEFAULT_MAX_LENGTH,
            min_length: DEFAULT_MIN_LENGTH,
        }
    }

    pub fn upload(file: VideoFile, method: Method) -> Self {
        Self {
            source: SourceKind::Upload,
            youtube_url: None,
            video_file: Some(file),
            method,
            max_length: DEFAULT_MAX_LENGTH,
            min_length: DEFAULT_MIN_LENGTH,
        }
    }

    pub fn with_lengths(mut self, min_length: u32, max_length: u32) -> Self {
        self.min_length = min_length;
        self.max_length = max_length;
        self
    }

    /// Check every input constraint and pin down the payload.
    pub fn validate(
        self,
        max_upload_bytes: u64,
    ) -> std::result::Result<ValidRequest, ValidationError> {
        if !MAX_LENGTH_RANGE.contains(&self.max_length) {
            return Err(ValidationError::MaxLengthOutOfRange {
                value: self.max_length,
                min: *MAX_LENGTH_RANGE.start(),
                max: *MAX_LENGTH_RANGE.end(),
            });
        }
        if !MIN_LENGTH_RANGE.contains(&self.min_length) {
            return Err(ValidationError::MinLengthOutOfRange {
                value: self.min_length,
                min: *MIN_LENGTH_RANGE.start(),
                max: *MIN_LENGTH_RANGE.end(),
            });
        }
        if self.min_length > self.max_length {
            return Err(ValidationError::MinExceedsMax {
                min_length: self.min_length,
                max_length: self.max_length,
            });
        }

        let youtube_url = self.youtube_url.filter(|u| !u.trim().is_empty());
        let payload = match (self.source, youtube_url, self.video_file) {
            (_, Some(_), Some(_)) => return Err(ValidationError::ConflictingSources),
            (SourceKind::Youtube, Some(url), None) => Payload::Youtube(parse_video_url(&url)?),
            (SourceKind::Youtube, None, _) => return Err(ValidationError::MissingYoutubeUrl),
            (SourceKind::Upload, None, Some(file)) => {
                let size = file.size();
                if size > max_upload_bytes {
                    return Err(ValidationError::FileTooLarge {
                        file_name: file.file_name,
                        size,
                        limit: max_upload_bytes,
                    });
                }
                Payload::Upload(file)
            }
            (SourceKind::Upload, _, None) => return Err(ValidationError::MissingVideoFile),
        };

        Ok(ValidRequest {
            payload,
            method: self.method,
            max_length: self.max_length,
            min_length: self.min_length,
        })
    }
}

fn parse_video_url(raw: &str) -> std::result::Result<Url, ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        "http" | "https" => Err(invalid("missing host".to_string())),
        other => Err(invalid(format!("unsupported scheme {other}"))),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Youtube(Url),
    Upload(VideoFile),
}

/// A request that passed validation. Exactly one payload, by construction.
#[derive(Clone, Debug)]
pub struct ValidRequest {
    pub payload: Payload,
    pub method: Method,
    pub max_length: u32,
    pub min_length: u32,
}

impl ValidRequest {
    /// Multipart body for `/generate-teaser`.
    pub fn into_form(self) -> Result<Form> {
        let form = Form::new()
            .text("method", self.method.as_str())
            .text("max_length", self.max_length.to_string())
            .text("min_length", self.min_length.to_string());

        let form = match self.payload {
            Payload::Youtube(url) => form.text("youtube_url", url.to_string()),
            Payload::Upload(file) => {
                let part = Part::bytes(file.bytes)
                    .file_name(file.file_name)
                    .mime_str(&file.content_type)?;
                form.part("video_file", part)
            }
        };
        Ok(form)
    }

    pub fn describe_source(&self) -> String {
        match &self.payload {
            Payload::Youtube(url) => url.to_string(),
            Payload::Upload(file) => file.file_name.clone(),
        }
    }
}

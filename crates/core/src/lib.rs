//! Teaser Core Library
//!
//! Typed client for the teaser generation service: request validation,
//! multipart submission, response normalization and the error taxonomy,
//! plus the account, history, session and config plumbing around it.

pub mod account;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod history;
pub mod method;
pub mod request;
pub mod session;
pub mod types;

// Re-export commonly used items at crate root
pub use account::{LoginRequest, SignupRequest};
pub use client::{LoginOutcome, TeaserClient};
pub use config::{ClientConfig, ProfileMethod, get_config_path};
pub use error::{Result, TeaserError, TransportError, ValidationError};
pub use format::{format_history_readable, format_result_readable, format_timestamp};
pub use history::{HistoryEntry, sort_most_recent_first};
pub use method::Method;
pub use request::{GenerationRequest, Payload, SourceKind, ValidRequest, VideoFile};
pub use session::{Session, SessionStore, get_session_path};
pub use types::{GenerationResult, Interval};

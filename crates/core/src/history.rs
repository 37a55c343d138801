use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    method::method_display_name,
    types::{Interval, null_as_empty},
};

/// One past generation, as listed by the profile endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub method: String,
    #[serde(deserialize_with = "deserialize_created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub youtube_url: Option<String>,
    #[serde(default)]
    pub main_file_url: Option<String>,
    #[serde(default)]
    pub teaser_file_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub timestamps_used: Vec<Interval>,
}

impl HistoryEntry {
    /// Where the source video came from, YouTube first.
    pub fn source(&self) -> Option<&str> {
        self.youtube_url
            .as_deref()
            .or(self.main_file_url.as_deref())
            .filter(|s| !s.is_empty())
    }

    pub fn method_name(&self) -> &str {
        method_display_name(&self.method)
    }
}

/// Accepts RFC 3339 and the zone-less ISO form the service writes (read as UTC).
pub fn parse_created_at(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
}

fn deserialize_created_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_created_at(&raw).map_err(|e| serde::de::Error::custom(format!("{raw:?}: {e}")))
}

/// Newest first. Stable, so entries with equal timestamps keep their input order.
pub fn sort_most_recent_first(entries: &mut [HistoryEntry]) {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

use serde::{Deserialize, Deserializer, Serialize};

/// One selected excerpt of the source video, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IntervalRepr")]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

/// The service has emitted both `[start, end]` pairs and `{start, end}` objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum IntervalRepr {
    Pair([f64; 2]),
    Object { start: f64, end: f64 },
}

#[derive(Debug, thiserror::Error)]
pub enum IntervalError {
    #[error("interval bounds must be finite and non-negative, got [{start}, {end}]")]
    InvalidBound { start: f64, end: f64 },
    #[error("interval ends before it starts: [{start}, {end}]")]
    Reversed { start: f64, end: f64 },
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Result<Self, IntervalError> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(start) || !valid(end) {
            return Err(IntervalError::InvalidBound { start, end });
        }
        if end < start {
            return Err(IntervalError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

impl TryFrom<IntervalRepr> for Interval {
    type Error = IntervalError;

    fn try_from(repr: IntervalRepr) -> Result<Self, Self::Error> {
        match repr {
            IntervalRepr::Pair([start, end]) | IntervalRepr::Object { start, end } => {
                Interval::new(start, end)
            }
        }
    }
}

/// Treats an explicit `null` the same as a missing list.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of a successful `/generate-teaser` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub s3_url: String,
    pub duration: f64,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub video_s3_url: Option<String>,
    #[serde(default)]
    pub audio_s3_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub timestamps: Vec<Interval>,
}

impl GenerationResult {
    /// Sum of all excerpt lengths.
    pub fn excerpt_total(&self) -> f64 {
        self.timestamps.iter().map(Interval::length).sum()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Processing strategy the service uses to pick excerpts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    #[default]
    LearningA,
    LearningB,
    CinematicA,
    Gemini,
}

impl Method {
    pub const ALL: [Method; 4] = [
        Method::LearningA,
        Method::LearningB,
        Method::CinematicA,
        Method::Gemini,
    ];

    /// Value sent in the `method` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::LearningA => "learning_a",
            Method::LearningB => "learning_b",
            Method::CinematicA => "cinematic_a",
            Method::Gemini => "gemini",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Method::LearningA => "Learning Method A",
            Method::LearningB => "Learning Method B",
            Method::CinematicA => "Cinematic Method A",
            Method::Gemini => "Gemini Method",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown method {0:?}")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

/// Human label for a method as stored in history; unknown values pass through.
pub fn method_display_name(raw: &str) -> &str {
    raw.parse::<Method>()
        .map(|m| m.display_name())
        .unwrap_or(raw)
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The (api key, model name, endpoint) triple needed to route a chat-completion request.
///
/// Field names on the wire match the stored JSON layout (`apiKey`, `modelName`, `apiEndpoint`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub api_endpoint: String,
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        model_name: impl Into<String>,
        api_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            model_name: model_name.into(),
            api_endpoint: api_endpoint.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &mask_key(&self.api_key))
            .field("model_name", &self.model_name)
            .field("api_endpoint", &self.api_endpoint)
            .finish()
    }
}

/// Keeps the first four characters of a key and hides the rest.
pub fn mask_key(key: &str) -> String {
    if key.chars().count() <= 4 {
        return "****".to_string();
    }
    let head: String = key.chars().take(4).collect();
    format!("{head}****")
}

/// Tone/length preset selecting the system instruction sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FeedbackStyle {
    #[default]
    Default,
    Concise,
    Detailed,
    Strength,
    Improvement,
    Custom,
}

impl FeedbackStyle {
    pub const ALL: [FeedbackStyle; 6] = [
        FeedbackStyle::Default,
        FeedbackStyle::Concise,
        FeedbackStyle::Detailed,
        FeedbackStyle::Strength,
        FeedbackStyle::Improvement,
        FeedbackStyle::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackStyle::Default => "default",
            FeedbackStyle::Concise => "concise",
            FeedbackStyle::Detailed => "detailed",
            FeedbackStyle::Strength => "strength",
            FeedbackStyle::Improvement => "improvement",
            FeedbackStyle::Custom => "custom",
        }
    }

    /// Parses a style tag, falling back to `Default` for anything unrecognized.
    pub fn from_tag(tag: &str) -> Self {
        tag.parse().unwrap_or_default()
    }
}

impl fmt::Display for FeedbackStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        FeedbackStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == wanted)
            .ok_or_else(|| format!("unknown feedback style: {s}"))
    }
}

/// One outbound feedback call. Never persisted.
#[derive(Debug, Clone)]
pub struct FeedbackRequest {
    pub performance_notes: String,
    pub style: FeedbackStyle,
    pub custom_prompt: Option<String>,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

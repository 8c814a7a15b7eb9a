use reqwest::StatusCode;
use thiserror::Error;

/// Message surfaced when a feedback request is made without usable credentials.
pub const MISSING_CREDENTIALS_MESSAGE: &str =
    "No API credentials configured. Please save your API key, model name and endpoint first.";

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("Invalid credentials: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Failed to access credential storage: {0}")]
    Storage(String),

    #[error("{msg}", msg = MISSING_CREDENTIALS_MESSAGE)]
    MissingCredentials,

    #[error("Please enter your performance notes")]
    EmptyNotes,

    #[error("Invalid custom prompt: {0}")]
    InvalidCustomPrompt(String),

    /// Non-success status from the model API. Displays only the extracted
    /// message so it can be shown to the user verbatim.
    #[error("{message}")]
    Remote { status: StatusCode, message: String },

    #[error("Failed to send HTTP request: {0}")]
    Transport(String),

    #[error("Unexpected response from model API: {0}")]
    InvalidResponse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for FeedbackError {
    fn from(error: reqwest::Error) -> Self {
        FeedbackError::Transport(error.to_string())
    }
}

impl From<serde_json::Error> for FeedbackError {
    fn from(error: serde_json::Error) -> Self {
        FeedbackError::Storage(format!("serialization: {error}"))
    }
}

impl From<base64::DecodeError> for FeedbackError {
    fn from(error: base64::DecodeError) -> Self {
        FeedbackError::Storage(format!("decode: {error}"))
    }
}

impl From<std::io::Error> for FeedbackError {
    fn from(error: std::io::Error) -> Self {
        FeedbackError::Storage(format!("io: {error}"))
    }
}

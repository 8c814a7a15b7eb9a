use std::env;
use std::path::PathBuf;

use crate::errors::FeedbackError;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 500;

const STORE_DIR_NAME: &str = "feedback-manager";
const STORE_FILE_NAME: &str = "store.json";

/// Process-wide settings, read once at start-up and treated as constants afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub default_endpoint: String,
    pub default_model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub store_path: PathBuf,
    pub ssm_prefix: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_endpoint: DEFAULT_ENDPOINT.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            store_path: default_store_path(),
            ssm_prefix: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, FeedbackError> {
        let defaults = Self::default();

        let temperature = match non_empty_var("FEEDBACK_TEMPERATURE") {
            Some(raw) => raw
                .parse::<f64>()
                .map_err(|e| FeedbackError::Config(format!("FEEDBACK_TEMPERATURE: {e}")))?,
            None => defaults.temperature,
        };
        if !(0.0..=2.0).contains(&temperature) {
            return Err(FeedbackError::Config(format!(
                "FEEDBACK_TEMPERATURE: {temperature} is outside 0.0..=2.0"
            )));
        }

        let max_tokens = match non_empty_var("FEEDBACK_MAX_TOKENS") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|e| FeedbackError::Config(format!("FEEDBACK_MAX_TOKENS: {e}")))?,
            None => defaults.max_tokens,
        };
        if max_tokens == 0 {
            return Err(FeedbackError::Config(
                "FEEDBACK_MAX_TOKENS: must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            default_endpoint: non_empty_var("FEEDBACK_DEFAULT_ENDPOINT")
                .unwrap_or(defaults.default_endpoint),
            default_model: non_empty_var("FEEDBACK_DEFAULT_MODEL")
                .unwrap_or(defaults.default_model),
            temperature,
            max_tokens,
            store_path: non_empty_var("FEEDBACK_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            ssm_prefix: non_empty_var("FEEDBACK_SSM_PREFIX"),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_store_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(STORE_DIR_NAME)
        .join(STORE_FILE_NAME)
}

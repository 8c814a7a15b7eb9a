//! Persistence and validation of the user's API credentials.

use std::sync::Arc;

use tracing::{error, info, warn};
use url::Url;

use super::models::{Credentials, ValidationResult};
use super::obfuscation::{deobfuscate, obfuscate};
use super::storage::KeyValueStore;
use crate::errors::FeedbackError;

/// Fixed key the obfuscated credentials blob lives under.
pub const STORAGE_KEY: &str = "feedback_manager_credentials";

/// Value shipped in the sample configuration; never accepted as a real key.
pub const PLACEHOLDER_API_KEY: &str = "your-api-key-here";

/// Known key prefixes and the chat-completion endpoint of their provider.
/// More specific prefixes come first.
const PROVIDER_ENDPOINTS: &[(&str, &str)] = &[
    ("sk-or-", "https://openrouter.ai/api/v1/chat/completions"),
    ("gsk_", "https://api.groq.com/openai/v1/chat/completions"),
    ("sk-", "https://api.openai.com/v1/chat/completions"),
];

/// Credential store over an injected key-value backend.
///
/// Cloning is cheap; clones share the same backend.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
    default_endpoint: String,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, default_endpoint: impl Into<String>) -> Self {
        Self {
            backend,
            default_endpoint: default_endpoint.into(),
        }
    }

    /// Obfuscates and writes the credentials, replacing any previous record.
    ///
    /// Returns `false` on any serialization or storage failure.
    pub async fn save(&self, credentials: &Credentials) -> bool {
        let blob = match obfuscate(credentials) {
            Ok(blob) => blob,
            Err(e) => {
                error!("Failed to save credentials: {}", e);
                return false;
            }
        };

        match self.backend.set(STORAGE_KEY, &blob).await {
            Ok(()) => {
                info!(
                    "Saved credentials for model {} at {}",
                    credentials.model_name, credentials.api_endpoint
                );
                true
            }
            Err(e) => {
                error!("Failed to save credentials: {}", e);
                false
            }
        }
    }

    /// Decodes the stored record without the completeness check.
    pub async fn load(&self) -> Result<Option<Credentials>, FeedbackError> {
        match self.backend.get(STORAGE_KEY).await? {
            Some(stored) if !stored.is_empty() => deobfuscate(&stored).map(Some),
            _ => Ok(None),
        }
    }

    /// Reads back the stored credentials.
    ///
    /// Fails closed: a missing, undecodable, or incomplete record (empty api
    /// key or model name) yields `None`.
    pub async fn get(&self) -> Option<Credentials> {
        match self.load().await {
            Ok(Some(credentials))
                if !credentials.api_key.is_empty() && !credentials.model_name.is_empty() =>
            {
                Some(credentials)
            }
            Ok(Some(_)) => {
                warn!("Stored credentials are incomplete; ignoring them");
                None
            }
            Ok(None) => None,
            Err(e) => {
                error!("Failed to retrieve credentials: {}", e);
                None
            }
        }
    }

    /// True when a blob is present, whether or not it decodes.
    ///
    /// A corrupted record therefore reports `true` here while `get` returns
    /// `None`.
    pub async fn exists(&self) -> bool {
        match self.backend.get(STORAGE_KEY).await {
            Ok(stored) => stored.is_some_and(|s| !s.is_empty()),
            Err(e) => {
                error!("Failed to check credentials: {}", e);
                false
            }
        }
    }

    /// Removes the stored record. Safe to call when nothing is stored.
    pub async fn clear(&self) {
        match self.backend.remove(STORAGE_KEY).await {
            Ok(()) => info!("Cleared stored credentials"),
            Err(e) => error!("Failed to clear credentials: {}", e),
        }
    }

    /// See [`validate_credentials`].
    pub fn validate(&self, candidate: &Credentials) -> ValidationResult {
        validate_credentials(candidate)
    }

    /// See [`suggest_endpoint`].
    pub fn suggest_endpoint(&self, api_key: &str) -> String {
        suggest_endpoint(api_key, &self.default_endpoint)
    }
}

/// Checks every field and collects all problems in field order.
pub fn validate_credentials(candidate: &Credentials) -> ValidationResult {
    let mut errors = Vec::new();

    if candidate.api_key.trim().is_empty() {
        errors.push("API Key is required".to_string());
    } else if candidate.api_key == PLACEHOLDER_API_KEY {
        errors.push("Please enter a valid API Key".to_string());
    }

    if candidate.model_name.trim().is_empty() {
        errors.push("Model Name is required".to_string());
    }

    if candidate.api_endpoint.trim().is_empty() {
        errors.push("API Endpoint is required".to_string());
    } else if !is_valid_endpoint(&candidate.api_endpoint) {
        errors.push("API Endpoint must be a valid URL".to_string());
    }

    ValidationResult::from_errors(errors)
}

fn is_valid_endpoint(raw: &str) -> bool {
    Url::parse(raw.trim()).is_ok_and(|url| url.has_host())
}

/// Picks a provider endpoint from the key's prefix, else `default_endpoint`.
pub fn suggest_endpoint(api_key: &str, default_endpoint: &str) -> String {
    let key = api_key.trim();
    PROVIDER_ENDPOINTS
        .iter()
        .find(|(prefix, _)| key.starts_with(*prefix))
        .map_or(default_endpoint, |(_, endpoint)| *endpoint)
        .to_string()
}

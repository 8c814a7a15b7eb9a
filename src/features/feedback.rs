use std::fmt;

use tracing::{info, warn};

use crate::ai::client::{FeedbackClient, build_request};
use crate::core::config::AppConfig;
use crate::core::credentials::CredentialStore;
use crate::core::models::{FeedbackRequest, FeedbackStyle};
use crate::errors::FeedbackError;

/// Outcome of the start-up configuration check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationStatus {
    Ready,
    MissingApiKey,
    MissingModelName,
    /// A record is stored but cannot be decoded.
    Unreadable,
}

impl ConfigurationStatus {
    pub fn is_ready(self) -> bool {
        self == ConfigurationStatus::Ready
    }

    pub fn message(self) -> &'static str {
        match self {
            ConfigurationStatus::Ready => "Ready to provide feedback",
            ConfigurationStatus::MissingApiKey => "Please configure your API key",
            ConfigurationStatus::MissingModelName => "Please configure your model name",
            ConfigurationStatus::Unreadable => {
                "Stored credentials could not be read. Please save them again"
            }
        }
    }
}

impl fmt::Display for ConfigurationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Entry point for callers: one `get_feedback` per user action.
///
/// Holds no lock; callers must not submit the same action twice while a call
/// is in flight.
#[derive(Clone)]
pub struct FeedbackService {
    credentials: CredentialStore,
    client: FeedbackClient,
    config: AppConfig,
}

impl FeedbackService {
    pub fn new(credentials: CredentialStore, client: FeedbackClient, config: AppConfig) -> Self {
        Self {
            credentials,
            client,
            config,
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn check_configuration(&self) -> ConfigurationStatus {
        match self.credentials.load().await {
            Ok(Some(creds)) if creds.api_key.trim().is_empty() => {
                ConfigurationStatus::MissingApiKey
            }
            Ok(Some(creds)) if creds.model_name.trim().is_empty() => {
                ConfigurationStatus::MissingModelName
            }
            Ok(Some(_)) => ConfigurationStatus::Ready,
            Ok(None) => ConfigurationStatus::MissingApiKey,
            Err(e) => {
                warn!("Configuration check failed: {}", e);
                ConfigurationStatus::Unreadable
            }
        }
    }

    /// Trims the notes, loads the stored credentials and asks the model for feedback.
    ///
    /// # Errors
    ///
    /// `EmptyNotes` for blank notes, `MissingCredentials` when nothing usable
    /// is stored, plus anything [`FeedbackService::send`] returns.
    pub async fn get_feedback(
        &self,
        performance_notes: &str,
        style: FeedbackStyle,
        custom_prompt: Option<&str>,
    ) -> Result<String, FeedbackError> {
        let notes = performance_notes.trim();
        if notes.is_empty() {
            return Err(FeedbackError::EmptyNotes);
        }

        let credentials = self
            .credentials
            .get()
            .await
            .ok_or(FeedbackError::MissingCredentials)?;

        let request = FeedbackRequest {
            performance_notes: notes.to_string(),
            style,
            custom_prompt: custom_prompt.map(str::to_string),
            credentials,
        };

        self.send(&request).await
    }

    /// Builds and executes one request with the configured sampling limits.
    pub async fn send(&self, request: &FeedbackRequest) -> Result<String, FeedbackError> {
        info!(
            "Requesting {} feedback with model {}",
            request.style, request.credentials.model_name
        );

        let spec = build_request(
            &request.performance_notes,
            request.style,
            request.custom_prompt.as_deref(),
            &request.credentials,
            self.config.temperature,
            self.config.max_tokens,
        )?;

        self.client.execute(spec).await
    }
}

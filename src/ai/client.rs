//! Chat-completion client module
//!
//! Assembles the outbound request for a feedback call and interprets the
//! model API's reply. `execute` is the only network side effect; there is no
//! retry and no timeout.

use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::core::models::{Credentials, FeedbackStyle};
use crate::errors::FeedbackError;
use crate::prompt::{system_prompt, wrap_performance_notes};

/// A fully assembled HTTP request, ready for [`FeedbackClient::execute`].
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub endpoint: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Value,
}

/// System instruction followed by the wrapped notes.
#[must_use]
pub fn build_prompt(system: &str, performance_notes: &str) -> Vec<ChatCompletionMessage> {
    vec![
        ChatCompletionMessage {
            role: MessageRole::system,
            content: Content::Text(system.to_string()),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        },
        ChatCompletionMessage {
            role: MessageRole::user,
            content: Content::Text(wrap_performance_notes(performance_notes)),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        },
    ]
}

/// Converts prompt messages into the `{role, content}` objects of the chat-completion body.
/// Non-text content is dropped.
#[must_use]
pub fn messages_to_json(prompt: &[ChatCompletionMessage]) -> Vec<Value> {
    prompt
        .iter()
        .filter_map(|msg| {
            let role_str = match msg.role {
                MessageRole::system => "system",
                MessageRole::user => "user",
                MessageRole::assistant => "assistant",
                MessageRole::function => "function",
                MessageRole::tool => "tool",
            };

            match &msg.content {
                Content::Text(text) => Some(json!({
                    "role": role_str,
                    "content": text
                })),
                Content::ImageUrl(_) => None,
            }
        })
        .collect()
}

/// Builds the authenticated chat-completion request for one feedback call.
///
/// # Errors
///
/// Returns `FeedbackError::InvalidCustomPrompt` for a `Custom` style without a
/// usable instruction, and `FeedbackError::Validation` if the api key cannot
/// be carried in an HTTP header.
pub fn build_request(
    performance_notes: &str,
    style: FeedbackStyle,
    custom_prompt: Option<&str>,
    credentials: &Credentials,
    temperature: f64,
    max_tokens: u32,
) -> Result<RequestSpec, FeedbackError> {
    let system = system_prompt(style, custom_prompt)?;
    let prompt = build_prompt(&system, performance_notes);

    #[cfg(feature = "debug-logs")]
    debug!("Using feedback prompt:\n{:?}", prompt);

    #[cfg(not(feature = "debug-logs"))]
    debug!(
        "Building {} request with {} chars of notes",
        style,
        performance_notes.chars().count()
    );

    let body = json!({
        "model": credentials.model_name,
        "messages": messages_to_json(&prompt),
        "temperature": temperature,
        "max_tokens": max_tokens
    });

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", credentials.api_key.trim()))
        .map_err(|_| {
            FeedbackError::Validation(vec![
                "API Key contains characters that are not allowed in an HTTP header".to_string(),
            ])
        })?;
    auth_value.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth_value);

    Ok(RequestSpec {
        endpoint: credentials.api_endpoint.trim().to_string(),
        method: Method::POST,
        headers,
        body,
    })
}

/// HTTP client for the model API.
#[derive(Debug, Clone, Default)]
pub struct FeedbackClient {
    http: Client,
}

impl FeedbackClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    /// Sends the request and returns the first completion's text.
    ///
    /// # Errors
    ///
    /// `Transport` for network-level failures, `Remote` for non-success
    /// statuses, `InvalidResponse` for a success body without a completion.
    pub async fn execute(&self, spec: RequestSpec) -> Result<String, FeedbackError> {
        info!("Requesting feedback from {}", spec.endpoint);

        let response = self
            .http
            .request(spec.method, &spec.endpoint)
            .headers(spec.headers)
            .json(&spec.body)
            .send()
            .await?;

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(e) => {
                warn!("Failed to read error response body (status {}): {}", status, e);
                String::new()
            }
        };

        interpret_response(status, &body)
    }
}

/// Turns a status and raw body into the completion text or a descriptive error.
///
/// # Errors
///
/// See [`FeedbackClient::execute`].
pub fn interpret_response(status: StatusCode, body: &str) -> Result<String, FeedbackError> {
    if !status.is_success() {
        let message = extract_error_message(body).unwrap_or_else(|| {
            format!(
                "API request failed: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            )
            .trim_end()
            .to_string()
        });
        warn!("Model API error (status {}): {}", status, message);
        return Err(FeedbackError::Remote { status, message });
    }

    let response_json: Value = serde_json::from_str(body).map_err(|e| {
        FeedbackError::InvalidResponse(format!("Failed to parse model API response: {e}"))
    })?;

    let content = response_json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| FeedbackError::InvalidResponse("No completion in response".to_string()))?;

    info!("Received feedback ({} chars)", content.chars().count());
    Ok(content.to_string())
}

/// Best-effort `error.message` extraction.
fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

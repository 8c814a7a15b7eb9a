//! Reversible at-rest encoding for stored credentials.
//!
//! This is obfuscation, not encryption: anyone who can read the store can
//! recover the credentials with a base64 decoder. It only keeps keys from
//! appearing as plain text in the stored blob.

use base64::{Engine as _, engine::general_purpose};

use super::models::Credentials;
use crate::errors::FeedbackError;

/// Marker prepended to every encoded blob.
pub const OBFUSCATED_PREFIX: &str = "enc_";

/// Encodes credentials as `enc_` + base64(JSON).
pub fn obfuscate(credentials: &Credentials) -> Result<String, FeedbackError> {
    let json = serde_json::to_string(credentials)?;
    Ok(format!(
        "{OBFUSCATED_PREFIX}{}",
        general_purpose::STANDARD.encode(json)
    ))
}

/// Decodes a stored blob. Blobs without the prefix are treated as bare base64.
pub fn deobfuscate(stored: &str) -> Result<Credentials, FeedbackError> {
    let encoded = stored.strip_prefix(OBFUSCATED_PREFIX).unwrap_or(stored);
    let bytes = general_purpose::STANDARD.decode(encoded.trim())?;
    let json = String::from_utf8(bytes)
        .map_err(|e| FeedbackError::Storage(format!("decode: {e}")))?;
    Ok(serde_json::from_str(&json)?)
}

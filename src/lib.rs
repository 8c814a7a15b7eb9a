//! Feedback Manager - turns an employee's performance notes into managerial
//! feedback using any OpenAI-compatible chat-completion API.
//!
//! # Architecture
//!
//! - [`core::credentials::CredentialStore`] validates, obfuscates and persists
//!   the API key / model / endpoint triple in a pluggable key-value backend
//! - [`prompt`] holds the system-prompt template for each feedback style
//! - [`ai::client`] assembles the chat-completion request and interprets the reply
//! - [`features::FeedbackService`] wires them together behind `get_feedback`
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use feedback_manager::ai::FeedbackClient;
//! use feedback_manager::core::config::AppConfig;
//! use feedback_manager::core::credentials::CredentialStore;
//! use feedback_manager::core::models::{Credentials, FeedbackStyle};
//! use feedback_manager::core::storage::FileStore;
//! use feedback_manager::features::FeedbackService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     feedback_manager::setup_logging();
//!
//!     let config = AppConfig::from_env()?;
//!     let store = CredentialStore::new(
//!         Arc::new(FileStore::new(&config.store_path)),
//!         config.default_endpoint.clone(),
//!     );
//!
//!     let creds = Credentials::new("sk-...", "gpt-4o-mini", store.suggest_endpoint("sk-..."));
//!     if store.validate(&creds).valid {
//!         store.save(&creds).await;
//!     }
//!
//!     let service = FeedbackService::new(store, FeedbackClient::new(), config);
//!     let feedback = service
//!         .get_feedback("Shipped the Q3 report on time", FeedbackStyle::Concise, None)
//!         .await?;
//!     println!("{feedback}");
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod core;
pub mod errors;
pub mod features;
pub mod prompt;

pub use errors::FeedbackError;

/// Configure structured JSON logging on stderr.
///
/// The level comes from `RUST_LOG` and defaults to `info`. Calling this more
/// than once is harmless; only the first call installs a subscriber.
///
/// # Example
///
/// ```
/// feedback_manager::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_writer(std::io::stderr);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

//! All model-API functionality

pub mod client;

// Re-export main types for convenience
pub use client::{FeedbackClient, RequestSpec, build_request, interpret_response};

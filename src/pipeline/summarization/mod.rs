pub mod batch;
pub mod client;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod rate_limit;
pub mod types;

pub use client::*;
pub use orchestrator::*;
pub use rate_limit::*;
pub use types::*;

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Document content failed allow-list validation")]
    ValidationFailed,

    #[error("No LLM provider is configured")]
    ProviderUnavailable,

    #[error("Provider call timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Generated content failed identifier validation")]
    LeakDetected,

    #[error("Rate limit exceeded until {reset_time}")]
    RateLimited { reset_time: DateTime<Utc> },

    #[error("Provider request failed: {0}")]
    Provider(String),

    /// `body` is provider output and stays out of `Display`, which ends up
    /// in logs.
    #[error("Provider returned error (status {status})")]
    ProviderStatus { status: u16, body: String },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

impl SummaryError {
    /// Stable machine-readable code for failure reports.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            Self::Timeout { .. } => "TIMEOUT",
            Self::LeakDetected => "GENERATION_FAILED",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::Provider(_) | Self::ProviderStatus { .. } => "PROVIDER_ERROR",
            Self::MalformedResponse(_) => "GENERATION_FAILED",
        }
    }

    /// Generic message safe to show an end user. Never names the identifier
    /// pattern behind a rejection or echoes provider detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ValidationFailed => "This entry contains content that cannot be processed.",
            Self::ProviderUnavailable => "Summaries are not available right now.",
            Self::Timeout { .. } => "The summary took too long to generate. Please try again later.",
            Self::RateLimited { .. } => "Too many summary requests. Please try again later.",
            Self::LeakDetected
            | Self::Provider(_)
            | Self::ProviderStatus { .. }
            | Self::MalformedResponse(_) => "The summary could not be generated.",
        }
    }

    /// Whether the caller may try the same request again later. Nothing in
    /// this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::RateLimited { .. } | Self::Provider(_) => true,
            Self::ProviderStatus { status, .. } => *status == 429 || *status >= 500,
            Self::ValidationFailed
            | Self::ProviderUnavailable
            | Self::LeakDetected
            | Self::MalformedResponse(_) => false,
        }
    }
}

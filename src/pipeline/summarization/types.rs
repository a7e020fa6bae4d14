use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::SummaryError;
use crate::config::{MAX_CONTENT_CHARS, PROVIDER_TIMEOUT};

/// Text-completion provider. Constructed once per process and shared.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a prompt. Cancellation-safe: dropping the future abandons
    /// the call.
    async fn complete(&self, prompt: &str) -> Result<String, SummaryError>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}

/// Options for a single entry summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOptions {
    /// Run a second, independent call producing a mood analysis.
    pub include_mood_analysis: bool,
    /// Wall-clock budget per provider call.
    pub timeout: Duration,
    /// Plain-text characters kept before prompting.
    pub max_content_chars: usize,
    /// Rate-limit bucket of the requesting user.
    pub rate_limit_key: Option<String>,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            include_mood_analysis: false,
            timeout: PROVIDER_TIMEOUT,
            max_content_chars: MAX_CONTENT_CHARS,
            rate_limit_key: None,
        }
    }
}

/// Options for a combined summary across entries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CombinedSummaryOptions {
    pub summary: SummaryOptions,
    /// Finish with one more call turning the themes into a short narrative.
    pub include_narrative: bool,
    /// Reference time for recency scoring; `None` means now.
    pub reference_time: Option<DateTime<Utc>>,
}

pub mod authorization; // Share-scope projection
pub mod config;
pub mod models;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

pub use authorization::{project, project_summary};
pub use models::*;
pub use pipeline::aggregation::{
    aggregate_risk_level, apply_salience_filtering, compute_sentiment_trend, merge_summaries,
};
pub use pipeline::content::{to_plain_text, validate_content};
pub use pipeline::safety::{detect_risk, redact, validate_summary_content, PatternRedactor, Redactor};
pub use pipeline::summarization::{
    CombinedSummaryOptions, EntrySummarizer, HttpLlmProvider, InMemoryRateLimiter, LlmProvider,
    MockLlmProvider, RateLimitStore, SummaryError, SummaryOptions,
};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Logs go to stderr so stdout stays free for command output.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}

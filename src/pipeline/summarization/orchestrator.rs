use std::sync::Arc;

use chrono::Utc;

use super::parser::parse_summary_response;
use super::prompt::{build_entry_summary_prompt, build_mood_analysis_prompt};
use super::rate_limit::RateLimitStore;
use super::types::{LlmProvider, SummaryOptions};
use super::SummaryError;
use crate::models::{count_words, EntryContent, RiskFlag, SummaryResult};
use crate::pipeline::content::{to_plain_text, validate_content};
use crate::pipeline::safety::{sanitize_llm_output, PatternRedactor, Redactor};

/// Bucket used when a call carries no per-user rate-limit key.
const SHARED_RATE_KEY: &str = "shared";

/// Entry fields after validation, truncation and redaction. Only this form
/// is ever embedded in a prompt.
pub(super) struct PreparedEntry {
    pub title: String,
    pub text: String,
    pub mood: Option<String>,
    pub tags: Vec<String>,
    pub word_count: usize,
    pub risk_flags: Vec<RiskFlag>,
}

/// Runs the per-entry summary pipeline:
/// validate → flatten → truncate → risk scan → redact → provider → leak check
pub struct EntrySummarizer {
    provider: Option<Arc<dyn LlmProvider>>,
    redactor: Arc<dyn Redactor>,
    rate_limiter: Option<Arc<dyn RateLimitStore>>,
}

impl EntrySummarizer {
    /// `None` models a deployment without provider credentials; every
    /// generation call then fails fast with `ProviderUnavailable`.
    pub fn new(provider: Option<Arc<dyn LlmProvider>>) -> Self {
        Self {
            provider,
            redactor: Arc::new(PatternRedactor),
            rate_limiter: None,
        }
    }

    pub fn with_redactor(mut self, redactor: Arc<dyn Redactor>) -> Self {
        self.redactor = redactor;
        self
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimitStore>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    pub(super) fn provider(&self) -> Result<&dyn LlmProvider, SummaryError> {
        self.provider.as_deref().ok_or(SummaryError::ProviderUnavailable)
    }

    /// Summarize one entry.
    ///
    /// Makes one provider call, plus a second independent one when
    /// `include_mood_analysis` is set. Either call failing fails the whole
    /// request; nothing partial is returned and nothing is retried.
    pub async fn generate_entry_summary(
        &self,
        title: &str,
        content: &EntryContent,
        mood: Option<&str>,
        tags: &[String],
        options: &SummaryOptions,
    ) -> Result<SummaryResult, SummaryError> {
        let provider = self.provider()?;
        let entry = self.prepare_entry(title, content, mood, tags, options)?;

        let prompt =
            build_entry_summary_prompt(&entry.title, &entry.text, entry.mood.as_deref(), &entry.tags);
        let raw = self.call_provider(provider, &prompt, options).await?;
        let parsed = parse_summary_response(&raw)?;
        self.ensure_no_identifiers(
            std::iter::once(parsed.summary.as_str())
                .chain(parsed.key_themes.iter().map(String::as_str)),
        )?;

        let mood_analysis = if options.include_mood_analysis {
            let prompt = build_mood_analysis_prompt(&entry.text, entry.mood.as_deref());
            let analysis = self.call_provider(provider, &prompt, options).await?;
            if analysis.is_empty() {
                return Err(SummaryError::MalformedResponse("empty mood analysis".into()));
            }
            self.ensure_no_identifiers([analysis.as_str()])?;
            Some(analysis)
        } else {
            None
        };

        tracing::info!(
            provider = provider.name(),
            word_count = entry.word_count,
            risk_flagged = !entry.risk_flags.is_empty(),
            "Entry summary generated"
        );

        Ok(SummaryResult {
            summary: parsed.summary,
            mood_analysis,
            word_count: entry.word_count,
            key_themes: parsed.key_themes,
            risk_flags: entry.risk_flags,
            generated_at: Utc::now(),
        })
    }

    /// Validate, flatten, truncate, scan and redact an entry.
    pub(super) fn prepare_entry(
        &self,
        title: &str,
        content: &EntryContent,
        mood: Option<&str>,
        tags: &[String],
        options: &SummaryOptions,
    ) -> Result<PreparedEntry, SummaryError> {
        if let EntryContent::Document(tree) = content {
            if !validate_content(tree) {
                return Err(SummaryError::ValidationFailed);
            }
        }

        let plain = to_plain_text(content);
        let word_count = count_words(&plain);
        let text = truncate_at_word_boundary(&plain, options.max_content_chars);
        let risk_flags = self.redactor.detect_risk(text);

        Ok(PreparedEntry {
            title: self.redactor.redact(title),
            text: self.redactor.redact(text),
            mood: mood.map(|m| self.redactor.redact(m)),
            tags: tags.iter().map(|t| self.redactor.redact(t)).collect(),
            word_count,
            risk_flags,
        })
    }

    /// One external call: quota check, then the provider raced against the
    /// timeout. The losing future is dropped, which abandons the call.
    pub(super) async fn call_provider(
        &self,
        provider: &dyn LlmProvider,
        prompt: &str,
        options: &SummaryOptions,
    ) -> Result<String, SummaryError> {
        if let Some(limiter) = &self.rate_limiter {
            let key = options.rate_limit_key.as_deref().unwrap_or(SHARED_RATE_KEY);
            let decision = limiter.check_and_consume(key);
            if !decision.allowed {
                tracing::warn!(reset_time = %decision.reset_time, "Rate limit exhausted");
                return Err(SummaryError::RateLimited {
                    reset_time: decision.reset_time,
                });
            }
        }

        match tokio::time::timeout(options.timeout, provider.complete(prompt)).await {
            Ok(Ok(raw)) => Ok(sanitize_llm_output(&raw)),
            Ok(Err(e)) => {
                let status = match &e {
                    SummaryError::ProviderStatus { status, .. } => Some(*status),
                    _ => None,
                };
                tracing::warn!(
                    provider = provider.name(),
                    code = e.code(),
                    status,
                    "Provider call failed"
                );
                Err(e)
            }
            Err(_) => {
                tracing::warn!(
                    provider = provider.name(),
                    timeout_secs = options.timeout.as_secs(),
                    "Provider call timed out"
                );
                Err(SummaryError::Timeout {
                    after: options.timeout,
                })
            }
        }
    }

    /// Reject provider output carrying any identifier-shaped pattern. The
    /// matched kind is logged but never returned to the caller.
    pub(super) fn ensure_no_identifiers<'a>(
        &self,
        texts: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), SummaryError> {
        for text in texts {
            if let Some(kind) = self.redactor.find_identifier(text) {
                tracing::warn!(kind = kind.as_str(), "Identifier pattern in provider output, discarding");
                return Err(SummaryError::LeakDetected);
            }
        }
        Ok(())
    }
}

/// Cut `text` to at most `max_chars` characters, backing off to the last
/// whitespace so no word is split. A single overlong word is hard-cut.
fn truncate_at_word_boundary(text: &str, max_chars: usize) -> &str {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text;
    };
    let head = &text[..cut];
    if text[cut..].starts_with(char::is_whitespace) {
        return head.trim_end();
    }
    match head.rfind(char::is_whitespace) {
        Some(ws) if !head[..ws].trim().is_empty() => head[..ws].trim_end(),
        _ => head,
    }
}

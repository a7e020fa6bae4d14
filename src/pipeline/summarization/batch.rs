use chrono::Utc;
use futures_util::stream::{self, StreamExt};

use super::orchestrator::EntrySummarizer;
use super::parser::parse_digest_response;
use super::prompt::{build_entry_digest_prompt, build_narrative_prompt};
use super::types::{CombinedSummaryOptions, LlmProvider, SummaryOptions};
use super::SummaryError;
use crate::models::{
    CombinedSummary, CombinedSummaryOutcome, EntryDigest, EntryFailure, JournalEntry,
    SummaryPeriod,
};
use crate::pipeline::aggregation::{apply_salience_filtering_at, merge_summaries};

impl EntrySummarizer {
    /// Summarize several entries into one combined digest.
    ///
    /// Entries are processed one at a time, in the order given. A failing
    /// entry is recorded in `failures` and the batch carries on; only a
    /// missing provider fails the whole call.
    pub async fn generate_combined_summary(
        &self,
        entries: &[JournalEntry],
        period: SummaryPeriod,
        options: &CombinedSummaryOptions,
    ) -> Result<CombinedSummaryOutcome, SummaryError> {
        let provider = self.provider()?;

        let results: Vec<(&JournalEntry, Result<EntryDigest, SummaryError>)> = stream::iter(entries)
            .then(|entry| async move {
                let result = self.digest_entry(provider, entry, &options.summary).await;
                (entry, result)
            })
            .collect()
            .await;

        let mut digests = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (entry, result) in results {
            match result {
                Ok(digest) => digests.push(digest),
                Err(e) => {
                    tracing::warn!(
                        entry_id = %entry.id,
                        code = e.code(),
                        "Entry digest failed, continuing batch"
                    );
                    failures.push(EntryFailure {
                        entry_id: entry.id,
                        code: e.code().to_string(),
                        message: e.user_message().to_string(),
                    });
                }
            }
        }

        let now = options.reference_time.unwrap_or_else(Utc::now);
        let mut summary = apply_salience_filtering_at(merge_summaries(&digests), period, now);

        if options.include_narrative && !summary.bullets.is_empty() {
            summary.narrative = self.narrate(provider, &summary, &options.summary).await;
        }

        tracing::info!(
            period = %period,
            entries = entries.len(),
            merged = digests.len(),
            failed = failures.len(),
            bullets = summary.bullets.len(),
            "Combined summary generated"
        );

        Ok(CombinedSummaryOutcome { summary, failures })
    }

    async fn digest_entry(
        &self,
        provider: &dyn LlmProvider,
        entry: &JournalEntry,
        options: &SummaryOptions,
    ) -> Result<EntryDigest, SummaryError> {
        let prepared = self.prepare_entry(
            &entry.title,
            &entry.content,
            entry.mood.as_deref(),
            &entry.tags,
            options,
        )?;

        let prompt = build_entry_digest_prompt(
            &prepared.title,
            &prepared.text,
            prepared.mood.as_deref(),
            &prepared.tags,
        );
        let raw = self.call_provider(provider, &prompt, options).await?;
        let parsed = parse_digest_response(&raw)?;

        self.ensure_no_identifiers(
            parsed
                .bullets
                .iter()
                .map(|b| b.text.as_str())
                .chain(parsed.themes.iter().flat_map(|t| {
                    std::iter::once(t.name.as_str()).chain(t.bullets.iter().map(String::as_str))
                }))
                .chain(parsed.topics.iter().map(String::as_str)),
        )?;

        let mut risk_flags = prepared.risk_flags;
        risk_flags.extend(parsed.risk_flags);
        risk_flags.sort();
        risk_flags.dedup();

        Ok(EntryDigest {
            entry_id: entry.id,
            timestamp: entry.created_at,
            bullets: parsed.bullets,
            themes: parsed.themes,
            risk_flags,
            sentiment: parsed.sentiment,
            topics: parsed.topics,
            word_count: prepared.word_count,
        })
    }

    /// Optional closing call. Any failure leaves the narrative out; the
    /// structured summary is still returned.
    async fn narrate(
        &self,
        provider: &dyn LlmProvider,
        summary: &CombinedSummary,
        options: &SummaryOptions,
    ) -> Option<String> {
        let prompt =
            build_narrative_prompt(&summary.themes, summary.sentiment.trend, summary.risks.level);
        let text = match self.call_provider(provider, &prompt, options).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => {
                tracing::warn!("Narrative response was empty, omitting");
                return None;
            }
            Err(e) => {
                tracing::warn!(code = e.code(), "Narrative generation failed, omitting");
                return None;
            }
        };
        self.ensure_no_identifiers([text.as_str()]).ok()?;
        Some(text)
    }
}

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entry::EntryId;
use super::enums::{RiskFlag, RiskLevel, SentimentTrend};

// ═══════════════════════════════════════════
// Per-entry summary
// ═══════════════════════════════════════════

/// Provider-generated summary of a single entry. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_analysis: Option<String>,
    pub word_count: usize,
    pub key_themes: Vec<String>,
    pub risk_flags: Vec<RiskFlag>,
    pub generated_at: DateTime<Utc>,
}

/// Scope-projected view of a `SummaryResult`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedSummaryView {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_analysis: Option<String>,
    pub word_count: usize,
    pub key_themes: Vec<String>,
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_flags: Option<Vec<RiskFlag>>,
}

/// Structured digest of one entry, the unit the aggregator merges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDigest {
    pub entry_id: EntryId,
    pub timestamp: DateTime<Utc>,
    pub bullets: Vec<DigestBullet>,
    pub themes: Vec<DigestTheme>,
    pub risk_flags: Vec<RiskFlag>,
    /// Sentiment score in [-1, 1].
    pub sentiment: f64,
    pub topics: Vec<String>,
    pub word_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestBullet {
    pub text: String,
    pub confidence: f64,
}

/// A theme as named by a single entry digest; `bullets` holds bullet texts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestTheme {
    pub name: String,
    pub bullets: Vec<String>,
}

// ═══════════════════════════════════════════
// Combined summary
// ═══════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryBullet {
    pub text: String,
    pub source_ids: BTreeSet<EntryId>,
    pub timestamp: DateTime<Utc>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTheme {
    pub name: String,
    pub bullets: Vec<SummaryBullet>,
    pub prevalence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub level: RiskLevel,
    pub flags: BTreeSet<RiskFlag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub overall: f64,
    pub trend: SentimentTrend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetadata {
    pub entry_count: usize,
    pub date_range: Option<DateRange>,
    pub word_count: usize,
}

/// Hierarchical digest across many entries. Rebuilt on every aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedSummary {
    pub bullets: Vec<SummaryBullet>,
    pub themes: Vec<SummaryTheme>,
    pub risks: RiskSummary,
    pub sentiment: SentimentSummary,
    pub topics: Vec<String>,
    pub metadata: SummaryMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

/// An entry that could not be summarized during a bulk run.
/// `message` is the generic user-facing text, never the underlying detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFailure {
    pub entry_id: EntryId,
    pub code: String,
    pub message: String,
}

/// Result of a bulk run: the digest built from every entry that succeeded,
/// plus the entries that did not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedSummaryOutcome {
    pub summary: CombinedSummary,
    pub failures: Vec<EntryFailure>,
}

impl CombinedSummaryOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

//! Share-scope projection.
//!
//! Reduces an entry or its summary to what a non-owner may see. Scopes are
//! cumulative, each one revealing everything the one below it does:
//! 1. NONE → id, status, timestamps, word count
//! 2. TITLE_ONLY → + title
//! 3. SUMMARY_ONLY → + AI summary, mood, tags
//! 4. FULL_ACCESS → + full content
//!
//! Fields are copied out by scope, never filtered out of a full copy, so a
//! field added to `JournalEntry` later stays hidden until projected here.

use crate::models::{JournalEntry, ShareScope, SharedEntryView, SharedSummaryView, SummaryResult};

// ═══════════════════════════════════════════════════════════
// Entry projection
// ═══════════════════════════════════════════════════════════

/// Project an entry to the view permitted by `scope`.
pub fn project(entry: &JournalEntry, scope: ShareScope) -> SharedEntryView {
    let reveals = |min: ShareScope| scope >= min;

    SharedEntryView {
        id: entry.id,
        status: entry.status,
        created_at: entry.created_at,
        updated_at: entry.updated_at,
        word_count: entry.word_count,
        title: reveals(ShareScope::TitleOnly).then(|| entry.title.clone()),
        ai_summary: if reveals(ShareScope::SummaryOnly) {
            entry.ai_summary.clone()
        } else {
            None
        },
        mood: if reveals(ShareScope::SummaryOnly) {
            entry.mood.clone()
        } else {
            None
        },
        tags: reveals(ShareScope::SummaryOnly).then(|| entry.tags.clone()),
        content: reveals(ShareScope::FullAccess).then(|| entry.content.clone()),
    }
}

// ═══════════════════════════════════════════════════════════
// Summary projection
// ═══════════════════════════════════════════════════════════

/// Project a generated summary. Below `SUMMARY_ONLY` nothing is shared;
/// risk flags are clinical detail and only travel with `FULL_ACCESS`.
pub fn project_summary(summary: &SummaryResult, scope: ShareScope) -> Option<SharedSummaryView> {
    if scope < ShareScope::SummaryOnly {
        return None;
    }
    Some(SharedSummaryView {
        summary: summary.summary.clone(),
        mood_analysis: summary.mood_analysis.clone(),
        word_count: summary.word_count,
        key_themes: summary.key_themes.clone(),
        generated_at: summary.generated_at,
        risk_flags: (scope == ShareScope::FullAccess).then(|| summary.risk_flags.clone()),
    })
}

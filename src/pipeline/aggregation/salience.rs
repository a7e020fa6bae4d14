use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::merge::normalize_key;
use crate::models::{CombinedSummary, SummaryBullet, SummaryPeriod};
use crate::pipeline::safety::contains_risk_keyword;

const RISK_BOOST: f64 = 0.3;
const SOURCE_BOOST_PER_EXTRA: f64 = 0.1;
const SOURCE_BOOST_MAX: f64 = 0.3;
const RECENCY_MAX: f64 = 0.35;
const RECENCY_HORIZON_DAYS: f64 = 7.0;

/// Salience of a bullet relative to `now`.
///
/// Sum of:
/// - its confidence
/// - 0.3 when the text contains a clinical-risk phrase
/// - 0.1 per extra source entry, up to 0.3
/// - 0.35 at age zero, decaying linearly to 0 at seven days
pub fn importance_score(bullet: &SummaryBullet, now: DateTime<Utc>) -> f64 {
    let risk = if contains_risk_keyword(&bullet.text) {
        RISK_BOOST
    } else {
        0.0
    };

    let extra_sources = bullet.source_ids.len().saturating_sub(1) as f64;
    let corroboration = (SOURCE_BOOST_PER_EXTRA * extra_sources).min(SOURCE_BOOST_MAX);

    // Future timestamps count as brand new.
    let age_days = ((now - bullet.timestamp).num_seconds() as f64 / 86_400.0).max(0.0);
    let recency = RECENCY_MAX * (1.0 - age_days / RECENCY_HORIZON_DAYS).max(0.0);

    bullet.confidence + risk + corroboration + recency
}

/// Keep the most salient bullets for `period`, scored against the current
/// time.
pub fn apply_salience_filtering(summary: CombinedSummary, period: SummaryPeriod) -> CombinedSummary {
    apply_salience_filtering_at(summary, period, Utc::now())
}

/// Keep the top `period.bullet_cap()` bullets by importance. Ties keep merge
/// order. Themes are pruned to surviving bullets and dropped when empty.
pub fn apply_salience_filtering_at(
    mut summary: CombinedSummary,
    period: SummaryPeriod,
    now: DateTime<Utc>,
) -> CombinedSummary {
    let mut scored: Vec<(f64, SummaryBullet)> = summary
        .bullets
        .drain(..)
        .map(|b| (importance_score(&b, now), b))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.truncate(period.bullet_cap());
    summary.bullets = scored.into_iter().map(|(_, b)| b).collect();

    let kept: HashSet<String> = summary.bullets.iter().map(|b| normalize_key(&b.text)).collect();
    for theme in &mut summary.themes {
        theme
            .bullets
            .retain(|b| kept.contains(&normalize_key(&b.text)));
    }
    summary.themes.retain(|t| !t.bullets.is_empty());

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        RiskLevel, RiskSummary, SentimentSummary, SentimentTrend, SummaryMetadata, SummaryTheme,
    };
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    fn bullet(text: &str, confidence: f64, sources: u128, age_days: i64) -> SummaryBullet {
        SummaryBullet {
            text: text.into(),
            source_ids: (0..sources).map(Uuid::from_u128).collect(),
            timestamp: now() - Duration::days(age_days),
            confidence,
        }
    }

    fn summary(bullets: Vec<SummaryBullet>, themes: Vec<SummaryTheme>) -> CombinedSummary {
        CombinedSummary {
            bullets,
            themes,
            risks: RiskSummary {
                level: RiskLevel::None,
                flags: BTreeSet::new(),
            },
            sentiment: SentimentSummary {
                overall: 0.0,
                trend: SentimentTrend::Stable,
            },
            topics: vec![],
            metadata: SummaryMetadata {
                entry_count: 1,
                date_range: None,
                word_count: 0,
            },
            narrative: None,
        }
    }

    // =================================================================
    // SCORING
    // =================================================================

    #[test]
    fn fresh_single_source_bullet() {
        let score = importance_score(&bullet("walked", 0.5, 1, 0), now());
        assert!((score - 0.85).abs() < 1e-9);
    }

    #[test]
    fn old_bullet_gets_no_recency() {
        let score = importance_score(&bullet("walked", 0.5, 1, 10), now());
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn recency_decays_linearly() {
        let score = importance_score(&bullet("walked", 0.0, 1, 7), now() - Duration::hours(84));
        // Age is 3.5 days once `now` moves back half a week.
        assert!((score - 0.175).abs() < 1e-9);
    }

    #[test]
    fn future_timestamp_counts_as_new() {
        let score = importance_score(&bullet("walked", 0.5, 1, -2), now());
        assert!((score - 0.85).abs() < 1e-9);
    }

    #[test]
    fn risk_phrase_boosts() {
        let score = importance_score(&bullet("Mentions wanting to overdose", 0.5, 1, 10), now());
        assert!((score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn corroboration_capped() {
        let two = importance_score(&bullet("walked", 0.5, 2, 10), now());
        let nine = importance_score(&bullet("walked", 0.5, 9, 10), now());
        assert!((two - 0.6).abs() < 1e-9);
        assert!((nine - 0.8).abs() < 1e-9);
    }

    // =================================================================
    // FILTERING
    // =================================================================

    #[test]
    fn keeps_top_bullets_for_week() {
        let bullets: Vec<SummaryBullet> = (0..10)
            .map(|i| bullet(&format!("note {i}"), i as f64 / 10.0, 1, 10))
            .collect();
        let out = apply_salience_filtering_at(summary(bullets, vec![]), SummaryPeriod::Week, now());
        assert_eq!(out.bullets.len(), 7);
        assert_eq!(out.bullets[0].text, "note 9");
        assert_eq!(out.bullets[6].text, "note 3");
    }

    #[test]
    fn ties_keep_merge_order() {
        let bullets = vec![bullet("first", 0.5, 1, 10), bullet("second", 0.5, 1, 10)];
        let out = apply_salience_filtering_at(summary(bullets, vec![]), SummaryPeriod::Week, now());
        assert_eq!(out.bullets[0].text, "first");
    }

    #[test]
    fn themes_pruned_and_empty_dropped() {
        let strong = bullet("strong", 0.9, 1, 10);
        let weak: Vec<SummaryBullet> = (0..8).map(|i| bullet(&format!("weak {i}"), 0.1, 1, 10)).collect();
        let mut bullets = vec![strong.clone()];
        bullets.extend(weak.iter().cloned());
        let themes = vec![
            SummaryTheme {
                name: "mixed".into(),
                bullets: vec![strong.clone(), weak[7].clone()],
                prevalence: 0.2,
            },
            SummaryTheme {
                name: "dropped".into(),
                bullets: vec![weak[7].clone()],
                prevalence: 0.1,
            },
        ];

        let out = apply_salience_filtering_at(summary(bullets, themes), SummaryPeriod::Week, now());
        assert_eq!(out.bullets.len(), 7);
        assert_eq!(out.themes.len(), 1);
        assert_eq!(out.themes[0].name, "mixed");
        assert_eq!(out.themes[0].bullets, vec![strong]);
    }

    #[test]
    fn under_cap_untouched() {
        let bullets = vec![bullet("a", 0.5, 1, 1), bullet("b", 0.6, 1, 1)];
        let out = apply_salience_filtering_at(summary(bullets, vec![]), SummaryPeriod::Quarter, now());
        assert_eq!(out.bullets.len(), 2);
    }

    proptest! {
        #[test]
        fn never_exceeds_cap(
            confidences in prop::collection::vec(0.0f64..1.0, 0..60),
            period in prop::sample::select(vec![SummaryPeriod::Week, SummaryPeriod::Month, SummaryPeriod::Quarter]),
        ) {
            let bullets: Vec<SummaryBullet> = confidences
                .iter()
                .enumerate()
                .map(|(i, c)| bullet(&format!("item {i}"), *c, 1, (i % 9) as i64))
                .collect();
            let n = bullets.len();
            let out = apply_salience_filtering_at(summary(bullets, vec![]), period, now());
            prop_assert_eq!(out.bullets.len(), n.min(period.bullet_cap()));
        }
    }
}

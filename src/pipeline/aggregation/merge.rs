use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use super::risk::aggregate_risk_level;
use super::trend::compute_sentiment_trend;
use crate::models::{
    CombinedSummary, DateRange, EntryDigest, EntryId, RiskSummary, SentimentSummary,
    SummaryBullet, SummaryMetadata, SummaryTheme,
};

/// Confidence given to a bullet that only appears inside a theme.
const THEME_ONLY_CONFIDENCE: f64 = 0.5;

/// Dedup key: lowercase alphanumerics only.
pub fn normalize_key(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Bullets in first-seen order, indexed by dedup key.
#[derive(Default)]
struct BulletIndex {
    bullets: Vec<SummaryBullet>,
    by_key: HashMap<String, usize>,
}

impl BulletIndex {
    /// Insert or merge a bullet. Returns its key, or `None` when the text
    /// normalizes to nothing.
    fn upsert(
        &mut self,
        text: &str,
        source: EntryId,
        timestamp: DateTime<Utc>,
        confidence: f64,
    ) -> Option<String> {
        let key = normalize_key(text);
        if key.is_empty() {
            return None;
        }
        match self.by_key.get(&key).copied() {
            Some(i) => {
                let existing = &mut self.bullets[i];
                existing.source_ids.insert(source);
                existing.confidence = existing.confidence.max(confidence);
                existing.timestamp = existing.timestamp.max(timestamp);
            }
            None => {
                self.by_key.insert(key.clone(), self.bullets.len());
                self.bullets.push(SummaryBullet {
                    text: text.trim().to_string(),
                    source_ids: BTreeSet::from([source]),
                    timestamp,
                    confidence,
                });
            }
        }
        Some(key)
    }
}

struct ThemeAcc {
    name: String,
    keys: Vec<String>,
}

/// Merge per-entry digests into one combined summary.
///
/// Digests are processed in timestamp order. Equivalent bullets collapse
/// into one whose `source_ids` is the union of every contributing entry.
/// No filtering happens here; see `apply_salience_filtering`.
pub fn merge_summaries(digests: &[EntryDigest]) -> CombinedSummary {
    let mut ordered: Vec<&EntryDigest> = digests.iter().collect();
    ordered.sort_by_key(|d| d.timestamp);

    let mut index = BulletIndex::default();
    let mut themes: Vec<ThemeAcc> = Vec::new();
    let mut theme_by_key: HashMap<String, usize> = HashMap::new();
    let mut flags = BTreeSet::new();
    let mut topics: Vec<String> = Vec::new();

    for digest in &ordered {
        for bullet in &digest.bullets {
            index.upsert(&bullet.text, digest.entry_id, digest.timestamp, bullet.confidence);
        }

        for theme in &digest.themes {
            let theme_key = normalize_key(&theme.name);
            if theme_key.is_empty() {
                continue;
            }
            let slot = *theme_by_key.entry(theme_key).or_insert_with(|| {
                themes.push(ThemeAcc {
                    name: theme.name.trim().to_string(),
                    keys: Vec::new(),
                });
                themes.len() - 1
            });
            for text in &theme.bullets {
                let Some(key) = index.upsert(
                    text,
                    digest.entry_id,
                    digest.timestamp,
                    THEME_ONLY_CONFIDENCE,
                ) else {
                    continue;
                };
                if !themes[slot].keys.contains(&key) {
                    themes[slot].keys.push(key);
                }
            }
        }

        flags.extend(digest.risk_flags.iter().copied());

        for topic in &digest.topics {
            let topic = topic.trim();
            if !topic.is_empty() && !topics.iter().any(|t| t.to_lowercase() == topic.to_lowercase()) {
                topics.push(topic.to_string());
            }
        }
    }

    let total = index.bullets.len();
    let mut themes: Vec<SummaryTheme> = themes
        .into_iter()
        .map(|acc| {
            let bullets: Vec<SummaryBullet> = acc
                .keys
                .iter()
                .filter_map(|k| index.by_key.get(k).map(|&i| index.bullets[i].clone()))
                .collect();
            let prevalence = if total == 0 {
                0.0
            } else {
                bullets.len() as f64 / total as f64
            };
            SummaryTheme {
                name: acc.name,
                bullets,
                prevalence,
            }
        })
        .collect();
    themes.sort_by(|a, b| {
        b.prevalence
            .total_cmp(&a.prevalence)
            .then_with(|| a.name.cmp(&b.name))
    });

    let scores: Vec<f64> = ordered.iter().map(|d| d.sentiment).collect();
    let overall = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    let date_range = match (ordered.first(), ordered.last()) {
        (Some(first), Some(last)) => Some(DateRange {
            start: first.timestamp,
            end: last.timestamp,
        }),
        _ => None,
    };

    CombinedSummary {
        bullets: index.bullets,
        themes,
        risks: RiskSummary {
            level: aggregate_risk_level(&flags),
            flags,
        },
        sentiment: SentimentSummary {
            overall,
            trend: compute_sentiment_trend(&scores),
        },
        topics,
        metadata: SummaryMetadata {
            entry_count: ordered.len(),
            date_range,
            word_count: ordered.iter().map(|d| d.word_count).sum(),
        },
        narrative: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DigestBullet, DigestTheme, RiskFlag, RiskLevel, SentimentTrend};
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
    }

    fn digest(id: u128, day: u32, bullets: &[(&str, f64)]) -> EntryDigest {
        EntryDigest {
            entry_id: Uuid::from_u128(id),
            timestamp: at(day),
            bullets: bullets
                .iter()
                .map(|(t, c)| DigestBullet {
                    text: t.to_string(),
                    confidence: *c,
                })
                .collect(),
            themes: vec![],
            risk_flags: vec![],
            sentiment: 0.0,
            topics: vec![],
            word_count: 100,
        }
    }

    // =================================================================
    // DEDUP
    // =================================================================

    #[test]
    fn normalize_strips_case_and_punctuation() {
        assert_eq!(normalize_key("Slept poorly!"), "sleptpoorly");
        assert_eq!(normalize_key("  slept   POORLY "), "sleptpoorly");
        assert_eq!(normalize_key("..."), "");
    }

    #[test]
    fn equivalent_bullets_merge() {
        let merged = merge_summaries(&[
            digest(1, 1, &[("Slept poorly.", 0.6)]),
            digest(2, 3, &[("slept poorly", 0.9)]),
        ]);
        assert_eq!(merged.bullets.len(), 1);
        let b = &merged.bullets[0];
        assert_eq!(b.text, "Slept poorly.");
        assert_eq!(b.confidence, 0.9);
        assert_eq!(b.timestamp, at(3));
        assert_eq!(
            b.source_ids,
            BTreeSet::from([Uuid::from_u128(1), Uuid::from_u128(2)])
        );
    }

    #[test]
    fn punctuation_only_bullet_skipped() {
        let merged = merge_summaries(&[digest(1, 1, &[("...", 0.9), ("walked", 0.5)])]);
        assert_eq!(merged.bullets.len(), 1);
    }

    #[test]
    fn digests_ordered_by_timestamp() {
        let merged = merge_summaries(&[
            digest(2, 5, &[("later", 0.5)]),
            digest(1, 1, &[("earlier", 0.5)]),
        ]);
        assert_eq!(merged.bullets[0].text, "earlier");
        let range = merged.metadata.date_range.unwrap();
        assert_eq!(range.start, at(1));
        assert_eq!(range.end, at(5));
    }

    // =================================================================
    // THEMES
    // =================================================================

    #[test]
    fn themes_combined_by_name_with_prevalence() {
        let mut a = digest(1, 1, &[("Slept poorly", 0.8), ("Walked daily", 0.7)]);
        a.themes = vec![DigestTheme {
            name: "Sleep".into(),
            bullets: vec!["Slept poorly".into()],
        }];
        let mut b = digest(2, 2, &[("Woke at 4am", 0.8), ("Felt calm", 0.6)]);
        b.themes = vec![
            DigestTheme {
                name: "sleep".into(),
                bullets: vec!["Woke at 4am".into()],
            },
            DigestTheme {
                name: "mood".into(),
                bullets: vec!["Felt calm".into()],
            },
        ];

        let merged = merge_summaries(&[a, b]);
        assert_eq!(merged.themes.len(), 2);
        assert_eq!(merged.themes[0].name, "Sleep");
        assert_eq!(merged.themes[0].bullets.len(), 2);
        assert_eq!(merged.themes[0].prevalence, 0.5);
        assert_eq!(merged.themes[1].name, "mood");
        assert_eq!(merged.themes[1].prevalence, 0.25);
    }

    #[test]
    fn theme_only_bullet_added_at_half_confidence() {
        let mut d = digest(1, 1, &[]);
        d.themes = vec![DigestTheme {
            name: "work".into(),
            bullets: vec!["Deadline pressure".into()],
        }];
        let merged = merge_summaries(&[d]);
        assert_eq!(merged.bullets.len(), 1);
        assert_eq!(merged.bullets[0].confidence, THEME_ONLY_CONFIDENCE);
        assert_eq!(merged.themes[0].prevalence, 1.0);
    }

    #[test]
    fn theme_bullets_carry_full_attribution() {
        let mut a = digest(1, 1, &[("Slept poorly", 0.8)]);
        a.themes = vec![DigestTheme {
            name: "sleep".into(),
            bullets: vec!["Slept poorly".into()],
        }];
        let b = digest(2, 2, &[("slept poorly", 0.8)]);
        let merged = merge_summaries(&[a, b]);
        assert_eq!(merged.themes[0].bullets[0].source_ids.len(), 2);
    }

    #[test]
    fn equal_prevalence_sorted_by_name() {
        let mut d = digest(1, 1, &[("a", 0.5), ("b", 0.5)]);
        d.themes = vec![
            DigestTheme {
                name: "zeta".into(),
                bullets: vec!["a".into()],
            },
            DigestTheme {
                name: "alpha".into(),
                bullets: vec!["b".into()],
            },
        ];
        let merged = merge_summaries(&[d]);
        assert_eq!(merged.themes[0].name, "alpha");
    }

    // =================================================================
    // RISK, SENTIMENT, TOPICS, METADATA
    // =================================================================

    #[test]
    fn risk_flags_unioned() {
        let mut a = digest(1, 1, &[]);
        a.risk_flags = vec![RiskFlag::ClinicalReviewRequired];
        let mut b = digest(2, 2, &[]);
        b.risk_flags = vec![RiskFlag::SelfHarm, RiskFlag::ClinicalReviewRequired];
        let merged = merge_summaries(&[a, b]);
        assert_eq!(merged.risks.flags.len(), 2);
        assert_eq!(merged.risks.level, RiskLevel::High);
    }

    #[test]
    fn sentiment_averaged_and_trended() {
        let digests: Vec<EntryDigest> = [-0.8, -0.2, 0.4]
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut d = digest(i as u128, i as u32 + 1, &[]);
                d.sentiment = *s;
                d
            })
            .collect();
        let merged = merge_summaries(&digests);
        assert!((merged.sentiment.overall - (-0.2)).abs() < 1e-9);
        assert_eq!(merged.sentiment.trend, SentimentTrend::Improving);
    }

    #[test]
    fn topics_first_seen_case_insensitive() {
        let mut a = digest(1, 1, &[]);
        a.topics = vec!["Sleep".into(), "work".into()];
        let mut b = digest(2, 2, &[]);
        b.topics = vec!["WORK".into(), "family".into(), " ".into()];
        let merged = merge_summaries(&[a, b]);
        assert_eq!(merged.topics, vec!["Sleep", "work", "family"]);
    }

    #[test]
    fn metadata_totals() {
        let merged = merge_summaries(&[digest(1, 1, &[]), digest(2, 2, &[])]);
        assert_eq!(merged.metadata.entry_count, 2);
        assert_eq!(merged.metadata.word_count, 200);
    }

    #[test]
    fn empty_input() {
        let merged = merge_summaries(&[]);
        assert!(merged.bullets.is_empty());
        assert_eq!(merged.metadata.entry_count, 0);
        assert!(merged.metadata.date_range.is_none());
        assert_eq!(merged.sentiment.overall, 0.0);
        assert_eq!(merged.sentiment.trend, SentimentTrend::Stable);
        assert_eq!(merged.risks.level, RiskLevel::None);
    }

    // =================================================================
    // PROPERTIES
    // =================================================================

    proptest! {
        #[test]
        fn attribution_preserved(
            entries in prop::collection::vec(
                prop::collection::vec(prop::sample::select(vec!["sleep", "Sleep.", "work", "walk", "WALK!"]), 0..5),
                1..8,
            )
        ) {
            let digests: Vec<EntryDigest> = entries
                .iter()
                .enumerate()
                .map(|(i, texts)| {
                    let mut d = digest(i as u128, 1, &[]);
                    d.timestamp = at(1) + Duration::hours(i as i64);
                    d.bullets = texts
                        .iter()
                        .map(|t| DigestBullet { text: t.to_string(), confidence: 0.5 })
                        .collect();
                    d
                })
                .collect();

            let merged = merge_summaries(&digests);

            let expected: BTreeSet<Uuid> = digests
                .iter()
                .filter(|d| !d.bullets.is_empty())
                .map(|d| d.entry_id)
                .collect();
            let actual: BTreeSet<Uuid> = merged
                .bullets
                .iter()
                .flat_map(|b| b.source_ids.iter().copied())
                .collect();
            prop_assert_eq!(actual, expected);

            for digest in &digests {
                for bullet in &digest.bullets {
                    let key = normalize_key(&bullet.text);
                    let merged_bullet = merged.bullets.iter().find(|b| normalize_key(&b.text) == key);
                    prop_assert!(merged_bullet.is_some_and(|b| b.source_ids.contains(&digest.entry_id)));
                }
            }
        }
    }
}

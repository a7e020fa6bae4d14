//! Clinical-risk keyword scan.
//!
//! The scan answers one question: does this text need clinical review?
//! It never reports which keyword matched or how many did, so the audit
//! trail cannot reproduce the trigger phrase.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::RiskFlag;

/// Trigger phrases grouped by category. Multi-word phrases match across any
/// run of whitespace.
static RISK_PHRASES: &[&[&str]] = &[
    // Self-harm
    &[
        "suicide", "suicidal", "kill myself", "killing myself", "end my life",
        "ending my life", "self-harm", "self harm", "harm myself", "hurt myself",
        "hurting myself", "cut myself", "cutting myself", "want to die",
        "better off dead", "no reason to live",
    ],
    // Violence
    &[
        "hurt someone", "hurt somebody", "kill him", "kill her", "kill them",
        "violent", "violence", "weapon", "gun", "knife",
    ],
    // Substance use
    &[
        "overdose", "overdosed", "relapse", "relapsed", "drunk", "blackout",
        "high on", "cocaine", "heroin", "meth", "opioids", "fentanyl",
    ],
    // Abuse
    &[
        "abuse", "abused", "abusive", "assault", "assaulted", "hit me",
        "beat me", "rape", "raped", "molested",
    ],
];

/// All phrases compiled into one case-insensitive alternation. A single
/// `is_match` stops at the first hit.
static RISK_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = RISK_PHRASES
        .iter()
        .flat_map(|group| group.iter())
        .map(|phrase| {
            phrase
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("valid risk keyword regex")
});

/// True if `text` contains any clinical-risk phrase.
pub fn contains_risk_keyword(text: &str) -> bool {
    RISK_RE.is_match(text)
}

/// Scan `text` for clinical-risk phrases.
///
/// Returns at most one `ClinicalReviewRequired` flag, however many phrases
/// appear.
pub fn detect_risk(text: &str) -> Vec<RiskFlag> {
    if contains_risk_keyword(text) {
        vec![RiskFlag::ClinicalReviewRequired]
    } else {
        Vec::new()
    }
}

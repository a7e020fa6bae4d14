//! Pattern-based identifier redaction.
//!
//! Best-effort de-identification: the name heuristic (two capitalized words
//! in a row) both over- and under-redacts. Stricter detectors plug in through
//! the `Redactor` trait.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::keywords;
use crate::models::RiskFlag;

/// Kind of identifier a pattern recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentifierKind {
    Phone,
    Email,
    Address,
    Name,
}

impl IdentifierKind {
    /// Placeholder substituted for a redacted span.
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::Phone => "[PHONE]",
            Self::Email => "[EMAIL]",
            Self::Address => "[ADDRESS]",
            Self::Name => "[NAME]",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Address => "address",
            Self::Name => "name",
        }
    }
}

/// Redaction and risk detection strategy applied before text leaves the
/// trust boundary.
pub trait Redactor: Send + Sync {
    /// Replace identifier-shaped spans with placeholders. Must be idempotent.
    fn redact(&self, text: &str) -> String;

    /// Clinical-risk scan; at most one flag per call.
    fn detect_risk(&self, text: &str) -> Vec<RiskFlag>;

    /// First identifier kind found in `text`, if any.
    fn find_identifier(&self, text: &str) -> Option<IdentifierKind>;
}

/// Default strategy: an ordered chain of regex substitutions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternRedactor;

struct IdentifierPattern {
    kind: IdentifierKind,
    regex: Regex,
}

fn pattern(kind: IdentifierKind, regex_str: &str) -> IdentifierPattern {
    IdentifierPattern {
        kind,
        regex: Regex::new(regex_str).expect("Invalid identifier regex pattern"),
    }
}

/// Applied in order. Addresses run before names because street names are
/// capitalized too. No placeholder matches any pattern, which keeps the
/// chain idempotent.
static IDENTIFIER_PATTERNS: LazyLock<Vec<IdentifierPattern>> = LazyLock::new(|| {
    vec![
        pattern(
            IdentifierKind::Phone,
            r"(?:\+?1[-.\s]?)?(?:\(\d{3}\)|\b\d{3})[-.\s]?\d{3}[-.\s]?\d{4}\b",
        ),
        pattern(
            IdentifierKind::Email,
            r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
        ),
        pattern(
            IdentifierKind::Address,
            r"\b\d{1,5}\s+(?:[A-Z][a-z]+\s+){1,3}(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|Court|Ct|Way|Place|Pl|Terrace)\b\.?",
        ),
        pattern(IdentifierKind::Name, r"\b[A-Z][a-z]+\s+[A-Z][a-z]+\b"),
    ]
});

/// Zero-width, bidi-control and other invisible code points. Left in place
/// they split an identifier so no pattern sees it whole.
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{2069}'
            | '\u{FEFF}'
            | '\u{00AD}'
            | '\u{034F}'
            | '\u{061C}'
            | '\u{180E}'
    )
}

fn strip_invisible(text: &str) -> String {
    text.chars().filter(|&c| !is_invisible(c)).collect()
}

impl Redactor for PatternRedactor {
    fn redact(&self, text: &str) -> String {
        let mut result = strip_invisible(text);
        for ip in IDENTIFIER_PATTERNS.iter() {
            result = ip
                .regex
                .replace_all(&result, ip.kind.placeholder())
                .into_owned();
        }
        result
    }

    fn detect_risk(&self, text: &str) -> Vec<RiskFlag> {
        keywords::detect_risk(text)
    }

    fn find_identifier(&self, text: &str) -> Option<IdentifierKind> {
        let text = strip_invisible(text);
        IDENTIFIER_PATTERNS
            .iter()
            .find(|ip| ip.regex.is_match(&text))
            .map(|ip| ip.kind)
    }
}

/// Redact with the default pattern chain.
pub fn redact(text: &str) -> String {
    PatternRedactor.redact(text)
}

/// True when provider output carries no identifier-shaped pattern.
pub fn validate_summary_content(text: &str) -> bool {
    PatternRedactor.find_identifier(text).is_none()
}

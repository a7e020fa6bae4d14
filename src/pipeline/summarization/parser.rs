use std::str::FromStr;

use serde::Deserialize;

use super::SummaryError;
use crate::models::{DigestBullet, DigestTheme, RiskFlag};

const MAX_KEY_THEMES: usize = 5;
const DEFAULT_CONFIDENCE: f64 = 0.7;

/// Summary text and themes read from a per-entry summary response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSummary {
    pub summary: String,
    pub key_themes: Vec<String>,
}

/// Structured digest fields read from a digest response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDigest {
    pub bullets: Vec<DigestBullet>,
    pub themes: Vec<DigestTheme>,
    pub sentiment: f64,
    pub topics: Vec<String>,
    pub risk_flags: Vec<RiskFlag>,
}

/// Slice from the first `{` to the last `}`, if both exist in that order.
fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end > start).then(|| &response[start..=end])
}

/// Parse a per-entry summary. Models that ignore the JSON instruction still
/// produce usable prose, so non-JSON output becomes the summary as-is.
pub fn parse_summary_response(response: &str) -> Result<ParsedSummary, SummaryError> {
    #[derive(Deserialize)]
    struct RawSummary {
        summary: String,
        #[serde(default, alias = "keyThemes")]
        key_themes: Vec<String>,
    }

    let parsed = extract_json_object(response)
        .and_then(|json| serde_json::from_str::<RawSummary>(json).ok());

    let (summary, themes) = match parsed {
        Some(raw) => (raw.summary, raw.key_themes),
        None => (response.to_string(), Vec::new()),
    };

    let summary = summary.trim().to_string();
    if summary.is_empty() {
        return Err(SummaryError::MalformedResponse("empty summary".into()));
    }

    Ok(ParsedSummary {
        summary,
        key_themes: clean_themes(themes),
    })
}

fn clean_themes(themes: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for theme in themes {
        let theme = theme.trim();
        if theme.is_empty() || out.iter().any(|t| t.eq_ignore_ascii_case(theme)) {
            continue;
        }
        out.push(theme.to_string());
        if out.len() == MAX_KEY_THEMES {
            break;
        }
    }
    out
}

/// Parse a structured digest. Unlike summaries there is no prose fallback:
/// a digest that does not parse is a generation failure.
pub fn parse_digest_response(response: &str) -> Result<ParsedDigest, SummaryError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawBullet {
        Plain(String),
        Scored {
            text: String,
            #[serde(default)]
            confidence: Option<f64>,
        },
    }

    #[derive(Deserialize)]
    struct RawTheme {
        name: String,
        #[serde(default)]
        bullets: Vec<String>,
    }

    #[derive(Deserialize)]
    struct RawDigest {
        #[serde(default)]
        bullets: Vec<RawBullet>,
        #[serde(default)]
        themes: Vec<RawTheme>,
        #[serde(default)]
        sentiment: Option<f64>,
        #[serde(default)]
        topics: Vec<String>,
        #[serde(default, alias = "riskFlags")]
        risk_flags: Vec<String>,
    }

    let json = extract_json_object(response)
        .ok_or_else(|| SummaryError::MalformedResponse("No JSON object found".into()))?;
    let raw: RawDigest =
        serde_json::from_str(json).map_err(|e| SummaryError::MalformedResponse(e.to_string()))?;

    let bullets = raw
        .bullets
        .into_iter()
        .filter_map(|b| {
            let (text, confidence) = match b {
                RawBullet::Plain(text) => (text, None),
                RawBullet::Scored { text, confidence } => (text, confidence),
            };
            let text = text.trim().to_string();
            (!text.is_empty()).then(|| DigestBullet {
                text,
                confidence: clamp_confidence(confidence),
            })
        })
        .collect();

    let themes = raw
        .themes
        .into_iter()
        .filter(|t| !t.name.trim().is_empty())
        .map(|t| DigestTheme {
            name: t.name.trim().to_string(),
            bullets: t
                .bullets
                .into_iter()
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty())
                .collect(),
        })
        .collect();

    let mut risk_flags: Vec<RiskFlag> = raw
        .risk_flags
        .iter()
        .filter_map(|f| parse_risk_flag(f))
        .collect();
    risk_flags.sort();
    risk_flags.dedup();

    Ok(ParsedDigest {
        bullets,
        themes,
        sentiment: clamp_sentiment(raw.sentiment),
        topics: raw
            .topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        risk_flags,
    })
}

fn clamp_confidence(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
        _ => DEFAULT_CONFIDENCE,
    }
}

fn clamp_sentiment(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.clamp(-1.0, 1.0),
        _ => 0.0,
    }
}

/// Accepts "SELF_HARM", "self-harm", "Self harm". Unknown labels yield `None`.
fn parse_risk_flag(label: &str) -> Option<RiskFlag> {
    let normalized: String = label
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect();
    RiskFlag::from_str(&normalized).ok()
}

use std::time::Duration;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "journal-digest";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Wall-clock budget for a single provider call.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(45);

/// Maximum plain-text characters of an entry sent to the provider.
pub const MAX_CONTENT_CHARS: usize = 10_000;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub const DEFAULT_RATE_LIMIT: u32 = 30;
pub const DEFAULT_RATE_WINDOW_SECS: u64 = 3600;

const ENV_API_KEY: &str = "JOURNAL_DIGEST_API_KEY";
const ENV_BASE_URL: &str = "JOURNAL_DIGEST_BASE_URL";
const ENV_MODEL: &str = "JOURNAL_DIGEST_MODEL";
const ENV_RATE_LIMIT: &str = "JOURNAL_DIGEST_RATE_LIMIT";
const ENV_RATE_WINDOW: &str = "JOURNAL_DIGEST_RATE_WINDOW_SECS";

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "info,journal_digest=debug"
    } else {
        "info"
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Connection settings for the completion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl ProviderConfig {
    /// Read provider settings from the environment.
    ///
    /// Returns `None` when no API key is set, which callers surface as
    /// "provider unavailable" before doing any work.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let api_key = lookup(ENV_API_KEY).filter(|k| !k.trim().is_empty())?;
        Some(Self {
            api_key,
            base_url: lookup(ENV_BASE_URL)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: lookup(ENV_MODEL)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

/// Per-key request quota for provider calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_RATE_LIMIT,
            window: Duration::from_secs(DEFAULT_RATE_WINDOW_SECS),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_RATE_LIMIT) {
            config.max_requests = parse_positive(ENV_RATE_LIMIT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_RATE_WINDOW) {
            config.window = Duration::from_secs(parse_positive(ENV_RATE_WINDOW, &raw)?);
        }
        Ok(config)
    }
}

fn parse_positive<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match raw.trim().parse::<T>() {
        Ok(v) if v > T::default() => Ok(v),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn provider_absent_without_key() {
        assert_eq!(ProviderConfig::from_lookup(env(&[])), None);
        assert_eq!(
            ProviderConfig::from_lookup(env(&[("JOURNAL_DIGEST_API_KEY", "  ")])),
            None
        );
    }

    #[test]
    fn provider_defaults_applied() {
        let config = ProviderConfig::from_lookup(env(&[("JOURNAL_DIGEST_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn provider_overrides_read() {
        let config = ProviderConfig::from_lookup(env(&[
            ("JOURNAL_DIGEST_API_KEY", "sk-test"),
            ("JOURNAL_DIGEST_BASE_URL", "http://localhost:8080"),
            ("JOURNAL_DIGEST_MODEL", "local-model"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.model, "local-model");
    }

    #[test]
    fn rate_limit_defaults() {
        let config = RateLimitConfig::from_lookup(env(&[])).unwrap();
        assert_eq!(config, RateLimitConfig::default());
    }

    #[test]
    fn rate_limit_overrides() {
        let config = RateLimitConfig::from_lookup(env(&[
            ("JOURNAL_DIGEST_RATE_LIMIT", "5"),
            ("JOURNAL_DIGEST_RATE_WINDOW_SECS", "60"),
        ]))
        .unwrap();
        assert_eq!(config.max_requests, 5);
        assert_eq!(config.window, Duration::from_secs(60));
    }

    #[test]
    fn rate_limit_rejects_garbage() {
        let err = RateLimitConfig::from_lookup(env(&[("JOURNAL_DIGEST_RATE_LIMIT", "lots")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "JOURNAL_DIGEST_RATE_LIMIT",
                value: "lots".into()
            }
        );
        assert!(RateLimitConfig::from_lookup(env(&[("JOURNAL_DIGEST_RATE_WINDOW_SECS", "0")])).is_err());
    }

    #[test]
    fn provider_timeout_is_45_seconds() {
        assert_eq!(PROVIDER_TIMEOUT, Duration::from_secs(45));
    }

    #[test]
    fn app_name_is_journal_digest() {
        assert_eq!(APP_NAME, "journal-digest");
    }
}

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::config::RateLimitConfig;

/// Outcome of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Calls left in the current window after this one.
    pub remaining: u32,
    /// When the oldest counted call leaves the window.
    pub reset_time: DateTime<Utc>,
}

/// Per-user quota store. `check_and_consume` must check and increment as one
/// atomic step.
pub trait RateLimitStore: Send + Sync {
    fn check_and_consume(&self, key: &str) -> RateLimitDecision;
}

/// Sliding-window limiter kept in process memory.
pub struct InMemoryRateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, Vec<Instant>>>,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn reset_after(&self, oldest: Option<Instant>, now: Instant) -> DateTime<Utc> {
        let wait = oldest
            .map(|ts| (ts + self.config.window).saturating_duration_since(now))
            .unwrap_or(self.config.window);
        Utc::now() + chrono::Duration::from_std(wait).unwrap_or(chrono::Duration::zero())
    }
}

#[cfg(test)]
impl InMemoryRateLimiter {
    fn tracked_keys(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl RateLimitStore for InMemoryRateLimiter {
    fn check_and_consume(&self, key: &str) -> RateLimitDecision {
        let now = Instant::now();
        // A panic while holding the lock leaves the map consistent.
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Expire old calls for every key and drop keys left with none, so
        // the map only holds users active within the window.
        let window: Duration = self.config.window;
        windows.retain(|_, stamps| {
            stamps.retain(|ts| now.duration_since(*ts) < window);
            !stamps.is_empty()
        });

        let entries = windows.entry(key.to_string()).or_default();
        let used = entries.len() as u32;
        if used >= self.config.max_requests {
            let decision = RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_time: self.reset_after(entries.first().copied(), now),
            };
            if entries.is_empty() {
                windows.remove(key);
            }
            return decision;
        }

        entries.push(now);
        RateLimitDecision {
            allowed: true,
            remaining: self.config.max_requests - used - 1,
            reset_time: self.reset_after(entries.first().copied(), now),
        }
    }
}

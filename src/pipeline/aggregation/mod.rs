//! Combine per-entry digests into one bounded summary.
//!
//! merge → risk level + sentiment trend → salience filter

pub mod merge;
pub mod risk;
pub mod salience;
pub mod trend;

pub use merge::{merge_summaries, normalize_key};
pub use risk::aggregate_risk_level;
pub use salience::{apply_salience_filtering, apply_salience_filtering_at, importance_score};
pub use trend::{compute_sentiment_trend, least_squares_slope};

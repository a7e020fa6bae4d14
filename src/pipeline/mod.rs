pub mod content; // Document validation + plain-text extraction
pub mod safety; // Redaction, risk scan, output cleanup
pub mod summarization; // Provider calls, per-entry and combined summaries
pub mod aggregation; // Merge, trend, salience

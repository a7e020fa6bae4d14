pub mod keywords;
pub mod output_sanitize;
pub mod redact;

pub use keywords::{contains_risk_keyword, detect_risk};
pub use output_sanitize::sanitize_llm_output;
pub use redact::{redact, validate_summary_content, IdentifierKind, PatternRedactor, Redactor};

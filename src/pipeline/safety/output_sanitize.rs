//! Post-provider output cleanup.
//!
//! Strips model artifacts (reasoning blocks, code fences) before the output
//! is parsed and checked for identifiers.

use std::sync::LazyLock;

use regex::Regex;

/// Strip model-specific artifacts from raw provider output.
///
/// Handles:
/// 1. Reasoning blocks (`<think>...</think>`), closed or left open
/// 2. A Markdown code fence wrapping the whole answer
/// 3. Leading/trailing whitespace left by stripping
pub fn sanitize_llm_output(raw: &str) -> String {
    static THINK_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<think>.*?(?:</think>|\z)").expect("valid regex")
    });
    static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)\A\s*```[A-Za-z]*\s*\n(.*?)\n?\s*```\s*\z").expect("valid regex")
    });

    let text = THINK_BLOCK_RE.replace_all(raw, "");
    let text = match FENCE_RE.captures(&text) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()).to_string(),
        None => text.into_owned(),
    };

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_reasoning_block() {
        let raw = "<think>The writer mentions sleep...</think>\nSleep was poor this week.";
        assert_eq!(sanitize_llm_output(raw), "Sleep was poor this week.");
    }

    #[test]
    fn strips_unterminated_reasoning_block() {
        assert_eq!(sanitize_llm_output("<think>still thinking"), "");
    }

    #[test]
    fn unwraps_json_fence() {
        let raw = "```json\n{\"summary\": \"ok\"}\n```";
        assert_eq!(sanitize_llm_output(raw), "{\"summary\": \"ok\"}");
    }

    #[test]
    fn unwraps_bare_fence() {
        let raw = "  ```\nplain answer\n```  ";
        assert_eq!(sanitize_llm_output(raw), "plain answer");
    }

    #[test]
    fn clean_text_unchanged() {
        let text = "Mood improved after the weekend.";
        assert_eq!(sanitize_llm_output(text), text);
    }

    #[test]
    fn inner_fence_left_in_place() {
        let text = "Summary:\n```\ncode\n```\nDone.";
        assert_eq!(sanitize_llm_output(text), text);
    }

    #[test]
    fn whitespace_only_returns_empty() {
        assert_eq!(sanitize_llm_output("   \n  "), "");
    }
}

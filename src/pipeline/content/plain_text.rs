//! Flatten entry content to plain text for redaction and prompting.
//!
//! Read-only: markup is pattern-stripped, never parsed or rendered.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::models::EntryContent;

/// Node types whose inline text forms one block of output.
const TEXT_BLOCK_TYPES: &[&str] = &["paragraph", "heading", "codeBlock"];

/// Flatten entry content to plain text.
///
/// Trees: paragraph-level blocks are separated by a blank line, list items
/// and quotes are flattened in document order, hard breaks become newlines.
/// Markup: tags are stripped and whitespace collapsed.
pub fn to_plain_text(content: &EntryContent) -> String {
    match content {
        EntryContent::Document(tree) => tree_to_plain_text(tree),
        EntryContent::Markup(markup) => markup_to_plain_text(markup),
    }
}

pub fn tree_to_plain_text(tree: &Value) -> String {
    let mut blocks = Vec::new();
    collect_blocks(tree, &mut blocks);
    blocks.join("\n\n")
}

/// Walks with an explicit stack, like `validate_content`, so any tree the
/// validator accepts flattens without deep recursion.
fn collect_blocks(root: &Value, blocks: &mut Vec<String>) {
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        let node_type = node_type(node);

        if TEXT_BLOCK_TYPES.contains(&node_type) {
            let mut inline = String::new();
            collect_inline(node, &mut inline);
            push_block(blocks, &inline);
            continue;
        }

        match node_type {
            "text" => {
                if let Some(text) = node.get("text").and_then(Value::as_str) {
                    push_block(blocks, text);
                }
            }
            "horizontalRule" | "hardBreak" => {}
            _ => stack.extend(children(node).rev()),
        }
    }
}

fn collect_inline(block: &Value, out: &mut String) {
    let mut stack: Vec<&Value> = children(block).rev().collect();

    while let Some(node) = stack.pop() {
        match node_type(node) {
            "text" => {
                if let Some(text) = node.get("text").and_then(Value::as_str) {
                    out.push_str(text);
                }
            }
            "hardBreak" => out.push('\n'),
            _ => stack.extend(children(node).rev()),
        }
    }
}

fn node_type(node: &Value) -> &str {
    node.get("type").and_then(Value::as_str).unwrap_or_default()
}

fn children(node: &Value) -> impl DoubleEndedIterator<Item = &Value> {
    node.get("content")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn push_block(blocks: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        blocks.push(trimmed.to_string());
    }
}

/// Strip all tags from a markup string and collapse whitespace.
pub fn markup_to_plain_text(markup: &str) -> String {
    static SCRIPT_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<(?:script|style)\b[^>]*>.*?</(?:script|style)\s*>").expect("valid regex")
    });
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

    let without_scripts = SCRIPT_STYLE_RE.replace_all(markup, " ");
    let without_tags = TAG_RE.replace_all(&without_scripts, " ");
    let decoded = decode_entities(&without_tags);

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode the handful of entities editors emit. `&amp;` goes last so
/// `&amp;lt;` yields the literal `&lt;`.
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

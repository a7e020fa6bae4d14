//! Allow-list validation of editor document trees.
//!
//! Any node or mark type not listed here is rejected, including types the
//! editor may add in the future.

use serde_json::{Map, Value};

/// Root node type of every document tree.
pub const ROOT_NODE_TYPE: &str = "doc";

/// Node types accepted anywhere below the root.
pub const ALLOWED_NODE_TYPES: &[&str] = &[
    "paragraph",
    "text",
    "heading",
    "bulletList",
    "orderedList",
    "listItem",
    "blockquote",
    "codeBlock",
    "horizontalRule",
    "hardBreak",
];

pub const ALLOWED_MARK_TYPES: &[&str] = &[
    "bold",
    "italic",
    "underline",
    "strike",
    "code",
    "subscript",
    "superscript",
];

/// Check a document tree against the node and mark allow-lists.
///
/// Returns `false` for anything that is not a `doc`-rooted object tree made
/// only of allow-listed nodes and marks. Walks depth-first with an explicit
/// stack and stops at the first violation.
pub fn validate_content(tree: &Value) -> bool {
    let Some(root) = tree.as_object() else {
        return false;
    };
    if node_type(root) != Some(ROOT_NODE_TYPE) {
        return false;
    }

    let mut stack: Vec<&Map<String, Value>> = vec![root];
    let mut is_root = true;

    while let Some(node) = stack.pop() {
        if !is_root && !is_allowed_node(node) {
            return false;
        }
        is_root = false;

        if !marks_allowed(node) {
            return false;
        }
        if matches!(node.get("text"), Some(text) if !text.is_string()) {
            return false;
        }

        match node.get("content") {
            None => {}
            Some(Value::Array(children)) => {
                // Reverse push keeps document order on pop.
                for child in children.iter().rev() {
                    match child.as_object() {
                        Some(obj) => stack.push(obj),
                        None => return false,
                    }
                }
            }
            Some(_) => return false,
        }
    }

    true
}

fn node_type(node: &Map<String, Value>) -> Option<&str> {
    node.get("type").and_then(Value::as_str)
}

fn is_allowed_node(node: &Map<String, Value>) -> bool {
    node_type(node).is_some_and(|t| ALLOWED_NODE_TYPES.contains(&t))
}

fn marks_allowed(node: &Map<String, Value>) -> bool {
    match node.get("marks") {
        None => true,
        Some(Value::Array(marks)) => marks.iter().all(|mark| {
            mark.as_object()
                .and_then(node_type)
                .is_some_and(|t| ALLOWED_MARK_TYPES.contains(&t))
        }),
        Some(_) => false,
    }
}

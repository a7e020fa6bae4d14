use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stored body of a journal entry: a document tree, or the legacy markup
/// string older entries were saved as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryContent {
    Markup(String),
    Document(Value),
}

impl From<&str> for EntryContent {
    fn from(markup: &str) -> Self {
        Self::Markup(markup.to_string())
    }
}

impl From<Value> for EntryContent {
    fn from(tree: Value) -> Self {
        match tree {
            Value::String(markup) => Self::Markup(markup),
            other => Self::Document(other),
        }
    }
}

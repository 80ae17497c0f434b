//! Structural detection of the two stored document shapes.
//!
//! Stored documents carry no reliable discriminant, so classification looks
//! only at shape: a node document is `{ "type": "doc", "content": [...] }`,
//! a block document is `{ "blocks": [...] }`.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Block,
    Node,
    Unrecognized,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Block => "block",
            DocumentFormat::Node => "node",
            DocumentFormat::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a raw stored value. Never fails; anything that is not one of the
/// two schemas is `Unrecognized`.
///
/// A value matching both shapes is treated as a node document.
pub fn classify(value: &Value) -> DocumentFormat {
    if is_node_document(value) {
        DocumentFormat::Node
    } else if is_block_document(value) {
        DocumentFormat::Block
    } else {
        DocumentFormat::Unrecognized
    }
}

fn is_node_document(value: &Value) -> bool {
    value.get("type").and_then(Value::as_str) == Some("doc")
        && value.get("content").is_some_and(Value::is_array)
}

fn is_block_document(value: &Value) -> bool {
    value.get("blocks").is_some_and(Value::is_array)
}

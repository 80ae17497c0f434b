//! Stored content documents in their two persisted shapes.
//!
//! Documents arrive as opaque JSON written by external authoring tools.
//! Decoding is lenient: missing or mistyped fields fall back to empty values
//! so drafts and partial saves still render as much as can be understood.

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::Error as _,
    ser::SerializeStruct,
};
use serde_json::{Map, Value};

use super::error::DomainError;
use super::format::{DocumentFormat, classify};

/// Heading level used when a document omits one.
pub const DEFAULT_HEADING_LEVEL: i64 = 2;

/// A stored document in either schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Block(BlockDocument),
    Node(NodeDocument),
}

impl Document {
    /// Decode a raw value, returning `None` when it matches neither schema.
    pub fn from_value(value: &Value) -> Option<Self> {
        match classify(value) {
            DocumentFormat::Block => Some(Self::Block(BlockDocument::from_value(value))),
            DocumentFormat::Node => Some(Self::Node(NodeDocument::from_value(value))),
            DocumentFormat::Unrecognized => None,
        }
    }

    pub fn try_from_value(value: &Value) -> Result<Self, DomainError> {
        Self::from_value(value).ok_or(DomainError::UnrecognizedFormat)
    }

    pub fn format(&self) -> DocumentFormat {
        match self {
            Document::Block(_) => DocumentFormat::Block,
            Document::Node(_) => DocumentFormat::Node,
        }
    }
}

/// Heading level as presented: 2, 3 or 4. Anything else displays as 4.
pub fn display_level(level: i64) -> u8 {
    match level {
        2 => 2,
        3 => 3,
        _ => 4,
    }
}

// ---------------------------------------------------------------------------
// Block schema
// ---------------------------------------------------------------------------

/// The older flat schema: an ordered list of typed blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockDocument {
    pub blocks: Vec<Block>,
    pub version: Option<String>,
}

impl BlockDocument {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            version: None,
        }
    }

    /// Lenient decode; a value without a `blocks` array yields no blocks.
    pub fn from_value(value: &Value) -> Self {
        let blocks = value
            .get("blocks")
            .and_then(Value::as_array)
            .map(|blocks| blocks.iter().map(Block::from_value).collect())
            .unwrap_or_default();

        Self {
            blocks,
            version: string_field(value, "version"),
        }
    }
}

impl<'de> Deserialize<'de> for BlockDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match classify(&value) {
            DocumentFormat::Block => Ok(Self::from_value(&value)),
            found => Err(D::Error::custom(DomainError::unexpected(
                DocumentFormat::Block,
                found,
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: Option<String>,
    pub kind: BlockKind,
}

impl Block {
    pub fn new(kind: BlockKind) -> Self {
        Self { id: None, kind }
    }

    pub fn from_value(value: &Value) -> Self {
        let empty = Map::new();
        let data = value
            .get("data")
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        let type_name = value.get("type").and_then(Value::as_str).unwrap_or_default();

        let kind = match type_name {
            "header" => BlockKind::Header {
                level: data
                    .get("level")
                    .and_then(integer_value)
                    .unwrap_or(DEFAULT_HEADING_LEVEL),
                text: text_field(data, "text"),
            },
            "paragraph" => BlockKind::Paragraph {
                text: text_field(data, "text"),
            },
            "list" => BlockKind::List {
                style: ListStyle::from_name(data.get("style").and_then(Value::as_str)),
                items: list_items(data.get("items")),
            },
            "code" => BlockKind::Code {
                code: text_field(data, "code"),
                language: non_empty(data.get("language").and_then(Value::as_str)),
            },
            "quote" => BlockKind::Quote {
                text: text_field(data, "text"),
                caption: non_empty(data.get("caption").and_then(Value::as_str)),
            },
            "delimiter" => BlockKind::Delimiter,
            "image" => BlockKind::Image {
                url: image_url(data),
                caption: non_empty(data.get("caption").and_then(Value::as_str)),
            },
            other => BlockKind::Unknown {
                type_name: other.to_string(),
            },
        };

        Self {
            id: string_field(value, "id"),
            kind,
        }
    }

    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    /// `text` carries inline markup.
    Header { level: i64, text: String },
    Paragraph { text: String },
    List { style: ListStyle, items: Vec<ListItem> },
    Code { code: String, language: Option<String> },
    Quote { text: String, caption: Option<String> },
    Delimiter,
    Image { url: String, caption: Option<String> },
    /// A block type this crate does not know; rendered as nothing.
    Unknown { type_name: String },
}

impl BlockKind {
    pub fn type_name(&self) -> &str {
        match self {
            BlockKind::Header { .. } => "header",
            BlockKind::Paragraph { .. } => "paragraph",
            BlockKind::List { .. } => "list",
            BlockKind::Code { .. } => "code",
            BlockKind::Quote { .. } => "quote",
            BlockKind::Delimiter => "delimiter",
            BlockKind::Image { .. } => "image",
            BlockKind::Unknown { type_name } => type_name.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStyle {
    Ordered,
    Unordered,
}

impl ListStyle {
    fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("ordered") => ListStyle::Ordered,
            _ => ListStyle::Unordered,
        }
    }
}

/// A list entry: inline markup plus an optional nested list of the same style.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListItem {
    pub content: String,
    pub items: Vec<ListItem>,
}

impl ListItem {
    pub fn leaf(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            items: Vec::new(),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(content) => Some(Self::leaf(content.as_str())),
            Value::Object(fields) => Some(Self {
                content: text_field(fields, "content"),
                items: list_items(fields.get("items")),
            }),
            _ => None,
        }
    }
}

fn list_items(value: Option<&Value>) -> Vec<ListItem> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(ListItem::from_value).collect())
        .unwrap_or_default()
}

fn image_url(data: &Map<String, Value>) -> String {
    data.get("file")
        .and_then(|file| file.get("url"))
        .and_then(Value::as_str)
        .or_else(|| data.get("url").and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

// ---------------------------------------------------------------------------
// Node schema
// ---------------------------------------------------------------------------

/// The newer recursive schema with structured inline marks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDocument {
    pub content: Vec<Node>,
}

impl NodeDocument {
    pub fn new(content: Vec<Node>) -> Self {
        Self { content }
    }

    /// Lenient decode; non-object entries of `content` are dropped.
    pub fn from_value(value: &Value) -> Self {
        Self {
            content: node_list(value.get("content")),
        }
    }

    pub fn to_value(&self) -> Value {
        let content = self.content.iter().map(Node::to_value).collect();
        let mut fields = Map::new();
        fields.insert("type".to_string(), Value::String("doc".to_string()));
        fields.insert("content".to_string(), Value::Array(content));
        Value::Object(fields)
    }
}

impl Serialize for NodeDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("NodeDocument", 2)?;
        state.serialize_field("type", "doc")?;
        state.serialize_field("content", &self.content)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for NodeDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match classify(&value) {
            DocumentFormat::Node => Ok(Self::from_value(&value)),
            found => Err(D::Error::custom(DomainError::unexpected(
                DocumentFormat::Node,
                found,
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Node>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attrs: Map::new(),
            content: Vec::new(),
            marks: Vec::new(),
            text: None,
        }
    }

    pub fn text(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Self {
            text: Some(text.into()),
            marks,
            ..Self::new(NodeKind::Text)
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    pub fn with_content(mut self, content: Vec<Node>) -> Self {
        self.content = content;
        self
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;
        let kind = NodeKind::from_name(
            fields
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        );

        Some(Self {
            kind,
            attrs: fields
                .get("attrs")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            content: node_list(fields.get("content")),
            marks: fields
                .get("marks")
                .and_then(Value::as_array)
                .map(|marks| marks.iter().filter_map(Mark::from_value).collect())
                .unwrap_or_default(),
            text: fields.get("text").and_then(Value::as_str).map(str::to_string),
        })
    }

    pub fn to_value(&self) -> Value {
        let mut fields = Map::new();
        fields.insert(
            "type".to_string(),
            Value::String(self.kind.as_str().to_string()),
        );
        if !self.attrs.is_empty() {
            fields.insert("attrs".to_string(), Value::Object(self.attrs.clone()));
        }
        if !self.content.is_empty() {
            let content = self.content.iter().map(Node::to_value).collect();
            fields.insert("content".to_string(), Value::Array(content));
        }
        if !self.marks.is_empty() {
            let marks = self.marks.iter().map(Mark::to_value).collect();
            fields.insert("marks".to_string(), Value::Array(marks));
        }
        if let Some(text) = &self.text {
            fields.insert("text".to_string(), Value::String(text.clone()));
        }
        Value::Object(fields)
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    pub fn attr_i64(&self, key: &str) -> Option<i64> {
        self.attrs.get(key).and_then(integer_value)
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, NodeKind::BulletList | NodeKind::OrderedList)
    }

    /// Concatenated text of every descendant `text` node, marks ignored.
    pub fn text_content(&self) -> String {
        let mut buffer = String::new();
        self.collect_text(&mut buffer);
        buffer
    }

    fn collect_text(&self, buffer: &mut String) {
        if self.kind == NodeKind::Text {
            if let Some(text) = &self.text {
                buffer.push_str(text);
            }
            return;
        }
        for child in &self.content {
            child.collect_text(buffer);
        }
    }
}

fn node_list(value: Option<&Value>) -> Vec<Node> {
    value
        .and_then(Value::as_array)
        .map(|nodes| nodes.iter().filter_map(Node::from_value).collect())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Heading,
    Paragraph,
    BulletList,
    OrderedList,
    ListItem,
    CodeBlock,
    Blockquote,
    HorizontalRule,
    Table,
    TableRow,
    TableHeader,
    TableCell,
    Image,
    HardBreak,
    Text,
    /// Any type name this crate does not know; rendered as nothing.
    Other(String),
}

impl NodeKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "heading" => NodeKind::Heading,
            "paragraph" => NodeKind::Paragraph,
            "bulletList" => NodeKind::BulletList,
            "orderedList" => NodeKind::OrderedList,
            "listItem" => NodeKind::ListItem,
            "codeBlock" => NodeKind::CodeBlock,
            "blockquote" => NodeKind::Blockquote,
            "horizontalRule" => NodeKind::HorizontalRule,
            "table" => NodeKind::Table,
            "tableRow" => NodeKind::TableRow,
            "tableHeader" => NodeKind::TableHeader,
            "tableCell" => NodeKind::TableCell,
            "image" => NodeKind::Image,
            "hardBreak" => NodeKind::HardBreak,
            "text" => NodeKind::Text,
            other => NodeKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Heading => "heading",
            NodeKind::Paragraph => "paragraph",
            NodeKind::BulletList => "bulletList",
            NodeKind::OrderedList => "orderedList",
            NodeKind::ListItem => "listItem",
            NodeKind::CodeBlock => "codeBlock",
            NodeKind::Blockquote => "blockquote",
            NodeKind::HorizontalRule => "horizontalRule",
            NodeKind::Table => "table",
            NodeKind::TableRow => "tableRow",
            NodeKind::TableHeader => "tableHeader",
            NodeKind::TableCell => "tableCell",
            NodeKind::Image => "image",
            NodeKind::HardBreak => "hardBreak",
            NodeKind::Text => "text",
            NodeKind::Other(name) => name.as_str(),
        }
    }
}

impl Serialize for NodeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Inline decoration on a text node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: MarkKind,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
}

impl Mark {
    pub fn new(kind: MarkKind) -> Self {
        Self {
            kind,
            attrs: Map::new(),
        }
    }

    pub fn link(href: impl Into<String>) -> Self {
        let mut attrs = Map::new();
        attrs.insert("href".to_string(), Value::String(href.into()));
        Self {
            kind: MarkKind::Link,
            attrs,
        }
    }

    pub fn href(&self) -> Option<&str> {
        self.attrs.get("href").and_then(Value::as_str)
    }

    fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;
        Some(Self {
            kind: MarkKind::from_name(
                fields
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or_default(),
            ),
            attrs: fields
                .get("attrs")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        })
    }

    fn to_value(&self) -> Value {
        let mut fields = Map::new();
        fields.insert(
            "type".to_string(),
            Value::String(self.kind.as_str().to_string()),
        );
        if !self.attrs.is_empty() {
            fields.insert("attrs".to_string(), Value::Object(self.attrs.clone()));
        }
        Value::Object(fields)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarkKind {
    Bold,
    Italic,
    Code,
    Highlight,
    Strike,
    Link,
    Other(String),
}

impl MarkKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "bold" => MarkKind::Bold,
            "italic" => MarkKind::Italic,
            "code" => MarkKind::Code,
            "highlight" => MarkKind::Highlight,
            "strike" => MarkKind::Strike,
            "link" => MarkKind::Link,
            other => MarkKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MarkKind::Bold => "bold",
            MarkKind::Italic => "italic",
            MarkKind::Code => "code",
            MarkKind::Highlight => "highlight",
            MarkKind::Strike => "strike",
            MarkKind::Link => "link",
            MarkKind::Other(name) => name.as_str(),
        }
    }
}

impl Serialize for MarkKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Lenient field access
// ---------------------------------------------------------------------------

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn text_field(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

/// Integers stored either as JSON numbers or numeric strings.
fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

//! Block/inline content model for one note body.
//!
//! # Responsibility
//! - Define the normalized document representation edited by the core.
//! - Own the normalization pass every model-producing operation ends with.
//!
//! # Invariants
//! - Adjacent `InlineNode::Text` runs are always merged.
//! - Empty text runs are dropped unless they are the sole content of a block.
//! - A block is never empty; an empty block holds one empty text run.
//! - Widgets are atomic and occupy exactly one cursor position.

use crate::model::note::Property;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix of generated property widget ids.
pub const WIDGET_ID_PREFIX: &str = "widget-";

/// Generates a fresh stable id for a property widget.
pub fn new_widget_id() -> String {
    format!("{WIDGET_ID_PREFIX}{}", Uuid::new_v4())
}

/// Atomic `[key:operator:values]` unit embedded in a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyWidget {
    /// Stable identity used to target in-place edits.
    pub id: String,
    pub key: String,
    pub operator: String,
    pub values: Vec<String>,
}

impl PropertyWidget {
    /// Creates a widget with a generated id.
    pub fn new(
        key: impl Into<String>,
        operator: impl Into<String>,
        values: Vec<String>,
    ) -> Self {
        Self::with_id(new_widget_id(), key, operator, values)
    }

    /// Creates a widget with a caller-provided id.
    pub fn with_id(
        id: impl Into<String>,
        key: impl Into<String>,
        operator: impl Into<String>,
        values: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            operator: operator.into(),
            values,
        }
    }

    /// Semantic projection without the editor identity.
    pub fn to_property(&self) -> Property {
        Property {
            key: self.key.clone(),
            operator: self.operator.clone(),
            values: self.values.clone(),
        }
    }
}

/// One inline unit of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InlineNode {
    /// Run of plain text.
    Text { content: String },
    /// Atomic `#tag` widget.
    Tag { tag: String },
    /// Atomic property widget.
    Property(PropertyWidget),
}

impl InlineNode {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag { tag: tag.into() }
    }

    pub fn property(widget: PropertyWidget) -> Self {
        Self::Property(widget)
    }

    pub fn is_widget(&self) -> bool {
        !matches!(self, Self::Text { .. })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { content } => Some(content.as_str()),
            Self::Tag { .. } | Self::Property(_) => None,
        }
    }

    /// Number of cursor positions this node spans: characters for text, one
    /// for a widget.
    pub fn len(&self) -> usize {
        match self {
            Self::Text { content } => char_len(content),
            Self::Tag { .. } | Self::Property(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Paragraph-level unit; the unit of split and merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub content: Vec<InlineNode>,
}

impl Block {
    /// Builds a normalized block from arbitrary inline content.
    pub fn new(content: impl IntoIterator<Item = InlineNode>) -> Self {
        Self {
            content: normalize_inline(content),
        }
    }

    /// Block holding a single empty text run.
    pub fn empty() -> Self {
        Self {
            content: vec![InlineNode::text("")],
        }
    }

    /// Convenience constructor for a text-only block.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new([InlineNode::text(text)])
    }

    /// Returns whether the block only holds the empty placeholder.
    pub fn is_blank(&self) -> bool {
        self.content.iter().all(|node| node.as_text() == Some(""))
    }

    /// Total cursor positions in the block (widgets count as one).
    pub fn flat_len(&self) -> usize {
        self.content.iter().map(InlineNode::len).sum()
    }
}

/// A document: ordered, non-empty sequence of blocks.
pub type ContentModel = Vec<Block>;

/// Document holding one empty paragraph.
pub fn empty_document() -> ContentModel {
    vec![Block::empty()]
}

/// Merges adjacent text runs and drops empty ones.
///
/// Returns a single empty text run when nothing is left. Idempotent.
pub fn normalize_inline(nodes: impl IntoIterator<Item = InlineNode>) -> Vec<InlineNode> {
    let mut normalized: Vec<InlineNode> = Vec::new();
    for node in nodes {
        match node {
            InlineNode::Text { content } => {
                if content.is_empty() {
                    continue;
                }
                if let Some(InlineNode::Text { content: last }) = normalized.last_mut() {
                    last.push_str(&content);
                } else {
                    normalized.push(InlineNode::Text { content });
                }
            }
            widget => normalized.push(widget),
        }
    }
    if normalized.is_empty() {
        normalized.push(InlineNode::text(""));
    }
    normalized
}

/// Normalizes every block and guarantees at least one block.
pub fn normalize_document(doc: ContentModel) -> ContentModel {
    let mut blocks: ContentModel = doc
        .into_iter()
        .map(|block| Block::new(block.content))
        .collect();
    if blocks.is_empty() {
        blocks.push(Block::empty());
    }
    blocks
}

/// Plain-text projection used by previews and search.
///
/// Blocks are separated by newlines; widgets render as their readable form.
pub fn plain_text(doc: &[Block]) -> String {
    doc.iter()
        .map(|block| {
            block
                .content
                .iter()
                .map(|node| match node {
                    InlineNode::Text { content } => content.clone(),
                    InlineNode::Tag { tag } => format!("#{tag}"),
                    InlineNode::Property(widget) => {
                        format!("{}: {}", widget.key, widget.values.join(" "))
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Iterates over every property widget of a document in order.
pub fn property_widgets(doc: &[Block]) -> impl Iterator<Item = &PropertyWidget> {
    doc.iter()
        .flat_map(|block| block.content.iter())
        .filter_map(|node| match node {
            InlineNode::Property(widget) => Some(widget),
            InlineNode::Text { .. } | InlineNode::Tag { .. } => None,
        })
}

pub(crate) fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Splits at a character offset, clamping past-the-end offsets.
pub(crate) fn split_at_char(value: &str, offset: usize) -> (&str, &str) {
    match value.char_indices().nth(offset) {
        Some((byte, _)) => value.split_at(byte),
        None => (value, ""),
    }
}

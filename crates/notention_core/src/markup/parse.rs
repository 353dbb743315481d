//! Markup → content model.
//!
//! # Invariants
//! - Never fails; unrecognized structure degrades to plain text.
//! - Whitespace-only text right after a widget becomes a single space.
//! - Malformed `data-values` JSON yields an empty values list.

use crate::markup::dom::{parse_fragment, Element, MarkupNode, WidgetKind};
use crate::model::content::{
    new_widget_id, normalize_inline, Block, ContentModel, InlineNode, PropertyWidget,
};
use crate::model::note::REAL_OPERATOR;
use log::debug;
use serde_json::Value;
use std::ops::Range;

/// Caret placeholder rendered into empty blocks.
pub const EMPTY_BLOCK_PLACEHOLDER: char = '\u{200b}';

/// Parses a persisted note body into a document.
pub fn parse_markup(markup: &str) -> ContentModel {
    parse_root(&parse_fragment(markup))
}

/// Builds a document from an already tokenized surface root.
pub fn parse_root(root: &Element) -> ContentModel {
    let mut blocks: ContentModel = block_spans(root).into_iter().map(|span| span.block).collect();
    if blocks.is_empty() {
        blocks.push(Block::empty());
    }
    blocks
}

/// Top-level children of the surface root that form one document block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    /// Child indices of the root covered by this block.
    pub range: Range<usize>,
    /// Whether the span is a single `p`/`div` element.
    pub container: bool,
    pub block: Block,
}

impl BlockSpan {
    /// Surface nodes holding the block's inline content.
    pub fn nodes<'a>(&self, root: &'a Element) -> &'a [MarkupNode] {
        if self.container {
            match root.children.get(self.range.start) {
                Some(MarkupNode::Element(element)) => &element.children,
                _ => &[],
            }
        } else {
            root.children.get(self.range.clone()).unwrap_or(&[])
        }
    }

    /// Path from the root to the parent of `nodes`, and the child index of
    /// `nodes[0]` under it.
    pub fn anchor(&self) -> (Vec<usize>, usize) {
        if self.container {
            (vec![self.range.start], 0)
        } else {
            (Vec::new(), self.range.start)
        }
    }
}

/// Splits the root into blocks.
///
/// `p`/`div` children become blocks; runs of floating top-level content are
/// gathered into one paragraph each unless they are whitespace only.
pub fn block_spans(root: &Element) -> Vec<BlockSpan> {
    let mut spans = Vec::new();
    let mut floating_start: Option<usize> = None;

    for (index, child) in root.children.iter().enumerate() {
        match child {
            MarkupNode::Element(element) if element.is_block_container() => {
                if let Some(start) = floating_start.take() {
                    push_floating(root, start..index, &mut spans);
                }
                spans.push(BlockSpan {
                    range: index..index + 1,
                    container: true,
                    block: parse_block(element),
                });
            }
            _ => {
                floating_start.get_or_insert(index);
            }
        }
    }
    if let Some(start) = floating_start {
        push_floating(root, start..root.children.len(), &mut spans);
    }
    spans
}

fn push_floating(root: &Element, range: Range<usize>, spans: &mut Vec<BlockSpan>) {
    let mut nodes = Vec::new();
    let mut after_widget = false;
    for node in &root.children[range.clone()] {
        collect_inline(node, &mut nodes, &mut after_widget);
    }
    let block = Block::new(nodes);
    // Inter-block whitespace between containers is not content.
    if block
        .content
        .iter()
        .all(|node| node.as_text().is_some_and(|text| text.trim().is_empty()))
    {
        return;
    }
    spans.push(BlockSpan {
        range,
        container: false,
        block,
    });
}

/// Parses one block container.
pub fn parse_block(element: &Element) -> Block {
    Block { content: parse_inline(element) }
}

/// Walks an element's children in document order into inline nodes.
pub fn parse_inline(element: &Element) -> Vec<InlineNode> {
    let mut nodes = Vec::new();
    let mut after_widget = false;
    for child in &element.children {
        collect_inline(child, &mut nodes, &mut after_widget);
    }
    normalize_inline(nodes)
}

fn collect_inline(node: &MarkupNode, out: &mut Vec<InlineNode>, after_widget: &mut bool) {
    match node {
        MarkupNode::Text(text) => {
            let text = text.replace(EMPTY_BLOCK_PLACEHOLDER, "");
            if text.is_empty() {
                return;
            }
            if *after_widget && text.chars().all(char::is_whitespace) {
                out.push(InlineNode::text(" "));
            } else {
                out.push(InlineNode::text(text));
            }
            *after_widget = false;
        }
        MarkupNode::Element(element) => match element.widget_kind() {
            Some(WidgetKind::Tag) => {
                out.push(InlineNode::tag(element.attr("data-tag").unwrap_or_default()));
                *after_widget = true;
            }
            Some(WidgetKind::Property) => {
                out.push(InlineNode::property(property_from_element(element)));
                *after_widget = true;
            }
            None => {
                for child in &element.children {
                    collect_inline(child, out, after_widget);
                }
            }
        },
    }
}

fn property_from_element(element: &Element) -> PropertyWidget {
    let id = element
        .attr("id")
        .filter(|id| !id.is_empty())
        .map_or_else(new_widget_id, str::to_string);
    PropertyWidget::with_id(
        id,
        element.attr("data-key").unwrap_or_default(),
        element
            .attr("data-operator")
            .filter(|operator| !operator.is_empty())
            .unwrap_or(REAL_OPERATOR),
        decode_values(element.attr("data-values").unwrap_or("[]")),
    )
}

/// Decodes a widget's JSON values list defensively.
pub fn decode_values(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(value) => value,
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect(),
        Ok(other) => {
            debug!(
                "event=widget_values_ignored module=markup status=degraded kind={}",
                json_kind(&other)
            );
            Vec::new()
        }
        Err(err) => {
            debug!("event=widget_values_invalid module=markup status=degraded error={err}");
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Pure document-mutating steps.
//!
//! # Invariants
//! - A step never mutates its input; it returns a new normalized document or
//!   an error describing why the edit shape was rejected.
//! - `Replace` is restricted to a single block.
//! - `MergeBlock { block_index: 0 }` is a no-op.

use crate::model::content::{split_at_char, Block, ContentModel, InlineNode};
use crate::model::selection::EditorSelection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One replayable edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Replace(ReplaceStep),
    SplitBlock(SplitBlockStep),
    MergeBlock(MergeBlockStep),
    SetProperty(SetPropertyStep),
}

impl Step {
    pub fn apply(&self, doc: &[Block]) -> Result<ContentModel, StepError> {
        match self {
            Self::Replace(step) => step.apply(doc),
            Self::SplitBlock(step) => step.apply(doc),
            Self::MergeBlock(step) => step.apply(doc),
            Self::SetProperty(step) => step.apply(doc),
        }
    }

    /// Stable name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Replace(_) => "replace",
            Self::SplitBlock(_) => "split_block",
            Self::MergeBlock(_) => "merge_block",
            Self::SetProperty(_) => "set_property",
        }
    }
}

/// Replaces the range `from..to` of one block with `nodes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceStep {
    pub from: EditorSelection,
    pub to: EditorSelection,
    #[serde(default)]
    pub nodes: Vec<InlineNode>,
}

impl ReplaceStep {
    pub fn new(from: EditorSelection, to: EditorSelection, nodes: Vec<InlineNode>) -> Self {
        Self { from, to, nodes }
    }

    /// Pure insertion at a collapsed position.
    pub fn insert(at: EditorSelection, nodes: Vec<InlineNode>) -> Self {
        Self::new(at, at, nodes)
    }

    pub fn apply(&self, doc: &[Block]) -> Result<ContentModel, StepError> {
        if self.from.block_index != self.to.block_index {
            return Err(StepError::CrossBlock {
                from_block: self.from.block_index,
                to_block: self.to.block_index,
            });
        }
        let index = self.from.block_index;
        let block = block_at(doc, index)?;
        if self.to.to_flat(block) < self.from.to_flat(block) {
            return Err(StepError::InvalidRange {
                from: self.from,
                to: self.to,
            });
        }

        let mut content = head(block, &self.from);
        content.extend(self.nodes.iter().cloned());
        content.extend(tail(block, &self.to));

        let mut next = doc.to_vec();
        next[index] = Block::new(content);
        Ok(next)
    }
}

/// Splits one block in two at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitBlockStep {
    pub at: EditorSelection,
}

impl SplitBlockStep {
    pub fn new(at: EditorSelection) -> Self {
        Self { at }
    }

    pub fn apply(&self, doc: &[Block]) -> Result<ContentModel, StepError> {
        let index = self.at.block_index;
        let block = block_at(doc, index)?;
        let before = Block::new(head(block, &self.at));
        let after = Block::new(tail(block, &self.at));

        let mut next = Vec::with_capacity(doc.len() + 1);
        next.extend_from_slice(&doc[..index]);
        next.push(before);
        next.push(after);
        next.extend_from_slice(&doc[index + 1..]);
        Ok(next)
    }
}

/// Appends block `block_index` onto its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeBlockStep {
    pub block_index: usize,
}

impl MergeBlockStep {
    pub fn new(block_index: usize) -> Self {
        Self { block_index }
    }

    pub fn apply(&self, doc: &[Block]) -> Result<ContentModel, StepError> {
        if self.block_index == 0 {
            return Ok(doc.to_vec());
        }
        let merged_from = block_at(doc, self.block_index)?;
        let merged_into = &doc[self.block_index - 1];

        let mut next = doc.to_vec();
        next[self.block_index - 1] = Block::new(
            merged_into
                .content
                .iter()
                .chain(merged_from.content.iter())
                .cloned(),
        );
        next.remove(self.block_index);
        Ok(next)
    }
}

/// Rewrites the fields of the property widget with the given id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPropertyStep {
    pub id: String,
    pub key: String,
    pub operator: String,
    #[serde(default)]
    pub values: Vec<String>,
}

impl SetPropertyStep {
    pub fn apply(&self, doc: &[Block]) -> Result<ContentModel, StepError> {
        let mut next = doc.to_vec();
        let widget = next
            .iter_mut()
            .flat_map(|block| block.content.iter_mut())
            .find_map(|node| match node {
                InlineNode::Property(widget) if widget.id == self.id => Some(widget),
                _ => None,
            })
            .ok_or_else(|| StepError::WidgetNotFound(self.id.clone()))?;
        widget.key = self.key.clone();
        widget.operator = self.operator.clone();
        widget.values = self.values.clone();
        Ok(next)
    }
}

fn block_at(doc: &[Block], index: usize) -> Result<&Block, StepError> {
    doc.get(index).ok_or(StepError::BlockOutOfRange {
        index,
        len: doc.len(),
    })
}

/// Content strictly before `at`.
///
/// A widget addressed with offset 0 stays out of the head.
fn head(block: &Block, at: &EditorSelection) -> Vec<InlineNode> {
    let index = at.inline_index.min(block.content.len());
    let mut nodes = block.content[..index].to_vec();
    match block.content.get(index) {
        Some(InlineNode::Text { content }) => {
            nodes.push(InlineNode::text(split_at_char(content, at.offset).0));
        }
        Some(widget) if at.offset >= 1 => nodes.push(widget.clone()),
        _ => {}
    }
    nodes
}

/// Content from `at` to the end of the block.
fn tail(block: &Block, at: &EditorSelection) -> Vec<InlineNode> {
    let index = at.inline_index.min(block.content.len());
    let mut nodes = Vec::new();
    match block.content.get(index) {
        Some(InlineNode::Text { content }) => {
            nodes.push(InlineNode::text(split_at_char(content, at.offset).1));
        }
        Some(widget) if at.offset == 0 => nodes.push(widget.clone()),
        _ => {}
    }
    nodes.extend(block.content.iter().skip(index + 1).cloned());
    nodes
}

/// Reasons a step leaves the document unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// Replace endpoints live in different blocks.
    CrossBlock { from_block: usize, to_block: usize },
    BlockOutOfRange { index: usize, len: usize },
    /// `to` lies before `from`.
    InvalidRange {
        from: EditorSelection,
        to: EditorSelection,
    },
    WidgetNotFound(String),
}

impl Display for StepError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CrossBlock {
                from_block,
                to_block,
            } => write!(
                f,
                "cross-block replace is not supported (from block {from_block} to block {to_block})"
            ),
            Self::BlockOutOfRange { index, len } => {
                write!(f, "block index {index} out of range for {len} blocks")
            }
            Self::InvalidRange { from, to } => write!(
                f,
                "range end {}:{} precedes start {}:{}",
                to.inline_index, to.offset, from.inline_index, from.offset
            ),
            Self::WidgetNotFound(id) => write!(f, "property widget not found: {id}"),
        }
    }
}

impl Error for StepError {}

#[cfg(test)]
mod tests {
    use super::{MergeBlockStep, ReplaceStep, SetPropertyStep, SplitBlockStep, Step, StepError};
    use crate::model::content::{Block, InlineNode, PropertyWidget};
    use crate::model::selection::EditorSelection;

    fn at(block: usize, inline: usize, offset: usize) -> EditorSelection {
        EditorSelection::new(block, inline, offset)
    }

    #[test]
    fn replace_removes_text_range_and_widget() {
        let doc = vec![Block::new(vec![
            InlineNode::text("ab"),
            InlineNode::tag("t"),
            InlineNode::text("cd"),
        ])];
        let next = ReplaceStep::new(at(0, 0, 1), at(0, 2, 1), vec![])
            .apply(&doc)
            .expect("single-block replace");
        assert_eq!(next, vec![Block::from_text("ad")]);
    }

    #[test]
    fn replace_at_widget_boundaries_keeps_widget_whole() {
        let doc = vec![Block::new(vec![InlineNode::text("a"), InlineNode::tag("t")])];
        let before = ReplaceStep::insert(at(0, 1, 0), vec![InlineNode::text("x")])
            .apply(&doc)
            .expect("insert before widget");
        assert_eq!(
            before[0].content,
            vec![InlineNode::text("ax"), InlineNode::tag("t")]
        );
        let after = ReplaceStep::insert(at(0, 1, 1), vec![InlineNode::text("x")])
            .apply(&doc)
            .expect("insert after widget");
        assert_eq!(
            after[0].content,
            vec![InlineNode::text("a"), InlineNode::tag("t"), InlineNode::text("x")]
        );
    }

    #[test]
    fn replace_rejects_cross_block_and_reversed_ranges() {
        let doc = vec![Block::from_text("one"), Block::from_text("two")];
        let err = ReplaceStep::new(at(0, 0, 1), at(1, 0, 1), vec![])
            .apply(&doc)
            .expect_err("cross-block must be rejected");
        assert_eq!(
            err,
            StepError::CrossBlock {
                from_block: 0,
                to_block: 1
            }
        );
        let err = ReplaceStep::new(at(0, 0, 2), at(0, 0, 1), vec![])
            .apply(&doc)
            .expect_err("reversed range must be rejected");
        assert!(matches!(err, StepError::InvalidRange { .. }));
        let err = ReplaceStep::insert(at(5, 0, 0), vec![])
            .apply(&doc)
            .expect_err("missing block must be rejected");
        assert_eq!(err, StepError::BlockOutOfRange { index: 5, len: 2 });
    }

    #[test]
    fn split_at_widget_follows_offset_side() {
        let doc = vec![Block::new(vec![
            InlineNode::text("a"),
            InlineNode::tag("t"),
            InlineNode::text("b"),
        ])];
        let widget_after = SplitBlockStep::new(at(0, 1, 0))
            .apply(&doc)
            .expect("split before widget");
        assert_eq!(widget_after[0], Block::from_text("a"));
        assert_eq!(
            widget_after[1].content,
            vec![InlineNode::tag("t"), InlineNode::text("b")]
        );

        let widget_before = SplitBlockStep::new(at(0, 1, 1))
            .apply(&doc)
            .expect("split after widget");
        assert_eq!(
            widget_before[0].content,
            vec![InlineNode::text("a"), InlineNode::tag("t")]
        );
        assert_eq!(widget_before[1], Block::from_text("b"));
    }

    #[test]
    fn split_at_end_leaves_placeholder_block() {
        let doc = vec![Block::from_text("end")];
        let next = SplitBlockStep::new(at(0, 0, 3)).apply(&doc).expect("split at end");
        assert_eq!(next, vec![Block::from_text("end"), Block::empty()]);
    }

    #[test]
    fn merge_rejects_missing_block() {
        let doc = vec![Block::from_text("only")];
        assert_eq!(
            MergeBlockStep::new(3).apply(&doc),
            Err(StepError::BlockOutOfRange { index: 3, len: 1 })
        );
    }

    #[test]
    fn set_property_targets_widget_by_id() {
        let doc = vec![Block::new(vec![InlineNode::property(PropertyWidget::with_id(
            "w1",
            "price",
            "is",
            vec!["10".into()],
        ))])];
        let step = Step::SetProperty(SetPropertyStep {
            id: "w1".into(),
            key: "price".into(),
            operator: "less than".into(),
            values: vec!["20".into()],
        });
        let next = step.apply(&doc).expect("widget exists");
        assert_eq!(
            next[0].content[0],
            InlineNode::property(PropertyWidget::with_id(
                "w1",
                "price",
                "less than",
                vec!["20".into()]
            ))
        );

        let missing = Step::SetProperty(SetPropertyStep {
            id: "nope".into(),
            key: "k".into(),
            operator: "is".into(),
            values: vec![],
        });
        assert_eq!(
            missing.apply(&doc),
            Err(StepError::WidgetNotFound("nope".into()))
        );
    }

    #[test]
    fn steps_serialize_with_a_tag() {
        let step = Step::MergeBlock(MergeBlockStep::new(2));
        let json = serde_json::to_value(&step).expect("serialize step");
        assert_eq!(json["step"], "merge_block");
        assert_eq!(json["blockIndex"], 2);
    }
}

//! Model-side cursor coordinates.
//!
//! # Invariants
//! - `offset` counts characters inside a text run, and is 0 (before) or 1
//!   (after) for a widget.
//! - Flat offsets count widgets as one character and are block-relative.

use crate::model::content::{Block, InlineNode};
use serde::{Deserialize, Serialize};

/// Cursor or range endpoint expressed in model coordinates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct EditorSelection {
    pub block_index: usize,
    pub inline_index: usize,
    pub offset: usize,
}

impl EditorSelection {
    pub fn new(block_index: usize, inline_index: usize, offset: usize) -> Self {
        Self {
            block_index,
            inline_index,
            offset,
        }
    }

    /// Start of the given block.
    pub fn block_start(block_index: usize) -> Self {
        Self::new(block_index, 0, 0)
    }

    /// End of the given block (after its last inline node).
    pub fn block_end(block_index: usize, block: &Block) -> Self {
        match block.content.last() {
            Some(last) => Self::new(block_index, block.content.len() - 1, last.len()),
            None => Self::block_start(block_index),
        }
    }

    /// Converts to a flat, block-relative character offset.
    pub fn to_flat(&self, block: &Block) -> usize {
        let before: usize = block
            .content
            .iter()
            .take(self.inline_index)
            .map(InlineNode::len)
            .sum();
        let within = block
            .content
            .get(self.inline_index)
            .map_or(0, |node| self.offset.min(node.len()));
        before + within
    }

    /// Resolves a flat offset against a block.
    ///
    /// At a boundary the end of a text run wins over the start of the next
    /// node; offsets past the end clamp to the end of the block.
    pub fn from_flat(block_index: usize, block: &Block, flat: usize) -> Self {
        let mut remaining = flat;
        for (index, node) in block.content.iter().enumerate() {
            match node {
                InlineNode::Text { .. } => {
                    let len = node.len();
                    if remaining <= len {
                        return Self::new(block_index, index, remaining);
                    }
                    remaining -= len;
                }
                InlineNode::Tag { .. } | InlineNode::Property(_) => {
                    if remaining == 0 {
                        return Self::new(block_index, index, 0);
                    }
                    remaining -= 1;
                }
            }
        }
        Self::block_end(block_index, block)
    }
}

#[cfg(test)]
mod tests {
    use super::EditorSelection;
    use crate::model::content::{Block, InlineNode};

    fn mixed_block() -> Block {
        Block::new(vec![
            InlineNode::text("ab"),
            InlineNode::tag("t"),
            InlineNode::tag("u"),
            InlineNode::text("cd"),
        ])
    }

    #[test]
    fn flat_offsets_round_trip_through_widgets() {
        let block = mixed_block();
        assert_eq!(EditorSelection::from_flat(0, &block, 2), EditorSelection::new(0, 0, 2));
        assert_eq!(EditorSelection::from_flat(0, &block, 3), EditorSelection::new(0, 2, 0));
        assert_eq!(EditorSelection::from_flat(0, &block, 4), EditorSelection::new(0, 3, 0));
        assert_eq!(EditorSelection::from_flat(0, &block, 99), EditorSelection::new(0, 3, 2));

        for flat in 0..=block.flat_len() {
            let selection = EditorSelection::from_flat(0, &block, flat);
            assert_eq!(selection.to_flat(&block), flat);
        }
    }

    #[test]
    fn trailing_widget_end_is_after_it() {
        let block = Block::new(vec![InlineNode::text("a"), InlineNode::tag("t")]);
        assert_eq!(EditorSelection::block_end(0, &block), EditorSelection::new(0, 1, 1));
        assert_eq!(EditorSelection::from_flat(0, &block, 2), EditorSelection::new(0, 1, 1));
    }
}

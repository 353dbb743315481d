//! Transaction builder and fold.
//!
//! # Responsibility
//! - Collect ordered steps against a base document.
//! - Express compound edits (cross-block deletion, joins) as single-block
//!   steps so every step stays simple and replayable.
//! - Resolve the post-edit selection against the final document.
//!
//! # Invariants
//! - `apply` is total: rejected steps are logged and skipped.
//! - Builder positions refer to the document as left by earlier builder
//!   calls on the same transaction.

pub mod step;

use crate::model::content::{Block, ContentModel, InlineNode};
use crate::model::selection::EditorSelection;
use log::warn;
pub use step::{
    MergeBlockStep, ReplaceStep, SetPropertyStep, SplitBlockStep, Step, StepError,
};

/// Where the cursor should land once the transaction is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionTarget {
    Exact(EditorSelection),
    /// Block-relative flat offset, resolved against the final document.
    Flat { block_index: usize, offset: usize },
}

/// A step that was skipped during apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedStep {
    pub index: usize,
    pub step: Step,
    pub error: StepError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResult {
    pub doc: ContentModel,
    pub selection: Option<EditorSelection>,
    pub rejected: Vec<RejectedStep>,
}

impl TransactionResult {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Ordered steps plus an optional resulting selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    base: ContentModel,
    working: ContentModel,
    steps: Vec<Step>,
    selection: Option<SelectionTarget>,
}

impl Transaction {
    pub fn new(doc: ContentModel) -> Self {
        Self {
            working: doc.clone(),
            base: doc,
            steps: Vec::new(),
            selection: None,
        }
    }

    pub fn base(&self) -> &[Block] {
        &self.base
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn selection(&self) -> Option<SelectionTarget> {
        self.selection
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Appends a raw step.
    pub fn step(mut self, step: Step) -> Self {
        if let Ok(next) = step.apply(&self.working) {
            self.working = next;
        }
        self.steps.push(step);
        self
    }

    pub fn set_selection(mut self, selection: EditorSelection) -> Self {
        self.selection = Some(SelectionTarget::Exact(selection));
        self
    }

    pub fn set_selection_flat(mut self, block_index: usize, offset: usize) -> Self {
        self.selection = Some(SelectionTarget::Flat {
            block_index,
            offset,
        });
        self
    }

    /// Replaces a single-block range; the cursor lands after the new nodes.
    pub fn replace_range(
        self,
        from: EditorSelection,
        to: EditorSelection,
        nodes: Vec<InlineNode>,
    ) -> Self {
        let start = self.flat_in_working(&from);
        let inserted: usize = nodes.iter().map(InlineNode::len).sum();
        self.step(Step::Replace(ReplaceStep::new(from, to, nodes)))
            .set_selection_flat(from.block_index, start + inserted)
    }

    /// Inserts nodes at a collapsed position; the cursor lands after them.
    pub fn insert_nodes(self, at: EditorSelection, nodes: Vec<InlineNode>) -> Self {
        self.replace_range(at, at, nodes)
    }

    pub fn insert_text(self, at: EditorSelection, text: impl Into<String>) -> Self {
        self.insert_nodes(at, vec![InlineNode::text(text)])
    }

    /// Deletes `from..to`, which may span blocks; the cursor lands at the
    /// start of the range.
    ///
    /// Multi-block ranges trim the last and first blocks, empty the blocks in
    /// between and then merge everything into the first block.
    pub fn delete_range(self, from: EditorSelection, to: EditorSelection) -> Self {
        let (from, to) = if self.position_key(&to) < self.position_key(&from) {
            (to, from)
        } else {
            (from, to)
        };
        let start = self.flat_in_working(&from);

        if from.block_index == to.block_index {
            return self
                .step(Step::Replace(ReplaceStep::new(from, to, Vec::new())))
                .set_selection_flat(from.block_index, start);
        }

        let first = from.block_index;
        let last = to.block_index;
        let mut tx = self.step(Step::Replace(ReplaceStep::new(
            EditorSelection::block_start(last),
            to,
            Vec::new(),
        )));
        let first_end = block_end_marker(first, &tx.working);
        tx = tx.step(Step::Replace(ReplaceStep::new(from, first_end, Vec::new())));
        for middle in first + 1..last {
            let middle_end = block_end_marker(middle, &tx.working);
            tx = tx.step(Step::Replace(ReplaceStep::new(
                EditorSelection::block_start(middle),
                middle_end,
                Vec::new(),
            )));
        }
        for _ in first..last {
            tx = tx.step(Step::MergeBlock(MergeBlockStep::new(first + 1)));
        }
        tx.set_selection_flat(first, start)
    }

    /// Splits a block; the cursor lands at the start of the new block.
    pub fn split_block(self, at: EditorSelection) -> Self {
        let next_block = at.block_index + 1;
        self.step(Step::SplitBlock(SplitBlockStep::new(at)))
            .set_selection(EditorSelection::block_start(next_block))
    }

    /// Merges a block into its predecessor; the cursor lands at the seam.
    pub fn join_backward(self, block_index: usize) -> Self {
        if block_index == 0 {
            return self
                .step(Step::MergeBlock(MergeBlockStep::new(0)))
                .set_selection(EditorSelection::block_start(0));
        }
        let seam = self
            .working
            .get(block_index - 1)
            .map_or(0, Block::flat_len);
        self.step(Step::MergeBlock(MergeBlockStep::new(block_index)))
            .set_selection_flat(block_index - 1, seam)
    }

    pub fn set_property(
        self,
        id: impl Into<String>,
        key: impl Into<String>,
        operator: impl Into<String>,
        values: Vec<String>,
    ) -> Self {
        self.step(Step::SetProperty(SetPropertyStep {
            id: id.into(),
            key: key.into(),
            operator: operator.into(),
            values,
        }))
    }

    /// Folds the base document through every step.
    pub fn apply(&self) -> TransactionResult {
        let mut doc = self.base.clone();
        let mut rejected = Vec::new();
        for (index, step) in self.steps.iter().enumerate() {
            match step.apply(&doc) {
                Ok(next) => doc = next,
                Err(error) => {
                    warn!(
                        "event=step_rejected module=transaction status=rejected step={} index={} error={}",
                        step.name(),
                        index,
                        error
                    );
                    rejected.push(RejectedStep {
                        index,
                        step: step.clone(),
                        error,
                    });
                }
            }
        }
        let selection = self
            .selection
            .and_then(|target| resolve_selection(&doc, target));
        TransactionResult {
            doc,
            selection,
            rejected,
        }
    }

    fn flat_in_working(&self, at: &EditorSelection) -> usize {
        self.working
            .get(at.block_index)
            .map_or(at.offset, |block| at.to_flat(block))
    }

    fn position_key(&self, at: &EditorSelection) -> (usize, usize) {
        (at.block_index, self.flat_in_working(at))
    }
}

/// Position past the last inline node, as accepted by `ReplaceStep`.
fn block_end_marker(block_index: usize, doc: &[Block]) -> EditorSelection {
    let len = doc.get(block_index).map_or(0, |block| block.content.len());
    EditorSelection::new(block_index, len, 0)
}

fn resolve_selection(doc: &[Block], target: SelectionTarget) -> Option<EditorSelection> {
    match target {
        SelectionTarget::Exact(selection) => {
            let block = doc.get(selection.block_index)?;
            if selection.inline_index >= block.content.len() {
                return Some(EditorSelection::block_end(selection.block_index, block));
            }
            Some(selection)
        }
        SelectionTarget::Flat {
            block_index,
            offset,
        } => doc
            .get(block_index)
            .map(|block| EditorSelection::from_flat(block_index, block, offset)),
    }
}

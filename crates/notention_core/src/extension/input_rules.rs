//! Typing shortcuts that turn text before the caret into widgets.
//!
//! - `#word` followed by whitespace becomes a tag widget.
//! - `[key:value]` becomes an `is` property widget; an empty key is ignored.
//!
//! Both widgets are followed by a single space and the caret lands after it.

use crate::extension::capability::PluginCapability;
use crate::extension::plugin::{EditorContext, EditorPlugin, HookOutcome};
use crate::model::content::{char_len, split_at_char, InlineNode, PropertyWidget};
use crate::model::note::REAL_OPERATOR;
use crate::model::selection::EditorSelection;
use crate::transaction::Transaction;
use once_cell::sync::Lazy;
use regex::Regex;

pub const INPUT_RULES_PLUGIN_ID: &str = "input-rules";

static TAG_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#(\w+)\s$").expect("valid tag input rule regex"));
static PROPERTY_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^:\]]+?):([^\]]*?)\]$").expect("valid property input rule regex")
});

#[derive(Debug, Default)]
pub struct InputRulesPlugin;

impl InputRulesPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl EditorPlugin for InputRulesPlugin {
    fn id(&self) -> &str {
        INPUT_RULES_PLUGIN_ID
    }

    fn name(&self) -> &str {
        "Input Rules"
    }

    fn capabilities(&self) -> &[PluginCapability] {
        &[PluginCapability::InputHandler]
    }

    fn on_input(&self, ctx: &EditorContext<'_>) -> HookOutcome {
        match apply_input_rules(ctx) {
            Some(tx) => HookOutcome::Apply(tx),
            None => HookOutcome::Pass,
        }
    }
}

/// Builds the conversion transaction when text before the caret matches a
/// rule.
pub fn apply_input_rules(ctx: &EditorContext<'_>) -> Option<Transaction> {
    let caret = ctx.selection?;
    let block = ctx.doc.get(caret.block_index)?;
    let InlineNode::Text { content } = block.content.get(caret.inline_index)? else {
        return None;
    };
    let before = split_at_char(content, caret.offset).0;

    let (start_byte, widget) = if let Some(caps) = TAG_RULE.captures(before) {
        let whole = caps.get(0)?;
        let tag = caps.get(1)?.as_str();
        (whole.start(), InlineNode::tag(tag))
    } else if let Some(caps) = PROPERTY_RULE.captures(before) {
        let whole = caps.get(0)?;
        let key = caps.get(1)?.as_str().trim();
        if key.is_empty() {
            return None;
        }
        let value = caps.get(2).map_or("", |m| m.as_str()).trim();
        (
            whole.start(),
            InlineNode::property(PropertyWidget::new(
                key,
                REAL_OPERATOR,
                vec![value.to_string()],
            )),
        )
    } else {
        return None;
    };

    let from = EditorSelection::new(
        caret.block_index,
        caret.inline_index,
        char_len(&before[..start_byte]),
    );
    let to = EditorSelection::new(caret.block_index, caret.inline_index, char_len(before));
    Some(
        Transaction::new(ctx.doc.to_vec()).replace_range(
            from,
            to,
            vec![widget, InlineNode::text(" ")],
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::apply_input_rules;
    use crate::extension::plugin::EditorContext;
    use crate::model::content::{Block, InlineNode};
    use crate::model::selection::EditorSelection;

    fn run(text: &str, caret: usize) -> Option<(Vec<InlineNode>, Option<EditorSelection>)> {
        let doc = vec![Block::from_text(text)];
        let ctx = EditorContext {
            doc: &doc,
            selection: Some(EditorSelection::new(0, 0, caret)),
            editing_widget: None,
        };
        apply_input_rules(&ctx).map(|tx| {
            let result = tx.apply();
            (result.doc[0].content.clone(), result.selection)
        })
    }

    #[test]
    fn hash_word_and_space_becomes_tag() {
        let (content, selection) = run("see #urgent ", 12).expect("tag rule fires");
        assert_eq!(
            content,
            vec![
                InlineNode::text("see "),
                InlineNode::tag("urgent"),
                InlineNode::text(" ")
            ]
        );
        assert_eq!(selection, Some(EditorSelection::new(0, 2, 1)));
    }

    #[test]
    fn bracket_pair_becomes_property() {
        let (content, _) = run("[ price : 90 ] tail", 14).expect("property rule fires");
        match &content[0] {
            InlineNode::Property(widget) => {
                assert_eq!(widget.key, "price");
                assert_eq!(widget.operator, "is");
                assert_eq!(widget.values, vec!["90"]);
            }
            other => panic!("expected property widget, got {other:?}"),
        }
        assert_eq!(content[1], InlineNode::text("  tail"));
    }

    #[test]
    fn rules_only_look_before_the_caret() {
        assert!(run("#tag and more", 4).is_none());
        assert!(run("[ :value]", 9).is_none());
        assert!(run("plain text", 10).is_none());
    }
}

//! One-time conversion of legacy plain-text markers into widgets.
//!
//! Older notes stored properties as literal `[key:value]` text and tags as
//! `#tag` words. Documents that already contain widgets are left untouched.

use crate::model::content::{Block, ContentModel, InlineNode, PropertyWidget};
use crate::model::note::REAL_OPERATOR;
use once_cell::sync::Lazy;
use regex::Regex;

static LEGACY_PROPERTY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\s*([^:<>\[\]]+?)\s*:\s*([^\]<>]*?)\s*\]").expect("valid legacy property regex")
});
static LEGACY_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)(#([A-Za-z0-9_-]+))").expect("valid legacy tag regex"));

/// Converts legacy markers when the document has no widgets yet.
pub fn widgetize_legacy(doc: ContentModel) -> ContentModel {
    let has_widgets = doc
        .iter()
        .any(|block| block.content.iter().any(InlineNode::is_widget));
    if has_widgets {
        return doc;
    }
    doc.into_iter()
        .map(|block| {
            Block::new(
                block
                    .content
                    .into_iter()
                    .flat_map(|node| match node {
                        InlineNode::Text { content } => widgetize_text(&content),
                        widget => vec![widget],
                    }),
            )
        })
        .collect()
}

/// Splits one text run around legacy markers.
pub fn widgetize_text(text: &str) -> Vec<InlineNode> {
    let mut spans: Vec<(usize, usize, InlineNode)> = Vec::new();
    for caps in LEGACY_PROPERTY_RE.captures_iter(text) {
        let (Some(whole), Some(key), value) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let value = value.map_or("", |m| m.as_str()).trim().to_string();
        spans.push((
            whole.start(),
            whole.end(),
            InlineNode::property(PropertyWidget::new(
                key.as_str().trim(),
                REAL_OPERATOR,
                vec![value],
            )),
        ));
    }
    for caps in LEGACY_TAG_RE.captures_iter(text) {
        let (Some(marker), Some(name)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        spans.push((marker.start(), marker.end(), InlineNode::tag(name.as_str())));
    }
    spans.sort_by_key(|(start, _, _)| *start);

    let mut nodes = Vec::new();
    let mut cursor = 0;
    for (start, end, node) in spans {
        if start < cursor {
            continue;
        }
        nodes.push(InlineNode::text(&text[cursor..start]));
        nodes.push(node);
        cursor = end;
    }
    nodes.push(InlineNode::text(&text[cursor..]));
    nodes
}

#[cfg(test)]
mod tests {
    use super::{widgetize_legacy, widgetize_text};
    use crate::model::content::{normalize_inline, Block, InlineNode};

    #[test]
    fn converts_bracket_properties_and_hash_tags() {
        let nodes = normalize_inline(widgetize_text("Need [ service : Web Design ] soon #urgent"));
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[0], InlineNode::text("Need "));
        match &nodes[1] {
            InlineNode::Property(widget) => {
                assert_eq!(widget.key, "service");
                assert_eq!(widget.operator, "is");
                assert_eq!(widget.values, vec!["Web Design"]);
            }
            other => panic!("expected property, got {other:?}"),
        }
        assert_eq!(nodes[2], InlineNode::text(" soon "));
        assert_eq!(nodes[3], InlineNode::tag("urgent"));
    }

    #[test]
    fn hash_inside_word_is_not_a_tag() {
        let nodes = normalize_inline(widgetize_text("issue#12 stays"));
        assert_eq!(nodes, vec![InlineNode::text("issue#12 stays")]);
    }

    #[test]
    fn documents_with_widgets_are_untouched() {
        let doc = vec![Block::new(vec![
            InlineNode::tag("kept"),
            InlineNode::text(" [a:b]"),
        ])];
        assert_eq!(widgetize_legacy(doc.clone()), doc);
    }
}

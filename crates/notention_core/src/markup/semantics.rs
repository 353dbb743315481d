//! Tags and properties derived from a note body.

use crate::markup::parse::parse_markup;
use crate::model::content::{Block, InlineNode};
use crate::model::note::NoteSemantics;

/// Extracts unique tags and keyed properties in document order.
pub fn note_semantics(doc: &[Block]) -> NoteSemantics {
    let mut semantics = NoteSemantics::default();
    for node in doc.iter().flat_map(|block| block.content.iter()) {
        match node {
            InlineNode::Tag { tag } => {
                if !tag.is_empty() && !semantics.tags.contains(tag) {
                    semantics.tags.push(tag.clone());
                }
            }
            InlineNode::Property(widget) => {
                if !widget.key.is_empty() {
                    semantics.properties.push(widget.to_property());
                }
            }
            InlineNode::Text { .. } => {}
        }
    }
    semantics.is_imaginary = semantics.properties.iter().any(|p| !p.is_real());
    semantics
}

/// Parses markup and extracts its semantics.
pub fn semantics_from_markup(markup: &str) -> NoteSemantics {
    note_semantics(&parse_markup(markup))
}

#[cfg(test)]
mod tests {
    use super::semantics_from_markup;

    #[test]
    fn tags_are_unique_and_empty_keys_skipped() {
        let semantics = semantics_from_markup(concat!(
            r#"<p><span class="widget tag" data-tag="a">#a</span>"#,
            r#"<span class="widget tag" data-tag="a">#a</span>"#,
            r#"<span class="widget property" data-key="" data-values='["x"]'></span>"#,
            r#"<span class="widget property" data-key="price" data-operator="less than" data-values='["9"]'></span></p>"#,
        ));
        assert_eq!(semantics.tags, vec!["a"]);
        assert_eq!(semantics.properties.len(), 1);
        assert_eq!(semantics.properties[0].key, "price");
        assert!(semantics.is_imaginary);
    }

    #[test]
    fn plain_notes_are_not_imaginary() {
        let semantics = semantics_from_markup("<p>just text</p>");
        assert!(semantics.tags.is_empty());
        assert!(!semantics.is_imaginary);
    }
}

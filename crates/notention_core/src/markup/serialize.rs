//! Content model → markup.
//!
//! The widget attribute contract (`id`, `data-tag`, `data-key`,
//! `data-operator`, `data-values` as JSON) is the persisted format and must
//! stay readable by `markup::parse` for previously saved notes.

use crate::markup::dom::{escape_attr, escape_text};
use crate::model::content::{Block, InlineNode, PropertyWidget};

/// Display symbol for an operator, if it has one.
pub fn operator_symbol(operator: &str) -> Option<&'static str> {
    match operator {
        "is" => Some(":"),
        "is not" => Some("≠"),
        "contains" => Some("∋"),
        "is near" => Some("≈"),
        "is after" | "greater than" => Some(">"),
        "is before" | "less than" => Some("<"),
        "between" => Some("↔"),
        _ => None,
    }
}

/// Serializes a whole document; empty blocks render a caret placeholder.
pub fn serialize_model(doc: &[Block]) -> String {
    doc.iter().map(serialize_block).collect()
}

pub fn serialize_block(block: &Block) -> String {
    let inline = serialize_inline(&block.content);
    if inline.is_empty() {
        "<p>&#8203;</p>".to_string()
    } else {
        format!("<p>{inline}</p>")
    }
}

pub fn serialize_inline(nodes: &[InlineNode]) -> String {
    nodes.iter().map(serialize_node).collect()
}

fn serialize_node(node: &InlineNode) -> String {
    match node {
        InlineNode::Text { content } => escape_text(content),
        InlineNode::Tag { tag } => {
            let tag = escape_attr(tag);
            format!(
                r#"<span class="widget tag" contenteditable="false" data-tag="{tag}">#{tag}</span>"#
            )
        }
        InlineNode::Property(widget) => serialize_property(widget),
    }
}

fn serialize_property(widget: &PropertyWidget) -> String {
    let values_json =
        serde_json::to_string(&widget.values).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"<span id="{id}" class="widget property" contenteditable="false" data-key="{key}" data-operator="{operator}" data-values="{values}">{display}</span>"#,
        id = escape_attr(&widget.id),
        key = escape_attr(&widget.key),
        operator = escape_attr(&widget.operator),
        values = escape_attr(&values_json),
        display = format_property_display(&widget.key, &widget.operator, &widget.values),
    )
}

/// Human-readable widget body: key, operator symbol, value(s).
///
/// `between` with two values renders `low ↔ high`. Every interpolated string
/// is escaped.
pub fn format_property_display(key: &str, operator: &str, values: &[String]) -> String {
    let key_html = format!(r#"<span class="property-key">{}</span>"#, escape_attr(key));
    let value_html = |value: &str| {
        format!(r#"<span class="property-value">{}</span>"#, escape_attr(value))
    };
    let operator_html = |symbol: &str| {
        format!(r#"<span class="property-operator">{}</span>"#, escape_attr(symbol))
    };

    if operator == "between" && values.len() >= 2 {
        return format!(
            "{key_html}{}{}{}",
            value_html(&values[0]),
            operator_html("↔"),
            value_html(&values[1])
        );
    }

    let symbol = operator_symbol(operator).unwrap_or(operator);
    format!(
        "{key_html}{}{}",
        operator_html(symbol),
        value_html(values.first().map(String::as_str).unwrap_or(""))
    )
}

#[cfg(test)]
mod tests {
    use super::{format_property_display, serialize_model};
    use crate::model::content::{Block, InlineNode, PropertyWidget};

    #[test]
    fn serializes_paragraphs_and_placeholder() {
        let doc = vec![Block::from_text("a < b"), Block::empty()];
        assert_eq!(serialize_model(&doc), "<p>a &lt; b</p><p>&#8203;</p>");
    }

    #[test]
    fn property_attributes_are_escaped() {
        let widget = PropertyWidget::with_id("w1", "k\"ey", "is", vec!["<x>".into()]);
        let html = serialize_model(&[Block::new(vec![InlineNode::property(widget)])]);
        assert!(html.contains(r#"data-key="k&quot;ey""#), "got: {html}");
        assert!(html.contains(r#"data-values="[&quot;&lt;x&gt;&quot;]""#), "got: {html}");
        assert!(!html.contains("<x>"));
    }

    #[test]
    fn display_uses_operator_symbols() {
        let display = format_property_display("price", "less than", &["100".into()]);
        assert!(display.contains(r#"<span class="property-operator">&lt;</span>"#));
        let between = format_property_display("price", "between", &["1".into(), "5".into()]);
        assert!(between.contains("↔"));
        assert!(between.contains(">1<") && between.contains(">5<"));
        let unknown = format_property_display("k", "<weird>", &[]);
        assert!(unknown.contains("&lt;weird&gt;"));
    }
}

//! Inline content inserted by the tag and template pickers.

use crate::model::content::{InlineNode, PropertyWidget};
use crate::model::note::REAL_OPERATOR;
use crate::model::ontology::OntologyNode;

/// Tag widget followed by a space.
pub fn tag_insertion(tag: &str) -> Vec<InlineNode> {
    vec![InlineNode::tag(tag.trim()), InlineNode::text(" ")]
}

/// One empty `is` property per template attribute, space separated, with a
/// trailing space. Templates without attributes insert nothing.
pub fn template_insertion(template: &OntologyNode) -> Vec<InlineNode> {
    let mut nodes = Vec::new();
    for key in template.attributes.keys() {
        if !nodes.is_empty() {
            nodes.push(InlineNode::text(" "));
        }
        nodes.push(InlineNode::property(PropertyWidget::new(
            key.trim(),
            REAL_OPERATOR,
            vec![String::new()],
        )));
    }
    if !nodes.is_empty() {
        nodes.push(InlineNode::text(" "));
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::{tag_insertion, template_insertion};
    use crate::model::content::InlineNode;
    use crate::model::ontology::OntologyIndex;

    #[test]
    fn template_attributes_become_empty_properties() {
        let index = OntologyIndex::build(&crate::model::ontology::default_ontology_nodes());
        let project = index
            .templates
            .iter()
            .find(|template| template.id == "template-project")
            .expect("project template");
        let nodes = template_insertion(project);
        let keys: Vec<&str> = nodes
            .iter()
            .filter_map(|node| match node {
                InlineNode::Property(widget) => Some(widget.key.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(keys, vec!["budget", "deadline", "stakeholders", "status"]);
        assert_eq!(nodes.len(), 8);
        assert_eq!(nodes.last(), Some(&InlineNode::text(" ")));
    }

    #[test]
    fn tag_insertion_adds_trailing_space() {
        assert_eq!(
            tag_insertion("idea"),
            vec![InlineNode::tag("idea"), InlineNode::text(" ")]
        );
    }
}

//! Ontology schema: property keys, value types and legal operators.
//!
//! # Responsibility
//! - Describe the attribute table the matcher and display formatting read.
//! - Flatten the user-editable ontology tree into that table.
//! - Index tags/properties/templates offered by insertion actions.
//!
//! # Invariants
//! - The first definition of a key wins when the tree defines it twice.
//! - An attribute without explicit operators gets the defaults of its type.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Id of the ontology node whose children are templates.
pub const TEMPLATES_NODE_ID: &str = "templates";

/// Value type of an ontology attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    #[default]
    String,
    Number,
    Date,
    Datetime,
    Enum,
    Geo,
}

/// Operators legal for one attribute, split by role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSet {
    /// Operators stating a note's own facts.
    #[serde(default)]
    pub real: Vec<String>,
    /// Operators expressing a query over facts of this type.
    #[serde(default)]
    pub imaginary: Vec<String>,
}

impl OperatorSet {
    /// Default operator table for a value type.
    pub fn defaults_for(kind: AttributeType) -> Self {
        let imaginary: &[&str] = match kind {
            AttributeType::String => &["is not", "contains", "does not contain"],
            AttributeType::Number => &["less than", "greater than", "between"],
            AttributeType::Date | AttributeType::Datetime => &["is before", "is after", "between"],
            AttributeType::Enum => &["is not"],
            AttributeType::Geo => &["is near"],
        };
        Self {
            real: vec!["is".to_string()],
            imaginary: imaginary.iter().map(|op| op.to_string()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.real.is_empty() && self.imaginary.is_empty()
    }

    pub fn contains(&self, operator: &str) -> bool {
        self.real.iter().chain(self.imaginary.iter()).any(|op| op == operator)
    }
}

/// Schema entry for one property key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyAttribute {
    #[serde(rename = "type")]
    pub kind: AttributeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Allowed values for `AttributeType::Enum`, in their natural order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "OperatorSet::is_empty")]
    pub operators: OperatorSet,
}

impl OntologyAttribute {
    pub fn new(kind: AttributeType) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn described(kind: AttributeType, description: &str) -> Self {
        Self {
            kind,
            description: Some(description.to_string()),
            ..Self::default()
        }
    }

    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = Some(options.iter().map(|value| value.to_string()).collect());
        self
    }

    /// Declared operators, or the type defaults when none are declared.
    pub fn effective_operators(&self) -> OperatorSet {
        if self.operators.is_empty() {
            OperatorSet::defaults_for(self.kind)
        } else {
            self.operators.clone()
        }
    }
}

/// Node of the user-editable ontology tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyNode {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, OntologyAttribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OntologyNode>,
}

impl OntologyNode {
    fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            ..Self::default()
        }
    }

    fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    fn attr(mut self, key: &str, attribute: OntologyAttribute) -> Self {
        self.attributes.insert(key.to_string(), attribute);
        self
    }

    fn child(mut self, node: OntologyNode) -> Self {
        self.children.push(node);
        self
    }
}

/// Flattened key → attribute table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ontology {
    attributes: BTreeMap<String, OntologyAttribute>,
}

impl Ontology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens an ontology tree; the first definition of a key wins.
    pub fn from_nodes(nodes: &[OntologyNode]) -> Self {
        let mut ontology = Self::new();
        let mut stack: Vec<&OntologyNode> = nodes.iter().rev().collect();
        while let Some(node) = stack.pop() {
            for (key, attribute) in &node.attributes {
                ontology
                    .attributes
                    .entry(key.clone())
                    .or_insert_with(|| attribute.clone());
            }
            stack.extend(node.children.iter().rev());
        }
        ontology
    }

    /// Adds or replaces one attribute.
    pub fn insert(&mut self, key: impl Into<String>, attribute: OntologyAttribute) {
        self.attributes.insert(key.into(), attribute);
    }

    pub fn get(&self, key: &str) -> Option<&OntologyAttribute> {
        self.attributes.get(key)
    }

    /// Value type of a key; unknown keys are strings.
    pub fn kind_of(&self, key: &str) -> AttributeType {
        self.get(key).map_or(AttributeType::String, |attr| attr.kind)
    }

    /// `Some(legal)` for known keys, `None` when the key is not in the table.
    pub fn is_operator_legal(&self, key: &str, operator: &str) -> Option<bool> {
        self.get(key)
            .map(|attribute| attribute.effective_operators().contains(operator))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Table of the built-in tree.
    pub fn builtin() -> Self {
        Self::from_nodes(&default_ontology_nodes())
    }
}

/// Entry offered by tag/property insertion menus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Insertable tags, properties and templates derived from the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OntologyIndex {
    pub tags: Vec<IndexEntry>,
    pub properties: Vec<IndexEntry>,
    pub templates: Vec<OntologyNode>,
}

impl OntologyIndex {
    /// Builds the index; template nodes never contribute tags or properties.
    pub fn build(nodes: &[OntologyNode]) -> Self {
        let mut index = Self {
            templates: nodes
                .iter()
                .find(|node| node.id == TEMPLATES_NODE_ID)
                .map(|node| node.children.clone())
                .unwrap_or_default(),
            ..Self::default()
        };
        index.collect(nodes, false);
        index
    }

    fn collect(&mut self, nodes: &[OntologyNode], in_templates: bool) {
        for node in nodes {
            if !in_templates {
                self.tags.push(IndexEntry {
                    id: node.id.clone(),
                    label: node.label.clone(),
                    description: node.description.clone(),
                });
                for (key, attribute) in &node.attributes {
                    if self.properties.iter().all(|entry| &entry.label != key) {
                        self.properties.push(IndexEntry {
                            id: format!("{}-{key}", node.id),
                            label: key.clone(),
                            description: attribute.description.clone(),
                        });
                    }
                }
            }
            self.collect(&node.children, in_templates || node.id == TEMPLATES_NODE_ID);
        }
    }
}

const PROJECT_STATUSES: &[&str] = &["Planning", "Active", "On Hold", "Completed", "Archived"];
const TASK_PRIORITIES: &[&str] = &["Low", "Medium", "High", "Urgent"];

/// Built-in ontology tree shipped with the application.
pub fn default_ontology_nodes() -> Vec<OntologyNode> {
    use AttributeType as T;
    use OntologyAttribute as A;

    let entity = OntologyNode::new("entity", "Entity")
        .describe("The base for all things that can be identified.")
        .child(
            OntologyNode::new("person", "Person")
                .describe("An individual human being.")
                .attr("email", A::described(T::String, "Email address"))
                .attr("phone", A::described(T::String, "Phone number")),
        )
        .child(
            OntologyNode::new("organization", "Organization")
                .describe("A group of people with a particular purpose.")
                .attr("website", A::described(T::String, "Official website URL")),
        )
        .child(
            OntologyNode::new("place", "Place")
                .describe("A specific point on Earth or in space.")
                .attr("address", A::described(T::String, "Physical street address"))
                .attr("location", A::described(T::Geo, "Geographic coordinates"))
                .attr("city", A::described(T::String, "City name")),
        );

    let concept = OntologyNode::new("concept", "Concept")
        .describe("An abstract idea or a general notion.")
        .child(
            OntologyNode::new("technology", "Technology")
                .child(OntologyNode::new("ai", "AI"))
                .child(OntologyNode::new("blockchain", "Blockchain"))
                .child(OntologyNode::new("webdev", "Web Development")),
        )
        .child(OntologyNode::new("science", "Science"));

    let event = OntologyNode::new("event", "Event")
        .describe("Something that happens, especially something of importance.")
        .attr("startDateTime", A::described(T::Datetime, "The start date and time"))
        .attr("endDateTime", A::described(T::Datetime, "The end date and time"))
        .attr(
            "venue",
            A::described(T::String, "The name of the place where the event takes place"),
        )
        .child(OntologyNode::new("meeting", "Meeting"))
        .child(OntologyNode::new("conference", "Conference"));

    let work = OntologyNode::new("work", "Work")
        .describe("Activity involving mental or physical effort.")
        .child(
            OntologyNode::new("project", "Project")
                .describe("A planned piece of work.")
                .attr(
                    "status",
                    A::described(T::Enum, "Current status of the project.")
                        .with_options(PROJECT_STATUSES),
                )
                .attr("deadline", A::described(T::Date, "The date the project is due.")),
        )
        .child(
            OntologyNode::new("task", "Task")
                .describe("A piece of work to be done.")
                .attr(
                    "priority",
                    A::described(T::Enum, "The priority of the task.")
                        .with_options(TASK_PRIORITIES),
                )
                .attr(
                    "dueDate",
                    A::described(T::Date, "The date the task should be completed by."),
                )
                .attr(
                    "completed",
                    A::described(T::Enum, "Whether the task is completed.")
                        .with_options(&["true", "false"]),
                ),
        );

    let offer = OntologyNode::new("offer", "Offer")
        .describe("Something a note offers to others.")
        .attr("service", A::described(T::String, "Service offered"))
        .attr("price", A::described(T::Number, "Asking price"))
        .attr("offering", A::described(T::String, "Anything offered"))
        .attr("skill", A::described(T::String, "Skill held"))
        .attr("role", A::described(T::String, "Role filled"))
        .attr("startDate", A::described(T::Date, "Available from"))
        .attr("endDate", A::described(T::Date, "Available until"));

    let templates = OntologyNode::new(TEMPLATES_NODE_ID, "Templates")
        .describe("Pre-defined structures for your notes.")
        .child(
            OntologyNode::new("template-meeting", "Meeting Note")
                .describe("For capturing meeting details.")
                .attr("startDateTime", A::new(T::Datetime))
                .attr("attendees", A::new(T::String))
                .attr("venue", A::new(T::String))
                .attr("location", A::new(T::Geo)),
        )
        .child(
            OntologyNode::new("template-person", "Person Profile")
                .describe("To keep track of a contact.")
                .attr("name", A::new(T::String))
                .attr("email", A::new(T::String))
                .attr("phone", A::new(T::String))
                .attr("organization", A::new(T::String)),
        )
        .child(
            OntologyNode::new("template-project", "Project Plan")
                .describe("To outline a new project.")
                .attr("status", A::new(T::Enum).with_options(PROJECT_STATUSES))
                .attr("deadline", A::new(T::Date))
                .attr("budget", A::new(T::Number))
                .attr("stakeholders", A::new(T::String)),
        );

    vec![entity, concept, event, work, offer, templates]
}

#[cfg(test)]
mod tests {
    use super::{
        default_ontology_nodes, AttributeType, Ontology, OntologyAttribute, OntologyIndex,
        OperatorSet,
    };

    #[test]
    fn builtin_ontology_types_alias_targets() {
        let ontology = Ontology::builtin();
        assert_eq!(ontology.kind_of("price"), AttributeType::Number);
        assert_eq!(ontology.kind_of("deadline"), AttributeType::Date);
        assert_eq!(ontology.kind_of("location"), AttributeType::Geo);
        assert_eq!(ontology.kind_of("unknown-key"), AttributeType::String);
        assert_eq!(ontology.is_operator_legal("price", "less than"), Some(true));
        assert_eq!(ontology.is_operator_legal("price", "contains"), Some(false));
        assert_eq!(ontology.is_operator_legal("nope", "is"), None);
    }

    #[test]
    fn declared_operators_override_type_defaults() {
        let mut attribute = OntologyAttribute::new(AttributeType::Number);
        attribute.operators = OperatorSet {
            real: vec!["is".into()],
            imaginary: vec!["less than".into()],
        };
        assert!(!attribute.effective_operators().contains("between"));
        assert!(OntologyAttribute::new(AttributeType::Number)
            .effective_operators()
            .contains("between"));
    }

    #[test]
    fn index_excludes_template_children_from_tags() {
        let index = OntologyIndex::build(&default_ontology_nodes());
        assert_eq!(index.templates.len(), 3);
        assert!(index.tags.iter().any(|tag| tag.id == "templates"));
        assert!(index.tags.iter().all(|tag| tag.id != "template-meeting"));
        assert!(index.properties.iter().all(|prop| prop.label != "budget"));
        assert!(index.properties.iter().any(|prop| prop.label == "email"));
    }

    #[test]
    fn attribute_json_uses_type_field() {
        let attribute: OntologyAttribute =
            serde_json::from_str(r#"{"type":"enum","options":["a","b"]}"#)
                .expect("attribute json should parse");
        assert_eq!(attribute.kind, AttributeType::Enum);
        assert_eq!(attribute.options.as_deref(), Some(&["a".to_string(), "b".to_string()][..]));
    }
}

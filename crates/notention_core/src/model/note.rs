//! Note record and semantic projections shared with collaborators.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operator that states a fact about a note.
pub const REAL_OPERATOR: &str = "is";

/// Semantic key/operator/values triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    pub operator: String,
    #[serde(default)]
    pub values: Vec<String>,
}

impl Property {
    pub fn new(key: impl Into<String>, operator: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            key: key.into(),
            operator: operator.into(),
            values,
        }
    }

    /// Real properties state a fact (`is`); everything else is a query.
    pub fn is_real(&self) -> bool {
        self.operator == REAL_OPERATOR
    }

    /// First value, or empty when the property carries none.
    pub fn first_value(&self) -> &str {
        self.values.first().map(String::as_str).unwrap_or("")
    }
}

/// Note record exchanged with the persistence collaborator.
///
/// `content` is the serialized markup body; `tags` and `properties` are
/// recomputed from the content model before every save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub properties: Vec<Property>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<i64>,
}

impl Note {
    /// Creates a note with a generated id and current timestamps.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            properties: Vec::new(),
            created_at: now,
            updated_at: now,
            published_at: None,
        }
    }
}

/// Tags and properties derived from a note body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSemantics {
    /// Unique tags in first-seen order.
    pub tags: Vec<String>,
    /// Properties with a non-empty key, in document order.
    pub properties: Vec<Property>,
    /// True when any property uses an operator other than `is`.
    pub is_imaginary: bool,
}

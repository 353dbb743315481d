//! Query parsing and note filtering.
//!
//! # Invariants
//! - Matching is case-insensitive throughout.
//! - A blank term keeps every note in its original order.

use crate::markup::parse::parse_markup;
use crate::model::content::plain_text;
use crate::model::note::Note;
use once_cell::sync::Lazy;
use regex::Regex;

static TERM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:[^\s"]+|"[^"]*")+"#).expect("valid search term regex"));

/// Parsed search term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Substrings of the title or plain-text body.
    pub text: Vec<String>,
    /// Substrings of some tag.
    pub tags: Vec<String>,
    /// Exact key with a value substring.
    pub properties: Vec<(String, String)>,
}

impl SearchQuery {
    pub fn parse(term: &str) -> Self {
        let lowered = term.to_lowercase();
        let mut query = Self::default();
        for part in TERM_RE.find_iter(&lowered).map(|found| found.as_str()) {
            if let Some(tag) = part.strip_prefix('#') {
                query.tags.push(tag.replace('"', ""));
            } else if let Some((key, value)) = part.split_once(':') {
                query
                    .properties
                    .push((key.replace('"', ""), value.replace('"', "")));
            } else {
                query.text.push(part.replace('"', ""));
            }
        }
        query
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.tags.is_empty() && self.properties.is_empty()
    }

    pub fn matches(&self, note: &Note) -> bool {
        let tags_ok = self.tags.iter().all(|wanted| {
            note.tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(wanted.as_str()))
        });
        let properties_ok = self.properties.iter().all(|(key, value)| {
            note.properties.iter().any(|property| {
                property.key.to_lowercase() == *key
                    && property
                        .values
                        .iter()
                        .any(|have| have.to_lowercase().contains(value.as_str()))
            })
        });
        if !tags_ok || !properties_ok {
            return false;
        }
        if self.text.is_empty() {
            return true;
        }
        let title = note.title.to_lowercase();
        let body = plain_text(&parse_markup(&note.content)).to_lowercase();
        self.text
            .iter()
            .all(|wanted| title.contains(wanted.as_str()) || body.contains(wanted.as_str()))
    }
}

/// Notes matching `term`, in input order.
pub fn filter_notes<'a>(notes: &'a [Note], term: &str) -> Vec<&'a Note> {
    let query = SearchQuery::parse(term);
    if query.is_empty() {
        return notes.iter().collect();
    }
    notes.iter().filter(|note| query.matches(note)).collect()
}

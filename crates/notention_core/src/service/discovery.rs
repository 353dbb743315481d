//! Note-to-note discovery over candidate notes.
//!
//! # Responsibility
//! - Derive search criteria from the properties of a query note.
//! - Keep candidates whose facts satisfy every criterion.
//!
//! # Invariants
//! - The query note and the user's own notes are never results.
//! - A query without usable criteria finds nothing.
//! - Candidate semantics are cached per `id@updatedAt`, so an edited
//!   candidate is re-parsed.

use crate::config::CoreConfig;
use crate::markup::legacy::widgetize_legacy;
use crate::markup::parse::parse_markup;
use crate::markup::semantics::note_semantics;
use crate::matcher::{SemanticMatcher, SUPPORTED_OPERATORS};
use crate::model::note::{Note, NoteSemantics, Property};
use crate::service::cache::{CacheStats, SessionCache};
use log::info;
use std::collections::BTreeSet;

#[derive(Debug)]
pub struct DiscoveryService {
    matcher: SemanticMatcher,
    cache: SessionCache<NoteSemantics>,
}

impl DiscoveryService {
    pub fn new(matcher: SemanticMatcher, cache_capacity: usize) -> Self {
        Self {
            matcher,
            cache: SessionCache::new(cache_capacity),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.matcher(), config.cache_capacity)
    }

    pub fn matcher(&self) -> &SemanticMatcher {
        &self.matcher
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Constraints derived from the query note's body.
    ///
    /// Keys are alias-resolved; properties without any non-blank value or
    /// with an operator the matcher cannot evaluate are dropped.
    pub fn criteria(&mut self, query: &Note) -> Vec<Property> {
        let aliases = self.matcher.aliases();
        cached_semantics(&mut self.cache, query)
            .properties
            .iter()
            .filter(|property| SUPPORTED_OPERATORS.contains(&property.operator.as_str()))
            .filter(|property| property.values.iter().any(|value| !value.trim().is_empty()))
            .map(|property| {
                Property::new(
                    aliases.resolve(&property.key),
                    property.operator.clone(),
                    property.values.clone(),
                )
            })
            .collect()
    }

    /// Candidates matching the query note, excluding `own_notes`.
    pub fn search<'a>(
        &mut self,
        query: &Note,
        candidates: &'a [Note],
        own_notes: &[Note],
    ) -> Vec<&'a Note> {
        let criteria = self.criteria(query);
        if criteria.is_empty() {
            info!(
                "event=discovery_search module=discovery status=skipped reason=no_criteria note_id={}",
                query.id
            );
            return Vec::new();
        }

        let excluded: BTreeSet<&str> = own_notes
            .iter()
            .map(|note| note.id.as_str())
            .chain(std::iter::once(query.id.as_str()))
            .collect();
        let mut found = Vec::new();
        for candidate in candidates {
            if excluded.contains(candidate.id.as_str()) {
                continue;
            }
            let facts = &cached_semantics(&mut self.cache, candidate).properties;
            if self.matcher.matches(&criteria, facts) {
                found.push(candidate);
            }
        }

        info!(
            "event=discovery_search module=discovery status=ok note_id={} criteria={} candidates={} matches={}",
            query.id,
            criteria.len(),
            candidates.len(),
            found.len()
        );
        found
    }
}

fn cached_semantics<'c>(
    cache: &'c mut SessionCache<NoteSemantics>,
    note: &Note,
) -> &'c NoteSemantics {
    let key = format!("{}@{}", note.id, note.updated_at);
    cache.get_or_insert_with(&key, || {
        note_semantics(&widgetize_legacy(parse_markup(&note.content)))
    })
}

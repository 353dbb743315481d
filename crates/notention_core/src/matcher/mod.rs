//! Note-to-note semantic matching.
//!
//! # Responsibility
//! - Decide whether a candidate's facts satisfy a query's constraints under
//!   the ontology's per-key types and operators.
//!
//! # Invariants
//! - All query constraints must hold (logical AND); each one is satisfied by
//!   any single source fact.
//! - Only real (`is`) source properties are facts.
//! - Malformed values fail the comparison and never panic.

pub mod aliases;
pub mod compare;

pub use aliases::KeyAliases;

use crate::model::note::Property;
use crate::model::ontology::Ontology;
use compare::{compare_values, haversine_km, parse_geo};
use log::debug;
use std::cmp::Ordering;

/// Default proximity for `is near` when the query gives no radius.
pub const DEFAULT_NEAR_RADIUS_KM: f64 = 10.0;

/// Operators `match_property` understands.
pub const SUPPORTED_OPERATORS: &[&str] = &[
    "is",
    "is not",
    "contains",
    "does not contain",
    "less than",
    "greater than",
    "is before",
    "is after",
    "between",
    "is near",
];

#[derive(Debug, Clone, PartialEq)]
pub struct SemanticMatcher {
    ontology: Ontology,
    aliases: KeyAliases,
    near_radius_km: f64,
}

impl Default for SemanticMatcher {
    fn default() -> Self {
        Self::new(Ontology::builtin(), KeyAliases::default())
    }
}

impl SemanticMatcher {
    pub fn new(ontology: Ontology, aliases: KeyAliases) -> Self {
        Self {
            ontology,
            aliases,
            near_radius_km: DEFAULT_NEAR_RADIUS_KM,
        }
    }

    pub fn with_near_radius_km(mut self, radius_km: f64) -> Self {
        self.near_radius_km = radius_km;
        self
    }

    pub fn ontology(&self) -> &Ontology {
        &self.ontology
    }

    pub fn aliases(&self) -> &KeyAliases {
        &self.aliases
    }

    /// True when every query property is satisfied by some source property.
    pub fn matches(&self, query: &[Property], source: &[Property]) -> bool {
        query.iter().all(|constraint| {
            source
                .iter()
                .any(|fact| self.match_property(constraint, fact))
        })
    }

    /// Checks one query constraint against one source fact.
    pub fn match_property(&self, query: &Property, source: &Property) -> bool {
        let key = self.aliases.resolve(&query.key);
        if source.key != key || !source.is_real() {
            return false;
        }
        if self.ontology.is_operator_legal(key, &query.operator) == Some(false) {
            debug!(
                "event=operator_illegal module=matcher status=skipped key={} operator={}",
                key, query.operator
            );
            return false;
        }
        let Some(fact) = source.values.first().map(|value| value.trim()) else {
            return false;
        };
        let attribute = self.ontology.get(key);
        let first = query.values.first().map(|value| value.trim());
        let ordered = |expected: Ordering| {
            first.is_some_and(|wanted| compare_values(attribute, fact, wanted) == Some(expected))
        };

        match query.operator.as_str() {
            "is" => {
                !query.values.is_empty()
                    && query.values.len() == source.values.len()
                    && query
                        .values
                        .iter()
                        .zip(&source.values)
                        .all(|(wanted, have)| wanted.trim() == have.trim())
            }
            "is not" => first.is_some_and(|wanted| wanted != fact),
            "contains" => first.is_some_and(|wanted| fact.contains(wanted)),
            "does not contain" => first.is_some_and(|wanted| !fact.contains(wanted)),
            "less than" | "is before" => ordered(Ordering::Less),
            "greater than" | "is after" => ordered(Ordering::Greater),
            "between" => self.between(query, fact),
            "is near" => self.near(query, fact),
            other => {
                debug!(
                    "event=operator_unknown module=matcher status=skipped key={} operator={}",
                    key, other
                );
                false
            }
        }
    }

    fn between(&self, query: &Property, fact: &str) -> bool {
        let [low, high] = query.values.as_slice() else {
            return false;
        };
        let attribute = self.ontology.get(self.aliases.resolve(&query.key));
        let (low, high) = match compare_values(attribute, low, high) {
            Some(Ordering::Greater) => (high, low),
            Some(_) => (low, high),
            None => return false,
        };
        matches!(
            compare_values(attribute, fact, low),
            Some(Ordering::Greater | Ordering::Equal)
        ) && matches!(
            compare_values(attribute, fact, high),
            Some(Ordering::Less | Ordering::Equal)
        )
    }

    fn near(&self, query: &Property, fact: &str) -> bool {
        let Some(center) = query.values.first().and_then(|value| parse_geo(value)) else {
            return false;
        };
        let Some(point) = parse_geo(fact) else {
            return false;
        };
        let radius = match query.values.get(1) {
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(radius) if radius >= 0.0 => radius,
                _ => return false,
            },
            None => self.near_radius_km,
        };
        haversine_km(center, point) <= radius
    }
}

#[cfg(test)]
mod tests {
    use super::SemanticMatcher;
    use crate::model::note::Property;

    fn prop(key: &str, operator: &str, values: &[&str]) -> Property {
        Property::new(key, operator, values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn budget_alias_matches_price_facts() {
        let matcher = SemanticMatcher::default();
        let query = [prop("budget", "less than", &["100"])];
        assert!(matcher.matches(&query, &[prop("price", "is", &["90"])]));
        assert!(!matcher.matches(&query, &[prop("price", "is", &["200"])]));
    }

    #[test]
    fn all_constraints_must_hold() {
        let matcher = SemanticMatcher::default();
        let query = [
            prop("looking-for", "is", &["Web Design"]),
            prop("budget", "less than", &["100"]),
        ];
        let facts = [prop("service", "is", &["Web Design"]), prop("price", "is", &["80"])];
        assert!(matcher.matches(&query, &facts));
        assert!(!matcher.matches(&query, &facts[..1]));
    }

    #[test]
    fn only_real_facts_are_compared() {
        let matcher = SemanticMatcher::default();
        let query = [prop("price", "less than", &["100"])];
        assert!(!matcher.matches(&query, &[prop("price", "less than", &["90"])]));
    }

    #[test]
    fn illegal_operator_for_known_key_fails() {
        let matcher = SemanticMatcher::default();
        let query = [prop("price", "contains", &["9"])];
        assert!(!matcher.matches(&query, &[prop("price", "is", &["90"])]));
    }

    #[test]
    fn between_is_closed_and_order_insensitive() {
        let matcher = SemanticMatcher::default();
        let facts = [prop("price", "is", &["50"])];
        assert!(matcher.matches(&[prop("price", "between", &["50", "60"])], &facts));
        assert!(matcher.matches(&[prop("price", "between", &["60", "10"])], &facts));
        assert!(!matcher.matches(&[prop("price", "between", &["60"])], &facts));
        assert!(!matcher.matches(&[prop("price", "between", &["51", "60"])], &facts));
    }

    #[test]
    fn dates_compare_temporally() {
        let matcher = SemanticMatcher::default();
        let facts = [prop("deadline", "is", &["2024-03-01"])];
        assert!(matcher.matches(&[prop("needed-by", "is before", &["2024-04-01"])], &facts));
        assert!(!matcher.matches(&[prop("needed-by", "is after", &["2024-04-01"])], &facts));
        assert!(!matcher.matches(&[prop("needed-by", "is before", &["soon"])], &facts));
    }

    #[test]
    fn near_uses_query_radius_or_default() {
        let matcher = SemanticMatcher::default();
        let facts = [prop("location", "is", &["48.8566,2.3522"])];
        assert!(matcher.matches(&[prop("near-location", "is near", &["48.86,2.35"])], &facts));
        assert!(!matcher.matches(
            &[prop("near-location", "is near", &["51.5074,-0.1278"])],
            &facts
        ));
        assert!(matcher.matches(
            &[prop("near-location", "is near", &["51.5074,-0.1278", "400"])],
            &facts
        ));
    }

    #[test]
    fn unknown_keys_use_string_and_numeric_fallbacks() {
        let matcher = SemanticMatcher::default();
        let facts = [prop("color", "is", &["dark blue"])];
        assert!(matcher.matches(&[prop("color", "contains", &["blue"])], &facts));
        assert!(!matcher.matches(&[prop("color", "less than", &["3"])], &facts));
    }
}

//! Query-key → fact-key alias table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("looking-for", "service"),
    ("budget", "price"),
    ("seeking", "offering"),
    ("required-skill", "skill"),
    ("hiring-for", "role"),
    ("needed-by", "deadline"),
    ("available-from", "startDate"),
    ("available-until", "endDate"),
    ("project-status", "status"),
    ("task-priority", "priority"),
    ("in-city", "city"),
    ("near-location", "location"),
    ("event-date", "startDateTime"),
];

/// Maps the key a query is written with to the key facts are stored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyAliases {
    map: BTreeMap<String, String>,
}

impl Default for KeyAliases {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_ALIASES.iter().copied())
    }
}

impl KeyAliases {
    /// Empty table; every key resolves to itself.
    pub fn empty() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            map: pairs
                .into_iter()
                .map(|(alias, key)| (alias.into(), key.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, alias: impl Into<String>, key: impl Into<String>) {
        self.map.insert(alias.into(), key.into());
    }

    /// Fact key for a query key; unaliased keys resolve to themselves.
    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        self.map.get(key).map_or(key, String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(alias, key)| (alias.as_str(), key.as_str()))
    }
}

//! Core configuration loaded from JSON.
//!
//! # Invariants
//! - Missing fields take their defaults; unknown fields are rejected.
//! - A loaded config has a finite, non-negative near radius and a non-zero
//!   cache capacity.

use crate::logging::default_log_level;
use crate::matcher::{KeyAliases, SemanticMatcher, DEFAULT_NEAR_RADIUS_KM};
use crate::model::ontology::{default_ontology_nodes, Ontology, OntologyIndex, OntologyNode};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_AUTOSAVE_DEBOUNCE_MS: u64 = 1000;
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub log_level: String,
    /// Absolute directory for log files; logging stays off when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    pub autosave_debounce_ms: u64,
    pub near_radius_km: f64,
    pub cache_capacity: usize,
    pub key_aliases: KeyAliases,
    /// Replaces the built-in ontology tree when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ontology: Option<Vec<OntologyNode>>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            autosave_debounce_ms: DEFAULT_AUTOSAVE_DEBOUNCE_MS,
            near_radius_km: DEFAULT_NEAR_RADIUS_KM,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            key_aliases: KeyAliases::default(),
            ontology: None,
        }
    }
}

impl CoreConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.near_radius_km.is_finite() || self.near_radius_km < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "near_radius_km must be a non-negative number, got {}",
                self.near_radius_km
            )));
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "cache_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    /// Configured ontology tree, or the built-in one.
    pub fn ontology_nodes(&self) -> Vec<OntologyNode> {
        self.ontology.clone().unwrap_or_else(default_ontology_nodes)
    }

    pub fn ontology(&self) -> Ontology {
        Ontology::from_nodes(&self.ontology_nodes())
    }

    pub fn ontology_index(&self) -> OntologyIndex {
        OntologyIndex::build(&self.ontology_nodes())
    }

    pub fn matcher(&self) -> SemanticMatcher {
        SemanticMatcher::new(self.ontology(), self.key_aliases.clone())
            .with_near_radius_km(self.near_radius_km)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config JSON: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};

    #[test]
    fn empty_object_yields_defaults() {
        let config = CoreConfig::from_json_str("{}").expect("empty config");
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.autosave_debounce().as_millis(), 1000);
        assert_eq!(config.key_aliases.resolve("budget"), "price");
    }

    #[test]
    fn unknown_fields_and_bad_values_are_rejected() {
        assert!(matches!(
            CoreConfig::from_json_str(r#"{"autosave":5}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            CoreConfig::from_json_str(r#"{"cache_capacity":0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CoreConfig::from_json_str(r#"{"near_radius_km":-1}"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn custom_ontology_replaces_builtin() {
        let config = CoreConfig::from_json_str(
            r#"{"ontology":[{"id":"gear","label":"Gear","attributes":{"weight":{"type":"number"}}}]}"#,
        )
        .expect("ontology config");
        let ontology = config.ontology();
        assert_eq!(ontology.len(), 1);
        assert!(ontology.get("price").is_none());
        assert_eq!(
            ontology.is_operator_legal("weight", "less than"),
            Some(true)
        );
    }
}

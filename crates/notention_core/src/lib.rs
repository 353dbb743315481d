//! Structured editing core for Notention notes.
//! This crate owns the content model, its markup bridge, the transaction
//! engine, selection mapping and the semantic matcher.

pub mod config;
pub mod extension;
pub mod logging;
pub mod markup;
pub mod matcher;
pub mod model;
pub mod search;
pub mod selection;
pub mod service;
pub mod transaction;

pub use config::{ConfigError, CoreConfig};
pub use extension::{
    builtin_registry, ClickTarget, EditorContext, EditorPlugin, HookOutcome, PluginCapability,
    PluginRegistry, PluginRegistryError,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use markup::parse::parse_markup;
pub use markup::semantics::{note_semantics, semantics_from_markup};
pub use markup::serialize::serialize_model;
pub use matcher::{KeyAliases, SemanticMatcher};
pub use model::content::{Block, ContentModel, InlineNode, PropertyWidget};
pub use model::note::{Note, NoteSemantics, Property};
pub use model::ontology::{Ontology, OntologyIndex, OntologyNode};
pub use model::selection::EditorSelection;
pub use search::filter_notes;
pub use selection::{EditableSurface, MemorySurface, SurfacePoint};
pub use service::{
    DiscoveryService, EditorSession, KeyDisposition, MemorySink, NoteSink, SessionCache, SinkError,
};
pub use transaction::{Step, StepError, Transaction, TransactionResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

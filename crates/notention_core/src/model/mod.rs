//! Domain model for the structured note editor.
//!
//! # Responsibility
//! - Define the content model edited by transactions.
//! - Define semantic records (properties, notes, ontology) shared with the
//!   matcher and the persistence collaborator.
//!
//! # Invariants
//! - Every model-producing operation returns normalized blocks.
//! - Inline node kinds are a closed sum type; consumers match exhaustively.

pub mod content;
pub mod note;
pub mod ontology;
pub mod selection;

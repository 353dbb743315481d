//! Bridge between the persisted markup body and the content model.
//!
//! # Responsibility
//! - Tokenize markup into a tolerant tree (`dom`).
//! - Parse markup into blocks and serialize blocks back (`parse`, `serialize`).
//! - Upgrade legacy plain-text markers and derive note semantics.
//!
//! # Invariants
//! - `parse(serialize(model)) == model` up to text-run normalization.
//! - Nothing in this module panics or fails on malformed input.

pub mod dom;
pub mod legacy;
pub mod parse;
pub mod semantics;
pub mod serialize;

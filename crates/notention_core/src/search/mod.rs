//! Note list search.
//!
//! Query syntax: whitespace-separated terms, `"quoted phrases"`, `#tag`
//! and `key:value`. Every term must match (logical AND).

pub mod filter;

pub use filter::{filter_notes, SearchQuery};

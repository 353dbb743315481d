//! Stateful services built on the editing core.
//!
//! Each service owns its caches and collaborators; nothing here keeps
//! process-wide state.

pub mod cache;
pub mod discovery;
pub mod editor_session;

pub use cache::{CacheStats, SessionCache};
pub use discovery::DiscoveryService;
pub use editor_session::{EditorSession, KeyDisposition, MemorySink, NoteSink, SinkError};

//! Core library for the aula content-generation client.
//!
//! Everything between the form and the rendered document lives here:
//!
//! - **Access validation**: allow/deny gate with fail-open transport semantics
//! - **Generation requests**: per-kind topic flattening and dispatch
//! - **Persisted chat session**: the improvement conversation state machine,
//!   with restore-over-restart and stale-snapshot discard
//! - **Host content state**: origin-tagged updates driving chat-state cleanup
//! - **Rendering and export**: on-screen previews plus PDF/Word projections
//! - **Points notifier**: fire-and-forget gamification calls
//! - **Configuration and storage**: YAML config, key-value state store

pub mod config;
pub mod content;
pub mod errors;
pub mod export;
pub mod points;
pub mod render;
pub mod request;
pub mod session;
pub mod store;
pub mod validator;

pub use config::AulaConfig;
pub use content::{ContentOrigin, ContentUpdate, HostContent};
pub use errors::AulaError;
pub use export::ExportFormat;
pub use points::PointsNotifier;
pub use request::{FormFields, GenerationRequestBuilder};
pub use session::{ChatSession, OpenOutcome, PersistedChatState, SessionConfig, SessionState};
pub use store::{FileStore, MemoryStore, StateStore};
pub use validator::AccessValidator;

#[cfg(test)]
pub mod test_utils;

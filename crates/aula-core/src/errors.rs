//! Error types for the aula client workspace.
//!
//! Failures are grouped by source so callers can pick the right surface for
//! each one: access denials open the paywall, transport failures become a
//! transient notice, storage and parsing problems self-heal or leave prior
//! state untouched. Nothing here is ever allowed to escalate to a crash.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AulaError {
    #[error("Access denied: {0}")]
    AccessDenied(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Parsing error: {0}")]
    Parsing(String),
    #[error("Nothing to improve: the page has no generated content")]
    EmptyContent,
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<std::io::Error> for AulaError {
    fn from(err: std::io::Error) -> Self {
        AulaError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AulaError {
    fn from(err: serde_json::Error) -> Self {
        AulaError::Parsing(err.to_string())
    }
}

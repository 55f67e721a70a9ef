//! Host content state and content-change origin tagging.
//!
//! The generated artifact is owned by the host page, never by the chat
//! session. Every write to it carries an explicit origin so the cleanup
//! decision ("did the artifact change under the chat's feet?") is a pure
//! function of `(new_content, origin)` instead of ambient session state.

use std::sync::Arc;

use crate::errors::AulaError;
use crate::store::StateStore;

/// Where a content change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentOrigin {
    /// An accepted revision from the improvement chat.
    Chat,
    /// A fresh generation from the form.
    Form,
}

/// One accepted change to the host content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentUpdate {
    pub content: String,
    pub origin: ContentOrigin,
}

impl ContentUpdate {
    pub fn from_chat(content: String) -> Self {
        Self {
            content,
            origin: ContentOrigin::Chat,
        }
    }

    pub fn from_form(content: String) -> Self {
        Self {
            content,
            origin: ContentOrigin::Form,
        }
    }
}

/// Authoritative copy of the generated artifact plus the wipe policy for the
/// chat state anchored to it.
pub struct HostContent {
    value: String,
    store: Arc<dyn StateStore>,
    chat_storage_key: String,
}

impl HostContent {
    pub fn new(value: String, store: Arc<dyn StateStore>, chat_storage_key: String) -> Self {
        Self {
            value,
            store,
            chat_storage_key,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Apply a content change. A form-originated change means the artifact was
    /// regenerated outside the chat, so any persisted chat state is stale and
    /// gets wiped. Chat-originated changes leave the session alone.
    pub fn apply(&mut self, update: ContentUpdate) -> Result<(), AulaError> {
        if update.origin == ContentOrigin::Form {
            self.store.delete(&self.chat_storage_key)?;
        }
        self.value = update.content;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_form_update_wipes_chat_state() {
        let store = Arc::new(MemoryStore::new());
        store.set("chat:lesson-plan", "{}").unwrap();

        let mut host = HostContent::new(
            "Plan A".to_string(),
            store.clone(),
            "chat:lesson-plan".to_string(),
        );
        host.apply(ContentUpdate::from_form("Plan B".to_string()))
            .unwrap();

        assert_eq!(host.value(), "Plan B");
        assert_eq!(store.get("chat:lesson-plan").unwrap(), None);
    }

    #[test]
    fn test_chat_update_keeps_chat_state() {
        let store = Arc::new(MemoryStore::new());
        store.set("chat:lesson-plan", "{}").unwrap();

        let mut host = HostContent::new(
            "Plan A".to_string(),
            store.clone(),
            "chat:lesson-plan".to_string(),
        );
        host.apply(ContentUpdate::from_chat("Plan A (short)".to_string()))
            .unwrap();

        assert_eq!(host.value(), "Plan A (short)");
        assert_eq!(store.get("chat:lesson-plan").unwrap(), Some("{}".to_string()));
    }
}

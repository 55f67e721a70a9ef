//! Persisted improvement-chat session.
//!
//! A session conducts a turn-based conversation against the backend's
//! improvement endpoints, anchored to one generated artifact. The transcript
//! and the content snapshot it was started against are persisted through a
//! [`StateStore`] so closing and reopening the chat restores it without a
//! network call. If the artifact changed in the meantime, the stale session
//! is discarded rather than attached to new content.
//!
//! Send ordering is structural: `send` takes `&mut self` and the state gate
//! rejects a second submission while one is in flight, so messages within a
//! conversation are appended strictly in send order.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use aula_client::{
    BackendClient, ChatMessage, ContinueImprovementRequest, StartImprovementRequest,
};

use crate::content::ContentUpdate;
use crate::errors::AulaError;
use crate::store::StateStore;
use crate::validator::AccessValidator;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Modal closed, no conversation.
    Idle,
    /// Conversation present, accepting input.
    Active,
    /// Awaiting a backend reply; input is rejected.
    Sending,
    /// Access check failed; paywall territory.
    Denied,
}

/// What `open` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A conversation was already live in memory; nothing happened.
    AlreadyActive,
    /// The persisted transcript was recovered without touching the network.
    Restored,
    /// A new conversation was started against the backend.
    Started,
    /// Access was denied; payload is the server's message, verbatim.
    Denied(String),
}

#[derive(Debug, PartialEq, Eq)]
enum RestoreOutcome {
    Restored,
    NotRestored,
}

/// Client-local cache of a conversation: transcript plus the content snapshot
/// it was anchored to. Serialized as-is under the session's storage key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedChatState {
    #[serde(rename = "conversationId")]
    pub conversation_id: String,
    pub messages: Vec<ChatMessage>,
    #[serde(rename = "currentResponse")]
    pub current_response: String,
}

/// Per-feature wiring for a session.
pub struct SessionConfig {
    /// Storage key for the persisted state, one per content feature.
    pub storage_key: String,
    /// Signed-in user's email, fed to the access check and the start call.
    pub email: String,
    /// Locally generated first transcript entry.
    pub welcome_text: String,
    /// Keep the optimistic user message in the transcript when the send
    /// fails. Favors visible persistence of attempted input over silent loss.
    pub retain_on_failure: bool,
}

impl SessionConfig {
    pub fn new(storage_key: &str, email: &str, welcome_text: &str) -> Self {
        Self {
            storage_key: storage_key.to_string(),
            email: email.to_string(),
            welcome_text: welcome_text.to_string(),
            retain_on_failure: true,
        }
    }
}

pub struct ChatSession {
    client: Arc<dyn BackendClient>,
    store: Arc<dyn StateStore>,
    validator: AccessValidator,
    config: SessionConfig,
    state: SessionState,
    conversation_id: Option<String>,
    original_request_id: String,
    messages: Vec<ChatMessage>,
    current_response: String,
}

impl ChatSession {
    pub fn new(
        client: Arc<dyn BackendClient>,
        store: Arc<dyn StateStore>,
        config: SessionConfig,
    ) -> Self {
        Self {
            validator: AccessValidator::new(client.clone()),
            client,
            store,
            config,
            state: SessionState::Idle,
            conversation_id: None,
            original_request_id: String::new(),
            messages: Vec::new(),
            current_response: String::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Open the session against the host's current content.
    ///
    /// Idempotent: if a conversation id or a transcript is already held in
    /// memory this is a no-op, which keeps duplicate open events (a mount
    /// effect firing twice) from producing two conversations.
    pub async fn open(&mut self, host_content: &str) -> Result<OpenOutcome, AulaError> {
        if self.conversation_id.is_some() || !self.messages.is_empty() {
            self.state = SessionState::Active;
            return Ok(OpenOutcome::AlreadyActive);
        }

        if self.restore(host_content)? == RestoreOutcome::Restored {
            return Ok(OpenOutcome::Restored);
        }

        self.start(host_content).await
    }

    /// Attempt recovery from the store. Self-heals by deleting the entry when
    /// it is malformed or when its snapshot no longer matches the host
    /// content. Only reached from `open` once the in-memory guard has passed,
    /// so the session holds no conversation here.
    fn restore(&mut self, host_content: &str) -> Result<RestoreOutcome, AulaError> {
        let raw = match self.store.get(&self.config.storage_key)? {
            Some(raw) => raw,
            None => return Ok(RestoreOutcome::NotRestored),
        };

        let persisted: PersistedChatState = match serde_json::from_str(&raw) {
            Ok(persisted) => persisted,
            Err(err) => {
                log::warn!("discarding malformed chat state: {err}");
                self.store.delete(&self.config.storage_key)?;
                return Ok(RestoreOutcome::NotRestored);
            }
        };

        if persisted.conversation_id.is_empty() || persisted.messages.is_empty() {
            self.store.delete(&self.config.storage_key)?;
            return Ok(RestoreOutcome::NotRestored);
        }

        if persisted.current_response != host_content {
            // The artifact changed since this chat last ran; a stale session
            // must not attach to new content.
            self.store.delete(&self.config.storage_key)?;
            return Ok(RestoreOutcome::NotRestored);
        }

        self.conversation_id = Some(persisted.conversation_id);
        self.messages = persisted.messages;
        self.current_response = persisted.current_response;
        self.state = SessionState::Active;
        Ok(RestoreOutcome::Restored)
    }

    /// Start a fresh conversation against the backend.
    async fn start(&mut self, host_content: &str) -> Result<OpenOutcome, AulaError> {
        let decision = self.validator.check(&self.config.email).await;
        if !decision.allowed {
            self.state = SessionState::Denied;
            return Ok(OpenOutcome::Denied(decision.message));
        }

        if host_content.trim().is_empty() {
            return Err(AulaError::EmptyContent);
        }

        let conversation = self
            .client
            .start_improvement(StartImprovementRequest {
                email: self.config.email.clone(),
                response: host_content.to_string(),
            })
            .await
            .map_err(|err| AulaError::Transport(err.to_string()))?;

        self.conversation_id = Some(conversation.id);
        self.original_request_id = conversation.original_request_id;
        // The server's conversation record carries its own greeting in
        // `mensajes`; the transcript is seeded from the local welcome text
        // instead. Deliberate, do not "fix" to the server payload.
        self.messages = vec![ChatMessage::model(&self.config.welcome_text)];
        self.current_response = host_content.to_string();
        self.state = SessionState::Active;
        self.persist()?;
        Ok(OpenOutcome::Started)
    }

    /// Send one user message and fold the model's revision into the
    /// transcript. Returns the content update the host should apply, tagged
    /// with `origin = Chat` so the host's cleanup watcher leaves the session
    /// alone.
    pub async fn send(&mut self, text: &str) -> Result<Option<ContentUpdate>, AulaError> {
        if text.trim().is_empty() || self.state == SessionState::Sending {
            return Ok(None);
        }
        let conversation_id = match &self.conversation_id {
            Some(id) => id.clone(),
            None => return Ok(None),
        };

        self.state = SessionState::Sending;
        // Optimistic append; on failure the message stays visible unless the
        // retain policy says otherwise.
        self.messages.push(ChatMessage::user(text));

        let result = self
            .client
            .continue_improvement(ContinueImprovementRequest {
                conversation_id,
                new_message: text.to_string(),
                original_request_id: self.original_request_id.clone(),
            })
            .await;

        match result {
            Ok(reply) => {
                let update = ContentUpdate::from_chat(reply.content.clone());
                self.messages.push(reply);
                self.state = SessionState::Active;
                // Snapshot stays at the content the conversation was started
                // against; it is only refreshed by a fresh Start.
                self.persist()?;
                Ok(Some(update))
            }
            Err(err) => {
                if !self.config.retain_on_failure {
                    self.messages.pop();
                }
                self.state = SessionState::Active;
                Err(AulaError::Transport(err.to_string()))
            }
        }
    }

    /// Drop the persisted entry and reset the session to a blank slate.
    pub fn clear(&mut self) -> Result<(), AulaError> {
        self.store.delete(&self.config.storage_key)?;
        self.conversation_id = None;
        self.original_request_id.clear();
        self.messages.clear();
        self.current_response.clear();
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Close the modal. Whether closing also clears is host-page policy; the
    /// session itself only leaves the active state.
    pub fn close(&mut self) {
        self.state = SessionState::Idle;
    }

    fn persist(&self) -> Result<(), AulaError> {
        let persisted = PersistedChatState {
            conversation_id: self.conversation_id.clone().unwrap_or_default(),
            messages: self.messages.clone(),
            current_response: self.current_response.clone(),
        };
        self.store
            .set(&self.config.storage_key, &serde_json::to_string(&persisted)?)
    }
}

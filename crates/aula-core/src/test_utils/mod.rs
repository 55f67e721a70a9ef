//! Shared test doubles for session, validator and builder tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use aula_client::{
    AccessDecision, BackendClient, ChatMessage, ContentKind, ContinueImprovementRequest,
    Conversation, GeneratedContent, GenerationRequest, PointsAward, StartImprovementRequest,
    SubscriptionStatus,
};

/// Programmable in-memory backend. `None` in a slot means that endpoint fails
/// with a transport-style error. Call counters allow asserting on network
/// traffic (or its absence).
pub struct MockBackendClient {
    pub access: Mutex<Option<AccessDecision>>,
    pub conversation: Mutex<Option<Conversation>>,
    pub reply: Mutex<Option<ChatMessage>>,
    pub generated: Mutex<Option<GeneratedContent>>,
    pub subscription: Mutex<Option<SubscriptionStatus>>,
    validate_calls: AtomicUsize,
    start_calls: AtomicUsize,
    continue_calls: AtomicUsize,
    generate_calls: AtomicUsize,
    points_calls: AtomicUsize,
    subscription_calls: AtomicUsize,
}

impl MockBackendClient {
    fn empty() -> Self {
        Self {
            access: Mutex::new(None),
            conversation: Mutex::new(None),
            reply: Mutex::new(None),
            generated: Mutex::new(None),
            subscription: Mutex::new(None),
            validate_calls: AtomicUsize::new(0),
            start_calls: AtomicUsize::new(0),
            continue_calls: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
            points_calls: AtomicUsize::new(0),
            subscription_calls: AtomicUsize::new(0),
        }
    }

    /// Backend that allows access and answers every chat call.
    pub fn allowing() -> Self {
        let mock = Self::empty();
        *mock.access.lock().unwrap() = Some(AccessDecision {
            allowed: true,
            message: String::new(),
        });
        *mock.conversation.lock().unwrap() = Some(Conversation {
            id: "c1".to_string(),
            user_email: "ana@colegio.edu".to_string(),
            original_request_id: "req-9".to_string(),
            messages: vec![ChatMessage::model("server greeting, ignored")],
            timestamp: "t0".to_string(),
        });
        *mock.reply.lock().unwrap() = Some(ChatMessage::model("Plan A (short)"));
        *mock.generated.lock().unwrap() = Some(GeneratedContent::Text("Plan A".to_string()));
        mock
    }

    /// Backend that denies access with the given message.
    pub fn denying(message: &str) -> Self {
        let mock = Self::allowing();
        *mock.access.lock().unwrap() = Some(AccessDecision {
            allowed: false,
            message: message.to_string(),
        });
        mock
    }

    /// Backend where every endpoint fails at the transport level.
    pub fn unreachable() -> Self {
        Self::empty()
    }

    pub fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn continue_calls(&self) -> usize {
        self.continue_calls.load(Ordering::SeqCst)
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn points_calls(&self) -> usize {
        self.points_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendClient for MockBackendClient {
    async fn validate_access(&self, _email: &str) -> Result<AccessDecision> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        match self.access.lock().unwrap().clone() {
            Some(decision) => Ok(decision),
            None => bail!("connection refused"),
        }
    }

    async fn start_improvement(&self, _request: StartImprovementRequest) -> Result<Conversation> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        match self.conversation.lock().unwrap().clone() {
            Some(conversation) => Ok(conversation),
            None => bail!("connection refused"),
        }
    }

    async fn continue_improvement(
        &self,
        _request: ContinueImprovementRequest,
    ) -> Result<ChatMessage> {
        self.continue_calls.fetch_add(1, Ordering::SeqCst);
        match self.reply.lock().unwrap().clone() {
            Some(reply) => Ok(reply),
            None => bail!("connection refused"),
        }
    }

    async fn generate(
        &self,
        _kind: ContentKind,
        _request: GenerationRequest,
    ) -> Result<GeneratedContent> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        match self.generated.lock().unwrap().clone() {
            Some(content) => Ok(content),
            None => bail!("connection refused"),
        }
    }

    async fn award_points(&self, _request: PointsAward) -> Result<()> {
        self.points_calls.fetch_add(1, Ordering::SeqCst);
        // No slot of its own; reachability follows the access slot.
        if self.access.lock().unwrap().is_none() {
            bail!("connection refused");
        }
        Ok(())
    }

    async fn subscription_status(&self, _email: &str) -> Result<SubscriptionStatus> {
        self.subscription_calls.fetch_add(1, Ordering::SeqCst);
        match self.subscription.lock().unwrap().clone() {
            Some(status) => Ok(status),
            None => bail!("connection refused"),
        }
    }
}

//! Client SDK for the aula content-generation backend.
//!
//! This crate abstracts the remote backend behind a single trait so the rest
//! of the workspace never talks HTTP directly. The design keeps deployment
//! flexibility: production code uses [`HttpBackendClient`], tests swap in
//! hand-rolled mocks without touching the call sites.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

pub mod http_client;
pub mod types;

pub use http_client::HttpBackendClient;
pub use types::*;

/// BackendClient trait for communicating with the aula backend.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Check whether the given user may run generations right now.
    async fn validate_access(&self, email: &str) -> Result<AccessDecision>;

    /// Start an improvement conversation anchored to a generated artifact.
    async fn start_improvement(&self, request: StartImprovementRequest) -> Result<Conversation>;

    /// Send one more user message on an existing conversation.
    async fn continue_improvement(
        &self,
        request: ContinueImprovementRequest,
    ) -> Result<ChatMessage>;

    /// Run a content generation for the given kind.
    async fn generate(
        &self,
        kind: ContentKind,
        request: GenerationRequest,
    ) -> Result<GeneratedContent>;

    /// Award gamification points after a successful generation.
    async fn award_points(&self, request: PointsAward) -> Result<()>;

    /// Current subscription state for the given user.
    async fn subscription_status(&self, email: &str) -> Result<SubscriptionStatus>;
}

/// Factory for creating BackendClient instances.
pub struct BackendClientFactory;

impl BackendClientFactory {
    /// Create an HTTP client for a remote backend.
    pub fn create_http_client(base_url: String) -> Box<dyn BackendClient> {
        Box::new(HttpBackendClient::new(base_url))
    }
}

/// Poll the subscription endpoint until it reports an active plan.
///
/// This is the only retry loop in the system: a fixed number of attempts with
/// a fixed delay, matching the payment-confirmation flow it serves. Returns
/// the last observed status whether or not it became active.
pub async fn poll_subscription(
    client: &dyn BackendClient,
    email: &str,
    attempts: u32,
    delay: Duration,
) -> Result<SubscriptionStatus> {
    let mut last = client.subscription_status(email).await?;
    for _ in 1..attempts {
        if last.active {
            break;
        }
        tokio::time::sleep(delay).await;
        last = client.subscription_status(email).await?;
    }
    Ok(last)
}

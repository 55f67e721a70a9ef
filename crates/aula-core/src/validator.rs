//! Access validation with fail-open transport semantics.

use std::sync::Arc;

use aula_client::{AccessDecision, BackendClient};

/// Thin wrapper over the backend access check that owns the availability
/// policy: a network failure during validation must never block the user.
pub struct AccessValidator {
    client: Arc<dyn BackendClient>,
}

impl AccessValidator {
    pub fn new(client: Arc<dyn BackendClient>) -> Self {
        Self { client }
    }

    /// Resolve an allow/deny decision for the given user.
    ///
    /// An empty email is denied locally without a network call. A transport
    /// failure resolves to allowed ("fail-open"); do not change this to
    /// fail-closed.
    pub async fn check(&self, email: &str) -> AccessDecision {
        if email.trim().is_empty() {
            return AccessDecision {
                allowed: false,
                message: "An account email is required".to_string(),
            };
        }

        match self.client.validate_access(email).await {
            Ok(decision) => decision,
            Err(err) => {
                log::warn!("access validation unreachable, allowing: {err:?}");
                AccessDecision {
                    allowed: true,
                    message: "validation error".to_string(),
                }
            }
        }
    }
}

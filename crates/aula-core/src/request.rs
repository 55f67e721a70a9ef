//! Generation request assembly and dispatch.
//!
//! Each content kind flattens its form fields into one natural-language topic
//! string plus the shared metadata block, checks access, and posts to the
//! kind-specific endpoint. A successful generation is a fresh-generation
//! event: the caller applies the returned update with `origin = Form`, which
//! wipes any chat state anchored to the previous artifact.

use std::sync::Arc;

use aula_client::{BackendClient, ContentKind, GeneratedContent, GenerationRequest};

use crate::content::ContentUpdate;
use crate::errors::AulaError;
use crate::validator::AccessValidator;

/// Raw form state as collected from the user.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    pub topic: String,
    pub grade: String,
    pub subject: String,
    pub name: String,
    pub public: bool,
}

pub struct GenerationRequestBuilder {
    client: Arc<dyn BackendClient>,
    validator: AccessValidator,
    email: String,
}

impl GenerationRequestBuilder {
    pub fn new(client: Arc<dyn BackendClient>, email: &str) -> Self {
        Self {
            validator: AccessValidator::new(client.clone()),
            client,
            email: email.to_string(),
        }
    }

    /// Phrase the form fields as one topic string for the given kind.
    pub fn flatten_topic(kind: ContentKind, fields: &FormFields) -> String {
        let base = fields.topic.trim();
        let grade = fields.grade.trim();
        let subject = fields.subject.trim();

        match kind {
            ContentKind::LessonPlan => {
                format!("Lesson plan on \"{base}\" for grade {grade}, subject {subject}")
            }
            ContentKind::Quiz => {
                format!("Quiz on \"{base}\" for grade {grade}, subject {subject}")
            }
            ContentKind::Piar => {
                format!("PIAR inclusion plan for \"{base}\", grade {grade}")
            }
            ContentKind::Training => format!("Training material on \"{base}\""),
            ContentKind::ParentEmail => {
                format!("Email to parents about \"{base}\", grade {grade}")
            }
            ContentKind::ClearInstructions => {
                format!("Step-by-step instructions for \"{base}\", grade {grade}")
            }
            ContentKind::Steam => {
                format!("STEAM project plan on \"{base}\" for grade {grade}, subject {subject}")
            }
        }
    }

    /// Validate access, then run the generation. A denial carries the
    /// server's message verbatim and never reaches the generation endpoint.
    pub async fn generate(
        &self,
        kind: ContentKind,
        fields: &FormFields,
    ) -> Result<GeneratedContent, AulaError> {
        let decision = self.validator.check(&self.email).await;
        if !decision.allowed {
            return Err(AulaError::AccessDenied(decision.message));
        }

        if fields.topic.trim().is_empty() {
            return Err(AulaError::Validation("a topic is required".to_string()));
        }

        let request = GenerationRequest {
            topic: Self::flatten_topic(kind, fields),
            grade: fields.grade.clone(),
            subject: fields.subject.clone(),
            name: fields.name.clone(),
            public: fields.public,
            email: self.email.clone(),
        };

        self.client
            .generate(kind, request)
            .await
            .map_err(|err| AulaError::Transport(err.to_string()))
    }

    /// Generate and package the result as a form-originated content update.
    pub async fn generate_update(
        &self,
        kind: ContentKind,
        fields: &FormFields,
    ) -> Result<(GeneratedContent, ContentUpdate), AulaError> {
        let content = self.generate(kind, fields).await?;
        let update = ContentUpdate::from_form(content.as_anchor());
        Ok((content, update))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentOrigin;
    use crate::test_utils::MockBackendClient;

    fn fields() -> FormFields {
        FormFields {
            topic: "fractions".to_string(),
            grade: "5".to_string(),
            subject: "math".to_string(),
            name: "Plan A".to_string(),
            public: false,
        }
    }

    #[test]
    fn test_flatten_topic_carries_metadata() {
        let topic = GenerationRequestBuilder::flatten_topic(ContentKind::LessonPlan, &fields());
        assert!(topic.contains("fractions"));
        assert!(topic.contains("grade 5"));
        assert!(topic.contains("math"));
    }

    #[tokio::test]
    async fn test_denied_blocks_generation() {
        let client = Arc::new(MockBackendClient::denying("Plan expired"));
        let builder = GenerationRequestBuilder::new(client.clone(), "ana@colegio.edu");

        let result = builder.generate(ContentKind::LessonPlan, &fields()).await;

        match result {
            Err(AulaError::AccessDenied(message)) => assert_eq!(message, "Plan expired"),
            other => panic!("expected access denial, got {other:?}"),
        }
        assert_eq!(client.generate_calls(), 0);
    }

    #[tokio::test]
    async fn test_generate_update_is_form_originated() {
        let client = Arc::new(MockBackendClient::allowing());
        let builder = GenerationRequestBuilder::new(client.clone(), "ana@colegio.edu");

        let (content, update) = builder
            .generate_update(ContentKind::LessonPlan, &fields())
            .await
            .unwrap();

        assert_eq!(content, GeneratedContent::Text("Plan A".to_string()));
        assert_eq!(update.origin, ContentOrigin::Form);
        assert_eq!(update.content, "Plan A");
        assert_eq!(client.generate_calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_topic_rejected_locally() {
        let client = Arc::new(MockBackendClient::allowing());
        let builder = GenerationRequestBuilder::new(client.clone(), "ana@colegio.edu");

        let result = builder
            .generate(ContentKind::Quiz, &FormFields::default())
            .await;

        assert!(matches!(result, Err(AulaError::Validation(_))));
        assert_eq!(client.generate_calls(), 0);
    }
}

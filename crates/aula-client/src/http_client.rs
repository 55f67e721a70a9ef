//! HTTP implementation of [`BackendClient`] against the hosted backend.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::{
    AccessDecision, BackendClient, ChatMessage, ContentKind, ContinueImprovementRequest,
    Conversation, GeneratedContent, GenerationRequest, PointsAward, StartImprovementRequest,
    SubscriptionStatus,
};

/// HTTP client for the remote aula backend.
pub struct HttpBackendClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpBackendClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn validate_access(&self, email: &str) -> Result<AccessDecision> {
        let url = format!(
            "{}?email={}",
            self.url("/api/validate-access"),
            urlencoding::encode(email)
        );
        let response = self.client.get(&url).timeout(self.timeout).send().await?;

        if !response.status().is_success() {
            bail!("Access validation failed: {}", response.status());
        }

        Ok(response.json::<AccessDecision>().await?)
    }

    async fn start_improvement(&self, request: StartImprovementRequest) -> Result<Conversation> {
        let response = self
            .client
            .post(self.url("/api/chat/mejora/iniciar"))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Failed to start improvement chat: {}", response.status());
        }

        Ok(response.json::<Conversation>().await?)
    }

    async fn continue_improvement(
        &self,
        request: ContinueImprovementRequest,
    ) -> Result<ChatMessage> {
        let response = self
            .client
            .post(self.url("/api/chat/mejora/continuar"))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Failed to continue improvement chat: {}", response.status());
        }

        Ok(response.json::<ChatMessage>().await?)
    }

    async fn generate(
        &self,
        kind: ContentKind,
        request: GenerationRequest,
    ) -> Result<GeneratedContent> {
        let url = self.url(&format!("/api/generar/{}", kind.endpoint_path()));
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Generation failed for {kind}: {}", response.status());
        }

        let body = response.text().await?;
        Ok(GeneratedContent::from_body(&body))
    }

    async fn award_points(&self, request: PointsAward) -> Result<()> {
        let response = self
            .client
            .post(self.url("/api/puntos/otorgar"))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Points award failed: {}", response.status());
        }

        Ok(())
    }

    async fn subscription_status(&self, email: &str) -> Result<SubscriptionStatus> {
        let url = format!(
            "{}?email={}",
            self.url("/api/suscripcion/estado"),
            urlencoding::encode(email)
        );
        let response = self.client.get(&url).timeout(self.timeout).send().await?;

        if !response.status().is_success() {
            bail!("Subscription status failed: {}", response.status());
        }

        Ok(response.json::<SubscriptionStatus>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_validate_access_encodes_email() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/validate-access")
            .match_query(Matcher::UrlEncoded(
                "email".into(),
                "ana+test@colegio.edu".into(),
            ))
            .with_body(r#"{"allowed": false, "message": "Plan expired"}"#)
            .create_async()
            .await;

        let client = HttpBackendClient::new(server.url());
        let decision = client.validate_access("ana+test@colegio.edu").await.unwrap();

        mock.assert_async().await;
        assert!(!decision.allowed);
        assert_eq!(decision.message, "Plan expired");
    }

    #[tokio::test]
    async fn test_start_improvement_posts_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat/mejora/iniciar")
            .match_body(Matcher::JsonString(
                r#"{"email": "ana@colegio.edu", "response": "Plan A"}"#.into(),
            ))
            .with_body(
                r#"{"id": "c1", "emailUsuario": "ana@colegio.edu",
                    "idPeticionOriginal": "req-9", "mensajes": [], "timestamp": "t"}"#,
            )
            .create_async()
            .await;

        let client = HttpBackendClient::new(server.url());
        let conversation = client
            .start_improvement(StartImprovementRequest {
                email: "ana@colegio.edu".to_string(),
                response: "Plan A".to_string(),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(conversation.id, "c1");
        assert_eq!(conversation.original_request_id, "req-9");
    }

    #[tokio::test]
    async fn test_continue_improvement_sends_wire_names() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat/mejora/continuar")
            .match_body(Matcher::JsonString(
                r#"{"idConversacion": "c1", "nuevoMensaje": "shorter",
                    "idPeticionOriginal": "req-9"}"#
                    .into(),
            ))
            .with_body(r#"{"role": "model", "content": "Plan A (short)", "timestamp": "t"}"#)
            .create_async()
            .await;

        let client = HttpBackendClient::new(server.url());
        let reply = client
            .continue_improvement(ContinueImprovementRequest {
                conversation_id: "c1".to_string(),
                new_message: "shorter".to_string(),
                original_request_id: "req-9".to_string(),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reply.content, "Plan A (short)");
    }

    #[tokio::test]
    async fn test_generate_parses_text_and_structured() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/generar/plan-de-clase")
            .with_body("\"Plan A\"")
            .create_async()
            .await;
        server
            .mock("POST", "/api/generar/piar")
            .with_body(r#"[{"objetivo": "inclusion"}]"#)
            .create_async()
            .await;

        let client = HttpBackendClient::new(server.url());
        let request = GenerationRequest {
            topic: "fractions".to_string(),
            grade: "5".to_string(),
            subject: "math".to_string(),
            name: "Plan A".to_string(),
            public: false,
            email: "ana@colegio.edu".to_string(),
        };

        let text = client
            .generate(ContentKind::LessonPlan, request.clone())
            .await
            .unwrap();
        assert_eq!(text, GeneratedContent::Text("Plan A".to_string()));

        let structured = client.generate(ContentKind::Piar, request).await.unwrap();
        assert!(matches!(structured, GeneratedContent::Structured(_)));
    }

    #[tokio::test]
    async fn test_error_status_bails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Regex("/api/validate-access.*".into()))
            .with_status(500)
            .create_async()
            .await;

        let client = HttpBackendClient::new(server.url());
        assert!(client.validate_access("ana@colegio.edu").await.is_err());
    }
}

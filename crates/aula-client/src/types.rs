//! Wire types for the aula backend API.
//!
//! The backend keeps its historical Spanish field names on the wire
//! (`emailUsuario`, `idPeticionOriginal`, ...). Serde renames confine that
//! vocabulary to this module so the rest of the workspace works with plain
//! Rust naming.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author of a chat transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// Single transcript entry. Immutable once appended; display order is
/// insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

impl ChatMessage {
    pub fn user(content: &str) -> Self {
        Self::new(Role::User, content)
    }

    pub fn model(content: &str) -> Self {
        Self::new(Role::Model, content)
    }

    fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Server-side chat session record returned by the start endpoint. After
/// creation the client only reads `id` and `original_request_id` from it and
/// rebuilds its own local transcript.
#[derive(Debug, Clone, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(rename = "emailUsuario", default)]
    pub user_email: String,
    #[serde(rename = "idPeticionOriginal", default)]
    pub original_request_id: String,
    #[serde(rename = "mensajes", default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartImprovementRequest {
    pub email: String,
    pub response: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContinueImprovementRequest {
    #[serde(rename = "idConversacion")]
    pub conversation_id: String,
    #[serde(rename = "nuevoMensaje")]
    pub new_message: String,
    #[serde(rename = "idPeticionOriginal")]
    pub original_request_id: String,
}

/// Allow/deny decision from the access endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessDecision {
    pub allowed: bool,
    #[serde(default)]
    pub message: String,
}

/// Content families the backend can generate. Each maps to its own endpoint
/// and response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    LessonPlan,
    Quiz,
    Piar,
    Training,
    ParentEmail,
    ClearInstructions,
    Steam,
}

impl ContentKind {
    /// Path segment of the generation endpoint for this kind.
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            ContentKind::LessonPlan => "plan-de-clase",
            ContentKind::Quiz => "cuestionario",
            ContentKind::Piar => "piar",
            ContentKind::Training => "capacitacion",
            ContentKind::ParentEmail => "correo-padres",
            ContentKind::ClearInstructions => "instrucciones",
            ContentKind::Steam => "steam",
        }
    }

    /// Kinds whose responses are structured JSON rather than plain text.
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            ContentKind::Piar | ContentKind::Steam | ContentKind::Quiz
        )
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.endpoint_path())
    }
}

/// Flattened generation request: one natural-language topic string plus the
/// metadata every endpoint shares.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub topic: String,
    pub grade: String,
    pub subject: String,
    pub name: String,
    #[serde(rename = "isPublic")]
    pub public: bool,
    pub email: String,
}

/// Generated artifact as returned by a generation endpoint.
///
/// Untagged: `Text` must stay first so plain strings round-trip as text;
/// a `Value` otherwise matches any JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeneratedContent {
    Text(String),
    Structured(Value),
}

impl GeneratedContent {
    /// Flat string form used as the chat anchor and the export source.
    pub fn as_anchor(&self) -> String {
        match self {
            GeneratedContent::Text(text) => text.clone(),
            GeneratedContent::Structured(value) => value.to_string(),
        }
    }

    /// Parse a raw endpoint body: JSON objects/arrays become `Structured`,
    /// everything else is kept verbatim as `Text`.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::String(text)) => GeneratedContent::Text(text),
            Ok(value @ (Value::Object(_) | Value::Array(_))) => {
                GeneratedContent::Structured(value)
            }
            _ => GeneratedContent::Text(body.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PointsAward {
    pub email: String,
    pub points: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionStatus {
    pub active: bool,
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub message: String,
}

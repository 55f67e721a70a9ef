//! Type-specific preview formatting of generated payloads.
//!
//! Plain-text kinds pass through with normalization; rich text is stripped of
//! markup; structured kinds (PIAR rows, STEAM sections, quizzes) project their
//! JSON into labeled text. A structured kind receiving non-conforming JSON is
//! a parsing error and the caller leaves the host content untouched.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use aula_client::{ContentKind, GeneratedContent};

use crate::errors::AulaError;

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

/// Strip HTML tags from rich content, keeping the text between them.
pub fn strip_html(input: &str) -> String {
    let text = tag_pattern().replace_all(input, "");
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").trim().to_string()
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Render a generated payload for on-screen preview.
pub fn render(kind: ContentKind, content: &GeneratedContent) -> Result<String, AulaError> {
    match content {
        GeneratedContent::Text(text) => Ok(normalize(&strip_html(text))),
        GeneratedContent::Structured(value) => match kind {
            ContentKind::Piar => render_rows(value),
            ContentKind::Steam => render_sections(value),
            ContentKind::Quiz => render_quiz(value),
            _ => Ok(normalize(&serde_json::to_string_pretty(value)?)),
        },
    }
}

/// PIAR payloads are arrays of row objects; each row becomes a labeled block.
fn render_rows(value: &Value) -> Result<String, AulaError> {
    let rows = value
        .as_array()
        .ok_or_else(|| AulaError::Parsing("expected an array of PIAR rows".to_string()))?;

    let mut out = String::new();
    for (index, row) in rows.iter().enumerate() {
        let fields = row
            .as_object()
            .ok_or_else(|| AulaError::Parsing(format!("PIAR row {} is not an object", index + 1)))?;
        out.push_str(&format!("--- Row {} ---\n", index + 1));
        for (key, field) in fields {
            out.push_str(&format!("{key}: {}\n", scalar(field)));
        }
        out.push('\n');
    }
    Ok(normalize(&out))
}

/// STEAM payloads are one object; each top-level entry becomes a section.
fn render_sections(value: &Value) -> Result<String, AulaError> {
    let sections = value
        .as_object()
        .ok_or_else(|| AulaError::Parsing("expected a STEAM object".to_string()))?;

    let mut out = String::new();
    for (title, body) in sections {
        out.push_str(&format!("== {} ==\n", title.to_uppercase()));
        match body {
            Value::Array(items) => {
                for item in items {
                    out.push_str(&format!("- {}\n", scalar(item)));
                }
            }
            Value::Object(entries) => {
                for (key, entry) in entries {
                    out.push_str(&format!("{key}: {}\n", scalar(entry)));
                }
            }
            other => {
                out.push_str(&scalar(other));
                out.push('\n');
            }
        }
        out.push('\n');
    }
    Ok(normalize(&out))
}

/// Quizzes are an array of question objects, either at the top level or under
/// the first array-valued field.
fn render_quiz(value: &Value) -> Result<String, AulaError> {
    let questions = match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(fields) => fields
            .values()
            .find_map(|field| field.as_array())
            .map(|questions| questions.as_slice())
            .ok_or_else(|| AulaError::Parsing("quiz payload has no question list".to_string()))?,
        _ => return Err(AulaError::Parsing("unrecognized quiz payload".to_string())),
    };

    let mut out = String::new();
    for (index, question) in questions.iter().enumerate() {
        let fields = question.as_object().ok_or_else(|| {
            AulaError::Parsing(format!("quiz question {} is not an object", index + 1))
        })?;

        let prompt = fields
            .get("question")
            .or_else(|| fields.get("pregunta"))
            .map(scalar)
            .unwrap_or_default();
        out.push_str(&format!("{}. {prompt}\n", index + 1));

        if let Some(options) = fields
            .get("options")
            .or_else(|| fields.get("opciones"))
            .and_then(Value::as_array)
        {
            for (option_index, option) in options.iter().enumerate() {
                let letter = (b'a' + option_index as u8) as char;
                out.push_str(&format!("   {letter}) {}\n", scalar(option)));
            }
        }
        if let Some(answer) = fields.get("answer").or_else(|| fields.get("respuesta")) {
            out.push_str(&format!("   Answer: {}\n", scalar(answer)));
        }
        out.push('\n');
    }
    Ok(normalize(&out))
}

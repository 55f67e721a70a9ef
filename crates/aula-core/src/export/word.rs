//! Word export as an MSO-wrapped HTML blob.
//!
//! Plain-text kinds serialize their paragraphs directly; structured kinds are
//! first projected into an explicit heading/paragraph/list tree, then the
//! tree is rendered to HTML and wrapped in the Word-compatible envelope.

use serde_json::Value;

use aula_client::{ContentKind, GeneratedContent};

use crate::errors::AulaError;

/// Building blocks of the structured document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocNode {
    Heading(u8, String),
    Paragraph(String),
    List(Vec<String>),
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Project a generated payload into a document tree.
pub fn build_nodes(
    title: &str,
    kind: ContentKind,
    content: &GeneratedContent,
) -> Result<Vec<DocNode>, AulaError> {
    let mut nodes = vec![DocNode::Heading(1, title.to_string())];

    match content {
        GeneratedContent::Text(text) => {
            for paragraph in text.split("\n\n") {
                let trimmed = paragraph.trim();
                if !trimmed.is_empty() {
                    nodes.push(DocNode::Paragraph(trimmed.to_string()));
                }
            }
        }
        GeneratedContent::Structured(value) => match kind {
            ContentKind::Piar => {
                let rows = value.as_array().ok_or_else(|| {
                    AulaError::Parsing("expected an array of PIAR rows".to_string())
                })?;
                for (index, row) in rows.iter().enumerate() {
                    nodes.push(DocNode::Heading(2, format!("Row {}", index + 1)));
                    if let Some(fields) = row.as_object() {
                        nodes.push(DocNode::List(
                            fields
                                .iter()
                                .map(|(key, field)| format!("{key}: {}", scalar(field)))
                                .collect(),
                        ));
                    }
                }
            }
            _ => {
                let sections = value
                    .as_object()
                    .ok_or_else(|| AulaError::Parsing("expected a JSON object".to_string()))?;
                for (section, body) in sections {
                    nodes.push(DocNode::Heading(2, section.clone()));
                    match body {
                        Value::Array(items) => {
                            nodes.push(DocNode::List(items.iter().map(scalar).collect()));
                        }
                        other => nodes.push(DocNode::Paragraph(scalar(other))),
                    }
                }
            }
        },
    }

    Ok(nodes)
}

fn nodes_to_html(nodes: &[DocNode]) -> String {
    let mut html = String::new();
    for node in nodes {
        match node {
            DocNode::Heading(level, text) => {
                html.push_str(&format!("<h{level}>{}</h{level}>\n", escape_html(text)));
            }
            DocNode::Paragraph(text) => {
                html.push_str(&format!("<p>{}</p>\n", escape_html(text)));
            }
            DocNode::List(items) => {
                html.push_str("<ul>\n");
                for item in items {
                    html.push_str(&format!("<li>{}</li>\n", escape_html(item)));
                }
                html.push_str("</ul>\n");
            }
        }
    }
    html
}

/// Wrap an HTML body in the minimal envelope Word accepts as a document.
fn wrap_mso(title: &str, body: &str) -> String {
    format!(
        "<html xmlns:o='urn:schemas-microsoft-com:office:office' \
         xmlns:w='urn:schemas-microsoft-com:office:word' \
         xmlns='http://www.w3.org/TR/REC-html40'>\
         <head><meta charset='utf-8'><title>{}</title></head>\
         <body>{}</body></html>",
        escape_html(title),
        body
    )
}

/// Serialize a finalized artifact into a Word-compatible blob.
pub fn export_word(
    title: &str,
    kind: ContentKind,
    content: &GeneratedContent,
) -> Result<Vec<u8>, AulaError> {
    let nodes = build_nodes(title, kind, content)?;
    Ok(wrap_mso(title, &nodes_to_html(&nodes)).into_bytes())
}

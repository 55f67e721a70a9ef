//! Export adapters: PDF and Word projections of the generated content.
//!
//! Both adapters read the same in-memory content state and are independent,
//! lossy projections; there is no round-trip guarantee between them.

pub mod pdf;
pub mod word;

use aula_client::{ContentKind, GeneratedContent};

use crate::errors::AulaError;
use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Word,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Word => "doc",
        }
    }
}

/// Serialize a finalized artifact into a downloadable document.
pub fn export(
    kind: ContentKind,
    content: &GeneratedContent,
    title: &str,
    format: ExportFormat,
) -> Result<Vec<u8>, AulaError> {
    match format {
        ExportFormat::Pdf => {
            let body = render::render(kind, content)?;
            pdf::export_pdf(title, &body)
        }
        ExportFormat::Word => word::export_word(title, kind, content),
    }
}
